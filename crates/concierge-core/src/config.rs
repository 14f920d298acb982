use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConciergeError, Result};

/// Top-level configuration for Concierge.
///
/// Loaded from `~/.concierge/config.toml` by default. Every section falls
/// back to its defaults when missing from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConciergeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl ConciergeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConciergeConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConciergeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject settings that cannot work together.
    pub fn validate(&self) -> Result<()> {
        if self.documents.chunk_size == 0 {
            return Err(ConciergeError::Config(
                "documents.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.documents.chunk_overlap >= self.documents.chunk_size {
            return Err(ConciergeError::Config(format!(
                "documents.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.documents.chunk_overlap, self.documents.chunk_size
            )));
        }
        if self.general.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConciergeError::Config(format!(
                "unknown time zone: {}",
                self.general.timezone
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConciergeError::Config(
                "retrieval.top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured time zone, defaulting to Asia/Kathmandu when unparsable.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.general
            .timezone
            .parse()
            .unwrap_or(chrono_tz::Asia::Kathmandu)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// IANA time zone used to resolve "today" when scheduling.
    pub timezone: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.concierge/data".to_string(),
            log_level: "info".to_string(),
            timezone: "Asia/Kathmandu".to_string(),
        }
    }
}

/// Document corpus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory scanned recursively for documents.
    pub dir: String,
    /// File extensions (without the dot) to load.
    pub extensions: Vec<String>,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: "./documents".to_string(),
            extensions: vec!["pdf".to_string(), "txt".to_string(), "md".to_string()],
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// "hash" (deterministic, offline) or "onnx" (sentence-transformer model).
    pub backend: String,
    /// Directory holding `model.onnx` and `tokenizer.json` for the onnx backend.
    pub model_dir: String,
    /// Vector size for the hash backend.
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "hash".to_string(),
            model_dir: "~/.concierge/models/all-mpnet-base-v2".to_string(),
            dimensions: 384,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks stuffed into the QA prompt.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Chat-completions backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Display name used in logs and errors.
    pub provider: String,
    /// OpenAI-compatible base URL (without `/chat/completions`).
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "Groq".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.2-3b-preview".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Agent dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Let the LLM choose a tool for utterances no keyword rule claims.
    /// When false those utterances go straight to the retrieval chain.
    pub llm_dispatch: bool,
    /// Upper bound on tool calls per utterance.
    pub max_iterations: usize,
    /// Attempts allowed for each contact field before giving up.
    pub max_prompt_attempts: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            llm_dispatch: true,
            max_iterations: 4,
            max_prompt_attempts: 3,
        }
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum number of messages (user + assistant) retained.
    pub max_messages: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_messages: 50 }
    }
}

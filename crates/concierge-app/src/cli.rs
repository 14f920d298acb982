//! CLI argument definitions for the concierge binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use concierge_core::config::ConciergeConfig;

/// Concierge - answers questions about your documents and books calls.
#[derive(Parser, Debug, Default)]
#[command(name = "concierge", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory of documents to answer questions from.
    #[arg(short = 'D', long = "documents")]
    pub documents: Option<PathBuf>,

    /// Data directory for the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Embedding backend: "hash" or "onnx".
    #[arg(long = "embedding")]
    pub embedding: Option<String>,

    /// Directory holding the ONNX embedding model and tokenizer.
    #[arg(long = "model-dir")]
    pub model_dir: Option<PathBuf>,

    /// Chat model name passed to the LLM provider.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Answer free-form questions straight from the documents instead of
    /// letting the LLM pick tools.
    #[arg(long = "no-agent")]
    pub no_agent: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CONCIERGE_CONFIG env var > ~/.concierge/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.config_path_with(std::env::var("CONCIERGE_CONFIG").ok())
    }

    fn config_path_with(&self, env: Option<String>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env.filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the document directory.
    ///
    /// Priority: --documents flag > CONCIERGE_DOCUMENTS env var > config file value.
    pub fn resolve_documents_dir(&self, config_dir: &str) -> PathBuf {
        self.documents_dir_with(std::env::var("CONCIERGE_DOCUMENTS").ok(), config_dir)
    }

    fn documents_dir_with(&self, env: Option<String>, config_dir: &str) -> PathBuf {
        if let Some(ref p) = self.documents {
            return p.clone();
        }
        if let Some(p) = env.filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        expand_home(config_dir)
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Fold the remaining flag overrides into the loaded configuration.
    pub fn apply(&self, config: &mut ConciergeConfig) {
        if let Some(ref dir) = self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref backend) = self.embedding {
            config.embedding.backend = backend.clone();
        }
        if let Some(ref dir) = self.model_dir {
            config.embedding.model_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref model) = self.model {
            config.llm.model = model.clone();
        }
        if self.no_agent {
            config.agent.llm_dispatch = false;
        }
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

fn home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    expand_home("~/.concierge/config.toml")
}

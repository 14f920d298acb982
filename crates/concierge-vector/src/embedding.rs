//! Embedding service trait and implementations.
//!
//! - `OnnxEmbeddingService` runs a sentence-transformer ONNX export (e.g.
//!   all-mpnet-base-v2) through ort, tokenizing with the HuggingFace
//!   tokenizers crate.
//! - `HashEmbedding` hashes word tokens into a fixed number of buckets. It
//!   needs no model files, so it backs offline runs and tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, Mutex};

use concierge_core::error::ConciergeError;
use ort::session::Session;
use ort::value::TensorRef;
use tokenizers::Tokenizer;
use tracing::info;

/// Service for generating text embeddings.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, ConciergeError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// The backend is picked from configuration at runtime, so the document
/// store holds an `Arc<dyn DynEmbeddingService>`.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, ConciergeError>> + Send + 'a>,
    >;

    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, ConciergeError>> + Send + 'a>,
    > {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// OnnxEmbeddingService
// ---------------------------------------------------------------------------

/// Longest token sequence fed to the model; longer inputs are truncated.
const MAX_SEQUENCE_LENGTH: usize = 384;

/// ONNX Runtime-backed sentence-transformer embeddings.
///
/// Expects a model directory containing `model.onnx` and `tokenizer.json`.
/// Token embeddings are mean-pooled over the attention mask and
/// L2-normalized.
pub struct OnnxEmbeddingService {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    dimensions: usize,
    /// Whether the model declares a `token_type_ids` input (BERT does,
    /// MPNet does not).
    uses_token_types: bool,
}

impl std::fmt::Debug for OnnxEmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingService")
            .field("dimensions", &self.dimensions)
            .field("uses_token_types", &self.uses_token_types)
            .finish()
    }
}

impl OnnxEmbeddingService {
    /// Load a model from a directory holding `model.onnx` and `tokenizer.json`.
    pub fn from_directory(model_dir: &Path) -> Result<Self, ConciergeError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for required in [&model_path, &tokenizer_path] {
            if !required.exists() {
                return Err(ConciergeError::Embedding(format!(
                    "model file not found: {}",
                    required.display()
                )));
            }
        }

        let session = Session::builder()
            .map_err(|e| ConciergeError::Embedding(format!("ONNX session builder: {}", e)))?
            .with_intra_threads(1)
            .map_err(|e| ConciergeError::Embedding(format!("ONNX set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| ConciergeError::Embedding(format!("ONNX load model: {}", e)))?;

        let uses_token_types = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        // Output is [batch, seq_len, hidden_dim]; mpnet-base reports 768.
        let dimensions = session
            .outputs()
            .first()
            .and_then(|out| out.dtype().tensor_shape())
            .and_then(|shape| shape.last().copied())
            .filter(|d| *d > 0)
            .map(|d| d as usize)
            .unwrap_or(768);

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            ConciergeError::Embedding(format!("Failed to load tokenizer: {}", e))
        })?;

        info!(
            model = %model_path.display(),
            dimensions,
            uses_token_types,
            "Loaded ONNX embedding model"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            dimensions,
            uses_token_types,
        })
    }

    fn embed_sync(&self, text: &str) -> Result<Vec<f32>, ConciergeError> {
        if text.trim().is_empty() {
            return Err(ConciergeError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ConciergeError::Embedding(format!("Tokenization failed: {}", e)))?;

        let seq_len = encoding.get_ids().len().min(MAX_SEQUENCE_LENGTH);
        let input_ids: Vec<i64> = encoding.get_ids()[..seq_len]
            .iter()
            .map(|&id| id as i64)
            .collect();
        let attention_mask: Vec<i64> = encoding.get_attention_mask()[..seq_len]
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids()[..seq_len]
            .iter()
            .map(|&t| t as i64)
            .collect();

        let to_array = |values: Vec<i64>, name: &str| {
            ndarray::Array2::from_shape_vec((1, seq_len), values)
                .map_err(|e| ConciergeError::Embedding(format!("{} array: {}", name, e)))
        };
        let ids_array = to_array(input_ids, "input_ids")?;
        let mask_array = to_array(attention_mask.clone(), "attention_mask")?;
        let type_array = to_array(token_type_ids, "token_type_ids")?;

        let ids_ref = TensorRef::from_array_view(&ids_array)
            .map_err(|e| ConciergeError::Embedding(format!("TensorRef input_ids: {}", e)))?;
        let mask_ref = TensorRef::from_array_view(&mask_array)
            .map_err(|e| ConciergeError::Embedding(format!("TensorRef attention_mask: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ConciergeError::Embedding(format!("Session lock poisoned: {}", e)))?;

        let outputs = if self.uses_token_types {
            let type_ref = TensorRef::from_array_view(&type_array).map_err(|e| {
                ConciergeError::Embedding(format!("TensorRef token_type_ids: {}", e))
            })?;
            session.run(ort::inputs![ids_ref, mask_ref, type_ref])
        } else {
            session.run(ort::inputs![ids_ref, mask_ref])
        }
        .map_err(|e| ConciergeError::Embedding(format!("ONNX inference failed: {}", e)))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ConciergeError::Embedding(format!("Extract embeddings: {}", e)))?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        let hidden_dim = match dims.as_slice() {
            [_, .., last] if *last > 0 => *last as usize,
            other => {
                return Err(ConciergeError::Embedding(format!(
                    "Unexpected output shape: {:?}",
                    other
                )))
            }
        };

        Ok(mean_pool(data, &attention_mask, hidden_dim))
    }
}

/// Masked mean pooling over the sequence dimension, then L2 normalization.
fn mean_pool(data: &[f32], attention_mask: &[i64], hidden_dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_dim];
    let mut count = 0.0f32;

    for (tok_idx, &mask_val) in attention_mask.iter().enumerate() {
        if mask_val > 0 {
            let offset = tok_idx * hidden_dim;
            if offset + hidden_dim > data.len() {
                break;
            }
            for (dim, slot) in pooled.iter_mut().enumerate() {
                *slot += data[offset + dim];
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for val in &mut pooled {
            *val /= count;
        }
    }
    l2_normalize(&mut pooled);
    pooled
}

fn l2_normalize(values: &mut [f32]) {
    let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in values.iter_mut() {
            *val /= norm;
        }
    }
}

impl EmbeddingService for OnnxEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ConciergeError> {
        // Inference is CPU-bound; keep it off the async workers.
        let svc = OnnxEmbeddingService {
            session: Arc::clone(&self.session),
            tokenizer: Arc::clone(&self.tokenizer),
            dimensions: self.dimensions,
            uses_token_types: self.uses_token_types,
        };
        let text_owned = text.to_string();

        tokio::task::spawn_blocking(move || svc.embed_sync(&text_owned))
            .await
            .map_err(|e| ConciergeError::Embedding(format!("Embedding task panicked: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// HashEmbedding
// ---------------------------------------------------------------------------

/// Deterministic hashed bag-of-words embedding.
///
/// Each lowercase alphanumeric token is hashed to a bucket and a sign, so
/// texts sharing vocabulary land close together under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimensions: usize,
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

impl HashEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let h = hasher.finish();
            let bucket = (h % self.dimensions as u64) as usize;
            let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl EmbeddingService for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ConciergeError> {
        if text.trim().is_empty() {
            return Err(ConciergeError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

//! Concierge Vector crate - document loading, chunking, embedding and retrieval.
//!
//! Documents are read from disk, split into overlapping chunks, embedded and
//! kept in an in-memory cosine-similarity index that answers top-k queries.

pub mod embedding;
pub mod index;
pub mod loader;
pub mod splitter;
pub mod store;

pub use embedding::{DynEmbeddingService, EmbeddingService, HashEmbedding, OnnxEmbeddingService};
pub use index::{SearchHit, VectorIndex};
pub use loader::{Document, DocumentLoader};
pub use splitter::{Chunk, RecursiveTextSplitter};
pub use store::{DocumentStore, IngestReport, RetrievedChunk, DEFAULT_TOP_K};

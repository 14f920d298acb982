//! Document store: chunk, embed and index a corpus, then answer top-k queries.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use concierge_core::error::ConciergeError;

use crate::embedding::DynEmbeddingService;
use crate::index::VectorIndex;
use crate::loader::Document;
use crate::splitter::{Chunk, RecursiveTextSplitter};

/// Number of chunks returned by [`DocumentStore::search`] when callers have
/// no opinion.
pub const DEFAULT_TOP_K: usize = 4;

/// Counts from a single ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// A chunk returned from a similarity search, with its cosine score.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f64,
}

/// Vector store over the document corpus.
pub struct DocumentStore {
    index: VectorIndex,
    embedder: Arc<dyn DynEmbeddingService>,
    splitter: RecursiveTextSplitter,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("chunks", &self.index.len())
            .field("dimensions", &self.embedder.dimensions())
            .field("splitter", &self.splitter)
            .finish()
    }
}

impl DocumentStore {
    pub fn new(embedder: Arc<dyn DynEmbeddingService>, splitter: RecursiveTextSplitter) -> Self {
        Self {
            index: VectorIndex::new(),
            embedder,
            splitter,
        }
    }

    /// Split, embed and index `documents`.
    ///
    /// Chunks are appended to whatever is already indexed. An embedding
    /// failure aborts the run and leaves earlier chunks of this run indexed.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestReport, ConciergeError> {
        let chunks = self.splitter.split_documents(documents);
        let total = chunks.len();

        for chunk in chunks {
            let embedding = self.embedder.embed_boxed(&chunk.text).await?;
            if embedding.len() != self.embedder.dimensions() {
                return Err(ConciergeError::Embedding(format!(
                    "Embedding has {} dimensions, expected {}",
                    embedding.len(),
                    self.embedder.dimensions()
                )));
            }
            debug!(source = %chunk.source, ordinal = chunk.ordinal, "Indexed chunk");
            self.index.insert(chunk, embedding)?;
        }

        let report = IngestReport {
            documents: documents.len(),
            chunks: total,
        };
        info!(
            documents = report.documents,
            chunks = report.chunks,
            "Corpus ingested"
        );
        Ok(report)
    }

    /// Return up to `k` chunks most similar to `query`, best first.
    ///
    /// An empty store yields no results rather than an error.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, ConciergeError> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.trim().is_empty() {
            return Err(ConciergeError::Search("Query is empty".to_string()));
        }

        let embedding = self.embedder.embed_boxed(query).await?;
        let hits = self.index.search(&embedding, k)?;
        debug!(query_len = query.len(), hits = hits.len(), "Vector search");

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                chunk: hit.chunk,
                score: hit.score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

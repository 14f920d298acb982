//! In-memory vector index with brute-force cosine similarity search.
//!
//! Search is O(n) over the stored chunks, which is fine for a corpus that
//! fits in a directory of PDFs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use concierge_core::error::ConciergeError;

use crate::splitter::Chunk;

/// A single hit returned from a vector search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Chunk,
    /// Cosine similarity score.
    pub score: f64,
}

#[derive(Debug, Clone)]
struct VectorEntry {
    embedding: Vec<f32>,
    chunk: Chunk,
}

/// Thread-safe in-memory vector index keyed by chunk ID.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Arc<RwLock<HashMap<Uuid, VectorEntry>>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk with its embedding, replacing any entry with the same ID.
    pub fn insert(&self, chunk: Chunk, embedding: Vec<f32>) -> Result<(), ConciergeError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| ConciergeError::Search(format!("Lock poisoned: {}", e)))?;
        entries.insert(chunk.id, VectorEntry { embedding, chunk });
        Ok(())
    }

    /// Return the `k` chunks most similar to `query`, best first.
    ///
    /// Ties are broken by source path and ordinal so results are stable.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, ConciergeError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| ConciergeError::Search(format!("Lock poisoned: {}", e)))?;

        let mut scored: Vec<SearchHit> = entries
            .values()
            .map(|entry| SearchHit {
                score: cosine_similarity(query, &entry.embedding),
                chunk: entry.chunk.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.source.cmp(&b.chunk.source))
                .then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });
        scored.truncate(k);

        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero-magnitude vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, ordinal: usize, text: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            source: source.to_string(),
            ordinal,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_insert_and_search() {
        let index = VectorIndex::new();
        index.insert(chunk("a", 0, "one"), vec![1.0, 0.0]).unwrap();
        index.insert(chunk("a", 1, "two"), vec![0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 2);

        let hits = index.search(&[1.0, 0.1], 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "one");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::new();
        assert!(index.search(&[1.0; 8], 4).unwrap().is_empty());
    }

    #[test]
    fn test_search_respects_k_limit() {
        let index = VectorIndex::new();
        for i in 0..10 {
            index.insert(chunk("a", i, "x"), vec![1.0; 4]).unwrap();
        }
        assert_eq!(index.search(&[1.0; 4], 3).unwrap().len(), 3);
    }

    #[test]
    fn test_ties_ordered_by_source_then_ordinal() {
        let index = VectorIndex::new();
        index.insert(chunk("b.txt", 0, "b0"), vec![1.0; 4]).unwrap();
        index.insert(chunk("a.txt", 1, "a1"), vec![1.0; 4]).unwrap();
        index.insert(chunk("a.txt", 0, "a0"), vec![1.0; 4]).unwrap();

        let texts: Vec<_> = index
            .search(&[1.0; 4], 3)
            .unwrap()
            .into_iter()
            .map(|h| h.chunk.text)
            .collect();
        assert_eq!(texts, vec!["a0", "a1", "b0"]);
    }

    #[test]
    fn test_insert_same_id_overwrites() {
        let index = VectorIndex::new();
        let mut c = chunk("a", 0, "old");
        index.insert(c.clone(), vec![1.0; 4]).unwrap();
        c.text = "new".to_string();
        index.insert(c, vec![1.0; 4]).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.search(&[1.0; 4], 1).unwrap()[0].chunk.text, "new");
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        assert!((cosine_similarity(&[1.0; 10], &[1.0; 10]) - 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0; 10], &[1.0; 10]), 0.0);
        assert_eq!(cosine_similarity(&[1.0; 10], &[1.0; 20]), 0.0);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
    }
}

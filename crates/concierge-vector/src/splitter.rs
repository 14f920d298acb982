//! Recursive character text splitter.
//!
//! Splits on the coarsest separator that appears in the text (paragraphs,
//! then lines, then words, then characters) and greedily merges the pieces
//! back into chunks no longer than `chunk_size` characters. Neighbouring
//! chunks share up to `chunk_overlap` characters of trailing context.

use std::collections::VecDeque;

use uuid::Uuid;

use concierge_core::error::ConciergeError;

use crate::loader::Document;

const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// A piece of a source document, sized for embedding and prompting.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: Uuid,
    /// Path of the document the chunk came from.
    pub source: String,
    /// Position of the chunk within its document, starting at 0.
    pub ordinal: usize,
    pub text: String,
}

/// Splitter configured with a chunk size and overlap, both in characters.
#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ConciergeError> {
        if chunk_size == 0 {
            return Err(ConciergeError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ConciergeError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split every document into chunks tagged with their source.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .enumerate()
                    .map(|(ordinal, text)| Chunk {
                        id: Uuid::new_v4(),
                        source: doc.source.clone(),
                        ordinal,
                        text,
                    })
            })
            .collect()
    }

    /// Split raw text into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text; "" always matches.
        let (idx, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len().saturating_sub(1), ""));
        let remaining = &separators[(idx + 1).min(separators.len())..];

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in splits {
            if char_len(&piece) <= self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    fn merge(&self, splits: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { sep_len };

            if total + len + joiner > self.chunk_size && !current.is_empty() {
                push_joined(&mut docs, &current, separator);
                // Drop from the front until what is left fits as overlap.
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if current.is_empty() { 0 } else { sep_len }
                            > self.chunk_size)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if current.is_empty() { 0 } else { sep_len };
                }
            }

            let joiner = if current.is_empty() { 0 } else { sep_len };
            current.push_back(piece);
            total += len + joiner;
        }
        push_joined(&mut docs, &current, separator);
        docs
    }
}

fn push_joined(docs: &mut Vec<String>, parts: &VecDeque<&str>, separator: &str) {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(RecursiveTextSplitter::new(0, 0).is_err());
        assert!(RecursiveTextSplitter::new(100, 100).is_err());
        assert!(RecursiveTextSplitter::new(100, 150).is_err());
        assert!(RecursiveTextSplitter::new(1000, 200).is_ok());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveTextSplitter::new(1000, 200).unwrap();
        assert_eq!(splitter.split_text("  hello world  "), vec!["hello world"]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let splitter = RecursiveTextSplitter::new(10, 2).unwrap();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("\n\n\n\n").is_empty());
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = RecursiveTextSplitter::new(50, 10).unwrap();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {:?}", chunk);
        }
    }

    #[test]
    fn test_paragraphs_preferred_over_words() {
        let splitter = RecursiveTextSplitter::new(30, 0).unwrap();
        let text = "first paragraph here\n\nsecond paragraph here";
        assert_eq!(
            splitter.split_text(text),
            vec!["first paragraph here", "second paragraph here"]
        );
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let splitter = RecursiveTextSplitter::new(20, 8).unwrap();
        let text = "one two three four five six seven eight nine ten";
        let chunks = splitter.split_text(text);
        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(
                pair[1].starts_with(last_word),
                "expected {:?} to start with {:?}",
                pair[1],
                last_word
            );
        }
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = RecursiveTextSplitter::new(10, 0).unwrap();
        let chunks = splitter.split_text(&"x".repeat(35));
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], "x".repeat(10));
        assert_eq!(chunks[3], "x".repeat(5));
    }

    #[test]
    fn test_multibyte_text_is_safe() {
        let splitter = RecursiveTextSplitter::new(5, 1).unwrap();
        let chunks = splitter.split_text("नमस्ते संसार नमस्ते");
        assert!(!chunks.is_empty());
        for chunk in chunks {
            assert!(chunk.chars().count() <= 5);
        }
    }

    #[test]
    fn test_split_documents_tags_source_and_ordinal() {
        let splitter = RecursiveTextSplitter::new(12, 0).unwrap();
        let docs = vec![
            Document::new("a.txt", "alpha beta gamma delta"),
            Document::new("b.txt", "short"),
        ];
        let chunks = splitter.split_documents(&docs);
        let a: Vec<_> = chunks.iter().filter(|c| c.source == "a.txt").collect();
        assert!(a.len() >= 2);
        assert_eq!(a[0].ordinal, 0);
        assert_eq!(a[1].ordinal, 1);
        let b: Vec<_> = chunks.iter().filter(|c| c.source == "b.txt").collect();
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].text, "short");
    }
}

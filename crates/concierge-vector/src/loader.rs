//! Directory document loader.
//!
//! Walks a corpus directory and turns every file with a matching extension
//! into a [`Document`]. PDFs go through `pdf-extract` when the `pdf` feature
//! is enabled; everything else is read as UTF-8 text.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use concierge_core::error::ConciergeError;

/// A loaded source document.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    /// Path the document was read from.
    pub source: String,
    pub content: String,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Loads documents from a directory tree.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DocumentLoader {
    /// `extensions` are matched case-insensitively and without the leading dot.
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Load every matching file under the root, in path order.
    ///
    /// Files that cannot be read are logged and skipped. A missing root
    /// directory is an error.
    pub fn load(&self) -> Result<Vec<Document>, ConciergeError> {
        if !self.root.is_dir() {
            return Err(ConciergeError::Document(format!(
                "document directory not found: {}",
                self.root.display()
            )));
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && self.matches(e.path()))
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match read_document(&path) {
                Ok(content) if content.trim().is_empty() => {
                    debug!(path = %path.display(), "Skipping document with no text");
                }
                Ok(content) => {
                    documents.push(Document::new(path.display().to_string(), content));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load document");
                }
            }
        }

        info!(
            root = %self.root.display(),
            count = documents.len(),
            "Documents loaded"
        );
        Ok(documents)
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

fn read_document(path: &Path) -> Result<String, ConciergeError> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        read_pdf(path)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(feature = "pdf")]
fn read_pdf(path: &Path) -> Result<String, ConciergeError> {
    pdf_extract::extract_text(path)
        .map_err(|e| ConciergeError::Document(format!("PDF extraction failed: {}", e)))
}

#[cfg(not(feature = "pdf"))]
fn read_pdf(path: &Path) -> Result<String, ConciergeError> {
    Err(ConciergeError::Document(format!(
        "PDF support not compiled in (enable the `pdf` feature): {}",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_directory_is_error() {
        let loader = DocumentLoader::new("/nonexistent/docs", &exts(&["txt"]));
        assert!(matches!(loader.load(), Err(ConciergeError::Document(_))));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new(dir.path(), &exts(&["txt"]));
        assert!(loader.load().unwrap().is_empty());
    }

    #[test]
    fn test_loads_matching_extensions_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("b.MD"), "bravo").unwrap();
        std::fs::write(dir.path().join("c.csv"), "charlie").unwrap();

        let loader = DocumentLoader::new(dir.path(), &exts(&[".txt", "md"]));
        let docs = loader.load().unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "alpha");
        assert!(docs[1].source.ends_with("b.MD"));
    }

    #[test]
    fn test_skips_blank_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.txt"), "   \n").unwrap();
        std::fs::write(dir.path().join("real.txt"), "content").unwrap();

        let docs = DocumentLoader::new(dir.path(), &exts(&["txt"])).load().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "content");
    }

    #[test]
    fn test_corrupt_pdf_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "kept").unwrap();

        let docs = DocumentLoader::new(dir.path(), &exts(&["pdf", "txt"]))
            .load()
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "kept");
    }
}

//! Host documents handed to analyzers.

use std::fs;
use std::path::Path;

/// A source document as the host presents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    /// Host language identifier (`php`, `typescript`, `openhab`, ...).
    pub language_id: String,
    pub file_name: String,
    /// Unsaved changes pending in the host.
    pub dirty: bool,
}

impl Document {
    pub fn new(
        language_id: impl Into<String>,
        file_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            language_id: language_id.into(),
            file_name: file_name.into(),
            dirty: false,
        }
    }

    /// Read a document from disk.
    pub fn from_path<P: AsRef<Path>>(path: P, language_id: &str) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(Self::new(language_id, path.to_string_lossy(), text))
    }

    pub fn language_is(&self, id: &str) -> bool {
        self.language_id.eq_ignore_ascii_case(id)
    }

    /// File extension without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
    }

    /// Same file as `other`, regardless of content.
    pub fn same_file(&self, other: &Document) -> bool {
        self.file_name == other.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_match_ignores_case() {
        let doc = Document::new("PHP", "a.php", "<?php");
        assert!(doc.language_is("php"));
        assert_eq!(doc.extension(), Some("php"));
        assert!(!doc.dirty);
    }

    #[test]
    fn test_from_path_reads_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home.rules");
        fs::write(&path, "rule \"x\"\nend\n").unwrap();
        let doc = Document::from_path(&path, "openhab").unwrap();
        assert!(doc.text.starts_with("rule"));
        assert!(doc.file_name.ends_with("home.rules"));
    }
}

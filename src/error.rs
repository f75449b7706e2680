//! Error taxonomy shared by analyzers, the registry and entity generation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by outline extraction and entity generation.
///
/// Analyzer-level variants (`UnsupportedLanguage`, `ParseFailure`) are
/// absorbed by the registry and the orchestrator; generation-level variants
/// are returned to the caller with the offending name or path.
#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("no analyzer available for language \"{0}\"")]
    UnsupportedLanguage(String),

    #[error("failed to parse {file}: {message}")]
    ParseFailure { file: String, message: String },

    #[error("no classes, traits or interfaces found in {0}")]
    NoEntities(String),

    #[error("several entities match, select one of: {}", .0.join(", "))]
    AmbiguousSelection(Vec<String>),

    #[error("entity \"{0}\" not found in the current outline")]
    UnknownEntity(String),

    #[error("file \"{}\" already exists", .0.display())]
    DestinationConflict(PathBuf),

    #[error("entity generation requires an open workspace")]
    NoWorkspace,

    #[error("entity name cannot be empty")]
    EmptyName,

    #[error("entity generation is not supported for language \"{0}\"")]
    GenerationUnsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OutlineError {
    /// Build a parse failure for a file from any displayable cause.
    pub fn parse(file: impl Into<String>, message: impl std::fmt::Display) -> Self {
        OutlineError::ParseFailure {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error only means the outline is stale or empty.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OutlineError::UnsupportedLanguage(_) | OutlineError::ParseFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OutlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = OutlineError::DestinationConflict(PathBuf::from("src/Foo.php"));
        assert_eq!(err.to_string(), "file \"src/Foo.php\" already exists");

        let err = OutlineError::UnsupportedLanguage("cobol".to_string());
        assert!(err.to_string().contains("cobol"));

        let err = OutlineError::AmbiguousSelection(vec!["A".into(), "B".into()]);
        assert!(err.to_string().ends_with("A, B"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(OutlineError::parse("a.php", "unexpected token").is_transient());
        assert!(OutlineError::UnsupportedLanguage("x".into()).is_transient());
        assert!(!OutlineError::EmptyName.is_transient());
        assert!(!OutlineError::NoWorkspace.is_transient());
    }
}

//! Core traits for language analysis.

use tree_sitter::{Language, Parser};

use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::{OutlineError, Result};
use crate::tokens::TokenTree;

/// Holds a parsed tree-sitter tree and associated metadata.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The original source code (kept for node text extraction).
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: String,
}

impl ParsedFile {
    /// Parse a document with the given grammar.
    pub fn parse(language: &Language, document: &Document) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|e| OutlineError::parse(&document.file_name, e))?;
        let tree = parser
            .parse(document.text.as_bytes(), None)
            .ok_or_else(|| OutlineError::parse(&document.file_name, "parser produced no tree"))?;

        Ok(Self {
            tree,
            source: document.text.as_bytes().to_vec(),
            path: document.file_name.clone(),
        })
    }

    /// Get the source code as a string slice.
    pub fn source_str(&self) -> &str {
        std::str::from_utf8(&self.source).unwrap_or("")
    }

    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Text of a named field of `node`, if present.
    pub fn field_text(&self, node: tree_sitter::Node, field: &str) -> Option<&str> {
        node.child_by_field_name(field).map(|n| self.node_text(n))
    }

    /// Fail when the grammar rejected part of the document.
    pub fn reject_errors(&self) -> Result<()> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return Ok(());
        }
        let at = first_error(root)
            .map(|n| {
                let p = n.start_position();
                format!("syntax error at {}:{}", p.row + 1, p.column + 1)
            })
            .unwrap_or_else(|| "syntax error".to_string());
        Err(OutlineError::parse(&self.path, at))
    }
}

fn first_error(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

/// Language-specific analyzer trait.
///
/// Analyzers are stateless: every call builds a fresh [`TokenTree`]. The
/// registry owns the most recent tree per analyzer.
///
/// # Thread Safety
///
/// Note: tree_sitter::Parser is not Sync, so implementations create
/// parsers per call.
pub trait LanguageAnalyzer: Send + Sync {
    /// Provider name used by `allowed_providers` (e.g., "php", "cfamily").
    fn provider(&self) -> &'static str;

    /// Host language ids this analyzer handles.
    fn language_ids(&self) -> &'static [&'static str];

    /// Whether this analyzer claims the document.
    ///
    /// The default matches on language id only; analyzers sharing an
    /// ambiguous id also consult the file name.
    fn has_support(&self, document: &Document) -> bool {
        self.language_ids()
            .iter()
            .any(|id| document.language_is(id))
    }

    /// Build the token tree of a document.
    fn analyze(&self, document: &Document, settings: &LanguageSettings) -> Result<TokenTree>;
}

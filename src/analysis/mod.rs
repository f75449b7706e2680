//! Source analysis: one analyzer per language, each producing a
//! [`TokenTree`](crate::tokens::TokenTree).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Document        │────▶│ Analyzer     │────▶│ TokenTree     │
//! └─────────────────┘     │ (registry    │     │ (namespace,   │
//!                         │  slot)       │     │  entities...) │
//!                         └──────────────┘     └───────────────┘
//!                                                      │
//!                                    ┌─────────────────┴──────┐
//!                                    ▼                        ▼
//!                             ┌─────────────┐         ┌──────────────┐
//!                             │ Projector   │         │ Generator    │
//!                             └─────────────┘         └──────────────┘
//! ```
//!
//! # Adding a New Language
//!
//! 1. Create a new module in `src/analysis/languages/` (e.g., `ruby.rs`)
//! 2. Implement `LanguageAnalyzer` trait
//! 3. Add a variant to [`Analyzer`] and list it in [`Analyzer::all`]
//! 4. Map its file extensions in `languages::language_for_extension`

mod context;
mod languages;
mod modifiers;
mod registry;
pub mod text;
mod traits;

use tree_sitter::Node;

pub use context::{AnalysisContext, FileOutline};
pub use languages::{
    language_for_extension, registered_extensions, separators, CFamilyAnalyzer, CssAnalyzer,
    DocumentSymbol, ItemsAnalyzer, JavaAnalyzer, JsonAnalyzer, LessAnalyzer, PhpAnalyzer, PythonAnalyzer,
    RapidAnalyzer, RulesAnalyzer, SymbolKind, SymbolProvider, TreeSitterSymbols,
    TypeScriptAnalyzer,
};
pub use modifiers::Modifiers;
pub use registry::{detect_language, Analyzer, AnalyzerRegistry};
pub use traits::{LanguageAnalyzer, ParsedFile};

/// All children of a node, in order.
pub(crate) fn children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children of a node, in order.
pub(crate) fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

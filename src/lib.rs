//! Outliner - multi-language code outlines and entity scaffolding.
//!
//! Outliner extracts a structural outline (namespaces, types, members) from
//! a source file, projects it into a navigable tree with a jump-to position
//! for every node, and generates new interface or implementation files
//! from the shape of an existing type.
//!
//! # Architecture
//!
//! - `tokens`: the language-agnostic token tree every analyzer produces
//! - `analysis`: per-language analyzers, the registry and batch analysis
//! - `outline`: projection of a token tree into display nodes
//! - `generate`: PHP, Java and TypeScript entity generators
//! - `orchestrator`: the active document, events, pinning and generation
//! - `config`: YAML workspace configuration
//! - `report`: output formatting (pretty, JSON)
//!
//! # Adding a New Language
//!
//! See `src/analysis/languages/` for examples. Implement `LanguageAnalyzer`
//! and add a variant to `analysis::Analyzer`.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod orchestrator;
pub mod outline;
pub mod report;
pub mod tokens;

pub use analysis::{
    detect_language, AnalysisContext, Analyzer, AnalyzerRegistry, FileOutline, LanguageAnalyzer,
};
pub use config::Config;
pub use document::Document;
pub use error::{OutlineError, Result};
pub use generate::{EntityGenerator, GenerateOptions, GenerationMode, Generator, TextEdit};
pub use orchestrator::{Orchestrator, Prompter};
pub use outline::{OutlineNode, Projector};
pub use tokens::TokenTree;

//! Analyzer registry and dispatch.
//!
//! The registry holds an ordered list of slots; each slot owns one analyzer
//! and the last tree it produced. The first analyzer claiming a document
//! handles it.

use std::path::Path;

use tracing::{debug, warn};

use crate::analysis::languages::{
    language_for_extension, CFamilyAnalyzer, CssAnalyzer, ItemsAnalyzer, JavaAnalyzer,
    JsonAnalyzer, LessAnalyzer, PhpAnalyzer, PythonAnalyzer, RapidAnalyzer, RulesAnalyzer, TypeScriptAnalyzer,
};
use crate::analysis::{text, LanguageAnalyzer};
use crate::config::Config;
use crate::document::Document;
use crate::error::{OutlineError, Result};
use crate::tokens::TokenTree;

/// Every analyzer the crate ships.
pub enum Analyzer {
    Php(PhpAnalyzer),
    Java(JavaAnalyzer),
    TypeScript(TypeScriptAnalyzer),
    CFamily(CFamilyAnalyzer),
    Python(PythonAnalyzer),
    Rules(RulesAnalyzer),
    Items(ItemsAnalyzer),
    Css(CssAnalyzer),
    Less(LessAnalyzer),
    Rapid(RapidAnalyzer),
    Json(JsonAnalyzer),
}

impl Analyzer {
    /// All analyzers in dispatch order.
    pub fn all() -> Vec<Analyzer> {
        vec![
            Analyzer::Php(PhpAnalyzer::new()),
            Analyzer::Java(JavaAnalyzer::new()),
            Analyzer::TypeScript(TypeScriptAnalyzer::new()),
            Analyzer::CFamily(CFamilyAnalyzer::new()),
            Analyzer::Python(PythonAnalyzer::new()),
            Analyzer::Rules(RulesAnalyzer::new()),
            Analyzer::Items(ItemsAnalyzer::new()),
            Analyzer::Css(CssAnalyzer::new()),
            Analyzer::Less(LessAnalyzer::new()),
            Analyzer::Rapid(RapidAnalyzer::new()),
            Analyzer::Json(JsonAnalyzer::new()),
        ]
    }

    pub fn inner(&self) -> &dyn LanguageAnalyzer {
        match self {
            Analyzer::Php(a) => a,
            Analyzer::Java(a) => a,
            Analyzer::TypeScript(a) => a,
            Analyzer::CFamily(a) => a,
            Analyzer::Python(a) => a,
            Analyzer::Rules(a) => a,
            Analyzer::Items(a) => a,
            Analyzer::Css(a) => a,
            Analyzer::Less(a) => a,
            Analyzer::Rapid(a) => a,
            Analyzer::Json(a) => a,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.inner().provider()
    }

    pub fn has_support(&self, document: &Document) -> bool {
        self.inner().has_support(document)
    }

    pub fn analyze(&self, document: &Document, config: &Config) -> Result<TokenTree> {
        let settings = config.language(&document.language_id);
        let mut tree = self.inner().analyze(document, &settings)?;
        if !document.text.is_ascii() {
            text::use_char_columns(&mut tree, &document.text);
        }
        Ok(tree)
    }
}

struct Slot {
    analyzer: Analyzer,
    tree: TokenTree,
}

/// Ordered analyzers, each with its most recent tree.
pub struct AnalyzerRegistry {
    slots: Vec<Slot>,
}

impl AnalyzerRegistry {
    /// A registry with every analyzer.
    pub fn new() -> Self {
        Self::with_analyzers(Analyzer::all())
    }

    pub fn with_analyzers(analyzers: Vec<Analyzer>) -> Self {
        Self {
            slots: analyzers
                .into_iter()
                .map(|analyzer| Slot {
                    analyzer,
                    tree: TokenTree::default(),
                })
                .collect(),
        }
    }

    /// A registry restricted to the configured providers.
    pub fn from_config(config: &Config) -> Self {
        Self::with_analyzers(
            Analyzer::all()
                .into_iter()
                .filter(|a| config.is_provider_allowed(a.provider()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn has_support(&self, document: &Document) -> bool {
        self.find(document).is_ok()
    }

    /// Index of the first analyzer claiming the document.
    pub fn find(&self, document: &Document) -> Result<usize> {
        self.slots
            .iter()
            .position(|slot| slot.analyzer.has_support(document))
            .ok_or_else(|| OutlineError::UnsupportedLanguage(document.language_id.clone()))
    }

    pub fn analyzer(&self, index: usize) -> Option<&Analyzer> {
        self.slots.get(index).map(|slot| &slot.analyzer)
    }

    /// Analyze without touching any slot.
    pub fn analyze(&self, document: &Document, config: &Config) -> Result<TokenTree> {
        let index = self.find(document)?;
        self.slots[index].analyzer.analyze(document, config)
    }

    /// Re-analyze a document into its slot.
    ///
    /// On failure the slot keeps its previous tree.
    pub fn refresh(&mut self, document: &Document, config: &Config) -> Result<usize> {
        let index = self.find(document)?;
        let slot = &mut self.slots[index];
        let tree = slot.analyzer.analyze(document, config)?;
        debug!(
            file = %document.file_name,
            provider = slot.analyzer.provider(),
            entities = tree.entity_count(),
            "refreshed outline"
        );
        slot.tree = tree;
        Ok(index)
    }

    /// Last tree of a slot.
    pub fn tree(&self, index: usize) -> Option<&TokenTree> {
        self.slots.get(index).map(|slot| &slot.tree)
    }

    /// Refresh, then read the slot's tree.
    ///
    /// Unsupported documents yield an empty tree; parse failures yield the
    /// previous tree of the slot.
    pub fn token_tree(&mut self, document: &Document, config: &Config) -> TokenTree {
        match self.refresh(document, config) {
            Ok(index) => self.slots[index].tree.clone(),
            Err(OutlineError::UnsupportedLanguage(language)) => {
                debug!(%language, file = %document.file_name, "no analyzer");
                TokenTree::default()
            }
            Err(err) => {
                warn!(file = %document.file_name, error = %err, "keeping previous outline");
                self.find(document)
                    .ok()
                    .and_then(|index| self.tree(index).cloned())
                    .unwrap_or_default()
            }
        }
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Host language id for a path: configured associations first, then the
/// built-in extension table.
pub fn detect_language(path: &Path, config: &Config) -> Option<String> {
    if let Some(language) = config.associated_language(path) {
        return Some(language.to_string());
    }
    let ext = path.extension().and_then(|e| e.to_str())?;
    language_for_extension(ext).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Position;

    fn php(text: &str) -> Document {
        Document::new("php", "src/Foo.php", text)
    }

    #[test]
    fn test_dispatch_by_language() {
        let registry = AnalyzerRegistry::new();
        let rules = Document::new("openhab", "home.rules", "");
        let items = Document::new("openhab", "home.items", "");
        let other = Document::new("openhab", "home.things", "");

        let provider = |doc: &Document| {
            registry
                .find(doc)
                .ok()
                .and_then(|i| registry.analyzer(i))
                .map(|a| a.inner().language_ids()[0])
        };
        assert_eq!(provider(&php("")), Some("php"));
        assert_eq!(
            registry.analyzer(registry.find(&rules).unwrap()).unwrap().provider(),
            "openhab"
        );
        assert_ne!(registry.find(&rules).unwrap(), registry.find(&items).unwrap());
        assert!(!registry.has_support(&other));
    }

    #[test]
    fn test_unsupported_language_names_the_id() {
        let registry = AnalyzerRegistry::new();
        let doc = Document::new("cobol", "main.cbl", "");
        match registry.find(&doc) {
            Err(OutlineError::UnsupportedLanguage(id)) => assert_eq!(id, "cobol"),
            _ => panic!("expected UnsupportedLanguage"),
        }

        let mut registry = registry;
        assert!(registry.token_tree(&doc, &Config::default()).is_empty());
    }

    #[test]
    fn test_failed_refresh_keeps_previous_tree() {
        let mut registry = AnalyzerRegistry::new();
        let config = Config::default();

        let good = registry.token_tree(&php("<?php class Foo {}"), &config);
        assert_eq!(good.classes.len(), 1);

        let broken = php("<?php class {");
        assert!(matches!(
            registry.refresh(&broken, &config),
            Err(OutlineError::ParseFailure { .. })
        ));
        assert_eq!(registry.token_tree(&broken, &config), good);
    }

    #[test]
    fn test_columns_count_characters() {
        let registry = AnalyzerRegistry::new();
        let doc = Document::new("css", "a.css", "/* é */ .a { color: red; }\n");
        let tree = registry.analyze(&doc, &Config::default()).unwrap();
        let color = &tree.nodes[".a"][0];
        assert_eq!(color.position, Some(Position::new(0, 13, 0, 18)));
    }

    #[test]
    fn test_allowed_providers() {
        let config = Config {
            allowed_providers: vec!["css".into()],
            ..Default::default()
        };
        let registry = AnalyzerRegistry::from_config(&config);
        assert_eq!(registry.len(), 1);
        assert!(!registry.has_support(&php("<?php")));
        assert!(registry.has_support(&Document::new("css", "a.css", "")));
    }

    #[test]
    fn test_detect_language() {
        let config = Config::parse_str(
            "file_associations:\n  - pattern: \"*.inc\"\n    language: php\n",
        )
        .unwrap();
        assert_eq!(detect_language(Path::new("lib/a.inc"), &config).as_deref(), Some("php"));
        assert_eq!(
            detect_language(Path::new("lib/a.tsx"), &config).as_deref(),
            Some("typescriptreact")
        );
        assert_eq!(
            detect_language(Path::new("package.json"), &config).as_deref(),
            Some("json")
        );
        assert_eq!(detect_language(Path::new("Makefile"), &config), None);
    }
}

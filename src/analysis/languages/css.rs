//! CSS analyzer using tree-sitter.
//!
//! Rule sets are grouped by their selector text; `@media` blocks keep their
//! own selector map keyed by the media condition.

use tree_sitter::{Language, Node};

use crate::analysis::{named_children, text, LanguageAnalyzer, ParsedFile};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::Result;
use crate::tokens::{Position, TokenTree, TreeBuilder, VariableToken};

pub struct CssAnalyzer {
    language: Language,
}

impl CssAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_css::LANGUAGE.into(),
        }
    }
}

impl Default for CssAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for CssAnalyzer {
    fn provider(&self) -> &'static str {
        "css"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["css"]
    }

    fn analyze(&self, document: &Document, _settings: &LanguageSettings) -> Result<TokenTree> {
        let parsed = ParsedFile::parse(&self.language, document)?;
        parsed.reject_errors()?;
        let mut builder = TreeBuilder::new();

        for node in named_children(parsed.tree.root_node()) {
            match node.kind() {
                "rule_set" => {
                    if let Some((selector, declarations)) = rule_set(&parsed, node) {
                        builder.declarations(selector, declarations);
                    }
                }
                "media_statement" => {
                    let Some(block) = child_of_kind(node, "block") else {
                        continue;
                    };
                    let condition = media_condition(&parsed, node, block);
                    for inner in named_children(block) {
                        if inner.kind() != "rule_set" {
                            continue;
                        }
                        if let Some((selector, declarations)) = rule_set(&parsed, inner) {
                            builder.media_declarations(condition.clone(), selector, declarations);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(builder.build())
    }
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|c| c.kind() == kind)
}

/// Selector key and declarations of one rule set.
fn rule_set(parsed: &ParsedFile, node: Node) -> Option<(String, Vec<VariableToken>)> {
    let selectors = child_of_kind(node, "selectors")?;
    let key = named_children(selectors)
        .into_iter()
        .map(|s| text::collapse_whitespace(parsed.node_text(s)))
        .collect::<Vec<_>>()
        .join(",");

    let declarations = child_of_kind(node, "block")
        .map(|block| {
            named_children(block)
                .into_iter()
                .filter(|d| d.kind() == "declaration")
                .filter_map(|d| declaration(parsed, d))
                .collect()
        })
        .unwrap_or_default();

    Some((key, declarations))
}

fn declaration(parsed: &ParsedFile, node: Node) -> Option<VariableToken> {
    let property = child_of_kind(node, "property_name")?;
    let whole = parsed.node_text(node);
    let value = whole
        .split_once(':')
        .map(|(_, v)| v.trim().trim_end_matches(';').trim())
        .unwrap_or("");

    Some(
        VariableToken::new(parsed.node_text(property))
            .with_value(text::collapse_whitespace(value))
            .with_position(Some(Position::from_node(property))),
    )
}

/// Text between `@media` and the block.
fn media_condition(parsed: &ParsedFile, node: Node, block: Node) -> String {
    let source = parsed.source_str();
    let head = source
        .get(node.start_byte()..block.start_byte())
        .unwrap_or("");
    text::collapse_whitespace(head.trim().trim_start_matches("@media"))
}

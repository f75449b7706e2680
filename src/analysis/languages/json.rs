//! JSON analyzer using tree-sitter.
//!
//! The document's root value becomes the tree's data root; objects and
//! arrays nest their members, scalars keep their source text.

use tree_sitter::{Language, Node};

use crate::analysis::{named_children, text, LanguageAnalyzer, ParsedFile};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::Result;
use crate::tokens::{DataKind, DataToken, Position, TokenTree, TreeBuilder};

pub struct JsonAnalyzer {
    language: Language,
}

impl JsonAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_json::LANGUAGE.into(),
        }
    }
}

impl Default for JsonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for JsonAnalyzer {
    fn provider(&self) -> &'static str {
        "json"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn analyze(&self, document: &Document, _settings: &LanguageSettings) -> Result<TokenTree> {
        let parsed = ParsedFile::parse(&self.language, document)?;
        parsed.reject_errors()?;
        let mut builder = TreeBuilder::new();

        let root = named_children(parsed.tree.root_node())
            .into_iter()
            .find(|n| n.kind() != "comment");
        if let Some(root) = root {
            builder.data(value(&parsed, String::new(), root));
        }

        Ok(builder.build())
    }
}

fn value(parsed: &ParsedFile, name: String, node: Node) -> DataToken {
    let mut token = DataToken {
        position: Some(Position::from_node(node)),
        ..DataToken::new(name, kind_of(node))
    };

    match node.kind() {
        "object" => {
            for pair in named_children(node)
                .into_iter()
                .filter(|n| n.kind() == "pair")
            {
                let Some(member) = pair.child_by_field_name("value") else {
                    continue;
                };
                let key = parsed.field_text(pair, "key").map(text::unquote).unwrap_or("");
                token.children.push(value(parsed, key.to_string(), member));
            }
        }
        "array" => {
            let elements = named_children(node)
                .into_iter()
                .filter(|n| n.kind() != "comment");
            for (index, element) in elements.enumerate() {
                token.children.push(value(parsed, index.to_string(), element));
            }
        }
        _ => token.value = Some(parsed.node_text(node).to_string()),
    }

    token
}

fn kind_of(node: Node) -> DataKind {
    match node.kind() {
        "object" => DataKind::Object,
        "array" => DataKind::Array,
        _ => DataKind::Value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OutlineError;

    fn analyze(source: &str) -> Result<TokenTree> {
        JsonAnalyzer::new().analyze(
            &Document::new("json", "package.json", source),
            &LanguageSettings::default(),
        )
    }

    #[test]
    fn test_object_members_keep_order_and_positions() {
        let tree = analyze("{\n  \"name\": \"shop\",\n  \"private\": true,\n  \"port\": 8080\n}\n")
            .unwrap();
        let root = tree.data.unwrap();
        assert_eq!(root.kind, DataKind::Object);

        let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "private", "port"]);
        assert_eq!(root.children[0].value.as_deref(), Some("\"shop\""));
        assert_eq!(root.children[1].value.as_deref(), Some("true"));
        assert_eq!(root.children[0].position, Some(Position::new(1, 10, 1, 16)));
        assert_eq!(root.children[2].position, Some(Position::new(3, 10, 3, 14)));
    }

    #[test]
    fn test_nested_containers() {
        let tree = analyze(r#"{"scripts": {"build": "make"}, "files": ["a", {"b": null}]}"#).unwrap();
        let root = tree.data.unwrap();

        let scripts = &root.children[0];
        assert_eq!(scripts.kind, DataKind::Object);
        assert_eq!(scripts.value, None);
        assert_eq!(scripts.children[0].name, "build");

        let files = &root.children[1];
        assert_eq!(files.kind, DataKind::Array);
        let names: Vec<_> = files.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["0", "1"]);
        assert_eq!(files.children[1].kind, DataKind::Object);
        assert_eq!(
            root.descendant(&[1, 1, 0]).and_then(|n| n.value.as_deref()),
            Some("null")
        );
    }

    #[test]
    fn test_array_root_and_scalar_root() {
        let tree = analyze("[1, 2]").unwrap();
        let root = tree.data.unwrap();
        assert_eq!(root.kind, DataKind::Array);
        assert_eq!(root.children.len(), 2);

        let tree = analyze("\"only\"").unwrap();
        assert_eq!(tree.data.unwrap().value.as_deref(), Some("\"only\""));
    }

    #[test]
    fn test_empty_document() {
        assert!(analyze("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_document_fails() {
        assert!(matches!(
            analyze("{\"a\": }"),
            Err(OutlineError::ParseFailure { .. })
        ));
    }
}

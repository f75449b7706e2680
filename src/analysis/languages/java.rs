//! Java language analyzer using tree-sitter.
//!
//! The package becomes the namespace and imports come from tree-sitter
//! queries; type declarations are walked directly. `static final` fields
//! are constants, every other field is a property.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Query, QueryCursor};

use crate::analysis::{named_children, LanguageAnalyzer, Modifiers, ParsedFile};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::{OutlineError, Result};
use crate::tokens::{
    qualify, EntityToken, ImportToken, MethodToken, Position, PropertyToken, TokenTree,
    TreeBuilder, VariableToken, Visibility,
};

pub const SEPARATOR: &str = ".";

/// Array initializers are cut to this many characters.
const MAX_ARRAY_TEXT: usize = 32;

/// Tree-sitter query for extracting imports.
const IMPORT_QUERY: &str = r#"
; import com.package.Class;
(import_declaration
  (scoped_identifier) @import_path
) @import

; import Class;
(import_declaration
  (identifier) @import_path
) @import
"#;

/// Tree-sitter query for package declaration.
const PACKAGE_QUERY: &str = r#"
(package_declaration
  [(scoped_identifier) (identifier)] @package_name
)
"#;

pub struct JavaAnalyzer {
    language: Language,
}

impl JavaAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
        }
    }

    fn extract_package(&self, parsed: &ParsedFile) -> Result<Option<String>> {
        let query = Query::new(&self.language, PACKAGE_QUERY)
            .map_err(|e| OutlineError::parse(&parsed.path, e))?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Ok(Some(parsed.node_text(capture.node).to_string()));
                }
            }
        }
        Ok(None)
    }

    fn extract_imports(&self, parsed: &ParsedFile) -> Result<Vec<ImportToken>> {
        let query = Query::new(&self.language, IMPORT_QUERY)
            .map_err(|e| OutlineError::parse(&parsed.path, e))?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut imports = Vec::new();
        while let Some(m) = matches.next() {
            let mut path = None;
            let mut wildcard = false;

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "import_path" => path = Some(capture.node),
                    "import" => {
                        wildcard = parsed.node_text(capture.node).contains('*');
                    }
                    _ => {}
                }
            }

            if let Some(node) = path {
                let mut name = parsed.node_text(node).to_string();
                if wildcard {
                    name.push_str(".*");
                }
                imports.push(ImportToken {
                    name,
                    position: Some(Position::from_node(node)),
                    alias: None,
                });
            }
        }
        Ok(imports)
    }
}

impl Default for JavaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for JavaAnalyzer {
    fn provider(&self) -> &'static str {
        "java"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn analyze(&self, document: &Document, settings: &LanguageSettings) -> Result<TokenTree> {
        let parsed = ParsedFile::parse(&self.language, document)?;
        parsed.reject_errors()?;

        let mut builder = TreeBuilder::new();
        if let Some(package) = self.extract_package(&parsed)? {
            builder.set_namespace(package);
        }
        for import in self.extract_imports(&parsed)? {
            builder.import(import);
        }

        let namespace = builder.namespace().map(str::to_string);
        let walker = Walker {
            parsed: &parsed,
            settings,
            namespace: namespace.as_deref(),
        };
        for node in named_children(parsed.tree.root_node()) {
            match node.kind() {
                "class_declaration" | "enum_declaration" | "record_declaration" => {
                    if let Some(entity) = walker.entity(node, false) {
                        builder.class(entity);
                    }
                }
                "interface_declaration" => {
                    if let Some(entity) = walker.entity(node, true) {
                        builder.interface(entity);
                    }
                }
                _ => {}
            }
        }

        Ok(builder.build())
    }
}

struct Walker<'a> {
    parsed: &'a ParsedFile,
    settings: &'a LanguageSettings,
    namespace: Option<&'a str>,
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node) -> &'a str {
        self.parsed.node_text(node)
    }

    fn modifiers(&self, node: Node) -> Modifiers {
        named_children(node)
            .into_iter()
            .find(|n| n.kind() == "modifiers")
            .map(|m| Modifiers::parse(self.text(m)))
            .unwrap_or_default()
    }

    fn entity(&self, node: Node, interface: bool) -> Option<EntityToken> {
        let name = node.child_by_field_name("name")?;
        let modifiers = self.modifiers(node);

        let mut entity = EntityToken::new(qualify(
            self.text(name),
            self.namespace,
            SEPARATOR,
            self.settings.namespace_position,
        ));
        entity.position = Some(Position::from_node(name));
        entity.visibility = modifiers.visibility;
        entity.is_abstract = modifiers.is_abstract;
        entity.readonly = modifiers.is_final;

        let Some(body) = node.child_by_field_name("body") else {
            return Some(entity);
        };
        // Enum bodies keep their members one level down.
        let members = named_children(body).into_iter().flat_map(|n| {
            if n.kind() == "enum_body_declarations" {
                named_children(n)
            } else {
                vec![n]
            }
        });

        for member in members {
            match member.kind() {
                "field_declaration" | "constant_declaration" => {
                    self.field(member, interface, &mut entity)
                }
                "method_declaration" | "constructor_declaration" => {
                    if let Some(method) = self.method(member, interface) {
                        entity.add_method(method);
                    }
                }
                _ => {}
            }
        }
        Some(entity)
    }

    fn field(&self, node: Node, interface: bool, entity: &mut EntityToken) {
        let modifiers = self.modifiers(node);
        let type_name = node
            .child_by_field_name("type")
            .map(|t| self.text(t).to_string());
        // Interface fields are implicitly public static final.
        let constant = interface || (modifiers.is_static && modifiers.is_final);

        for declarator in named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "variable_declarator")
        {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            let value = declarator
                .child_by_field_name("value")
                .map(|v| self.render_value(v));
            let position = Some(Position::from_node(name));

            if constant {
                let mut token = VariableToken::new(self.text(name))
                    .with_position(position)
                    .with_visibility(if interface {
                        Visibility::Public
                    } else {
                        modifiers.visibility
                    })
                    .with_static(true);
                token.type_name = type_name.clone();
                token.value = value;
                entity.add_constant(token);
            } else {
                entity.add_property(PropertyToken {
                    name: self.text(name).to_string(),
                    position,
                    type_name: type_name.clone(),
                    value,
                    visibility: modifiers.visibility,
                    is_static: modifiers.is_static,
                    readonly: modifiers.is_final,
                });
            }
        }
    }

    fn method(&self, node: Node, interface: bool) -> Option<MethodToken> {
        let name = node.child_by_field_name("name")?;
        let modifiers = self.modifiers(node);
        let is_constructor = node.kind() == "constructor_declaration";

        let arguments = node
            .child_by_field_name("parameters")
            .map(|params| {
                named_children(params)
                    .into_iter()
                    .filter_map(|p| self.parameter(p))
                    .collect()
            })
            .unwrap_or_default();

        Some(MethodToken {
            name: self.text(name).to_string(),
            position: Some(Position::from_node(name)),
            type_name: if is_constructor {
                None
            } else {
                node.child_by_field_name("type")
                    .map(|t| self.text(t).to_string())
            },
            value: None,
            visibility: modifiers.visibility,
            is_static: modifiers.is_static,
            arguments,
            // Interface methods without a default body are abstract.
            is_abstract: modifiers.is_abstract
                || (interface && node.child_by_field_name("body").is_none() && !modifiers.is_static),
            readonly: modifiers.is_final,
        })
    }

    fn parameter(&self, node: Node) -> Option<VariableToken> {
        match node.kind() {
            "formal_parameter" => {
                let name = node.child_by_field_name("name")?;
                let mut token = VariableToken::new(self.text(name))
                    .with_position(Some(Position::from_node(name)));
                token.type_name = node
                    .child_by_field_name("type")
                    .map(|t| self.text(t).to_string());
                Some(token)
            }
            "spread_parameter" => {
                let parts = named_children(node);
                let declarator = parts.iter().find(|n| n.kind() == "variable_declarator")?;
                let name = declarator.child_by_field_name("name")?;
                let type_name = parts
                    .iter()
                    .find(|n| n.kind() != "variable_declarator" && n.kind() != "modifiers")
                    .map(|t| format!("{}...", self.text(*t)));
                let mut token = VariableToken::new(self.text(name))
                    .with_position(Some(Position::from_node(name)));
                token.type_name = type_name;
                Some(token)
            }
            _ => None,
        }
    }

    fn render_value(&self, node: Node) -> String {
        let text = self
            .text(node)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if node.kind() == "array_initializer" || node.kind() == "array_creation_expression" {
            let inner = text
                .find('{')
                .map(|i| text[i + 1..].trim_end_matches('}').trim())
                .unwrap_or(text.as_str());
            if inner.chars().count() > MAX_ARRAY_TEXT {
                let cut: String = inner.chars().take(MAX_ARRAY_TEXT).collect();
                return format!("[{}...]", cut);
            }
            return format!("[{}]", inner);
        }
        text
    }
}

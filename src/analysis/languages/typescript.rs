//! TypeScript and JavaScript analyzer using tree-sitter.
//!
//! Both grammars share the walk. The analysis is permissive: error nodes
//! never fail it, since half-typed files are the norm while editing.

use tree_sitter::{Language, Node};

use crate::analysis::{children, named_children, text, LanguageAnalyzer, Modifiers, ParsedFile};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::Result;
use crate::tokens::{
    qualify, AccessorToken, Direction, EntityToken, ImportToken, MethodToken,
    Position, PropertyToken, TokenTree, TreeBuilder, VariableToken, Visibility,
};

pub const SEPARATOR: &str = ".";

/// Type used for untyped TypeScript members.
const UNTYPED: &str = "any";

pub struct TypeScriptAnalyzer {
    typescript: Language,
    tsx: Language,
    javascript: Language,
}

impl TypeScriptAnalyzer {
    pub fn new() -> Self {
        Self {
            typescript: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            tsx: tree_sitter_typescript::LANGUAGE_TSX.into(),
            javascript: tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    fn grammar_for(&self, document: &Document) -> (&Language, bool) {
        let id = document.language_id.to_ascii_lowercase();
        match id.as_str() {
            "javascript" | "javascriptreact" => (&self.javascript, false),
            "typescriptreact" => (&self.tsx, true),
            _ if document.extension() == Some("tsx") => (&self.tsx, true),
            _ => (&self.typescript, true),
        }
    }
}

impl Default for TypeScriptAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for TypeScriptAnalyzer {
    fn provider(&self) -> &'static str {
        "javascript"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["typescript", "javascript", "typescriptreact", "javascriptreact"]
    }

    fn analyze(&self, document: &Document, settings: &LanguageSettings) -> Result<TokenTree> {
        let (language, typed) = self.grammar_for(document);
        let parsed = ParsedFile::parse(language, document)?;
        if parsed.tree.root_node().has_error() {
            tracing::debug!(file = %document.file_name, "outlining despite syntax errors");
        }

        let mut walker = Walker {
            parsed: &parsed,
            settings,
            typed,
            builder: TreeBuilder::new(),
            namespace: None,
        };
        let root = parsed.tree.root_node();
        walker.detect_strict(root);
        walker.walk_statements(root, false);
        Ok(walker.builder.build())
    }
}

struct Walker<'a> {
    parsed: &'a ParsedFile,
    settings: &'a LanguageSettings,
    /// TypeScript rather than plain JavaScript.
    typed: bool,
    builder: TreeBuilder,
    namespace: Option<String>,
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node) -> &'a str {
        self.parsed.node_text(node)
    }

    fn untyped(&self) -> Option<String> {
        self.typed.then(|| UNTYPED.to_string())
    }

    fn detect_strict(&mut self, root: Node) {
        let first = named_children(root)
            .into_iter()
            .find(|n| n.kind() != "comment" && n.kind() != "hash_bang_line");
        if let Some(statement) = first {
            if statement.kind() == "expression_statement" {
                let literal = text::unquote(self.text(statement).trim_end_matches(';'));
                if literal == "use strict" {
                    self.builder.strict(true);
                }
            }
        }
    }

    fn walk_statements(&mut self, parent: Node, exported: bool) {
        for node in named_children(parent) {
            self.visit_statement(node, exported);
        }
    }

    fn visit_statement(&mut self, node: Node, exported: bool) {
        match node.kind() {
            "import_statement" => self.visit_import(node),
            "export_statement" => {
                let declarations = node
                    .child_by_field_name("declaration")
                    .map(|d| vec![d])
                    .unwrap_or_else(|| named_children(node));
                for declaration in declarations {
                    self.visit_statement(declaration, true);
                }
            }
            "internal_module" | "module" => self.visit_namespace(node),
            "expression_statement" => {
                for inner in named_children(node) {
                    if inner.kind() == "internal_module" {
                        self.visit_namespace(inner);
                    }
                }
            }
            "ambient_declaration" => self.walk_statements(node, exported),
            "class_declaration" | "abstract_class_declaration" | "class" => {
                self.visit_class(node, exported)
            }
            "interface_declaration" => self.visit_interface(node, exported),
            "function_declaration" | "generator_function_declaration" => {
                if let Some(function) = self.callable(node) {
                    self.builder.function(MethodToken {
                        is_static: true,
                        ..function
                    });
                }
            }
            "lexical_declaration" | "variable_declaration" => self.visit_variables(node),
            _ => {}
        }
    }

    fn visit_namespace(&mut self, node: Node) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let local = text::unquote(self.text(name)).to_string();
        let full = match &self.namespace {
            Some(outer) => format!("{}{}{}", outer, SEPARATOR, local),
            None => local,
        };
        if self.builder.namespace().is_none() {
            self.builder.set_namespace(full.clone());
        }
        if let Some(body) = node.child_by_field_name("body") {
            let outer = self.namespace.replace(full);
            self.walk_statements(body, false);
            self.namespace = outer;
        }
    }

    fn visit_import(&mut self, node: Node) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let library = text::unquote(self.text(source)).to_string();
        let position = Some(Position::from_node(source));

        let clause = named_children(node)
            .into_iter()
            .find(|n| n.kind() == "import_clause");
        let Some(clause) = clause else {
            // import "./side-effect";
            self.builder.import(ImportToken {
                name: library,
                position,
                alias: None,
            });
            return;
        };

        let mut named = Vec::new();
        let mut alias = None;
        for part in named_children(clause) {
            match part.kind() {
                "named_imports" => {
                    for specifier in named_children(part)
                        .into_iter()
                        .filter(|s| s.kind() == "import_specifier")
                    {
                        if let Some(name) = specifier.child_by_field_name("name") {
                            named.push(self.text(name).to_string());
                        }
                    }
                }
                "namespace_import" => {
                    alias = named_children(part)
                        .into_iter()
                        .find(|n| n.kind() == "identifier")
                        .map(|n| self.text(n).to_string());
                }
                "identifier" => alias = Some(self.text(part).to_string()),
                _ => {}
            }
        }

        let name = if named.is_empty() {
            library
        } else {
            format!("{}: {}", library, named.join(", "))
        };
        self.builder.import(ImportToken {
            name,
            position,
            alias,
        });
    }

    fn qualified(&self, name: &str) -> String {
        qualify(
            name,
            self.namespace.as_deref(),
            SEPARATOR,
            self.settings.namespace_position,
        )
    }

    fn visit_class(&mut self, node: Node, exported: bool) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let mut class = EntityToken::new(self.qualified(self.text(name)));
        class.position = Some(Position::from_node(name));
        class.visibility = if exported {
            Visibility::Public
        } else {
            Visibility::Protected
        };
        class.is_abstract = node.kind() == "abstract_class_declaration";

        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(body) {
                match member.kind() {
                    "method_definition" | "method_signature" | "abstract_method_signature" => {
                        self.class_method(member, &mut class)
                    }
                    "public_field_definition" | "field_definition" => {
                        if let Some(property) = self.property(member) {
                            class.add_property(property);
                        }
                    }
                    _ => {}
                }
            }
        }
        self.builder.class(class);
    }

    fn class_method(&self, node: Node, class: &mut EntityToken) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let keywords: Vec<&str> = children(node)
            .into_iter()
            .take_while(|c| c.id() != name.id())
            .map(|c| self.text(c))
            .collect();
        let modifiers = Modifiers::from_words(keywords.iter().copied());
        let direction = keywords.iter().find_map(|k| match *k {
            "get" => Some(Direction::Get),
            "set" => Some(Direction::Set),
            _ => None,
        });

        let Some(method) = self.callable(node) else {
            return;
        };

        match direction {
            Some(direction) => {
                let type_name = match direction {
                    Direction::Get => method.type_name.clone(),
                    Direction::Set => method
                        .arguments
                        .first()
                        .and_then(|a| a.type_name.clone())
                        .or_else(|| self.untyped()),
                };
                class.add_accessor(AccessorToken {
                    name: method.name,
                    position: method.position,
                    type_name,
                    value: None,
                    visibility: modifiers.visibility,
                    is_static: modifiers.is_static,
                    readonly: modifiers.is_readonly,
                    is_abstract: modifiers.is_abstract,
                    direction,
                });
            }
            None => class.add_method(MethodToken {
                visibility: modifiers.visibility,
                is_static: modifiers.is_static,
                is_abstract: modifiers.is_abstract || node.kind() == "abstract_method_signature",
                readonly: modifiers.is_readonly,
                ..method
            }),
        }
    }

    fn property(&self, node: Node) -> Option<PropertyToken> {
        let name = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("property"))?;
        let keywords: Vec<&str> = children(node)
            .into_iter()
            .take_while(|c| c.id() != name.id())
            .map(|c| self.text(c))
            .collect();
        let modifiers = Modifiers::from_words(keywords);

        Some(PropertyToken {
            name: self.text(name).to_string(),
            position: Some(Position::from_node(name)),
            type_name: self.annotation(node).or_else(|| self.untyped()),
            value: node
                .child_by_field_name("value")
                .map(|v| text::collapse_whitespace(self.text(v))),
            visibility: modifiers.visibility,
            is_static: modifiers.is_static,
            readonly: modifiers.is_readonly,
        })
    }

    fn visit_interface(&mut self, node: Node, exported: bool) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let mut interface = EntityToken::new(self.qualified(self.text(name)));
        interface.position = Some(Position::from_node(name));
        interface.visibility = if exported {
            Visibility::Public
        } else {
            Visibility::Protected
        };

        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(body) {
                match member.kind() {
                    "property_signature" => {
                        let Some(prop_name) = member.child_by_field_name("name") else {
                            continue;
                        };
                        let readonly = children(member)
                            .iter()
                            .any(|c| self.text(*c) == "readonly");
                        interface.add_property(PropertyToken {
                            name: self.text(prop_name).to_string(),
                            position: Some(Position::from_node(prop_name)),
                            type_name: self.annotation(member).or_else(|| self.untyped()),
                            readonly,
                            ..Default::default()
                        });
                    }
                    "method_signature" => {
                        if let Some(method) = self.callable(member) {
                            interface.add_method(method);
                        }
                    }
                    _ => {}
                }
            }
        }
        self.builder.interface(interface);
    }

    fn visit_variables(&mut self, node: Node) {
        for declarator in named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "variable_declarator")
        {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            // Destructuring patterns are not declarations of a single name.
            if name.kind() != "identifier" {
                continue;
            }
            let mut variable =
                VariableToken::new(self.text(name)).with_position(Some(Position::from_node(name)));
            variable.type_name = self.annotation(declarator).or_else(|| self.untyped());
            variable.value = declarator
                .child_by_field_name("value")
                .map(|v| text::collapse_whitespace(self.text(v)));
            self.builder.variable(variable);
        }
    }

    /// Name, arguments and return type of a function-like node.
    fn callable(&self, node: Node) -> Option<MethodToken> {
        let name = node.child_by_field_name("name")?;
        let name_text = self.text(name);
        let is_constructor = name_text == "constructor";

        let arguments = node
            .child_by_field_name("parameters")
            .map(|params| {
                named_children(params)
                    .into_iter()
                    .filter_map(|p| self.parameter(p))
                    .collect()
            })
            .unwrap_or_default();

        let type_name = if is_constructor {
            None
        } else {
            node.child_by_field_name("return_type")
                .map(|t| strip_annotation(self.text(t)))
                .or_else(|| self.untyped())
        };

        Some(MethodToken {
            name: name_text.to_string(),
            position: Some(Position::from_node(name)),
            type_name,
            arguments,
            ..Default::default()
        })
    }

    fn parameter(&self, node: Node) -> Option<VariableToken> {
        let (name, value) = match node.kind() {
            "required_parameter" | "optional_parameter" => (
                node.child_by_field_name("pattern")
                    .or_else(|| named_children(node).into_iter().find(|n| n.kind() == "identifier"))?,
                node.child_by_field_name("value"),
            ),
            "identifier" | "rest_pattern" => (node, None),
            "assignment_pattern" => (
                node.child_by_field_name("left")?,
                node.child_by_field_name("right"),
            ),
            _ => return None,
        };

        let mut label = self.text(name).to_string();
        if node.kind() == "optional_parameter" {
            label.push('?');
        }
        let mut argument =
            VariableToken::new(label).with_position(Some(Position::from_node(name)));
        argument.type_name = self.annotation(node);
        argument.value = value.map(|v| text::collapse_whitespace(self.text(v)));
        Some(argument)
    }

    fn annotation(&self, node: Node) -> Option<String> {
        node.child_by_field_name("type")
            .map(|t| strip_annotation(self.text(t)))
    }
}

/// `: string` → `string`
fn strip_annotation(text: &str) -> String {
    text.trim().trim_start_matches(':').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(language: &str, file: &str, source: &str) -> TokenTree {
        TypeScriptAnalyzer::new()
            .analyze(&Document::new(language, file, source), &LanguageSettings::default())
            .unwrap()
    }

    #[test]
    fn test_strict_and_imports() {
        let tree = analyze(
            "typescript",
            "a.ts",
            "\"use strict\";\nimport { Foo, Bar } from './models';\nimport * as path from 'path';\nimport 'reflect-metadata';\n",
        );
        assert_eq!(tree.strict, Some(true));
        assert_eq!(tree.imports[0].name, "./models: Foo, Bar");
        assert_eq!(tree.imports[1].name, "path");
        assert_eq!(tree.imports[1].alias.as_deref(), Some("path"));
        assert_eq!(tree.imports[2].name, "reflect-metadata");
    }

    #[test]
    fn test_class_members() {
        let tree = analyze(
            "typescript",
            "a.ts",
            r#"
export abstract class Repo<T> {
    private static count: number = 0;
    readonly name = "repo";
    constructor(private db: Db) {}
    get size(): number { return 0; }
    set size(value: number) {}
    protected abstract load(id: string, force?: boolean): Promise<T>;
    public save(item: T, retries: number = 3): void {}
}
class Hidden {}
"#,
        );
        let repo = &tree.classes[0];
        assert_eq!(repo.name, "Repo");
        assert!(repo.is_abstract);
        assert_eq!(repo.visibility, Visibility::Public);
        assert_eq!(tree.classes[1].visibility, Visibility::Protected);

        let count = &repo.properties[0];
        assert!(count.is_static);
        assert_eq!(count.visibility, Visibility::Private);
        assert_eq!(count.type_name.as_deref(), Some("number"));
        assert_eq!(count.value.as_deref(), Some("0"));
        assert!(repo.properties[1].readonly);
        assert_eq!(repo.properties[1].type_name.as_deref(), Some("any"));

        assert_eq!(repo.accessors.len(), 2);
        assert_eq!(repo.accessors[0].direction, Direction::Get);
        assert_eq!(repo.accessors[1].type_name.as_deref(), Some("number"));

        let ctor = &repo.methods[0];
        assert_eq!(ctor.name, "constructor");
        assert!(ctor.type_name.is_none());

        let load = repo.methods.iter().find(|m| m.name == "load").unwrap();
        assert!(load.is_abstract);
        assert_eq!(load.visibility, Visibility::Protected);
        assert_eq!(load.arguments[1].name, "force?");

        let save = repo.methods.iter().find(|m| m.name == "save").unwrap();
        assert_eq!(save.type_name.as_deref(), Some("void"));
        assert_eq!(save.arguments[1].value.as_deref(), Some("3"));
        assert_eq!(save.arguments[1].type_name.as_deref(), Some("number"));
    }

    #[test]
    fn test_namespaces_qualify_entities() {
        let tree = analyze(
            "typescript",
            "a.ts",
            "namespace App.Models {\n    export interface User { readonly id: string; greet(): string; }\n}\n",
        );
        assert_eq!(tree.namespace.as_deref(), Some("App.Models"));
        let user = &tree.interfaces[0];
        assert_eq!(user.name, "App.Models.User");
        assert!(user.properties[0].readonly);
        assert_eq!(user.methods[0].type_name.as_deref(), Some("string"));
    }

    #[test]
    fn test_functions_and_variables() {
        let tree = analyze(
            "typescript",
            "a.ts",
            "export function greet(name: string): string { return name; }\nconst LIMIT: number = 5;\nlet { a, b } = obj;\n",
        );
        assert!(tree.functions[0].is_static);
        assert_eq!(tree.functions[0].arguments[0].type_name.as_deref(), Some("string"));
        assert_eq!(tree.variables.len(), 1);
        assert_eq!(tree.variables[0].name, "LIMIT");
        assert_eq!(tree.variables[0].value.as_deref(), Some("5"));
    }

    #[test]
    fn test_javascript_has_no_types() {
        let tree = analyze(
            "javascript",
            "a.js",
            "class Greeter {\n  greet(name = 'world') { return name; }\n}\n",
        );
        let greet = &tree.classes[0].methods[0];
        assert!(greet.type_name.is_none());
        assert_eq!(greet.arguments[0].name, "name");
        assert_eq!(greet.arguments[0].value.as_deref(), Some("'world'"));
    }

    #[test]
    fn test_broken_source_still_outlines() {
        let tree = analyze("typescript", "a.ts", "class Ok {}\nclass Broken {\n  foo(: {\n");
        assert_eq!(tree.classes[0].name, "Ok");
    }
}

//! Flat document symbols for the C family.
//!
//! The C-family analyzer does not walk a syntax tree itself; it rebuilds the
//! outline from a flat symbol list, the way a language server reports it.
//! [`TreeSitterSymbols`] is the built-in source of those symbols.

use tree_sitter::{Language, Node};

use crate::analysis::{named_children, ParsedFile};
use crate::document::Document;
use crate::error::{OutlineError, Result};
use crate::tokens::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Namespace,
    Module,
    Package,
    Class,
    Struct,
    Interface,
    Property,
    Field,
    Method,
    Constructor,
    Variable,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Name of the enclosing type, if any.
    pub container_name: Option<String>,
    /// Starts at the symbol name; its line is the declaration line.
    pub range: Position,
}

/// Source of document symbols, usually a language server.
pub trait SymbolProvider: Send + Sync {
    fn document_symbols(&self, document: &Document) -> Result<Vec<DocumentSymbol>>;
}

/// Symbols straight from the tree-sitter C, C++ and C# grammars.
pub struct TreeSitterSymbols {
    c: Language,
    cpp: Language,
    csharp: Language,
}

impl TreeSitterSymbols {
    pub fn new() -> Self {
        Self {
            c: tree_sitter_c::LANGUAGE.into(),
            cpp: tree_sitter_cpp::LANGUAGE.into(),
            csharp: tree_sitter_c_sharp::LANGUAGE.into(),
        }
    }

    fn grammar(&self, document: &Document) -> Option<&Language> {
        if document.language_is("c") {
            Some(&self.c)
        } else if document.language_is("cpp") {
            Some(&self.cpp)
        } else if document.language_is("csharp") {
            Some(&self.csharp)
        } else {
            None
        }
    }
}

impl Default for TreeSitterSymbols {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolProvider for TreeSitterSymbols {
    fn document_symbols(&self, document: &Document) -> Result<Vec<DocumentSymbol>> {
        let language = self
            .grammar(document)
            .ok_or_else(|| OutlineError::UnsupportedLanguage(document.language_id.clone()))?;
        let parsed = ParsedFile::parse(language, document)?;

        let mut collector = Collector {
            parsed: &parsed,
            symbols: Vec::new(),
        };
        collector.visit(parsed.tree.root_node(), None);
        Ok(collector.symbols)
    }
}

struct Collector<'p> {
    parsed: &'p ParsedFile,
    symbols: Vec<DocumentSymbol>,
}

impl Collector<'_> {
    fn push(&mut self, name: &str, kind: SymbolKind, container: Option<&str>, name_node: Node, decl: Node) {
        let start = name_node.start_position();
        let end = decl.end_position();
        self.symbols.push(DocumentSymbol {
            name: name.to_string(),
            kind,
            container_name: container.map(str::to_string),
            range: Position::new(start.row, start.column, end.row, end.column),
        });
    }

    fn visit(&mut self, node: Node, container: Option<&str>) {
        for child in named_children(node) {
            match child.kind() {
                "namespace_declaration"
                | "file_scoped_namespace_declaration"
                | "namespace_definition" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        let text = self.parsed.node_text(name).to_string();
                        self.push(&text, SymbolKind::Namespace, container, name, child);
                    }
                    if let Some(body) = child.child_by_field_name("body") {
                        self.visit(body, container);
                    }
                }
                "using_directive" => {
                    let text = self.parsed.node_text(child);
                    let name = text
                        .trim()
                        .trim_start_matches("global")
                        .trim()
                        .trim_start_matches("using")
                        .trim_end_matches(';')
                        .trim();
                    if !name.is_empty() {
                        let name = name.to_string();
                        self.push(&name, SymbolKind::Module, container, child, child);
                    }
                }
                "preproc_include" => {
                    if let Some(path) = child.child_by_field_name("path") {
                        let name = self
                            .parsed
                            .node_text(path)
                            .trim_matches(|c: char| c == '<' || c == '>' || c == '"')
                            .to_string();
                        self.push(&name, SymbolKind::Module, container, path, child);
                    }
                }
                "class_declaration" | "record_declaration" | "class_specifier" => {
                    self.entity(child, SymbolKind::Class, container)
                }
                "struct_declaration" | "struct_specifier" => {
                    self.entity(child, SymbolKind::Struct, container)
                }
                "interface_declaration" => self.entity(child, SymbolKind::Interface, container),
                "field_declaration" => self.field(child, container),
                "property_declaration" => self.named(child, SymbolKind::Property, container),
                "method_declaration" => self.named(child, SymbolKind::Method, container),
                "constructor_declaration" => {
                    self.named(child, SymbolKind::Constructor, container)
                }
                "function_definition" => self.function(child, container),
                "declaration" => self.declaration(child, container),
                "type_definition" => self.type_definition(child, container),
                "template_declaration"
                | "linkage_specification"
                | "declaration_list"
                | "preproc_ifdef"
                | "preproc_if"
                | "preproc_else" => self.visit(child, container),
                _ => {}
            }
        }
    }

    fn named(&mut self, node: Node, kind: SymbolKind, container: Option<&str>) {
        if let Some(name) = node.child_by_field_name("name") {
            let text = self.parsed.node_text(name).to_string();
            self.push(&text, kind, container, name, node);
        }
    }

    fn entity(&mut self, node: Node, kind: SymbolKind, container: Option<&str>) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let text = self.parsed.node_text(name).to_string();
        self.push(&text, kind, container, name, node);
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body, Some(&text));
        }
    }

    /// `typedef struct { ... } Name;`
    fn type_definition(&mut self, node: Node, container: Option<&str>) {
        let Some(spec) = node.child_by_field_name("type") else {
            return;
        };
        if !matches!(spec.kind(), "struct_specifier" | "class_specifier") {
            return;
        }
        let name = spec
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("declarator"));
        let Some(name) = name else {
            return;
        };
        let text = self.parsed.node_text(name).to_string();
        self.push(&text, SymbolKind::Struct, container, name, node);
        if let Some(body) = spec.child_by_field_name("body") {
            self.visit(body, Some(&text));
        }
    }

    fn field(&mut self, node: Node, container: Option<&str>) {
        // C#: modifiers + variable_declaration with one or more declarators.
        if let Some(declaration) = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "variable_declaration")
        {
            for declarator in named_children(declaration)
                .into_iter()
                .filter(|c| c.kind() == "variable_declarator")
            {
                let name = declarator
                    .child_by_field_name("name")
                    .or_else(|| declarator.named_child(0));
                if let Some(name) = name {
                    let text = self.parsed.node_text(name).to_string();
                    self.push(&text, SymbolKind::Field, container, name, node);
                }
            }
            return;
        }

        // C / C++ struct and class members.
        let mut cursor = node.walk();
        let declarators: Vec<_> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            if let Some((name, is_function)) = resolve_declarator(declarator) {
                let kind = if is_function {
                    SymbolKind::Method
                } else {
                    SymbolKind::Field
                };
                let text = self.parsed.node_text(name).to_string();
                self.push(&text, kind, container, name, node);
            }
        }
    }

    fn function(&mut self, node: Node, container: Option<&str>) {
        let Some((name, _)) = node
            .child_by_field_name("declarator")
            .and_then(resolve_declarator)
        else {
            return;
        };

        // `Type Owner::member(...) { ... }` defined out of line.
        if name.kind() == "qualified_identifier" {
            let owner = name
                .child_by_field_name("scope")
                .map(|s| self.parsed.node_text(s).to_string());
            let member = name
                .child_by_field_name("name")
                .map(|n| self.parsed.node_text(n).to_string());
            if let (Some(owner), Some(member)) = (owner, member) {
                let kind = member_kind(&member, &owner);
                self.push(&member, kind, Some(&owner), name, node);
            }
            return;
        }

        let text = self.parsed.node_text(name).to_string();
        match container {
            Some(owner) => {
                let kind = member_kind(&text, owner);
                self.push(&text, kind, Some(owner), name, node);
            }
            None => self.push(&text, SymbolKind::Function, None, name, node),
        }
    }

    fn declaration(&mut self, node: Node, container: Option<&str>) {
        if let Some(spec) = node.child_by_field_name("type") {
            match spec.kind() {
                "class_specifier" if spec.child_by_field_name("body").is_some() => {
                    self.entity(spec, SymbolKind::Class, container)
                }
                "struct_specifier" if spec.child_by_field_name("body").is_some() => {
                    self.entity(spec, SymbolKind::Struct, container)
                }
                _ => {}
            }
        }

        let mut cursor = node.walk();
        let declarators: Vec<_> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            let Some((name, is_function)) = resolve_declarator(declarator) else {
                continue;
            };
            let text = self.parsed.node_text(name).to_string();
            match (container, is_function) {
                (Some(owner), true) => {
                    let kind = member_kind(&text, owner);
                    self.push(&text, kind, Some(owner), name, node);
                }
                (Some(owner), false) => self.push(&text, SymbolKind::Field, Some(owner), name, node),
                // Prototypes are reported by their definition.
                (None, true) => {}
                (None, false) => self.push(&text, SymbolKind::Variable, None, name, node),
            }
        }
    }
}

fn member_kind(name: &str, owner: &str) -> SymbolKind {
    let owner = owner.rsplit("::").next().unwrap_or(owner);
    if name == owner {
        SymbolKind::Constructor
    } else {
        SymbolKind::Method
    }
}

/// Follow a declarator chain down to the declared name.
fn resolve_declarator(node: Node) -> Option<(Node, bool)> {
    let mut current = node;
    let mut is_function = false;
    loop {
        match current.kind() {
            "identifier" | "field_identifier" | "qualified_identifier" | "destructor_name"
            | "operator_name" | "type_identifier" => return Some((current, is_function)),
            "function_declarator" => {
                is_function = true;
                current = current.child_by_field_name("declarator")?;
            }
            _ => {
                current = current
                    .child_by_field_name("declarator")
                    .or_else(|| current.named_child(0))?;
            }
        }
    }
}

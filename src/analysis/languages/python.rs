//! Python language analyzer using tree-sitter.
//!
//! Python has no field declarations, so instance properties are recovered
//! from `self.<name> = ...` assignments in method bodies (first occurrence
//! wins). Imports are recovered from the raw lines preceding the first
//! statement.

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Query, QueryCursor};

use crate::analysis::{named_children, text, LanguageAnalyzer, ParsedFile};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::{OutlineError, Result};
use crate::tokens::{
    AccessorToken, Direction, EntityToken, ImportToken, MethodToken, Position, PropertyToken,
    TokenTree, TreeBuilder, VariableToken, Visibility,
};

/// Tree-sitter query for attribute assignments inside a class body.
const SELF_ASSIGNMENT_QUERY: &str = r#"
(assignment
  left: (attribute
    object: (identifier) @object
    attribute: (identifier) @attribute
  )
) @assignment
"#;

/// Statements that may precede the first "real" statement.
const PREAMBLE_KINDS: &[&str] = &[
    "import_statement",
    "import_from_statement",
    "future_import_statement",
    "comment",
];

pub struct PythonAnalyzer {
    language: Language,
    /// Compiled once, on first use.
    self_query: OnceCell<Query>,
}

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
            self_query: OnceCell::new(),
        }
    }

    /// Instance properties assigned through `self` in the class's own
    /// methods; nested classes keep theirs.
    fn self_assignments(&self, parsed: &ParsedFile, body: Node) -> Result<Vec<PropertyToken>> {
        let owner = body.parent();
        let query = self
            .self_query
            .get_or_try_init(|| Query::new(&self.language, SELF_ASSIGNMENT_QUERY))
            .map_err(|e| OutlineError::parse(&parsed.path, e))?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, body, &parsed.source[..]);

        let mut properties = Vec::new();
        while let Some(m) = matches.next() {
            let mut object = None;
            let mut attribute = None;
            let mut assignment = None;

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "object" => object = Some(capture.node),
                    "attribute" => attribute = Some(capture.node),
                    "assignment" => assignment = Some(capture.node),
                    _ => {}
                }
            }

            let (Some(object), Some(attribute), Some(assignment)) = (object, attribute, assignment)
            else {
                continue;
            };
            if parsed.node_text(object) != "self" || enclosing_class(assignment) != owner {
                continue;
            }

            let name = parsed.node_text(attribute);
            let value = assignment
                .child_by_field_name("right")
                .map(|v| text::collapse_whitespace(parsed.node_text(v)));
            let type_name = assignment
                .child_by_field_name("type")
                .map(|t| parsed.node_text(t).to_string())
                .or_else(|| value.as_deref().map(infer_type));

            properties.push(PropertyToken {
                name: name.to_string(),
                position: Some(Position::from_node(attribute)),
                type_name,
                value,
                visibility: visibility_of(name),
                is_static: false,
                readonly: false,
            });
        }
        Ok(properties)
    }
}

impl Default for PythonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for PythonAnalyzer {
    fn provider(&self) -> &'static str {
        "python"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["python"]
    }

    fn analyze(&self, document: &Document, _settings: &LanguageSettings) -> Result<TokenTree> {
        let parsed = ParsedFile::parse(&self.language, document)?;
        let root = parsed.tree.root_node();
        let mut builder = TreeBuilder::new();

        let statements = named_children(root);
        let first_statement = statements
            .iter()
            .find(|n| !PREAMBLE_KINDS.contains(&n.kind()) && !is_docstring(**n))
            .map(|n| n.start_position().row);
        for import in recover_imports(&document.text, first_statement) {
            builder.import(import);
        }

        for node in statements {
            let (decorators, definition) = unwrap_decorated(&parsed, node);
            match definition.kind() {
                "class_definition" => {
                    if let Some(class) = self.class(&parsed, definition)? {
                        builder.class(class);
                    }
                }
                "function_definition" => {
                    if let Some(function) = function(&parsed, definition, &decorators, false) {
                        builder.function(MethodToken {
                            is_static: true,
                            ..function
                        });
                    }
                }
                "expression_statement" => {
                    for variable in assignments(&parsed, definition) {
                        builder.variable(variable);
                    }
                }
                _ => {}
            }
        }

        Ok(builder.build())
    }
}

impl PythonAnalyzer {
    fn class(&self, parsed: &ParsedFile, node: Node) -> Result<Option<EntityToken>> {
        let Some(name) = node.child_by_field_name("name") else {
            return Ok(None);
        };
        let mut class = EntityToken::new(parsed.node_text(name));
        class.position = Some(Position::from_node(name));
        class.visibility = visibility_of(parsed.node_text(name));

        let Some(body) = node.child_by_field_name("body") else {
            return Ok(Some(class));
        };

        for member in named_children(body) {
            let (decorators, definition) = unwrap_decorated(parsed, member);
            match definition.kind() {
                "function_definition" => {
                    let Some(method) = function(parsed, definition, &decorators, true) else {
                        continue;
                    };
                    match accessor_direction(&decorators) {
                        Some(direction) => class.add_accessor(AccessorToken {
                            type_name: match direction {
                                Direction::Get => method.type_name.clone(),
                                Direction::Set => {
                                    method.arguments.first().and_then(|a| a.type_name.clone())
                                }
                            },
                            name: method.name,
                            position: method.position,
                            visibility: method.visibility,
                            is_abstract: method.is_abstract,
                            direction,
                            ..Default::default()
                        }),
                        None => class.add_method(method),
                    }
                }
                "expression_statement" => {
                    // Class-level assignments are class attributes.
                    for variable in assignments(parsed, definition) {
                        class.add_property(PropertyToken::from_variable(
                            variable.with_static(true),
                        ));
                    }
                }
                _ => {}
            }
        }

        for property in self.self_assignments(parsed, body)? {
            class.add_property(property);
        }

        Ok(Some(class))
    }
}

/// Split a `decorated_definition` into decorator texts and the definition.
fn unwrap_decorated<'t>(parsed: &ParsedFile, node: Node<'t>) -> (Vec<String>, Node<'t>) {
    if node.kind() != "decorated_definition" {
        return (Vec::new(), node);
    }
    let definition = node.child_by_field_name("definition").unwrap_or(node);
    let decorators = named_children(node)
        .into_iter()
        .filter(|n| n.kind() == "decorator")
        .map(|n| parsed.node_text(n).to_string())
        .collect::<Vec<_>>();
    (decorators, definition)
}

fn accessor_direction(decorators: &[String]) -> Option<Direction> {
    decorators.iter().find_map(|d| {
        let d = d.trim_start_matches('@');
        if d == "property" {
            Some(Direction::Get)
        } else if d.ends_with(".setter") {
            Some(Direction::Set)
        } else {
            None
        }
    })
}

fn function(
    parsed: &ParsedFile,
    node: Node,
    decorators: &[String],
    method: bool,
) -> Option<MethodToken> {
    let name = node.child_by_field_name("name")?;
    let name_text = parsed.node_text(name);
    let has = |wanted: &str| {
        decorators
            .iter()
            .any(|d| d.trim_start_matches('@').rsplit('.').next() == Some(wanted))
    };
    let is_static = has("staticmethod") || has("classmethod");

    let mut arguments: Vec<VariableToken> = node
        .child_by_field_name("parameters")
        .map(|params| {
            named_children(params)
                .into_iter()
                .filter_map(|p| parameter(parsed, p))
                .collect()
        })
        .unwrap_or_default();
    // Drop the receiver.
    if method && !has("staticmethod") {
        if let Some(first) = arguments.first() {
            if first.name == "self" || first.name == "cls" {
                arguments.remove(0);
            }
        }
    }

    Some(MethodToken {
        name: name_text.to_string(),
        position: Some(Position::from_node(name)),
        type_name: node
            .child_by_field_name("return_type")
            .map(|t| parsed.node_text(t).to_string()),
        value: None,
        visibility: visibility_of(name_text),
        is_static,
        arguments,
        is_abstract: has("abstractmethod"),
        readonly: false,
    })
}

fn parameter(parsed: &ParsedFile, node: Node) -> Option<VariableToken> {
    let (name, type_node, value) = match node.kind() {
        "identifier" => (parsed.node_text(node).to_string(), None, None),
        "typed_parameter" => {
            let inner = named_children(node).into_iter().next()?;
            (
                parsed.node_text(inner).to_string(),
                node.child_by_field_name("type"),
                None,
            )
        }
        "default_parameter" | "typed_default_parameter" => (
            parsed.node_text(node.child_by_field_name("name")?).to_string(),
            node.child_by_field_name("type"),
            node.child_by_field_name("value"),
        ),
        "list_splat_pattern" | "dictionary_splat_pattern" => {
            (parsed.node_text(node).to_string(), None, None)
        }
        _ => return None,
    };

    let value = value.map(|v| text::collapse_whitespace(parsed.node_text(v)));
    let mut argument = VariableToken::new(name).with_position(Some(Position::from_node(node)));
    argument.type_name = type_node
        .map(|t| parsed.node_text(t).to_string())
        .or_else(|| value.as_deref().map(infer_type));
    argument.value = value;
    Some(argument)
}

/// Simple `name = value` assignments of an expression statement.
fn assignments(parsed: &ParsedFile, statement: Node) -> Vec<VariableToken> {
    named_children(statement)
        .into_iter()
        .filter(|n| n.kind() == "assignment")
        .filter_map(|assign| {
            let left = assign.child_by_field_name("left")?;
            if left.kind() != "identifier" {
                return None;
            }
            let name = parsed.node_text(left);
            let value = assign
                .child_by_field_name("right")
                .map(|v| text::collapse_whitespace(parsed.node_text(v)));
            let mut variable = VariableToken::new(name)
                .with_position(Some(Position::from_node(left)))
                .with_visibility(visibility_of(name));
            variable.type_name = assign
                .child_by_field_name("type")
                .map(|t| parsed.node_text(t).to_string())
                .or_else(|| value.as_deref().map(infer_type));
            variable.value = value;
            Some(variable)
        })
        .collect()
}

fn is_docstring(node: Node) -> bool {
    node.kind() == "expression_statement"
        && node
            .named_child(0)
            .map(|c| c.kind() == "string")
            .unwrap_or(false)
}

/// Naming-convention visibility: `__name` private, `_name` protected.
fn visibility_of(name: &str) -> Visibility {
    if name.starts_with("__") && !name.ends_with("__") {
        Visibility::Private
    } else if name.starts_with('_') && !name.starts_with("__") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

/// Nearest `class_definition` above `node`.
fn enclosing_class(node: Node) -> Option<Node> {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "class_definition" {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Type of a default value.
pub fn infer_type(value: &str) -> String {
    let value = value.trim();
    let Some(first) = value.chars().next() else {
        return "any".to_string();
    };
    match first {
        c if c.is_ascii_digit() => "number".to_string(),
        '-' if value[1..].starts_with(|c: char| c.is_ascii_digit()) => "number".to_string(),
        '"' | '\'' => "string".to_string(),
        '{' => "dict".to_string(),
        '[' => "list".to_string(),
        '(' => "tuple".to_string(),
        c if c.is_uppercase() => value
            .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .next()
            .unwrap_or(value)
            .to_string(),
        _ => "any".to_string(),
    }
}

/// Re-scan the lines before the first statement for import lines.
fn recover_imports(source: &str, first_statement: Option<usize>) -> Vec<ImportToken> {
    let limit = first_statement.unwrap_or(usize::MAX);
    let mut imports = Vec::new();

    for (line_no, line) in source.lines().enumerate().take(limit) {
        let trimmed = line.trim();
        if trimmed.starts_with('#') || !trimmed.contains("import ") {
            continue;
        }
        let indent = line.len() - line.trim_start().len();

        if let Some(rest) = trimmed.strip_prefix("from ") {
            let Some((module, names)) = rest.split_once(" import ") else {
                continue;
            };
            let names: Vec<&str> = names
                .trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .collect();
            let module = module.trim();
            let position = Some(text::position_in_line(line_no, line, module));

            match names.as_slice() {
                [single] if single.contains(" as ") => {
                    let (symbol, alias) = single.split_once(" as ").unwrap_or((single, ""));
                    imports.push(ImportToken {
                        name: format!("{}: {}", module, symbol.trim()),
                        position,
                        alias: Some(alias.trim().to_string()),
                    });
                }
                _ => imports.push(ImportToken {
                    name: format!("{}: {}", module, names.join(", ")),
                    position,
                    alias: None,
                }),
            }
        } else if let Some(rest) = trimmed.strip_prefix("import ") {
            for part in rest.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (name, alias) = match part.split_once(" as ") {
                    Some((name, alias)) => (name.trim(), Some(alias.trim().to_string())),
                    None => (part, None),
                };
                let column = line.find(name).unwrap_or(indent);
                imports.push(ImportToken {
                    name: name.to_string(),
                    position: Some(Position::on_line(line_no, column, name.len())),
                    alias,
                });
            }
        }
    }
    imports
}

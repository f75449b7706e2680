//! PHP language analyzer using tree-sitter.
//!
//! A single depth-first walk over the program collects the namespace, `use`
//! imports, `declare(strict_types=1)`, classes, interfaces, traits, free
//! functions and top-level assignments. Literal initializers are rendered
//! into short printable strings and drive type inference for untyped
//! members.

use tree_sitter::{Language, Node};

use crate::analysis::{children, named_children, LanguageAnalyzer, Modifiers, ParsedFile};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::Result;
use crate::tokens::{
    qualify, ConstantToken, EntityKind, EntityToken, ImportToken, MethodToken, Position,
    PropertyToken, TokenTree, TreeBuilder, VariableToken, Visibility,
};

/// Namespace separator.
pub const SEPARATOR: &str = "\\";

/// Array literals show at most this many items before `..`.
const MAX_ARRAY_ITEMS: usize = 2;

/// Binary operators whose result is an integer.
const INT_OPERATORS: &[&str] = &["**", "|", ">>", "<<", "&", "^", "+", "-", "/", "*"];

pub struct PhpAnalyzer {
    language: Language,
}

impl PhpAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_php::LANGUAGE_PHP.into(),
        }
    }
}

impl Default for PhpAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for PhpAnalyzer {
    fn provider(&self) -> &'static str {
        "php"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["php"]
    }

    fn analyze(&self, document: &Document, settings: &LanguageSettings) -> Result<TokenTree> {
        let parsed = ParsedFile::parse(&self.language, document)?;
        parsed.reject_errors()?;

        let mut walker = Walker {
            parsed: &parsed,
            settings,
            builder: TreeBuilder::new(),
            namespace: None,
        };
        walker.walk_statements(parsed.tree.root_node());
        Ok(walker.builder.build())
    }
}

struct Walker<'a> {
    parsed: &'a ParsedFile,
    settings: &'a LanguageSettings,
    builder: TreeBuilder,
    /// Namespace in effect for the declarations being walked.
    namespace: Option<String>,
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node) -> &'a str {
        self.parsed.node_text(node)
    }

    fn walk_statements(&mut self, parent: Node) {
        for node in named_children(parent) {
            match node.kind() {
                "namespace_definition" => self.visit_namespace(node),
                "namespace_use_declaration" => self.visit_use(node),
                "declare_statement" => self.visit_declare(node),
                "class_declaration" => self.visit_entity(node, EntityKind::Class),
                "interface_declaration" => self.visit_entity(node, EntityKind::Interface),
                "trait_declaration" => self.visit_entity(node, EntityKind::Trait),
                "function_definition" => {
                    let function = self.visit_callable(node, true);
                    self.builder.function(function);
                }
                "expression_statement" => self.visit_assignment(node),
                "compound_statement" => self.walk_statements(node),
                _ => {}
            }
        }
    }

    fn visit_namespace(&mut self, node: Node) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).trim_start_matches('\\').to_string());
        if let Some(ns) = &name {
            if self.builder.namespace().is_none() {
                self.builder.set_namespace(ns.clone());
            }
        }
        match node.child_by_field_name("body") {
            // namespace X { ... }
            Some(body) => {
                let outer = std::mem::replace(&mut self.namespace, name);
                self.walk_statements(body);
                self.namespace = outer;
            }
            // namespace X; applies to the following statements
            None => self.namespace = name,
        }
    }

    fn visit_use(&mut self, node: Node) {
        let nodes = named_children(node);
        // use App\{A, B as C};
        let prefix = nodes
            .iter()
            .find(|n| matches!(n.kind(), "namespace_name" | "namespace_prefix"))
            .map(|n| self.text(*n).trim_matches('\\').to_string());

        for child in nodes {
            match child.kind() {
                "namespace_use_clause" => self.use_clause(child, prefix.as_deref()),
                "namespace_use_group" => {
                    for clause in named_children(child) {
                        if clause.kind().starts_with("namespace_use") {
                            self.use_clause(clause, prefix.as_deref());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn use_clause(&mut self, clause: Node, prefix: Option<&str>) {
        let mut name = None;
        let mut alias = None;
        let mut after_as = false;
        for child in children(clause) {
            match child.kind() {
                "as" => after_as = true,
                "name" | "qualified_name" | "namespace_name" if after_as => {
                    alias = Some(self.text(child))
                }
                "name" | "qualified_name" | "namespace_name" if name.is_none() => {
                    name = Some(child)
                }
                _ => {}
            }
        }
        let Some(name_node) = name else { return };
        let local = self.text(name_node).trim_start_matches('\\');
        let full = match prefix {
            Some(p) => format!("{}{}{}", p, SEPARATOR, local),
            None => local.to_string(),
        };
        self.builder.import(ImportToken {
            name: full,
            position: Some(Position::from_node(name_node)),
            alias: alias.map(str::to_string),
        });
    }

    fn visit_declare(&mut self, node: Node) {
        let text = self.text(node);
        if let Some(directive) = text
            .split(&['(', ')'][..])
            .nth(1)
            .filter(|d| d.contains("strict_types"))
        {
            let value = directive.split('=').nth(1).map(str::trim);
            self.builder.strict(value == Some("1"));
        }
    }

    fn visit_entity(&mut self, node: Node, kind: EntityKind) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let modifiers = self.modifiers_before(node, name_node);

        let mut entity = EntityToken::new(qualify(
            self.text(name_node),
            self.namespace.as_deref(),
            SEPARATOR,
            self.settings.namespace_position,
        ));
        entity.position = Some(Position::from_node(name_node));
        entity.is_abstract = modifiers.is_abstract;
        entity.readonly = modifiers.is_final;

        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(body) {
                match member.kind() {
                    "const_declaration" => {
                        for constant in self.visit_constants(member) {
                            entity.add_constant(constant);
                        }
                    }
                    "property_declaration" => {
                        for property in self.visit_properties(member) {
                            entity.add_property(property);
                        }
                    }
                    "method_declaration" => {
                        let method = self.visit_callable(member, false);
                        entity.add_method(method);
                    }
                    "use_declaration" => {
                        for used in named_children(member) {
                            if matches!(used.kind(), "name" | "qualified_name") {
                                let mut token =
                                    EntityToken::new(self.text(used).trim_start_matches('\\'));
                                token.position = Some(Position::from_node(used));
                                entity.add_trait(token);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        self.builder.entity(kind, entity);
    }

    fn visit_constants(&self, node: Node) -> Vec<ConstantToken> {
        let first = named_children(node)
            .into_iter()
            .find(|n| n.kind() == "const_element");
        let modifiers = match first {
            Some(el) => self.modifiers_before(node, el),
            None => Modifiers::default(),
        };

        named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "const_element")
            .filter_map(|element| {
                let parts = named_children(element);
                let name = parts.first()?;
                let value = parts.get(1);
                let mut constant = VariableToken::new(self.text(*name))
                    .with_position(Some(Position::from_node(*name)))
                    .with_visibility(modifiers.visibility)
                    .with_static(true);
                if let Some(value) = value {
                    constant.type_name = Some(self.infer_type(*value));
                    constant.value = Some(self.render_value(*value, 0));
                }
                Some(constant)
            })
            .collect()
    }

    fn visit_properties(&self, node: Node) -> Vec<PropertyToken> {
        let elements: Vec<_> = named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "property_element")
            .collect();
        let Some(first) = elements.first() else {
            return Vec::new();
        };
        let modifiers = self.modifiers_before(node, *first);
        let declared_type = node
            .child_by_field_name("type")
            .map(|t| normalize_type(self.text(t)));

        elements
            .iter()
            .filter_map(|element| {
                let name = named_children(*element)
                    .into_iter()
                    .find(|n| n.kind() == "variable_name")?;
                let value = self.property_default(*element);
                let type_name = declared_type
                    .clone()
                    .or_else(|| value.map(|v| self.infer_type(v)))
                    .unwrap_or_else(|| "mixed".to_string());

                Some(PropertyToken {
                    name: variable_name(self.text(name)).to_string(),
                    position: Some(Position::from_node(name)),
                    type_name: Some(type_name),
                    value: value.map(|v| self.render_value(v, 0)),
                    visibility: modifiers.visibility,
                    is_static: modifiers.is_static,
                    readonly: modifiers.is_readonly,
                })
            })
            .collect()
    }

    fn property_default<'t>(&self, element: Node<'t>) -> Option<Node<'t>> {
        if let Some(value) = element.child_by_field_name("default_value") {
            return Some(value);
        }
        named_children(element)
            .into_iter()
            .find_map(|child| match child.kind() {
                "variable_name" => None,
                "property_initializer" => named_children(child).into_iter().next(),
                _ => Some(child),
            })
    }

    /// Methods and free functions.
    fn visit_callable(&self, node: Node, free: bool) -> MethodToken {
        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|n| self.text(n)).unwrap_or_default();
        let modifiers = match name_node {
            Some(n) if !free => self.modifiers_before(node, n),
            _ => Modifiers::default(),
        };

        let is_structor = matches!(name.to_ascii_lowercase().as_str(), "__construct" | "__destruct");
        let type_name = if is_structor {
            None
        } else {
            Some(
                node.child_by_field_name("return_type")
                    .map(|t| normalize_type(self.text(t)))
                    .unwrap_or_else(|| "mixed".to_string()),
            )
        };

        let arguments = node
            .child_by_field_name("parameters")
            .map(|params| {
                named_children(params)
                    .into_iter()
                    .filter_map(|p| self.visit_parameter(p))
                    .collect()
            })
            .unwrap_or_default();

        MethodToken {
            name: name.to_string(),
            position: name_node.map(Position::from_node),
            type_name,
            value: None,
            visibility: modifiers.visibility,
            is_static: free || modifiers.is_static,
            arguments,
            is_abstract: modifiers.is_abstract,
            readonly: modifiers.is_final,
        }
    }

    fn visit_parameter(&self, node: Node) -> Option<VariableToken> {
        if !node.kind().ends_with("parameter") {
            return None;
        }
        let name_node = node.child_by_field_name("name").or_else(|| {
            named_children(node)
                .into_iter()
                .find(|n| n.kind() == "variable_name")
        })?;

        let mut prefix = String::new();
        let before = &self.text(node)[..name_node.start_byte() - node.start_byte()];
        if before.contains('&') {
            prefix.push('&');
        }
        if node.kind() == "variadic_parameter" || before.contains("...") {
            prefix.push_str("...");
        }

        let default = node.child_by_field_name("default_value");
        let type_name = node
            .child_by_field_name("type")
            .map(|t| normalize_type(self.text(t)))
            .or_else(|| default.map(|d| self.infer_type(d)))
            .unwrap_or_else(|| "mixed".to_string());

        let mut argument = VariableToken::new(format!(
            "{}{}",
            prefix,
            variable_name(self.text(name_node))
        ))
        .with_position(Some(Position::from_node(name_node)))
        .with_type(type_name);
        argument.value = default.map(|d| self.render_value(d, 0));
        Some(argument)
    }

    fn visit_assignment(&mut self, statement: Node) {
        let Some(assign) = named_children(statement)
            .into_iter()
            .find(|n| n.kind() == "assignment_expression")
        else {
            return;
        };
        let (Some(left), Some(right)) = (
            assign.child_by_field_name("left"),
            assign.child_by_field_name("right"),
        ) else {
            return;
        };
        // $a[] = ..., $this->x = ... are not declarations
        if left.kind() != "variable_name" {
            return;
        }

        let variable = VariableToken::new(variable_name(self.text(left)))
            .with_position(Some(Position::from_node(left)))
            .with_type(self.infer_type(right))
            .with_value(self.render_value(right, 0));
        self.builder.variable(variable);
    }

    /// Keywords written between the start of `node` and `anchor`.
    fn modifiers_before(&self, node: Node, anchor: Node) -> Modifiers {
        let text = self.text(node);
        let end = anchor.start_byte().saturating_sub(node.start_byte()).min(text.len());
        Modifiers::parse(&text[..end])
    }

    /// Printable rendering of a literal initializer.
    fn render_value(&self, node: Node, depth: usize) -> String {
        match node.kind() {
            "array_creation_expression" => {
                if depth > 0 {
                    return "[..]".to_string();
                }
                let elements: Vec<_> = named_children(node)
                    .into_iter()
                    .filter(|n| n.kind() == "array_element_initializer")
                    .collect();
                let mut items: Vec<String> = elements
                    .iter()
                    .take(MAX_ARRAY_ITEMS)
                    .map(|el| {
                        let parts = named_children(*el);
                        match parts.as_slice() {
                            [key, value] => format!(
                                "{}: {}",
                                self.render_value(*key, depth + 1),
                                self.render_value(*value, depth + 1)
                            ),
                            [value] => self.render_value(*value, depth + 1),
                            _ => self.text(*el).to_string(),
                        }
                    })
                    .collect();
                if elements.len() > MAX_ARRAY_ITEMS {
                    items.push("..".to_string());
                }
                format!("[{}]", items.join(", "))
            }
            "string" | "encapsed_string" => {
                let raw = self.text(node);
                let inner = raw
                    .strip_prefix(&['\'', '"'][..])
                    .and_then(|s| s.strip_suffix(&['\'', '"'][..]))
                    .unwrap_or(raw);
                format!("\"{}\"", inner)
            }
            "class_constant_access_expression" => {
                let parts = named_children(node);
                match parts.as_slice() {
                    [class, constant] => {
                        let class = self.text(*class).trim_start_matches('\\');
                        let short = class.rsplit('\\').next().unwrap_or(class);
                        let class = if self.builder.is_imported(short) {
                            short
                        } else {
                            class
                        };
                        format!("{}::{}", class, self.text(*constant))
                    }
                    _ => self.text(node).to_string(),
                }
            }
            "object_creation_expression" => match self.created_class(node) {
                Some(class) => format!("new {}", class),
                None => self.text(node).to_string(),
            },
            "binary_expression" => {
                let (Some(left), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) else {
                    return self.text(node).to_string();
                };
                format!(
                    "{} {} {}",
                    self.render_value(left, depth),
                    self.operator(node),
                    self.render_value(right, depth)
                )
            }
            "parenthesized_expression" => named_children(node)
                .into_iter()
                .next()
                .map(|inner| format!("({})", self.render_value(inner, depth)))
                .unwrap_or_default(),
            _ => self
                .text(node)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Type of an untyped initializer.
    fn infer_type(&self, node: Node) -> String {
        match node.kind() {
            "array_creation_expression" => "array".into(),
            "string" | "encapsed_string" | "heredoc" | "nowdoc" => "string".into(),
            "integer" => "int".into(),
            "float" => "float".into(),
            "boolean" => "boolean".into(),
            "binary_expression" => {
                let op = self.operator(node);
                if op == "." {
                    "string".into()
                } else if INT_OPERATORS.contains(&op) {
                    "int".into()
                } else {
                    "mixed".into()
                }
            }
            "object_creation_expression" => self
                .created_class(node)
                .unwrap_or_else(|| "mixed".to_string()),
            "parenthesized_expression" => named_children(node)
                .into_iter()
                .next()
                .map(|inner| self.infer_type(inner))
                .unwrap_or_else(|| "mixed".into()),
            "name" => {
                let text = self.text(node);
                if text == "__LINE__" {
                    "int".into()
                } else if text.len() > 4 && text.starts_with("__") && text.ends_with("__") {
                    "string".into()
                } else {
                    "mixed".into()
                }
            }
            _ => "mixed".into(),
        }
    }

    fn operator(&self, node: Node) -> &'a str {
        if let Some(op) = node.child_by_field_name("operator") {
            return self.text(op);
        }
        children(node)
            .into_iter()
            .find(|c| !c.is_named())
            .map(|c| self.text(c))
            .unwrap_or("")
    }

    fn created_class(&self, node: Node) -> Option<String> {
        named_children(node)
            .into_iter()
            .find(|n| matches!(n.kind(), "name" | "qualified_name"))
            .map(|n| self.text(n).trim_start_matches('\\').to_string())
    }
}

/// Strip `$` from a variable name.
fn variable_name(text: &str) -> &str {
    text.trim_start_matches('$')
}

/// Drop leading namespace separators from every part of a type.
fn normalize_type(text: &str) -> String {
    let text = text.trim().trim_start_matches(':').trim();
    let mut out = String::with_capacity(text.len());
    let mut boundary = true;
    for c in text.chars() {
        if c == '\\' && boundary {
            continue;
        }
        boundary = matches!(c, '?' | '|' | '&' | '(' | ' ');
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::NamespacePosition;

    fn analyze(source: &str) -> TokenTree {
        analyze_with(source, NamespacePosition::Full)
    }

    fn analyze_with(source: &str, policy: NamespacePosition) -> TokenTree {
        let settings = LanguageSettings {
            namespace_position: policy,
            ..Default::default()
        };
        PhpAnalyzer::new()
            .analyze(&Document::new("php", "test.php", source), &settings)
            .unwrap()
    }

    #[test]
    fn test_class_with_constant_and_method() {
        let tree = analyze(
            "<?php\nnamespace App;\nclass Foo { public const BAR = 1; public function baz(int $x = 5): string {} }\n",
        );
        assert_eq!(tree.namespace.as_deref(), Some("App"));
        assert_eq!(tree.classes.len(), 1);
        let class = &tree.classes[0];
        assert_eq!(class.name, "App\\Foo");

        assert_eq!(class.constants.len(), 1);
        assert_eq!(class.constants[0].name, "BAR");
        assert_eq!(class.constants[0].value.as_deref(), Some("1"));
        assert_eq!(class.constants[0].type_name.as_deref(), Some("int"));

        let method = &class.methods[0];
        assert_eq!(method.name, "baz");
        assert_eq!(method.type_name.as_deref(), Some("string"));
        assert_eq!(method.arguments.len(), 1);
        assert_eq!(method.arguments[0].name, "x");
        assert_eq!(method.arguments[0].type_name.as_deref(), Some("int"));
        assert_eq!(method.arguments[0].value.as_deref(), Some("5"));
    }

    #[test]
    fn test_namespace_policies() {
        let src = "<?php\nnamespace App\\Models;\ninterface Repo {}\n";
        assert_eq!(
            analyze_with(src, NamespacePosition::Suffix).interfaces[0].name,
            "Repo: App\\Models"
        );
        assert_eq!(analyze_with(src, NamespacePosition::None).interfaces[0].name, "Repo");
    }

    #[test]
    fn test_strict_types_and_imports() {
        let tree = analyze(
            "<?php\ndeclare(strict_types=1);\nuse App\\Models\\User;\nuse Psr\\Log\\LoggerInterface as Logger;\n",
        );
        assert_eq!(tree.strict, Some(true));
        assert_eq!(tree.imports.len(), 2);
        assert_eq!(tree.imports[0].name, "App\\Models\\User");
        assert_eq!(tree.imports[1].alias.as_deref(), Some("Logger"));
        assert_eq!(tree.imports[0].position.map(|p| p.start.line), Some(2));
    }

    #[test]
    fn test_class_modifiers_and_members() {
        let tree = analyze(
            r#"<?php
abstract class Base {
    use Loggable;
    protected static $count = 0;
    private readonly string $name;
    public $tags = ['a', 'b', 'c'];
    public function __construct(string $name) {}
    abstract protected function run(array &$items, ...$rest);
    final public static function make(): static { return new static(); }
}
final class Leaf extends Base {}
"#,
        );
        let base = &tree.classes[0];
        assert!(base.is_abstract);
        assert!(tree.classes[1].readonly);
        assert_eq!(base.traits[0].name, "Loggable");

        let count = &base.properties[0];
        assert_eq!(count.name, "count");
        assert!(count.is_static);
        assert_eq!(count.visibility, Visibility::Protected);
        assert_eq!(count.type_name.as_deref(), Some("int"));

        let name = &base.properties[1];
        assert!(name.readonly);
        assert_eq!(name.type_name.as_deref(), Some("string"));

        let tags = &base.properties[2];
        assert_eq!(tags.value.as_deref(), Some("[\"a\", \"b\", ..]"));
        assert_eq!(tags.type_name.as_deref(), Some("array"));

        let ctor = &base.methods[0];
        assert_eq!(ctor.name, "__construct");
        assert!(ctor.type_name.is_none());

        let run = &base.methods[1];
        assert!(run.is_abstract);
        assert_eq!(run.visibility, Visibility::Protected);
        assert_eq!(run.type_name.as_deref(), Some("mixed"));
        assert_eq!(run.arguments[0].name, "&items");
        assert_eq!(run.arguments[1].name, "...rest");

        let make = &base.methods[2];
        assert!(make.is_static);
        assert!(make.readonly);
    }

    #[test]
    fn test_value_rendering_and_inference() {
        let tree = analyze(
            r#"<?php
use App\Status;
$a = 'x' . 'y';
$b = 1 << 2;
$c = new \App\Client();
$d = Status::ACTIVE;
$e = [1, [2, 3]];
$f = ['k' => 'v'];
$g = 1.5;
$h = __LINE__;
$i = __FILE__;
$j = true;
"#,
        );
        let var = |name: &str| tree.variables.iter().find(|v| v.name == name).unwrap();
        assert_eq!(var("a").type_name.as_deref(), Some("string"));
        assert_eq!(var("a").value.as_deref(), Some("\"x\" . \"y\""));
        assert_eq!(var("b").type_name.as_deref(), Some("int"));
        assert_eq!(var("c").type_name.as_deref(), Some("App\\Client"));
        assert_eq!(var("c").value.as_deref(), Some("new App\\Client"));
        assert_eq!(var("d").value.as_deref(), Some("Status::ACTIVE"));
        assert_eq!(var("e").value.as_deref(), Some("[1, [..]]"));
        assert_eq!(var("f").value.as_deref(), Some("[\"k\": \"v\"]"));
        assert_eq!(var("g").type_name.as_deref(), Some("float"));
        assert_eq!(var("h").type_name.as_deref(), Some("int"));
        assert_eq!(var("i").type_name.as_deref(), Some("string"));
        assert_eq!(var("j").type_name.as_deref(), Some("boolean"));
    }

    #[test]
    fn test_functions_are_static_and_types_normalized() {
        let tree = analyze("<?php\nfunction find(?\\App\\User $u): ?\\App\\User { return $u; }\n");
        let find = &tree.functions[0];
        assert!(find.is_static);
        assert_eq!(find.type_name.as_deref(), Some("?App\\User"));
        assert_eq!(find.arguments[0].type_name.as_deref(), Some("?App\\User"));
    }

    #[test]
    fn test_syntax_error_is_parse_failure() {
        let result = PhpAnalyzer::new().analyze(
            &Document::new("php", "broken.php", "<?php class { function"),
            &LanguageSettings::default(),
        );
        assert!(matches!(
            result,
            Err(crate::error::OutlineError::ParseFailure { .. })
        ));
    }

    #[test]
    fn test_idempotent() {
        let src = "<?php\nnamespace A;\nclass B { private $c = [1,2,3]; }\n";
        assert_eq!(analyze(src), analyze(src));
    }

    #[test]
    fn test_normalize_type() {
        assert_eq!(normalize_type("\\Foo\\Bar"), "Foo\\Bar");
        assert_eq!(normalize_type("?\\Foo"), "?Foo");
        assert_eq!(normalize_type("\\A|\\B"), "A|B");
        assert_eq!(normalize_type(": int"), "int");
    }
}

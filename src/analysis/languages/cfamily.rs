//! C, C++ and C# analyzer.
//!
//! Reconstructs the outline from flat document symbols. Modifiers, types and
//! values are recovered heuristically from the declaration line of each
//! symbol: trimmed, last character dropped, first 20 whitespace tokens.

use std::sync::Arc;

use tracing::debug;

use crate::analysis::{text, LanguageAnalyzer, Modifiers};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::Result;
use crate::tokens::{
    qualify, EntityToken, ImportToken, MethodToken, PropertyToken, TokenTree, TreeBuilder,
    VariableToken,
};

use super::symbols::{DocumentSymbol, SymbolKind, SymbolProvider, TreeSitterSymbols};

pub const SEPARATOR: &str = ".";

/// Declaration-line tokens consulted for modifiers and types.
const MAX_LINE_TOKENS: usize = 20;

pub struct CFamilyAnalyzer {
    symbols: Arc<dyn SymbolProvider>,
}

impl CFamilyAnalyzer {
    pub fn new() -> Self {
        Self::with_symbols(Arc::new(TreeSitterSymbols::new()))
    }

    /// Use another symbol source, typically a language server.
    pub fn with_symbols(symbols: Arc<dyn SymbolProvider>) -> Self {
        Self { symbols }
    }
}

impl Default for CFamilyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for CFamilyAnalyzer {
    fn provider(&self) -> &'static str {
        "cfamily"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["csharp", "c", "cpp"]
    }

    fn analyze(&self, document: &Document, settings: &LanguageSettings) -> Result<TokenTree> {
        let symbols = self.symbols.document_symbols(document)?;
        debug!(file = %document.file_name, count = symbols.len(), "document symbols");

        let lines: Vec<&str> = document.text.lines().collect();
        let mut builder = TreeBuilder::new();

        for symbol in symbols {
            let definition = definition_line(&lines, symbol.range.start.line);
            let position = Some(symbol.range);

            match symbol.kind {
                SymbolKind::Namespace => builder.set_namespace(symbol.name.replace("::", SEPARATOR)),
                SymbolKind::Module | SymbolKind::Package => builder.import(ImportToken {
                    name: symbol.name,
                    position,
                    alias: None,
                }),
                SymbolKind::Class | SymbolKind::Struct | SymbolKind::Interface => {
                    let keys = Modifiers::from_words(text::leading_tokens(&definition, MAX_LINE_TOKENS));
                    let mut entity = EntityToken::new(qualify(
                        &symbol.name,
                        builder.namespace(),
                        SEPARATOR,
                        settings.namespace_position,
                    ));
                    entity.position = position;
                    if symbol.kind == SymbolKind::Interface {
                        builder.interface(entity);
                    } else {
                        entity.is_abstract = keys.is_abstract;
                        entity.readonly = keys.is_final;
                        builder.class(entity);
                    }
                }
                SymbolKind::Property | SymbolKind::Field => {
                    let Some(parent) = parent_of(&mut builder, &symbol) else {
                        continue;
                    };
                    let var = variable(&definition, &symbol);
                    parent.add_property(PropertyToken {
                        readonly: has_keyword(&definition, "readonly"),
                        ..PropertyToken::from_variable(var)
                    });
                }
                SymbolKind::Method | SymbolKind::Constructor => {
                    let Some(parent) = parent_of(&mut builder, &symbol) else {
                        continue;
                    };
                    parent.add_method(method(&definition, &symbol));
                }
                SymbolKind::Variable => builder.variable(variable(&definition, &symbol)),
                SymbolKind::Function => builder.function(MethodToken {
                    is_static: true,
                    ..method(&definition, &symbol)
                }),
            }
        }

        Ok(builder.build())
    }
}

fn parent_of<'b>(
    builder: &'b mut TreeBuilder,
    symbol: &DocumentSymbol,
) -> Option<&'b mut EntityToken> {
    let container = symbol.container_name.as_deref()?;
    builder.find_entity_mut(container, SEPARATOR)
}

/// The declaration line, trimmed, without its last character.
fn definition_line(lines: &[&str], line: usize) -> String {
    let mut definition = lines.get(line).map(|l| l.trim()).unwrap_or("").to_string();
    definition.pop();
    definition
}

fn has_keyword(definition: &str, keyword: &str) -> bool {
    text::leading_tokens(definition, MAX_LINE_TOKENS).contains(&keyword)
}

/// A field, property or variable from its declaration line.
fn variable(definition: &str, symbol: &DocumentSymbol) -> VariableToken {
    let tokens = text::leading_tokens(definition, MAX_LINE_TOKENS);
    let modifiers = Modifiers::from_words(tokens.iter().copied());

    let name_index = tokens
        .iter()
        .position(|t| *t == symbol.name)
        .or_else(|| tokens.iter().position(|t| t.starts_with(symbol.name.as_str())));
    let type_name = name_index
        .filter(|i| *i > 0)
        .map(|i| tokens[i - 1])
        .filter(|t| !is_modifier(t))
        .map(str::to_string);

    let value = tokens
        .iter()
        .position(|t| *t == "=")
        .map(|i| tokens[i + 1..].join(" ").trim().to_string())
        .filter(|v| !v.is_empty());

    VariableToken {
        name: symbol.name.clone(),
        position: Some(symbol.range),
        type_name,
        value,
        visibility: modifiers.visibility,
        is_static: modifiers.is_static,
    }
}

/// A method or function from its declaration line.
fn method(definition: &str, symbol: &DocumentSymbol) -> MethodToken {
    let tokens = text::leading_tokens(definition, MAX_LINE_TOKENS);
    let modifiers = Modifiers::from_words(tokens.iter().copied());
    let name = symbol
        .name
        .split('(')
        .next()
        .unwrap_or(&symbol.name)
        .to_string();

    let type_name = if symbol.kind == SymbolKind::Constructor {
        None
    } else {
        tokens
            .iter()
            .position(|t| t.split('(').next() == Some(name.as_str()))
            .filter(|i| *i > 0)
            .map(|i| tokens[i - 1])
            .filter(|t| !is_modifier(t))
            .map(str::to_string)
    };

    MethodToken {
        name,
        position: Some(symbol.range),
        type_name,
        value: None,
        visibility: modifiers.visibility,
        is_static: modifiers.is_static,
        arguments: arguments(definition),
        is_abstract: modifiers.is_abstract,
        readonly: modifiers.is_final,
    }
}

/// Arguments between the first `(` and the following `)` (or line end),
/// each as `type name = default`.
fn arguments(definition: &str) -> Vec<VariableToken> {
    let Some(open) = definition.find('(') else {
        return Vec::new();
    };
    let rest = &definition[open + 1..];
    let inner = rest.find(')').map(|close| &rest[..close]).unwrap_or(rest);

    inner
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty() && *a != "void")
        .map(|argument| {
            let (declaration, value) = match argument.split_once('=') {
                Some((d, v)) => (d.trim(), Some(v.trim().to_string())),
                None => (argument, None),
            };
            let mut parts: Vec<&str> = declaration.split_whitespace().collect();
            let name = parts.pop().unwrap_or(declaration);
            let mut token = VariableToken::new(name);
            if !parts.is_empty() {
                token.type_name = Some(parts.join(" "));
            }
            token.value = value.filter(|v| !v.is_empty());
            token
        })
        .collect()
}

fn is_modifier(word: &str) -> bool {
    matches!(
        word,
        "public"
            | "protected"
            | "private"
            | "internal"
            | "static"
            | "abstract"
            | "final"
            | "sealed"
            | "readonly"
            | "virtual"
            | "override"
            | "extern"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{NamespacePosition, Position, Visibility};

    /// Symbols as a language server would report them.
    struct FixedSymbols(Vec<DocumentSymbol>);

    impl SymbolProvider for FixedSymbols {
        fn document_symbols(&self, _document: &Document) -> Result<Vec<DocumentSymbol>> {
            Ok(self.0.clone())
        }
    }

    fn symbol(kind: SymbolKind, name: &str, container: Option<&str>, line: usize) -> DocumentSymbol {
        DocumentSymbol {
            name: name.to_string(),
            kind,
            container_name: container.map(str::to_string),
            range: Position::on_line(line, 0, name.len()),
        }
    }

    const CART: &str = r#"using System;
namespace Acme.Shop
{
    public abstract class Cart
    {
        private readonly List<string> items = new List<string>();
        public static int Count { get; set; }
        public Cart(int size)
        {
        }
        public virtual decimal Total(decimal tax = 0.2m, bool round = true)
        {
        }
    }
}
"#;

    fn cart_symbols() -> Vec<DocumentSymbol> {
        vec![
            symbol(SymbolKind::Module, "System", None, 0),
            symbol(SymbolKind::Namespace, "Acme.Shop", None, 1),
            symbol(SymbolKind::Class, "Cart", None, 3),
            symbol(SymbolKind::Field, "items", Some("Cart"), 5),
            symbol(SymbolKind::Property, "Count", Some("Cart"), 6),
            symbol(SymbolKind::Constructor, "Cart", Some("Cart"), 7),
            symbol(SymbolKind::Method, "Total(decimal, bool)", Some("Cart"), 10),
            symbol(SymbolKind::Method, "Orphan", Some("Missing"), 10),
        ]
    }

    fn analyze(settings: &LanguageSettings) -> TokenTree {
        CFamilyAnalyzer::with_symbols(Arc::new(FixedSymbols(cart_symbols())))
            .analyze(&Document::new("csharp", "Cart.cs", CART), settings)
            .unwrap()
    }

    #[test]
    fn test_rebuilds_classes_from_symbols() {
        let tree = analyze(&LanguageSettings::default());
        assert_eq!(tree.namespace.as_deref(), Some("Acme.Shop"));
        assert_eq!(tree.imports[0].name, "System");

        let cart = &tree.classes[0];
        assert_eq!(cart.name, "Acme.Shop.Cart");
        assert!(cart.is_abstract);

        let items = &cart.properties[0];
        assert_eq!(items.type_name.as_deref(), Some("List<string>"));
        assert_eq!(items.value.as_deref(), Some("new List<string>()"));
        assert_eq!(items.visibility, Visibility::Private);
        assert!(items.readonly);

        let count = &cart.properties[1];
        assert!(count.is_static);
        assert_eq!(count.type_name.as_deref(), Some("int"));
        assert_eq!(count.value, None);
    }

    #[test]
    fn test_methods_and_arguments() {
        let tree = analyze(&LanguageSettings::default());
        let cart = &tree.classes[0];
        assert_eq!(cart.methods.len(), 2);

        let constructor = &cart.methods[0];
        assert_eq!(constructor.name, "Cart");
        assert_eq!(constructor.type_name, None);
        assert_eq!(constructor.arguments[0].name, "size");
        assert_eq!(constructor.arguments[0].type_name.as_deref(), Some("int"));

        let total = &cart.methods[1];
        assert_eq!(total.name, "Total");
        assert_eq!(total.type_name.as_deref(), Some("decimal"));
        assert_eq!(total.arguments.len(), 2);
        assert_eq!(total.arguments[0].value.as_deref(), Some("0.2m"));
        assert_eq!(total.arguments[1].name, "round");
    }

    #[test]
    fn test_suffix_policy_still_finds_parents() {
        let settings = LanguageSettings {
            namespace_position: NamespacePosition::Suffix,
            ..Default::default()
        };
        let tree = analyze(&settings);
        assert_eq!(tree.classes[0].name, "Cart: Acme.Shop");
        assert_eq!(tree.classes[0].properties.len(), 2);
    }

    #[test]
    fn test_no_symbols_gives_empty_tree() {
        let tree = CFamilyAnalyzer::with_symbols(Arc::new(FixedSymbols(Vec::new())))
            .analyze(&Document::new("c", "a.c", "int x;"), &LanguageSettings::default())
            .unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_tree_sitter_symbols_for_c() {
        let source = "#include <stdio.h>\n\nstatic int counter = 1;\n\nint add(int a, int b) {\n    return a + b;\n}\n";
        let tree = CFamilyAnalyzer::new()
            .analyze(&Document::new("c", "add.c", source), &LanguageSettings::default())
            .unwrap();
        assert_eq!(tree.imports[0].name, "stdio.h");

        let counter = &tree.variables[0];
        assert_eq!(counter.name, "counter");
        assert!(counter.is_static);
        assert_eq!(counter.type_name.as_deref(), Some("int"));
        assert_eq!(counter.value.as_deref(), Some("1"));

        let add = &tree.functions[0];
        assert!(add.is_static);
        assert_eq!(add.type_name.as_deref(), Some("int"));
        let args: Vec<_> = add.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(args, vec!["a", "b"]);
    }

    #[test]
    fn test_nested_cpp_namespace_keeps_members() {
        let source = "namespace a::b {\nclass Foo {\npublic:\n int count = 0;\n void run(int x);\n};\n}\n";
        let tree = CFamilyAnalyzer::new()
            .analyze(&Document::new("cpp", "foo.hpp", source), &LanguageSettings::default())
            .unwrap();
        assert_eq!(tree.namespace.as_deref(), Some("a.b"));

        let foo = &tree.classes[0];
        assert_eq!(foo.name, "a.b.Foo");
        assert_eq!(foo.properties.len(), 1);
        assert_eq!(foo.properties[0].name, "count");
        assert_eq!(foo.methods.len(), 1);
        assert_eq!(foo.methods[0].name, "run");
    }

    #[test]
    fn test_scoped_namespace_symbols_nest_members() {
        let symbols = vec![
            symbol(SymbolKind::Namespace, "a::b", None, 0),
            symbol(SymbolKind::Class, "Foo", None, 1),
            symbol(SymbolKind::Field, "count", Some("Foo"), 3),
        ];
        let source = "namespace a::b {\nclass Foo {\npublic:\n int count = 0;\n};\n}\n";
        let tree = CFamilyAnalyzer::with_symbols(Arc::new(FixedSymbols(symbols)))
            .analyze(&Document::new("cpp", "foo.hpp", source), &LanguageSettings::default())
            .unwrap();
        assert_eq!(tree.classes[0].name, "a.b.Foo");
        assert_eq!(tree.classes[0].properties[0].name, "count");
    }

    #[test]
    fn test_arguments_parsing() {
        let args = arguments("int main(int argc, char** argv");
        assert_eq!(args[1].name, "argv");
        assert_eq!(args[1].type_name.as_deref(), Some("char**"));
        assert!(arguments("void f(void)").is_empty());
        assert!(arguments("int x").is_empty());
    }
}

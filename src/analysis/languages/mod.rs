//! Language-specific analyzer implementations.

mod cfamily;
mod css;
mod items;
mod java;
mod json;
mod less;
mod php;
mod python;
mod rapid;
mod rules;
mod symbols;
mod typescript;

pub use cfamily::CFamilyAnalyzer;
pub use css::CssAnalyzer;
pub use items::ItemsAnalyzer;
pub use java::JavaAnalyzer;
pub use json::JsonAnalyzer;
pub use less::LessAnalyzer;
pub use php::PhpAnalyzer;
pub use python::PythonAnalyzer;
pub use rapid::RapidAnalyzer;
pub use rules::RulesAnalyzer;
pub use symbols::{DocumentSymbol, SymbolKind, SymbolProvider, TreeSitterSymbols};
pub use typescript::TypeScriptAnalyzer;

/// Namespace separators used when qualifying entity names.
pub mod separators {
    pub use super::cfamily::SEPARATOR as CFAMILY;
    pub use super::java::SEPARATOR as JAVA;
    pub use super::php::SEPARATOR as PHP;
    pub use super::typescript::SEPARATOR as TYPESCRIPT;
}

/// Host language id for a file extension.
///
/// Returns None if no analyzer handles the extension.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "php" | "phtml" => Some("php"),
        "java" => Some("java"),
        "ts" | "mts" | "cts" => Some("typescript"),
        "tsx" => Some("typescriptreact"),
        "js" | "mjs" | "cjs" => Some("javascript"),
        "jsx" => Some("javascriptreact"),
        "py" | "pyi" => Some("python"),
        "c" | "h" => Some("c"),
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some("cpp"),
        "cs" => Some("csharp"),
        "rules" | "items" => Some("openhab"),
        "css" => Some("css"),
        "less" => Some("less"),
        "json" => Some("json"),
        "mod" | "modx" | "sys" | "sysx" | "prg" | "prgx" => Some("rapid"),
        _ => None,
    }
}

/// Get all registered file extensions.
pub fn registered_extensions() -> Vec<&'static str> {
    vec![
        "php", "phtml", "java", "ts", "mts", "cts", "tsx", "js", "mjs", "cjs", "jsx", "py",
        "pyi", "c", "h", "cpp", "cc", "cxx", "hpp", "hh", "hxx", "cs", "rules", "items", "css",
        "less", "json", "mod", "modx", "sys", "sysx", "prg", "prgx",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_extension_maps_to_a_language() {
        for ext in registered_extensions() {
            assert!(language_for_extension(ext).is_some(), "{ext}");
        }
        assert_eq!(language_for_extension("PHP"), Some("php"));
        assert_eq!(language_for_extension("rs"), None);
    }
}

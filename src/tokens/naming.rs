//! Namespace qualification of entity names.

use serde::{Deserialize, Serialize};

/// Where the namespace goes in a displayed entity name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespacePosition {
    /// `App\Foo`
    #[default]
    Full,
    /// `Foo: App`
    Suffix,
    /// `Foo`
    None,
}

/// Qualify `name` with `namespace` according to `policy`.
pub fn qualify(
    name: &str,
    namespace: Option<&str>,
    separator: &str,
    policy: NamespacePosition,
) -> String {
    match (namespace.filter(|ns| !ns.is_empty()), policy) {
        (Some(ns), NamespacePosition::Full) => format!("{}{}{}", ns, separator, name),
        (Some(ns), NamespacePosition::Suffix) => format!("{}: {}", name, ns),
        _ => name.to_string(),
    }
}

/// Split a qualified name into its simple name and namespace.
///
/// Understands both the full form (`App\Foo`) and the suffix form
/// (`Foo: App`). A `::` scope operator is never a suffix marker.
pub fn split_qualified<'a>(name: &'a str, separator: &str) -> (&'a str, Option<&'a str>) {
    if let Some(idx) = suffix_marker(name) {
        let ns = name[idx + 1..].trim();
        return (name[..idx].trim(), (!ns.is_empty()).then_some(ns));
    }
    match name.rfind(separator) {
        Some(idx) if !separator.is_empty() => {
            let ns = &name[..idx];
            (&name[idx + separator.len()..], (!ns.is_empty()).then_some(ns))
        }
        _ => (name, None),
    }
}

/// Byte index of the first lone `:`.
fn suffix_marker(name: &str) -> Option<usize> {
    let bytes = name.as_bytes();
    (0..bytes.len()).find(|&i| {
        bytes[i] == b':'
            && bytes.get(i + 1) != Some(&b':')
            && (i == 0 || bytes[i - 1] != b':')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_policies() {
        assert_eq!(qualify("Foo", Some("App"), "\\", NamespacePosition::Full), "App\\Foo");
        assert_eq!(qualify("Foo", Some("App"), ".", NamespacePosition::Suffix), "Foo: App");
        assert_eq!(qualify("Foo", Some("App"), ".", NamespacePosition::None), "Foo");
    }

    #[test]
    fn test_qualify_without_namespace_is_bare() {
        for policy in [
            NamespacePosition::Full,
            NamespacePosition::Suffix,
            NamespacePosition::None,
        ] {
            assert_eq!(qualify("Foo", None, ".", policy), "Foo");
            assert_eq!(qualify("Foo", Some(""), ".", policy), "Foo");
        }
    }

    #[test]
    fn test_split_qualified_forms() {
        assert_eq!(split_qualified("App\\Http\\Foo", "\\"), ("Foo", Some("App\\Http")));
        assert_eq!(split_qualified("Foo: App", "\\"), ("Foo", Some("App")));
        assert_eq!(split_qualified("com.acme.Foo", "."), ("Foo", Some("com.acme")));
        assert_eq!(split_qualified("Foo", "."), ("Foo", None));
        assert_eq!(split_qualified("Foo : ", "."), ("Foo", None));
    }

    #[test]
    fn test_scope_operator_is_not_a_suffix() {
        assert_eq!(split_qualified("a::b.Foo", "."), ("Foo", Some("a::b")));
        assert_eq!(split_qualified("std::vector", "."), ("std::vector", None));
        assert_eq!(split_qualified("Foo: a::b", "."), ("Foo", Some("a::b")));
    }
}

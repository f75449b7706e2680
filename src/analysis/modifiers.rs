//! Modifier keywords shared by the brace-language analyzers.

use crate::tokens::Visibility;

/// Modifier keywords found in a declaration prefix.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    pub visibility: Visibility,
    /// Whether a visibility keyword was written at all.
    pub explicit_visibility: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    /// `final` or `sealed`.
    pub is_final: bool,
    pub is_readonly: bool,
}

impl Modifiers {
    /// Scan whitespace-separated words; unknown words are ignored.
    pub fn parse(text: &str) -> Self {
        Self::from_words(text.split_whitespace())
    }

    pub fn from_words<'w>(words: impl IntoIterator<Item = &'w str>) -> Self {
        let mut modifiers = Modifiers::default();
        for word in words {
            let word = word.to_ascii_lowercase();
            match word.as_str() {
                "static" => modifiers.is_static = true,
                "abstract" => modifiers.is_abstract = true,
                "final" | "sealed" => modifiers.is_final = true,
                "readonly" => modifiers.is_readonly = true,
                other => {
                    if let Some(v) = Visibility::from_keyword(other) {
                        modifiers.visibility = v;
                        modifiers.explicit_visibility = true;
                    }
                }
            }
        }
        modifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        let m = Modifiers::parse("final protected static function");
        assert!(m.is_final);
        assert!(m.is_static);
        assert_eq!(m.visibility, Visibility::Protected);
        assert!(m.explicit_visibility);
        assert!(!m.is_abstract);
    }

    #[test]
    fn test_defaults_to_public() {
        let m = Modifiers::parse("@Override\nvoid");
        assert_eq!(m.visibility, Visibility::Public);
        assert!(!m.explicit_visibility);
    }

    #[test]
    fn test_sealed_counts_as_final() {
        assert!(Modifiers::parse("public sealed class").is_final);
        assert!(Modifiers::parse("ABSTRACT").is_abstract);
    }
}

//! openHAB `.items` analyzer.

use phf::phf_set;

use crate::analysis::{text, LanguageAnalyzer};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::Result;
use crate::tokens::{TokenTree, TreeBuilder, VariableToken};

/// Item types; `Number:Temperature` style subtypes are accepted too.
static ITEM_TYPES: phf::Set<&'static str> = phf_set! {
    "Color",
    "Contact",
    "DateTime",
    "Dimmer",
    "Group",
    "Image",
    "Location",
    "Number",
    "Player",
    "Rollershutter",
    "String",
    "Switch",
};

pub struct ItemsAnalyzer;

impl ItemsAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ItemsAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for ItemsAnalyzer {
    fn provider(&self) -> &'static str {
        "openhab"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["openhab"]
    }

    fn has_support(&self, document: &Document) -> bool {
        document.language_is("openhab") && document.file_name.ends_with("items")
    }

    fn analyze(&self, document: &Document, _settings: &LanguageSettings) -> Result<TokenTree> {
        let stripped = text::strip_comments(&document.text);
        let mut builder = TreeBuilder::new();

        for line in stripped.lines() {
            let mut words = line.split_whitespace();
            let (Some(kind), Some(name)) = (words.next(), words.next()) else {
                continue;
            };
            if !is_item_type(kind) {
                continue;
            }
            builder.item(
                VariableToken::new(name)
                    .with_type(kind)
                    .with_position(text::first_occurrence(&document.text, name)),
            );
        }

        Ok(builder.build())
    }
}

fn is_item_type(word: &str) -> bool {
    let base = word.split(':').next().unwrap_or(word);
    ITEM_TYPES.contains(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_by_type_keyword() {
        let source = "// lights\nGroup gAll\nSwitch Kitchen_Light \"Kitchen\" (gAll)\nNumber:Temperature Outside_Temp \"Temp [%.1f °C]\"\nUnknown Thing\n/* Dimmer Hidden */\n";
        let tree = ItemsAnalyzer::new()
            .analyze(
                &Document::new("openhab", "home.items", source),
                &LanguageSettings::default(),
            )
            .unwrap();

        let names: Vec<_> = tree.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["gAll", "Kitchen_Light", "Outside_Temp"]);
        assert_eq!(tree.items[2].type_name.as_deref(), Some("Number:Temperature"));

        let light = tree.items[1].position.unwrap();
        assert_eq!((light.start.line, light.start.column), (2, 7));
    }

    #[test]
    fn test_supports_items_files_only() {
        let analyzer = ItemsAnalyzer::new();
        assert!(analyzer.has_support(&Document::new("OpenHAB", "home.items", "")));
        assert!(!analyzer.has_support(&Document::new("openhab", "home.rules", "")));
    }

    #[test]
    fn test_item_type_subtypes() {
        assert!(is_item_type("Group:Switch"));
        assert!(is_item_type("Switch"));
        assert!(!is_item_type("switch"));
    }
}

//! openHAB `.rules` analyzer.
//!
//! Line oriented: after comment removal, `import` and `rule` lines are
//! collected by prefix. Variables are the `val`/`var` lines between the
//! last import and the first rule, once lambda bodies have been collapsed.
//! Positions are the first occurrence of each name in the original text.

use crate::analysis::{text, LanguageAnalyzer};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::Result;
use crate::tokens::{ImportToken, TokenTree, TreeBuilder, VariableToken};

pub struct RulesAnalyzer;

impl RulesAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RulesAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for RulesAnalyzer {
    fn provider(&self) -> &'static str {
        "openhab"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["openhab"]
    }

    fn has_support(&self, document: &Document) -> bool {
        document.language_is("openhab") && document.file_name.ends_with("rules")
    }

    fn analyze(&self, document: &Document, _settings: &LanguageSettings) -> Result<TokenTree> {
        let original = document.text.as_str();
        let stripped = text::strip_comments(original);
        let mut builder = TreeBuilder::new();

        for line in stripped.lines() {
            if let Some(name) = import_name(line) {
                builder.import(ImportToken {
                    position: text::first_occurrence(original, name),
                    name: name.to_string(),
                    alias: None,
                });
            } else if let Some(name) = rule_name(line) {
                builder.rule(
                    VariableToken::new(name).with_position(text::first_occurrence(original, name)),
                );
            }
        }

        for name in variable_names(&text::strip_lambdas(&stripped)) {
            builder.variable(
                VariableToken::new(name).with_position(text::first_occurrence(original, name)),
            );
        }

        Ok(builder.build())
    }
}

fn import_name(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("import")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim().trim_end_matches(';').trim();
    (!name.is_empty()).then_some(name)
}

fn rule_name(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("rule")?;
    if !rest.starts_with(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
        return None;
    }
    let name = text::unquote(rest);
    (!name.is_empty()).then_some(name)
}

/// `val`/`var` names declared between the last import and the first rule.
fn variable_names(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines
        .iter()
        .rposition(|l| import_name(l).is_some())
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = lines
        .iter()
        .position(|l| rule_name(l).is_some())
        .unwrap_or(lines.len())
        .max(start);

    lines[start..end]
        .iter()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line
                .strip_prefix("val ")
                .or_else(|| line.strip_prefix("var "))?;
            let declaration = rest.split('=').next().unwrap_or(rest);
            // `var Timer timer` declares `timer`.
            declaration.split_whitespace().last()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"import org.openhab.core.library.types.*
import java.util.Map // utilities

/* state shared between rules */
val int LIMIT = 10
var Timer timer = null
val handler = [ String item |
    val inner = 1
    logInfo("rules", item)
]

rule "Lights On"
when
    Item Motion changed to ON
then
    var local = 2
    sendCommand(Lights, ON)
end

rule "Lights Off"
when
    Time cron "0 0 23 * * ?"
then
    timer = null
end
"#;

    fn analyze(document: &Document) -> TokenTree {
        RulesAnalyzer::new()
            .analyze(document, &LanguageSettings::default())
            .unwrap()
    }

    #[test]
    fn test_rules_imports_and_variables() {
        let tree = analyze(&Document::new("openhab", "home.rules", RULES));

        let imports: Vec<_> = tree.imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(imports, vec!["org.openhab.core.library.types.*", "java.util.Map"]);

        let rules: Vec<_> = tree.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(rules, vec!["Lights On", "Lights Off"]);

        let variables: Vec<_> = tree.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(variables, vec!["LIMIT", "timer", "handler"]);
    }

    #[test]
    fn test_positions_use_first_occurrence() {
        let tree = analyze(&Document::new("openhab", "home.rules", RULES));
        let on = tree.rules[0].position.unwrap();
        assert_eq!((on.start.line, on.start.column), (11, 6));

        let limit = tree.variables[0].position.unwrap();
        assert_eq!(limit.start.line, 4);
    }

    #[test]
    fn test_supports_rules_files_only() {
        let analyzer = RulesAnalyzer::new();
        assert!(analyzer.has_support(&Document::new("openhab", "a.rules", "")));
        assert!(!analyzer.has_support(&Document::new("openhab", "a.items", "")));
        assert!(!analyzer.has_support(&Document::new("java", "a.rules", "")));
    }

    #[test]
    fn test_empty_document() {
        assert!(analyze(&Document::new("openhab", "x.rules", "")).is_empty());
    }
}

//! ABB RAPID analyzer.
//!
//! RAPID has a tiny fixed vocabulary, so each trimmed line is tested
//! against an ordered list of patterns; the first match wins. `MODULE`
//! opens the current class and later records and routines attach to it.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::analysis::LanguageAnalyzer;
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::Result;
use crate::tokens::{
    EntityToken, MethodToken, Position, PropertyToken, TokenTree, TreeBuilder, VariableToken,
    Visibility,
};

/// Return type of routines that declare none.
const DEFAULT_TYPE: &str = "void";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Method,
    Function,
    Property,
    Class,
}

lazy_static! {
    static ref PATTERNS: Vec<(Section, Regex)> = vec![
        (
            Section::Method,
            Regex::new(r"^((?:LOCAL)?\s?(?:PROC|FUNC))\s?(?:(?:(\w+)\s)?([^\(]+)|[^\(]+)\((.*)?\)$")
                .unwrap(),
        ),
        (
            Section::Function,
            Regex::new(r"^(TRAP)\s?(?:(?:(\w+)\s)?([^\(]+)|[^\(]+)$").unwrap(),
        ),
        (Section::Property, Regex::new(r"^(RECORD)\s?(\w+)$").unwrap()),
        (Section::Class, Regex::new(r"^(MODULE)\s+?(.*)$").unwrap()),
    ];
}

pub struct RapidAnalyzer;

impl RapidAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RapidAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for RapidAnalyzer {
    fn provider(&self) -> &'static str {
        "rapid"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["rapid"]
    }

    fn analyze(&self, document: &Document, _settings: &LanguageSettings) -> Result<TokenTree> {
        let mut builder = TreeBuilder::new();

        for (index, raw) in document.text.lines().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            let Some((section, caps)) = PATTERNS
                .iter()
                .find_map(|(section, re)| re.captures(line).map(|caps| (*section, caps)))
            else {
                continue;
            };

            let visibility = if caps[0].contains("LOCAL") {
                Visibility::Private
            } else {
                Visibility::Public
            };

            match section {
                Section::Class => {
                    let name = caps[2].split('(').next().unwrap_or("").trim();
                    if name.is_empty() {
                        continue;
                    }
                    let mut module = EntityToken::new(name);
                    module.position = Some(locate(index, raw, name));
                    builder.class(module);
                }
                Section::Property => {
                    let name = &caps[2];
                    let position = Some(locate(index, raw, name));
                    // Records outside a module have nowhere to go.
                    if let Some(module) = builder.last_class_mut() {
                        module.add_property(PropertyToken {
                            name: name.to_string(),
                            position,
                            visibility,
                            ..Default::default()
                        });
                    }
                }
                Section::Method => {
                    let Some(routine) = routine(index, raw, &caps, visibility) else {
                        continue;
                    };
                    if let Some(module) = builder.last_class_mut() {
                        module.add_method(routine);
                    }
                }
                Section::Function => {
                    if let Some(routine) = routine(index, raw, &caps, visibility) {
                        builder.function(MethodToken {
                            is_static: true,
                            ..routine
                        });
                    }
                }
            }
        }

        Ok(builder.build())
    }
}

fn routine(index: usize, raw: &str, caps: &Captures, visibility: Visibility) -> Option<MethodToken> {
    let name = caps.get(3)?.as_str().trim();
    if name.is_empty() {
        return None;
    }
    let arguments = caps
        .get(4)
        .map(|args| parse_arguments(args.as_str()))
        .unwrap_or_default();

    Some(MethodToken {
        name: name.to_string(),
        position: Some(locate(index, raw, name)),
        type_name: Some(
            caps.get(2)
                .map(|t| t.as_str())
                .unwrap_or(DEFAULT_TYPE)
                .to_string(),
        ),
        visibility,
        arguments,
        ..Default::default()
    })
}

/// `num a, \switch b` as `type name` pairs.
fn parse_arguments(args: &str) -> Vec<VariableToken> {
    args.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|argument| {
            let mut words = argument.split_whitespace();
            let type_name = words.next().unwrap_or(argument);
            let name = words.next().unwrap_or(type_name);
            VariableToken::new(name).with_type(type_name)
        })
        .collect()
}

/// Text before a `!` line comment.
fn strip_comment(line: &str) -> &str {
    line.split('!').next().unwrap_or(line)
}

fn locate(index: usize, raw: &str, name: &str) -> Position {
    crate::analysis::text::position_in_line(index, raw, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "RECORD orphan\nMODULE MainModule(SYSMODULE)\n  ! main program\n  RECORD tooldata\n  PROC main()\n  ENDPROC\n  LOCAL FUNC num add(num a, num b)\n  ENDFUNC\n  TRAP on_error\nENDMODULE\n";

    fn analyze(source: &str) -> TokenTree {
        RapidAnalyzer::new()
            .analyze(
                &Document::new("rapid", "main.mod", source),
                &LanguageSettings::default(),
            )
            .unwrap()
    }

    #[test]
    fn test_module_collects_routines() {
        let tree = analyze(SOURCE);
        assert_eq!(tree.classes.len(), 1);
        let module = &tree.classes[0];
        assert_eq!(module.name, "MainModule");
        assert_eq!(module.properties.len(), 1);
        assert_eq!(module.properties[0].name, "tooldata");

        let main = &module.methods[0];
        assert_eq!(main.name, "main");
        assert_eq!(main.type_name.as_deref(), Some("void"));
        assert_eq!(main.visibility, Visibility::Public);
        assert_eq!(main.position.map(|p| (p.start.line, p.start.column)), Some((4, 7)));

        let add = &module.methods[1];
        assert_eq!(add.name, "add");
        assert_eq!(add.type_name.as_deref(), Some("num"));
        assert_eq!(add.visibility, Visibility::Private);
        assert_eq!(add.arguments.len(), 2);
        assert_eq!(add.arguments[1].name, "b");
        assert_eq!(add.arguments[1].type_name.as_deref(), Some("num"));
    }

    #[test]
    fn test_traps_are_functions() {
        let tree = analyze(SOURCE);
        assert_eq!(tree.functions[0].name, "on_error");
        assert!(tree.functions[0].is_static);
    }

    #[test]
    fn test_members_without_module_are_dropped() {
        let tree = analyze("PROC lonely()\nRECORD data\n");
        assert!(tree.classes.is_empty());
        assert!(tree.is_empty());
    }
}

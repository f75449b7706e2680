//! Lexical helpers for the line-oriented analyzers.
//!
//! These are deliberately approximate: comment and lambda removal are
//! ordered regex substitutions, and positions are recovered by searching
//! the original text for the first occurrence of a name.

use lazy_static::lazy_static;
use regex::Regex;

use crate::tokens::{Point, Position, TokenTree};

lazy_static! {
    /// Block comments, and line comments not preceded by `\` or `:` (URLs).
    static ref COMMENTS: Regex = Regex::new(r"(?m)/\*[\s\S]*?\*/|([^\\:]|^)//.*$").unwrap();
    /// Lambda bodies: `[ ... ]` collapsed to `[`.
    static ref LAMBDAS: Regex = Regex::new(r"(\[)([\s\S]*?)(\s\])").unwrap();
}

/// Remove block and line comments.
pub fn strip_comments(text: &str) -> String {
    COMMENTS.replace_all(text, "$1").into_owned()
}

/// Remove lambda bodies so their contents do not look like declarations.
pub fn strip_lambdas(text: &str) -> String {
    LAMBDAS.replace_all(text, "$1").into_owned()
}

/// Position of the first line containing `needle`, at the column where it
/// starts. Duplicate names resolve to the first occurrence.
pub fn first_occurrence(text: &str, needle: &str) -> Option<Position> {
    if needle.is_empty() {
        return None;
    }
    text.lines().enumerate().find_map(|(line, content)| {
        content
            .find(needle)
            .map(|column| Position::on_line(line, column, needle.len()))
    })
}

/// Position of `needle` on a known line.
pub fn position_in_line(line: usize, content: &str, needle: &str) -> Position {
    let column = content.find(needle).unwrap_or(0);
    Position::on_line(line, column, needle.len())
}

/// Rewrite the byte columns analyzers produce as character columns.
pub fn use_char_columns(tree: &mut TokenTree, text: &str) {
    let lines: Vec<&str> = text.split('\n').collect();
    let convert = |point: &mut Point| {
        if let Some(line) = lines.get(point.line) {
            point.column = line
                .char_indices()
                .take_while(|(byte, _)| *byte < point.column)
                .count();
        }
    };
    tree.for_each_position(|position| {
        convert(&mut position.start);
        convert(&mut position.end);
    });
}

/// The first `limit` whitespace-separated tokens of a line.
pub fn leading_tokens(line: &str, limit: usize) -> Vec<&str> {
    line.split_whitespace().take(limit).collect()
}

/// Remove one layer of matching surrounding quotes.
pub fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments_keeps_urls() {
        let src = "val a = 1 // note\n/* block\n comment */val url = \"http://x\"\n";
        let out = strip_comments(src);
        assert!(!out.contains("note"));
        assert!(!out.contains("block"));
        assert!(out.contains("http://x"));
        assert!(out.contains("val a = 1"));
    }

    #[test]
    fn test_strip_lambdas() {
        let src = "val f = [ var x = 1\n x + 1 ]\nval y = 2";
        let out = strip_lambdas(src);
        assert!(!out.contains("var x"));
        assert!(out.contains("val y = 2"));
    }

    #[test]
    fn test_char_columns() {
        let text = "ä = 1\nplain";
        let mut tree = TokenTree {
            variables: vec![
                crate::tokens::VariableToken::new("x").with_position(Some(Position::on_line(0, 5, 1))),
                crate::tokens::VariableToken::new("y").with_position(Some(Position::on_line(1, 2, 3))),
            ],
            ..Default::default()
        };
        use_char_columns(&mut tree, text);
        assert_eq!(tree.variables[0].position, Some(Position::on_line(0, 4, 1)));
        assert_eq!(tree.variables[1].position, Some(Position::on_line(1, 2, 3)));
    }

    #[test]
    fn test_first_occurrence() {
        let text = "import foo\n\nval x = 3\nval xx = 4";
        assert_eq!(first_occurrence(text, "x ="), Some(Position::on_line(2, 4, 3)));
        assert_eq!(first_occurrence(text, "missing"), None);
        assert_eq!(first_occurrence(text, ""), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"Example\""), "Example");
        assert_eq!(unquote("'a'"), "a");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_leading_tokens() {
        assert_eq!(leading_tokens("  public static int x = 1;", 3), vec!["public", "static", "int"]);
    }
}

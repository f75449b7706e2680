//! LESS analyzer.
//!
//! A brace-aware statement scanner rather than a full grammar: top-level
//! `@name: value;` statements are variables, top-level rule sets become
//! selector nodes with their declarations. Nested rule sets, mixin
//! definitions and at-rule blocks are skipped. Mixin calls inside a rule
//! set are kept as declarations named after the mixin.

use crate::analysis::{text, LanguageAnalyzer};
use crate::config::LanguageSettings;
use crate::document::Document;
use crate::error::{OutlineError, Result};
use crate::tokens::{Position, TokenTree, TreeBuilder, VariableToken, Visibility};

pub struct LessAnalyzer;

impl LessAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LessAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for LessAnalyzer {
    fn provider(&self) -> &'static str {
        "less"
    }

    fn language_ids(&self) -> &'static [&'static str] {
        &["less"]
    }

    fn analyze(&self, document: &Document, _settings: &LanguageSettings) -> Result<TokenTree> {
        let source = blank_comments(&document.text);
        let mut scanner = Scanner::new(&source, &document.file_name);
        let mut builder = TreeBuilder::new();

        loop {
            let statement = scanner.statement();
            let trimmed = statement.text.trim();
            match statement.end {
                End::Eof => break,
                End::Close => return Err(scanner.unbalanced(statement.offset)),
                End::Semicolon => {
                    if trimmed.starts_with('@') {
                        if let Some(variable) = scanner.declaration(&statement) {
                            builder.variable(
                                variable
                                    .with_static(true)
                                    .with_visibility(Visibility::Public),
                            );
                        }
                    }
                }
                End::Open => {
                    if trimmed.starts_with('@') || is_mixin_definition(trimmed) {
                        scanner.skip_block()?;
                        continue;
                    }
                    let declarations = scanner.rule_body()?;
                    builder.declarations(selector_key(trimmed), declarations);
                }
            }
        }

        Ok(builder.build())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Semicolon,
    Open,
    Close,
    Eof,
}

struct Statement<'s> {
    text: &'s str,
    offset: usize,
    end: End,
}

struct Scanner<'s> {
    source: &'s str,
    pos: usize,
    line_starts: Vec<usize>,
    file: &'s str,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str, file: &'s str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            pos: 0,
            line_starts,
            file,
        }
    }

    /// Text up to the next `;`, `{` or `}` outside strings, parentheses
    /// and `@{...}` interpolations.
    fn statement(&mut self) -> Statement<'s> {
        let bytes = self.source.as_bytes();
        let start = self.pos;
        let mut depth = 0usize;
        let mut quote = None;

        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            if let Some(q) = quote {
                if b == b'\\' {
                    self.pos += 1;
                } else if b == q {
                    quote = None;
                }
                self.pos += 1;
                continue;
            }
            match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b'{' if self.pos > 0 && bytes[self.pos - 1] == b'@' => {
                    while self.pos < bytes.len() && bytes[self.pos] != b'}' {
                        self.pos += 1;
                    }
                }
                b';' | b'{' | b'}' if depth == 0 => {
                    let end = match b {
                        b';' => End::Semicolon,
                        b'{' => End::Open,
                        _ => End::Close,
                    };
                    let text = &self.source[start..self.pos];
                    self.pos += 1;
                    return Statement {
                        text,
                        offset: start,
                        end,
                    };
                }
                _ => {}
            }
            self.pos += 1;
        }

        let end = self.source.len();
        self.pos = end;
        Statement {
            text: &self.source[start.min(end)..end],
            offset: start,
            end: End::Eof,
        }
    }

    /// Skip the rest of a block whose `{` was just consumed.
    fn skip_block(&mut self) -> Result<()> {
        let mut depth = 1usize;
        loop {
            let statement = self.statement();
            match statement.end {
                End::Open => depth += 1,
                End::Close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                End::Semicolon => {}
                End::Eof => return Err(self.unbalanced(statement.offset)),
            }
        }
    }

    /// Declarations of a rule set whose `{` was just consumed.
    fn rule_body(&mut self) -> Result<Vec<VariableToken>> {
        let mut declarations = Vec::new();
        loop {
            let statement = self.statement();
            match statement.end {
                End::Semicolon | End::Close => {
                    if let Some(declaration) = self.declaration(&statement) {
                        declarations.push(declaration);
                    }
                    if statement.end == End::Close {
                        return Ok(declarations);
                    }
                }
                End::Open => self.skip_block()?,
                End::Eof => return Err(self.unbalanced(statement.offset)),
            }
        }
    }

    /// `name: value` or a mixin call `.name(args)`.
    fn declaration(&self, statement: &Statement) -> Option<VariableToken> {
        let trimmed = statement.text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lead = statement.text.len() - statement.text.trim_start().len();
        let at = statement.offset + lead;

        let (name, value) = if trimmed.starts_with('.') || trimmed.starts_with('#') {
            match trimmed.find('(') {
                Some(open) => {
                    let inner = trimmed[open + 1..].trim_end();
                    let inner = inner.strip_suffix(')').unwrap_or(inner);
                    (trimmed[..open].trim(), format!("({})", inner.trim()))
                }
                None => (trimmed, "()".to_string()),
            }
        } else {
            let (name, value) = trimmed.split_once(':')?;
            (name.trim(), text::collapse_whitespace(value))
        };

        Some(
            VariableToken::new(name)
                .with_value(value)
                .with_position(Some(self.position(at, name.len()))),
        )
    }

    fn position(&self, offset: usize, len: usize) -> Position {
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        Position::on_line(line, offset - self.line_starts[line], len)
    }

    fn unbalanced(&self, offset: usize) -> OutlineError {
        let at = self.position(offset.min(self.source.len()), 0);
        OutlineError::parse(self.file, format!("unbalanced braces near {}", at))
    }
}

/// `.mixin(@a; @b) { ... }` and `#ns.mixin() { ... }`.
fn is_mixin_definition(prelude: &str) -> bool {
    (prelude.starts_with('.') || prelude.starts_with('#')) && prelude.contains('(')
}

fn selector_key(prelude: &str) -> String {
    prelude
        .split(',')
        .map(text::collapse_whitespace)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replace comments with spaces so offsets stay valid.
fn blank_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = bytes.to_vec();
    let mut i = 0;
    let mut quote = None;
    let mut parens = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = source[i + 2..]
                    .find("*/")
                    .map(|e| i + 2 + e + 2)
                    .unwrap_or(bytes.len());
                blank(&mut out, i, end);
                i = end;
                continue;
            }
            // `url(http://...)` is not a comment.
            b'/' if parens == 0 && bytes.get(i + 1) == Some(&b'/') => {
                let end = source[i..].find('\n').map(|e| i + e).unwrap_or(bytes.len());
                blank(&mut out, i, end);
                i = end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn blank(out: &mut [u8], start: usize, end: usize) {
    for b in &mut out[start..end] {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

//! Entity generation: render an interface stub or a class skeleton from an
//! entity of the current outline.
//!
//! Generators emit one [`TextEdit`] per output line; [`render`] joins them
//! into the file text written by the orchestrator.

mod java;
mod php;
mod typescript;

use crate::error::{OutlineError, Result};
use crate::tokens::{split_qualified, EntityKind, EntityToken, MethodToken};

pub use java::JavaGenerator;
pub use php::PhpGenerator;
pub use typescript::TypeScriptGenerator;

/// Indentation of one nesting level in generated code.
pub(crate) const INDENT: &str = "    ";

/// What to produce from the source entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum GenerationMode {
    /// Extract an interface: no bodies, no static methods.
    Interface,
    /// Implement or duplicate: a class with not-implemented bodies.
    Implementation,
}

impl GenerationMode {
    pub fn includes_body(&self) -> bool {
        *self == GenerationMode::Implementation
    }
}

/// One line of generated text, inserted at `line` of an empty document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub line: usize,
    pub text: String,
}

/// Concatenate edits into the final file text.
pub fn render(edits: &[TextEdit]) -> String {
    let mut lines: Vec<&TextEdit> = edits.iter().collect();
    lines.sort_by_key(|edit| edit.line);
    let mut out = String::new();
    for edit in lines {
        out.push_str(&edit.text);
        out.push('\n');
    }
    out
}

/// Settings for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Emit the strict-mode preamble.
    pub strict: bool,
    /// Namespace of the new entity, when not embedded in the target name.
    pub namespace: Option<String>,
    /// Namespace of the source entity when its name is not qualified.
    pub source_namespace: Option<String>,
    /// File extension picked by the user, for generators offering several.
    pub extension: Option<String>,
    /// `namespace` or `module` (TypeScript).
    pub namespace_type: String,
}

/// A language capable of rendering entities back into source text.
pub trait EntityGenerator {
    /// Host language id of the generated files.
    fn language(&self) -> &'static str;

    /// Namespace separator used in target names.
    fn separator(&self) -> &'static str;

    /// Extensions the user picks between; empty when the name is fixed.
    fn extensions(&self, _mode: GenerationMode) -> &'static [&'static str] {
        &[]
    }

    /// File name for the generated entity.
    fn document_name(&self, target: &str, mode: GenerationMode, extension: Option<&str>)
        -> String;

    /// Lines of the generated file.
    fn generate(
        &self,
        target: &str,
        source: &EntityToken,
        kind: EntityKind,
        mode: GenerationMode,
        options: &GenerateOptions,
    ) -> Vec<TextEdit>;
}

/// The languages with a generator.
pub enum Generator {
    Php(PhpGenerator),
    Java(JavaGenerator),
    TypeScript(TypeScriptGenerator),
}

impl Generator {
    /// Generator for a host language id.
    pub fn for_language(language_id: &str) -> Result<Self> {
        match language_id.to_ascii_lowercase().as_str() {
            "php" => Ok(Generator::Php(PhpGenerator)),
            "java" => Ok(Generator::Java(JavaGenerator)),
            "typescript" | "javascript" | "typescriptreact" | "javascriptreact" => {
                Ok(Generator::TypeScript(TypeScriptGenerator))
            }
            other => Err(OutlineError::GenerationUnsupported(other.to_string())),
        }
    }

    pub fn inner(&self) -> &dyn EntityGenerator {
        match self {
            Generator::Php(g) => g,
            Generator::Java(g) => g,
            Generator::TypeScript(g) => g,
        }
    }
}

/// Split a target name into its simple name and namespace.
///
/// Accepts `Name : Namespace` as well as the separator form (`Ns\Name`,
/// `ns.Name`). An explicit namespace in the target wins over `fallback`.
pub fn split_target(target: &str, separator: &str, fallback: Option<&str>) -> (String, Option<String>) {
    let (name, namespace) = split_qualified(target.trim(), separator);
    let namespace = namespace
        .or(fallback)
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .map(String::from);
    (name.to_string(), namespace)
}

/// Builder for numbered edits.
#[derive(Default)]
pub(crate) struct Lines {
    edits: Vec<TextEdit>,
}

impl Lines {
    pub fn push(&mut self, text: impl Into<String>) {
        let line = self.edits.len();
        self.edits.push(TextEdit {
            line,
            text: text.into(),
        });
    }

    pub fn blank(&mut self) {
        self.push("");
    }

    pub fn into_edits(self) -> Vec<TextEdit> {
        self.edits
    }
}

/// Public methods a generated entity carries, in source order.
pub(crate) fn generated_methods(source: &EntityToken, mode: GenerationMode) -> Vec<&MethodToken> {
    source
        .methods
        .iter()
        .filter(|m| m.visibility.is_public() && !m.is_magic())
        .filter(|m| mode.includes_body() || !m.is_static)
        .collect()
}

/// `implements Source` applies when implementing an interface.
pub(crate) fn implements_clause(
    source: &EntityToken,
    kind: EntityKind,
    mode: GenerationMode,
    separator: &str,
) -> Option<String> {
    (mode.includes_body() && kind == EntityKind::Interface)
        .then(|| source.simple_name(separator).to_string())
}

/// Simple name and namespace of the source entity.
pub(crate) fn source_parts<'a>(
    source: &'a EntityToken,
    separator: &str,
    options: &'a GenerateOptions,
) -> (&'a str, Option<&'a str>) {
    let (name, namespace) = split_qualified(&source.name, separator);
    (name, namespace.or(options.source_namespace.as_deref()))
}

/// Import line target for the source entity, when it lives in another
/// namespace than the generated one.
pub(crate) fn source_import(
    source: &EntityToken,
    separator: &str,
    target_namespace: Option<&str>,
    options: &GenerateOptions,
) -> Option<String> {
    let (name, namespace) = source_parts(source, separator, options);
    let namespace = namespace.filter(|ns| Some(*ns) != target_namespace)?;
    Some(format!("{}{}{}", namespace, separator, name))
}

/// Type name to print, skipping the "untyped" placeholders.
pub(crate) fn printable_type<'a>(type_name: Option<&'a str>, untyped: &[&str]) -> Option<&'a str> {
    type_name.filter(|t| !t.is_empty() && !untyped.contains(t))
}

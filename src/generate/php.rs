//! PHP entity generator.

use super::{
    generated_methods, implements_clause, printable_type, source_import, split_target,
    EntityGenerator, GenerateOptions, GenerationMode, Lines, TextEdit, INDENT,
};
use crate::analysis::separators;
use crate::tokens::{EntityKind, EntityToken, MethodToken, VariableToken};

const UNTYPED: &[&str] = &["mixed"];

pub struct PhpGenerator;

impl EntityGenerator for PhpGenerator {
    fn language(&self) -> &'static str {
        "php"
    }

    fn separator(&self) -> &'static str {
        separators::PHP
    }

    fn document_name(&self, target: &str, mode: GenerationMode, _extension: Option<&str>) -> String {
        let (name, _) = split_target(target, self.separator(), None);
        match mode {
            GenerationMode::Interface => format!("{}Interface.php", name),
            GenerationMode::Implementation => format!("{}.php", name),
        }
    }

    fn generate(
        &self,
        target: &str,
        source: &EntityToken,
        kind: EntityKind,
        mode: GenerationMode,
        options: &GenerateOptions,
    ) -> Vec<TextEdit> {
        let (name, namespace) =
            split_target(target, self.separator(), options.namespace.as_deref());
        let mut lines = Lines::default();

        lines.push("<?php");
        if options.strict {
            lines.push("declare(strict_types=1);");
        }
        lines.blank();
        if let Some(ns) = &namespace {
            lines.push(format!("namespace {};", ns));
            lines.blank();
        }
        if mode.includes_body() {
            if let Some(import) =
                source_import(source, self.separator(), namespace.as_deref(), options)
            {
                lines.push(format!("use {};", import));
                lines.blank();
            }
        }

        let mut declaration = match mode {
            GenerationMode::Interface => format!("interface {}", name),
            GenerationMode::Implementation => {
                let modifier = if source.readonly {
                    "final "
                } else if source.is_abstract {
                    "abstract "
                } else {
                    ""
                };
                format!("{}class {}", modifier, name)
            }
        };
        if let Some(interface) = implements_clause(source, kind, mode, self.separator()) {
            declaration.push_str(&format!(" implements {}", interface));
        }
        lines.push(declaration);
        lines.push("{");

        let constants: Vec<_> = source
            .constants
            .iter()
            .filter(|c| c.visibility.is_public())
            .collect();
        for constant in &constants {
            let value = constant
                .value
                .as_deref()
                .map(|v| format!(" = {}", v))
                .unwrap_or_default();
            lines.push(format!("{INDENT}const {}{};", constant.name, value));
        }

        let methods = generated_methods(source, mode);
        if !constants.is_empty() && !methods.is_empty() {
            lines.blank();
        }
        for (i, method) in methods.iter().enumerate() {
            if i > 0 && mode.includes_body() {
                lines.blank();
            }
            let signature = signature(method, mode);
            if mode.includes_body() {
                lines.push(format!("{INDENT}{}", signature));
                lines.push(format!("{INDENT}{{"));
                lines.push(format!(
                    "{INDENT}{INDENT}throw new \\BadMethodCallException(\"${{__METHOD__}} Not implemented\");"
                ));
                lines.push(format!("{INDENT}}}"));
            } else {
                lines.push(format!("{INDENT}{};", signature));
            }
        }

        lines.push("}");
        lines.into_edits()
    }
}

fn signature(method: &MethodToken, mode: GenerationMode) -> String {
    let mut out = String::from("public ");
    if mode.includes_body() && method.readonly {
        out.push_str("final ");
    }
    if method.is_static {
        out.push_str("static ");
    }
    let arguments: Vec<String> = method.arguments.iter().map(argument).collect();
    out.push_str(&format!("function {}({})", method.name, arguments.join(", ")));
    if let Some(ty) = printable_type(method.type_name.as_deref(), UNTYPED) {
        out.push_str(&format!(": {}", ty));
    }
    out
}

/// `type &...$name = default`; names are stored without `$`.
fn argument(arg: &VariableToken) -> String {
    let bare = arg.name.trim_start_matches(['&', '.']);
    let prefix = &arg.name[..arg.name.len() - bare.len()];
    let mut out = String::new();
    if let Some(ty) = printable_type(arg.type_name.as_deref(), UNTYPED) {
        out.push_str(ty);
        out.push(' ');
    }
    out.push_str(&format!("{}${}", prefix, bare));
    if let Some(value) = arg.value.as_deref().filter(|v| !v.is_empty()) {
        out.push_str(&format!(" = {}", value));
    }
    out
}

//! TypeScript / JavaScript entity generator.
//!
//! Interfaces always go to `I<Name>.ts`. Classes go to `.ts` or `.js`;
//! JavaScript output drops type annotations, namespaces and `implements`.

use super::{
    generated_methods, implements_clause, printable_type, split_target, EntityGenerator,
    GenerateOptions, GenerationMode, Lines, TextEdit, INDENT,
};
use crate::analysis::separators;
use crate::tokens::{EntityKind, EntityToken, MethodToken, VariableToken};

const EXTENSIONS: &[&str] = &["ts", "js"];

pub struct TypeScriptGenerator;

impl TypeScriptGenerator {
    fn typed(mode: GenerationMode, options: &GenerateOptions) -> bool {
        !mode.includes_body() || options.extension.as_deref() != Some("js")
    }
}

impl EntityGenerator for TypeScriptGenerator {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn separator(&self) -> &'static str {
        separators::TYPESCRIPT
    }

    fn extensions(&self, mode: GenerationMode) -> &'static [&'static str] {
        if mode.includes_body() {
            EXTENSIONS
        } else {
            &[]
        }
    }

    fn document_name(&self, target: &str, mode: GenerationMode, extension: Option<&str>) -> String {
        let (name, _) = split_target(target, self.separator(), None);
        match mode {
            GenerationMode::Interface => format!("I{}.ts", name),
            GenerationMode::Implementation => {
                format!("{}.{}", name, extension.unwrap_or("ts"))
            }
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
        let typed = Self::typed(mode, options);
        let (name, namespace) =
            split_target(target, self.separator(), options.namespace.as_deref());
        let namespace = namespace.filter(|_| typed);
        let pad = if namespace.is_some() { INDENT } else { "" };
        let mut lines = Lines::default();

        if options.strict {
            lines.push("\"use strict\";");
            lines.blank();
        }
        if let Some(ns) = &namespace {
            let keyword = match options.namespace_type.as_str() {
                "" => "namespace",
                other => other,
            };
            lines.push(format!("export {} {} {{", keyword, ns));
        }

        let mut declaration = format!(
            "{pad}export {} {}",
            if mode.includes_body() { "class" } else { "interface" },
            name
        );
        if typed {
            if let Some(interface) = implements_clause(source, kind, mode, self.separator()) {
                declaration.push_str(&format!(" implements {}", interface));
            }
        }
        lines.push(format!("{} {{", declaration));

        let properties: Vec<_> = source
            .properties
            .iter()
            .filter(|p| p.visibility.is_public())
            .collect();
        for property in &properties {
            let mut line = format!("{pad}{INDENT}");
            if mode.includes_body() {
                line.push_str(if typed { "public " } else { "" });
                if property.is_static {
                    line.push_str("static ");
                }
            }
            if property.readonly && typed {
                line.push_str("readonly ");
            }
            line.push_str(&property.name);
            if typed {
                if let Some(ty) = printable_type(property.type_name.as_deref(), &[]) {
                    line.push_str(&format!(": {}", ty));
                }
            }
            if mode.includes_body() {
                if let Some(value) = property.value.as_deref().filter(|v| !v.is_empty()) {
                    line.push_str(&format!(" = {}", value));
                }
            }
            line.push(';');
            lines.push(line);
        }

        let methods: Vec<_> = generated_methods(source, mode)
            .into_iter()
            .filter(|m| mode.includes_body() || m.name != "constructor")
            .collect();
        if !properties.is_empty() && !methods.is_empty() {
            lines.blank();
        }
        for (i, method) in methods.iter().enumerate() {
            if i > 0 && mode.includes_body() {
                lines.blank();
            }
            let signature = signature(method, mode, typed);
            if mode.includes_body() {
                lines.push(format!("{pad}{INDENT}{} {{", signature));
                lines.push(format!(
                    "{pad}{INDENT}{INDENT}throw new Error(\"Not implemented\");"
                ));
                lines.push(format!("{pad}{INDENT}}}"));
            } else {
                lines.push(format!("{pad}{INDENT}{};", signature));
            }
        }

        lines.push(format!("{pad}}}"));
        if namespace.is_some() {
            lines.push("}");
        }
        lines.into_edits()
    }
}

fn signature(method: &MethodToken, mode: GenerationMode, typed: bool) -> String {
    let mut out = String::new();
    if mode.includes_body() {
        if typed {
            out.push_str("public ");
        }
        if method.is_static {
            out.push_str("static ");
        }
    }
    let arguments: Vec<String> = method
        .arguments
        .iter()
        .map(|arg| argument(arg, mode, typed))
        .collect();
    out.push_str(&format!("{}({})", method.name, arguments.join(", ")));
    if typed {
        if let Some(ty) = printable_type(method.type_name.as_deref(), &[]) {
            out.push_str(&format!(": {}", ty));
        }
    }
    out
}

/// Interface signatures cannot carry initializers; a defaulted argument
/// becomes optional there instead.
fn argument(arg: &VariableToken, mode: GenerationMode, typed: bool) -> String {
    let value = arg.value.as_deref().filter(|v| !v.is_empty());
    let mut out = if typed {
        arg.name.clone()
    } else {
        arg.name.trim_end_matches('?').to_string()
    };
    if typed && value.is_some() && !mode.includes_body() && !out.ends_with('?') {
        out.push('?');
    }
    if typed {
        if let Some(ty) = printable_type(arg.type_name.as_deref(), &[]) {
            out.push_str(&format!(": {}", ty));
        }
    }
    if let Some(value) = value.filter(|_| mode.includes_body()) {
        out.push_str(&format!(" = {}", value));
    }
    out
}

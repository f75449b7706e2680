//! Java entity generator.

use super::{
    generated_methods, implements_clause, printable_type, source_import, split_target,
    EntityGenerator, GenerateOptions, GenerationMode, Lines, TextEdit, INDENT,
};
use crate::analysis::separators;
use crate::tokens::{EntityKind, EntityToken, MethodToken};

pub struct JavaGenerator;

impl EntityGenerator for JavaGenerator {
    fn language(&self) -> &'static str {
        "java"
    }

    fn separator(&self) -> &'static str {
        separators::JAVA
    }

    fn document_name(&self, target: &str, _mode: GenerationMode, _extension: Option<&str>) -> String {
        let (name, _) = split_target(target, self.separator(), None);
        format!("{}.java", name)
    }

    fn generate(
        &self,
        target: &str,
        source: &EntityToken,
        kind: EntityKind,
        mode: GenerationMode,
        options: &GenerateOptions,
    ) -> Vec<TextEdit> {
        let (name, package) =
            split_target(target, self.separator(), options.namespace.as_deref());
        let mut lines = Lines::default();

        if let Some(package) = &package {
            lines.push(format!("package {};", package));
            lines.blank();
        }
        if mode.includes_body() {
            if let Some(import) =
                source_import(source, self.separator(), package.as_deref(), options)
            {
                lines.push(format!("import {};", import));
                lines.blank();
            }
        }

        let mut declaration = format!("{} ", source.visibility);
        if mode.includes_body() {
            if source.is_abstract {
                declaration.push_str("abstract ");
            }
            if source.readonly {
                declaration.push_str("final ");
            }
            declaration.push_str("class ");
        } else {
            declaration.push_str("interface ");
        }
        declaration.push_str(&name);
        if let Some(interface) = implements_clause(source, kind, mode, self.separator()) {
            declaration.push_str(&format!(" implements {}", interface));
        }
        lines.push(format!("{} {{", declaration));

        let constants: Vec<_> = source
            .constants
            .iter()
            .filter(|c| c.visibility.is_public())
            .collect();
        for constant in &constants {
            let ty = constant.type_name.as_deref().unwrap_or("Object");
            let value = constant.value.as_deref().unwrap_or("null");
            lines.push(format!(
                "{INDENT}public static final {} {} = {};",
                ty, constant.name, value
            ));
        }

        // Constructors carry no return type and cannot be generated under
        // another class name.
        let methods: Vec<_> = generated_methods(source, mode)
            .into_iter()
            .filter(|m| m.type_name.is_some())
            .collect();
        if !constants.is_empty() && !methods.is_empty() {
            lines.blank();
        }
        for (i, method) in methods.iter().enumerate() {
            if i > 0 && mode.includes_body() {
                lines.blank();
            }
            let signature = signature(method, mode);
            if mode.includes_body() {
                lines.push(format!("{INDENT}{} {{", signature));
                lines.push(format!(
                    "{INDENT}{INDENT}throw new java.lang.IllegalStateException(\"Not implemented\");"
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
    if mode.includes_body() {
        if method.is_static {
            out.push_str("static ");
        }
        if method.readonly && !method.is_abstract {
            out.push_str("final ");
        }
    }
    if let Some(ty) = printable_type(method.type_name.as_deref(), &[]) {
        out.push_str(ty);
        out.push(' ');
    }
    let arguments: Vec<String> = method
        .arguments
        .iter()
        .map(|arg| match arg.type_name.as_deref() {
            Some(ty) => format!("{} {}", ty, arg.name),
            None => arg.name.clone(),
        })
        .collect();
    out.push_str(&format!("{}({})", method.name, arguments.join(", ")));
    out
}

//! Output formatting for outlines.
//!
//! Supports two output formats:
//! - Pretty: colored, indented outline trees for humans
//! - JSON: the token trees themselves, for programmatic consumption

use std::io::Write;

use colored::*;
use serde::Serialize;

use crate::analysis::FileOutline;
use crate::outline::{Collapse, NodeKind, OutlineNode, Projector};
use crate::tokens::{TokenTree, Visibility};

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub path: &'a str,
    pub files_outlined: usize,
    pub files_failed: usize,
    pub files: &'a [FileOutline],
}

impl<'a> JsonReport<'a> {
    pub fn new(path: &'a str, files: &'a [FileOutline]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            path,
            files_outlined: files.iter().filter(|f| f.is_ok()).count(),
            files_failed: files.iter().filter(|f| !f.is_ok()).count(),
            files,
        }
    }
}

pub fn write_json<W: Write>(out: &mut W, path: &str, files: &[FileOutline]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &JsonReport::new(path, files))?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

pub fn write_pretty<W: Write>(
    out: &mut W,
    path: &str,
    files: &[FileOutline],
    projector: &Projector,
) -> anyhow::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "outliner".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "Outlining: ".dimmed(), path)?;
    writeln!(out)?;

    for file in files {
        match &file.error {
            Some(error) => {
                writeln!(
                    out,
                    "  {} {} {}",
                    "✗".red(),
                    file.path.blue(),
                    format!("({})", file.language).dimmed()
                )?;
                writeln!(out, "      {}", error.red())?;
            }
            None => {
                writeln!(
                    out,
                    "  {} {}",
                    file.path.blue().bold(),
                    format!("({})", file.language).dimmed()
                )?;
                write_tree(out, &file.tree, projector)?;
            }
        }
        writeln!(out)?;
    }

    write_summary(out, files)?;
    Ok(())
}

/// Every node, fully expanded.
pub fn write_tree<W: Write>(
    out: &mut W,
    tree: &TokenTree,
    projector: &Projector,
) -> anyhow::Result<()> {
    if tree.is_empty() {
        writeln!(out, "    {}", "(empty)".dimmed())?;
        return Ok(());
    }
    for node in projector.project_root(tree) {
        write_node(out, tree, projector, &node, 1)?;
    }
    Ok(())
}

fn write_node<W: Write>(
    out: &mut W,
    tree: &TokenTree,
    projector: &Projector,
    node: &OutlineNode,
    depth: usize,
) -> anyhow::Result<()> {
    let indent = "  ".repeat(depth + 1);
    let marker = match node.collapse {
        Collapse::None => " ",
        Collapse::Collapsed => "▸",
        Collapse::Expanded => "▾",
    };
    let label = colored_label(node);
    match node.position {
        Some(position) => writeln!(
            out,
            "{}{} {}  {}",
            indent,
            marker,
            label,
            position.to_string().dimmed()
        )?,
        None => writeln!(out, "{}{} {}", indent, marker, label)?,
    }

    for child in projector.project_children(tree, node) {
        write_node(out, tree, projector, &child, depth + 1)?;
    }
    Ok(())
}

fn colored_label(node: &OutlineNode) -> ColoredString {
    let label = node.label.as_str();
    let styled = match node.kind {
        NodeKind::Section | NodeKind::Strict => label.bold(),
        NodeKind::Interface | NodeKind::Trait | NodeKind::Class => label.cyan().bold(),
        NodeKind::Media | NodeKind::Selector => label.magenta(),
        NodeKind::Object | NodeKind::Array => label.blue(),
        _ => match node.visibility {
            Visibility::Public => label.normal(),
            Visibility::Protected => label.yellow(),
            Visibility::Private => label.red(),
        },
    };
    if node.is_static {
        styled.italic()
    } else {
        styled
    }
}

fn write_summary<W: Write>(out: &mut W, files: &[FileOutline]) -> anyhow::Result<()> {
    let failed = files.iter().filter(|f| !f.is_ok()).count();
    let entities: usize = files.iter().map(|f| f.tree.entity_count()).sum();
    let plural = if files.len() != 1 { "s" } else { "" };

    write!(
        out,
        "  {} file{}, {} entities",
        files.len(),
        plural,
        entities
    )?;
    if failed > 0 {
        write!(out, "  {}", format!("{} failed", failed).red())?;
    } else {
        write!(out, "  {}", "OK".green())?;
    }
    writeln!(out)?;
    Ok(())
}

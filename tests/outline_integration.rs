//! Integration tests for outline extraction and projection.
//!
//! These tests run the analyzers against the testdata/project fixtures
//! and check the token trees and the display trees built from them.

use std::path::{Path, PathBuf};

use outliner::outline::{Collapse, NodeKind};
use outliner::tokens::Visibility;
use outliner::{AnalysisContext, AnalyzerRegistry, Config, Document, OutlineError, Projector};
use pretty_assertions::assert_eq;

fn project() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/project")
}

fn fixture(name: &str, language: &str) -> Document {
    Document::from_path(project().join("src").join(name), language).unwrap()
}

// =============================================================================
// Analyzer scenarios
// =============================================================================

#[test]
fn test_namespaced_php_class() {
    let source = "<?php\nnamespace App;\nclass Foo {\n    public const BAR = 1;\n    public function baz(int $x = 5): string {}\n}\n";
    let tree = AnalyzerRegistry::new()
        .analyze(&Document::new("php", "Foo.php", source), &Config::default())
        .unwrap();

    assert_eq!(tree.classes.len(), 1);
    let foo = &tree.classes[0];
    assert_eq!(foo.name, "App\\Foo");
    assert_eq!(foo.constants[0].name, "BAR");
    assert_eq!(foo.constants[0].value.as_deref(), Some("1"));

    let baz = &foo.methods[0];
    assert_eq!(baz.name, "baz");
    assert_eq!(baz.type_name.as_deref(), Some("string"));
    assert_eq!(baz.arguments.len(), 1);
    assert_eq!(baz.arguments[0].name, "x");
    assert_eq!(baz.arguments[0].type_name.as_deref(), Some("int"));
    assert_eq!(baz.arguments[0].value.as_deref(), Some("5"));
}

#[test]
fn test_rules_file_positions() {
    let tree = AnalyzerRegistry::new()
        .analyze(&fixture("home.rules", "openhab"), &Config::default())
        .unwrap();

    let line = |p: Option<outliner::tokens::Position>| p.map(|p| p.start.line);
    assert_eq!(tree.imports.len(), 1);
    assert_eq!(tree.imports[0].name, "foo.Bar");
    assert_eq!(line(tree.imports[0].position), Some(0));
    assert_eq!(tree.variables[0].name, "x");
    assert_eq!(line(tree.variables[0].position), Some(2));
    assert_eq!(tree.rules[0].name, "Example");
    assert_eq!(line(tree.rules[0].position), Some(4));
}

#[test]
fn test_stylesheet_nodes_and_media() {
    let tree = AnalyzerRegistry::new()
        .analyze(&fixture("site.css", "css"), &Config::default())
        .unwrap();

    let a = &tree.nodes[".a"];
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].name, "color");
    assert_eq!(a[0].value.as_deref(), Some("red"));

    let media = &tree.media["(min-width: 10px)"];
    assert_eq!(media[".b"][0].name, "color");
    assert_eq!(media[".b"][0].value.as_deref(), Some("blue"));
}

#[test]
fn test_same_family_dispatch_by_extension() {
    let registry = AnalyzerRegistry::new();
    let config = Config::default();

    let rules = registry.analyze(&fixture("home.rules", "openhab"), &config).unwrap();
    assert!(rules.items.is_empty());
    assert!(!rules.rules.is_empty());

    let items = registry.analyze(&fixture("home.items", "openhab"), &config).unwrap();
    assert!(items.rules.is_empty());
    let names: Vec<_> = items.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["gHome", "Hall_Light"]);
}

#[test]
fn test_unsupported_language() {
    let registry = AnalyzerRegistry::new();
    let doc = Document::new("cobol", "PAYROLL.cbl", "IDENTIFICATION DIVISION.");
    assert!(!registry.has_support(&doc));
    assert!(matches!(
        registry.analyze(&doc, &Config::default()),
        Err(OutlineError::UnsupportedLanguage(ref id)) if id == "cobol"
    ));
}

#[test]
fn test_analysis_is_idempotent() {
    let registry = AnalyzerRegistry::new();
    let config = Config::default();
    for (file, language) in [
        ("Cart.php", "php"),
        ("Inventory.java", "java"),
        ("store.ts", "typescript"),
        ("shop.py", "python"),
        ("theme.less", "less"),
        ("Main.mod", "rapid"),
    ] {
        let doc = fixture(file, language);
        let first = registry.analyze(&doc, &config).unwrap();
        let second = registry.analyze(&doc, &config).unwrap();
        assert_eq!(first, second, "{file}");
    }
}

#[test]
fn test_namespace_policy_from_config() {
    let config = Config::parse_str("languages:\n  php:\n    namespace_position: suffix\n").unwrap();
    let tree = AnalyzerRegistry::new()
        .analyze(&fixture("Cart.php", "php"), &config)
        .unwrap();
    assert_eq!(tree.classes[0].name, "Cart: App\\Shop");
    assert_eq!(tree.interfaces[0].name, "Priced: App\\Shop");

    let config = Config::parse_str("languages:\n  php:\n    namespace_position: none\n").unwrap();
    let tree = AnalyzerRegistry::new()
        .analyze(&fixture("Cart.php", "php"), &config)
        .unwrap();
    assert_eq!(tree.classes[0].name, "Cart");
}

// =============================================================================
// Projection
// =============================================================================

#[test]
fn test_php_outline_projection() {
    let config = Config::default();
    let tree = AnalyzerRegistry::new()
        .analyze(&fixture("Cart.php", "php"), &config)
        .unwrap();
    let projector = Projector::new(&config);
    let roots = projector.project_root(&tree);

    let labels: Vec<_> = roots.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Strict: Yes", "Imports", "App\\Shop\\Priced", "®App\\Shop\\Cart"]
    );
    assert_eq!(roots[1].collapse, Collapse::Collapsed);
    assert_eq!(roots[2].collapse, Collapse::Expanded);
    assert_eq!(roots[3].collapse, Collapse::Collapsed);
    assert_eq!(
        roots.iter().filter(|n| n.collapse == Collapse::Expanded).count(),
        1
    );

    let cart = projector.project_children(&tree, &roots[3]);
    let constants: Vec<_> = cart
        .iter()
        .filter(|n| n.kind == NodeKind::Constant)
        .map(|n| n.visibility)
        .collect();
    assert_eq!(constants, vec![Visibility::Private, Visibility::Public]);

    let methods: Vec<_> = cart
        .iter()
        .filter(|n| n.kind == NodeKind::Method)
        .map(|n| n.label.split('(').next().unwrap_or_default())
        .collect();
    assert_eq!(methods, vec!["log", "blank", "__construct", "add", "total"]);
    assert!(cart.iter().all(|n| n.is_leaf() && n.position.is_some()));
}

#[test]
fn test_stylesheet_projection() {
    let config = Config::default();
    let tree = AnalyzerRegistry::new()
        .analyze(&fixture("site.css", "css"), &config)
        .unwrap();
    let projector = Projector::new(&config);
    let roots = projector.project_root(&tree);

    assert_eq!(roots[0].label, "@media (min-width: 10px)");
    assert_eq!(roots[0].kind, NodeKind::Media);
    assert_eq!(roots[0].collapse, Collapse::Expanded);
    assert_eq!(roots[1].label, ".a");
    assert_eq!(roots[1].kind, NodeKind::Selector);

    let media = projector.project_children(&tree, &roots[0]);
    assert_eq!(media[0].label, ".b");
    let declarations = projector.project_children(&tree, &media[0]);
    assert_eq!(declarations[0].label, "color: blue");
    assert_eq!(declarations[0].kind, NodeKind::Declaration);
}

#[test]
fn test_json_projection() {
    let config = Config::default();
    let tree = AnalyzerRegistry::new()
        .analyze(&fixture("package.json", "json"), &config)
        .unwrap();
    let projector = Projector::new(&config);
    let roots = projector.project_root(&tree);

    let labels: Vec<_> = roots.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["name: \"shop\"", "version: \"1.2.0\"", "scripts", "files"]
    );
    assert!(roots[0].is_leaf());
    assert_eq!(roots[0].position.map(|p| (p.start.line, p.start.column)), Some((1, 10)));
    assert_eq!(roots[2].kind, NodeKind::Object);
    assert_eq!(roots[2].collapse, Collapse::Expanded);
    assert_eq!(roots[3].kind, NodeKind::Array);
    assert_eq!(roots[3].collapse, Collapse::Collapsed);

    let scripts = projector.project_children(&tree, &roots[2]);
    let labels: Vec<_> = scripts.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, vec!["build: \"tsc -p .\"", "test: \"jest\""]);

    let files = projector.project_children(&tree, &roots[3]);
    let labels: Vec<_> = files.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, vec!["dist", "README.md"]);
    assert!(files.iter().all(|n| n.kind == NodeKind::Value && n.position.is_some()));
}

#[test]
fn test_projection_is_stable() {
    let config = Config::default();
    let tree = AnalyzerRegistry::new()
        .analyze(&fixture("Inventory.java", "java"), &config)
        .unwrap();
    let projector = Projector::new(&config);
    assert_eq!(projector.project_root(&tree), projector.project_root(&tree));
}

// =============================================================================
// Batch analysis
// =============================================================================

#[test]
fn test_collect_files_skips_hidden_and_excluded() {
    let config = Config {
        excluded_paths: vec!["**/vendor/**".to_string()],
        ..Default::default()
    };
    let ctx = AnalysisContext::new(project(), config);
    let files = ctx.collect_files(&project());
    let names: Vec<_> = files
        .iter()
        .filter_map(|p| p.file_name())
        .filter_map(|n| n.to_str())
        .collect();

    assert!(names.contains(&"Cart.php"));
    assert!(names.contains(&"home.rules"));
    assert!(!names.contains(&"Skipped.php"));
    assert!(!names.contains(&"Hidden.php"));
    assert!(!names.contains(&"notes.txt"));
}

#[test]
fn test_outline_files_reports_failures_per_file() {
    let ctx = AnalysisContext::new(project(), Config::default());
    let files = ctx.collect_files(Path::new("src"));
    let outlines = ctx.outline_files(&files);

    assert_eq!(outlines.len(), files.len());
    let broken = outlines
        .iter()
        .find(|o| o.path.ends_with("Broken.java"))
        .unwrap();
    assert!(!broken.is_ok());
    assert!(broken.tree.is_empty());

    let cart = outlines.iter().find(|o| o.path.ends_with("Cart.php")).unwrap();
    assert!(cart.is_ok());
    assert_eq!(cart.language, "php");
    assert_eq!(cart.tree.entity_count(), 2);

    let mut sorted = outlines.clone();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(
        outlines.iter().map(|o| &o.path).collect::<Vec<_>>(),
        sorted.iter().map(|o| &o.path).collect::<Vec<_>>()
    );
}

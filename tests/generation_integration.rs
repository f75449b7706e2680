//! Integration tests for entity generation through the orchestrator.
//!
//! Each test opens a testdata/project fixture, answers the prompts with a
//! scripted prompter and inspects the file written into a temporary
//! workspace.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use outliner::{Config, Document, GenerationMode, Orchestrator, OutlineError, Prompter};
use tempfile::TempDir;

/// Answers prompts in order; `None` cancels.
struct Answers(VecDeque<Option<String>>);

impl Answers {
    fn new(answers: &[Option<&str>]) -> Self {
        Self(answers.iter().map(|a| a.map(String::from)).collect())
    }
}

impl Prompter for Answers {
    fn input(&mut self, _prompt: &str, default: Option<&str>) -> Option<String> {
        self.0
            .pop_front()
            .unwrap_or_else(|| default.map(String::from))
    }

    fn pick(&mut self, _placeholder: &str, options: &[String]) -> Option<String> {
        self.0.pop_front().unwrap_or_else(|| options.first().cloned())
    }
}

fn fixture(name: &str, language: &str) -> Document {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("testdata/project/src")
        .join(name);
    Document::from_path(path, language).unwrap()
}

fn orchestrator(workspace: &TempDir, document: Document) -> Orchestrator {
    let mut orchestrator =
        Orchestrator::new(Config::default(), Some(workspace.path().to_path_buf()));
    assert!(orchestrator.focus(document));
    orchestrator
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

#[test]
fn test_extract_php_interface() {
    let workspace = TempDir::new().unwrap();
    let orchestrator = orchestrator(&workspace, fixture("Cart.php", "php"));

    let mut answers = Answers::new(&[Some("CartContract : App\\Contracts"), Some("src/Contracts")]);
    let path = orchestrator
        .generate(GenerationMode::Interface, Some("®App\\Shop\\Cart"), &mut answers)
        .unwrap()
        .unwrap();

    assert_eq!(
        path,
        workspace.path().join("src/Contracts/CartContractInterface.php")
    );
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("<?php\ndeclare(strict_types=1);\n"));
    assert!(text.contains("namespace App\\Contracts;\n"));
    assert!(text.contains("interface CartContract\n{"));
    assert!(text.contains("const CURRENCY = \"EUR\";"));
    assert!(!text.contains("LIMIT"));
    assert!(text.contains("    public function add(Product $product, int $quantity = 1): void;\n"));
    assert!(text.contains("    public function total(): float;\n"));

    // Static, magic and non-public methods stay out of interfaces.
    assert!(!text.contains("blank"));
    assert!(!text.contains("__construct"));
    assert!(!text.contains("function log"));
    assert!(!text.contains("BadMethodCallException"));
}

#[test]
fn test_implement_php_interface() {
    let workspace = TempDir::new().unwrap();
    let orchestrator = orchestrator(&workspace, fixture("Cart.php", "php"));

    let mut answers = Answers::new(&[Some("App\\Billing\\FixedPrice"), Some("")]);
    let path = orchestrator
        .generate(GenerationMode::Implementation, Some("App\\Shop\\Priced"), &mut answers)
        .unwrap()
        .unwrap();

    assert_eq!(path, workspace.path().join("FixedPrice.php"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("namespace App\\Billing;\n"));
    assert!(text.contains("use App\\Shop\\Priced;\n"));
    assert!(text.contains("class FixedPrice implements Priced\n"));
    assert!(text.contains("    public function total(): float\n"));
    assert_eq!(text.matches("BadMethodCallException").count(), 1);
}

#[test]
fn test_java_implementation_keeps_public_methods() {
    let workspace = TempDir::new().unwrap();
    let orchestrator = orchestrator(&workspace, fixture("Inventory.java", "java"));

    let mut answers = Answers::new(&[Some("Warehouse"), Some("gen")]);
    let path = orchestrator
        .generate(GenerationMode::Implementation, None, &mut answers)
        .unwrap()
        .unwrap();

    assert_eq!(path, workspace.path().join("gen/Warehouse.java"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("int count(String sku)"));
    assert!(text.contains("void restock(String sku, int amount)"));
    assert!(!text.contains("skus"));
    assert!(!text.contains("Inventory("));
    assert_eq!(text.matches("IllegalStateException").count(), 2);
}

#[test]
fn test_typescript_to_javascript() {
    let workspace = TempDir::new().unwrap();
    let orchestrator = orchestrator(&workspace, fixture("store.ts", "typescript"));

    let mut answers = Answers::new(&[Some("Store"), Some("lib"), Some("js")]);
    let path = orchestrator
        .generate(GenerationMode::Implementation, None, &mut answers)
        .unwrap()
        .unwrap();

    assert_eq!(path, workspace.path().join("lib/Store.js"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("\"use strict\";\n"));
    assert!(text.contains("export class Store {"));
    assert!(text.contains("add(item, quantity = 1) {"));
    assert!(text.contains("static open() {"));
    assert!(!text.contains(": number"));
    assert!(!text.contains("public "));
}

#[test]
fn test_destination_conflict_leaves_file_untouched() {
    let workspace = TempDir::new().unwrap();
    let orchestrator = orchestrator(&workspace, fixture("Inventory.java", "java"));
    let existing = workspace.path().join("Inventory.java");
    fs::write(&existing, "// hand written\n").unwrap();

    let mut answers = Answers::new(&[Some("Inventory"), Some("")]);
    let err = orchestrator
        .generate(GenerationMode::Interface, None, &mut answers)
        .unwrap_err();

    assert!(matches!(err, OutlineError::DestinationConflict(ref p) if p == &existing));
    assert_eq!(fs::read_to_string(&existing).unwrap(), "// hand written\n");
}

#[test]
fn test_cancel_writes_nothing() {
    let workspace = TempDir::new().unwrap();
    let orchestrator = orchestrator(&workspace, fixture("Inventory.java", "java"));

    let mut answers = Answers::new(&[Some("Stock"), None]);
    let result = orchestrator
        .generate(GenerationMode::Interface, None, &mut answers)
        .unwrap();

    assert!(result.is_none());
    assert!(files_in(workspace.path()).is_empty());
}

#[test]
fn test_generation_preconditions() {
    let mut answers = Answers::new(&[]);

    let mut detached = Orchestrator::new(Config::default(), None);
    detached.focus(fixture("Cart.php", "php"));
    assert!(matches!(
        detached.generate(GenerationMode::Interface, None, &mut answers),
        Err(OutlineError::NoWorkspace)
    ));

    let workspace = TempDir::new().unwrap();
    let python = orchestrator(&workspace, fixture("shop.py", "python"));
    assert!(matches!(
        python.generate(GenerationMode::Interface, None, &mut answers),
        Err(OutlineError::GenerationUnsupported(_))
    ));

    let php = orchestrator(&workspace, fixture("Cart.php", "php"));
    assert!(matches!(
        php.generate(GenerationMode::Interface, Some("Missing"), &mut answers),
        Err(OutlineError::UnknownEntity(_))
    ));
    assert!(files_in(workspace.path()).is_empty());
}

//! Outline orchestration for one active document.
//!
//! The host forwards focus, save and visibility events; each runs to
//! completion before the next. A pinned document ignores focus and
//! visibility changes but still refreshes when saved.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::analysis::AnalyzerRegistry;
use crate::config::Config;
use crate::document::Document;
use crate::error::{OutlineError, Result};
use crate::generate::{render, GenerateOptions, GenerationMode, Generator};
use crate::outline::{OutlineNode, Projector};
use crate::tokens::{EntityKind, EntityToken, TokenTree};

/// User prompts needed by entity generation.
///
/// `None` means the user cancelled.
pub trait Prompter {
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Option<String>;

    fn pick(&mut self, placeholder: &str, options: &[String]) -> Option<String>;

    /// Whether `pick` can ask the user at all.
    fn interactive(&self) -> bool {
        true
    }
}

pub struct Orchestrator {
    config: Config,
    registry: AnalyzerRegistry,
    projector: Projector,
    workspace: Option<PathBuf>,
    active: Option<Document>,
    tree: TokenTree,
    pinned: bool,
}

impl Orchestrator {
    pub fn new(config: Config, workspace: Option<PathBuf>) -> Self {
        Self {
            registry: AnalyzerRegistry::from_config(&config),
            projector: Projector::new(&config),
            config,
            workspace,
            active: None,
            tree: TokenTree::default(),
            pinned: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.active.as_ref()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Freeze or release the active document.
    pub fn pin(&mut self, pinned: bool) {
        self.pinned = pinned && self.active.is_some();
    }

    /// The active editor changed. Returns whether the outline was refreshed.
    pub fn focus(&mut self, document: Document) -> bool {
        if self.pinned {
            debug!(file = %document.file_name, "pinned, ignoring focus");
            return false;
        }
        self.activate(document)
    }

    /// A document was saved. `has_errors` reports error diagnostics.
    pub fn save(&mut self, document: Document, has_errors: bool) -> bool {
        if has_errors && !self.config.update_on_error {
            debug!(file = %document.file_name, "save with errors, not refreshing");
            return false;
        }
        if self.pinned {
            let is_pinned = self
                .active
                .as_ref()
                .map(|active| active.same_file(&document))
                .unwrap_or(false);
            if !is_pinned {
                return false;
            }
        }
        self.activate(document)
    }

    /// The set of visible editors changed; the first one becomes active.
    pub fn visible(&mut self, documents: &[Document]) -> bool {
        match documents.first() {
            Some(first) if !self.pinned => self.activate(first.clone()),
            _ => false,
        }
    }

    fn activate(&mut self, document: Document) -> bool {
        let refreshed = !document.dirty;
        if refreshed {
            self.tree = self.registry.token_tree(&document, &self.config);
        }
        self.active = Some(document);
        refreshed
    }

    pub fn token_tree(&self) -> &TokenTree {
        &self.tree
    }

    pub fn root_nodes(&self) -> Vec<OutlineNode> {
        self.projector.project_root(&self.tree)
    }

    pub fn children(&self, node: &OutlineNode) -> Vec<OutlineNode> {
        self.projector.project_children(&self.tree, node)
    }

    /// Generate a new file from an entity of the active outline.
    ///
    /// `selection` is an entity label as displayed (markers allowed).
    /// Returns the created path, or `None` when a prompt was cancelled.
    pub fn generate(
        &self,
        mode: GenerationMode,
        selection: Option<&str>,
        prompter: &mut dyn Prompter,
    ) -> Result<Option<PathBuf>> {
        let workspace = self.workspace.as_deref().ok_or(OutlineError::NoWorkspace)?;
        let document = self
            .active
            .as_ref()
            .ok_or_else(|| OutlineError::NoEntities("no active document".to_string()))?;
        let generator = Generator::for_language(&document.language_id)?;
        let generator = generator.inner();

        let Some((kind, entity)) = self.select_entity(document, selection, prompter)? else {
            return Ok(None);
        };

        let default_name = entity.simple_name(generator.separator()).to_string();
        let Some(target) = prompter.input(
            "Name of the entity to generate (namespaced: `Name : Namespace`)",
            Some(&default_name),
        ) else {
            info!("entity generation cancelled");
            return Ok(None);
        };
        let target = target.trim().to_string();
        if crate::generate::split_target(&target, generator.separator(), None)
            .0
            .is_empty()
        {
            return Err(OutlineError::EmptyName);
        }

        let Some(directory) = prompter.input(
            "Directory in which to save the generated file (relative to the workspace root)",
            None,
        ) else {
            info!("entity generation cancelled");
            return Ok(None);
        };

        let extensions = generator.extensions(mode);
        let extension = if extensions.is_empty() {
            None
        } else {
            let options: Vec<String> = extensions.iter().map(|e| e.to_string()).collect();
            match prompter.pick("Choose file extension", &options) {
                Some(ext) => Some(ext),
                None => {
                    info!("entity generation cancelled");
                    return Ok(None);
                }
            }
        };

        let dir = workspace.join(directory.trim().trim_start_matches(['/', '\\']));
        let path = dir.join(generator.document_name(&target, mode, extension.as_deref()));

        let settings = self.config.language(&document.language_id);
        let options = GenerateOptions {
            strict: self.tree.strict == Some(true),
            namespace: None,
            source_namespace: self.tree.namespace.clone(),
            extension,
            namespace_type: settings.namespace_type().to_string(),
        };
        let text = render(&generator.generate(&target, entity, kind, mode, &options));

        fs::create_dir_all(&dir)?;
        write_new(&path, &text)?;
        info!(path = %path.display(), "generated entity");
        Ok(Some(path))
    }

    fn select_entity<'t>(
        &'t self,
        document: &Document,
        selection: Option<&str>,
        prompter: &mut dyn Prompter,
    ) -> Result<Option<(EntityKind, &'t EntityToken)>> {
        let entities: Vec<(EntityKind, &EntityToken)> = self.tree.entities().collect();
        if entities.is_empty() {
            return Err(OutlineError::NoEntities(document.file_name.clone()));
        }

        if let Some(label) = selection {
            let name = self.projector.markers().strip(label.trim());
            return entities
                .into_iter()
                .find(|(_, e)| e.name == name)
                .map(Some)
                .ok_or_else(|| OutlineError::UnknownEntity(name.to_string()));
        }

        if entities.len() == 1 {
            return Ok(entities.into_iter().next());
        }

        let names: Vec<String> = entities.iter().map(|(_, e)| e.name.clone()).collect();
        if !prompter.interactive() {
            return Err(OutlineError::AmbiguousSelection(names));
        }
        let Some(choice) = prompter.pick("Select the source entity", &names) else {
            return Ok(None);
        };
        Ok(entities.into_iter().find(|(_, e)| e.name == choice))
    }
}

/// Create `path` exclusively and write `text`; nothing is left behind on
/// failure.
fn write_new(path: &Path, text: &str) -> Result<()> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            return Err(OutlineError::DestinationConflict(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    if let Err(err) = file.write_all(text.as_bytes()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    const FOO: &str = "<?php\nnamespace App;\nclass Foo {\n    public function run(int $x = 5): string {}\n    public static function make() {}\n}\n";

    struct Scripted {
        answers: VecDeque<Option<String>>,
    }

    impl Scripted {
        fn new(answers: &[Option<&str>]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.map(String::from)).collect(),
            }
        }
    }

    impl Prompter for Scripted {
        fn input(&mut self, _prompt: &str, default: Option<&str>) -> Option<String> {
            self.answers
                .pop_front()
                .unwrap_or_else(|| default.map(String::from))
        }

        fn pick(&mut self, _placeholder: &str, options: &[String]) -> Option<String> {
            self.answers
                .pop_front()
                .unwrap_or_else(|| options.first().cloned())
        }
    }

    fn php(text: &str) -> Document {
        Document::new("php", "src/Foo.php", text)
    }

    #[test]
    fn test_focus_and_pin() {
        let mut orchestrator = Orchestrator::new(Config::default(), None);
        assert!(orchestrator.focus(php(FOO)));
        assert_eq!(orchestrator.token_tree().classes[0].name, "App\\Foo");

        orchestrator.pin(true);
        let other = Document::new("css", "a.css", ".a { color: red; }");
        assert!(!orchestrator.focus(other.clone()));
        assert!(!orchestrator.visible(&[other.clone()]));
        assert!(!orchestrator.save(other, false));
        assert_eq!(orchestrator.token_tree().classes.len(), 1);

        let edited = php("<?php\nclass Bar {}\n");
        assert!(orchestrator.save(edited, false));
        assert_eq!(orchestrator.token_tree().classes[0].name, "Bar");

        orchestrator.pin(false);
        assert!(orchestrator.focus(Document::new("css", "a.css", ".a { color: red; }")));
        assert!(orchestrator.token_tree().classes.is_empty());
    }

    #[test]
    fn test_dirty_and_erroneous_documents() {
        let config = Config {
            update_on_error: false,
            ..Default::default()
        };
        let mut orchestrator = Orchestrator::new(config, None);
        orchestrator.focus(php(FOO));

        let mut dirty = php("<?php class Other {}");
        dirty.dirty = true;
        assert!(!orchestrator.focus(dirty));
        assert!(!orchestrator.save(php("<?php class Other {}"), true));
        assert_eq!(orchestrator.token_tree().classes[0].name, "App\\Foo");

        // A parse failure keeps the previous outline.
        assert!(orchestrator.focus(php("<?php class {")));
        assert_eq!(orchestrator.token_tree().classes[0].name, "App\\Foo");
    }

    #[test]
    fn test_generate_requires_workspace() {
        let mut orchestrator = Orchestrator::new(Config::default(), None);
        orchestrator.focus(php(FOO));
        let err = orchestrator
            .generate(GenerationMode::Interface, None, &mut Scripted::new(&[]))
            .unwrap_err();
        assert!(matches!(err, OutlineError::NoWorkspace));
    }

    #[test]
    fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = Orchestrator::new(Config::default(), Some(dir.path().into()));
        orchestrator.focus(php(FOO));

        let mut prompter = Scripted::new(&[Some("Runner : App\\Contracts"), Some("src/Contracts")]);
        let path = orchestrator
            .generate(GenerationMode::Interface, None, &mut prompter)
            .unwrap()
            .unwrap();

        assert!(path.ends_with("src/Contracts/RunnerInterface.php"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("namespace App\\Contracts;"));
        assert!(text.contains("interface Runner\n"));
        assert!(text.contains("public function run(int $x = 5): string;"));
        assert!(!text.contains("make"));
    }

    #[test]
    fn test_cancel_has_no_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = Orchestrator::new(Config::default(), Some(dir.path().into()));
        orchestrator.focus(php(FOO));

        let result = orchestrator
            .generate(GenerationMode::Implementation, None, &mut Scripted::new(&[Some("Foo2"), None]))
            .unwrap();
        assert!(result.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_destination_conflict_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Foo.php"), "original").unwrap();
        let mut orchestrator = Orchestrator::new(Config::default(), Some(dir.path().into()));
        orchestrator.focus(php(FOO));

        let err = orchestrator
            .generate(
                GenerationMode::Implementation,
                Some("App\\Foo"),
                &mut Scripted::new(&[Some("Foo"), Some("")]),
            )
            .unwrap_err();
        assert!(matches!(err, OutlineError::DestinationConflict(_)));
        assert_eq!(fs::read_to_string(dir.path().join("Foo.php")).unwrap(), "original");
    }

    #[test]
    fn test_entity_selection_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = Orchestrator::new(Config::default(), Some(dir.path().into()));

        orchestrator.focus(php("<?php\nclass A {}\nclass B {}\n"));
        let err = orchestrator
            .generate(GenerationMode::Interface, Some("C"), &mut Scripted::new(&[]))
            .unwrap_err();
        assert!(matches!(err, OutlineError::UnknownEntity(name) if name == "C"));

        orchestrator.focus(php("<?php\n$x = 1;\n"));
        let err = orchestrator
            .generate(GenerationMode::Interface, None, &mut Scripted::new(&[]))
            .unwrap_err();
        assert!(matches!(err, OutlineError::NoEntities(_)));

        orchestrator.focus(Document::new("python", "a.py", "class A:\n    pass\n"));
        let err = orchestrator
            .generate(GenerationMode::Interface, None, &mut Scripted::new(&[]))
            .unwrap_err();
        assert!(matches!(err, OutlineError::GenerationUnsupported(_)));
    }
}

//! Batch analysis of many files for the command line.
//!
//! Files are independent: each one is analyzed into its own tree, in
//! parallel, and cached by absolute path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::analysis::registry::{detect_language, AnalyzerRegistry};
use crate::config::Config;
use crate::document::Document;
use crate::tokens::TokenTree;

/// Outline of one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutline {
    /// Path relative to the context's base directory.
    pub path: String,
    pub language: String,
    pub tree: TokenTree,
    /// Why the file could not be outlined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutline {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub struct AnalysisContext {
    base_dir: PathBuf,
    config: Config,
    registry: AnalyzerRegistry,
    cache: RwLock<HashMap<PathBuf, FileOutline>>,
}

impl AnalysisContext {
    pub fn new<P: AsRef<Path>>(base_dir: P, config: Config) -> Self {
        let registry = AnalyzerRegistry::from_config(&config);
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            config,
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }

    /// Outline one file, reusing a cached result.
    pub fn outline_file<P: AsRef<Path>>(&self, path: P) -> FileOutline {
        let abs_path = self.absolute(path.as_ref());

        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&abs_path)
        {
            return cached.clone();
        }

        let outline = self.analyze_path(&abs_path);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(abs_path, outline.clone());
        outline
    }

    fn analyze_path(&self, abs_path: &Path) -> FileOutline {
        let path = self.relative(abs_path);
        let Some(language) = detect_language(abs_path, &self.config) else {
            return FileOutline {
                path,
                language: "unknown".to_string(),
                tree: TokenTree::default(),
                error: Some("unrecognized file type".to_string()),
            };
        };

        let result = Document::from_path(abs_path, &language)
            .and_then(|document| Ok(self.registry.analyze(&document, &self.config)?));
        match result {
            Ok(tree) => {
                debug!(file = %path, %language, entities = tree.entity_count(), "outlined");
                FileOutline {
                    path,
                    language,
                    tree,
                    error: None,
                }
            }
            Err(err) => {
                warn!(file = %path, error = %err, "failed to outline file");
                FileOutline {
                    path,
                    language,
                    tree: TokenTree::default(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// Outline several files in parallel, sorted by path.
    pub fn outline_files(&self, paths: &[PathBuf]) -> Vec<FileOutline> {
        let mut outlines: Vec<FileOutline> =
            paths.par_iter().map(|p| self.outline_file(p)).collect();
        outlines.sort_by(|a, b| a.path.cmp(&b.path));
        outlines
    }

    /// Files under `root` with a known language, minus excluded paths.
    pub fn collect_files(&self, root: &Path) -> Vec<PathBuf> {
        let root = self.absolute(root);
        if root.is_file() {
            return vec![root];
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_entry(|e| !is_hidden(e.path(), &root))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| !self.config.is_path_excluded(p))
            .filter(|p| detect_language(p, &self.config).is_some())
            .collect();
        files.sort();
        files
    }

    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Dot-directories (`.git`, `.idea`) below the scan root.
fn is_hidden(path: &Path, root: &Path) -> bool {
    path != root
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
}

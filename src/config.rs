//! Workspace configuration.
//!
//! Loaded from `outliner.yaml` (or `.outliner.yaml`) in the working
//! directory, falling back to the user configuration directory. Every field
//! has a default, so an empty file is a valid configuration.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::tokens::NamespacePosition;

/// Config file names searched in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["outliner.yaml", ".outliner.yaml"];

/// Provider names accepted in `allowed_providers`.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "php",
    "java",
    "javascript",
    "python",
    "cfamily",
    "openhab",
    "css",
    "less",
    "rapid",
    "json",
];

fn default_readonly_character() -> String {
    "\u{00AE}".to_string()
}

fn default_abstract_character() -> String {
    "\u{24B6}".to_string()
}

fn default_true() -> bool {
    true
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Marker prepended to readonly/final member labels.
    #[serde(default = "default_readonly_character")]
    pub readonly_character: String,
    /// Marker prepended to abstract member labels.
    #[serde(default = "default_abstract_character")]
    pub abstract_character: String,
    /// Refresh on save even when the host reports error diagnostics.
    #[serde(default = "default_true")]
    pub update_on_error: bool,
    /// Restrict the analyzers in use (empty means all).
    #[serde(default)]
    pub allowed_providers: Vec<String>,
    /// Per-language settings keyed by language id.
    #[serde(default)]
    pub languages: HashMap<String, LanguageSettings>,
    /// Extra glob → language id associations, checked before extensions.
    #[serde(default)]
    pub file_associations: Vec<FileAssociation>,
    /// Glob patterns skipped when outlining a directory.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            readonly_character: default_readonly_character(),
            abstract_character: default_abstract_character(),
            update_on_error: true,
            allowed_providers: Vec::new(),
            languages: HashMap::new(),
            file_associations: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }
}

/// Settings for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LanguageSettings {
    #[serde(default)]
    pub namespace_position: NamespacePosition,
    /// `namespace` or `module`, used when generating TypeScript.
    #[serde(default)]
    pub default_namespace_type: Option<String>,
}

impl LanguageSettings {
    pub fn namespace_type(&self) -> &str {
        self.default_namespace_type.as_deref().unwrap_or("namespace")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileAssociation {
    pub pattern: String,
    pub language: String,
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the rest of the crate cannot honour.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.readonly_character.is_empty() {
            anyhow::bail!("readonly_character must not be empty");
        }
        if self.abstract_character.is_empty() {
            anyhow::bail!("abstract_character must not be empty");
        }
        for provider in &self.allowed_providers {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                anyhow::bail!(
                    "unknown provider \"{}\" (known: {})",
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                );
            }
        }
        for assoc in &self.file_associations {
            globset::Glob::new(&assoc.pattern)?;
        }
        Ok(())
    }

    /// Settings for a language id; unknown languages get the defaults.
    pub fn language(&self, language_id: &str) -> LanguageSettings {
        self.languages
            .get(&language_id.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_provider_allowed(&self, provider: &str) -> bool {
        self.allowed_providers.is_empty() || self.allowed_providers.iter().any(|p| p == provider)
    }

    /// Language id from the configured file associations.
    pub fn associated_language(&self, path: &Path) -> Option<&str> {
        let path_str = path.to_string_lossy();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        self.file_associations.iter().find_map(|assoc| {
            let matcher = globset::Glob::new(&assoc.pattern).ok()?.compile_matcher();
            (matcher.is_match(&*path_str) || matcher.is_match(&*file_name))
                .then_some(assoc.language.as_str())
        })
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        self.excluded_paths.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|glob| glob.compile_matcher().is_match(&*path_str))
                .unwrap_or(false)
        })
    }
}

/// Locate a configuration file: working directory first, then the user
/// configuration directory.
pub fn discover(start: &Path) -> Option<PathBuf> {
    for name in DEFAULT_CONFIG_NAMES {
        let path = start.join(name);
        if path.is_file() {
            return Some(path);
        }
    }

    let dirs = directories::ProjectDirs::from("", "", "outliner")?;
    let path = dirs.config_dir().join("config.yaml");
    path.is_file().then_some(path)
}

/// Load the configuration from `explicit`, or discover one, or fall back to
/// the defaults.
pub fn load(explicit: Option<&Path>, start: &Path) -> anyhow::Result<Config> {
    match explicit {
        Some(path) => Config::parse_file(path),
        None => match discover(start) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using discovered config");
                Config::parse_file(path)
            }
            None => Ok(Config::default()),
        },
    }
}

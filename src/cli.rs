//! Command-line interface for outliner.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::analysis::{detect_language, AnalysisContext};
use crate::config::{self, Config};
use crate::document::Document;
use crate::error::OutlineError;
use crate::generate::GenerationMode;
use crate::orchestrator::{Orchestrator, Prompter};
use crate::outline::Projector;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Structural outlines of source files, and interface/implementation
/// scaffolding from the types they declare.
#[derive(Parser)]
#[command(name = "outliner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log analysis details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the outline of a file or of every supported file in a directory
    #[command(visible_alias = "show")]
    Outline(OutlineArgs),
    /// Generate an interface or implementation from an entity of a file
    Generate(GenerateArgs),
    /// Create a configuration file from a template
    Init(InitArgs),
}

#[derive(Args)]
pub struct OutlineArgs {
    /// File or directory to outline
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Source file declaring the entity
    pub file: PathBuf,

    /// What to generate
    #[arg(short, long, value_enum, default_value = "interface")]
    pub mode: GenerationMode,

    /// Source entity (required when the file declares several)
    #[arg(short, long)]
    pub entity: Option<String>,

    /// Name of the generated entity; `Name : Namespace` adds a namespace
    #[arg(short, long)]
    pub name: Option<String>,

    /// Directory for the generated file, relative to the workspace
    #[arg(short, long, default_value = "")]
    pub dir: String,

    /// File extension, for languages offering several
    #[arg(long)]
    pub ext: Option<String>,

    /// Workspace root (default: current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Override the language detected from the file name
    #[arg(short, long)]
    pub language: Option<String>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "outliner.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "default")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

static TEMPLATES: &[Template] = &[
    Template {
        name: "default",
        description: "Every setting with its default, documented",
        content: include_str!("templates/default.yaml"),
    },
    Template {
        name: "minimal",
        description: "Only the commonly changed settings",
        content: include_str!("templates/minimal.yaml"),
    },
];

fn load_config(explicit: Option<&Path>) -> Result<Config, i32> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    config::load(explicit, &cwd).map_err(|e| {
        eprintln!("Error: invalid config: {}", e);
        EXIT_ERROR
    })
}

/// Run the outline command.
pub fn run_outline(args: &OutlineArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return Ok(code),
    };

    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let base = if abs_path.is_dir() {
        abs_path.clone()
    } else {
        abs_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| abs_path.clone())
    };
    let projector = Projector::new(&config);
    let ctx = AnalysisContext::new(&base, config);

    let files = ctx.collect_files(&abs_path);
    if files.is_empty() {
        eprintln!("Warning: no supported files to outline");
        return Ok(EXIT_SUCCESS);
    }
    debug!(count = files.len(), "outlining files");

    let outlines = ctx.outline_files(&files);
    let path_str = args.path.to_string_lossy().to_string();
    let mut stdout = io::stdout().lock();
    match args.format.as_str() {
        "json" => report::write_json(&mut stdout, &path_str, &outlines)?,
        _ => report::write_pretty(&mut stdout, &path_str, &outlines, &projector)?,
    }

    if outlines.iter().all(|o| o.is_ok()) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Answers prompts from command-line arguments.
struct ArgsPrompter<'a> {
    args: &'a GenerateArgs,
}

impl Prompter for ArgsPrompter<'_> {
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Option<String> {
        if prompt.starts_with("Directory") {
            return Some(self.args.dir.clone());
        }
        self.args
            .name
            .clone()
            .or_else(|| default.map(String::from))
    }

    fn pick(&mut self, _placeholder: &str, options: &[String]) -> Option<String> {
        match &self.args.ext {
            Some(ext) => options.iter().find(|o| *o == ext).cloned(),
            None => options.first().cloned(),
        }
    }

    fn interactive(&self) -> bool {
        false
    }
}

/// Run the generate command.
pub fn run_generate(args: &GenerateArgs) -> anyhow::Result<i32> {
    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return Ok(code),
    };

    let language = match args
        .language
        .clone()
        .or_else(|| detect_language(&args.file, &config))
    {
        Some(l) => l,
        None => {
            eprintln!("Error: cannot tell the language of {}", args.file.display());
            eprintln!("Use --language to set it");
            return Ok(EXIT_ERROR);
        }
    };

    let document = match Document::from_path(&args.file, &language) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", args.file.display(), e);
            return Ok(EXIT_ERROR);
        }
    };

    let workspace = match &args.workspace {
        Some(w) => w.clone(),
        None => std::env::current_dir()?,
    };
    let mut orchestrator = Orchestrator::new(config, Some(workspace));
    orchestrator.focus(document);

    let mut prompter = ArgsPrompter { args };
    match orchestrator.generate(args.mode, args.entity.as_deref(), &mut prompter) {
        Ok(Some(path)) => {
            println!("Created {}", path.display());
            Ok(EXIT_SUCCESS)
        }
        Ok(None) => {
            eprintln!("Entity generation cancelled");
            Ok(EXIT_FAILED)
        }
        Err(e @ OutlineError::DestinationConflict(_)) => {
            eprintln!("Error: {}", e);
            eprintln!("Choose another --name or --dir");
            Ok(EXIT_FAILED)
        }
        Err(e @ OutlineError::AmbiguousSelection(_)) => {
            eprintln!("Error: {}", e);
            eprintln!("Pass the entity with --entity");
            Ok(EXIT_FAILED)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_ERROR)
        }
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        return list_templates();
    }

    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'outliner init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, template.content) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: outliner outline . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "default" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  outliner init --template <name>");

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_valid_configs() {
        for template in TEMPLATES {
            let config = Config::parse_str(template.content)
                .unwrap_or_else(|e| panic!("{}: {}", template.name, e));
            assert!(config.update_on_error, "{}", template.name);
        }
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::parse_from([
            "outliner",
            "generate",
            "src/Foo.php",
            "--mode",
            "implementation",
            "--name",
            "Bar : App",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.mode, GenerationMode::Implementation);
                assert_eq!(args.name.as_deref(), Some("Bar : App"));
                assert_eq!(args.dir, "");
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_args_prompter() {
        let args = GenerateArgs {
            file: "a.ts".into(),
            mode: GenerationMode::Implementation,
            entity: None,
            name: None,
            dir: "lib".into(),
            ext: Some("js".into()),
            workspace: None,
            language: None,
            config: None,
        };
        let mut prompter = ArgsPrompter { args: &args };
        assert_eq!(prompter.input("Name", Some("Cart")).as_deref(), Some("Cart"));
        assert_eq!(prompter.input("Directory in which", None).as_deref(), Some("lib"));
        let options = vec!["ts".to_string(), "js".to_string()];
        assert_eq!(prompter.pick("ext", &options).as_deref(), Some("js"));
        assert!(!prompter.interactive());
    }
}

//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use osf_core::config::Settings;
use osf_core::diagnostics::{Diagnostic, Diagnostics};
use osf_core::{lint_with, parse, parse_file, render_html, render_page, serialize, to_markdown};

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG: &str = "osf.toml";

/// Output format for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

/// Output format for the render command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    #[default]
    Html,
}

/// Target format for the export command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    /// GitHub-flavored Markdown
    Md,
    /// The document model as JSON
    Json,
}

#[derive(Parser)]
#[command(name = "osf")]
#[command(author, version, about = "OmniScript Format toolkit", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./osf.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and print its document model as JSON
    Parse {
        /// Input OSF file
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite a file in canonical OSF form
    Format {
        /// Input OSF file
        input: PathBuf,

        /// Write the result back to the input file
        #[arg(short, long)]
        write: bool,

        /// Exit with an error if the file is not canonically formatted
        #[arg(long, conflicts_with = "write")]
        check: bool,
    },

    /// Render a file to HTML
    Render {
        /// Input OSF file
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "html")]
        format: RenderFormat,

        /// Emit a complete HTML page instead of a fragment
        #[arg(long)]
        standalone: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a file for errors and best-practice violations
    Lint {
        /// Input OSF file
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Export a file to another format
    Export {
        /// Input OSF file
        input: PathBuf,

        /// Export target
        #[arg(short, long, value_enum)]
        target: ExportTarget,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse { input, output } => {
            parse_command(&input, output.as_deref(), &settings)?;
        }
        Commands::Format {
            input,
            write,
            check,
        } => {
            let formatted = format_command(&input, write, check)?;
            if check && !formatted {
                std::process::exit(1);
            }
        }
        Commands::Render {
            input,
            format,
            standalone,
            output,
        } => {
            render_command(&input, format, standalone, output.as_deref(), &settings)?;
        }
        Commands::Lint { input, format } => {
            let diagnostics = lint_command(&input, format, &settings)?;
            if diagnostics.has_errors() {
                std::process::exit(1);
            }
        }
        Commands::Export {
            input,
            target,
            output,
        } => {
            export_command(&input, target, output.as_deref(), &settings)?;
        }
    }

    Ok(())
}

/// Execute the parse command
pub fn parse_command(input: &Path, output: Option<&Path>, settings: &Settings) -> Result<()> {
    let doc = load_document(input, settings)?;
    let json = serde_json::to_string_pretty(&doc).context("Failed to serialize document to JSON")?;
    emit(output, &json)
}

/// Execute the format command
///
/// Includes are left in place. Returns whether the input was already in
/// canonical form.
pub fn format_command(input: &Path, write: bool, check: bool) -> Result<bool> {
    let content = read_input(input)?;
    let doc = parse(&content).with_context(|| format!("Failed to parse {}", input.display()))?;
    let canonical = serialize(&doc);
    let unchanged = canonical == content;

    if check {
        if unchanged {
            println!("{} is formatted", input.display());
        } else {
            println!("{} is not formatted", input.display());
        }
    } else if write {
        if !unchanged {
            fs::write(input, &canonical)
                .with_context(|| format!("Failed to write {}", input.display()))?;
            println!("Formatted {}", input.display());
        }
    } else {
        print!("{}", canonical);
    }

    Ok(unchanged)
}

/// Execute the render command
pub fn render_command(
    input: &Path,
    format: RenderFormat,
    standalone: bool,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<()> {
    let doc = load_document(input, settings)?;
    let html = match (format, standalone) {
        (RenderFormat::Html, true) => render_page(&doc),
        (RenderFormat::Html, false) => render_html(&doc),
    };
    emit(output, &html)
}

/// Execute the lint command
///
/// Parse and include errors are reported as error diagnostics rather than
/// aborting the command.
pub fn lint_command(input: &Path, format: OutputFormat, settings: &Settings) -> Result<Diagnostics> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let file = input.display().to_string();
    let diagnostics: Diagnostics = match parse_file(input, &settings.include) {
        Ok(doc) => lint_with(&doc, &settings.lint)
            .into_iter()
            .map(|d| d.with_file(file.clone()))
            .collect::<Vec<_>>()
            .into(),
        Err(err) => {
            let diag = Diagnostic::from(&err);
            let diag = match diag.file {
                Some(_) => diag,
                None => diag.with_file(file.clone()),
            };
            vec![diag].into()
        }
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&diagnostics)
                .context("Failed to serialize diagnostics to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            if diagnostics.is_empty() {
                println!("No issues found in {}", file);
            } else {
                for diag in diagnostics.iter() {
                    println!("{}", diag);
                    println!();
                }
                println!(
                    "Found {} error(s) and {} warning(s)",
                    diagnostics.error_count(),
                    diagnostics.warning_count()
                );
            }
        }
    }

    Ok(diagnostics)
}

/// Execute the export command
pub fn export_command(
    input: &Path,
    target: ExportTarget,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<()> {
    let doc = load_document(input, settings)?;
    let text = match target {
        ExportTarget::Md => to_markdown(&doc),
        ExportTarget::Json => {
            serde_json::to_string_pretty(&doc).context("Failed to serialize document to JSON")?
        }
    };
    emit(output, &text)
}

/// Load settings from an explicit path or `./osf.toml`
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Settings::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        }
        None => {
            let candidate = Path::new(DEFAULT_CONFIG);
            if candidate.exists() {
                debug!(path = DEFAULT_CONFIG, "loading settings");
                let content = fs::read_to_string(candidate)
                    .with_context(|| format!("Failed to read config: {}", DEFAULT_CONFIG))?;
                return Settings::from_toml_str(&content)
                    .with_context(|| format!("Failed to parse config: {}", DEFAULT_CONFIG));
            }
            Ok(Settings::default())
        }
    }
}

fn read_input(input: &Path) -> Result<String> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read input file: {}", input.display()))
}

/// Parse a file with its includes resolved
fn load_document(input: &Path, settings: &Settings) -> Result<osf_ast::Document> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    parse_file(input, &settings.include).with_context(|| format!("Failed to parse {}", input.display()))
}

/// Write to a file, or to stdout when no path is given
fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!("Created: {}", path.display());
        }
        None => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

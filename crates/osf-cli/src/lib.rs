//! osf CLI - Command-line interface library
//!
//! This library provides the CLI functionality for OSF documents:
//! - Parse: Print the document model as JSON
//! - Format: Rewrite a file in canonical form
//! - Render: Convert a file to HTML
//! - Lint: Report errors and best-practice violations
//! - Export: Convert a file to Markdown or JSON
//!
//! # Library Usage
//!
//! ```ignore
//! use osf_cli::{lint_command, load_settings, OutputFormat};
//!
//! let settings = load_settings(None)?;
//! let diagnostics = lint_command(&input, OutputFormat::Json, &settings)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Render a deck to a standalone page
//! osf render deck.osf --standalone -o deck.html
//!
//! # Check formatting in CI
//! osf format deck.osf --check
//!
//! # Lint with JSON output
//! osf lint deck.osf --format json
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    export_command, format_command, lint_command, load_settings, parse_command, render_command,
};
pub use app::{run_cli, ExportTarget, OutputFormat, RenderFormat, DEFAULT_CONFIG};

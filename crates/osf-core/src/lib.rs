//! osf-core - Parser and serializer for the OmniScript Format
//!
//! OSF is a plain-text format that carries documents, slides, spreadsheets,
//! charts, diagrams, code samples and tables in one file of `@block { ... }`
//! sections. This crate turns OSF text into an [`osf_ast::Document`] and back,
//! resolves `@include` directives safely, and projects documents to HTML and
//! Markdown.
//!
//! # Example
//!
//! ```
//! use osf_core::{parse, serialize};
//!
//! let doc = parse(r#"@meta { title: "Hello"; }
//! @slide { title: "Intro"; bullets { "One"; "Two"; } }"#)?;
//! assert_eq!(doc.len(), 2);
//!
//! let text = serialize(&doc);
//! assert!(text.starts_with("@meta {\n  title: \"Hello\";\n}\n"));
//! assert_eq!(parse(&text)?, doc);
//! # Ok::<(), osf_core::OsfError>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod escape;
pub mod html;
pub mod include;
pub mod lexer;
pub mod lint;
pub mod markdown;
pub mod markup;
pub mod parser;
pub mod serializer;

use std::path::Path;

use osf_ast::Document;

use crate::config::ParserConfig;
use crate::include::{FsReader, IncludeResolver};

// Re-export main types and functions
pub use diagnostics::{Diagnostic, Severity};
pub use error::{ErrorKind, OsfError, Position, ResolutionKind, Result};
pub use html::{render_html, render_page};
pub use lint::{lint, lint_with};
pub use markdown::to_markdown;
pub use parser::parse;
pub use serializer::serialize;

/// OSF format version stamped on parsed documents
pub const FORMAT_VERSION: &str = "1.2";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse text and resolve its includes from the filesystem
///
/// Includes resolve against `config.base_dir`, or the working directory when
/// none is set.
pub fn parse_with_config(input: &str, config: &ParserConfig) -> Result<Document> {
    IncludeResolver::new(config, &FsReader).resolve_source(input, None)
}

/// Read a file, parse it and resolve its includes
pub fn parse_file(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Document> {
    IncludeResolver::new(config, &FsReader).resolve_file(path.as_ref())
}

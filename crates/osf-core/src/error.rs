//! Error types for OSF processing.
//!
//! Every failure surfaces as an [`OsfError`]. Lexer and parser errors always
//! carry a 1-based `line:column`; validation, resolution and security errors
//! carry one when the offending construct has a source location. Errors that
//! happen inside an included file are wrapped in [`OsfError::Included`], which
//! records the included file and where the `@include` directive sits in the
//! including source.

use std::fmt;
use std::path::PathBuf;

use osf_ast::BlockKind;
use osf_validate::ValidationIssue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for OSF operations
pub type Result<T> = std::result::Result<T, OsfError>;

/// A 1-based source position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Optional location suffix for messages (" at 3:7" or nothing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct At(pub Option<Position>);

impl fmt::Display for At {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, " at {}", position),
            None => Ok(()),
        }
    }
}

/// Why an include could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionKind {
    FileNotFound,
    CircularReference,
    DepthLimit,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolutionKind::FileNotFound => "file-not-found",
            ResolutionKind::CircularReference => "circular-reference",
            ResolutionKind::DepthLimit => "depth-limit",
        })
    }
}

/// Flattened error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lex,
    Parse,
    Resolution,
    Security,
    Validation,
    Io,
}

/// Errors that can occur while processing OSF text
#[derive(Error, Debug)]
pub enum OsfError {
    /// Malformed token, escape sequence or unterminated string
    #[error("{message} at {position}")]
    Lex { message: String, position: Position },

    /// Grammar violation
    #[error("{message} at {position}")]
    Parse {
        message: String,
        position: Position,
        block: Option<BlockKind>,
    },

    /// Missing, circular or too deeply nested include
    #[error("{message}{at}")]
    Resolution {
        kind: ResolutionKind,
        message: String,
        /// File that requested the include
        file: PathBuf,
        /// The include path as written
        path: String,
        at: At,
    },

    /// Include path escapes the base directory
    #[error("Path traversal blocked: include path '{path}' escapes the base directory{at}")]
    Security {
        path: String,
        /// File that requested the include
        file: PathBuf,
        at: At,
    },

    /// Semantic or shape violation
    #[error("{message}{at}")]
    Validation {
        code: &'static str,
        message: String,
        at: At,
        block: Option<BlockKind>,
    },

    /// Error raised while processing an included file
    #[error("{source}\n  --> in {}, included at {position}", .file.display())]
    Included {
        /// The included file the inner error belongs to
        file: PathBuf,
        /// Position of the `@include` block in the including source
        position: Position,
        source: Box<OsfError>,
    },

    /// I/O failure other than a missing include
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl OsfError {
    /// Create a lexer error
    pub fn lex(message: impl Into<String>, position: Position) -> Self {
        Self::Lex {
            message: message.into(),
            position,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>, position: Position) -> Self {
        Self::Parse {
            message: message.into(),
            position,
            block: None,
        }
    }

    /// Create a parse error tied to a block kind
    pub fn parse_in(block: BlockKind, message: impl Into<String>, position: Position) -> Self {
        Self::Parse {
            message: message.into(),
            position,
            block: Some(block),
        }
    }

    /// Create a validation error from a validator issue
    pub fn validation(issue: ValidationIssue, position: Option<Position>) -> Self {
        Self::Validation {
            code: issue.code,
            message: issue.message,
            at: At(position),
            block: issue.block,
        }
    }

    /// Create a resolution error
    pub fn resolution(
        kind: ResolutionKind,
        message: impl Into<String>,
        file: impl Into<PathBuf>,
        path: impl Into<String>,
        position: Option<Position>,
    ) -> Self {
        Self::Resolution {
            kind,
            message: message.into(),
            file: file.into(),
            path: path.into(),
            at: At(position),
        }
    }

    /// Create a path traversal error
    pub fn security(path: impl Into<String>, file: impl Into<PathBuf>, position: Option<Position>) -> Self {
        Self::Security {
            path: path.into(),
            file: file.into(),
            at: At(position),
        }
    }

    /// Wrap an error raised inside an included file
    pub fn included(file: impl Into<PathBuf>, position: Position, source: OsfError) -> Self {
        Self::Included {
            file: file.into(),
            position,
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through include wrappers
    pub fn innermost(&self) -> &OsfError {
        match self {
            Self::Included { source, .. } => source.innermost(),
            other => other,
        }
    }

    /// The taxonomy kind of the innermost error
    pub fn kind(&self) -> ErrorKind {
        match self.innermost() {
            Self::Lex { .. } => ErrorKind::Lex,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Resolution { .. } => ErrorKind::Resolution,
            Self::Security { .. } => ErrorKind::Security,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Io { .. } => ErrorKind::Io,
            Self::Included { .. } => unreachable!("innermost never returns a wrapper"),
        }
    }

    /// The resolution sub-kind, if this is a resolution error
    pub fn resolution_kind(&self) -> Option<ResolutionKind> {
        match self.innermost() {
            Self::Resolution { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Source position of the innermost error, if known
    pub fn position(&self) -> Option<Position> {
        match self.innermost() {
            Self::Lex { position, .. } | Self::Parse { position, .. } => Some(*position),
            Self::Resolution { at, .. } | Self::Security { at, .. } | Self::Validation { at, .. } => {
                at.0
            }
            _ => None,
        }
    }

    /// The block kind implicated by the innermost error, if known
    pub fn block(&self) -> Option<BlockKind> {
        match self.innermost() {
            Self::Parse { block, .. } | Self::Validation { block, .. } => *block,
            _ => None,
        }
    }

    /// The file the innermost error belongs to, when it came from an include
    pub fn file(&self) -> Option<&std::path::Path> {
        match self {
            Self::Included { file, source, .. } => source.file().or(Some(file.as_path())),
            _ => None,
        }
    }

    /// The innermost message without its position suffix
    pub fn message(&self) -> String {
        match self.innermost() {
            Self::Lex { message, .. }
            | Self::Parse { message, .. }
            | Self::Resolution { message, .. }
            | Self::Validation { message, .. } => message.clone(),
            Self::Security { path, .. } => format!(
                "Path traversal blocked: include path '{}' escapes the base directory",
                path
            ),
            other => other.to_string(),
        }
    }

    /// Get the error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self.innermost() {
            Self::Lex { .. } => "OSF001",
            Self::Parse { .. } => "OSF002",
            Self::Resolution { .. } => "OSF003",
            Self::Security { .. } => "OSF004",
            Self::Validation { code, .. } => code,
            Self::Io { .. } => "OSF006",
            Self::Included { .. } => unreachable!("innermost never returns a wrapper"),
        }
    }
}

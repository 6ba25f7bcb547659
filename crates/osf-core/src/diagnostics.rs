//! Diagnostics for OSF documents
//!
//! This module provides structures for reporting errors, warnings, and
//! informational messages from parsing and linting.

use serde::{Deserialize, Serialize};

use crate::config::RuleSeverity;
use crate::error::{OsfError, Position};

/// A diagnostic message
///
/// # Example
///
/// ```
/// use osf_core::diagnostics::{Diagnostic, Severity};
/// use osf_core::Position;
///
/// let diag = Diagnostic::new(Severity::Warning, "Document should start with @meta")
///     .with_code("OSF101")
///     .with_position(Position::new(1, 1))
///     .with_help("Add an @meta block with a title");
/// assert!(diag.is_warning());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level of the diagnostic
    pub severity: Severity,

    /// The diagnostic message
    pub message: String,

    /// Stable code (e.g., "OSF002", "OSF103")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Source position where the issue occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    /// Index of the implicated block in the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<usize>,

    /// Optional file path where the issue occurred
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Additional help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Related notes, such as the include chain
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Map a configured rule severity; `None` when the rule is disabled
    pub fn from_rule(severity: RuleSeverity) -> Option<Self> {
        match severity {
            RuleSeverity::Error => Some(Severity::Error),
            RuleSeverity::Warning => Some(Severity::Warning),
            RuleSeverity::Info => Some(Severity::Info),
            RuleSeverity::Ignore => None,
        }
    }
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            code: None,
            position: None,
            block: None,
            file: None,
            help: None,
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the source position
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the block index
    pub fn with_block(mut self, index: usize) -> Self {
        self.block = Some(index);
        self
    }

    /// Set the file path
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl From<&OsfError> for Diagnostic {
    fn from(err: &OsfError) -> Self {
        let mut diag = Diagnostic::error(err.message()).with_code(err.code());
        if let Some(position) = err.position() {
            diag = diag.with_position(position);
        }
        if let Some(file) = err.file() {
            diag = diag.with_file(file.display().to_string());
        }
        if let Some(block) = err.block() {
            diag = diag.with_note(format!("in block @{}", block));
        }

        // Include chain, innermost first
        let mut chain = Vec::new();
        let mut current = err;
        while let OsfError::Included {
            file,
            position,
            source,
        } = current
        {
            chain.push(format!("{} included at {}", file.display(), position));
            current = &**source;
        }
        diag.notes.extend(chain.into_iter().rev());
        diag
    }
}

impl From<OsfError> for Diagnostic {
    fn from(err: OsfError) -> Self {
        Diagnostic::from(&err)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: severity[code]: message
        write!(f, "{}", self.severity)?;
        if let Some(ref code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;

        match (&self.file, self.position) {
            (Some(file), Some(pos)) => write!(f, "\n  --> {}:{}", file, pos)?,
            (Some(file), None) => write!(f, "\n  --> {}", file)?,
            (None, Some(pos)) => write!(f, "\n  --> {}", pos)?,
            (None, None) => {}
        }
        if let Some(block) = self.block {
            write!(f, "\n  = block: #{}", block + 1)?;
        }

        if let Some(ref help) = self.help {
            write!(f, "\n  = help: {}", help)?;
        }

        for note in &self.notes {
            write!(f, "\n  = note: {}", note)?;
        }

        Ok(())
    }
}

/// A collection of diagnostics
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

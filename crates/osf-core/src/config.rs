//! Configuration settings
//!
//! Settings are read from an `osf.toml` file:
//!
//! ```toml
//! [include]
//! base_dir = "docs"
//! max_include_depth = 5
//!
//! [lint]
//! max_bullets = 8
//! missing_meta = "ignore"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Hard cap on include nesting; configured depths above it are clamped
pub const MAX_INCLUDE_DEPTH: usize = 10;

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Include resolution settings
    pub include: ParserConfig,
    /// Lint rule settings
    pub lint: LintSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize settings to a TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Parser and include resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Directory every include must stay inside. When unset, the directory
    /// of the root file (or the working directory for in-memory text) is used.
    pub base_dir: Option<PathBuf>,
    /// Maximum include nesting depth
    pub max_include_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            max_include_depth: MAX_INCLUDE_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Configuration rooted at a base directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..Self::default()
        }
    }

    /// Set the maximum include depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// The depth limit actually enforced
    pub fn depth_limit(&self) -> usize {
        self.max_include_depth.min(MAX_INCLUDE_DEPTH)
    }

    /// The configured base directory, if any
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }
}

/// Rule severity levels for lint rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Error,
    #[default]
    Warning,
    Info,
    /// Rule is disabled
    Ignore,
}

impl RuleSeverity {
    /// Check if this severity means the rule is enabled
    pub fn is_enabled(self) -> bool {
        self != RuleSeverity::Ignore
    }
}

/// Lint rule configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintSettings {
    /// Document does not start with `@meta` (OSF101)
    pub missing_meta: RuleSeverity,
    /// `@meta` without a title (OSF102)
    pub meta_title: RuleSeverity,
    /// Slide with too many bullets (OSF103)
    pub bullet_count: RuleSeverity,
    /// Table without data rows (OSF104)
    pub empty_table: RuleSeverity,
    /// Bullet threshold for OSF103
    pub max_bullets: usize,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            missing_meta: RuleSeverity::Warning,
            meta_title: RuleSeverity::Warning,
            bullet_count: RuleSeverity::Warning,
            empty_table: RuleSeverity::Warning,
            max_bullets: 6,
        }
    }
}

//! osf-validate - Document validation engine
//!
//! This crate provides the semantic checks that run over parsed OSF blocks:
//! table shape, formula syntax, chart values and the strict literal rules the
//! parser relies on for numbers, keywords and coordinates.
//!
//! # Architecture
//!
//! Individual validators implement the [`Validator`] trait and inspect one
//! block at a time. The [`ValidationEngine`] runs every registered validator
//! and stops at the first issue, because OSF reports exactly one error per
//! parse.
//!
//! None of the checks backtrack: scanning is hand-written and linear, and the
//! few regular expressions go through the `regex` crate's finite automata with
//! bounded repetition counts.
//!
//! # Example
//!
//! ```
//! use osf_ast::{Block, Document, Table};
//! use osf_validate::ValidationEngine;
//!
//! let engine = ValidationEngine::with_defaults();
//! let mut doc = Document::new();
//! doc.push(Block::Table(Table {
//!     header: vec!["A".into(), "B".into()],
//!     rows: vec![vec!["1".into()]],
//!     ..Default::default()
//! }));
//!
//! let issue = engine.validate(&doc).unwrap_err();
//! assert_eq!(issue.block_index, Some(0));
//! ```

pub mod chart;
pub mod formula;
pub mod literal;
pub mod sheet;
pub mod table;

use osf_ast::{Block, BlockKind, Document};
use thiserror::Error;

pub use chart::ChartValuesValidator;
pub use sheet::SheetFormulaValidator;
pub use table::TableShapeValidator;

/// A semantic problem found in a block or literal
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationIssue {
    /// Stable rule code (e.g. "OSF201")
    pub code: &'static str,
    /// Human-readable description
    pub message: String,
    /// The block kind the issue belongs to
    pub block: Option<BlockKind>,
    /// Index of the offending block when validating a whole document
    pub block_index: Option<usize>,
}

impl ValidationIssue {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            block: None,
            block_index: None,
        }
    }

    /// Attach the block kind
    pub fn in_block(mut self, kind: BlockKind) -> Self {
        self.block = Some(kind);
        self
    }

    /// Attach the block position within the document
    pub fn at_index(mut self, index: usize) -> Self {
        self.block_index = Some(index);
        self
    }
}

/// Result type for validation
pub type Result<T> = std::result::Result<T, ValidationIssue>;

/// Trait for block validators
///
/// Validators inspect a single block and fail on the first problem they
/// find. Each validator has a unique code for its issues.
pub trait Validator: Send + Sync {
    /// Get the validator's unique code (e.g., "OSF201")
    fn code(&self) -> &'static str;

    /// Get a human-readable name for this validator
    fn name(&self) -> &'static str {
        "unnamed"
    }

    /// Validate one block
    fn validate(&self, block: &Block) -> Result<()>;
}

/// Validation engine that orchestrates multiple validators
pub struct ValidationEngine {
    /// Registered validators
    validators: Vec<Box<dyn Validator>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ValidationEngine {
    /// Create a new empty validation engine
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Create an engine with the built-in validators
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_validator(Box::new(TableShapeValidator));
        engine.add_validator(Box::new(SheetFormulaValidator));
        engine.add_validator(Box::new(ChartValuesValidator));
        engine
    }

    /// Add a validator to the engine
    pub fn add_validator(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    /// Get the number of registered validators
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Get the names of all registered validators
    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Validate one block with every registered validator
    pub fn validate_block(&self, block: &Block) -> Result<()> {
        for validator in &self.validators {
            validator
                .validate(block)
                .map_err(|issue| issue.in_block(block.kind()))?;
        }
        Ok(())
    }

    /// Validate a document, reporting the first issue in block order
    pub fn validate(&self, doc: &Document) -> Result<()> {
        for (index, block) in doc.blocks.iter().enumerate() {
            self.validate_block(block)
                .map_err(|issue| issue.at_index(index))?;
        }
        Ok(())
    }

    /// Check if a document passes every validator
    pub fn is_valid(&self, doc: &Document) -> bool {
        self.validate(doc).is_ok()
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use osf_ast::{CellRef, CellValue, Sheet, Table};

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_engine_new() {
        let engine = ValidationEngine::new();
        assert_eq!(engine.validator_count(), 0);
    }

    #[test]
    fn test_engine_with_defaults() {
        let engine = ValidationEngine::with_defaults();
        assert_eq!(engine.validator_count(), 3);
        assert!(engine.validator_names().contains(&"table-shape"));
        assert!(engine.validator_names().contains(&"sheet-formula"));
    }

    #[test]
    fn test_validate_empty_document() {
        let engine = ValidationEngine::with_defaults();
        assert!(engine.is_valid(&Document::new()));
    }

    #[test]
    fn test_first_issue_wins() {
        let engine = ValidationEngine::with_defaults();
        let mut sheet = Sheet::default();
        sheet.set(CellRef::new(1, 1), CellValue::Formula("SUM(".into()));

        let mut doc = Document::new();
        doc.push(Block::Table(Table {
            header: vec!["A".into()],
            rows: vec![vec!["1".into()]],
            ..Default::default()
        }));
        doc.push(Block::Sheet(sheet));
        doc.push(Block::Table(Table {
            header: vec!["A".into(), "B".into()],
            rows: vec![vec!["1".into()]],
            ..Default::default()
        }));

        let issue = engine.validate(&doc).unwrap_err();
        assert_eq!(issue.block_index, Some(1));
        assert_eq!(issue.block, Some(BlockKind::Sheet));
    }
}

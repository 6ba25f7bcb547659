//! Table shape validator
//!
//! The parser accepts whatever row shapes it sees; this validator enforces
//! that every data row has exactly as many cells as the header and that an
//! alignment array, when present, names every column.

use osf_ast::Block;

use crate::{Result, ValidationIssue, Validator};

/// Validates table row and alignment lengths
///
/// # Issue Codes
///
/// - `OSF201`: row or alignment length differs from the header
pub struct TableShapeValidator;

impl Validator for TableShapeValidator {
    fn code(&self) -> &'static str {
        "OSF201"
    }

    fn name(&self) -> &'static str {
        "table-shape"
    }

    fn validate(&self, block: &Block) -> Result<()> {
        let Block::Table(table) = block else {
            return Ok(());
        };

        let columns = table.column_count();
        if columns == 0 {
            return Err(ValidationIssue::new(
                self.code(),
                "Table header must have at least one column",
            ));
        }

        for (index, row) in table.rows.iter().enumerate() {
            if row.len() != columns {
                return Err(ValidationIssue::new(
                    self.code(),
                    format!(
                        "Table row {} has {} cells but the header has {} columns",
                        index + 1,
                        row.len(),
                        columns
                    ),
                ));
            }
        }

        if let Some(alignment) = &table.alignment {
            if alignment.len() != columns {
                return Err(ValidationIssue::new(
                    self.code(),
                    format!(
                        "Table alignment has {} entries but the header has {} columns",
                        alignment.len(),
                        columns
                    ),
                ));
            }
        }

        Ok(())
    }
}

//! Sheet formula validator

use osf_ast::{Block, CellValue};

use crate::formula::{check_formula, FORMULA_CODE};
use crate::{Result, ValidationIssue, Validator};

/// Validates every formula cell of a sheet and its coordinates
pub struct SheetFormulaValidator;

impl Validator for SheetFormulaValidator {
    fn code(&self) -> &'static str {
        FORMULA_CODE
    }

    fn name(&self) -> &'static str {
        "sheet-formula"
    }

    fn validate(&self, block: &Block) -> Result<()> {
        let Block::Sheet(sheet) = block else {
            return Ok(());
        };

        for (cell, value) in &sheet.cells {
            if cell.row == 0 || cell.col == 0 {
                return Err(ValidationIssue::new(
                    self.code(),
                    format!("Cell ({},{}) is outside the 1-based grid", cell.row, cell.col),
                ));
            }
            if let CellValue::Formula(expr) = value {
                check_formula(expr).map_err(|mut issue| {
                    issue.message = format!("{} in cell {}", issue.message, cell);
                    issue
                })?;
            }
        }

        Ok(())
    }
}

//! Chart value validator

use osf_ast::Block;

use crate::literal::check_color;
use crate::{Result, ValidationIssue, Validator};

/// Validates chart series values and colours, and code highlight lines
pub struct ChartValuesValidator;

impl Validator for ChartValuesValidator {
    fn code(&self) -> &'static str {
        "OSF203"
    }

    fn name(&self) -> &'static str {
        "chart-values"
    }

    fn validate(&self, block: &Block) -> Result<()> {
        match block {
            Block::Chart(chart) => {
                for series in &chart.series {
                    if let Some(value) = series.values.iter().find(|v| !v.is_finite()) {
                        return Err(ValidationIssue::new(
                            self.code(),
                            format!("Series '{}' has a non-finite value {}", series.label, value),
                        ));
                    }
                }
                if let Some(options) = &chart.options {
                    for color in &options.colors {
                        check_color(color)?;
                    }
                }
                Ok(())
            }
            Block::Code(code) => {
                if code.highlight.contains(&0) {
                    return Err(ValidationIssue::new(
                        self.code(),
                        "Highlighted line numbers start at 1",
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

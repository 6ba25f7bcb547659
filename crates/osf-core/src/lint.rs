//! Best-practice lint rules
//!
//! Lint runs over an already parsed document and only ever produces
//! advisory diagnostics; hard errors come from parsing.
//!
//! # Rule Codes
//!
//! - `OSF101`: document does not start with `@meta`
//! - `OSF102`: `@meta` without a title
//! - `OSF103`: slide with more bullets than `max_bullets`
//! - `OSF104`: table without data rows

use osf_ast::{Block, Document, SlideContent};
use tracing::debug;

use crate::config::{LintSettings, RuleSeverity};
use crate::diagnostics::{Diagnostic, Severity};

/// Lint a document with the default settings
pub fn lint(doc: &Document) -> Vec<Diagnostic> {
    lint_with(doc, &LintSettings::default())
}

/// Lint a document with explicit rule settings
pub fn lint_with(doc: &Document, settings: &LintSettings) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut report = |severity: RuleSeverity, diag: Diagnostic| {
        if let Some(severity) = Severity::from_rule(severity) {
            diagnostics.push(Diagnostic { severity, ..diag });
        }
    };

    if !matches!(doc.blocks.first(), Some(Block::Meta(_))) {
        report(
            settings.missing_meta,
            Diagnostic::warning("Document should start with an @meta block")
                .with_code("OSF101")
                .with_help("Add `@meta { title: \"...\"; }` at the top"),
        );
    }

    for (index, block) in doc.blocks.iter().enumerate() {
        match block {
            Block::Meta(meta) if meta.title.is_none() => report(
                settings.meta_title,
                Diagnostic::warning("@meta block has no title")
                    .with_code("OSF102")
                    .with_block(index),
            ),
            Block::Slide(slide) => {
                let bullets: usize = slide
                    .content
                    .iter()
                    .map(|content| match content {
                        SlideContent::Bullets(items) => items.len(),
                        SlideContent::Text(_) => 0,
                    })
                    .sum();
                if bullets > settings.max_bullets {
                    report(
                        settings.bullet_count,
                        Diagnostic::warning(format!(
                            "Slide has {} bullets; more than {} is hard to read",
                            bullets, settings.max_bullets
                        ))
                        .with_code("OSF103")
                        .with_block(index)
                        .with_help("Split the content across several slides"),
                    );
                }
            }
            Block::Table(table) if table.rows.is_empty() => report(
                settings.empty_table,
                Diagnostic::warning("Table has no data rows")
                    .with_code("OSF104")
                    .with_block(index),
            ),
            _ => {}
        }
    }

    debug!(count = diagnostics.len(), "lint finished");
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn codes(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().filter_map(|d| d.code.as_deref()).collect()
    }

    #[test]
    fn test_clean_document() {
        let doc = parse(r#"@meta { title: "T"; } @slide { title: "S"; bullets { "a"; } }"#).unwrap();
        assert!(lint(&doc).is_empty());
    }

    #[test]
    fn test_missing_meta() {
        let doc = parse(r#"@slide { title: "S"; }"#).unwrap();
        let diags = lint(&doc);
        assert_eq!(codes(&diags), vec!["OSF101"]);
        assert!(diags[0].is_warning());
        assert_eq!(codes(&lint(&Document::new())), vec!["OSF101"]);
    }

    #[test]
    fn test_meta_without_title() {
        let doc = parse(r#"@meta { author: "Ann"; }"#).unwrap();
        let diags = lint(&doc);
        assert_eq!(codes(&diags), vec!["OSF102"]);
        assert_eq!(diags[0].block, Some(0));
    }

    #[test]
    fn test_too_many_bullets() {
        let doc = parse(
            r#"@meta { title: "T"; }
@slide {
  title: "Busy";
  bullets { "1"; "2"; "3"; "4"; }
  bullets { "5"; "6"; "7"; }
}"#,
        )
        .unwrap();
        let diags = lint(&doc);
        assert_eq!(codes(&diags), vec!["OSF103"]);
        assert!(diags[0].message.contains("7 bullets"));
        assert_eq!(diags[0].block, Some(1));
    }

    #[test]
    fn test_empty_table() {
        let doc = parse("@meta { title: \"T\"; }\n@table {\n  | A |\n  | --- |\n}").unwrap();
        assert_eq!(codes(&lint(&doc)), vec!["OSF104"]);
    }

    #[test]
    fn test_settings_change_severity() {
        let doc = parse("@table {\n  | A |\n  | --- |\n}").unwrap();
        let settings = LintSettings {
            missing_meta: RuleSeverity::Ignore,
            empty_table: RuleSeverity::Error,
            ..LintSettings::default()
        };
        let diags = lint_with(&doc, &settings);
        assert_eq!(codes(&diags), vec!["OSF104"]);
        assert!(diags[0].is_error());
    }

    #[test]
    fn test_bullet_threshold_is_configurable() {
        let doc = parse(r#"@meta { title: "T"; } @slide { bullets { "a"; "b"; "c"; } }"#).unwrap();
        let settings = LintSettings {
            max_bullets: 2,
            ..LintSettings::default()
        };
        assert_eq!(codes(&lint_with(&doc, &settings)), vec!["OSF103"]);
    }
}

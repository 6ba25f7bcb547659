//! Markdown export
//!
//! Converts an OSF document into GitHub-flavored Markdown.
//!
//! # Example
//!
//! ```
//! let doc = osf_core::parse(r#"@meta { title: "Report"; author: "Ann"; }"#).unwrap();
//! let md = osf_core::to_markdown(&doc);
//! assert!(md.starts_with("# Report\n"));
//! ```

use std::collections::BTreeSet;
use std::fmt::Write;

use osf_ast::{
    Alignment, Block, CellValue, Chart, CodeBlock, Diagram, Document, Meta, Sheet, Slide,
    SlideContent, Table,
};

use crate::escape::table_cell;

/// Markdown exporter
#[derive(Debug, Default)]
pub struct MarkdownExporter {
    output: String,
}

impl MarkdownExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a document; blocks are separated by a blank line
    pub fn export(&mut self, doc: &Document) -> String {
        self.output.clear();

        for (i, block) in doc.blocks.iter().enumerate() {
            if i > 0 {
                let end = self.output.trim_end().len();
                self.output.truncate(end);
                self.output.push_str("\n\n");
            }
            self.export_block(block);
        }

        let mut out = self.output.trim_end().to_string();
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn export_block(&mut self, block: &Block) {
        match block {
            Block::Meta(meta) => self.meta(meta),
            Block::Doc(doc) => writeln!(self.output, "{}", doc.content.trim_end()).unwrap(),
            Block::Slide(slide) => self.slide(slide),
            Block::Sheet(sheet) => self.sheet(sheet),
            Block::Chart(chart) => self.chart(chart),
            Block::Diagram(diagram) => self.diagram(diagram),
            Block::Code(code) => self.code(code),
            Block::Table(table) => self.table(table),
            Block::Include(include) => {
                writeln!(self.output, "*Unresolved include:* `{}`", include.path).unwrap()
            }
        }
    }

    fn meta(&mut self, meta: &Meta) {
        if let Some(title) = &meta.title {
            writeln!(self.output, "# {}", title).unwrap();
            writeln!(self.output).unwrap();
        }
        for (label, value) in [
            ("Author", &meta.author),
            ("Date", &meta.date),
            ("Version", &meta.version),
        ] {
            if let Some(value) = value {
                writeln!(self.output, "**{}:** {}  ", label, value).unwrap();
            }
        }
        if !meta.tags.is_empty() {
            writeln!(self.output, "**Tags:** {}  ", meta.tags.join(", ")).unwrap();
        }
        if let Some(description) = &meta.description {
            writeln!(self.output).unwrap();
            writeln!(self.output, "{}", description).unwrap();
        }
    }

    fn slide(&mut self, slide: &Slide) {
        writeln!(self.output, "## {}", slide.title.as_deref().unwrap_or("Slide")).unwrap();
        for content in &slide.content {
            writeln!(self.output).unwrap();
            match content {
                SlideContent::Text(text) => writeln!(self.output, "{}", text).unwrap(),
                SlideContent::Bullets(items) => {
                    for item in items {
                        writeln!(self.output, "- {}", item).unwrap();
                    }
                }
            }
        }
    }

    fn sheet(&mut self, sheet: &Sheet) {
        if let Some(name) = &sheet.name {
            writeln!(self.output, "**{}**", name).unwrap();
            writeln!(self.output).unwrap();
        }

        let rows: BTreeSet<u32> = sheet.cells.keys().map(|cell| cell.row).collect();
        let mut cols: BTreeSet<u32> = sheet.cells.keys().map(|cell| cell.col).collect();
        cols.extend(1..=sheet.cols.len() as u32);

        let header: Vec<String> = cols.iter().map(|&col| sheet.column_label(col)).collect();
        self.row(std::iter::once(String::new()).chain(header));
        self.separator(cols.len() + 1, None);

        for &row in &rows {
            let cells = cols.iter().map(|&col| match sheet.cell(row, col) {
                Some(CellValue::Text(text)) => text.clone(),
                Some(CellValue::Number(n)) => n.to_string(),
                Some(CellValue::Formula(expr)) => format!("={}", expr),
                None => String::new(),
            });
            self.row(std::iter::once(row.to_string()).chain(cells));
        }
    }

    fn chart(&mut self, chart: &Chart) {
        writeln!(self.output, "**{}** ({} chart)", chart.title, chart.chart_type).unwrap();
        writeln!(self.output).unwrap();

        let width = chart.series.iter().map(|s| s.values.len()).max().unwrap_or(0);
        let corner = chart
            .options
            .as_ref()
            .and_then(|o| o.x_axis.clone())
            .unwrap_or_else(|| "Series".to_string());
        self.row(std::iter::once(corner).chain((1..=width).map(|i| i.to_string())));
        self.separator(width + 1, None);
        for series in &chart.series {
            let values = (0..width).map(|i| {
                series
                    .values
                    .get(i)
                    .map(f64::to_string)
                    .unwrap_or_default()
            });
            self.row(std::iter::once(series.label.clone()).chain(values));
        }
    }

    fn diagram(&mut self, diagram: &Diagram) {
        if let Some(title) = &diagram.title {
            writeln!(self.output, "**{}**", title).unwrap();
            writeln!(self.output).unwrap();
        }
        self.fenced(diagram.engine.as_str(), &diagram.code);
    }

    fn code(&mut self, code: &CodeBlock) {
        if let Some(caption) = &code.caption {
            writeln!(self.output, "*{}*", caption).unwrap();
            writeln!(self.output).unwrap();
        }
        self.fenced(&code.language, &code.code);
    }

    fn table(&mut self, table: &Table) {
        if let Some(caption) = &table.caption {
            writeln!(self.output, "*{}*", caption).unwrap();
            writeln!(self.output).unwrap();
        }
        self.row(table.header.iter().cloned());
        self.separator(table.header.len(), table.alignment.as_deref());
        for row in &table.rows {
            self.row(row.iter().cloned());
        }
    }

    /// Fence long enough to contain any backtick run in `body`
    fn fenced(&mut self, lang: &str, body: &str) {
        let longest = body
            .split(|c: char| c != '`')
            .map(str::len)
            .max()
            .unwrap_or(0);
        let fence = "`".repeat(longest.max(2) + 1);
        writeln!(self.output, "{}{}", fence, lang).unwrap();
        writeln!(self.output, "{}", body.trim_end_matches('\n')).unwrap();
        writeln!(self.output, "{}", fence).unwrap();
    }

    fn row(&mut self, cells: impl Iterator<Item = String>) {
        self.output.push('|');
        for cell in cells {
            write!(self.output, " {} |", table_cell(&cell)).unwrap();
        }
        self.output.push('\n');
    }

    fn separator(&mut self, width: usize, alignment: Option<&[Alignment]>) {
        self.output.push('|');
        for i in 0..width {
            let marker = match alignment.and_then(|a| a.get(i)) {
                Some(Alignment::Left) => ":---",
                Some(Alignment::Center) => ":---:",
                Some(Alignment::Right) => "---:",
                None => "---",
            };
            write!(self.output, " {} |", marker).unwrap();
        }
        self.output.push('\n');
    }
}

/// Export a document to Markdown
pub fn to_markdown(doc: &Document) -> String {
    MarkdownExporter::new().export(doc)
}

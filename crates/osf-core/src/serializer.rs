//! OSF Serializer
//!
//! This module converts an `osf_ast::Document` back into canonical OSF text.
//!
//! The output is deterministic: blocks are separated by one blank line,
//! properties are indented and written in a fixed order per block kind, and
//! every string goes through [`crate::escape`]. Serializing a parsed document
//! and parsing the result yields the same document.
//!
//! # Example
//!
//! ```
//! use osf_ast::{Block, Document, Meta};
//! use osf_core::serialize;
//!
//! let mut doc = Document::new();
//! doc.push(Block::Meta(Meta {
//!     title: Some("Copyright \u{a9} 2025".to_string()),
//!     ..Default::default()
//! }));
//!
//! let text = serialize(&doc);
//! assert_eq!(text, "@meta {\n  title: \"Copyright \\xA9 2025\";\n}\n");
//! ```

use std::fmt::Write;

use osf_ast::{
    Block, CellRef, CellValue, Chart, CodeBlock, Diagram, Document, Meta, Sheet, Slide,
    SlideContent, Table,
};

use crate::escape::{quoted, table_cell};

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Spaces per indentation level
    pub indent_width: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self { indent_width: 2 }
    }
}

/// OSF text serializer
pub struct OsfSerializer {
    config: SerializerConfig,
    output: String,
}

impl Default for OsfSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl OsfSerializer {
    /// Create a new serializer with default configuration
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    /// Create a serializer with custom configuration
    pub fn with_config(config: SerializerConfig) -> Self {
        Self {
            config,
            output: String::new(),
        }
    }

    /// Serialize a document
    pub fn serialize(&mut self, doc: &Document) -> String {
        self.output.clear();

        for (i, block) in doc.blocks.iter().enumerate() {
            if i > 0 {
                self.output.push('\n');
            }
            self.block(block);
        }

        std::mem::take(&mut self.output)
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level * self.config.indent_width {
            self.output.push(' ');
        }
    }

    /// `key: "text";`
    fn string_prop(&mut self, key: &str, value: &str) {
        self.indent(1);
        writeln!(self.output, "{}: {};", key, quoted(value)).unwrap();
    }

    fn opt_string_prop(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.string_prop(key, value);
        }
    }

    /// `key: raw;` for keywords, numbers, booleans and lists
    fn raw_prop(&mut self, key: &str, value: impl std::fmt::Display) {
        self.indent(1);
        writeln!(self.output, "{}: {};", key, value).unwrap();
    }

    fn block(&mut self, block: &Block) {
        writeln!(self.output, "@{} {{", block.kind()).unwrap();
        match block {
            Block::Meta(meta) => self.meta(meta),
            Block::Doc(doc) => self.string_prop("content", &doc.content),
            Block::Slide(slide) => self.slide(slide),
            Block::Sheet(sheet) => self.sheet(sheet),
            Block::Chart(chart) => self.chart(chart),
            Block::Diagram(diagram) => self.diagram(diagram),
            Block::Code(code) => self.code(code),
            Block::Table(table) => self.table(table),
            Block::Include(include) => self.string_prop("path", &include.path),
        }
        self.output.push_str("}\n");
    }

    fn meta(&mut self, meta: &Meta) {
        self.opt_string_prop("title", meta.title.as_deref());
        self.opt_string_prop("author", meta.author.as_deref());
        self.opt_string_prop("date", meta.date.as_deref());
        self.opt_string_prop("version", meta.version.as_deref());
        self.opt_string_prop("theme", meta.theme.as_deref());
        self.opt_string_prop("description", meta.description.as_deref());
        if !meta.tags.is_empty() {
            self.raw_prop("tags", string_list(&meta.tags));
        }
    }

    fn slide(&mut self, slide: &Slide) {
        self.opt_string_prop("title", slide.title.as_deref());
        if let Some(layout) = slide.layout {
            self.raw_prop("layout", layout);
        }
        for item in &slide.content {
            match item {
                SlideContent::Text(text) => self.string_prop("content", text),
                SlideContent::Bullets(bullets) => {
                    self.indent(1);
                    self.output.push_str("bullets {\n");
                    for bullet in bullets {
                        self.indent(2);
                        writeln!(self.output, "{};", quoted(bullet)).unwrap();
                    }
                    self.indent(1);
                    self.output.push_str("}\n");
                }
            }
        }
    }

    fn sheet(&mut self, sheet: &Sheet) {
        self.opt_string_prop("name", sheet.name.as_deref());
        if !sheet.cols.is_empty() {
            self.raw_prop("cols", string_list(&sheet.cols));
        }
        for (cell, value) in &sheet.cells {
            self.indent(1);
            let value = match value {
                CellValue::Text(text) => quoted(text),
                CellValue::Number(n) => n.to_string(),
                CellValue::Formula(expr) => quoted(&format!("={}", expr)),
            };
            writeln!(self.output, "{} = {};", cell_key(cell), value).unwrap();
        }
    }

    fn chart(&mut self, chart: &Chart) {
        self.raw_prop("type", chart.chart_type);
        self.string_prop("title", &chart.title);
        if !chart.series.is_empty() {
            self.indent(1);
            self.output.push_str("data: [\n");
            for (i, series) in chart.series.iter().enumerate() {
                self.indent(2);
                write!(
                    self.output,
                    "{{ label: {}; values: {}; }}",
                    quoted(&series.label),
                    number_list(&series.values)
                )
                .unwrap();
                if i + 1 < chart.series.len() {
                    self.output.push(',');
                }
                self.output.push('\n');
            }
            self.indent(1);
            self.output.push_str("];\n");
        }
        if let Some(options) = &chart.options {
            let mut entries = Vec::new();
            if let Some(x_axis) = &options.x_axis {
                entries.push(format!("xAxis: {};", quoted(x_axis)));
            }
            if let Some(y_axis) = &options.y_axis {
                entries.push(format!("yAxis: {};", quoted(y_axis)));
            }
            if let Some(legend) = options.legend {
                entries.push(format!("legend: {};", legend));
            }
            if !options.colors.is_empty() {
                entries.push(format!("colors: {};", string_list(&options.colors)));
            }
            self.indent(1);
            if entries.is_empty() {
                self.output.push_str("options: { };\n");
            } else {
                writeln!(self.output, "options: {{ {} }};", entries.join(" ")).unwrap();
            }
        }
    }

    fn diagram(&mut self, diagram: &Diagram) {
        self.raw_prop("type", diagram.diagram_type);
        self.raw_prop("engine", diagram.engine);
        self.opt_string_prop("title", diagram.title.as_deref());
        self.string_prop("code", &diagram.code);
    }

    fn code(&mut self, code: &CodeBlock) {
        self.string_prop("language", &code.language);
        self.opt_string_prop("caption", code.caption.as_deref());
        if let Some(line_numbers) = code.line_numbers {
            self.raw_prop("lineNumbers", line_numbers);
        }
        if !code.highlight.is_empty() {
            let lines: Vec<String> = code.highlight.iter().map(u32::to_string).collect();
            self.raw_prop("highlight", format!("[{}]", lines.join(", ")));
        }
        self.string_prop("code", &code.code);
    }

    fn table(&mut self, table: &Table) {
        self.opt_string_prop("caption", table.caption.as_deref());
        if let Some(style) = table.style {
            self.raw_prop("style", style);
        }
        if let Some(alignment) = &table.alignment {
            let names: Vec<&str> = alignment.iter().map(|a| a.as_str()).collect();
            self.raw_prop("alignment", format!("[{}]", names.join(", ")));
        }

        self.row(table.header.iter().map(|cell| table_cell(cell)));
        self.row(table.header.iter().map(|_| "---".to_string()));
        for row in &table.rows {
            self.row(row.iter().map(|cell| table_cell(cell)));
        }
    }

    fn row(&mut self, cells: impl Iterator<Item = String>) {
        self.indent(1);
        self.output.push('|');
        for cell in cells {
            write!(self.output, " {} |", cell).unwrap();
        }
        self.output.push('\n');
    }
}

/// `A1` where it reads back to the same cell, `(row,col)` otherwise
fn cell_key(cell: &CellRef) -> String {
    let a1 = cell.to_a1();
    if CellRef::from_a1(&a1) == Ok(*cell) {
        a1
    } else {
        format!("({},{})", cell.row, cell.col)
    }
}

fn string_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quoted(s)).collect();
    format!("[{}]", quoted.join(", "))
}

fn number_list(values: &[f64]) -> String {
    let values: Vec<String> = values.iter().map(f64::to_string).collect();
    format!("[{}]", values.join(", "))
}

/// Serialize a document to canonical OSF text
pub fn serialize(doc: &Document) -> String {
    OsfSerializer::new().serialize(doc)
}

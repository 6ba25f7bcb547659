//! Block-level elements for document structure
//!
//! Every `@kind { ... }` unit of an OSF source maps to one variant of
//! [`Block`]. Each variant owns a struct with named fields, so a chart can
//! never carry sheet properties and an unknown property is rejected by the
//! parser instead of being carried around in a map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cell::{column_letters, CellRef, CellValue};

/// Block-level content element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// Document metadata (`@meta`)
    Meta(Meta),
    /// Narrative content with embedded markup (`@doc`)
    Doc(DocBlock),
    /// A presentation slide (`@slide`)
    Slide(Slide),
    /// Spreadsheet data (`@sheet`)
    Sheet(Sheet),
    /// A chart definition (`@chart`)
    Chart(Chart),
    /// A diagram in an external diagram language (`@diagram`)
    Diagram(Diagram),
    /// A code sample (`@code`)
    Code(CodeBlock),
    /// A pipe table (`@table`)
    Table(Table),
    /// An unresolved include directive (`@include`)
    Include(Include),
}

impl Block {
    /// The kind of this block
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Meta(_) => BlockKind::Meta,
            Block::Doc(_) => BlockKind::Doc,
            Block::Slide(_) => BlockKind::Slide,
            Block::Sheet(_) => BlockKind::Sheet,
            Block::Chart(_) => BlockKind::Chart,
            Block::Diagram(_) => BlockKind::Diagram,
            Block::Code(_) => BlockKind::Code,
            Block::Table(_) => BlockKind::Table,
            Block::Include(_) => BlockKind::Include,
        }
    }
}

/// Error returned when a keyword does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// What was being parsed (e.g. "chart type")
    pub what: &'static str,
    /// The rejected text
    pub value: String,
    /// The accepted spellings
    pub expected: &'static [&'static str],
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid {} '{}' (expected one of: {})",
            self.what,
            self.value,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for UnknownVariant {}

/// Block kind discriminant, used for dispatch and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Meta,
    Doc,
    Slide,
    Sheet,
    Chart,
    Diagram,
    Code,
    Table,
    Include,
}

impl BlockKind {
    const NAMES: &'static [&'static str] = &[
        "meta", "doc", "slide", "sheet", "chart", "diagram", "code", "table", "include",
    ];

    /// The keyword following `@` in the source
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Meta => "meta",
            BlockKind::Doc => "doc",
            BlockKind::Slide => "slide",
            BlockKind::Sheet => "sheet",
            BlockKind::Chart => "chart",
            BlockKind::Diagram => "diagram",
            BlockKind::Code => "code",
            BlockKind::Table => "table",
            BlockKind::Include => "include",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "meta" => BlockKind::Meta,
            "doc" => BlockKind::Doc,
            "slide" => BlockKind::Slide,
            "sheet" => BlockKind::Sheet,
            "chart" => BlockKind::Chart,
            "diagram" => BlockKind::Diagram,
            "code" => BlockKind::Code,
            "table" => BlockKind::Table,
            "include" => BlockKind::Include,
            _ => {
                return Err(UnknownVariant {
                    what: "block type",
                    value: s.to_string(),
                    expected: Self::NAMES,
                })
            }
        })
    }
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Meta {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub version: Option<String>,
    pub theme: Option<String>,
    /// Ordered set of tags; the first occurrence of a duplicate wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub description: Option<String>,
}

impl Meta {
    /// Add a tag unless it is already present
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

/// Narrative content holding lightweight markup
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocBlock {
    pub content: String,
}

/// A presentation slide
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Slide {
    pub title: Option<String>,
    pub layout: Option<SlideLayout>,
    /// Content in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<SlideContent>,
}

/// One entry of slide content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideContent {
    /// A line of text (`content: "...";`)
    Text(String),
    /// A bullet group (`bullets { "..."; }`)
    Bullets(Vec<String>),
}

/// Slide layout variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideLayout {
    TitleSlide,
    TitleAndContent,
    TitleAndBullets,
    TwoColumn,
    Blank,
}

impl SlideLayout {
    const NAMES: &'static [&'static str] = &[
        "TitleSlide",
        "TitleAndContent",
        "TitleAndBullets",
        "TwoColumn",
        "Blank",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlideLayout::TitleSlide => "TitleSlide",
            SlideLayout::TitleAndContent => "TitleAndContent",
            SlideLayout::TitleAndBullets => "TitleAndBullets",
            SlideLayout::TwoColumn => "TwoColumn",
            SlideLayout::Blank => "Blank",
        }
    }
}

impl fmt::Display for SlideLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlideLayout {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "TitleSlide" => SlideLayout::TitleSlide,
            "TitleAndContent" => SlideLayout::TitleAndContent,
            "TitleAndBullets" => SlideLayout::TitleAndBullets,
            "TwoColumn" => SlideLayout::TwoColumn,
            "Blank" => SlideLayout::Blank,
            _ => {
                return Err(UnknownVariant {
                    what: "slide layout",
                    value: s.to_string(),
                    expected: Self::NAMES,
                })
            }
        })
    }
}

/// Spreadsheet data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: Option<String>,
    /// Column labels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cols: Vec<String>,
    /// Cells keyed by 1-based (row, col); ordered row-major
    #[serde(default)]
    pub cells: BTreeMap<CellRef, CellValue>,
}

impl Sheet {
    /// Look up a cell
    pub fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&CellRef::new(row, col))
    }

    /// Assign a cell, replacing any previous value
    pub fn set(&mut self, cell: CellRef, value: CellValue) -> Option<CellValue> {
        self.cells.insert(cell, value)
    }
    /// Header label for a 1-based column: the declared label, else its letters
    pub fn column_label(&self, col: u32) -> String {
        (col as usize)
            .checked_sub(1)
            .and_then(|i| self.cols.get(i))
            .cloned()
            .unwrap_or_else(|| column_letters(col))
    }
}

/// A chart definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub chart_type: ChartType,
    pub title: String,
    #[serde(default)]
    pub series: Vec<ChartSeries>,
    pub options: Option<ChartOptions>,
}

/// A labelled series of values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// Optional chart presentation hints
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartOptions {
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub legend: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
}

/// Chart type variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Area,
}

impl ChartType {
    const NAMES: &'static [&'static str] = &["bar", "line", "pie", "scatter", "area"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Area => "area",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bar" => ChartType::Bar,
            "line" => ChartType::Line,
            "pie" => ChartType::Pie,
            "scatter" => ChartType::Scatter,
            "area" => ChartType::Area,
            _ => {
                return Err(UnknownVariant {
                    what: "chart type",
                    value: s.to_string(),
                    expected: Self::NAMES,
                })
            }
        })
    }
}

/// A diagram; the source is opaque and passed through verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub diagram_type: DiagramType,
    pub engine: DiagramEngine,
    pub title: Option<String>,
    pub code: String,
}

/// Diagram type variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    Flowchart,
    Sequence,
    Gantt,
    Mindmap,
}

impl DiagramType {
    const NAMES: &'static [&'static str] = &["flowchart", "sequence", "gantt", "mindmap"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramType::Flowchart => "flowchart",
            DiagramType::Sequence => "sequence",
            DiagramType::Gantt => "gantt",
            DiagramType::Mindmap => "mindmap",
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "flowchart" => DiagramType::Flowchart,
            "sequence" => DiagramType::Sequence,
            "gantt" => DiagramType::Gantt,
            "mindmap" => DiagramType::Mindmap,
            _ => {
                return Err(UnknownVariant {
                    what: "diagram type",
                    value: s.to_string(),
                    expected: Self::NAMES,
                })
            }
        })
    }
}

/// Diagram rendering engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramEngine {
    #[default]
    Mermaid,
    Graphviz,
}

impl DiagramEngine {
    const NAMES: &'static [&'static str] = &["mermaid", "graphviz"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramEngine::Mermaid => "mermaid",
            DiagramEngine::Graphviz => "graphviz",
        }
    }
}

impl fmt::Display for DiagramEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramEngine {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "mermaid" => DiagramEngine::Mermaid,
            "graphviz" => DiagramEngine::Graphviz,
            _ => {
                return Err(UnknownVariant {
                    what: "diagram engine",
                    value: s.to_string(),
                    expected: Self::NAMES,
                })
            }
        })
    }
}

/// A code sample
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language identifier for highlighting
    pub language: String,
    /// The code text
    pub code: String,
    pub caption: Option<String>,
    pub line_numbers: Option<bool>,
    /// 1-based line numbers to highlight
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlight: Vec<u32>,
}

/// A table written in Markdown pipe syntax
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub caption: Option<String>,
    pub style: Option<TableStyle>,
    /// Per-column alignment; one entry per header cell when present
    pub alignment: Option<Vec<Alignment>>,
    /// Header cells
    pub header: Vec<String>,
    /// Data rows
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Number of columns, as defined by the header
    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

/// Table style variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    Bordered,
    Striped,
    Minimal,
}

impl TableStyle {
    const NAMES: &'static [&'static str] = &["bordered", "striped", "minimal"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableStyle::Bordered => "bordered",
            TableStyle::Striped => "striped",
            TableStyle::Minimal => "minimal",
        }
    }
}

impl fmt::Display for TableStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableStyle {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bordered" => TableStyle::Bordered,
            "striped" => TableStyle::Striped,
            "minimal" => TableStyle::Minimal,
            _ => {
                return Err(UnknownVariant {
                    what: "table style",
                    value: s.to_string(),
                    expected: Self::NAMES,
                })
            }
        })
    }
}

/// Text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    const NAMES: &'static [&'static str] = &["left", "center", "right"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "left" => Alignment::Left,
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            _ => {
                return Err(UnknownVariant {
                    what: "alignment",
                    value: s.to_string(),
                    expected: Self::NAMES,
                })
            }
        })
    }
}

/// An include directive awaiting resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Include {
    /// Path relative to the including file's directory
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind_roundtrip() {
        for name in BlockKind::NAMES {
            let kind: BlockKind = name.parse().unwrap();
            assert_eq!(kind.as_str(), *name);
        }
    }

    #[test]
    fn test_unknown_chart_type() {
        let err = "donut".parse::<ChartType>().unwrap_err();
        assert_eq!(err.what, "chart type");
        assert!(err.to_string().contains("donut"));
        assert!(err.to_string().contains("scatter"));
    }

    #[test]
    fn test_layouts_are_case_sensitive() {
        assert_eq!(
            "TitleAndBullets".parse::<SlideLayout>(),
            Ok(SlideLayout::TitleAndBullets)
        );
        assert!("titleandbullets".parse::<SlideLayout>().is_err());
    }

    #[test]
    fn test_meta_tags_are_a_set() {
        let mut meta = Meta::default();
        meta.add_tag("q4");
        meta.add_tag("finance");
        meta.add_tag("q4");
        assert_eq!(meta.tags, vec!["q4", "finance"]);
    }

    #[test]
    fn test_sheet_last_write_wins() {
        let mut sheet = Sheet::default();
        sheet.set(CellRef::new(1, 1), CellValue::Number(1.0));
        let previous = sheet.set(CellRef::new(1, 1), CellValue::Text("x".into()));
        assert_eq!(previous, Some(CellValue::Number(1.0)));
        assert_eq!(sheet.cell(1, 1), Some(&CellValue::Text("x".into())));
    }

    #[test]
    fn test_column_label() {
        let sheet = Sheet {
            cols: vec!["Item".into()],
            ..Default::default()
        };
        assert_eq!(sheet.column_label(1), "Item");
        assert_eq!(sheet.column_label(2), "B");
        assert_eq!(sheet.column_label(0), "");
    }

    #[test]
    fn test_block_json_tag() {
        let block = Block::Include(Include {
            path: "./a.osf".into(),
        });
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"type\":\"include\""));
        assert_eq!(block.kind(), BlockKind::Include);
    }
}

//! Per-kind block builders
//!
//! The body parser produces a flat list of statements; each builder here
//! accepts exactly the properties its block kind defines and rejects the
//! rest, naming the block in the error.

use std::collections::HashSet;

use osf_ast::{
    Block, BlockKind, CellValue, Chart, ChartOptions, ChartSeries, CodeBlock,
    Diagram, DocBlock, Include, Meta, Sheet, Slide, SlideContent, Table,
};

use crate::error::{OsfError, Position, Result};
use crate::markup::{separator_alignment, split_row};

use super::value::{Context, Spanned, Value};
use super::Statement;

/// Build a typed block from its statements
pub(super) fn build(kind: BlockKind, statements: Vec<Statement>, open: Position) -> Result<Block> {
    match kind {
        BlockKind::Meta => meta(statements),
        BlockKind::Doc => doc(statements),
        BlockKind::Slide => slide(statements),
        BlockKind::Sheet => sheet(statements),
        BlockKind::Chart => chart(statements, open),
        BlockKind::Diagram => diagram(statements, open),
        BlockKind::Code => code(statements, open),
        BlockKind::Table => table(statements, open),
        BlockKind::Include => include(statements, open),
    }
}

/// Tracks properties that may appear only once
struct Seen {
    kind: BlockKind,
    keys: HashSet<String>,
}

impl Seen {
    fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            keys: HashSet::new(),
        }
    }

    fn once(&mut self, key: &Spanned<String>) -> Result<()> {
        if self.keys.insert(key.node.clone()) {
            Ok(())
        } else {
            Err(OsfError::parse_in(
                self.kind,
                format!("Duplicate property '{}' in block {}", key.node, self.kind),
                key.pos,
            ))
        }
    }

    fn require(&self, key: &str, open: Position) -> Result<()> {
        if self.keys.contains(key) {
            Ok(())
        } else {
            Err(OsfError::parse_in(
                self.kind,
                format!("Block {} requires property '{}'", self.kind, key),
                open,
            ))
        }
    }
}

fn unknown_property(kind: BlockKind, key: &Spanned<String>) -> OsfError {
    OsfError::parse_in(
        kind,
        format!("Unknown property '{}' for block {}", key.node, kind),
        key.pos,
    )
}

fn statement_pos(statement: &Statement) -> Position {
    match statement {
        Statement::Property { key, .. } | Statement::Group { key, .. } => key.pos,
        Statement::Item(value) => value.pos,
        Statement::Cell { cell, .. } => cell.pos,
        Statement::Row { pos, .. } => *pos,
    }
}

fn unexpected(kind: BlockKind, statement: &Statement) -> OsfError {
    let what = match statement {
        Statement::Property { .. } => "property",
        Statement::Group { key, .. } => {
            return OsfError::parse_in(
                kind,
                format!("Unknown group '{}' for block {}", key.node, kind),
                key.pos,
            )
        }
        Statement::Item(_) => "bare value",
        Statement::Cell { .. } => "cell assignment",
        Statement::Row { .. } => "table row",
    };
    OsfError::parse_in(
        kind,
        format!("Unexpected {} in block {}", what, kind),
        statement_pos(statement),
    )
}

/// Accept only `key: value;` statements
fn property(kind: BlockKind, statement: Statement) -> Result<(Spanned<String>, Spanned<Value>)> {
    match statement {
        Statement::Property { key, value } => Ok((key, value)),
        other => Err(unexpected(kind, &other)),
    }
}

fn meta(statements: Vec<Statement>) -> Result<Block> {
    let kind = BlockKind::Meta;
    let mut meta = Meta::default();
    let mut seen = Seen::new(kind);

    for statement in statements {
        let (key, value) = property(kind, statement)?;
        seen.once(&key)?;
        let cx = Context { block: kind, key: &key.node };
        match key.node.as_str() {
            "title" => meta.title = Some(value.into_string(cx)?),
            "author" => meta.author = Some(value.into_string(cx)?),
            "date" => meta.date = Some(value.into_string(cx)?),
            "version" => meta.version = Some(value.into_string(cx)?),
            "theme" => meta.theme = Some(value.into_name(cx)?),
            "description" => meta.description = Some(value.into_string(cx)?),
            "tags" => {
                for tag in value.into_string_list(cx)? {
                    meta.add_tag(tag);
                }
            }
            _ => return Err(unknown_property(kind, &key)),
        }
    }

    Ok(Block::Meta(meta))
}

fn doc(statements: Vec<Statement>) -> Result<Block> {
    let kind = BlockKind::Doc;
    let mut doc = DocBlock::default();
    let mut seen = Seen::new(kind);

    for statement in statements {
        let (key, value) = property(kind, statement)?;
        seen.once(&key)?;
        match key.node.as_str() {
            "content" => doc.content = value.into_string(Context { block: kind, key: "content" })?,
            _ => return Err(unknown_property(kind, &key)),
        }
    }

    Ok(Block::Doc(doc))
}

fn slide(statements: Vec<Statement>) -> Result<Block> {
    let kind = BlockKind::Slide;
    let mut slide = Slide::default();
    let mut seen = Seen::new(kind);

    for statement in statements {
        match statement {
            Statement::Group { key, items } if key.node == "bullets" => {
                let cx = Context { block: kind, key: "bullets" };
                let bullets = items
                    .into_iter()
                    .map(|item| match item {
                        Statement::Item(value) => value.into_string(cx),
                        other => Err(unexpected(kind, &other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                slide.content.push(SlideContent::Bullets(bullets));
            }
            other => {
                let (key, value) = property(kind, other)?;
                let cx = Context { block: kind, key: &key.node };
                match key.node.as_str() {
                    "content" => slide.content.push(SlideContent::Text(value.into_string(cx)?)),
                    "title" => {
                        seen.once(&key)?;
                        slide.title = Some(value.into_string(cx)?);
                    }
                    "layout" => {
                        seen.once(&key)?;
                        slide.layout = Some(value.into_keyword(cx)?);
                    }
                    _ => return Err(unknown_property(kind, &key)),
                }
            }
        }
    }

    Ok(Block::Slide(slide))
}

fn sheet(statements: Vec<Statement>) -> Result<Block> {
    let kind = BlockKind::Sheet;
    let mut sheet = Sheet::default();
    let mut seen = Seen::new(kind);

    for statement in statements {
        match statement {
            Statement::Cell { cell, value, formula } => {
                sheet.set(cell.node, cell_value(cell.node, value, formula)?);
            }
            Statement::Group { key, items } if key.node == "data" => {
                for item in items {
                    match item {
                        Statement::Cell { cell, value, formula } => {
                            sheet.set(cell.node, cell_value(cell.node, value, formula)?);
                        }
                        other => return Err(unexpected(kind, &other)),
                    }
                }
            }
            other => {
                let (key, value) = property(kind, other)?;
                seen.once(&key)?;
                let cx = Context { block: kind, key: &key.node };
                match key.node.as_str() {
                    "name" => sheet.name = Some(value.into_string(cx)?),
                    "cols" => sheet.cols = value.into_name_list(cx)?,
                    _ => return Err(unknown_property(kind, &key)),
                }
            }
        }
    }

    Ok(Block::Sheet(sheet))
}

/// Convert an assigned value; later assignments to the same cell replace
/// earlier ones
fn cell_value(cell: osf_ast::CellRef, value: Spanned<Value>, formula: bool) -> Result<CellValue> {
    match value.node {
        Value::Str(text) if formula => match text.strip_prefix('=') {
            Some(expr) => Ok(CellValue::Formula(expr.to_string())),
            None => Err(OsfError::parse_in(
                BlockKind::Sheet,
                format!("Formula for cell {} must start with '='", cell),
                value.pos,
            )),
        },
        Value::Str(text) => Ok(CellValue::from_text(text)),
        Value::Number(n) if !formula => Ok(CellValue::Number(n)),
        _ => Err(OsfError::parse_in(
            BlockKind::Sheet,
            format!("Cell {} expects a string or number value", cell),
            value.pos,
        )),
    }
}

fn chart(statements: Vec<Statement>, open: Position) -> Result<Block> {
    let kind = BlockKind::Chart;
    let mut seen = Seen::new(kind);
    let mut chart_type = None;
    let mut title = None;
    let mut series = Vec::new();
    let mut options = None;

    for statement in statements {
        let (key, value) = property(kind, statement)?;
        seen.once(&key)?;
        let cx = Context { block: kind, key: &key.node };
        match key.node.as_str() {
            "type" => chart_type = Some(value.into_keyword(cx)?),
            "title" => title = Some(value.into_string(cx)?),
            "data" => {
                series = value
                    .into_list(cx)?
                    .into_iter()
                    .map(chart_series)
                    .collect::<Result<Vec<_>>>()?
            }
            "options" => options = Some(chart_options(value)?),
            _ => return Err(unknown_property(kind, &key)),
        }
    }

    seen.require("type", open)?;
    seen.require("title", open)?;
    match (chart_type, title) {
        (Some(chart_type), Some(title)) => Ok(Block::Chart(Chart {
            chart_type,
            title,
            series,
            options,
        })),
        _ => Err(OsfError::parse_in(kind, "Block chart requires 'type' and 'title'", open)),
    }
}

/// `{ label: "..."; values: [...]; }`
fn chart_series(value: Spanned<Value>) -> Result<ChartSeries> {
    let kind = BlockKind::Chart;
    let pos = value.pos;
    let mut series = ChartSeries::default();
    let mut has_label = false;

    for (key, value) in value.into_object(Context { block: kind, key: "data" })? {
        let cx = Context { block: kind, key: &key.node };
        match key.node.as_str() {
            "label" => {
                series.label = value.into_string(cx)?;
                has_label = true;
            }
            "values" => {
                series.values = value
                    .into_list(cx)?
                    .into_iter()
                    .map(|v| v.into_number(cx))
                    .collect::<Result<Vec<_>>>()?
            }
            _ => {
                return Err(OsfError::parse_in(
                    kind,
                    format!("Unknown series field '{}' for block chart", key.node),
                    key.pos,
                ))
            }
        }
    }

    if !has_label {
        return Err(OsfError::parse_in(kind, "Chart series requires a 'label'", pos));
    }
    Ok(series)
}

/// `{ xAxis: "..."; yAxis: "..."; legend: true; colors: [...]; }`
fn chart_options(value: Spanned<Value>) -> Result<ChartOptions> {
    let kind = BlockKind::Chart;
    let mut options = ChartOptions::default();

    for (key, value) in value.into_object(Context { block: kind, key: "options" })? {
        let cx = Context { block: kind, key: &key.node };
        match key.node.as_str() {
            "xAxis" => options.x_axis = Some(value.into_string(cx)?),
            "yAxis" => options.y_axis = Some(value.into_string(cx)?),
            "legend" => options.legend = Some(value.into_bool(cx)?),
            "colors" => options.colors = value.into_string_list(cx)?,
            _ => {
                return Err(OsfError::parse_in(
                    kind,
                    format!("Unknown chart option '{}'", key.node),
                    key.pos,
                ))
            }
        }
    }

    Ok(options)
}

fn diagram(statements: Vec<Statement>, open: Position) -> Result<Block> {
    let kind = BlockKind::Diagram;
    let mut seen = Seen::new(kind);
    let mut diagram_type = None;
    let mut engine = None;
    let mut title = None;
    let mut code = None;

    for statement in statements {
        let (key, value) = property(kind, statement)?;
        seen.once(&key)?;
        let cx = Context { block: kind, key: &key.node };
        match key.node.as_str() {
            "type" => diagram_type = Some(value.into_keyword(cx)?),
            "engine" => engine = Some(value.into_keyword(cx)?),
            "title" => title = Some(value.into_string(cx)?),
            "code" => code = Some(value.into_string(cx)?),
            _ => return Err(unknown_property(kind, &key)),
        }
    }

    seen.require("type", open)?;
    seen.require("code", open)?;
    match (diagram_type, code) {
        (Some(diagram_type), Some(code)) => Ok(Block::Diagram(Diagram {
            diagram_type,
            engine: engine.unwrap_or_default(),
            title,
            code,
        })),
        _ => Err(OsfError::parse_in(kind, "Block diagram requires 'type' and 'code'", open)),
    }
}

fn code(statements: Vec<Statement>, open: Position) -> Result<Block> {
    let kind = BlockKind::Code;
    let mut seen = Seen::new(kind);
    let mut block = CodeBlock::default();

    for statement in statements {
        let (key, value) = property(kind, statement)?;
        seen.once(&key)?;
        let cx = Context { block: kind, key: &key.node };
        match key.node.as_str() {
            "language" => block.language = value.into_string(cx)?,
            "code" => block.code = value.into_string(cx)?,
            "caption" => block.caption = Some(value.into_string(cx)?),
            "lineNumbers" => block.line_numbers = Some(value.into_bool(cx)?),
            "highlight" => {
                block.highlight = value
                    .into_list(cx)?
                    .into_iter()
                    .map(|line| line.into_positive(cx))
                    .collect::<Result<Vec<_>>>()?
            }
            _ => return Err(unknown_property(kind, &key)),
        }
    }

    seen.require("language", open)?;
    seen.require("code", open)?;
    Ok(Block::Code(block))
}

fn table(statements: Vec<Statement>, open: Position) -> Result<Block> {
    let kind = BlockKind::Table;
    let mut seen = Seen::new(kind);
    let mut table = Table::default();
    let mut rows = Vec::new();

    for statement in statements {
        let (key, value) = match statement {
            Statement::Row { text, pos } => {
                rows.push((split_row(&text), pos));
                continue;
            }
            other => property(kind, other)?,
        };
        seen.once(&key)?;
        let cx = Context { block: kind, key: &key.node };
        match key.node.as_str() {
            "caption" => table.caption = Some(value.into_string(cx)?),
            "style" => table.style = Some(value.into_keyword(cx)?),
            "alignment" => {
                table.alignment = Some(
                    value
                        .into_list(cx)?
                        .into_iter()
                        .map(|entry| entry.into_keyword(cx))
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            _ => return Err(unknown_property(kind, &key)),
        }
    }

    let mut rows = rows.into_iter();
    let Some((header, _)) = rows.next() else {
        return Err(OsfError::parse_in(kind, "Table is missing its header row", open));
    };
    let Some((separator, separator_pos)) = rows.next() else {
        return Err(OsfError::parse_in(
            kind,
            "Table is missing the '---' separator row after the header",
            open,
        ));
    };

    let derived = separator_alignment(&separator).ok_or_else(|| {
        OsfError::parse_in(
            kind,
            "Table separator row must hold '---' for each column",
            separator_pos,
        )
    })?;
    if derived.len() != header.len() {
        return Err(OsfError::parse_in(
            kind,
            format!(
                "Table separator has {} columns but the header has {}",
                derived.len(),
                header.len()
            ),
            separator_pos,
        ));
    }
    if table.alignment.is_none() && separator.iter().any(|cell| cell.contains(':')) {
        table.alignment = Some(derived);
    }

    table.header = header;
    table.rows = rows.map(|(cells, _)| cells).collect();
    Ok(Block::Table(table))
}

fn include(statements: Vec<Statement>, open: Position) -> Result<Block> {
    let kind = BlockKind::Include;
    let mut seen = Seen::new(kind);
    let mut path = None;

    for statement in statements {
        let (key, value) = property(kind, statement)?;
        seen.once(&key)?;
        match key.node.as_str() {
            "path" => path = Some(value.into_string(Context { block: kind, key: "path" })?),
            _ => return Err(unknown_property(kind, &key)),
        }
    }

    seen.require("path", open)?;
    match path {
        Some(path) => Ok(Block::Include(Include { path })),
        None => Err(OsfError::parse_in(kind, "Block include requires 'path'", open)),
    }
}

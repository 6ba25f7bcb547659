//! HTML projection of a document
//!
//! Every user-supplied string is entity-escaped before it reaches the
//! output. `@doc` content goes through [`crate::markup`]; diagram and code
//! sources only ever appear inside `<pre><code>`.

use std::collections::BTreeSet;
use std::fmt::Write;

use osf_ast::{
    Alignment, Block, CellValue, Chart, CodeBlock, Diagram, Document, Meta, Sheet, Slide,
    SlideContent, Table,
};

use crate::markup::{render_inline, render_markup};

/// Escape `& < > " '` for use in text and attribute values
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// HTML renderer for OSF documents
#[derive(Debug, Default)]
pub struct HtmlRenderer {
    output: String,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the document body as an HTML fragment
    pub fn render(mut self, doc: &Document) -> String {
        for block in &doc.blocks {
            self.render_block(block);
        }
        self.output
    }

    /// Render a self-contained HTML page
    pub fn render_page(self, doc: &Document) -> String {
        let title = doc
            .meta()
            .and_then(|meta| meta.title.as_deref())
            .unwrap_or("OSF Document");
        let title = escape_html(title);
        let body = self.render(doc);

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 960px;
            margin: 0 auto;
            padding: 2rem;
        }}
        table {{ border-collapse: collapse; margin: 1rem 0; }}
        th, td {{ border: 1px solid #dee2e6; padding: 0.4rem 0.8rem; }}
        th {{ background: #f8f9fa; }}
        .osf-table-striped tbody tr:nth-child(even) {{ background: #f8f9fa; }}
        .osf-slide {{
            border: 1px solid #dee2e6;
            border-radius: 8px;
            padding: 1.5rem;
            margin: 2rem 0;
        }}
        pre {{ background: #f4f4f4; padding: 1rem; overflow-x: auto; }}
        .osf-formula {{ font-family: monospace; color: #6c757d; }}
        figcaption {{ font-weight: bold; margin-bottom: 0.5rem; }}
    </style>
</head>
<body>
{body}</body>
</html>
"#
        )
    }

    fn render_block(&mut self, block: &Block) {
        match block {
            Block::Meta(meta) => self.meta(meta),
            Block::Doc(doc) => {
                self.output.push_str("<section class=\"osf-doc\">\n");
                self.output.push_str(&render_markup(&doc.content));
                self.output.push_str("</section>\n");
            }
            Block::Slide(slide) => self.slide(slide),
            Block::Sheet(sheet) => self.sheet(sheet),
            Block::Chart(chart) => self.chart(chart),
            Block::Diagram(diagram) => self.diagram(diagram),
            Block::Code(code) => self.code(code),
            Block::Table(table) => self.table(table),
            Block::Include(include) => {
                writeln!(
                    self.output,
                    "<div class=\"osf-include\" data-path=\"{}\"></div>",
                    escape_html(&include.path)
                )
                .unwrap();
            }
        }
    }

    fn meta(&mut self, meta: &Meta) {
        self.output.push_str("<header class=\"osf-meta\">\n");
        if let Some(title) = &meta.title {
            writeln!(self.output, "<h1>{}</h1>", escape_html(title)).unwrap();
        }
        for (class, value) in [
            ("osf-author", &meta.author),
            ("osf-date", &meta.date),
            ("osf-version", &meta.version),
            ("osf-description", &meta.description),
        ] {
            if let Some(value) = value {
                writeln!(self.output, "<p class=\"{}\">{}</p>", class, escape_html(value)).unwrap();
            }
        }
        if !meta.tags.is_empty() {
            self.output.push_str("<ul class=\"osf-tags\">");
            for tag in &meta.tags {
                write!(self.output, "<li>{}</li>", escape_html(tag)).unwrap();
            }
            self.output.push_str("</ul>\n");
        }
        self.output.push_str("</header>\n");
    }

    fn slide(&mut self, slide: &Slide) {
        match slide.layout {
            Some(layout) => writeln!(
                self.output,
                "<section class=\"osf-slide\" data-layout=\"{}\">",
                layout
            )
            .unwrap(),
            None => self.output.push_str("<section class=\"osf-slide\">\n"),
        }
        if let Some(title) = &slide.title {
            writeln!(self.output, "<h2>{}</h2>", escape_html(title)).unwrap();
        }
        for content in &slide.content {
            match content {
                SlideContent::Text(text) => {
                    writeln!(self.output, "<p>{}</p>", render_inline(text)).unwrap();
                }
                SlideContent::Bullets(items) => {
                    self.output.push_str("<ul>\n");
                    for item in items {
                        writeln!(self.output, "<li>{}</li>", render_inline(item)).unwrap();
                    }
                    self.output.push_str("</ul>\n");
                }
            }
        }
        self.output.push_str("</section>\n");
    }

    /// Only occupied rows and columns are emitted, so sparse far-away
    /// cells do not blow up the grid.
    fn sheet(&mut self, sheet: &Sheet) {
        let rows: BTreeSet<u32> = sheet.cells.keys().map(|cell| cell.row).collect();
        let mut cols: BTreeSet<u32> = sheet.cells.keys().map(|cell| cell.col).collect();
        cols.extend(1..=sheet.cols.len() as u32);

        self.output.push_str("<table class=\"osf-sheet\">\n");
        if let Some(name) = &sheet.name {
            writeln!(self.output, "<caption>{}</caption>", escape_html(name)).unwrap();
        }
        self.output.push_str("<thead>\n<tr><th></th>");
        for &col in &cols {
            let label = sheet.column_label(col);
            write!(self.output, "<th>{}</th>", escape_html(&label)).unwrap();
        }
        self.output.push_str("</tr>\n</thead>\n<tbody>\n");
        for &row in &rows {
            write!(self.output, "<tr><th>{}</th>", row).unwrap();
            for &col in &cols {
                match sheet.cell(row, col) {
                    Some(CellValue::Text(text)) => {
                        write!(self.output, "<td>{}</td>", escape_html(text)).unwrap()
                    }
                    Some(CellValue::Number(n)) => {
                        write!(self.output, "<td class=\"osf-number\">{}</td>", n).unwrap()
                    }
                    Some(CellValue::Formula(expr)) => {
                        let expr = escape_html(expr);
                        write!(
                            self.output,
                            "<td class=\"osf-formula\" data-formula=\"={0}\">={0}</td>",
                            expr
                        )
                        .unwrap()
                    }
                    None => self.output.push_str("<td></td>"),
                }
            }
            self.output.push_str("</tr>\n");
        }
        self.output.push_str("</tbody>\n</table>\n");
    }

    fn chart(&mut self, chart: &Chart) {
        writeln!(
            self.output,
            "<figure class=\"osf-chart\" data-type=\"{}\">",
            chart.chart_type
        )
        .unwrap();
        writeln!(self.output, "<figcaption>{}</figcaption>", escape_html(&chart.title)).unwrap();

        let width = chart.series.iter().map(|s| s.values.len()).max().unwrap_or(0);
        self.output.push_str("<table>\n<thead>\n<tr><th>");
        if let Some(x_axis) = chart.options.as_ref().and_then(|o| o.x_axis.as_ref()) {
            self.output.push_str(&escape_html(x_axis));
        }
        self.output.push_str("</th>");
        for i in 1..=width {
            write!(self.output, "<th>{}</th>", i).unwrap();
        }
        self.output.push_str("</tr>\n</thead>\n<tbody>\n");
        for series in &chart.series {
            write!(self.output, "<tr><th>{}</th>", escape_html(&series.label)).unwrap();
            for value in &series.values {
                write!(self.output, "<td>{}</td>", value).unwrap();
            }
            self.output.push_str("</tr>\n");
        }
        self.output.push_str("</tbody>\n</table>\n</figure>\n");
    }

    fn diagram(&mut self, diagram: &Diagram) {
        writeln!(
            self.output,
            "<figure class=\"osf-diagram\" data-type=\"{}\" data-engine=\"{}\">",
            diagram.diagram_type, diagram.engine
        )
        .unwrap();
        if let Some(title) = &diagram.title {
            writeln!(self.output, "<figcaption>{}</figcaption>", escape_html(title)).unwrap();
        }
        writeln!(
            self.output,
            "<pre><code class=\"language-{}\">{}</code></pre>",
            diagram.engine,
            escape_html(&diagram.code)
        )
        .unwrap();
        self.output.push_str("</figure>\n");
    }

    fn code(&mut self, code: &CodeBlock) {
        self.output.push_str("<figure class=\"osf-code\">\n");
        if let Some(caption) = &code.caption {
            writeln!(self.output, "<figcaption>{}</figcaption>", escape_html(caption)).unwrap();
        }
        write!(
            self.output,
            "<pre><code class=\"language-{}\"",
            escape_html(&code.language)
        )
        .unwrap();
        if code.line_numbers == Some(true) {
            self.output.push_str(" data-line-numbers=\"true\"");
        }
        if !code.highlight.is_empty() {
            let lines: Vec<String> = code.highlight.iter().map(u32::to_string).collect();
            write!(self.output, " data-highlight=\"{}\"", lines.join(",")).unwrap();
        }
        writeln!(self.output, ">{}</code></pre>", escape_html(&code.code)).unwrap();
        self.output.push_str("</figure>\n");
    }

    fn table(&mut self, table: &Table) {
        let class = match table.style {
            None => "osf-table".to_string(),
            Some(style) => format!("osf-table osf-table-{}", style),
        };
        writeln!(self.output, "<table class=\"{}\">", class).unwrap();
        if let Some(caption) = &table.caption {
            writeln!(self.output, "<caption>{}</caption>", escape_html(caption)).unwrap();
        }

        let align = |i: usize| match table.alignment.as_ref().and_then(|a| a.get(i)) {
            Some(Alignment::Center) => " style=\"text-align: center\"",
            Some(Alignment::Right) => " style=\"text-align: right\"",
            Some(Alignment::Left) => " style=\"text-align: left\"",
            None => "",
        };

        self.output.push_str("<thead>\n<tr>");
        for (i, cell) in table.header.iter().enumerate() {
            write!(self.output, "<th{}>{}</th>", align(i), escape_html(cell)).unwrap();
        }
        self.output.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in &table.rows {
            self.output.push_str("<tr>");
            for (i, cell) in row.iter().enumerate() {
                write!(self.output, "<td{}>{}</td>", align(i), escape_html(cell)).unwrap();
            }
            self.output.push_str("</tr>\n");
        }
        self.output.push_str("</tbody>\n</table>\n");
    }
}

/// Render a document as an HTML fragment
pub fn render_html(doc: &Document) -> String {
    HtmlRenderer::new().render(doc)
}

/// Render a document as a standalone HTML page
pub fn render_page(doc: &Document) -> String {
    HtmlRenderer::new().render_page(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_html_escape() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("\"quoted\""), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#39;s");
    }

    #[test]
    fn test_meta_header() {
        let doc = parse(r#"@meta { title: "Q3 <Review>"; author: "Ann"; tags: ["a", "b"]; }"#)
            .unwrap();
        let html = render_html(&doc);
        assert!(html.contains("<h1>Q3 &lt;Review&gt;</h1>"));
        assert!(html.contains("<p class=\"osf-author\">Ann</p>"));
        assert!(html.contains("<ul class=\"osf-tags\"><li>a</li><li>b</li></ul>"));
    }

    #[test]
    fn test_slide() {
        let doc = parse(
            r#"@slide {
  title: "Plan";
  layout: TitleAndBullets;
  bullets { "**Ship** it"; "<b>"; }
}"#,
        )
        .unwrap();
        let html = render_html(&doc);
        assert!(html.contains("<section class=\"osf-slide\" data-layout=\"TitleAndBullets\">"));
        assert!(html.contains("<li><strong>Ship</strong> it</li>"));
        assert!(html.contains("<li>&lt;b&gt;</li>"));
    }

    #[test]
    fn test_sheet_grid() {
        let doc = parse(
            r#"@sheet {
  name: "Q";
  cols: ["Item", "Price"];
  A1 = "Pen";
  B1 = 1.5;
  C2 = "=A1&B1";
}"#,
        )
        .unwrap();
        let html = render_html(&doc);
        assert!(html.contains("<tr><th></th><th>Item</th><th>Price</th><th>C</th></tr>"));
        assert!(html.contains("<tr><th>1</th><td>Pen</td><td class=\"osf-number\">1.5</td><td></td></tr>"));
        assert!(html.contains("data-formula=\"=A1&amp;B1\""));
    }

    #[test]
    fn test_sheet_with_zero_column_does_not_panic() {
        let mut sheet = Sheet::default();
        sheet.set(osf_ast::CellRef::new(1, 0), CellValue::Number(1.0));
        let mut doc = Document::new();
        doc.blocks.push(Block::Sheet(sheet));
        let html = render_html(&doc);
        assert!(html.contains("<tr><th></th><th></th></tr>"));
    }

    #[test]
    fn test_sparse_sheet_stays_small() {
        let doc = parse("@sheet { (1, 1) = 1; (100000, 5000) = 2; }").unwrap();
        let html = render_html(&doc);
        assert_eq!(html.matches("<tr>").count(), 3);
    }

    #[test]
    fn test_code_is_escaped() {
        let doc = parse(
            r#"@code {
  language: "html";
  highlight: [2];
  code: "<script>alert('x')</script>";
}"#,
        )
        .unwrap();
        let html = render_html(&doc);
        assert!(html.contains(
            "<pre><code class=\"language-html\" data-highlight=\"2\">&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;</code></pre>"
        ));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_diagram_is_preformatted() {
        let doc = parse(
            r#"@diagram { type: "flowchart"; title: "Flow"; code: "A --> B<br>"; }"#,
        )
        .unwrap();
        let html = render_html(&doc);
        assert!(html.contains("data-engine=\"mermaid\""));
        assert!(html.contains("<pre><code class=\"language-mermaid\">A --&gt; B&lt;br&gt;</code></pre>"));
    }

    #[test]
    fn test_table_alignment_and_style() {
        let doc = parse(
            "@table {\n  style: striped;\n  alignment: [left, right];\n  | Name | Qty |\n  | --- | --- |\n  | <i> | 3 |\n}",
        )
        .unwrap();
        let html = render_html(&doc);
        assert!(html.contains("<table class=\"osf-table osf-table-striped\">"));
        assert!(html.contains("<th style=\"text-align: left\">Name</th><th style=\"text-align: right\">Qty</th>"));
        assert!(html.contains("<td style=\"text-align: left\">&lt;i&gt;</td>"));
    }

    #[test]
    fn test_unstyled_table_class() {
        let doc = parse("@table {\n  | A |\n  | --- |\n  | 1 |\n}").unwrap();
        assert!(render_html(&doc).contains("<table class=\"osf-table\">"));
    }

    #[test]
    fn test_doc_markup() {
        let doc = parse("@doc {\n# Hello\n\nSee [docs](javascript:alert(1)).\n}").unwrap();
        let html = render_html(&doc);
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<a href=\"#\">docs</a>"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn test_standalone_page() {
        let doc = parse(r#"@meta { title: "A & B"; }"#).unwrap();
        let page = render_page(&doc);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>A &amp; B</title>"));
        assert!(page.contains("<h1>A &amp; B</h1>"));
    }
}

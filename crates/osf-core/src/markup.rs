//! Lightweight markup rendering for `@doc` content
//!
//! Block structure is classified line by line; inline spans are found by a
//! single forward scan that looks closers up in a next-marker table. All text is HTML-escaped on the way out and link or
//! image targets with an unsafe scheme are replaced by `#`.
//!
//! Supported: ATX headings, paragraphs, `**bold**` / `__bold__`, `*italic*` /
//! `_italic_`, `~~strike~~`, `` `code` ``, links, images, unordered and ordered
//! lists, blockquotes, fenced code blocks, pipe tables and horizontal rules.

use std::fmt::Write;
use std::sync::OnceLock;

use osf_ast::Alignment;
use regex::Regex;

use crate::html::escape_html;

/// Nesting limit for blockquotes rendered inside blockquotes
const MAX_QUOTE_DEPTH: usize = 8;

/// Classification of a markup line
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineType<'a> {
    Blank,
    Heading(usize, &'a str),
    Fence(&'a str),
    Rule,
    Bullet(&'a str),
    Numbered(&'a str),
    Quote(&'a str),
    TableRow,
    Text(&'a str),
}

fn scan(line: &str) -> LineType<'_> {
    static HEADING_RE: OnceLock<Regex> = OnceLock::new();
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    static BULLET_RE: OnceLock<Regex> = OnceLock::new();
    static NUMBERED_RE: OnceLock<Regex> = OnceLock::new();

    let heading_re =
        HEADING_RE.get_or_init(|| Regex::new(r"^(#{1,6})[ \t]{1,16}(.*?)[ \t#]{0,16}$").unwrap());
    let fence_re = FENCE_RE
        .get_or_init(|| Regex::new(r"^(?:`{3,16}|~{3,16})[ \t]{0,8}([A-Za-z0-9_+#.-]{0,32})$").unwrap());
    let bullet_re = BULLET_RE.get_or_init(|| Regex::new(r"^[-*+][ \t]{1,8}(.*)$").unwrap());
    let numbered_re =
        NUMBERED_RE.get_or_init(|| Regex::new(r"^[0-9]{1,9}[.)][ \t]{1,8}(.*)$").unwrap());

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineType::Blank;
    }
    if let Some(caps) = heading_re.captures(trimmed) {
        let text = caps.get(2).map_or("", |m| m.as_str());
        return LineType::Heading(caps[1].len(), text);
    }
    if let Some(caps) = fence_re.captures(trimmed) {
        return LineType::Fence(caps.get(1).map_or("", |m| m.as_str()));
    }
    if is_rule(trimmed) {
        return LineType::Rule;
    }
    if let Some(caps) = bullet_re.captures(trimmed) {
        return LineType::Bullet(caps.get(1).map_or("", |m| m.as_str()));
    }
    if let Some(caps) = numbered_re.captures(trimmed) {
        return LineType::Numbered(caps.get(1).map_or("", |m| m.as_str()));
    }
    if let Some(rest) = trimmed.strip_prefix('>') {
        return LineType::Quote(rest.strip_prefix(' ').unwrap_or(rest));
    }
    if trimmed.starts_with('|') {
        return LineType::TableRow;
    }
    LineType::Text(trimmed)
}

/// `---`, `***` or `___`, optionally spaced
fn is_rule(trimmed: &str) -> bool {
    let mut marks = trimmed.chars().filter(|c| !c.is_whitespace());
    let Some(first) = marks.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for c in marks {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

/// Split a pipe row into trimmed cells; `\|` and `\\` are escapes
pub(crate) fn split_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next @ ('|' | '\\')) => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            },
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }
    cells
}

/// Column alignments of a separator row, or `None` unless every cell is `:?-{3,}:?`
pub(crate) fn separator_alignment(cells: &[String]) -> Option<Vec<Alignment>> {
    cells
        .iter()
        .map(|cell| {
            let left = cell.starts_with(':');
            let right = cell.len() > 1 && cell.ends_with(':');
            let dashes = cell.trim_start_matches(':').trim_end_matches(':');
            if dashes.len() < 3 || !dashes.bytes().all(|b| b == b'-') {
                return None;
            }
            Some(match (left, right) {
                (true, true) => Alignment::Center,
                (false, true) => Alignment::Right,
                _ => Alignment::Left,
            })
        })
        .collect()
}

/// Block being accumulated
#[derive(Debug)]
enum State<'a> {
    Idle,
    Paragraph(Vec<&'a str>),
    List { ordered: bool, items: Vec<&'a str> },
    Quote(Vec<&'a str>),
    Table(Vec<&'a str>),
    Code { lang: &'a str, lines: Vec<&'a str> },
}

/// Render markup to an HTML fragment
pub fn render_markup(text: &str) -> String {
    let mut out = String::new();
    render_into(&mut out, text, 0);
    out
}

fn render_into(out: &mut String, text: &str, depth: usize) {
    let mut state = State::Idle;

    for line in text.lines() {
        if let State::Code { lines, .. } = &mut state {
            if matches!(scan(line), LineType::Fence(_)) {
                flush(out, std::mem::replace(&mut state, State::Idle), depth);
            } else {
                lines.push(line);
            }
            continue;
        }

        let kind = scan(line);
        match (&mut state, kind) {
            (State::Paragraph(lines), LineType::Text(text)) => lines.push(text),
            (State::List { ordered: false, items }, LineType::Bullet(item)) => items.push(item),
            (State::List { ordered: true, items }, LineType::Numbered(item)) => items.push(item),
            (State::Quote(lines), LineType::Quote(text)) => lines.push(text),
            (State::Table(rows), LineType::TableRow) => rows.push(line),
            (_, kind) => {
                flush(out, std::mem::replace(&mut state, State::Idle), depth);
                state = match kind {
                    LineType::Blank => State::Idle,
                    LineType::Heading(level, text) => {
                        writeln!(out, "<h{0}>{1}</h{0}>", level, render_inline(text)).unwrap();
                        State::Idle
                    }
                    LineType::Fence(lang) => State::Code {
                        lang,
                        lines: Vec::new(),
                    },
                    LineType::Rule => {
                        out.push_str("<hr>\n");
                        State::Idle
                    }
                    LineType::Bullet(item) => State::List {
                        ordered: false,
                        items: vec![item],
                    },
                    LineType::Numbered(item) => State::List {
                        ordered: true,
                        items: vec![item],
                    },
                    LineType::Quote(text) => State::Quote(vec![text]),
                    LineType::TableRow => State::Table(vec![line]),
                    LineType::Text(text) => State::Paragraph(vec![text]),
                };
            }
        }
    }

    flush(out, state, depth);
}

fn flush(out: &mut String, state: State<'_>, depth: usize) {
    match state {
        State::Idle => {}
        State::Paragraph(lines) => {
            writeln!(out, "<p>{}</p>", render_inline(&lines.join("\n"))).unwrap();
        }
        State::List { ordered, items } => {
            let tag = if ordered { "ol" } else { "ul" };
            writeln!(out, "<{}>", tag).unwrap();
            for item in items {
                writeln!(out, "<li>{}</li>", render_inline(item)).unwrap();
            }
            writeln!(out, "</{}>", tag).unwrap();
        }
        State::Quote(lines) => {
            out.push_str("<blockquote>\n");
            let inner = lines.join("\n");
            if depth < MAX_QUOTE_DEPTH {
                render_into(out, &inner, depth + 1);
            } else {
                writeln!(out, "<p>{}</p>", escape_html(&inner)).unwrap();
            }
            out.push_str("</blockquote>\n");
        }
        State::Table(rows) => table(out, &rows),
        State::Code { lang, lines } => {
            // Unterminated fences run to the end of the content
            if lang.is_empty() {
                out.push_str("<pre><code>");
            } else {
                write!(out, "<pre><code class=\"language-{}\">", escape_html(lang)).unwrap();
            }
            for line in lines {
                out.push_str(&escape_html(line));
                out.push('\n');
            }
            out.push_str("</code></pre>\n");
        }
    }
}

fn table(out: &mut String, rows: &[&str]) {
    let parsed: Vec<Vec<String>> = rows.iter().map(|row| split_row(row)).collect();
    let alignment = parsed.get(1).and_then(|cells| separator_alignment(cells));

    let Some(alignment) = alignment else {
        // Not a table after all
        writeln!(out, "<p>{}</p>", render_inline(&rows.join("\n"))).unwrap();
        return;
    };

    let style = |i: usize| match alignment.get(i) {
        Some(Alignment::Center) => " style=\"text-align: center\"",
        Some(Alignment::Right) => " style=\"text-align: right\"",
        _ => "",
    };

    out.push_str("<table>\n<thead>\n<tr>");
    for (i, cell) in parsed[0].iter().enumerate() {
        write!(out, "<th{}>{}</th>", style(i), render_inline(cell)).unwrap();
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in &parsed[2..] {
        out.push_str("<tr>");
        for (i, cell) in row.iter().enumerate() {
            write!(out, "<td{}>{}</td>", style(i), render_inline(cell)).unwrap();
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
}

/// Link and image targets: http, https, mailto and scheme-less paths pass
pub fn safe_url(url: &str) -> &str {
    let url = url.trim();
    let scheme_end = url.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if url[i..].starts_with(':') => {
            let scheme = url[..i].to_ascii_lowercase();
            if matches!(scheme.as_str(), "http" | "https" | "mailto") {
                url
            } else {
                "#"
            }
        }
        _ => url,
    }
}

/// Render inline spans of a single text run
pub fn render_inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    inline_into(&mut out, &chars, 0);
    out
}

/// Nesting limit for emphasis inside emphasis
const MAX_INLINE_DEPTH: usize = 8;

/// Every closing marker the inline scanner searches for
const MARKERS: [&[char]; 8] = [
    &['`'],
    &[']'],
    &[')'],
    &['*', '*'],
    &['_', '_'],
    &['~', '~'],
    &['*'],
    &['_'],
];

const NONE: usize = usize::MAX;

/// Next occurrence of each marker at or after every index, built in one
/// backward pass so closer lookups are constant time
struct NextMarker {
    table: Vec<[usize; MARKERS.len()]>,
}

impl NextMarker {
    fn new(chars: &[char]) -> Self {
        let mut table = vec![[NONE; MARKERS.len()]; chars.len() + 1];
        for j in (0..chars.len()).rev() {
            table[j] = table[j + 1];
            for (slot, marker) in MARKERS.iter().enumerate() {
                if chars[j..].starts_with(marker) {
                    table[j][slot] = j;
                }
            }
        }
        Self { table }
    }

    /// Index of the next occurrence of `marker` at or after `from`
    fn find(&self, from: usize, marker: &[char]) -> Option<usize> {
        let slot = MARKERS.iter().position(|m| *m == marker)?;
        let at = self.table.get(from)?[slot];
        (at != NONE).then_some(at)
    }

    /// `[label](url)` starting at `open`: (label, url, index after `)`)
    fn link_parts<'c>(
        &self,
        chars: &'c [char],
        open: usize,
    ) -> Option<(&'c [char], &'c [char], usize)> {
        let close = self.find(open + 1, &[']'])?;
        if chars.get(close + 1) != Some(&'(') {
            return None;
        }
        let end = self.find(close + 2, &[')'])?;
        Some((&chars[open + 1..close], &chars[close + 2..end], end + 1))
    }
}

fn inline_into(out: &mut String, chars: &[char], depth: usize) {
    let next = NextMarker::new(chars);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let rest = &chars[i..];

        if c == '\\' && rest.len() > 1 && rest[1].is_ascii_punctuation() {
            push_escaped(out, rest[1]);
            i += 2;
            continue;
        }

        if c == '`' {
            if let Some(end) = next.find(i + 1, &['`']) {
                out.push_str("<code>");
                push_all_escaped(out, &chars[i + 1..end]);
                out.push_str("</code>");
                i = end + 1;
                continue;
            }
        }

        if c == '!' && rest.get(1) == Some(&'[') {
            if let Some((alt, url, after)) = next.link_parts(chars, i + 1) {
                let alt: String = alt.iter().collect();
                let url: String = url.iter().collect();
                write!(
                    out,
                    "<img src=\"{}\" alt=\"{}\">",
                    escape_html(safe_url(&url)),
                    escape_html(&alt)
                )
                .unwrap();
                i = after;
                continue;
            }
        }

        if c == '[' {
            if let Some((label, url, after)) = next.link_parts(chars, i) {
                let url: String = url.iter().collect();
                write!(out, "<a href=\"{}\">", escape_html(safe_url(&url))).unwrap();
                nested(out, label, depth);
                out.push_str("</a>");
                i = after;
                continue;
            }
        }

        if depth < MAX_INLINE_DEPTH {
            if let Some((tag, width)) = delimiter(rest) {
                let marker = &rest[..width];
                if let Some(end) = next.find(i + width, marker).filter(|end| *end > i + width) {
                    write!(out, "<{}>", tag).unwrap();
                    nested(out, &chars[i + width..end], depth);
                    write!(out, "</{}>", tag).unwrap();
                    i = end + width;
                    continue;
                }
            }
        }

        push_escaped(out, c);
        i += 1;
    }
}

fn nested(out: &mut String, chars: &[char], depth: usize) {
    inline_into(out, chars, depth + 1);
}

/// Emphasis delimiter at the start of `rest`: (tag, delimiter width)
fn delimiter(rest: &[char]) -> Option<(&'static str, usize)> {
    match rest {
        ['*', '*', ..] | ['_', '_', ..] => Some(("strong", 2)),
        ['~', '~', ..] => Some(("del", 2)),
        ['*', ..] | ['_', ..] => Some(("em", 1)),
        _ => None,
    }
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        c => out.push(c),
    }
}

fn push_all_escaped(out: &mut String, chars: &[char]) {
    for &c in chars {
        push_escaped(out, c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan() {
        assert_eq!(scan("## Title ##"), LineType::Heading(2, "Title"));
        assert_eq!(scan("####### seven"), LineType::Text("####### seven"));
        assert_eq!(scan("```rust"), LineType::Fence("rust"));
        assert_eq!(scan("- - -"), LineType::Rule);
        assert_eq!(scan("* item"), LineType::Bullet("item"));
        assert_eq!(scan("12. item"), LineType::Numbered("item"));
        assert_eq!(scan("> quoted"), LineType::Quote("quoted"));
        assert_eq!(scan("| a |"), LineType::TableRow);
        assert_eq!(scan("   "), LineType::Blank);
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_eq!(
            render_markup("# Intro\n\nFirst line\nsecond line"),
            "<h1>Intro</h1>\n<p>First line\nsecond line</p>\n"
        );
    }

    #[test]
    fn test_inline_spans() {
        assert_eq!(
            render_inline("**bold** and *it* and ~~gone~~ and `x<y`"),
            "<strong>bold</strong> and <em>it</em> and <del>gone</del> and <code>x&lt;y</code>"
        );
        assert_eq!(render_inline("__b__ _i_"), "<strong>b</strong> <em>i</em>");
        assert_eq!(render_inline("**nested _em_**"), "<strong>nested <em>em</em></strong>");
    }

    #[test]
    fn test_unclosed_delimiters_are_literal() {
        assert_eq!(render_inline("2 * 3"), "2 * 3");
        assert_eq!(render_inline("a ** b"), "a ** b");
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            render_inline("[site](https://example.com?a=1&b=2)"),
            "<a href=\"https://example.com?a=1&amp;b=2\">site</a>"
        );
        assert_eq!(
            render_inline("![logo](./img/logo.png)"),
            "<img src=\"./img/logo.png\" alt=\"logo\">"
        );
        assert_eq!(
            render_inline("[x](javascript:alert(1))"),
            "<a href=\"#\">x</a>)"
        );
        assert_eq!(render_inline("[x](JavaScript:void)"), "<a href=\"#\">x</a>");
        assert_eq!(render_inline("[x](data:text/html,hi)"), "<a href=\"#\">x</a>");
    }

    #[test]
    fn test_safe_url() {
        assert_eq!(safe_url("mailto:a@b.c"), "mailto:a@b.c");
        assert_eq!(safe_url("docs/a.html#top"), "docs/a.html#top");
        assert_eq!(safe_url("/abs/path"), "/abs/path");
        assert_eq!(safe_url(" vbscript:x"), "#");
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            render_markup("- a\n- b\n1. one\n2. two"),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n<ol>\n<li>one</li>\n<li>two</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            render_markup("> quoted **text**\n> more"),
            "<blockquote>\n<p>quoted <strong>text</strong>\nmore</p>\n</blockquote>\n"
        );
    }

    #[test]
    fn test_fenced_code_is_escaped() {
        assert_eq!(
            render_markup("```html\n<script>alert(1)</script>\n```"),
            "<pre><code class=\"language-html\">&lt;script&gt;alert(1)&lt;/script&gt;\n</code></pre>\n"
        );
    }

    #[test]
    fn test_table() {
        let html = render_markup("| A | B |\n|---|---:|\n| 1 | 2 |");
        assert!(html.starts_with("<table>"));
        assert!(html.contains("<th>A</th><th style=\"text-align: right\">B</th>"));
        assert!(html.contains("<td>1</td><td style=\"text-align: right\">2</td>"));
    }

    #[test]
    fn test_pipe_lines_without_separator() {
        assert_eq!(render_markup("| just text |"), "<p>| just text |</p>\n");
    }

    #[test]
    fn test_raw_html_is_escaped() {
        assert_eq!(
            render_markup("<img src=x onerror=alert(1)>"),
            "<p>&lt;img src=x onerror=alert(1)&gt;</p>\n"
        );
    }

    #[test]
    fn test_split_row() {
        assert_eq!(split_row("| a | b |"), vec!["a", "b"]);
        assert_eq!(split_row("| a | b"), vec!["a", "b"]);
        assert_eq!(split_row("| x \\| y | c:\\\\ |"), vec!["x | y", "c:\\"]);
        assert_eq!(split_row("| a |  |"), vec!["a", ""]);
    }

    #[test]
    fn test_separator_alignment() {
        let cells: Vec<String> = [":---", "---:", ":---:", "---"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            separator_alignment(&cells),
            Some(vec![
                Alignment::Left,
                Alignment::Right,
                Alignment::Center,
                Alignment::Left
            ])
        );
        assert_eq!(separator_alignment(&["--".to_string()]), None);
        assert_eq!(separator_alignment(&["-x-".to_string()]), None);
    }

    #[test]
    fn test_unmatched_openers_render_in_linear_time() {
        let start = std::time::Instant::now();
        for opener in ["[", "`", "*", "_", "~~", "![", "[x]("] {
            let text = opener.repeat(40_000);
            let html = render_inline(&text);
            assert_eq!(html.chars().count(), text.chars().count());
        }
        assert!(
            start.elapsed() < std::time::Duration::from_secs(5),
            "took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn test_closers_found_after_unmatched_openers() {
        assert_eq!(
            render_inline("a ~~ b `c` *d* ["),
            "a ~~ b <code>c</code> <em>d</em> ["
        );
        assert_eq!(render_inline("__x * y__"), "<strong>x * y</strong>");
    }
}

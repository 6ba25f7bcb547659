//! OSF parser
//!
//! This module parses OSF text into an `osf_ast::Document`.
//!
//! # Syntax
//!
//! - Blocks: `@kind { ... }` for `meta`, `doc`, `slide`, `sheet`, `chart`,
//!   `diagram`, `code`, `table` and `include`
//! - Properties: `key: value;` where a value is a string, number, `true` /
//!   `false`, a keyword, a `[list]` or a `{ key: value; }` object
//! - Groups: `bullets { "a"; "b"; }`, `data { (1,1) = "x"; }`
//! - Sheet cells: `A1 = value;`, `(row,col) = value;`, `formula A1: "=...";`
//! - Table rows: `| a | b |` lines inside `@table`
//! - `@doc` bodies may hold raw Markdown instead of a `content` property
//! - Line comments: `// ...`
//!
//! Parsing is strict: the first problem is returned with its position and
//! nothing is recovered. Each block is checked by the default
//! [`ValidationEngine`] as soon as it is built, so validation errors surface
//! in source order alongside syntax errors.
//!
//! # Example
//!
//! ```
//! use osf_ast::Block;
//! use osf_core::parser;
//!
//! let doc = parser::parse(r#"@meta { title: "Quarterly Report"; theme: corporate; }"#)?;
//! let Block::Meta(meta) = &doc.blocks[0] else { unreachable!() };
//! assert_eq!(meta.title.as_deref(), Some("Quarterly Report"));
//! # Ok::<(), osf_core::OsfError>(())
//! ```

mod blocks;
mod value;

use osf_ast::{Block, BlockKind, CellRef, Document};
use osf_validate::{literal, ValidationEngine};
use tracing::trace;

use crate::error::{OsfError, Position, Result};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::FORMAT_VERSION;

pub use value::{Spanned, Value, MAX_VALUE_DEPTH};

/// A parsed block with the position of its `@`
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedBlock {
    pub block: Block,
    pub position: Position,
}

/// One statement inside a block body
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement {
    /// `key: value;`
    Property {
        key: Spanned<String>,
        value: Spanned<Value>,
    },
    /// `key { item; ... }`
    Group {
        key: Spanned<String>,
        items: Vec<Statement>,
    },
    /// A bare value inside a group
    Item(Spanned<Value>),
    /// `A1 = value;`, `(r,c) = value;` or `formula A1: value;`
    Cell {
        cell: Spanned<CellRef>,
        value: Spanned<Value>,
        formula: bool,
    },
    /// A raw `| ... |` line of a table
    Row { text: String, pos: Position },
}

/// Parse OSF text into a document
///
/// Include blocks are kept as [`Block::Include`]; use
/// [`crate::parse_with_config`] to resolve them.
pub fn parse(input: &str) -> Result<Document> {
    let blocks = parse_located(input)?;
    let mut doc = Document::with_version(FORMAT_VERSION);
    doc.blocks = blocks.into_iter().map(|located| located.block).collect();
    Ok(doc)
}

/// Parse OSF text, keeping the source position of every block
pub fn parse_located(input: &str) -> Result<Vec<LocatedBlock>> {
    Parser::new(input).document()
}

/// Recursive-descent parser over the token stream
pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    /// End of the most recently consumed token
    last_end: Position,
    /// Current list/object nesting inside a value
    depth: usize,
    engine: ValidationEngine,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            last_end: Position::default(),
            depth: 0,
            engine: ValidationEngine::with_defaults(),
        }
    }

    fn next(&mut self) -> Result<Token> {
        let token = self.lexer.next_token()?;
        self.last_end = token.end;
        Ok(token)
    }

    fn peek(&self) -> Result<Token> {
        self.lexer.peek_token()
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token> {
        let token = self.next()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(OsfError::parse(
                format!("Expected {} {}, found {}", kind, context, token.kind),
                token.start,
            ))
        }
    }

    /// Require the `;` that ends a statement
    fn terminator(&mut self, what: &str) -> Result<()> {
        if self.peek()?.kind == TokenKind::Semicolon {
            self.next()?;
            Ok(())
        } else {
            Err(OsfError::parse(
                format!("Missing ';' after {}", what),
                self.last_end,
            ))
        }
    }

    fn document(mut self) -> Result<Vec<LocatedBlock>> {
        let mut blocks = Vec::new();
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Eof => return Ok(blocks),
                TokenKind::At => {}
                other => {
                    return Err(OsfError::parse(
                        format!("Expected '@' to start a block, found {}", other),
                        token.start,
                    ))
                }
            }

            let located = self.block(token.start)?;
            blocks.push(located);
        }
    }

    /// Parse one block after its `@`
    fn block(&mut self, at: Position) -> Result<LocatedBlock> {
        let token = self.next()?;
        let TokenKind::Ident(name) = token.kind else {
            return Err(OsfError::parse(
                format!("Expected identifier after '@', found {}", token.kind),
                token.start,
            ));
        };
        let kind: BlockKind = name.parse().map_err(|_| {
            OsfError::parse(format!("Unknown block type '@{}'", name), token.start)
        })?;
        let open = self.expect(TokenKind::LBrace, &format!("after @{}", kind))?.start;
        trace!(kind = %kind, line = open.line, "parsing block");

        let block = match kind {
            BlockKind::Doc => self.doc_block(open)?,
            _ => {
                let statements = self.body(kind, open)?;
                blocks::build(kind, statements, open)?
            }
        };

        self.engine
            .validate_block(&block)
            .map_err(|issue| OsfError::validation(issue, Some(at)))?;

        Ok(LocatedBlock {
            block,
            position: at,
        })
    }

    fn missing_brace(kind: BlockKind, open: Position) -> OsfError {
        OsfError::parse_in(
            kind,
            format!("Missing closing }} for block {}", kind),
            open,
        )
    }

    /// Statements up to and including the block's closing `}`
    fn body(&mut self, kind: BlockKind, open: Position) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            if kind == BlockKind::Table {
                self.lexer.skip_trivia();
                if self.lexer.peek_char() == Some('|') {
                    let pos = self.lexer.position();
                    let text = self.lexer.rest_of_line();
                    self.last_end = self.lexer.position();
                    statements.push(Statement::Row { text, pos });
                    continue;
                }
            }

            let token = self.peek()?;
            match token.kind {
                TokenKind::RBrace => {
                    self.next()?;
                    return Ok(statements);
                }
                TokenKind::Eof | TokenKind::At => return Err(Self::missing_brace(kind, open)),
                _ => statements.push(self.statement(kind)?),
            }
        }
    }

    fn statement(&mut self, kind: BlockKind) -> Result<Statement> {
        let token = self.next()?;
        match token.kind {
            TokenKind::LParen => {
                let cell = self.tuple_ref(token.start)?;
                self.cell_assignment(Spanned::new(cell, token.start))
            }
            TokenKind::Ident(name) => {
                let next = self.peek()?;
                match next.kind {
                    TokenKind::Colon => {
                        self.next()?;
                        let value = self.value()?;
                        self.terminator(&format!("property '{}'", name))?;
                        Ok(Statement::Property {
                            key: Spanned::new(name, token.start),
                            value,
                        })
                    }
                    TokenKind::LBrace => {
                        let open = self.next()?.start;
                        let items = self.group(kind, &name, open)?;
                        Ok(Statement::Group {
                            key: Spanned::new(name, token.start),
                            items,
                        })
                    }
                    TokenKind::Equals => {
                        let cell = Self::a1_ref(&name, token.start)?;
                        self.cell_assignment(Spanned::new(cell, token.start))
                    }
                    TokenKind::Ident(_) | TokenKind::LParen if name == "formula" => {
                        self.formula_statement()
                    }
                    other => Err(OsfError::parse_in(
                        kind,
                        format!("Expected ':' after property '{}', found {}", name, other),
                        next.start,
                    )),
                }
            }
            other => Err(OsfError::parse_in(
                kind,
                format!("Expected a property name in block {}, found {}", kind, other),
                token.start,
            )),
        }
    }

    /// Items of a `key { ... }` group, through its closing `}`
    fn group(&mut self, kind: BlockKind, key: &str, open: Position) -> Result<Vec<Statement>> {
        let mut items = Vec::new();
        loop {
            let token = self.peek()?;
            match token.kind {
                TokenKind::RBrace => {
                    self.next()?;
                    if self.peek()?.kind == TokenKind::Semicolon {
                        self.next()?;
                    }
                    return Ok(items);
                }
                TokenKind::Eof | TokenKind::At => {
                    return Err(OsfError::parse_in(
                        kind,
                        format!("Missing closing }} for {} in block {}", key, kind),
                        open,
                    ))
                }
                TokenKind::LParen => items.push(self.statement(kind)?),
                TokenKind::Ident(ref name) if self.starts_cell(name)? => {
                    items.push(self.statement(kind)?)
                }
                _ => {
                    let value = self.value()?;
                    self.terminator(&format!("{} entry", key))?;
                    items.push(Statement::Item(value));
                }
            }
        }
    }

    /// Whether an identifier at the cursor begins a cell statement
    fn starts_cell(&self, name: &str) -> Result<bool> {
        let mut probe = self.lexer.clone();
        probe.next_token()?;
        let next = probe.next_token()?;
        Ok(match next.kind {
            TokenKind::Equals => true,
            TokenKind::Ident(_) | TokenKind::LParen => name == "formula",
            _ => false,
        })
    }

    fn a1_ref(name: &str, pos: Position) -> Result<CellRef> {
        CellRef::from_a1(name).map_err(|err| OsfError::parse(err.to_string(), pos))
    }

    /// `row , col )` after an opening parenthesis
    fn tuple_ref(&mut self, open: Position) -> Result<CellRef> {
        let row = self.coordinate("row")?;
        self.expect(TokenKind::Comma, "between row and column")?;
        let col = self.coordinate("column")?;
        self.expect(TokenKind::RParen, &format!("to close the cell reference at {}", open))?;
        Ok(CellRef::new(row, col))
    }

    fn coordinate(&mut self, what: &str) -> Result<u32> {
        let token = self.next()?;
        let TokenKind::Number(lexeme) = token.kind else {
            return Err(OsfError::parse(
                format!("Expected {} number in cell reference, found {}", what, token.kind),
                token.start,
            ));
        };
        let to_error = |issue| OsfError::validation(issue, Some(token.start));
        let value = literal::parse_number(&lexeme).map_err(to_error)?;
        literal::positive_integer(value, what).map_err(to_error)
    }

    /// `= value ;` after a cell reference
    fn cell_assignment(&mut self, cell: Spanned<CellRef>) -> Result<Statement> {
        self.expect(TokenKind::Equals, &format!("after cell {}", cell.node))?;
        let value = self.value()?;
        self.terminator(&format!("cell {}", cell.node))?;
        Ok(Statement::Cell {
            cell,
            value,
            formula: false,
        })
    }

    /// `<cell> : value ;` after the `formula` keyword
    fn formula_statement(&mut self) -> Result<Statement> {
        let token = self.next()?;
        let cell = match token.kind {
            TokenKind::LParen => self.tuple_ref(token.start)?,
            TokenKind::Ident(name) => Self::a1_ref(&name, token.start)?,
            other => {
                return Err(OsfError::parse(
                    format!("Expected a cell reference after 'formula', found {}", other),
                    token.start,
                ))
            }
        };
        self.expect(TokenKind::Colon, &format!("after formula cell {}", cell))?;
        let value = self.value()?;
        self.terminator(&format!("formula for cell {}", cell))?;
        Ok(Statement::Cell {
            cell: Spanned::new(cell, token.start),
            value,
            formula: true,
        })
    }

    /// `@doc` body: either `content: "...";` or raw Markdown
    fn doc_block(&mut self, open: Position) -> Result<Block> {
        if self.doc_uses_properties() {
            let statements = self.body(BlockKind::Doc, open)?;
            return blocks::build(BlockKind::Doc, statements, open);
        }

        let raw = self
            .lexer
            .raw_block_body()
            .ok_or_else(|| Self::missing_brace(BlockKind::Doc, open))?;
        self.last_end = self.lexer.position();
        Ok(Block::Doc(osf_ast::DocBlock {
            content: dedent(&raw),
        }))
    }

    fn doc_uses_properties(&self) -> bool {
        let mut probe = self.lexer.clone();
        match probe.next_token().map(|t| t.kind) {
            Ok(TokenKind::RBrace) => true,
            Ok(TokenKind::Ident(name)) if name == "content" => {
                matches!(probe.next_token().map(|t| t.kind), Ok(TokenKind::Colon))
            }
            _ => false,
        }
    }
}

/// Strip the common indentation of non-blank lines, then outer blank space
fn dedent(raw: &str) -> String {
    let indent = raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| *c == ' ' || *c == '\t').count())
        .min()
        .unwrap_or(0);

    raw.lines()
        .map(|line| {
            let cut = line
                .char_indices()
                .nth(indent)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            line[cut..].trim_end()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use osf_ast::{CellValue, SlideContent};

    fn first(src: &str) -> Block {
        parse(src).unwrap().blocks.remove(0)
    }

    #[test]
    fn test_empty_input() {
        let doc = parse("").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.version.as_deref(), Some(FORMAT_VERSION));
        assert!(parse("  // only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_meta_block() {
        let Block::Meta(meta) = first(
            r#"@meta {
                title: "Q4 Review";
                author: "Finance";
                theme: corporate;
                tags: ["q4", "finance", "q4"];
            }"#,
        ) else {
            panic!("expected meta");
        };
        assert_eq!(meta.title.as_deref(), Some("Q4 Review"));
        assert_eq!(meta.theme.as_deref(), Some("corporate"));
        assert_eq!(meta.tags, vec!["q4", "finance"]);
    }

    #[test]
    fn test_doc_raw_markdown() {
        let Block::Doc(doc) = first("@doc {\n    # Heading\n\n    Some **bold** text.\n      indented\n}") else {
            panic!("expected doc");
        };
        assert_eq!(doc.content, "# Heading\n\nSome **bold** text.\n  indented");
    }

    #[test]
    fn test_doc_content_property() {
        let Block::Doc(doc) = first(r##"@doc { content: "# Title\nBody"; }"##) else {
            panic!("expected doc");
        };
        assert_eq!(doc.content, "# Title\nBody");
    }

    #[test]
    fn test_slide_content_order() {
        let Block::Slide(slide) = first(
            r#"@slide {
                title: "Agenda";
                layout: TitleAndBullets;
                content: "Intro";
                bullets { "One"; "Two"; }
                content: "Outro";
            }"#,
        ) else {
            panic!("expected slide");
        };
        assert_eq!(
            slide.content,
            vec![
                SlideContent::Text("Intro".into()),
                SlideContent::Bullets(vec!["One".into(), "Two".into()]),
                SlideContent::Text("Outro".into()),
            ]
        );
    }

    #[test]
    fn test_sheet_cells_and_formula() {
        let Block::Sheet(sheet) = first(
            r#"@sheet {
                name: "Sales";
                cols: [Product, Q1, "Q2", Total];
                data {
                    (2,1) = "Widget";
                    (2,2) = 100;
                }
                C2 = 150;
                (2,4)="=B2+C2";
                formula (3,4): "=SUM(B2:C2)";
            }"#,
        ) else {
            panic!("expected sheet");
        };
        assert_eq!(sheet.cols, vec!["Product", "Q1", "Q2", "Total"]);
        assert_eq!(sheet.cell(2, 1), Some(&CellValue::Text("Widget".into())));
        assert_eq!(sheet.cell(2, 3), Some(&CellValue::Number(150.0)));
        assert_eq!(sheet.cell(2, 4), Some(&CellValue::Formula("B2+C2".into())));
        assert_eq!(sheet.cell(3, 4), Some(&CellValue::Formula("SUM(B2:C2)".into())));
    }

    #[test]
    fn test_missing_brace_names_block() {
        let err = parse("\n\n@meta {\n  title: \"x\";\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.to_string(), "Missing closing } for block meta at 3:7");
        assert_eq!(err.block(), Some(BlockKind::Meta));
    }

    #[test]
    fn test_new_block_inside_block() {
        let err = parse("@slide {\n  title: \"a\";\n@meta { }").unwrap_err();
        assert!(err.to_string().starts_with("Missing closing } for block slide at 1:8"));
    }

    #[test]
    fn test_missing_semicolon_position() {
        let err = parse("@meta {\n  title: \"x\"\n  author: \"y\";\n}").unwrap_err();
        assert_eq!(err.to_string(), "Missing ';' after property 'title' at 2:13");
    }

    #[test]
    fn test_bare_identifier_outside_allow_list() {
        let err = parse("@meta { title: Report; }").unwrap_err();
        assert!(err.to_string().contains("bare identifiers"));
        assert_eq!(err.position(), Some(Position::new(1, 16)));
    }

    #[test]
    fn test_unknown_block_and_property() {
        let err = parse("@widget { }").unwrap_err();
        assert!(err.to_string().contains("Unknown block type '@widget'"));

        let err = parse("@chart { type: bar; title: \"t\"; rows: 3; }").unwrap_err();
        assert!(err.to_string().contains("Unknown property 'rows' for block chart"));
    }

    #[test]
    fn test_invalid_number() {
        let err = parse("@sheet {\n  A1 = 1.2.3;\n}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Invalid number format '1.2.3' at 2:8");
    }

    #[test]
    fn test_top_level_garbage() {
        let err = parse("title: \"x\";").unwrap_err();
        assert!(err.to_string().starts_with("Expected '@' to start a block"));
    }

    #[test]
    fn test_unclosed_string_reported_at_opening_quote() {
        let err = parse("@meta { title: \"abc; }\n@doc { content: \"x\"; }\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lex);
        assert_eq!(err.position(), Some(Position::new(1, 16)));
    }

    #[test]
    fn test_deep_list_nesting_is_rejected() {
        let err = parse(&format!("@meta {{ tags: {}", "[".repeat(5000))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("nesting exceeds 32 levels"));
        assert_eq!(err.position(), Some(Position::new(1, 15 + MAX_VALUE_DEPTH)));
    }

    #[test]
    fn test_deep_object_nesting_is_rejected() {
        let src = format!("@chart {{ options: {}", "{ a: [".repeat(20_000));
        let err = parse(&src).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("nesting exceeds"));
    }

    #[test]
    fn test_nesting_depth_resets_between_values() {
        let nested = format!("{}1{}", "[".repeat(MAX_VALUE_DEPTH), "]".repeat(MAX_VALUE_DEPTH));
        let src = format!("@chart {{ type: bar; title: \"t\"; options: {{ a: {0}; b: {0}; }}; }}", nested);
        if let Err(err) = parse(&src) {
            assert!(!err.to_string().contains("nesting exceeds"), "{}", err);
        }
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("\n  a\n    b\n\n  c\n"), "a\n  b\n\nc");
        assert_eq!(dedent(""), "");
    }
}

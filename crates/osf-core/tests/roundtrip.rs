//! Property-based tests for serializer round-trips
//!
//! Documents are generated directly as ASTs, serialized, and parsed back.

use osf_ast::{
    Block, CellRef, CellValue, Chart, ChartSeries, ChartType, CodeBlock, DocBlock, Document,
    Include, Meta, Sheet, Slide, SlideContent, Table,
};
use osf_core::markup::render_markup;
use osf_core::{parse, serialize, FORMAT_VERSION};
use proptest::prelude::*;

fn text_strategy() -> impl Strategy<Value = String> {
    any::<String>()
}

fn meta_strategy() -> impl Strategy<Value = Block> {
    (
        proptest::option::of(text_strategy()),
        proptest::option::of(text_strategy()),
        proptest::option::of("[a-z]{1,10}"),
        proptest::collection::vec("[a-z0-9]{1,6}", 0..4),
    )
        .prop_map(|(title, author, theme, tags)| {
            let mut meta = Meta {
                title,
                author,
                theme,
                ..Default::default()
            };
            for tag in tags {
                meta.add_tag(tag);
            }
            Block::Meta(meta)
        })
}

fn slide_strategy() -> impl Strategy<Value = Block> {
    let content = prop_oneof![
        text_strategy().prop_map(SlideContent::Text),
        proptest::collection::vec(text_strategy(), 0..4).prop_map(SlideContent::Bullets),
    ];
    (
        proptest::option::of(text_strategy()),
        proptest::collection::vec(content, 0..4),
    )
        .prop_map(|(title, content)| {
            Block::Slide(Slide {
                title,
                layout: None,
                content,
            })
        })
}

fn cell_value_strategy() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        "[A-Za-z ][A-Za-z0-9 ,.]{0,12}".prop_map(CellValue::Text),
        (-1.0e6f64..1.0e6).prop_map(CellValue::Number),
        (1u32..20, 1u32..20)
            .prop_map(|(r, c)| CellValue::Formula(format!("SUM(A1:{})", CellRef::new(r, c)))),
    ]
}

fn sheet_strategy() -> impl Strategy<Value = Block> {
    (
        proptest::option::of("[A-Za-z ]{1,10}"),
        proptest::collection::vec(((1u32..500, 1u32..800), cell_value_strategy()), 0..8),
    )
        .prop_map(|(name, cells)| {
            let mut sheet = Sheet {
                name,
                ..Default::default()
            };
            for ((row, col), value) in cells {
                sheet.set(CellRef::new(row, col), value);
            }
            Block::Sheet(sheet)
        })
}

fn chart_strategy() -> impl Strategy<Value = Block> {
    (
        text_strategy(),
        proptest::collection::vec(
            (text_strategy(), proptest::collection::vec(-1.0e4f64..1.0e4, 0..5)),
            0..3,
        ),
    )
        .prop_map(|(title, series)| {
            Block::Chart(Chart {
                chart_type: ChartType::Line,
                title,
                series: series
                    .into_iter()
                    .map(|(label, values)| ChartSeries { label, values })
                    .collect(),
                options: None,
            })
        })
}

/// Cells are trimmed by the row splitter, so generated cells never carry
/// outer whitespace or newlines
fn table_cell_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,:|\\\\-]{0,10}".prop_map(|s| s.trim().to_string())
}

fn table_strategy() -> impl Strategy<Value = Block> {
    (1usize..4)
        .prop_flat_map(|width| {
            (
                proptest::collection::vec(table_cell_strategy(), width),
                proptest::collection::vec(
                    proptest::collection::vec(table_cell_strategy(), width),
                    0..4,
                ),
            )
        })
        .prop_map(|(header, rows)| {
            Block::Table(Table {
                header,
                rows,
                ..Default::default()
            })
        })
}

fn block_strategy() -> impl Strategy<Value = Block> {
    prop_oneof![
        meta_strategy(),
        text_strategy().prop_map(|content| Block::Doc(DocBlock { content })),
        slide_strategy(),
        sheet_strategy(),
        chart_strategy(),
        ("[a-z]{1,8}", text_strategy()).prop_map(|(language, code)| {
            Block::Code(CodeBlock {
                language,
                code,
                ..Default::default()
            })
        }),
        table_strategy(),
        "[a-z]{1,8}\\.osf".prop_map(|path| Block::Include(Include { path })),
    ]
}

fn document_strategy() -> impl Strategy<Value = Document> {
    proptest::collection::vec(block_strategy(), 0..6).prop_map(|blocks| {
        let mut doc = Document::with_version(FORMAT_VERSION);
        doc.blocks = blocks;
        doc
    })
}

proptest! {
    #[test]
    fn test_parse_serialize_roundtrip(doc in document_strategy()) {
        let text = serialize(&doc);
        let parsed = parse(&text);
        prop_assert!(parsed.is_ok(), "Failed to parse: {}", text);
        prop_assert_eq!(parsed.unwrap(), doc);
    }

    #[test]
    fn test_serialize_is_idempotent(doc in document_strategy()) {
        let once = serialize(&doc);
        let twice = serialize(&parse(&once).unwrap());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_serialized_text_is_ascii(doc in document_strategy()) {
        prop_assert!(serialize(&doc).is_ascii());
    }

    #[test]
    fn test_parser_never_panics(input in any::<String>()) {
        let _ = parse(&input);
    }

    #[test]
    fn test_markup_never_emits_raw_tags(input in any::<String>()) {
        let html = render_markup(&input);
        prop_assert!(!html.contains("<script"));
        prop_assert!(!html.contains("<iframe"));
    }
}

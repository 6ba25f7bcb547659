//! Integration tests for include resolution against the real filesystem

use std::fs;
use std::path::Path;

use osf_ast::Block;
use osf_core::config::ParserConfig;
use osf_core::{parse_file, parse_with_config, ErrorKind, Position, ResolutionKind};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn titles(blocks: &[Block]) -> Vec<String> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Doc(doc) => Some(doc.content.clone()),
            Block::Meta(meta) => meta.title.clone(),
            _ => None,
        })
        .collect()
}

#[test]
fn test_nested_includes_splice_in_document_order() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.osf",
        r#"@meta { title: "Main"; }
@include { path: "./chapters/one.osf"; }
@doc { content: "end"; }"#,
    );
    write(
        dir.path(),
        "chapters/one.osf",
        r#"@doc { content: "one"; }
@include { path: "two.osf"; }"#,
    );
    write(dir.path(), "chapters/two.osf", r#"@doc { content: "two"; }"#);

    let doc = parse_file(dir.path().join("main.osf"), &ParserConfig::default()).unwrap();
    assert!(doc.is_resolved());
    assert_eq!(titles(&doc.blocks), vec!["Main", "one", "two", "end"]);
}

#[test]
fn test_traversal_is_blocked_even_when_target_exists() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "secret.osf", r#"@doc { content: "secret"; }"#);
    write(
        dir.path(),
        "docs/main.osf",
        "@meta { title: \"x\"; }\n@include { path: \"../secret.osf\"; }",
    );

    let err = parse_file(dir.path().join("docs/main.osf"), &ParserConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Security);
    assert_eq!(err.code(), "OSF004");
    assert_eq!(err.position(), Some(Position::new(2, 1)));
    assert!(err.to_string().contains("Path traversal blocked"));
}

#[test]
fn test_traversal_of_missing_target_fails_the_same_way() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.osf",
        r#"@include { path: "../../nowhere/x.osf"; }"#,
    );

    let err = parse_file(dir.path().join("main.osf"), &ParserConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Security);
}

#[test]
fn test_configured_base_dir_widens_containment() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shared/footer.osf", r#"@doc { content: "footer"; }"#);
    write(
        dir.path(),
        "docs/main.osf",
        r#"@include { path: "../shared/footer.osf"; }"#,
    );

    let config = ParserConfig::new(dir.path());
    let doc = parse_file(dir.path().join("docs/main.osf"), &config).unwrap();
    assert_eq!(titles(&doc.blocks), vec!["footer"]);
}

#[test]
fn test_circular_include() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.osf", r#"@include { path: "b.osf"; }"#);
    write(dir.path(), "b.osf", r#"@include { path: "a.osf"; }"#);

    let err = parse_file(dir.path().join("a.osf"), &ParserConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert_eq!(err.resolution_kind(), Some(ResolutionKind::CircularReference));
    assert!(err
        .to_string()
        .contains("Circular include detected: a.osf -> b.osf -> a.osf"));
}

#[test]
fn test_sibling_includes_of_same_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "part.osf", r#"@doc { content: "part"; }"#);
    write(dir.path(), "left.osf", r#"@include { path: "part.osf"; }"#);
    write(dir.path(), "right.osf", r#"@include { path: "part.osf"; }"#);
    write(
        dir.path(),
        "main.osf",
        r#"@include { path: "left.osf"; } @include { path: "right.osf"; }"#,
    );

    let doc = parse_file(dir.path().join("main.osf"), &ParserConfig::default()).unwrap();
    assert_eq!(titles(&doc.blocks), vec!["part", "part"]);
}

#[test]
fn test_missing_include_names_requester() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.osf",
        "@meta { title: \"x\"; }\n\n@include { path: \"./gone.osf\"; }",
    );

    let err = parse_file(dir.path().join("main.osf"), &ParserConfig::default()).unwrap_err();
    assert_eq!(err.resolution_kind(), Some(ResolutionKind::FileNotFound));
    assert_eq!(err.position(), Some(Position::new(3, 1)));
    assert!(err.to_string().contains("'./gone.osf'"));
    assert!(err.to_string().contains("main.osf"));
}

#[test]
fn test_error_in_included_file_reports_both_locations() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.osf", "@doc {\n  content: \"unterminated;\n}");
    write(
        dir.path(),
        "main.osf",
        "@meta { title: \"x\"; }\n@include { path: \"bad.osf\"; }",
    );

    let err = parse_file(dir.path().join("main.osf"), &ParserConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
    assert_eq!(err.position(), Some(Position::new(2, 12)));
    assert_eq!(err.file(), Some(Path::new("bad.osf")));
    assert!(err.to_string().contains("included at 2:1"));
}

#[test]
fn test_depth_limit_is_configurable() {
    let dir = TempDir::new().unwrap();
    for i in 0..4 {
        write(
            dir.path(),
            &format!("level{}.osf", i),
            &format!("@include {{ path: \"level{}.osf\"; }}", i + 1),
        );
    }
    write(dir.path(), "level4.osf", r#"@doc { content: "deep"; }"#);

    let root = dir.path().join("level0.osf");
    let doc = parse_file(&root, &ParserConfig::default()).unwrap();
    assert_eq!(titles(&doc.blocks), vec!["deep"]);

    let err = parse_file(&root, &ParserConfig::default().with_max_depth(2)).unwrap_err();
    assert_eq!(err.resolution_kind(), Some(ResolutionKind::DepthLimit));
}

#[test]
fn test_parse_with_config_resolves_against_base() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "intro.osf", r#"@doc { content: "intro"; }"#);

    let config = ParserConfig::new(dir.path());
    let doc = parse_with_config(r#"@include { path: "intro.osf"; }"#, &config).unwrap();
    assert_eq!(titles(&doc.blocks), vec!["intro"]);
}

#[test]
fn test_unreadable_root_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = parse_file(dir.path().join("absent.osf"), &ParserConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

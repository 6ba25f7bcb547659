//! HTML and Markdown projection of complete documents

use osf_core::{parse, render_html, render_page, to_markdown};

const HOSTILE: &str = r#"@meta {
  title: "<script>alert('t')</script>";
  author: "\"onmouseover=\"x";
  tags: ["<b>"];
}

@doc {
  # Hello <img src=x onerror=alert(1)>

  [click](javascript:alert(1)) and ![p](data:image/svg+xml,evil)

  <iframe src="https://evil.example"></iframe>
}

@slide {
  title: "<svg onload=alert(1)>";
  bullets { "<script>x</script>"; }
}

@sheet {
  A1 = "<td>";
  B1 = "=A1&\"<x>\"";
}

@chart {
  type: "pie";
  title: "<h1>";
  data: [{ label: "</table>"; values: [1]; }];
}

@diagram {
  type: "sequence";
  code: "A->>B: <script>";
}

@code {
  language: "html\" onclick=\"x";
  code: "</code></pre><script>alert(1)</script>";
}

@table {
  caption: "<caption>";
  | <th> | x |
  | --- | --- |
  | </tbody> | ' |
}
"#;

#[test]
fn test_no_user_markup_survives() {
    let doc = parse(HOSTILE).unwrap();
    let html = render_html(&doc);

    assert!(!html.contains("<script"));
    assert!(!html.contains("<img src=x"));
    assert!(!html.contains("<iframe"));
    assert!(!html.contains("<svg"));
    assert!(!html.contains("javascript:"));
    assert!(!html.contains("data:image"));
    assert!(!html.contains("onclick=\""));
    assert!(!html.contains("\"onmouseover"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn test_standalone_page_wraps_fragment() {
    let doc = parse(HOSTILE).unwrap();
    let page = render_page(&doc);
    assert!(page.contains("<title>&lt;script&gt;alert(&#39;t&#39;)&lt;/script&gt;</title>"));
    assert!(page.contains(&render_html(&doc)));
    assert!(page.trim_end().ends_with("</html>"));
}

#[test]
fn test_markdown_export_covers_every_block() {
    let doc = parse(
        r#"@meta { title: "Deck"; }
@slide { title: "One"; bullets { "a"; } }
@code { language: "rust"; code: "fn main() {}"; }
@table {
  | A |
  | --- |
  | 1 |
}"#,
    )
    .unwrap();
    assert_eq!(
        to_markdown(&doc),
        "# Deck\n\n## One\n\n- a\n\n```rust\nfn main() {}\n```\n\n| A |\n| --- |\n| 1 |\n"
    );
}

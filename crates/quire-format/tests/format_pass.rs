// Whole-pass behaviour: each rule driven through Formatter::format_tree on
// parsed markup, plus idempotence of the pass as a whole.

use std::collections::BTreeSet;

use quire_editor_core::{Cursor, Document, Endpoint, NodeKey, SmolStr};
use quire_format::{FormatConfig, Formatter, Highlighter, RuleKind, marks};

/// Wraps every line of code in its own span, so a single text node comes
/// back split at each line break.
struct LineHighlighter;

impl Highlighter for LineHighlighter {
    fn highlight(&self, code: &str, _language: Option<&str>) -> Option<String> {
        let mut out = String::new();
        for line in code.split_inclusive('\n') {
            out.push_str("<span class=\"line\">");
            out.push_str(line);
            out.push_str("</span>");
        }
        Some(out)
    }

    fn recognized_languages(&self) -> BTreeSet<SmolStr> {
        BTreeSet::from([SmolStr::new("text")])
    }
}

/// Placeholder that shows up in snapshots.
fn visible_config() -> FormatConfig {
    FormatConfig {
        placeholder: "~".to_owned(),
        ..FormatConfig::default()
    }
}

fn format(markup: &str) -> Document {
    let mut doc = Document::from_markup(markup).unwrap();
    Formatter::without_highlighting(visible_config())
        .format_tree(&mut doc)
        .unwrap();
    doc
}

fn body(doc: &Document) -> String {
    doc.inner_markup(doc.root()).unwrap()
}

fn find_tag(doc: &Document, tag: &str) -> Vec<NodeKey> {
    doc.flatten(doc.root())
        .unwrap()
        .into_iter()
        .filter(|k| doc.get(*k).unwrap().tag == tag)
        .collect()
}

#[test]
fn test_ordered_list_becomes_numbered_items() {
    let doc = format("<ol><li>one</li><li>two</li></ol>");
    insta::assert_snapshot!(
        body(&doc),
        @r#"<div data-index="1" data-list="ordered">one</div><div data-index="2" data-list="ordered">two</div>"#
    );
}

#[test]
fn test_numbering_resets_after_break() {
    let doc = format(concat!(
        "<ol><li>a</li><li>b</li><li>c</li></ol>",
        "<ul><li>bullet</li></ul>",
        "<ol><li>d</li><li>e</li></ol>",
    ));
    let numbers: Vec<_> = doc
        .children(doc.root())
        .unwrap()
        .iter()
        .map(|k| {
            doc.get(*k)
                .unwrap()
                .mark(marks::LIST_INDEX)
                .and_then(|v| v.as_int())
        })
        .collect();
    assert_eq!(
        numbers,
        vec![Some(1), Some(2), Some(3), None, Some(1), Some(2)]
    );
}

#[test]
fn test_table_is_rebuilt() {
    let doc = format(r#"<table><tr><td colspan="2">a</td><td>b</td></tr></table>"#);
    insta::assert_snapshot!(
        body(&doc),
        @r#"<table data-key="1"><colgroup><col width="auto"><col width="auto"><col width="auto"></colgroup><tbody><tr><td colspan="2">a</td><td>b</td></tr></tbody></table>"#
    );
}

#[test]
fn test_column_count_comes_from_first_row_only() {
    let doc = format(concat!(
        "<table>",
        r#"<tr><td colspan="2">a</td><td colspan="1">b</td><td>c</td></tr>"#,
        "<tr><td>1</td><td>2</td><td>3</td><td>4</td><td>5</td><td>6</td></tr>",
        "</table>",
    ));
    let cols = find_tag(&doc, "col");
    assert_eq!(cols.len(), 4);
    for col in cols {
        assert_eq!(
            doc.get(col).unwrap().mark(marks::WIDTH).map(|v| v.to_string()),
            Some("auto".to_owned())
        );
    }
}

#[test]
fn test_table_rows_keep_document_order() {
    let doc = format(concat!(
        "<table><caption>cap</caption>",
        "<thead><tr><th>h1</th><th>h2</th></tr></thead>",
        "<tbody><tr><td>1</td><td>2</td></tr></tbody>",
        "<tfoot><tr><td>f1</td><td>f2</td></tr></tfoot>",
        "</table>",
    ));
    let table = find_tag(&doc, "table")[0];
    let tbody = doc.children(table).unwrap()[1];
    let rows: Vec<_> = doc
        .children(tbody)
        .unwrap()
        .iter()
        .map(|r| doc.text_content(*r).unwrap())
        .collect();
    assert_eq!(rows, vec!["h1h2", "12", "f1f2"]);
    // The caption had no rows and is gone.
    assert!(find_tag(&doc, "caption").is_empty());
}

#[test]
fn test_header_cells_become_data_cells() {
    let doc = format(concat!(
        r#"<table><tr><th abbr="h" class="x">h</th><td>d</td></tr>"#,
        r#"<tr><td><table><tr><th scope="row">nested</th></tr></table></td></tr></table>"#,
    ));
    assert!(find_tag(&doc, "th").is_empty());
    let cells = find_tag(&doc, "td");
    assert_eq!(cells.len(), 4);
    let header = doc.get(cells[0]).unwrap();
    assert_eq!(header.mark("abbr").map(|v| v.to_string()), Some("h".to_owned()));
    assert_eq!(header.mark("class").map(|v| v.to_string()), Some("x".to_owned()));
    assert!(!header.has_mark(marks::KEY));
}

#[test]
fn test_video_gets_placeholders() {
    let doc = format(r#"<p><video src="v.mp4"></video></p><p>a<video src="w.mp4"></video>b</p>"#);
    insta::assert_snapshot!(
        body(&doc),
        @r#"<p>~<video data-key="2" src="v.mp4"></video>~</p><p>a<video data-key="5" src="w.mp4"></video>b</p>"#
    );
}

#[test]
fn test_links_and_images_tagged() {
    let doc = format(r#"<p><a href="/x">x</a> <img alt="i" src="i.png"></p>"#);
    insta::assert_snapshot!(
        body(&doc),
        @r#"<p><a data-key="2" href="/x">x</a> <img alt="i" data-key="5" src="i.png"></p>"#
    );
}

#[test]
fn test_cursor_survives_highlighting() {
    let mut doc = Document::from_markup("<p>intro</p><pre>abc\ndef</pre>").unwrap();
    let pre = find_tag(&doc, "pre")[0];
    let text = doc.children(pre).unwrap()[0];
    doc.set_cursor(Some(Cursor::new(
        Endpoint::new(text, 4),
        Endpoint::new(text, 5),
    )))
    .unwrap();

    let formatter = Formatter::new(FormatConfig::default(), LineHighlighter);
    let summary = formatter.format_tree(&mut doc).unwrap();
    assert_eq!(summary.applied.get(&RuleKind::CodeBlock), Some(&1));
    assert!(!doc.is_live(text));
    assert_eq!(doc.text_content(pre).unwrap(), "abc\ndef");

    let cursor = *doc.cursor().unwrap();
    // Offset 4 sits on the boundary and stays with the first line.
    assert_eq!(doc.get(cursor.anchor.element).unwrap().text(), "abc\n");
    assert_eq!(cursor.anchor.offset, 4);
    assert_eq!(doc.get(cursor.focus.element).unwrap().text(), "def");
    assert_eq!(cursor.focus.offset, 1);

    assert!(formatter.format_tree(&mut doc).unwrap().is_noop());
    assert_eq!(doc.cursor().unwrap(), &cursor);
}

#[test]
fn test_highlighting_disabled_by_config() {
    let mut doc = Document::from_markup("<pre>abc\ndef</pre>").unwrap();
    let config = FormatConfig {
        highlight: false,
        ..FormatConfig::default()
    };
    Formatter::new(config, LineHighlighter)
        .format_tree(&mut doc)
        .unwrap();
    assert_eq!(body(&doc), "<pre data-key=\"1\">abc\ndef</pre>");
}

#[test]
fn test_whole_pass_is_idempotent() {
    let fixtures = [
        "<ol><li>a</li><li>b</li></ol><ol><li>c</li></ol>",
        "<ul><li>x<ol><li>y</li><li>z</li></ol></li></ul>",
        r#"<table><colgroup><col width=""></colgroup><tr><th>h</th></tr></table>"#,
        "<table></table>",
        "<div><video></video><video></video></div>",
        r#"<pre class="language-text">one
two</pre>"#,
        r#"<p style="white-space: pre">a <a href="/">b</a></p>"#,
    ];
    let formatter = Formatter::new(visible_config(), LineHighlighter);
    for fixture in fixtures {
        let mut doc = Document::from_markup(fixture).unwrap();
        formatter.format_tree(&mut doc).unwrap();
        let once = body(&doc);
        let second = formatter.format_tree(&mut doc).unwrap();
        assert!(second.is_noop(), "{fixture}: {second}");
        assert_eq!(body(&doc), once, "{fixture}");
    }
}

#[test]
fn test_reloaded_output_formats_as_noop() {
    let fixtures = [
        "<ol><li>a</li><li>b</li></ol><ul><li>c</li></ul><ol><li>d</li></ol>",
        "<ul><li>x<ol><li>y</li><li>z</li></ol></li></ul>",
        r#"<table><tr><td colspan="2">a</td></tr></table><ol><li>b</li></ol>"#,
    ];
    let formatter = Formatter::without_highlighting(visible_config());
    for fixture in fixtures {
        let once = body(&format(fixture));
        let mut reloaded = Document::from_markup(&once).unwrap();
        let summary = formatter.format_tree(&mut reloaded).unwrap();
        assert!(summary.is_noop(), "{fixture}: {summary}");
        assert_eq!(body(&reloaded), once, "{fixture}");
    }
}

#[cfg(feature = "syntax-highlighting")]
mod with_syntect {
    use super::*;
    use quire_format::code_pretty::CSS_PREFIX;

    #[test]
    fn test_rust_block_highlighted_once() {
        let code = "fn main() {\n    let x = 1 < 2;\n}\n";
        let mut doc =
            Document::from_markup(&format!("<pre data-language=\"rust\">{}</pre>", code.replace('<', "&lt;")))
                .unwrap();
        let pre = find_tag(&doc, "pre")[0];
        let text = doc.children(pre).unwrap()[0];
        doc.set_cursor(Some(Cursor::collapsed(Endpoint::new(text, 20))))
            .unwrap();

        let formatter = Formatter::with_syntect(FormatConfig::default());
        assert!(formatter.languages().contains("rust"));
        formatter.format_tree(&mut doc).unwrap();

        assert_eq!(doc.text_content(pre).unwrap(), code);
        assert!(doc.inner_markup(pre).unwrap().contains(CSS_PREFIX));

        // The caret is still 20 chars into the code.
        let focus = doc.cursor().unwrap().focus;
        let mut before = 0;
        for key in doc.flatten(pre).unwrap() {
            if key == focus.element {
                break;
            }
            before += doc.get(key).unwrap().text_len();
        }
        assert_eq!(before + focus.offset, 20);

        assert!(formatter.format_tree(&mut doc).unwrap().is_noop());
    }
}

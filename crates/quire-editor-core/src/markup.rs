//! Markup in and out of the element tree.
//!
//! Parsing goes through html5ever (into an `RcDom`) and is then copied into
//! the arena. Serialization writes the arena back out directly.
//!
//! Whitespace-only text containing a line break is treated as source
//! formatting and dropped, except inside preformatted elements.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::document::Document;
use crate::error::TreeError;
use crate::types::{Kind, NodeKey, Styles};

/// Attribute on the synthetic wrapper used to locate a parsed fragment.
const FRAGMENT_MARKER: &str = "data-quire-fragment";

impl Document {
    /// Build a document whose root holds the parsed markup.
    pub fn from_markup(markup: &str) -> Result<Self, TreeError> {
        let mut doc = Document::new();
        let root = doc.root();
        for key in doc.parse_fragment(markup)? {
            doc.append_child(key, root)?;
        }
        Ok(doc)
    }

    /// Parse a markup fragment into new, detached top-level nodes.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<Vec<NodeKey>, TreeError> {
        self.parse_fragment_in(markup, false)
    }

    /// Like [`Document::parse_fragment`], but keeps every text run as if the
    /// fragment sat inside a preformatted element.
    pub fn parse_preformatted_fragment(&mut self, markup: &str) -> Result<Vec<NodeKey>, TreeError> {
        self.parse_fragment_in(markup, true)
    }

    fn parse_fragment_in(&mut self, markup: &str, in_pre: bool) -> Result<Vec<NodeKey>, TreeError> {
        let wrapped = format!("<div {FRAGMENT_MARKER}>{markup}</div>");
        let dom = parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .read_from(&mut wrapped.as_bytes())
            .map_err(|e| TreeError::Markup(e.to_string()))?;

        let Some(container) = find_fragment_root(&dom.document) else {
            tracing::debug!(target: "quire::markup", "fragment wrapper not found after parse");
            return Ok(Vec::new());
        };

        let mut keys = Vec::new();
        for child in container.children.borrow().iter() {
            if let Some(key) = self.import(child, in_pre)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn import(&mut self, handle: &Handle, in_pre: bool) -> Result<Option<NodeKey>, TreeError> {
        match &handle.data {
            NodeData::Text { contents } => {
                let contents = contents.borrow();
                let text: &str = &contents;
                if !in_pre && text.contains('\n') && text.trim().is_empty() {
                    return Ok(None);
                }
                Ok(Some(self.create_text(text)))
            }
            NodeData::Element { name, attrs, .. } => {
                let tag: &str = name.local.as_ref();
                let kind = Kind::for_tag(tag);
                let key = self.create_element(kind, tag);
                {
                    let node = self.get_mut(key)?;
                    for attr in attrs.borrow().iter() {
                        let attr_name: &str = attr.name.local.as_ref();
                        let value: &str = &attr.value;
                        if attr_name == "style" {
                            parse_styles(value, &mut node.styles);
                        } else {
                            node.set_mark(attr_name, value);
                        }
                    }
                }
                if kind.is_container() {
                    let in_pre = in_pre || self.is_preformatted(key)?;
                    for child in handle.children.borrow().iter() {
                        if let Some(child_key) = self.import(child, in_pre)? {
                            self.append_child(child_key, key)?;
                        }
                    }
                }
                Ok(Some(key))
            }
            _ => Ok(None),
        }
    }

    /// Serialize a node including its own tag.
    pub fn to_markup(&self, key: NodeKey) -> Result<String, TreeError> {
        let mut out = String::new();
        self.write_node(key, &mut out)?;
        Ok(out)
    }

    /// Serialize only the children of a node.
    pub fn inner_markup(&self, key: NodeKey) -> Result<String, TreeError> {
        let mut out = String::new();
        for child in self.children(key)? {
            self.write_node(*child, &mut out)?;
        }
        Ok(out)
    }

    fn write_node(&self, key: NodeKey, out: &mut String) -> Result<(), TreeError> {
        let node = self.get(key)?;
        if node.is_text() {
            escape_text(out, node.text());
            return Ok(());
        }

        out.push('<');
        out.push_str(&node.tag);
        if let Some(marks) = &node.marks {
            for (name, value) in marks {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(out, &value.to_smol());
                out.push('"');
            }
        }
        if !node.styles.is_empty() {
            let style = node
                .styles
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join("; ");
            out.push_str(" style=\"");
            escape_attr(out, &style);
            out.push('"');
        }
        out.push('>');

        if node.kind == Kind::Closed {
            // Closed media (`video`, `iframe`) still needs an end tag to parse back.
            if !is_void_tag(&node.tag) {
                out.push_str("</");
                out.push_str(&node.tag);
                out.push('>');
            }
            return Ok(());
        }
        for child in &node.children {
            self.write_node(*child, out)?;
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
        Ok(())
    }
}

fn find_fragment_root(handle: &Handle) -> Option<Handle> {
    if let NodeData::Element { attrs, .. } = &handle.data {
        let is_marker = attrs.borrow().iter().any(|attr| {
            let attr_name: &str = attr.name.local.as_ref();
            attr_name == FRAGMENT_MARKER
        });
        if is_marker {
            return Some(handle.clone());
        }
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(find_fragment_root)
}

/// HTML void elements, written without an end tag.
fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "source" | "track" | "wbr"
    )
}

/// Parse a `style` attribute (`a: b; c: d`) into the style map.
pub fn parse_styles(value: &str, styles: &mut Styles) {
    for decl in value.split(';') {
        if let Some((name, val)) = decl.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let val = val.trim();
            if !name.is_empty() && !val.is_empty() {
                styles.insert(name.into(), val.into());
            }
        }
    }
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarkValue;

    #[test]
    fn test_parse_kinds_and_marks() {
        let doc = Document::from_markup(
            r#"<p class="lead">Hi <a href="/x">there</a><img src="a.png"></p>"#,
        )
        .unwrap();
        let p = doc.children(doc.root()).unwrap()[0];
        let node = doc.get(p).unwrap();
        assert_eq!(node.kind, Kind::Block);
        assert_eq!(node.mark("class"), Some(&MarkValue::from("lead")));

        let kids = doc.children(p).unwrap();
        assert_eq!(kids.len(), 3);
        assert!(doc.is_text(kids[0]).unwrap());
        assert_eq!(doc.get(kids[1]).unwrap().kind, Kind::InlineBlock);
        assert_eq!(doc.get(kids[2]).unwrap().kind, Kind::Closed);
        assert_eq!(doc.text_content(p).unwrap(), "Hi there");
    }

    #[test]
    fn test_no_attributes_means_no_mark_map() {
        let doc = Document::from_markup("<div>x</div>").unwrap();
        let div = doc.children(doc.root()).unwrap()[0];
        assert!(doc.get(div).unwrap().marks.is_none());
    }

    #[test]
    fn test_styles_are_split_out() {
        let doc = Document::from_markup(r#"<div style="white-space: pre; color:red">x</div>"#)
            .unwrap();
        let div = doc.children(doc.root()).unwrap()[0];
        let node = doc.get(div).unwrap();
        assert_eq!(node.style("white-space"), Some("pre"));
        assert_eq!(node.style("color"), Some("red"));
        assert!(node.marks.is_none());
        assert!(doc.is_preformatted(div).unwrap());
    }

    #[test]
    fn test_formatting_whitespace_dropped_outside_pre() {
        let doc = Document::from_markup("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul><pre><code>x\n\n</code></pre>").unwrap();
        let kids = doc.children(doc.root()).unwrap();
        let ul = kids[0];
        assert_eq!(doc.children(ul).unwrap().len(), 2);
        let pre = kids[1];
        assert_eq!(doc.text_content(pre).unwrap(), "x\n\n");
    }

    #[test]
    fn test_entities_decoded_and_reescaped() {
        let doc = Document::from_markup("<pre>a &lt; b &amp;&amp; c</pre>").unwrap();
        let pre = doc.children(doc.root()).unwrap()[0];
        assert_eq!(doc.text_content(pre).unwrap(), "a < b && c");
        insta::assert_snapshot!(doc.to_markup(pre).unwrap(), @"<pre>a &lt; b &amp;&amp; c</pre>");
    }

    #[test]
    fn test_roundtrip_serialization() {
        let source = r#"<table data-key="1"><colgroup><col width="auto"></colgroup><tbody><tr><td colspan="2">x</td></tr></tbody></table>"#;
        let doc = Document::from_markup(source).unwrap();
        assert_eq!(doc.inner_markup(doc.root()).unwrap(), source);
    }

    #[test]
    fn test_closed_media_keeps_end_tag() {
        let source = r#"<p><video src="v.mp4"></video><br><img src="a.png"></p>"#;
        let doc = Document::from_markup(source).unwrap();
        assert_eq!(doc.inner_markup(doc.root()).unwrap(), source);
    }

    #[test]
    fn test_parse_fragment_is_detached() {
        let mut doc = Document::new();
        let keys = doc
            .parse_fragment(r#"<span class="k">fn</span> main"#)
            .unwrap();
        assert_eq!(keys.len(), 2);
        for key in &keys {
            assert_eq!(doc.parent(*key).unwrap(), None);
        }
        assert_eq!(doc.text_content(keys[1]).unwrap(), " main");
    }

    #[test]
    fn test_preformatted_fragment_keeps_line_breaks() {
        let mut doc = Document::new();
        let markup = "<span>a</span>\n<span>b</span>";
        assert_eq!(doc.parse_fragment(markup).unwrap().len(), 2);
        let keys = doc.parse_preformatted_fragment(markup).unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(doc.get(keys[1]).unwrap().text(), "\n");
    }
}

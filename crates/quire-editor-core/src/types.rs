//! Core element types: keys, structural kinds, marks and styles.
//!
//! These types carry no tree logic of their own; the [`Document`](crate::Document)
//! arena owns every [`Node`] and maintains the parent/child links.

use std::collections::BTreeMap;
use std::fmt;

use smol_str::{SmolStr, ToSmolStr};

/// Tag used for text nodes.
pub const TEXT_TAG: &str = "#text";

/// Stable key of a node in the document arena.
///
/// Keys are never reused, so a key that pointed at a removed node keeps
/// pointing at that (tombstoned) slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(pub(crate) u32);

impl NodeKey {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural category of an element, independent of its tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Character data. Never has children.
    Text,
    /// Void / self-closing element (`img`, `br`, `col`, ...). Never has children.
    Closed,
    /// Inline container (`span`, `a`, `code`, ...).
    InlineBlock,
    /// Block container (`div`, `p`, `table`, `pre`, ...).
    Block,
}

impl Kind {
    /// Whether nodes of this kind may own children.
    pub fn is_container(self) -> bool {
        matches!(self, Kind::InlineBlock | Kind::Block)
    }

    /// Classify a markup tag into its structural kind.
    pub fn for_tag(tag: &str) -> Kind {
        match tag {
            TEXT_TAG => Kind::Text,
            "img" | "video" | "audio" | "br" | "hr" | "col" | "input" | "iframe" | "embed"
            | "source" | "wbr" => Kind::Closed,
            "body" | "div" | "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol"
            | "li" | "table" | "thead" | "tbody" | "tfoot" | "tr" | "td" | "th" | "colgroup"
            | "caption" | "pre" | "blockquote" | "section" | "article" | "header" | "footer"
            | "nav" | "aside" | "figure" | "figcaption" => Kind::Block,
            _ => Kind::InlineBlock,
        }
    }
}

/// Value of a mark: markup attributes are strings, rules may store numbers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MarkValue {
    Str(SmolStr),
    Num(i64),
}

impl MarkValue {
    /// Interpret the value as an integer.
    ///
    /// Strings are trimmed and parsed whole; anything that isn't a plain
    /// integer (`"2px"`, `"2.5"`) yields `None`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MarkValue::Num(n) => Some(*n),
            MarkValue::Str(s) => s.trim().parse().ok(),
        }
    }

    /// String form of the value, as it would appear in markup.
    pub fn to_smol(&self) -> SmolStr {
        match self {
            MarkValue::Str(s) => s.clone(),
            MarkValue::Num(n) => n.to_smolstr(),
        }
    }

    /// Whether the value is an empty (or whitespace-only) string.
    pub fn is_blank(&self) -> bool {
        match self {
            MarkValue::Str(s) => s.trim().is_empty(),
            MarkValue::Num(_) => false,
        }
    }
}

impl fmt::Display for MarkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkValue::Str(s) => f.write_str(s),
            MarkValue::Num(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for MarkValue {
    fn from(value: &str) -> Self {
        MarkValue::Str(SmolStr::new(value))
    }
}

impl From<SmolStr> for MarkValue {
    fn from(value: SmolStr) -> Self {
        MarkValue::Str(value)
    }
}

impl From<String> for MarkValue {
    fn from(value: String) -> Self {
        MarkValue::Str(SmolStr::from(value))
    }
}

impl From<i64> for MarkValue {
    fn from(value: i64) -> Self {
        MarkValue::Num(value)
    }
}

impl From<NodeKey> for MarkValue {
    fn from(value: NodeKey) -> Self {
        MarkValue::Str(value.to_smolstr())
    }
}

/// Attribute-like annotations on an element.
pub type Marks = BTreeMap<SmolStr, MarkValue>;

/// Style properties on an element.
pub type Styles = BTreeMap<SmolStr, SmolStr>;

/// A single element of the document tree.
///
/// Structural fields (`children`, `parent`) are private: only the
/// [`Document`](crate::Document) mutation primitives may change them.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: Kind,
    pub tag: SmolStr,
    /// `None` means the element has no mark map at all, which is distinct
    /// from an empty map.
    pub marks: Option<Marks>,
    pub styles: Styles,
    pub(crate) text: String,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) removed: bool,
}

impl Node {
    pub(crate) fn element(kind: Kind, tag: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            tag: tag.into(),
            marks: None,
            styles: Styles::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
            removed: false,
        }
    }

    pub(crate) fn text_node(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::element(Kind::Text, TEXT_TAG)
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == Kind::Text
    }

    /// Text of a text node. Empty for every other kind.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text of a text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Length of a text node in chars (not bytes).
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn mark(&self, name: &str) -> Option<&MarkValue> {
        self.marks.as_ref().and_then(|marks| marks.get(name))
    }

    pub fn has_mark(&self, name: &str) -> bool {
        self.mark(name).is_some()
    }

    /// Merge a single mark, creating the mark map if it is absent.
    ///
    /// Returns `true` if the stored value changed.
    pub fn set_mark(&mut self, name: &str, value: impl Into<MarkValue>) -> bool {
        let value = value.into();
        let marks = self.marks.get_or_insert_with(Marks::new);
        match marks.get(name) {
            Some(existing) if *existing == value => false,
            _ => {
                marks.insert(SmolStr::new(name), value);
                true
            }
        }
    }

    /// Merge several marks without touching unrelated ones.
    pub fn merge_marks<I, K, V>(&mut self, marks: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<MarkValue>,
    {
        let mut changed = false;
        for (name, value) in marks {
            changed |= self.set_mark(name.as_ref(), value);
        }
        changed
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles.get(name).map(|s| s.as_str())
    }

    /// Containers rendered preformatted: a `pre` tag or a `white-space: pre*`
    /// style.
    pub fn is_preformatted(&self) -> bool {
        self.kind.is_container()
            && (self.tag == "pre"
                || self
                    .style("white-space")
                    .is_some_and(|ws| ws.trim().starts_with("pre")))
    }

    /// Whitespace-separated class names from the `class` mark.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        let class = match self.mark("class") {
            Some(MarkValue::Str(s)) => s.as_str(),
            _ => "",
        };
        class.split_whitespace()
    }

    /// Compare everything except identity and structure links.
    pub fn same_content(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.tag == other.tag
            && self.text == other.text
            && self.styles == other.styles
            && marks_eq(self.marks.as_ref(), other.marks.as_ref())
    }
}

/// Mark maps compare equal when both are absent or empty, or hold the same
/// entries.
fn marks_eq(a: Option<&Marks>, b: Option<&Marks>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        (Some(m), None) | (None, Some(m)) => m.is_empty(),
        (None, None) => true,
    }
}

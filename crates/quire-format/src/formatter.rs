//! Rule dispatch and the depth-first formatting pass.
//!
//! Which rule applies is decided from the element's *current* kind, tag and
//! marks every time it is dispatched. Earlier rules rewrite tags (lists become
//! `div` items, `th` becomes `td`), so nothing is cached between calls.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use quire_editor_core::{Document, Kind, Node, NodeKey, SmolStr};

use crate::config::FormatConfig;
use crate::error::FormatError;
use crate::highlight::{Highlighter, NoHighlighter};
use crate::rules::code::{CodeBlockOptions, canonicalize_code_block};
use crate::rules::list::{flatten_list, has_ordered_mark, renumber};
use crate::rules::media::tag_media;
use crate::rules::table::{canonicalize_table, retag_header_cell};

/// Rule an element is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleKind {
    /// `ol`/`ul` container flattened into items.
    List,
    /// Ordered item renumbered against its previous sibling.
    Numbering,
    /// Image, video or link tagged.
    Media,
    Table,
    HeaderCell,
    CodeBlock,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::List => "list",
            RuleKind::Numbering => "numbering",
            RuleKind::Media => "media",
            RuleKind::Table => "table",
            RuleKind::HeaderCell => "header-cell",
            RuleKind::CodeBlock => "code-block",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the rule for a node as it looks right now.
pub fn classify(node: &Node) -> Option<RuleKind> {
    match (node.kind, node.tag.as_str()) {
        (Kind::Text, _) => None,
        (_, "ol" | "ul") => Some(RuleKind::List),
        (_, "img" | "video" | "a") => Some(RuleKind::Media),
        (Kind::Block, "table") => Some(RuleKind::Table),
        (_, "th") => Some(RuleKind::HeaderCell),
        _ if node.is_preformatted() => Some(RuleKind::CodeBlock),
        (Kind::Block, _) if has_ordered_mark(node) => Some(RuleKind::Numbering),
        _ => None,
    }
}

/// Outcome of one [`Formatter::format_tree`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    /// Elements dispatched, text nodes included.
    pub visited: usize,
    /// Rule applications that changed the tree.
    pub applied: BTreeMap<RuleKind, usize>,
}

impl PassSummary {
    pub fn changes(&self) -> usize {
        self.applied.values().sum()
    }

    /// `true` when the pass left the tree exactly as it found it.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    fn record(&mut self, applied: Option<RuleKind>) {
        self.visited += 1;
        if let Some(rule) = applied {
            *self.applied.entry(rule).or_default() += 1;
        }
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} elements, {} changes", self.visited, self.changes())?;
        for (rule, count) in &self.applied {
            write!(f, ", {rule}: {count}")?;
        }
        Ok(())
    }
}

/// Runs the normalization rules over a document.
pub struct Formatter<H = NoHighlighter> {
    config: FormatConfig,
    highlighter: H,
    languages: BTreeSet<SmolStr>,
}

impl Formatter<NoHighlighter> {
    /// Formatter that never highlights code blocks (they still get identity
    /// marks).
    pub fn without_highlighting(config: FormatConfig) -> Self {
        Self::new(config, NoHighlighter)
    }
}

#[cfg(feature = "syntax-highlighting")]
impl Formatter<crate::code_pretty::SyntectHighlighter> {
    /// Formatter backed by syntect's bundled syntaxes.
    pub fn with_syntect(config: FormatConfig) -> Self {
        Self::new(config, crate::code_pretty::SyntectHighlighter::default())
    }
}

impl<H: Highlighter> Formatter<H> {
    /// The recognized languages are the highlighter's, narrowed to
    /// `config.languages` when that is set.
    pub fn new(config: FormatConfig, highlighter: H) -> Self {
        let recognized = highlighter.recognized_languages();
        let languages = match &config.languages {
            Some(allowed) => allowed
                .iter()
                .map(|lang| SmolStr::new(lang.trim().to_lowercase()))
                .filter(|lang| recognized.contains(lang))
                .collect(),
            None => recognized,
        };
        Self {
            config,
            highlighter,
            languages,
        }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    pub fn highlighter(&self) -> &H {
        &self.highlighter
    }

    /// Languages a code block may name.
    pub fn languages(&self) -> &BTreeSet<SmolStr> {
        &self.languages
    }

    /// Route one element to its rule and run it.
    ///
    /// Returns the rule only if it changed something.
    pub fn format_element(
        &self,
        doc: &mut Document,
        key: NodeKey,
    ) -> Result<Option<RuleKind>, FormatError> {
        let Some(rule) = classify(doc.get(key)?) else {
            return Ok(None);
        };
        tracing::trace!(target: "quire::format", element = %key, %rule, "dispatch");

        let changed = match rule {
            RuleKind::List => {
                flatten_list(doc, key)?;
                true
            }
            RuleKind::Numbering => renumber(doc, key)?,
            RuleKind::Media => tag_media(doc, key, self.config.placeholder())?,
            RuleKind::Table => canonicalize_table(doc, key)?,
            RuleKind::HeaderCell => retag_header_cell(doc, key)?,
            RuleKind::CodeBlock => {
                let options = CodeBlockOptions {
                    highlight: self.config.highlight,
                    languages: &self.languages,
                    highlighter: &self.highlighter,
                };
                canonicalize_code_block(doc, key, &options)?
            }
        };
        Ok(changed.then_some(rule))
    }

    /// One depth-first pass over the whole document.
    ///
    /// Running it again on its own output reports [`PassSummary::is_noop`].
    pub fn format_tree(&self, doc: &mut Document) -> Result<PassSummary, FormatError> {
        let span = tracing::debug_span!(target: "quire::format", "format_tree");
        let _enter = span.enter();

        let mut summary = PassSummary::default();
        let root = doc.root();
        self.format_children(doc, root, &mut summary)?;

        tracing::debug!(target: "quire::format", %summary, "pass complete");
        Ok(summary)
    }

    fn format_children(
        &self,
        doc: &mut Document,
        parent: NodeKey,
        summary: &mut PassSummary,
    ) -> Result<(), FormatError> {
        // List containers go first so every sibling below sees the flattened
        // items.
        let mut lists = Vec::new();
        for child in doc.children(parent)? {
            if classify(doc.get(*child)?) == Some(RuleKind::List) {
                lists.push(*child);
            }
        }
        for list in lists {
            let applied = self.format_element(doc, list)?;
            summary.record(applied);
        }

        let mut index = 0;
        while let Some(child) = doc.children(parent)?.get(index).copied() {
            let applied = self.format_element(doc, child)?;
            summary.record(applied);

            if !doc.is_live(child) || doc.parent(child)? != Some(parent) {
                // Replaced: whatever took its place sits at the same index.
                continue;
            }
            if doc.get(child)?.kind.is_container() {
                self.format_children(doc, child, summary)?;
            }
            index = doc.index_in_parent(child)?.map_or(index, |i| i + 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks;

    fn format(markup: &str) -> (Document, PassSummary) {
        let mut doc = Document::from_markup(markup).unwrap();
        let formatter = Formatter::without_highlighting(FormatConfig::default());
        let summary = formatter.format_tree(&mut doc).unwrap();
        (doc, summary)
    }

    #[test]
    fn test_classify_follows_current_tag() {
        let mut doc = Document::from_markup("<table><tr><th>h</th></tr></table>").unwrap();
        let th = doc
            .flatten(doc.root())
            .unwrap()
            .into_iter()
            .find(|k| doc.get(*k).unwrap().tag == "th")
            .unwrap();
        assert_eq!(classify(doc.get(th).unwrap()), Some(RuleKind::HeaderCell));

        let formatter = Formatter::without_highlighting(FormatConfig::default());
        assert_eq!(
            formatter.format_element(&mut doc, th).unwrap(),
            Some(RuleKind::HeaderCell)
        );
        assert_eq!(classify(doc.get(th).unwrap()), None);
        assert_eq!(formatter.format_element(&mut doc, th).unwrap(), None);
    }

    #[test]
    fn test_classify_kinds() {
        let doc = Document::from_markup(concat!(
            "<ul><li>x</li></ul>",
            r#"<img src="a.png">"#,
            r#"<pre>code</pre>"#,
            r#"<div style="white-space: pre-wrap">code</div>"#,
            r#"<div data-list="ordered">item</div>"#,
            "<p>plain</p>",
        ))
        .unwrap();
        let rules: Vec<_> = doc
            .children(doc.root())
            .unwrap()
            .iter()
            .map(|k| classify(doc.get(*k).unwrap()))
            .collect();
        assert_eq!(
            rules,
            vec![
                Some(RuleKind::List),
                Some(RuleKind::Media),
                Some(RuleKind::CodeBlock),
                Some(RuleKind::CodeBlock),
                Some(RuleKind::Numbering),
                None,
            ]
        );
    }

    #[test]
    fn test_pass_counts_applications() {
        let (_, summary) = format("<ol><li>a</li><li>b</li></ol><p><a href=\"/\">x</a></p>");
        assert_eq!(summary.applied.get(&RuleKind::List), Some(&1));
        assert_eq!(summary.applied.get(&RuleKind::Media), Some(&1));
        // Freshly flattened items are already numbered.
        assert_eq!(summary.applied.get(&RuleKind::Numbering), None);
    }

    #[test]
    fn test_adjacent_lists_number_continuously() {
        let (doc, _) = format("<ol><li>a</li><li>b</li></ol><ol><li>c</li></ol><p>x</p><ol><li>d</li></ol>");
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
        assert_eq!(numbers, vec![Some(1), Some(2), Some(3), None, Some(1)]);
    }

    #[test]
    fn test_nested_list_flattened_inside_item() {
        let (doc, _) = format("<ul><li>outer<ol><li>inner</li></ol></li></ul>");
        let items = doc.children(doc.root()).unwrap();
        assert_eq!(items.len(), 1);
        let inner = doc.children(items[0]).unwrap();
        assert_eq!(inner.len(), 2);
        let nested = doc.get(inner[1]).unwrap();
        assert_eq!(nested.tag, "div");
        assert_eq!(nested.mark(marks::LIST_INDEX).and_then(|v| v.as_int()), Some(1));
    }

    #[test]
    fn test_second_pass_is_noop() {
        let (mut doc, first) = format(concat!(
            "<ol><li>a</li></ol>",
            "<div><video src=\"v.mp4\"></video></div>",
            "<table><thead><tr><th>h</th></tr></thead><tr><td>c</td></tr></table>",
            "<pre>let x = 1;</pre>",
        ));
        assert!(!first.is_noop());
        let formatter = Formatter::without_highlighting(FormatConfig::default());
        let second = formatter.format_tree(&mut doc).unwrap();
        assert!(second.is_noop(), "{second}");
    }

    #[test]
    fn test_language_allow_list_narrows_recognized() {
        struct Fixed;
        impl Highlighter for Fixed {
            fn highlight(&self, _: &str, _: Option<&str>) -> Option<String> {
                None
            }
            fn recognized_languages(&self) -> BTreeSet<SmolStr> {
                ["rust", "python", "c"].into_iter().map(SmolStr::new).collect()
            }
        }

        let config = FormatConfig {
            languages: Some(vec!["Rust".into(), "cobol".into()]),
            ..FormatConfig::default()
        };
        let formatter = Formatter::new(config, Fixed);
        assert_eq!(
            formatter.languages().iter().map(SmolStr::as_str).collect::<Vec<_>>(),
            vec!["rust"]
        );
        let formatter = Formatter::new(FormatConfig::default(), Fixed);
        assert_eq!(formatter.languages().len(), 3);
    }

    #[test]
    fn test_summary_display() {
        let mut summary = PassSummary::default();
        summary.record(Some(RuleKind::Table));
        summary.record(None);
        summary.record(Some(RuleKind::Table));
        insta::assert_snapshot!(summary.to_string(), @"3 elements, 2 changes, table: 2");
    }
}

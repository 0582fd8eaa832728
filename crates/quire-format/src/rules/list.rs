//! List canonicalization.
//!
//! `ol`/`ul` containers are replaced by their items, each turned into a plain
//! `div` block that carries its list kind (and position, for ordered lists) as
//! marks. Numbering is then kept continuous across adjacent ordered items by
//! [`renumber`].

use quire_editor_core::{Document, Kind, MarkValue, Node, NodeKey, TreeError};
use smol_str::SmolStr;

use crate::marks;

/// Kind of list a container or flattened item belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ol" => Some(ListKind::Ordered),
            "ul" => Some(ListKind::Unordered),
            _ => None,
        }
    }

    pub fn as_mark(self) -> &'static str {
        match self {
            ListKind::Ordered => marks::LIST_ORDERED,
            ListKind::Unordered => marks::LIST_UNORDERED,
        }
    }
}

/// Whether the node carries the ordered-list mark.
pub fn has_ordered_mark(node: &Node) -> bool {
    matches!(node.mark(marks::LIST), Some(MarkValue::Str(kind)) if kind.as_str() == marks::LIST_ORDERED)
}

/// Replace a list container with its items.
///
/// Items are moved (not copied) so cursor endpoints inside them stay valid.
/// They are inserted after the container in their original order, then the
/// container itself is removed. Returns the produced items.
///
/// Whitespace-only text between items is dropped; stray text or void
/// children are wrapped in a fresh `div` item.
pub fn flatten_list(doc: &mut Document, list: NodeKey) -> Result<Vec<NodeKey>, TreeError> {
    let Some(kind) = ListKind::from_tag(&doc.get(list)?.tag) else {
        return Ok(Vec::new());
    };
    if doc.parent(list)?.is_none() {
        return Err(TreeError::Orphan(list));
    }

    let children = doc.children(list)?.to_vec();
    let mut produced = Vec::with_capacity(children.len());
    let mut after = list;

    for child in children {
        let node = doc.get(child)?;
        let (child_kind, blank) = (node.kind, node.is_text() && node.text().trim().is_empty());
        let item = match child_kind {
            Kind::Text if blank => continue,
            Kind::Text | Kind::Closed => {
                let wrapper = doc.create_element(Kind::Block, "div");
                doc.append_child(child, wrapper)?;
                wrapper
            }
            Kind::InlineBlock | Kind::Block => child,
        };

        let item_node = doc.get_mut(item)?;
        item_node.kind = Kind::Block;
        item_node.tag = SmolStr::new_static("div");
        item_node.set_mark(marks::LIST, kind.as_mark());
        if kind == ListKind::Ordered {
            item_node.set_mark(marks::LIST_INDEX, produced.len() as i64 + 1);
        }

        doc.insert_after(item, after)?;
        after = item;
        produced.push(item);
    }

    tracing::debug!(
        target: "quire::format",
        list = %list,
        kind = ?kind,
        items = produced.len(),
        "flattened list container"
    );
    doc.remove(list)?;
    Ok(produced)
}

/// Keep ordered numbering continuous.
///
/// An ordered item directly after another ordered item gets the previous
/// value + 1; otherwise it restarts at 1. A previous value that isn't an
/// integer counts as absent.
pub fn renumber(doc: &mut Document, item: NodeKey) -> Result<bool, TreeError> {
    if !has_ordered_mark(doc.get(item)?) {
        return Ok(false);
    }

    let previous = match doc.previous_sibling(item)? {
        Some(prev) => {
            let prev = doc.get(prev)?;
            if has_ordered_mark(prev) {
                prev.mark(marks::LIST_INDEX).and_then(MarkValue::as_int)
            } else {
                None
            }
        }
        None => None,
    };
    let value = previous.map_or(1, |n| n.saturating_add(1));

    // Markup loads positions as strings; an equal number is already canonical.
    let node = doc.get_mut(item)?;
    if node.mark(marks::LIST_INDEX).and_then(MarkValue::as_int) == Some(value) {
        return Ok(false);
    }
    Ok(node.set_mark(marks::LIST_INDEX, value))
}

//! Media and link tagging.

use quire_editor_core::{Document, NodeKey, TreeError};

use super::tag_identity;

/// Embeddable elements that get an identity mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Link,
}

impl MediaKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "img" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "a" => Some(MediaKind::Link),
            _ => None,
        }
    }
}

/// Tag an image, video or link with its identity mark.
///
/// Videos additionally get a `placeholder` text node on any side where the
/// neighbouring sibling is missing or empty, so there is always an editable
/// insertion point next to them.
pub fn tag_media(doc: &mut Document, element: NodeKey, placeholder: &str) -> Result<bool, TreeError> {
    let Some(kind) = MediaKind::from_tag(&doc.get(element)?.tag) else {
        return Ok(false);
    };
    let mut changed = tag_identity(doc, element)?;
    if kind != MediaKind::Video {
        return Ok(changed);
    }
    if doc.parent(element)?.is_none() {
        tracing::debug!(target: "quire::format", video = %element, "detached video, skipping padding");
        return Ok(changed);
    }

    if needs_placeholder(doc, doc.previous_sibling(element)?)? {
        let text = doc.create_text(placeholder);
        doc.insert_before(text, element)?;
        changed = true;
    }
    if needs_placeholder(doc, doc.next_sibling(element)?)? {
        let text = doc.create_text(placeholder);
        doc.insert_after(text, element)?;
        changed = true;
    }
    Ok(changed)
}

fn needs_placeholder(doc: &Document, sibling: Option<NodeKey>) -> Result<bool, TreeError> {
    match sibling {
        None => Ok(true),
        Some(sibling) => doc.is_empty(sibling),
    }
}

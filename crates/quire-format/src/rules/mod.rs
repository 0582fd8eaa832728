//! Normalization rules.
//!
//! Each rule is a free function over `&mut Document` plus whatever options it
//! needs. Rules return `Ok(true)` when they changed the tree and are safe to
//! run again on their own output.

pub mod code;
pub mod list;
pub mod media;
pub mod table;

use quire_editor_core::{Document, NodeKey, TreeError};

use crate::marks;

/// Merge the identity mark (`data-key` = the element's key) into the
/// element's marks, creating the mark map if needed.
pub fn tag_identity(doc: &mut Document, key: NodeKey) -> Result<bool, TreeError> {
    Ok(doc.get_mut(key)?.merge_marks([(marks::KEY, key)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_editor_core::{Kind, MarkValue};

    #[test]
    fn test_tag_identity_is_additive() {
        let mut doc = Document::new();
        let img = doc.create_element(Kind::Closed, "img");
        doc.get_mut(img).unwrap().set_mark("src", "a.png");

        assert!(tag_identity(&mut doc, img).unwrap());
        let node = doc.get(img).unwrap();
        assert_eq!(node.mark("src"), Some(&MarkValue::from("a.png")));
        assert_eq!(node.mark(marks::KEY), Some(&MarkValue::from(img.to_string())));

        assert!(!tag_identity(&mut doc, img).unwrap());
    }
}

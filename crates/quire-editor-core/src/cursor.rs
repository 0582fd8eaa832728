//! Virtual cursor / selection model.
//!
//! A cursor is a pair of endpoints. Each endpoint names an element and an
//! offset: a char offset when the element is a text node, otherwise a child
//! index.

use crate::types::NodeKey;

/// One end of the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub element: NodeKey,
    /// Char offset (NOT byte offset!) for text nodes, child index otherwise.
    pub offset: usize,
}

impl Endpoint {
    pub fn new(element: NodeKey, offset: usize) -> Self {
        Self { element, offset }
    }
}

/// Selection with anchor and focus endpoints.
///
/// The anchor is where the selection started, the focus is where the caret is
/// now. They may be in any document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub anchor: Endpoint,
    pub focus: Endpoint,
}

impl Cursor {
    pub fn new(anchor: Endpoint, focus: Endpoint) -> Self {
        Self { anchor, focus }
    }

    /// Create a collapsed cursor (caret only).
    pub fn collapsed(at: Endpoint) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Both endpoints, anchor first.
    pub fn endpoints_mut(&mut self) -> [&mut Endpoint; 2] {
        [&mut self.anchor, &mut self.focus]
    }
}

//! Arena-backed element tree.
//!
//! `Document` owns every node and the cursor. Nodes are addressed by
//! [`NodeKey`]; parents are stored as keys, children as owned key lists, so
//! there are no reference cycles. Removed nodes stay in the arena as
//! tombstones and any later access to them is an error.

use smol_str::SmolStr;

use crate::cursor::{Cursor, Endpoint};
use crate::error::TreeError;
use crate::types::{Kind, Node, NodeKey};

/// Tag of the implicit root element.
pub const ROOT_TAG: &str = "body";

/// The element tree plus the cursor that points into it.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeKey,
    cursor: Option<Cursor>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with a `body` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::element(Kind::Block, ROOT_TAG)],
            root: NodeKey(0),
            cursor: None,
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    // === Node access ===

    pub fn get(&self, key: NodeKey) -> Result<&Node, TreeError> {
        match self.nodes.get(key.index()) {
            None => Err(TreeError::Unknown(key)),
            Some(node) if node.removed => Err(TreeError::Removed(key)),
            Some(node) => Ok(node),
        }
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Result<&mut Node, TreeError> {
        match self.nodes.get_mut(key.index()) {
            None => Err(TreeError::Unknown(key)),
            Some(node) if node.removed => Err(TreeError::Removed(key)),
            Some(node) => Ok(node),
        }
    }

    /// Whether the key refers to a node that hasn't been removed.
    pub fn is_live(&self, key: NodeKey) -> bool {
        self.get(key).is_ok()
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, key: NodeKey) -> bool {
        let mut current = key;
        loop {
            if current == self.root {
                return true;
            }
            match self.get(current).ok().and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    // === Creation ===

    /// Allocate a detached element.
    pub fn create_element(&mut self, kind: Kind, tag: impl Into<SmolStr>) -> NodeKey {
        self.push(Node::element(kind, tag))
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeKey {
        self.push(Node::text_node(text))
    }

    fn push(&mut self, node: Node) -> NodeKey {
        let key = NodeKey(self.nodes.len() as u32);
        self.nodes.push(node);
        key
    }

    /// Copy a node into a new detached node. With `deep`, descendants are
    /// copied too.
    pub fn clone_node(&mut self, key: NodeKey, deep: bool) -> Result<NodeKey, TreeError> {
        let source = self.get(key)?;
        let mut copy = source.clone();
        copy.parent = None;
        copy.children = Vec::new();
        let children = if deep {
            source.children.clone()
        } else {
            Vec::new()
        };

        let new_key = self.push(copy);
        for child in children {
            let child_copy = self.clone_node(child, true)?;
            self.nodes[child_copy.index()].parent = Some(new_key);
            self.nodes[new_key.index()].children.push(child_copy);
        }
        Ok(new_key)
    }

    // === Navigation ===

    pub fn parent(&self, key: NodeKey) -> Result<Option<NodeKey>, TreeError> {
        Ok(self.get(key)?.parent)
    }

    pub fn children(&self, key: NodeKey) -> Result<&[NodeKey], TreeError> {
        Ok(&self.get(key)?.children)
    }

    /// Position of the node among its parent's children.
    pub fn index_in_parent(&self, key: NodeKey) -> Result<Option<usize>, TreeError> {
        match self.get(key)?.parent {
            Some(parent) => Ok(self.get(parent)?.children.iter().position(|c| *c == key)),
            None => Ok(None),
        }
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Result<Option<NodeKey>, TreeError> {
        let Some(parent) = self.get(key)?.parent else {
            return Ok(None);
        };
        let siblings = &self.get(parent)?.children;
        Ok(siblings
            .iter()
            .position(|c| *c == key)
            .and_then(|idx| idx.checked_sub(1))
            .map(|idx| siblings[idx]))
    }

    pub fn next_sibling(&self, key: NodeKey) -> Result<Option<NodeKey>, TreeError> {
        let Some(parent) = self.get(key)?.parent else {
            return Ok(None);
        };
        let siblings = &self.get(parent)?.children;
        Ok(siblings
            .iter()
            .position(|c| *c == key)
            .and_then(|idx| siblings.get(idx + 1).copied()))
    }

    /// All descendants of `root` in document (pre-)order, excluding `root`.
    pub fn flatten(&self, root: NodeKey) -> Result<Vec<NodeKey>, TreeError> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.get(root)?.children.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            out.push(key);
            stack.extend(self.get(key)?.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Concatenated text of all descendant text nodes, in tree order.
    pub fn text_content(&self, key: NodeKey) -> Result<String, TreeError> {
        let node = self.get(key)?;
        if node.is_text() {
            return Ok(node.text.clone());
        }
        let mut text = String::new();
        for descendant in self.flatten(key)? {
            let node = self.get(descendant)?;
            if node.is_text() {
                text.push_str(&node.text);
            }
        }
        Ok(text)
    }

    /// Nearest ancestor-or-self matching the predicate.
    pub fn closest(
        &self,
        key: NodeKey,
        mut pred: impl FnMut(&Node) -> bool,
    ) -> Result<Option<NodeKey>, TreeError> {
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.get(k)?;
            if pred(node) {
                return Ok(Some(k));
            }
            current = node.parent;
        }
        Ok(None)
    }

    pub fn is_ancestor_or_self(
        &self,
        ancestor: NodeKey,
        key: NodeKey,
    ) -> Result<bool, TreeError> {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return Ok(true);
            }
            current = self.get(k)?.parent;
        }
        Ok(false)
    }

    /// Whether two sibling lists hold structurally identical subtrees: same
    /// kinds, tags, marks, styles and text, ignoring keys.
    pub fn same_structure(&self, a: &[NodeKey], b: &[NodeKey]) -> Result<bool, TreeError> {
        if a.len() != b.len() {
            return Ok(false);
        }
        for (left, right) in a.iter().zip(b) {
            let (l, r) = (self.get(*left)?, self.get(*right)?);
            if !l.same_content(r) || !self.same_structure(&l.children, &r.children)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // === Predicates ===

    pub fn is_text(&self, key: NodeKey) -> Result<bool, TreeError> {
        Ok(self.get(key)?.kind == Kind::Text)
    }

    pub fn is_block(&self, key: NodeKey) -> Result<bool, TreeError> {
        Ok(self.get(key)?.kind == Kind::Block)
    }

    pub fn is_inline_block(&self, key: NodeKey) -> Result<bool, TreeError> {
        Ok(self.get(key)?.kind == Kind::InlineBlock)
    }

    /// An element is empty when it contributes no content: an empty text
    /// node, or a container whose children are all empty. Void elements are
    /// never empty.
    pub fn is_empty(&self, key: NodeKey) -> Result<bool, TreeError> {
        let node = self.get(key)?;
        match node.kind {
            Kind::Text => Ok(node.text.is_empty()),
            Kind::Closed => Ok(false),
            Kind::InlineBlock | Kind::Block => {
                for child in &node.children {
                    if !self.is_empty(*child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Whether the element renders its text preformatted: a `pre` tag or a
    /// `white-space: pre*` style.
    pub fn is_preformatted(&self, key: NodeKey) -> Result<bool, TreeError> {
        Ok(self.get(key)?.is_preformatted())
    }

    // === Mutation ===

    /// Insert `new` as the previous sibling of `reference`.
    pub fn insert_before(&mut self, new: NodeKey, reference: NodeKey) -> Result<(), TreeError> {
        let parent = self.get(reference)?.parent.ok_or(TreeError::Orphan(reference))?;
        self.check_insert(new, parent, Some(reference))?;
        self.unlink(new)?;
        let idx = self.position_in(parent, reference)?;
        self.link(new, parent, idx);
        Ok(())
    }

    /// Insert `new` as the next sibling of `reference`.
    pub fn insert_after(&mut self, new: NodeKey, reference: NodeKey) -> Result<(), TreeError> {
        let parent = self.get(reference)?.parent.ok_or(TreeError::Orphan(reference))?;
        self.check_insert(new, parent, Some(reference))?;
        self.unlink(new)?;
        let idx = self.position_in(parent, reference)?;
        self.link(new, parent, idx + 1);
        Ok(())
    }

    /// Insert `new` as the first child of `parent`.
    ///
    /// Repeated calls compose in reverse: inserting `c, b, a` yields
    /// `[a, b, c]`.
    pub fn insert_into(&mut self, new: NodeKey, parent: NodeKey) -> Result<(), TreeError> {
        self.check_insert(new, parent, None)?;
        self.unlink(new)?;
        self.link(new, parent, 0);
        Ok(())
    }

    /// Insert `new` as the last child of `parent`.
    pub fn append_child(&mut self, new: NodeKey, parent: NodeKey) -> Result<(), TreeError> {
        self.check_insert(new, parent, None)?;
        self.unlink(new)?;
        let idx = self.get(parent)?.children.len();
        self.link(new, parent, idx);
        Ok(())
    }

    /// Unlink a node from its parent. The node stays live and can be
    /// inserted elsewhere.
    pub fn detach(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if key == self.root {
            return Err(TreeError::Root);
        }
        self.get(key)?;
        self.unlink(key)
    }

    /// Detach a node and tombstone its whole subtree.
    ///
    /// Cursor endpoints inside the removed subtree are moved to the removed
    /// node's former position in its parent (or the document start when it
    /// had no parent).
    pub fn remove(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if key == self.root {
            return Err(TreeError::Root);
        }
        let parent = self.get(key)?.parent;
        let index = self.index_in_parent(key)?.unwrap_or(0);
        let mut doomed = self.flatten(key)?;
        doomed.push(key);
        self.unlink(key)?;

        let fallback = match parent {
            Some(parent) => Endpoint::new(parent, index),
            None => Endpoint::new(self.root, 0),
        };
        if let Some(cursor) = self.cursor.as_mut() {
            for endpoint in cursor.endpoints_mut() {
                if doomed.contains(&endpoint.element) {
                    tracing::trace!(
                        target: "quire::tree",
                        from = %endpoint.element,
                        to = %fallback.element,
                        "re-pointing cursor endpoint out of removed subtree"
                    );
                    *endpoint = fallback;
                }
            }
        }

        for k in doomed {
            let node = &mut self.nodes[k.index()];
            node.removed = true;
            node.parent = None;
            node.children.clear();
        }
        Ok(())
    }

    /// Remove every child of `key`.
    pub fn clear_children(&mut self, key: NodeKey) -> Result<(), TreeError> {
        let children = self.get(key)?.children.clone();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    fn check_insert(
        &self,
        new: NodeKey,
        parent: NodeKey,
        reference: Option<NodeKey>,
    ) -> Result<(), TreeError> {
        if new == self.root {
            return Err(TreeError::Root);
        }
        self.get(new)?;
        if !self.get(parent)?.kind.is_container() {
            return Err(TreeError::NotContainer(parent));
        }
        if reference == Some(new) || self.is_ancestor_or_self(new, parent)? {
            return Err(TreeError::Cycle {
                node: new,
                target: parent,
            });
        }
        Ok(())
    }

    fn position_in(&self, parent: NodeKey, child: NodeKey) -> Result<usize, TreeError> {
        self.get(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(TreeError::Orphan(child))
    }

    fn unlink(&mut self, key: NodeKey) -> Result<(), TreeError> {
        if let Some(parent) = self.get(key)?.parent {
            self.get_mut(parent)?.children.retain(|c| *c != key);
            self.nodes[key.index()].parent = None;
        }
        Ok(())
    }

    fn link(&mut self, key: NodeKey, parent: NodeKey, index: usize) {
        let children = &mut self.nodes[parent.index()].children;
        let index = index.min(children.len());
        children.insert(index, key);
        self.nodes[key.index()].parent = Some(parent);
    }

    // === Cursor ===

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn cursor_mut(&mut self) -> Option<&mut Cursor> {
        self.cursor.as_mut()
    }

    /// Set the cursor. Both endpoints must reference live nodes.
    pub fn set_cursor(&mut self, cursor: Option<Cursor>) -> Result<(), TreeError> {
        if let Some(cursor) = &cursor {
            self.get(cursor.anchor.element)?;
            self.get(cursor.focus.element)?;
        }
        self.cursor = cursor;
        Ok(())
    }
}

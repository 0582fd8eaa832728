//! Error types for tree operations.

use miette::Diagnostic;
use thiserror::Error;

use crate::types::NodeKey;

/// Errors raised by the tree primitives.
///
/// These only occur when a caller passes an invalid reference; malformed
/// document content never produces one.
#[derive(Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum TreeError {
    /// Key was never allocated by this document.
    #[error("unknown node {0}")]
    #[diagnostic(code(quire::tree::unknown))]
    Unknown(NodeKey),

    /// Node was removed from the document and may not be used again.
    #[error("node {0} was removed")]
    #[diagnostic(code(quire::tree::removed))]
    Removed(NodeKey),

    /// Sibling insertion relative to a node that has no parent.
    #[error("node {0} has no parent")]
    #[diagnostic(code(quire::tree::orphan))]
    Orphan(NodeKey),

    /// Children inserted into a text or void node.
    #[error("node {0} cannot have children")]
    #[diagnostic(code(quire::tree::not_container))]
    NotContainer(NodeKey),

    /// The document root can't be detached or removed.
    #[error("the document root cannot be detached")]
    #[diagnostic(code(quire::tree::root))]
    Root,

    /// Insertion would make a node its own ancestor.
    #[error("inserting {node} under {target} would create a cycle")]
    #[diagnostic(code(quire::tree::cycle))]
    Cycle { node: NodeKey, target: NodeKey },

    /// The markup reader failed.
    #[error("failed to read markup: {0}")]
    #[diagnostic(code(quire::tree::markup))]
    Markup(String),
}

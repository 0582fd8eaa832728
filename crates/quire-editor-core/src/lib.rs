//! quire-editor-core: the element tree the quire formatting rules run over.
//!
//! This crate provides:
//! - `Document` - arena-backed element tree with navigation and mutation primitives
//! - `Node`, `Kind`, `MarkValue` - element data model
//! - `Cursor` / `Endpoint` - anchor + focus selection model
//! - Markup parsing (html5ever) and serialization

pub mod cursor;
pub mod document;
pub mod error;
pub mod markup;
pub mod types;

pub use cursor::{Cursor, Endpoint};
pub use document::{Document, ROOT_TAG};
pub use error::TreeError;
pub use smol_str::SmolStr;
pub use types::{Kind, MarkValue, Marks, Node, NodeKey, Styles, TEXT_TAG};

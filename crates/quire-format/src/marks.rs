//! Mark names shared with the renderer.
//!
//! These strings are part of the persisted markup and must stay stable across
//! passes.

/// Identity mark; value is the element's arena key.
pub const KEY: &str = "data-key";

/// List kind of a flattened list item (`ordered` / `unordered`).
pub const LIST: &str = "data-list";

/// 1-based display number of an ordered list item.
pub const LIST_INDEX: &str = "data-index";

/// Code-block language.
pub const LANGUAGE: &str = "data-language";

/// Column width on a `col` entry.
pub const WIDTH: &str = "width";

/// Cell column span.
pub const COLSPAN: &str = "colspan";

pub const LIST_ORDERED: &str = "ordered";
pub const LIST_UNORDERED: &str = "unordered";

/// Default column width.
pub const WIDTH_AUTO: &str = "auto";

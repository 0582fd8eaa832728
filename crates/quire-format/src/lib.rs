//! Normalization rules for quire documents.
//!
//! After every edit the host runs a formatting pass over the element tree.
//! Each element is routed by its current tag and kind to one rule:
//!
//! - lists are flattened into marked `div` items and numbered,
//! - images, videos and links get identity marks (videos also get editable
//!   placeholders around them),
//! - tables are rebuilt into `colgroup` + `tbody`,
//! - preformatted blocks are highlighted, with the cursor carried across.
//!
//! ```no_run
//! use quire_editor_core::Document;
//! use quire_format::{FormatConfig, Formatter};
//!
//! # fn main() -> Result<(), quire_format::FormatError> {
//! let mut doc = Document::from_markup("<ol><li>one</li><li>two</li></ol>")?;
//! let formatter = Formatter::without_highlighting(FormatConfig::default());
//! let summary = formatter.format_tree(&mut doc)?;
//! assert!(formatter.format_tree(&mut doc)?.is_noop());
//! # let _ = summary;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "syntax-highlighting")]
pub mod code_pretty;
pub mod config;
pub mod error;
pub mod formatter;
pub mod highlight;
pub mod marks;
pub mod rules;

#[cfg(feature = "syntax-highlighting")]
pub use code_pretty::SyntectHighlighter;
pub use config::{DEFAULT_PLACEHOLDER, FormatConfig};
pub use error::FormatError;
pub use formatter::{Formatter, PassSummary, RuleKind, classify};
pub use highlight::{Highlighter, NoHighlighter};

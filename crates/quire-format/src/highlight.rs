//! Syntax highlighter seam.
//!
//! The code-block rule only needs two things from a highlighter: markup for a
//! piece of code, and the set of language identifiers it understands.

use std::collections::BTreeSet;

use smol_str::SmolStr;

/// Turns raw code into highlighted markup.
pub trait Highlighter {
    /// Highlight `code`. `language` is `None` when the language should be
    /// detected from the code itself.
    ///
    /// Returns `None` when there is nothing to change (unknown language,
    /// plain text, highlighter failure).
    fn highlight(&self, code: &str, language: Option<&str>) -> Option<String>;

    /// Lowercase language identifiers accepted by [`Highlighter::highlight`].
    fn recognized_languages(&self) -> BTreeSet<SmolStr>;
}

impl<H: Highlighter + ?Sized> Highlighter for &H {
    fn highlight(&self, code: &str, language: Option<&str>) -> Option<String> {
        (**self).highlight(code, language)
    }

    fn recognized_languages(&self) -> BTreeSet<SmolStr> {
        (**self).recognized_languages()
    }
}

/// Highlighter that never changes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHighlighter;

impl Highlighter for NoHighlighter {
    fn highlight(&self, _code: &str, _language: Option<&str>) -> Option<String> {
        None
    }

    fn recognized_languages(&self) -> BTreeSet<SmolStr> {
        BTreeSet::new()
    }
}

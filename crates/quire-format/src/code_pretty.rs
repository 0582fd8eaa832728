//! syntect-backed highlighting for code blocks.
//!
//! Output is classed markup (`<span class="hl-source hl-rust">`) with no
//! surrounding `<pre>`; the code-block rule splices it in as the new children
//! of the existing block.

use std::collections::BTreeSet;

use smol_str::SmolStr;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::highlight::Highlighter;

/// Prefix applied to every generated class name.
pub const CSS_PREFIX: &str = "hl-";

const PLAIN_TEXT: &str = "Plain Text";

/// Highlight `code` into `output`.
///
/// Returns `Ok(false)` without writing anything when no syntax applies: the
/// language is unknown, or detection from the first line found nothing.
pub fn highlight(
    syntax_set: &SyntaxSet,
    lang: Option<&str>,
    code: &str,
    output: &mut String,
) -> Result<bool, syntect::Error> {
    let Some(syntax) = find_syntax(syntax_set, lang, code) else {
        return Ok(false);
    };

    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        syntax_set,
        ClassStyle::SpacedPrefixed { prefix: CSS_PREFIX },
    );
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    output.push_str(&generator.finalize());
    Ok(true)
}

fn find_syntax<'a>(
    syntax_set: &'a SyntaxSet,
    lang: Option<&str>,
    code: &str,
) -> Option<&'a SyntaxReference> {
    let syntax = match lang {
        Some(lang) => syntax_set.find_syntax_by_token(lang),
        None => syntax_set.find_syntax_by_first_line(code),
    }?;
    (syntax.name != PLAIN_TEXT).then_some(syntax)
}

/// [`Highlighter`] over syntect's bundled syntax definitions.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new(SyntaxSet::load_defaults_newlines())
    }
}

impl SyntectHighlighter {
    pub fn new(syntax_set: SyntaxSet) -> Self {
        Self { syntax_set }
    }

    pub fn syntax_set(&self) -> &SyntaxSet {
        &self.syntax_set
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: Option<&str>) -> Option<String> {
        let mut output = String::new();
        match highlight(&self.syntax_set, language, code, &mut output) {
            Ok(true) => Some(output),
            Ok(false) => None,
            Err(err) => {
                tracing::warn!(
                    target: "quire::highlight",
                    ?language,
                    error = %err,
                    "syntect failed, leaving code block as is"
                );
                None
            }
        }
    }

    /// Syntax names plus file extensions, lowercased. These are the tokens
    /// `find_syntax_by_token` accepts.
    fn recognized_languages(&self) -> BTreeSet<SmolStr> {
        let mut languages = BTreeSet::new();
        for syntax in self.syntax_set.syntaxes() {
            if syntax.name == PLAIN_TEXT {
                continue;
            }
            languages.insert(SmolStr::new(syntax.name.to_lowercase()));
            for ext in &syntax.file_extensions {
                languages.insert(SmolStr::new(ext.to_lowercase()));
            }
        }
        languages
    }
}

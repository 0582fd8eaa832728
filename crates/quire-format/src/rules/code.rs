//! Code-block highlighting and cursor repair.
//!
//! A preformatted block is re-rendered through a [`Highlighter`]; the new
//! subtree replaces the block's children. Since the old text nodes go away,
//! any cursor endpoint inside them is carried over by absolute char offset
//! into the code string.

use std::collections::BTreeSet;

use quire_editor_core::{Document, Endpoint, Kind, NodeKey, SmolStr, TreeError};

use super::tag_identity;
use crate::highlight::Highlighter;
use crate::marks;

const LANGUAGE_CLASS_PREFIX: &str = "language-";

/// Inputs of the code-block rule besides the tree itself.
#[derive(Clone, Copy)]
pub struct CodeBlockOptions<'a> {
    pub highlight: bool,
    /// Lowercase languages a `data-language` mark or class may name.
    pub languages: &'a BTreeSet<SmolStr>,
    pub highlighter: &'a dyn Highlighter,
}

/// A non-empty text node and its length in chars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextRun {
    pub key: NodeKey,
    pub len: usize,
}

/// Highlight a preformatted block in place.
pub fn canonicalize_code_block(
    doc: &mut Document,
    element: NodeKey,
    options: &CodeBlockOptions<'_>,
) -> Result<bool, TreeError> {
    if !doc.get(element)?.is_preformatted() {
        return Ok(false);
    }
    let mut changed = tag_identity(doc, element)?;
    if !options.highlight || doc.children(element)?.is_empty() {
        return Ok(changed);
    }

    let (language, from_class) = resolve_language(doc, element, options.languages)?;
    if let (Some(language), true) = (&language, from_class) {
        // Persisted so the next pass resolves the same language from the mark.
        changed |= doc
            .get_mut(element)?
            .set_mark(marks::LANGUAGE, language.clone());
    }

    let old = text_runs(doc, doc.children(element)?)?;
    let code = concat_runs(doc, &old)?;
    if code.is_empty() {
        return Ok(changed);
    }

    let Some(markup) = options.highlighter.highlight(&code, language.as_deref()) else {
        return Ok(changed);
    };
    let fragment = match doc.parse_preformatted_fragment(&markup) {
        Ok(fragment) => fragment,
        Err(err) => {
            tracing::warn!(
                target: "quire::format",
                block = %element,
                error = %err,
                "highlighter returned unusable markup, leaving block as is"
            );
            return Ok(changed);
        }
    };

    if doc.same_structure(doc.children(element)?, &fragment)? {
        for node in fragment {
            doc.remove(node)?;
        }
        return Ok(changed);
    }

    let new = text_runs(doc, &fragment)?;
    repair_cursor(doc, element, &old, &new)?;
    doc.clear_children(element)?;
    for node in &fragment {
        doc.append_child(*node, element)?;
    }
    clamp_child_offsets(doc, element)?;

    tracing::debug!(
        target: "quire::format",
        block = %element,
        language = language.as_deref().unwrap_or("auto"),
        old_runs = old.len(),
        new_runs = new.len(),
        "highlighted code block"
    );
    Ok(true)
}

/// Carry the cursor over from `old` text runs to `new` ones.
///
/// Only endpoints whose containing block is `element` are touched.
pub fn repair_cursor(
    doc: &mut Document,
    element: NodeKey,
    old: &[TextRun],
    new: &[TextRun],
) -> Result<(), TreeError> {
    let Some(mut cursor) = doc.cursor().copied() else {
        return Ok(());
    };
    for endpoint in cursor.endpoints_mut() {
        if containing_block(doc, endpoint.element)? != Some(element) {
            continue;
        }
        if let Some(moved) = relocate(*endpoint, old, new) {
            tracing::trace!(
                target: "quire::format",
                from = %endpoint.element,
                to = %moved.element,
                offset = moved.offset,
                "relocated cursor endpoint"
            );
            *endpoint = moved;
        }
    }
    doc.set_cursor(Some(cursor))
}

/// Map an endpoint on an old text run to the equivalent position in the new
/// runs.
///
/// The first new run whose range `[start, start + len]` contains the absolute
/// offset wins, so a boundary offset stays with the earlier run. An offset
/// past the end of the new text is clamped to the end of the last run.
/// Returns `None` when the endpoint isn't on any old run or there are no new
/// runs.
pub fn relocate(endpoint: Endpoint, old: &[TextRun], new: &[TextRun]) -> Option<Endpoint> {
    let mut before = 0;
    let mut absolute = None;
    for run in old {
        if run.key == endpoint.element {
            absolute = Some(before + endpoint.offset);
            break;
        }
        before += run.len;
    }
    let absolute = absolute?;

    let mut start = 0;
    for run in new {
        if absolute <= start + run.len {
            return Some(Endpoint::new(run.key, absolute - start));
        }
        start += run.len;
    }

    let last = new.last()?;
    tracing::warn!(
        target: "quire::format",
        offset = absolute,
        length = start,
        "cursor offset past highlighted text, clamping to end"
    );
    Some(Endpoint::new(last.key, last.len))
}

/// Non-empty text nodes under (or at) `roots`, in document order.
pub fn text_runs(doc: &Document, roots: &[NodeKey]) -> Result<Vec<TextRun>, TreeError> {
    let mut runs = Vec::new();
    for root in roots {
        let mut keys = vec![*root];
        keys.extend(doc.flatten(*root)?);
        for key in keys {
            let node = doc.get(key)?;
            if node.is_text() && !node.text().is_empty() {
                runs.push(TextRun {
                    key,
                    len: node.text_len(),
                });
            }
        }
    }
    Ok(runs)
}

fn concat_runs(doc: &Document, runs: &[TextRun]) -> Result<String, TreeError> {
    let mut code = String::new();
    for run in runs {
        code.push_str(doc.get(run.key)?.text());
    }
    Ok(code)
}

/// Language for the block and whether it came from a class rather than the
/// language mark.
///
/// A mark naming an unrecognized language counts as no language, leaving
/// detection to the highlighter.
fn resolve_language(
    doc: &Document,
    element: NodeKey,
    languages: &BTreeSet<SmolStr>,
) -> Result<(Option<SmolStr>, bool), TreeError> {
    let known = |name: &str| {
        let name = SmolStr::new(name.trim().to_lowercase());
        languages.contains(&name).then_some(name)
    };

    let node = doc.get(element)?;
    if let Some(mark) = node.mark(marks::LANGUAGE).filter(|m| !m.is_blank()) {
        return Ok((known(mark.to_smol().as_str()), false));
    }

    let mut candidates = vec![element];
    if let Some(code) = node
        .children()
        .iter()
        .copied()
        .find(|child| doc.get(*child).is_ok_and(|c| c.tag == "code"))
    {
        candidates.push(code);
    }
    for key in candidates {
        let class_language = doc
            .get(key)?
            .classes()
            .find_map(|class| class.strip_prefix(LANGUAGE_CLASS_PREFIX))
            .and_then(known);
        if class_language.is_some() {
            return Ok((class_language, true));
        }
    }
    Ok((None, false))
}

fn containing_block(doc: &Document, key: NodeKey) -> Result<Option<NodeKey>, TreeError> {
    doc.closest(key, |node| node.kind == Kind::Block || node.is_preformatted())
}

fn clamp_child_offsets(doc: &mut Document, element: NodeKey) -> Result<(), TreeError> {
    let count = doc.children(element)?.len();
    if let Some(cursor) = doc.cursor_mut() {
        for endpoint in cursor.endpoints_mut() {
            if endpoint.element == element && endpoint.offset > count {
                endpoint.offset = count;
            }
        }
    }
    Ok(())
}

//! Table canonicalization.
//!
//! Canonical shape:
//!
//! ```text
//! table[data-key]
//! ├── colgroup
//! │   └── col[width] × N
//! └── tbody
//!     └── tr × rows, in document order
//! ```
//!
//! `thead`/`tfoot` wrappers and anything else directly under the table are
//! dropped once their rows have been moved into the body.

use quire_editor_core::{Document, Kind, MarkValue, NodeKey, TreeError};
use smol_str::SmolStr;

use super::tag_identity;
use crate::marks;

/// Rows and the first column group found under a table, skipping nested
/// tables.
#[derive(Debug, Default)]
struct TableParts {
    rows: Vec<NodeKey>,
    colgroup: Option<NodeKey>,
}

/// Rewrite a table into its canonical shape.
pub fn canonicalize_table(doc: &mut Document, table: NodeKey) -> Result<bool, TreeError> {
    if doc.get(table)?.tag != "table" {
        return Ok(false);
    }
    let mut changed = tag_identity(doc, table)?;

    let parts = collect_parts(doc, table)?;
    if let Some(colgroup) = parts.colgroup {
        changed |= default_column_widths(doc, colgroup)?;
    }
    if is_canonical(doc, table, &parts)? {
        return Ok(changed);
    }

    let colgroup = match parts.colgroup {
        Some(colgroup) => colgroup,
        None => {
            if parts.rows.is_empty() {
                tracing::warn!(
                    target: "quire::format",
                    table = %table,
                    "table has no rows, building an empty column group"
                );
            }
            let columns = column_count(doc, parts.rows.first().copied())?;
            build_colgroup(doc, columns)?
        }
    };

    // Pull out what we keep before clearing, so it isn't tombstoned.
    doc.detach(colgroup)?;
    for row in &parts.rows {
        doc.detach(*row)?;
    }
    doc.clear_children(table)?;

    let tbody = doc.create_element(Kind::Block, "tbody");
    for row in parts.rows.iter().rev() {
        doc.insert_into(*row, tbody)?;
    }
    doc.insert_into(tbody, table)?;
    doc.insert_into(colgroup, table)?;

    tracing::debug!(
        target: "quire::format",
        table = %table,
        rows = parts.rows.len(),
        "rebuilt table"
    );
    Ok(true)
}

/// Retag a header cell (`th`) to a regular cell (`td`) in place.
pub fn retag_header_cell(doc: &mut Document, cell: NodeKey) -> Result<bool, TreeError> {
    let node = doc.get_mut(cell)?;
    if node.tag != "th" {
        return Ok(false);
    }
    node.tag = SmolStr::new_static("td");
    Ok(true)
}

/// Declared column count of a row: the sum of each cell's `colspan`.
///
/// A cell without a span counts as 1; a span that isn't a positive integer
/// contributes nothing. The whole value must parse, so `"2px"` and `"2.5"`
/// contribute nothing rather than 2. No row means no columns.
pub fn column_count(doc: &Document, row: Option<NodeKey>) -> Result<usize, TreeError> {
    let Some(row) = row else {
        return Ok(0);
    };
    let mut count = 0usize;
    for cell in doc.children(row)? {
        let node = doc.get(*cell)?;
        if !matches!(node.tag.as_str(), "td" | "th") {
            continue;
        }
        count += match node.mark(marks::COLSPAN) {
            None => 1,
            Some(span) => span
                .as_int()
                .filter(|n| *n > 0)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(0),
        };
    }
    Ok(count)
}

fn collect_parts(doc: &Document, table: NodeKey) -> Result<TableParts, TreeError> {
    let mut parts = TableParts::default();
    let mut stack: Vec<NodeKey> = doc.children(table)?.iter().rev().copied().collect();
    while let Some(key) = stack.pop() {
        let node = doc.get(key)?;
        match node.tag.as_str() {
            "table" => continue,
            "tr" => {
                parts.rows.push(key);
                continue;
            }
            "colgroup" if parts.colgroup.is_none() => parts.colgroup = Some(key),
            _ => {}
        }
        stack.extend(node.children().iter().rev().copied());
    }
    Ok(parts)
}

/// Give every `col` a width, defaulting to `auto`.
fn default_column_widths(doc: &mut Document, colgroup: NodeKey) -> Result<bool, TreeError> {
    let mut changed = false;
    for col in doc.children(colgroup)?.to_vec() {
        let node = doc.get_mut(col)?;
        if node.tag != "col" {
            continue;
        }
        if node.mark(marks::WIDTH).is_none_or(MarkValue::is_blank) {
            changed |= node.set_mark(marks::WIDTH, marks::WIDTH_AUTO);
        }
    }
    Ok(changed)
}

fn build_colgroup(doc: &mut Document, columns: usize) -> Result<NodeKey, TreeError> {
    let colgroup = doc.create_element(Kind::Block, "colgroup");
    for _ in (0..columns).rev() {
        let col = doc.create_element(Kind::Closed, "col");
        doc.get_mut(col)?.set_mark(marks::WIDTH, marks::WIDTH_AUTO);
        doc.insert_into(col, colgroup)?;
    }
    Ok(colgroup)
}

fn is_canonical(doc: &Document, table: NodeKey, parts: &TableParts) -> Result<bool, TreeError> {
    let Some(colgroup) = parts.colgroup else {
        return Ok(false);
    };
    let [first, second] = doc.children(table)? else {
        return Ok(false);
    };
    Ok(*first == colgroup
        && doc.get(*second)?.tag == "tbody"
        && doc.children(*second)? == parts.rows.as_slice())
}

//! Coordinate translation between cell-local and virtual-document lines.
//!
//! Positions move by the owning cell's line offset; the character column is
//! never touched. Offsets are always read from the notebook's current cell
//! sequence at rewrite time, since structural edits shift them.

use lsp_types::{Position, Range};
use serde_json::Value;

/// Translate a cell-local position into virtual-document coordinates.
#[must_use]
pub const fn to_virtual(position: Position, offset: u32) -> Position {
    Position {
        line: position.line + offset,
        character: position.character,
    }
}

/// Translate a virtual-document position back into cell-local coordinates.
///
/// Lines above the cell clamp to 0; list-shaped results use
/// [`local_line`] instead so out-of-span items can be dropped.
#[must_use]
pub const fn to_local(position: Position, offset: u32) -> Position {
    Position {
        line: position.line.saturating_sub(offset),
        character: position.character,
    }
}

/// Translate a range into virtual-document coordinates.
#[must_use]
pub const fn range_to_virtual(range: Range, offset: u32) -> Range {
    Range {
        start: to_virtual(range.start, offset),
        end: to_virtual(range.end, offset),
    }
}

/// Translate a range back into cell-local coordinates.
#[must_use]
pub const fn range_to_local(range: Range, offset: u32) -> Range {
    Range {
        start: to_local(range.start, offset),
        end: to_local(range.end, offset),
    }
}

/// Translate a virtual line to a local line, or `None` when it falls
/// outside the owning cell's span.
///
/// This is the boundary filter for list results (folding ranges,
/// formatting edits, diagnostics): the server answers in virtual
/// coordinates and may technically span into a neighboring cell.
#[must_use]
pub fn local_line(virtual_line: u32, offset: u32, line_count: u32) -> Option<u32> {
    let local = i64::from(virtual_line) - i64::from(offset);
    if local < 0 || local >= i64::from(line_count) {
        None
    } else {
        u32::try_from(local).ok()
    }
}

/// Shift the `line` field of a raw position object in place.
///
/// Operating on the JSON value directly keeps any non-standard fields a
/// client attached to the position intact.
pub fn shift_position_value(position: &mut Value, delta: i64) {
    if let Some(line) = position.get("line").and_then(Value::as_u64) {
        let shifted = (i64::try_from(line).unwrap_or(i64::MAX) + delta).max(0);
        position["line"] = Value::from(shifted);
    }
}

/// Shift both endpoints of a raw range object in place.
pub fn shift_range_value(range: &mut Value, delta: i64) {
    for key in ["start", "end"] {
        if let Some(position) = range.get_mut(key) {
            shift_position_value(position, delta);
        }
    }
}

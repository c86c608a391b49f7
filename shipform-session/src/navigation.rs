//! Navigation controller
//!
//! Every cursor change follows the same sequence: the visible dimension
//! values are saved under the outgoing record's key, then the cursor moves,
//! then the incoming record (with any cached dimensions) is projected. Edits
//! made while paging are never lost.

use crate::form::FormFields;
use crate::state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Cursor change performed by a navigation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorMove {
    pub from: usize,
    pub to: usize,
}

/// Neighbouring index with wraparound at both ends
///
/// `len` must be non-zero.
///
/// # Examples
/// ```
/// use shipform_session::navigation::{wrap_index, Direction};
///
/// assert_eq!(wrap_index(0, 3, Direction::Previous), 2);
/// assert_eq!(wrap_index(2, 3, Direction::Next), 0);
/// ```
pub fn wrap_index(cursor: usize, len: usize, direction: Direction) -> usize {
    match direction {
        Direction::Next => (cursor + 1) % len,
        Direction::Previous => (cursor + len - 1) % len,
    }
}

/// Page to the neighbouring address
///
/// Returns `None` (and touches nothing) when fewer than two addresses exist.
pub fn advance(
    state: &mut SessionState,
    form: &mut FormFields,
    direction: Direction,
) -> Option<CursorMove> {
    if !state.addresses.is_navigable() {
        return None;
    }
    let from = state.cursor();
    let to = wrap_index(from, state.addresses.len(), direction);
    Some(move_cursor(state, form, from, to))
}

/// Jump straight to `index` (address selector)
///
/// Returns `None` when `index` is out of range.
pub fn select(state: &mut SessionState, form: &mut FormFields, index: usize) -> Option<CursorMove> {
    if index >= state.addresses.len() {
        return None;
    }
    let from = state.cursor();
    Some(move_cursor(state, form, from, index))
}

fn move_cursor(
    state: &mut SessionState,
    form: &mut FormFields,
    from: usize,
    to: usize,
) -> CursorMove {
    state.save_current_dimensions(form);
    state.addresses.set_cursor(to);
    state.load_current(form);
    CursorMove { from, to }
}

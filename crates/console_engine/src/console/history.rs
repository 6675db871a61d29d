use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::output::push_bounded;

pub const DEFAULT_MAX_HISTORY_LINES: usize = 64;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// Every submitted line is kept, repeats included.
    AppendOnly,
    /// A line already present is not recorded again.
    #[default]
    Unique,
}

#[derive(Debug, Clone)]
pub struct InputHistory {
    entries: VecDeque<String>,
    mode: HistoryMode,
    capacity: usize,
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new(HistoryMode::default(), DEFAULT_MAX_HISTORY_LINES)
    }
}

impl InputHistory {
    pub fn new(mode: HistoryMode, capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            mode,
            capacity: capacity.max(1),
        }
    }

    /// Returns false when the line was blank or already recorded in unique mode.
    pub fn record(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        if self.mode == HistoryMode::Unique && self.entries.iter().any(|entry| entry == line) {
            return false;
        }
        push_bounded(&mut self.entries, line.to_string(), self.capacity);
        true
    }

    /// Entry nearest to `index`, see [`clamp_cursor`] for the bounds rules.
    pub fn closest_at(&self, index: &mut isize, out_of_bounds_returns_none: bool) -> Option<&str> {
        let position = clamp_cursor(self.entries.len(), index, out_of_bounds_returns_none)?;
        self.entries.get(position).map(String::as_str)
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.entries.get(position).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Resolves a cursor against a collection of `len` items.
///
/// Below zero clamps to the first item, past the end clamps to the last.
/// With `out_of_bounds_returns_none` those cases return `None` instead and
/// park the cursor on the sentinel just outside the range (`-1` or `len`).
pub fn clamp_cursor(len: usize, index: &mut isize, out_of_bounds_returns_none: bool) -> Option<usize> {
    if len == 0 {
        if out_of_bounds_returns_none {
            *index = if *index < 0 { -1 } else { 0 };
        } else {
            *index = 0;
        }
        return None;
    }

    let last = len as isize - 1;
    if *index < 0 {
        if out_of_bounds_returns_none {
            *index = -1;
            return None;
        }
        *index = 0;
    } else if *index > last {
        if out_of_bounds_returns_none {
            *index = len as isize;
            return None;
        }
        *index = last;
    }
    Some(*index as usize)
}

/// Slice flavour of [`InputHistory::closest_at`].
pub fn closest_at<'a, T>(
    items: &'a [T],
    index: &mut isize,
    out_of_bounds_returns_none: bool,
) -> Option<&'a T> {
    let position = clamp_cursor(items.len(), index, out_of_bounds_returns_none)?;
    items.get(position)
}

//! Scrollback buffer: rows retired off the top of the visible viewport.
//!
//! Stores rows as `Vec<Cell>` so SGR attributes and wide-char flags survive
//! retirement. A `VecDeque` ring gives O(1) append at the back and O(1)
//! eviction at the front when the cap is exceeded. The buffer is read-only
//! to the application: mutations are append, front-eviction, and explicit
//! clear.

use std::collections::VecDeque;

use crate::cell::Cell;

/// A single retired row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollbackLine {
    /// The cells of this line at the moment it left the viewport.
    pub cells: Vec<Cell>,
}

impl ScrollbackLine {
    /// Create a new scrollback line from a cell slice.
    pub fn new(cells: &[Cell]) -> Self {
        Self {
            cells: cells.to_vec(),
        }
    }

    /// Text content with trailing blanks trimmed.
    pub fn text(&self) -> String {
        let s: String = self
            .cells
            .iter()
            .filter(|c| !c.is_wide_continuation())
            .map(|c| c.content())
            .collect();
        s.trim_end().to_string()
    }
}

/// Scrollback ring with a configurable line cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scrollback {
    lines: VecDeque<ScrollbackLine>,
    cap: usize,
}

impl Scrollback {
    /// Create a new scrollback with the given line cap.
    ///
    /// A cap of `0` disables scrollback entirely (all pushes are dropped).
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(cap.min(4096)),
            cap,
        }
    }

    /// Maximum number of lines this scrollback can hold.
    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Change the cap, evicting the oldest lines if over the new limit.
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        while self.lines.len() > cap {
            self.lines.pop_front();
        }
    }

    /// Current number of stored lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the scrollback is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a retired row, evicting the oldest line if at the cap.
    pub fn push_row(&mut self, cells: &[Cell]) {
        if self.cap == 0 {
            return;
        }
        if self.lines.len() == self.cap {
            self.lines.pop_front();
        }
        self.lines.push_back(ScrollbackLine::new(cells));
    }

    /// Get a line by index (0 = oldest).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScrollbackLine> {
        self.lines.get(index)
    }

    /// Text of a line by index (0 = oldest), trailing blanks trimmed.
    #[must_use]
    pub fn line_text(&self, index: usize) -> Option<String> {
        self.lines.get(index).map(ScrollbackLine::text)
    }

    /// Iterate over stored lines from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ScrollbackLine> {
        self.lines.iter()
    }

    /// Drop all stored lines (ED 3, RIS).
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for Scrollback {
    fn default() -> Self {
        Self::new(0)
    }
}

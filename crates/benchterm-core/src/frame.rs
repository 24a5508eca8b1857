//! Read-only frames: what UI consumers see.
//!
//! A frame is an immutable copy of the visible grid plus the resolved
//! caret and a generation counter. Producing one never locks the screen
//! against further mutation; the caller copies what it needs. The
//! generation counter lets collaborators skip redraws cheaply.

use crate::cell::{Color, SgrFlags};
use crate::cursor::CursorShape;

/// The caret a UI should draw, resolved via the visual-cursor rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub row: u16,
    pub col: u16,
    /// Mirrors DECTCEM (mode 25).
    pub visible: bool,
    /// DECSCUSR shape hint.
    pub shape: CursorShape,
}

/// One styled cell in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCell {
    pub ch: char,
    /// 0 for wide-char continuations, 1 for narrow, 2 for wide.
    pub width: u8,
    pub fg: Color,
    pub bg: Color,
    pub attrs: SgrFlags,
}

/// An immutable snapshot of the visible screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub rows: u16,
    pub cols: u16,
    /// Row-major styled cells; `cells.len() == rows`, each row `cols` long.
    pub cells: Vec<Vec<FrameCell>>,
    pub caret: Caret,
    /// VT cursor at snapshot time (may differ from the caret).
    pub cursor: (u16, u16),
    /// Window title from the most recent OSC 0/2, empty if never set.
    pub title: String,
    /// Monotonic counter, bumped on every screen mutation.
    pub generation: u64,
}

impl Frame {
    /// A row's styled cells.
    pub fn row(&self, row: u16) -> &[FrameCell] {
        &self.cells[row as usize]
    }

    /// Text of one row, trailing blanks trimmed, continuations skipped.
    pub fn row_text(&self, row: u16) -> String {
        let s: String = self.cells[row as usize]
            .iter()
            .filter(|c| c.width != 0)
            .map(|c| c.ch)
            .collect();
        s.trim_end().to_string()
    }

    /// All visible text, rows joined with newlines.
    pub fn text(&self) -> String {
        (0..self.rows)
            .map(|r| self.row_text(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(ch: char) -> FrameCell {
        FrameCell {
            ch,
            width: 1,
            fg: Color::Default,
            bg: Color::Default,
            attrs: SgrFlags::empty(),
        }
    }

    #[test]
    fn row_text_trims_trailing_blanks() {
        let frame = Frame {
            rows: 1,
            cols: 4,
            cells: vec![vec![blank('h'), blank('i'), blank(' '), blank(' ')]],
            caret: Caret {
                row: 0,
                col: 2,
                visible: true,
                shape: CursorShape::Default,
            },
            cursor: (0, 2),
            title: String::new(),
            generation: 1,
        };
        assert_eq!(frame.row_text(0), "hi");
        assert_eq!(frame.text(), "hi");
    }

    #[test]
    fn continuation_cells_are_skipped_in_text() {
        let mut wide = blank('中');
        wide.width = 2;
        let mut cont = blank(' ');
        cont.width = 0;
        let frame = Frame {
            rows: 1,
            cols: 3,
            cells: vec![vec![wide, cont, blank('x')]],
            caret: Caret {
                row: 0,
                col: 3,
                visible: true,
                shape: CursorShape::Default,
            },
            cursor: (0, 3),
            title: String::new(),
            generation: 1,
        };
        assert_eq!(frame.row_text(0), "中x");
    }
}

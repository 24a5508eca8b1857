//! Cursor state: position, pending wrap, attributes, tab stops, scroll
//! region, and character-set selection.
//!
//! The cursor owns everything the VT cursor-addressing commands touch. The
//! `pending_wrap` flag implements DECAWM's deferred wrap: after a glyph is
//! written to the rightmost column the cursor *stays* on that column and the
//! wrap happens just before the next printable glyph.

use crate::cell::SgrAttrs;

/// Translate a character through the DEC Special Graphics charset.
///
/// Maps ASCII 0x60-0x7E to Unicode line-drawing and symbol characters.
/// Characters outside this range pass through unchanged.
fn dec_graphics_char(ch: char) -> char {
    match ch {
        '`' => '\u{25C6}', // ◆ diamond
        'a' => '\u{2592}', // ▒ checker board
        'b' => '\u{2409}', // ␉ HT symbol
        'c' => '\u{240C}', // ␌ FF symbol
        'd' => '\u{240D}', // ␍ CR symbol
        'e' => '\u{240A}', // ␊ LF symbol
        'f' => '\u{00B0}', // ° degree sign
        'g' => '\u{00B1}', // ± plus-minus
        'h' => '\u{2424}', // ␤ NL symbol
        'i' => '\u{240B}', // ␋ VT symbol
        'j' => '\u{2518}', // ┘ lower-right corner
        'k' => '\u{2510}', // ┐ upper-right corner
        'l' => '\u{250C}', // ┌ upper-left corner
        'm' => '\u{2514}', // └ lower-left corner
        'n' => '\u{253C}', // ┼ crossing lines
        'o' => '\u{23BA}', // ⎺ scan line 1
        'p' => '\u{23BB}', // ⎻ scan line 3
        'q' => '\u{2500}', // ─ horizontal line
        'r' => '\u{23BC}', // ⎼ scan line 7
        's' => '\u{23BD}', // ⎽ scan line 9
        't' => '\u{251C}', // ├ left tee
        'u' => '\u{2524}', // ┤ right tee
        'v' => '\u{2534}', // ┴ bottom tee
        'w' => '\u{252C}', // ┬ top tee
        'x' => '\u{2502}', // │ vertical line
        'y' => '\u{2264}', // ≤ less-than-or-equal
        'z' => '\u{2265}', // ≥ greater-than-or-equal
        '{' => '\u{03C0}', // π pi
        '|' => '\u{2260}', // ≠ not-equal
        '}' => '\u{00A3}', // £ pound sign
        '~' => '\u{00B7}', // · centered dot
        _ => ch,
    }
}

/// Translate a character through the given charset designator.
///
/// `b'B'` (US-ASCII) and anything unrecognized pass through; `b'0'` selects
/// DEC Special Graphics (line drawing).
pub fn translate_charset(ch: char, designator: u8) -> char {
    match designator {
        b'0' => dec_graphics_char(ch),
        _ => ch,
    }
}

/// Cursor shape as set by DECSCUSR (`CSI Ps SP q`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Default,
    BlinkingBlock,
    SteadyBlock,
    BlinkingUnderline,
    SteadyUnderline,
    BlinkingBar,
    SteadyBar,
}

impl CursorShape {
    /// Map a DECSCUSR parameter (0-6) to a shape.
    pub fn from_param(p: u8) -> Self {
        match p {
            1 => Self::BlinkingBlock,
            2 => Self::SteadyBlock,
            3 => Self::BlinkingUnderline,
            4 => Self::SteadyUnderline,
            5 => Self::BlinkingBar,
            6 => Self::SteadyBar,
            _ => Self::Default,
        }
    }
}

/// Snapshot of cursor state taken by DECSC and restored by DECRC.
///
/// At most one level: a repeated save overwrites the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedCursor {
    pub row: u16,
    pub col: u16,
    pub pending_wrap: bool,
    pub attrs: SgrAttrs,
    pub origin_mode: bool,
    pub charsets: [u8; 4],
    pub active_charset: u8,
}

impl Default for SavedCursor {
    /// The state DECRC restores when nothing was ever saved: home, default
    /// attributes, ASCII charsets.
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            attrs: SgrAttrs::default(),
            origin_mode: false,
            charsets: [b'B'; 4],
            active_charset: 0,
        }
    }
}

/// VT cursor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Current row, 0-indexed. Always `< rows`.
    pub row: u16,
    /// Current column, 0-indexed. Always `< cols`; the deferred-wrap state
    /// is carried by `pending_wrap`, not by an out-of-range column.
    pub col: u16,
    /// Deferred autowrap: set after writing to the rightmost column.
    pub pending_wrap: bool,
    /// Current SGR attribute set applied to printed glyphs.
    pub attrs: SgrAttrs,
    /// DECOM: cursor addressing relative to the scroll region.
    pub origin_mode: bool,
    /// Charset designators for G0-G3 (`b'B'` ASCII, `b'0'` DEC graphics).
    pub charsets: [u8; 4],
    /// Active charset slot (0 = G0, 1 = G1, ...).
    pub active_charset: u8,
    /// Single-shift override: next printed char uses G2/G3 then reverts.
    pub single_shift: Option<u8>,
    /// Scroll region top, 0-indexed inclusive.
    scroll_top: u16,
    /// Scroll region bottom, 0-indexed exclusive.
    scroll_bottom: u16,
    /// `tab_stops[col]` is true if `col` is a tab stop.
    tab_stops: Vec<bool>,
}

impl Cursor {
    /// Create a cursor at home with default tab stops (every 8th column)
    /// and a full-height scroll region.
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            attrs: SgrAttrs::default(),
            origin_mode: false,
            charsets: [b'B'; 4],
            active_charset: 0,
            single_shift: None,
            scroll_top: 0,
            scroll_bottom: rows,
            tab_stops: Self::default_tab_stops(cols),
        }
    }

    /// Create a cursor at an arbitrary position (tests and restores).
    pub fn at(row: u16, col: u16) -> Self {
        let mut cursor = Self::new(col.saturating_add(1), row.saturating_add(1));
        cursor.row = row;
        cursor.col = col;
        cursor
    }

    fn default_tab_stops(cols: u16) -> Vec<bool> {
        (0..cols).map(|c| c > 0 && c % 8 == 0).collect()
    }

    // ── Scroll region ───────────────────────────────────────────────

    /// Scroll region top (0-indexed, inclusive).
    pub fn scroll_top(&self) -> u16 {
        self.scroll_top
    }

    /// Scroll region bottom (0-indexed, exclusive).
    pub fn scroll_bottom(&self) -> u16 {
        self.scroll_bottom
    }

    /// Set the scroll region from DECSTBM values (0-indexed inclusive top,
    /// exclusive bottom). Invalid regions (`top >= bottom` or out of range)
    /// are rejected and leave the region unchanged.
    ///
    /// Returns whether the region was accepted.
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16, rows: u16) -> bool {
        let bottom = if bottom == 0 || bottom > rows {
            rows
        } else {
            bottom
        };
        if top + 1 >= bottom {
            return false;
        }
        self.scroll_top = top;
        self.scroll_bottom = bottom;
        true
    }

    /// Reset the scroll region to full height.
    pub fn reset_scroll_region(&mut self, rows: u16) {
        self.scroll_top = 0;
        self.scroll_bottom = rows;
    }

    /// Whether the region covers the whole screen.
    pub fn region_is_full(&self, rows: u16) -> bool {
        self.scroll_top == 0 && self.scroll_bottom == rows
    }

    // ── Movement ────────────────────────────────────────────────────

    /// CR: move to column 0. Clears pending wrap.
    pub fn carriage_return(&mut self) {
        self.col = 0;
        self.pending_wrap = false;
    }

    /// CUU: move up, clamped at the scroll-region top when inside the
    /// region, at row 0 otherwise. Clears pending wrap.
    pub fn move_up(&mut self, count: u16) {
        let limit = if self.row >= self.scroll_top {
            self.scroll_top
        } else {
            0
        };
        self.row = self.row.saturating_sub(count.max(1)).max(limit);
        self.pending_wrap = false;
    }

    /// CUD: move down, clamped at the scroll-region bottom when inside the
    /// region, at the last row otherwise. Clears pending wrap.
    pub fn move_down(&mut self, count: u16, rows: u16) {
        let limit = if self.row < self.scroll_bottom {
            self.scroll_bottom
        } else {
            rows
        };
        self.row = self
            .row
            .saturating_add(count.max(1))
            .min(limit.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// CUF: move right, clamped to the last column. Clears pending wrap.
    pub fn move_right(&mut self, count: u16, cols: u16) {
        self.col = self
            .col
            .saturating_add(count.max(1))
            .min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// CUB: move left, clamped at column 0. Clears pending wrap.
    pub fn move_left(&mut self, count: u16) {
        self.col = self.col.saturating_sub(count.max(1));
        self.pending_wrap = false;
    }

    /// CUP/HVP: absolute move. In origin mode the row is biased by the
    /// scroll-region top and clamped inside the region. Clears pending wrap.
    pub fn move_to(&mut self, row: u16, col: u16, rows: u16, cols: u16) {
        if self.origin_mode {
            self.row = row
                .saturating_add(self.scroll_top)
                .min(self.scroll_bottom.saturating_sub(1));
        } else {
            self.row = row.min(rows.saturating_sub(1));
        }
        self.col = col.min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    /// Clamp position into the given bounds (used after resize).
    pub fn clamp(&mut self, rows: u16, cols: u16) {
        self.row = self.row.min(rows.saturating_sub(1));
        self.col = self.col.min(cols.saturating_sub(1));
        self.pending_wrap = false;
    }

    // ── Tab stops ───────────────────────────────────────────────────

    /// HT: the next tab stop to the right, or the last column if none.
    pub fn next_tab_stop(&self, cols: u16) -> u16 {
        let mut col = self.col.saturating_add(1);
        while col < cols {
            if self.tab_stops.get(col as usize).copied().unwrap_or(false) {
                return col;
            }
            col += 1;
        }
        cols.saturating_sub(1)
    }

    /// CBT: the previous tab stop to the left, or column 0 if none.
    pub fn prev_tab_stop(&self) -> u16 {
        let mut col = self.col;
        while col > 0 {
            col -= 1;
            if self.tab_stops.get(col as usize).copied().unwrap_or(false) {
                return col;
            }
        }
        0
    }

    /// HTS: set a tab stop at the current column.
    pub fn set_tab_stop(&mut self) {
        let col = self.col as usize;
        if col < self.tab_stops.len() {
            self.tab_stops[col] = true;
        }
    }

    /// TBC 0: clear the tab stop at the current column.
    pub fn clear_tab_stop(&mut self) {
        let col = self.col as usize;
        if col < self.tab_stops.len() {
            self.tab_stops[col] = false;
        }
    }

    /// TBC 3: clear all tab stops.
    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.fill(false);
    }

    /// Rebuild tab stops for a new width, keeping explicit stops in the
    /// surviving columns and seeding default stops in new columns.
    pub fn resize_tab_stops(&mut self, cols: u16) {
        let old = self.tab_stops.len();
        self.tab_stops
            .resize_with(cols as usize, Default::default);
        for c in old..cols as usize {
            self.tab_stops[c] = c > 0 && c % 8 == 0;
        }
    }

    // ── Charsets ────────────────────────────────────────────────────

    /// Resolve the charset designator for the next printed glyph,
    /// consuming a pending single shift if one is set.
    pub fn take_charset(&mut self) -> u8 {
        if let Some(slot) = self.single_shift.take() {
            self.charsets[(slot as usize).min(3)]
        } else {
            self.charsets[(self.active_charset as usize).min(3)]
        }
    }

    // ── Save / restore ──────────────────────────────────────────────

    /// DECSC: snapshot the restorable portion of the cursor state.
    pub fn save(&self) -> SavedCursor {
        SavedCursor {
            row: self.row,
            col: self.col,
            pending_wrap: self.pending_wrap,
            attrs: self.attrs,
            origin_mode: self.origin_mode,
            charsets: self.charsets,
            active_charset: self.active_charset,
        }
    }

    /// DECRC: restore a snapshot, clamping the position into bounds.
    pub fn restore(&mut self, saved: &SavedCursor, rows: u16, cols: u16) {
        self.row = saved.row.min(rows.saturating_sub(1));
        self.col = saved.col.min(cols.saturating_sub(1));
        self.pending_wrap = saved.pending_wrap;
        self.attrs = saved.attrs;
        self.origin_mode = saved.origin_mode;
        self.charsets = saved.charsets;
        self.active_charset = saved.active_charset;
        self.single_shift = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Color, SgrFlags};

    #[test]
    fn new_cursor_at_home() {
        let c = Cursor::new(80, 24);
        assert_eq!((c.row, c.col), (0, 0));
        assert!(!c.pending_wrap);
        assert_eq!(c.scroll_top(), 0);
        assert_eq!(c.scroll_bottom(), 24);
    }

    #[test]
    fn movement_clamps_to_grid() {
        let mut c = Cursor::new(10, 5);
        c.move_up(3);
        assert_eq!(c.row, 0);
        c.move_down(100, 5);
        assert_eq!(c.row, 4);
        c.move_left(2);
        assert_eq!(c.col, 0);
        c.move_right(100, 10);
        assert_eq!(c.col, 9);
    }

    #[test]
    fn movement_clamps_to_scroll_region() {
        let mut c = Cursor::new(10, 10);
        assert!(c.set_scroll_region(2, 8, 10));
        c.move_to(4, 0, 10, 10);
        c.move_up(10);
        assert_eq!(c.row, 2);
        c.move_down(10, 10);
        assert_eq!(c.row, 7);
    }

    #[test]
    fn movement_outside_region_clamps_to_grid() {
        let mut c = Cursor::new(10, 10);
        assert!(c.set_scroll_region(4, 8, 10));
        // Cursor above the region: CUU may reach row 0.
        c.move_to(2, 0, 10, 10);
        c.move_up(10);
        assert_eq!(c.row, 0);
        // Cursor below the region: CUD may reach the last row.
        c.row = 9;
        c.move_down(5, 10);
        assert_eq!(c.row, 9);
    }

    #[test]
    fn movement_clears_pending_wrap() {
        let mut c = Cursor::new(10, 5);
        c.pending_wrap = true;
        c.move_left(1);
        assert!(!c.pending_wrap);
        c.pending_wrap = true;
        c.carriage_return();
        assert!(!c.pending_wrap);
        c.pending_wrap = true;
        c.move_to(1, 1, 5, 10);
        assert!(!c.pending_wrap);
    }

    #[test]
    fn origin_mode_biases_move_to() {
        let mut c = Cursor::new(80, 24);
        assert!(c.set_scroll_region(5, 20, 24));
        c.origin_mode = true;
        c.move_to(0, 0, 24, 80);
        assert_eq!(c.row, 5);
        // Clamped inside the region even for large rows.
        c.move_to(100, 0, 24, 80);
        assert_eq!(c.row, 19);
    }

    #[test]
    fn invalid_scroll_region_rejected() {
        let mut c = Cursor::new(80, 24);
        assert!(!c.set_scroll_region(5, 5, 24));
        assert!(!c.set_scroll_region(10, 3, 24));
        assert_eq!(c.scroll_top(), 0);
        assert_eq!(c.scroll_bottom(), 24);
    }

    #[test]
    fn single_row_region_is_invalid() {
        // DECSTBM requires at least two rows; a one-row region is refused.
        let mut c = Cursor::new(80, 24);
        assert!(!c.set_scroll_region(3, 4, 24));
    }

    #[test]
    fn default_tab_stops_every_8() {
        let c = Cursor::new(40, 4);
        assert_eq!(c.next_tab_stop(40), 8);
        let mut c = Cursor::at(0, 8);
        c.resize_tab_stops(40);
        assert_eq!(c.next_tab_stop(40), 16);
    }

    #[test]
    fn tab_past_last_stop_goes_to_last_column() {
        let mut c = Cursor::new(10, 2);
        c.col = 9;
        assert_eq!(c.next_tab_stop(10), 9);
    }

    #[test]
    fn custom_tab_stops() {
        let mut c = Cursor::new(40, 4);
        c.col = 3;
        c.set_tab_stop();
        c.col = 0;
        assert_eq!(c.next_tab_stop(40), 3);
        c.col = 3;
        c.clear_tab_stop();
        c.col = 0;
        assert_eq!(c.next_tab_stop(40), 8);
        c.clear_all_tab_stops();
        assert_eq!(c.next_tab_stop(40), 39);
    }

    #[test]
    fn back_tab() {
        let mut c = Cursor::new(40, 4);
        c.col = 20;
        assert_eq!(c.prev_tab_stop(), 16);
        c.col = 5;
        assert_eq!(c.prev_tab_stop(), 0);
    }

    #[test]
    fn save_restore_roundtrip() {
        let mut c = Cursor::new(80, 24);
        c.move_to(5, 10, 24, 80);
        c.attrs.apply_sgr(&[1, 31]);
        c.origin_mode = true;
        c.charsets[0] = b'0';
        let saved = c.save();

        c.move_to(0, 0, 24, 80);
        c.attrs.reset();
        c.origin_mode = false;
        c.charsets[0] = b'B';

        c.restore(&saved, 24, 80);
        assert_eq!((c.row, c.col), (5, 10));
        assert!(c.attrs.flags.contains(SgrFlags::BOLD));
        assert_eq!(c.attrs.fg, Color::Indexed(1));
        assert!(c.origin_mode);
        assert_eq!(c.charsets[0], b'0');
    }

    #[test]
    fn restore_clamps_to_smaller_grid() {
        let mut c = Cursor::new(80, 24);
        c.move_to(20, 70, 24, 80);
        let saved = c.save();
        c.restore(&saved, 10, 40);
        assert_eq!((c.row, c.col), (9, 39));
    }

    #[test]
    fn charset_translation() {
        assert_eq!(translate_charset('q', b'0'), '─');
        assert_eq!(translate_charset('x', b'0'), '│');
        assert_eq!(translate_charset('q', b'B'), 'q');
        assert_eq!(translate_charset('A', b'0'), 'A');
    }

    #[test]
    fn single_shift_consumed_once() {
        let mut c = Cursor::new(80, 24);
        c.charsets[2] = b'0';
        c.single_shift = Some(2);
        assert_eq!(c.take_charset(), b'0');
        assert_eq!(c.take_charset(), b'B');
    }
}

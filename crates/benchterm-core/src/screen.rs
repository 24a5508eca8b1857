//! The screen engine: owns the parser, grid, cursor, modes, and scrollback,
//! and applies parsed actions to them.
//!
//! `Screen::feed` is the single entry point for PTY output. It is a plain
//! synchronous call: bytes go through the parser, the resulting actions
//! mutate the grid, and any device-query responses are pushed to the
//! outbound sink. The engine performs no I/O and has no suspension points;
//! one screen is instantiated per PTY and must be externally serialized if
//! shared across threads.

use tracing::{debug, trace};

use crate::caret::{CaretResolver, CaretRule, DEFAULT_PROMPT_MARKERS};
use crate::cell::{Cell, Color};
use crate::cursor::{Cursor, CursorShape, SavedCursor, translate_charset};
use crate::diag::{Diagnostics, DiagnosticsSnapshot, ResizeError};
use crate::frame::{Caret, Frame, FrameCell};
use crate::grid::Grid;
use crate::modes::Modes;
use crate::parser::{Action, Parser};
use crate::reply::{DEFAULT_DA_PRIMARY, ReplyContext, ReplyEngine, ResponseSink, TerminalQuery};
use crate::scrollback::Scrollback;

/// Construction-time options.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Initial grid height. Default 24.
    pub rows: u16,
    /// Initial grid width. Default 80.
    pub cols: u16,
    /// Scrollback line cap. Default 1000; 0 disables scrollback.
    pub scrollback_cap: usize,
    /// Power-on value of DECAWM. Default true.
    pub autowrap_default: bool,
    /// Prompt markers for the visual-caret heuristic; empty disables it.
    pub prompt_markers: Vec<String>,
    /// Which caret-resolution rules run. Evaluation order is fixed.
    pub caret_rules: Vec<CaretRule>,
    /// Bytes emitted for primary DA / DECID.
    pub da_primary: Vec<u8>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            rows: 24,
            cols: 80,
            scrollback_cap: 1000,
            autowrap_default: true,
            prompt_markers: DEFAULT_PROMPT_MARKERS.iter().map(|s| s.to_string()).collect(),
            caret_rules: vec![
                CaretRule::ReverseVideo,
                CaretRule::PromptMarker,
                CaretRule::VtCursor,
            ],
            da_primary: DEFAULT_DA_PRIMARY.to_vec(),
        }
    }
}

impl ScreenConfig {
    /// Set the initial grid size.
    pub fn with_size(mut self, rows: u16, cols: u16) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Set the scrollback cap (0 disables).
    pub fn with_scrollback_cap(mut self, cap: usize) -> Self {
        self.scrollback_cap = cap;
        self
    }

    /// Set the power-on autowrap value.
    pub fn with_autowrap(mut self, autowrap: bool) -> Self {
        self.autowrap_default = autowrap;
        self
    }

    /// Replace the prompt marker list.
    pub fn with_prompt_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prompt_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the caret-resolution rules.
    pub fn with_caret_rules(mut self, rules: &[CaretRule]) -> Self {
        self.caret_rules = rules.to_vec();
        self
    }

    /// Override the primary DA reply bytes.
    pub fn with_da_primary(mut self, bytes: &[u8]) -> Self {
        self.da_primary = bytes.to_vec();
        self
    }
}

/// Primary-screen state stashed while the alternate buffer is active.
#[derive(Debug)]
struct PrimaryStash {
    grid: Grid,
    cursor: Cursor,
    saved_cursor: Option<SavedCursor>,
}

/// A complete terminal screen: parser, grid, cursor, modes, scrollback,
/// probe responder, and visual-caret resolver.
#[derive(Debug)]
pub struct Screen {
    rows: u16,
    cols: u16,
    parser: Parser,
    /// Reusable action buffer for `feed`.
    actions: Vec<Action>,
    grid: Grid,
    scrollback: Scrollback,
    cursor: Cursor,
    saved_cursor: Option<SavedCursor>,
    modes: Modes,
    autowrap_default: bool,
    stash: Option<Box<PrimaryStash>>,
    title: String,
    cursor_shape: CursorShape,
    /// Most recently printed glyph, for REP.
    last_char: Option<char>,
    replies: ReplyEngine,
    resolver: CaretResolver,
    diag: Diagnostics,
    generation: u64,
}

impl Screen {
    /// Create a screen with no outbound sink (probe responses are dropped
    /// and counted).
    pub fn new(config: ScreenConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a screen with an outbound response sink.
    pub fn with_sink(config: ScreenConfig, sink: ResponseSink) -> Self {
        Self::build(config, Some(sink))
    }

    fn build(config: ScreenConfig, sink: Option<ResponseSink>) -> Self {
        let rows = config.rows.max(1);
        let cols = config.cols.max(1);
        Self {
            rows,
            cols,
            parser: Parser::new(),
            actions: Vec::new(),
            grid: Grid::new(cols, rows),
            scrollback: Scrollback::new(config.scrollback_cap),
            cursor: Cursor::new(cols, rows),
            saved_cursor: None,
            modes: Modes::power_on(config.autowrap_default),
            autowrap_default: config.autowrap_default,
            stash: None,
            title: String::new(),
            cursor_shape: CursorShape::Default,
            last_char: None,
            replies: ReplyEngine::new(sink, config.da_primary),
            resolver: CaretResolver::new(&config.caret_rules, config.prompt_markers),
            diag: Diagnostics::default(),
            generation: 0,
        }
    }

    // ── Public surface ──────────────────────────────────────────────

    /// Grid height.
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Grid width.
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// The visible grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The scrollback ring.
    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    /// Current mode flags.
    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    /// Whether the cursor is visible (DECTCEM).
    pub fn cursor_visible(&self) -> bool {
        self.modes.dec.cursor_visible
    }

    /// The VT cursor position `(row, col)`.
    ///
    /// With the wrap pending the reported column is one past the last
    /// written glyph and may equal `cols`.
    pub fn cursor_position(&self) -> (u16, u16) {
        (
            self.cursor.row,
            self.cursor.col + u16::from(self.cursor.pending_wrap),
        )
    }

    /// Whether the next printable glyph will wrap first.
    pub fn pending_wrap(&self) -> bool {
        self.cursor.pending_wrap
    }

    /// Window title from the most recent OSC 0/2.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Monotonic mutation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current diagnostic counters.
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diag.snapshot()
    }

    /// Adjust the scrollback cap, evicting the oldest lines if needed.
    pub fn set_scrollback_cap(&mut self, cap: usize) {
        self.scrollback.set_cap(cap);
        self.generation += 1;
    }

    /// Feed PTY output bytes. Accepts arbitrary-size slices; sequences
    /// split across calls are reassembled by the parser.
    pub fn feed(&mut self, bytes: &[u8]) {
        let mut actions = std::mem::take(&mut self.actions);
        actions.clear();
        self.parser.feed_into(bytes, &mut actions);
        for action in actions.drain(..) {
            self.apply(action);
            self.generation += 1;
        }
        self.actions = actions;
    }

    /// Resize the grid, reflowing by truncation.
    ///
    /// Width shrink clips trailing cells; width growth pads with blanks.
    /// Height shrink retires top rows into scrollback (primary screen
    /// only) so content around the cursor stays visible; height growth
    /// pads blank rows at the bottom. The cursor is clamped, the scroll
    /// region reset to full height.
    pub fn resize(&mut self, rows: u16, cols: u16) -> Result<(), ResizeError> {
        if rows < 1 || cols < 1 {
            return Err(ResizeError::TooSmall { rows, cols });
        }
        if rows == self.rows && cols == self.cols {
            return Ok(());
        }
        debug!(rows, cols, old_rows = self.rows, old_cols = self.cols, "resize");

        let shrink = self.rows.saturating_sub(rows);
        if shrink > 0 && !self.modes.dec.alternate_screen {
            // Retire rows above the cursor so it stays in view.
            let push = shrink.min(self.cursor.row);
            if push > 0 {
                self.grid
                    .scroll_up_into(0, self.rows, push, &mut self.scrollback, Color::Default);
                self.cursor.row -= push;
            }
        }

        self.grid.resize(cols, rows);
        if let Some(stash) = &mut self.stash {
            stash.grid.resize(cols, rows);
            stash.cursor.clamp(rows, cols);
            stash.cursor.reset_scroll_region(rows);
            stash.cursor.resize_tab_stops(cols);
        }

        self.cursor.resize_tab_stops(cols);
        self.cursor.reset_scroll_region(rows);
        self.cursor.clamp(rows, cols);
        self.rows = rows;
        self.cols = cols;
        self.generation += 1;
        Ok(())
    }

    /// Produce a read-only frame: styled cells, resolved caret, generation.
    pub fn snapshot(&self) -> Frame {
        let mut cells = Vec::with_capacity(self.rows as usize);
        for row in 0..self.rows {
            let row_cells = self
                .grid
                .row_cells(row)
                .map(|cells| {
                    cells
                        .iter()
                        .map(|c| FrameCell {
                            ch: c.content(),
                            width: c.width(),
                            fg: c.attrs.fg,
                            bg: c.attrs.bg,
                            attrs: c.attrs.flags,
                        })
                        .collect()
                })
                .unwrap_or_default();
            cells.push(row_cells);
        }

        let vt_cursor = self.cursor_position();
        let (caret_row, caret_col) = self.resolver.resolve(&self.grid, vt_cursor);
        Frame {
            rows: self.rows,
            cols: self.cols,
            cells,
            caret: Caret {
                row: caret_row,
                col: caret_col,
                visible: self.modes.dec.cursor_visible,
                shape: self.cursor_shape,
            },
            cursor: vt_cursor,
            title: self.title.clone(),
            generation: self.generation,
        }
    }

    // ── Action dispatch ─────────────────────────────────────────────

    fn apply(&mut self, action: Action) {
        match action {
            Action::Print(ch) => self.print_char(ch),
            Action::InvalidUtf8 => {
                self.diag.malformed_utf8 += 1;
                self.print_char(char::REPLACEMENT_CHARACTER);
            }
            Action::Newline => {
                self.cursor.pending_wrap = false;
                self.linefeed();
            }
            Action::CarriageReturn => self.cursor.carriage_return(),
            Action::Tab => {
                self.cursor.col = self.cursor.next_tab_stop(self.cols);
                self.cursor.pending_wrap = false;
            }
            Action::Backspace => self.cursor.move_left(1),
            Action::Bell => {}
            Action::ShiftOut => self.cursor.active_charset = 1,
            Action::ShiftIn => self.cursor.active_charset = 0,

            Action::CursorUp(n) => self.cursor.move_up(n),
            Action::CursorDown(n) => self.cursor.move_down(n, self.rows),
            Action::CursorRight(n) => self.cursor.move_right(n, self.cols),
            Action::CursorLeft(n) => self.cursor.move_left(n),
            Action::CursorNextLine(n) => {
                self.cursor.move_down(n, self.rows);
                self.cursor.carriage_return();
            }
            Action::CursorPrevLine(n) => {
                self.cursor.move_up(n);
                self.cursor.carriage_return();
            }
            Action::CursorColumn(col) => {
                self.cursor.col = col.min(self.cols.saturating_sub(1));
                self.cursor.pending_wrap = false;
            }
            Action::CursorRow(row) => {
                self.cursor.row = if self.cursor.origin_mode {
                    row.saturating_add(self.cursor.scroll_top())
                        .min(self.cursor.scroll_bottom().saturating_sub(1))
                } else {
                    row.min(self.rows.saturating_sub(1))
                };
                self.cursor.pending_wrap = false;
            }
            Action::CursorPosition { row, col } => {
                self.cursor.move_to(row, col, self.rows, self.cols);
            }

            Action::EraseInDisplay(mode) => {
                let (row, col) = (self.cursor.row, self.cursor.col);
                let bg = self.cursor.attrs.bg;
                match mode {
                    0 => self.grid.erase_below(row, col, bg),
                    1 => self.grid.erase_above(row, col, bg),
                    _ => self.grid.erase_all(bg),
                }
            }
            Action::EraseScrollback => {
                self.grid.erase_all(self.cursor.attrs.bg);
                self.scrollback.clear();
            }
            Action::EraseInLine(mode) => {
                let (row, col) = (self.cursor.row, self.cursor.col);
                let bg = self.cursor.attrs.bg;
                match mode {
                    0 => self.grid.erase_line_right(row, col, bg),
                    1 => self.grid.erase_line_left(row, col, bg),
                    _ => self.grid.erase_line(row, bg),
                }
            }
            Action::EraseChars(n) => {
                self.grid
                    .erase_chars(self.cursor.row, self.cursor.col, n, self.cursor.attrs.bg);
            }

            Action::InsertLines(n) => {
                self.grid.insert_lines(
                    self.cursor.row,
                    n,
                    self.cursor.scroll_top(),
                    self.cursor.scroll_bottom(),
                    self.cursor.attrs.bg,
                );
            }
            Action::DeleteLines(n) => {
                self.grid.delete_lines(
                    self.cursor.row,
                    n,
                    self.cursor.scroll_top(),
                    self.cursor.scroll_bottom(),
                    self.cursor.attrs.bg,
                );
            }
            Action::InsertChars(n) => {
                self.grid
                    .insert_chars(self.cursor.row, self.cursor.col, n, self.cursor.attrs.bg);
            }
            Action::DeleteChars(n) => {
                self.grid
                    .delete_chars(self.cursor.row, self.cursor.col, n, self.cursor.attrs.bg);
            }

            Action::ScrollUp(n) => self.scroll_up_in_region(n),
            Action::ScrollDown(n) => {
                self.grid.scroll_down(
                    self.cursor.scroll_top(),
                    self.cursor.scroll_bottom(),
                    n,
                    self.cursor.attrs.bg,
                );
            }
            Action::SetScrollRegion { top, bottom } => {
                if self.cursor.set_scroll_region(top, bottom, self.rows) {
                    self.cursor.move_to(0, 0, self.rows, self.cols);
                }
            }
            Action::Index => {
                self.cursor.pending_wrap = false;
                self.linefeed();
            }
            Action::ReverseIndex => {
                self.cursor.pending_wrap = false;
                if self.cursor.row == self.cursor.scroll_top() {
                    self.grid.scroll_down(
                        self.cursor.scroll_top(),
                        self.cursor.scroll_bottom(),
                        1,
                        self.cursor.attrs.bg,
                    );
                } else if self.cursor.row > 0 {
                    self.cursor.row -= 1;
                }
            }
            Action::NextLine => {
                self.cursor.carriage_return();
                self.linefeed();
            }

            Action::Sgr(params) => self.cursor.attrs.apply_sgr(&params),
            Action::DecSet(modes) => {
                for mode in modes {
                    self.set_dec_mode(mode, true);
                }
            }
            Action::DecRst(modes) => {
                for mode in modes {
                    self.set_dec_mode(mode, false);
                }
            }
            Action::AnsiSet(modes) => {
                for mode in modes {
                    self.set_ansi_mode(mode, true);
                }
            }
            Action::AnsiRst(modes) => {
                for mode in modes {
                    self.set_ansi_mode(mode, false);
                }
            }

            Action::SaveCursor => self.saved_cursor = Some(self.cursor.save()),
            Action::RestoreCursor => {
                let saved = self.saved_cursor.unwrap_or_default();
                self.cursor.restore(&saved, self.rows, self.cols);
                self.modes.dec.origin = self.cursor.origin_mode;
            }

            Action::SetTabStop => self.cursor.set_tab_stop(),
            Action::ClearTabStop(mode) => match mode {
                0 => self.cursor.clear_tab_stop(),
                3 | 5 => self.cursor.clear_all_tab_stops(),
                _ => {}
            },
            Action::BackTab(n) => {
                for _ in 0..n {
                    self.cursor.col = self.cursor.prev_tab_stop();
                }
                self.cursor.pending_wrap = false;
            }

            Action::FullReset => self.full_reset(),
            Action::SoftReset => self.soft_reset(),
            Action::ScreenAlignment => {
                self.grid.fill_all('E');
                self.cursor.reset_scroll_region(self.rows);
                self.cursor.move_to(0, 0, self.rows, self.cols);
            }
            Action::RepeatChar(n) => {
                if let Some(ch) = self.last_char {
                    for _ in 0..n {
                        self.print_char(ch);
                    }
                }
            }
            Action::SetCursorShape(p) => self.cursor_shape = CursorShape::from_param(p),
            Action::SetTitle(title) => {
                trace!(title = %title, "window title");
                self.title = title;
            }

            Action::DesignateCharset { slot, charset } => {
                self.cursor.charsets[(slot as usize).min(3)] = charset;
            }
            Action::SingleShift2 => self.cursor.single_shift = Some(2),
            Action::SingleShift3 => self.cursor.single_shift = Some(3),
            Action::ApplicationKeypad => self.modes.dec.app_keypad = true,
            Action::NormalKeypad => self.modes.dec.app_keypad = false,

            Action::DeviceStatusReport => self.respond(TerminalQuery::DeviceStatus),
            Action::CursorPositionReport => self.respond(TerminalQuery::CursorPosition),
            Action::DeviceAttributes | Action::Identify => {
                self.respond(TerminalQuery::PrimaryAttributes);
            }
            Action::DeviceAttributesSecondary => {
                self.respond(TerminalQuery::SecondaryAttributes);
            }

            Action::Escape(seq) => {
                if is_csi_shaped(&seq) {
                    self.diag.unknown_csi_final += 1;
                } else {
                    self.diag.malformed_escape += 1;
                }
                trace!(seq = ?seq, "unhandled escape sequence");
            }
        }
    }

    // ── Printing ────────────────────────────────────────────────────

    fn print_char(&mut self, ch: char) {
        let ch = translate_charset(ch, self.cursor.take_charset());
        let width = Cell::display_width(ch);
        if width == 0 {
            return;
        }

        if self.cursor.pending_wrap {
            self.cursor.pending_wrap = false;
            if self.modes.dec.autowrap {
                self.cursor.col = 0;
                self.linefeed();
            }
        }

        // A wide glyph that cannot fit before the right margin wraps early
        // (or, without autowrap, is placed in the last two columns).
        if width == 2 && self.cursor.col + 1 >= self.cols {
            if self.modes.dec.autowrap {
                if let Some(cell) = self.grid.cell_mut(self.cursor.row, self.cursor.col) {
                    cell.erase(self.cursor.attrs.bg);
                }
                self.cursor.col = 0;
                self.linefeed();
            } else if self.cols >= 2 {
                self.cursor.col = self.cols - 2;
            } else {
                return;
            }
        }

        if self.modes.ansi.insert {
            self.grid.insert_chars(
                self.cursor.row,
                self.cursor.col,
                u16::from(width),
                self.cursor.attrs.bg,
            );
        }

        let written =
            self.grid
                .write_printable(self.cursor.row, self.cursor.col, ch, self.cursor.attrs);
        if written == 0 {
            return;
        }
        self.last_char = Some(ch);

        let advance = u16::from(written);
        if self.cursor.col + advance >= self.cols {
            if self.modes.dec.autowrap {
                // Deferred wrap: stay on the line until the next glyph.
                self.cursor.pending_wrap = true;
            } else {
                self.cursor.col = self.cols - 1;
            }
        } else {
            self.cursor.col += advance;
        }
    }

    // ── Line movement & scrolling ───────────────────────────────────

    fn linefeed(&mut self) {
        if self.cursor.row + 1 == self.cursor.scroll_bottom() {
            self.scroll_up_in_region(1);
        } else if self.cursor.row + 1 < self.rows {
            self.cursor.row += 1;
        }
    }

    /// Scroll the region up. On the primary screen with a full-height
    /// region the displaced rows retire into scrollback; otherwise they
    /// are dropped.
    fn scroll_up_in_region(&mut self, count: u16) {
        let top = self.cursor.scroll_top();
        let bottom = self.cursor.scroll_bottom();
        let bg = self.cursor.attrs.bg;
        if !self.modes.dec.alternate_screen && self.cursor.region_is_full(self.rows) {
            self.grid
                .scroll_up_into(top, bottom, count, &mut self.scrollback, bg);
        } else {
            self.grid.scroll_up(top, bottom, count, bg);
        }
    }

    // ── Modes ───────────────────────────────────────────────────────

    fn set_dec_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            1 => self.modes.dec.app_cursor_keys = enable,
            6 => {
                self.modes.dec.origin = enable;
                self.cursor.origin_mode = enable;
                // DECOM homes the cursor (region-relative when enabling).
                self.cursor.move_to(0, 0, self.rows, self.cols);
            }
            7 => {
                self.modes.dec.autowrap = enable;
                if !enable {
                    self.cursor.pending_wrap = false;
                }
            }
            25 => self.modes.dec.cursor_visible = enable,
            1000 => self.modes.dec.mouse_click = enable,
            1002 => self.modes.dec.mouse_motion = enable,
            1006 => self.modes.dec.mouse_sgr = enable,
            2004 => self.modes.dec.bracketed_paste = enable,
            1047 => self.switch_alternate(enable, false),
            1049 => self.switch_alternate(enable, true),
            _ => {
                self.diag.unknown_mode += 1;
                debug!(mode, enable, "unknown DEC private mode");
            }
        }
    }

    fn set_ansi_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            4 => self.modes.ansi.insert = enable,
            _ => {
                self.diag.unknown_mode += 1;
                debug!(mode, enable, "unknown ANSI mode");
            }
        }
    }

    /// Enter or leave the alternate screen buffer. `with_cursor` is the
    /// 1049 flavor (save and restore the cursor around the switch).
    fn switch_alternate(&mut self, enable: bool, with_cursor: bool) {
        if enable && !self.modes.dec.alternate_screen {
            let stash = PrimaryStash {
                grid: std::mem::replace(&mut self.grid, Grid::new(self.cols, self.rows)),
                cursor: self.cursor.clone(),
                saved_cursor: self.saved_cursor,
            };
            self.stash = Some(Box::new(stash));
            if with_cursor {
                self.cursor.move_to(0, 0, self.rows, self.cols);
            }
            self.cursor.reset_scroll_region(self.rows);
            self.modes.dec.alternate_screen = true;
        } else if !enable && self.modes.dec.alternate_screen {
            if let Some(stash) = self.stash.take() {
                self.grid = stash.grid;
                self.saved_cursor = stash.saved_cursor;
                if with_cursor {
                    self.cursor = stash.cursor;
                }
            }
            self.modes.dec.alternate_screen = false;
        }
    }

    // ── Resets ──────────────────────────────────────────────────────

    fn full_reset(&mut self) {
        self.grid = Grid::new(self.cols, self.rows);
        self.scrollback.clear();
        self.cursor = Cursor::new(self.cols, self.rows);
        self.saved_cursor = None;
        self.modes = Modes::power_on(self.autowrap_default);
        self.stash = None;
        self.title.clear();
        self.cursor_shape = CursorShape::Default;
        self.last_char = None;
    }

    fn soft_reset(&mut self) {
        self.cursor.attrs.reset();
        self.cursor.origin_mode = false;
        self.cursor.reset_scroll_region(self.rows);
        self.cursor.pending_wrap = false;
        self.cursor.charsets = [b'B'; 4];
        self.cursor.active_charset = 0;
        self.cursor.single_shift = None;
        self.saved_cursor = None;
        self.modes.dec.origin = false;
        self.modes.dec.cursor_visible = true;
        self.modes.dec.autowrap = true;
        self.modes.ansi.insert = false;
    }

    // ── Probes ──────────────────────────────────────────────────────

    fn respond(&mut self, query: TerminalQuery) {
        let row = if self.cursor.origin_mode {
            self.cursor.row.saturating_sub(self.cursor.scroll_top())
        } else {
            self.cursor.row
        };
        let ctx = ReplyContext {
            row,
            col: self.cursor.col,
        };
        if !self.replies.respond(query, ctx) {
            self.diag.response_sink_full += 1;
            debug!(?query, "probe response dropped");
        }
    }
}

/// Whether an undecoded sequence was CSI-shaped (well-formed up to an
/// unhandled final byte) as opposed to generally malformed.
fn is_csi_shaped(seq: &[u8]) -> bool {
    if seq.len() < 3 || seq[0] != 0x1b || seq[1] != b'[' {
        return false;
    }
    let body = &seq[2..seq.len() - 1];
    let last = seq[seq.len() - 1];
    (0x40..=0x7E).contains(&last) && body.iter().all(|b| (0x20..=0x3F).contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::SgrFlags;
    use std::sync::{Arc, Mutex};

    fn screen(rows: u16, cols: u16) -> Screen {
        Screen::new(ScreenConfig::default().with_size(rows, cols))
    }

    fn screen_with_capture(rows: u16, cols: u16) -> (Screen, Arc<Mutex<Vec<u8>>>) {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&captured);
        let sink: ResponseSink = Box::new(move |bytes: &[u8]| {
            inner.lock().unwrap().extend_from_slice(bytes);
            true
        });
        let s = Screen::with_sink(ScreenConfig::default().with_size(rows, cols), sink);
        (s, captured)
    }

    fn row_text(s: &Screen, row: u16) -> String {
        s.grid().row_text(row)
    }

    // ── Printing & wrap ─────────────────────────────────────────────

    #[test]
    fn print_simple_text() {
        let mut s = screen(5, 20);
        s.feed(b"Hello");
        assert_eq!(row_text(&s, 0), "Hello");
        assert_eq!(s.cursor_position(), (0, 5));
        assert!(!s.pending_wrap());
    }

    #[test]
    fn hello_wrap_scenario() {
        let mut s = screen(5, 5);
        s.feed(b"Hello");
        assert_eq!(row_text(&s, 0), "Hello");
        assert_eq!(s.cursor_position(), (0, 5));
        assert!(s.pending_wrap());

        s.feed(b"!");
        assert_eq!(row_text(&s, 0), "Hello");
        assert_eq!(row_text(&s, 1), "!");
        assert_eq!(s.cursor_position(), (1, 1));
    }

    #[test]
    fn autowrap_off_overwrites_last_column() {
        let mut s = screen(3, 5);
        s.feed(b"\x1b[?7l");
        s.feed(b"abcdefg");
        assert_eq!(row_text(&s, 0), "abcdg");
        assert_eq!(s.cursor_position(), (0, 4));
    }

    #[test]
    fn wrap_at_bottom_scrolls() {
        let mut s = screen(2, 3);
        s.feed(b"abcdef" );
        // "abc" fills row 0, "def" fills row 1, pending wrap set.
        assert!(s.pending_wrap());
        s.feed(b"g");
        assert_eq!(row_text(&s, 0), "def");
        assert_eq!(row_text(&s, 1), "g");
        assert_eq!(s.scrollback().len(), 1);
        assert_eq!(s.scrollback().line_text(0).unwrap(), "abc");
    }

    #[test]
    fn wide_char_wraps_early() {
        let mut s = screen(2, 5);
        s.feed("abcd中".as_bytes());
        // 中 does not fit in the last column; it wraps to row 1.
        assert_eq!(row_text(&s, 0), "abcd");
        assert_eq!(row_text(&s, 1), "中");
        assert_eq!(s.cursor_position(), (1, 2));
    }

    #[test]
    fn crlf_moves_to_next_line_start() {
        let mut s = screen(5, 20);
        s.feed(b"one\r\ntwo");
        assert_eq!(row_text(&s, 0), "one");
        assert_eq!(row_text(&s, 1), "two");
    }

    #[test]
    fn lf_without_cr_keeps_column() {
        let mut s = screen(5, 20);
        s.feed(b"ab\ncd");
        assert_eq!(row_text(&s, 0), "ab");
        assert_eq!(row_text(&s, 1), "  cd");
    }

    #[test]
    fn insert_mode_shifts_tail() {
        let mut s = screen(2, 10);
        s.feed(b"abc\r\x1b[4hX");
        assert_eq!(row_text(&s, 0), "Xabc");
        s.feed(b"\x1b[4lY");
        assert_eq!(row_text(&s, 0), "XYbc");
    }

    // ── Cursor movement ─────────────────────────────────────────────

    #[test]
    fn cup_and_relative_moves() {
        let mut s = screen(10, 20);
        s.feed(b"\x1b[5;10H");
        assert_eq!(s.cursor_position(), (4, 9));
        s.feed(b"\x1b[2A\x1b[3C");
        assert_eq!(s.cursor_position(), (2, 12));
        s.feed(b"\x1b[10D");
        assert_eq!(s.cursor_position(), (2, 2));
    }

    #[test]
    fn cha_and_vpa() {
        let mut s = screen(10, 20);
        s.feed(b"\x1b[5G\x1b[3d");
        assert_eq!(s.cursor_position(), (2, 4));
    }

    #[test]
    fn backspace_and_tab() {
        let mut s = screen(2, 20);
        s.feed(b"ab\x08");
        assert_eq!(s.cursor_position(), (0, 1));
        s.feed(b"\t");
        assert_eq!(s.cursor_position(), (0, 8));
    }

    // ── Erase ───────────────────────────────────────────────────────

    #[test]
    fn erase_line_from_cursor() {
        let mut s = screen(2, 10);
        s.feed(b"abcdefgh\x1b[1;4H\x1b[K");
        assert_eq!(row_text(&s, 0), "abc");
    }

    #[test]
    fn erase_display_preserves_bg() {
        let mut s = screen(3, 5);
        s.feed(b"\x1b[44mxy\x1b[2J");
        assert_eq!(row_text(&s, 0), "");
        assert_eq!(
            s.grid().cell(0, 0).unwrap().attrs.bg,
            Color::Indexed(4)
        );
        assert_eq!(s.grid().cell(0, 0).unwrap().attrs.flags, SgrFlags::empty());
    }

    #[test]
    fn ed2_then_home_equals_fresh_screen() {
        let mut s = screen(4, 10);
        s.feed(b"hello\r\nworld\x1b[31m");
        s.feed(b"\x1b[0m\x1b[2J\x1b[H");
        let fresh = screen(4, 10);
        assert_eq!(s.grid(), fresh.grid());
        assert_eq!(s.cursor_position(), (0, 0));
    }

    #[test]
    fn ed3_clears_scrollback() {
        let mut s = screen(2, 5);
        s.feed(b"a\r\nb\r\nc\r\nd");
        assert!(s.scrollback().len() > 0);
        s.feed(b"\x1b[3J");
        assert_eq!(s.scrollback().len(), 0);
        assert_eq!(row_text(&s, 0), "");
    }

    // ── Scroll region ───────────────────────────────────────────────

    #[test]
    fn scroll_region_confines_linefeed() {
        let mut s = screen(5, 3);
        s.feed(b"\x1b[2;4r");
        // Home after DECSTBM.
        assert_eq!(s.cursor_position(), (0, 0));
        s.feed(b"top\x1b[2;1Ha\r\nb\r\nc\r\nd\r\ne");
        // Rows 1-3 scroll among themselves; row 0 keeps "top".
        assert_eq!(row_text(&s, 0), "top");
        assert_eq!(row_text(&s, 4), "");
    }

    #[test]
    fn partial_region_scroll_does_not_feed_scrollback() {
        let mut s = screen(5, 3);
        s.feed(b"\x1b[2;4r\x1b[4;1H\na\nb\nc");
        assert_eq!(s.scrollback().len(), 0);
    }

    #[test]
    fn su_sd_within_region() {
        let mut s = screen(4, 2);
        s.feed(b"aa\r\nbb\r\ncc\r\ndd");
        s.feed(b"\x1b[2;3r\x1b[S");
        assert_eq!(row_text(&s, 0), "aa");
        assert_eq!(row_text(&s, 1), "cc");
        assert_eq!(row_text(&s, 2), "");
        assert_eq!(row_text(&s, 3), "dd");
        s.feed(b"\x1b[T");
        assert_eq!(row_text(&s, 1), "");
        assert_eq!(row_text(&s, 2), "cc");
    }

    #[test]
    fn reverse_index_scrolls_down_at_top() {
        let mut s = screen(3, 2);
        s.feed(b"aa\r\nbb\x1b[H\x1bM");
        assert_eq!(row_text(&s, 0), "");
        assert_eq!(row_text(&s, 1), "aa");
        assert_eq!(row_text(&s, 2), "bb");
    }

    #[test]
    fn origin_mode_homes_to_region() {
        let mut s = screen(10, 20);
        s.feed(b"\x1b[3;8r\x1b[?6h");
        assert_eq!(s.cursor_position(), (2, 0));
        s.feed(b"\x1b[1;1H");
        assert_eq!(s.cursor_position(), (2, 0));
        s.feed(b"\x1b[100;1H");
        assert_eq!(s.cursor_position(), (7, 0));
        s.feed(b"\x1b[?6l");
        assert_eq!(s.cursor_position(), (0, 0));
    }

    #[test]
    fn single_scrollable_pair_region() {
        // Region of rows 2-3 (the smallest valid region): SU clears within.
        let mut s = screen(4, 2);
        s.feed(b"aa\r\nbb\r\ncc\r\ndd\x1b[2;3r\x1b[2S");
        assert_eq!(row_text(&s, 0), "aa");
        assert_eq!(row_text(&s, 1), "");
        assert_eq!(row_text(&s, 2), "");
        assert_eq!(row_text(&s, 3), "dd");
    }

    // ── Save / restore, alternate screen ────────────────────────────

    #[test]
    fn decsc_decrc_roundtrip() {
        let mut s = screen(10, 20);
        s.feed(b"\x1b[5;10H\x1b[1;31m\x1b7");
        s.feed(b"\x1b[H\x1b[0m\x1b[?6h");
        s.feed(b"\x1b8");
        assert_eq!(s.cursor_position(), (4, 9));
        let frame = s.snapshot();
        assert_eq!(frame.cursor, (4, 9));
        // Attributes and origin flag restored.
        s.feed(b"x");
        let cell = s.grid().cell(4, 9).unwrap();
        assert!(cell.attrs.flags.contains(SgrFlags::BOLD));
        assert_eq!(cell.attrs.fg, Color::Indexed(1));
    }

    #[test]
    fn decrc_without_save_resets_to_defaults() {
        let mut s = screen(10, 20);
        s.feed(b"\x1b[5;10H\x1b[1m\x1b8");
        assert_eq!(s.cursor_position(), (0, 0));
        s.feed(b"x");
        assert!(
            !s.grid()
                .cell(0, 0)
                .unwrap()
                .attrs
                .flags
                .contains(SgrFlags::BOLD)
        );
    }

    #[test]
    fn alternate_screen_roundtrip() {
        let mut s = screen(5, 20);
        s.feed(b"primary\x1b[1;3H");
        let before = s.snapshot();

        s.feed(b"\x1b[?1049h");
        assert!(s.modes().dec.alternate_screen);
        assert_eq!(row_text(&s, 0), "");
        s.feed(b"A");
        assert_eq!(row_text(&s, 0), "A");

        s.feed(b"\x1b[?1049l");
        assert!(!s.modes().dec.alternate_screen);
        let after = s.snapshot();
        assert_eq!(after.text(), before.text());
        assert_eq!(after.cursor, before.cursor);
        assert!(!after.text().contains('A'));
    }

    #[test]
    fn alternate_screen_does_not_touch_scrollback() {
        let mut s = screen(2, 5);
        s.feed(b"a\r\nb\r\nc");
        let before = s.scrollback().len();
        s.feed(b"\x1b[?1049h");
        s.feed(b"x\r\ny\r\nz\r\nw");
        assert_eq!(s.scrollback().len(), before);
        s.feed(b"\x1b[?1049l");
        assert_eq!(s.scrollback().len(), before);
    }

    // ── Modes ───────────────────────────────────────────────────────

    #[test]
    fn tracked_modes_flip() {
        let mut s = screen(5, 10);
        s.feed(b"\x1b[?1h\x1b[?1000h\x1b[?1002h\x1b[?1006h\x1b[?2004h\x1b=");
        let m = s.modes();
        assert!(m.dec.app_cursor_keys);
        assert!(m.dec.mouse_click);
        assert!(m.dec.mouse_motion);
        assert!(m.dec.mouse_sgr);
        assert!(m.dec.bracketed_paste);
        assert!(m.dec.app_keypad);
        s.feed(b"\x1b[?1l\x1b[?2004l\x1b>");
        let m = s.modes();
        assert!(!m.dec.app_cursor_keys);
        assert!(!m.dec.bracketed_paste);
        assert!(!m.dec.app_keypad);
    }

    #[test]
    fn cursor_visibility_mode() {
        let mut s = screen(5, 10);
        assert!(s.cursor_visible());
        s.feed(b"\x1b[?25l");
        assert!(!s.cursor_visible());
        assert!(!s.snapshot().caret.visible);
        s.feed(b"\x1b[?25h");
        assert!(s.cursor_visible());
    }

    #[test]
    fn unknown_mode_is_counted_not_fatal() {
        let mut s = screen(5, 10);
        s.feed(b"\x1b[?9999h\x1b[77h");
        assert_eq!(s.diagnostics().unknown_mode, 2);
        s.feed(b"ok");
        assert_eq!(row_text(&s, 0), "ok");
    }

    // ── Probes ──────────────────────────────────────────────────────

    #[test]
    fn dsr_cursor_position_report() {
        let (mut s, captured) = screen_with_capture(24, 80);
        s.feed(b"\x1b[10;20H\x1b[6n");
        assert_eq!(&*captured.lock().unwrap(), b"\x1b[10;20R");
    }

    #[test]
    fn dsr_status_report() {
        let (mut s, captured) = screen_with_capture(24, 80);
        s.feed(b"\x1b[5n");
        assert_eq!(&*captured.lock().unwrap(), b"\x1b[0n");
    }

    #[test]
    fn da_primary_and_decid() {
        let (mut s, captured) = screen_with_capture(24, 80);
        s.feed(b"\x1b[c\x1bZ");
        assert_eq!(&*captured.lock().unwrap(), b"\x1b[?6c\x1b[?6c");
    }

    #[test]
    fn cup_then_dsr_roundtrip() {
        let (mut s, captured) = screen_with_capture(24, 80);
        for (r, c) in [(1u16, 1u16), (12, 40), (24, 80)] {
            captured.lock().unwrap().clear();
            let seq = format!("\x1b[{r};{c}H\x1b[6n");
            s.feed(seq.as_bytes());
            let expected = format!("\x1b[{r};{c}R").into_bytes();
            assert_eq!(&*captured.lock().unwrap(), &expected);
        }
    }

    #[test]
    fn origin_mode_dsr_is_region_relative() {
        let (mut s, captured) = screen_with_capture(24, 80);
        s.feed(b"\x1b[5;20r\x1b[?6h\x1b[3;4H\x1b[6n");
        assert_eq!(&*captured.lock().unwrap(), b"\x1b[3;4R");
    }

    #[test]
    fn dropped_responses_are_counted() {
        let mut s = screen(24, 80);
        s.feed(b"\x1b[6n\x1b[5n");
        assert_eq!(s.diagnostics().response_sink_full, 2);
    }

    // ── Malformed input ─────────────────────────────────────────────

    #[test]
    fn malformed_utf8_is_replaced() {
        let mut s = screen(2, 10);
        s.feed(&[0x41, 0xFF, 0x42]);
        assert_eq!(row_text(&s, 0), "A\u{FFFD}B");
        assert_eq!(s.diagnostics().malformed_utf8, 1);
    }

    #[test]
    fn unknown_csi_final_counted_without_mutation() {
        let mut s = screen(2, 10);
        s.feed(b"ab\x1b[5y cd");
        assert_eq!(s.diagnostics().unknown_csi_final, 1);
        assert_eq!(row_text(&s, 0), "ab cd");
    }

    #[test]
    fn malformed_escape_counted() {
        let mut s = screen(2, 10);
        s.feed(b"\x1bq");
        assert_eq!(s.diagnostics().malformed_escape, 1);
    }

    // ── DECALN, reset, REP, charsets ────────────────────────────────

    #[test]
    fn decaln_fills_grid() {
        let mut s = screen(3, 4);
        s.feed(b"\x1b#8");
        for r in 0..3 {
            assert_eq!(row_text(&s, r), "EEEE");
        }
        assert_eq!(s.cursor_position(), (0, 0));
    }

    #[test]
    fn full_reset_restores_power_on_state() {
        let mut s = screen(3, 10);
        s.feed(b"\x1b[31mhi\x1b[?25l\x1b[2;3r\x1b]0;title\x07\x1bc");
        assert_eq!(row_text(&s, 0), "");
        assert!(s.cursor_visible());
        assert_eq!(s.title(), "");
        assert_eq!(s.cursor_position(), (0, 0));
        s.feed(b"x\n");
        // Scroll region is back to full height.
        assert_eq!(s.cursor_position(), (1, 1));
    }

    #[test]
    fn soft_reset_keeps_screen_content() {
        let mut s = screen(3, 10);
        s.feed(b"keep\x1b[31m\x1b[2;3r\x1b[?6h\x1b[?25l\x1b[!p");
        assert_eq!(row_text(&s, 0), "keep");
        assert!(!s.modes().dec.origin);
        assert!(s.cursor_visible());
        // Scroll region is back to full height.
        s.feed(b"\x1b[1;1Hx");
        let cell = s.grid().cell(0, 0).unwrap();
        assert_eq!(cell.content(), 'x');
        assert_eq!(cell.attrs.fg, Color::Default);
    }

    #[test]
    fn rep_repeats_last_glyph() {
        let mut s = screen(2, 10);
        s.feed(b"a\x1b[3b");
        assert_eq!(row_text(&s, 0), "aaaa");
    }

    #[test]
    fn dec_graphics_charset_translates() {
        let mut s = screen(2, 10);
        s.feed(b"\x1b(0qqx\x1b(Bq");
        assert_eq!(row_text(&s, 0), "──│q");
    }

    #[test]
    fn so_si_switch_between_g0_g1() {
        let mut s = screen(2, 10);
        s.feed(b"\x1b)0q\x0eq\x0fq");
        assert_eq!(row_text(&s, 0), "q─q");
    }

    // ── Resize ──────────────────────────────────────────────────────

    #[test]
    fn resize_rejects_zero() {
        let mut s = screen(5, 10);
        assert!(s.resize(0, 10).is_err());
        assert!(s.resize(5, 0).is_err());
        assert_eq!(s.rows(), 5);
        assert_eq!(s.cols(), 10);
    }

    #[test]
    fn resize_wider_pads_narrower_clips() {
        let mut s = screen(2, 5);
        s.feed(b"abcde");
        s.resize(2, 8).unwrap();
        assert_eq!(row_text(&s, 0), "abcde");
        s.resize(2, 3).unwrap();
        assert_eq!(row_text(&s, 0), "abc");
    }

    #[test]
    fn resize_shorter_retires_rows_to_scrollback() {
        let mut s = screen(4, 5);
        s.feed(b"a\r\nb\r\nc\r\nd");
        assert_eq!(s.cursor_position(), (3, 1));
        s.resize(2, 5).unwrap();
        assert_eq!(s.rows(), 2);
        assert_eq!(s.scrollback().line_text(0).unwrap(), "a");
        assert_eq!(s.scrollback().line_text(1).unwrap(), "b");
        assert_eq!(row_text(&s, 0), "c");
        assert_eq!(row_text(&s, 1), "d");
        assert_eq!(s.cursor_position(), (1, 1));
    }

    #[test]
    fn resize_taller_pads_bottom() {
        let mut s = screen(2, 5);
        s.feed(b"a\r\nb");
        s.resize(4, 5).unwrap();
        assert_eq!(row_text(&s, 0), "a");
        assert_eq!(row_text(&s, 1), "b");
        assert_eq!(row_text(&s, 3), "");
        assert_eq!(s.cursor_position(), (1, 1));
    }

    #[test]
    fn resize_clamps_cursor_and_resets_region() {
        let mut s = screen(10, 40);
        s.feed(b"\x1b[3;8r\x1b[8;30H");
        s.resize(4, 10).unwrap();
        let (row, col) = s.cursor_position();
        assert!(row < 4 && col < 10);
        // Region reset: a linefeed at the bottom scrolls the full screen.
        s.feed(b"\x1b[4;1Hx\n");
        assert_eq!(s.rows(), 4);
    }

    // ── Frames ──────────────────────────────────────────────────────

    #[test]
    fn snapshot_has_full_cell_coverage() {
        let mut s = screen(3, 7);
        s.feed(b"hi");
        let frame = s.snapshot();
        assert_eq!(frame.cells.len(), 3);
        assert!(frame.cells.iter().all(|row| row.len() == 7));
    }

    #[test]
    fn generation_advances_with_mutations() {
        let mut s = screen(3, 7);
        let g0 = s.snapshot().generation;
        s.feed(b"x");
        let g1 = s.snapshot().generation;
        assert!(g1 > g0);
        // Snapshots do not advance the generation.
        assert_eq!(s.snapshot().generation, g1);
    }

    #[test]
    fn title_is_exposed() {
        let mut s = screen(3, 7);
        s.feed(b"\x1b]2;benchterm\x07");
        assert_eq!(s.title(), "benchterm");
        assert_eq!(s.snapshot().title, "benchterm");
    }

    #[test]
    fn cursor_shape_tracked() {
        let mut s = screen(3, 7);
        s.feed(b"\x1b[5 q");
        assert_eq!(s.snapshot().caret.shape, CursorShape::BlinkingBar);
    }

    #[test]
    fn scrollback_cap_is_enforced() {
        let mut s = Screen::new(
            ScreenConfig::default()
                .with_size(2, 5)
                .with_scrollback_cap(3),
        );
        for _ in 0..10 {
            s.feed(b"x\r\n");
        }
        assert_eq!(s.scrollback().len(), 3);
        s.set_scrollback_cap(1);
        assert_eq!(s.scrollback().len(), 1);
    }
}

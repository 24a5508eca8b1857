#![forbid(unsafe_code)]

//! Host-agnostic VT/ANSI terminal engine with visual-caret resolution.
//!
//! `benchterm-core` is the platform-independent terminal model at the heart
//! of benchterm. It owns grid state, VT/ANSI parsing, cursor positioning,
//! scrollback, and device-query responses — all without any host I/O.
//!
//! # Primary responsibilities
//!
//! - **Grid**: 2D cell matrix representing the visible terminal viewport.
//! - **Cell**: character content + SGR attributes (colors, bold, reverse, ...).
//! - **Parser**: VT/ANSI state machine driven one byte at a time.
//! - **Screen**: applies parsed actions — cursor, modes, scroll region,
//!   alternate buffer, tab stops, save/restore.
//! - **Scrollback**: ring buffer for rows scrolled off the top.
//! - **Reply**: DSR/DA responder feeding an outbound sink, so wrapped CLIs
//!   that probe the terminal (Codex does) keep working.
//! - **Caret**: resolves the *visual* caret that AI CLIs paint with
//!   reverse video instead of cursor positioning.
//! - **Frame**: immutable snapshots for UI consumers, with a generation
//!   counter for cheap redraw skipping.
//!
//! # Design principles
//!
//! - **No I/O**: the host adapter supplies bytes and drains responses.
//! - **Deterministic**: identical byte streams produce identical state,
//!   regardless of how the input is chunked.
//! - **No panics on input**: malformed bytes are replaced, absorbed, or
//!   counted — never fatal.
//!
//! # Example
//!
//! ```
//! use benchterm_core::{Screen, ScreenConfig};
//!
//! let mut screen = Screen::new(ScreenConfig::default().with_size(24, 80));
//! screen.feed(b"\x1b[1;31mhello\x1b[0m");
//! let frame = screen.snapshot();
//! assert_eq!(frame.row_text(0), "hello");
//! assert_eq!(frame.cursor, (0, 5));
//! ```

pub mod caret;
pub mod cell;
pub mod cursor;
pub mod diag;
pub mod frame;
pub mod grid;
pub mod modes;
pub mod parser;
pub mod reply;
pub mod screen;
pub mod scrollback;

pub use caret::{CaretResolver, CaretRule, DEFAULT_PROMPT_MARKERS};
pub use cell::{Cell, CellFlags, Color, SgrAttrs, SgrFlags};
pub use cursor::{Cursor, CursorShape, SavedCursor, translate_charset};
pub use diag::{Diagnostics, DiagnosticsSnapshot, ResizeError};
pub use frame::{Caret, Frame, FrameCell};
pub use grid::Grid;
pub use modes::{AnsiModes, DecModes, Modes};
pub use parser::{Action, CsiParams, Parser};
pub use reply::{
    DEFAULT_DA_PRIMARY, DEFAULT_DA_SECONDARY, ReplyContext, ReplyEngine, ResponseSink,
    TerminalQuery, reply_for_query,
};
pub use screen::{Screen, ScreenConfig};
pub use scrollback::{Scrollback, ScrollbackLine};

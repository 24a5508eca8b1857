//! Terminal mode flags: DEC private modes and ANSI standard modes.
//!
//! Modes are plain booleans with defined power-on values. Mouse-tracking
//! and keyboard modes are tracked so embedders can inspect them, but the
//! core takes no action on them.

/// DEC private modes (DECSET / DECRST, `CSI ? Pm h/l`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecModes {
    /// Mode 1 (DECCKM): application cursor keys.
    pub app_cursor_keys: bool,
    /// Mode 6 (DECOM): origin mode. Mirrored into the cursor.
    pub origin: bool,
    /// Mode 7 (DECAWM): autowrap. Default on.
    pub autowrap: bool,
    /// Mode 25 (DECTCEM): cursor visible. Default on.
    pub cursor_visible: bool,
    /// Mode 1000: X11 mouse click tracking (tracked, not acted on).
    pub mouse_click: bool,
    /// Mode 1002: mouse motion tracking (tracked, not acted on).
    pub mouse_motion: bool,
    /// Mode 1006: SGR extended mouse reporting (tracked, not acted on).
    pub mouse_sgr: bool,
    /// Mode 1047/1049: alternate screen buffer active.
    pub alternate_screen: bool,
    /// Mode 2004: bracketed paste.
    pub bracketed_paste: bool,
    /// DECKPAM / DECKPNM (`ESC =` / `ESC >`): application keypad.
    pub app_keypad: bool,
}

/// ANSI standard modes (SM / RM, `CSI Pm h/l`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnsiModes {
    /// Mode 4 (IRM): insert mode — printed glyphs shift the row tail right.
    pub insert: bool,
}

/// The full mode set with power-on defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modes {
    pub dec: DecModes,
    pub ansi: AnsiModes,
}

impl Modes {
    /// Power-on state. `autowrap_default` is configurable and defaults on.
    pub fn power_on(autowrap_default: bool) -> Self {
        Self {
            dec: DecModes {
                app_cursor_keys: false,
                origin: false,
                autowrap: autowrap_default,
                cursor_visible: true,
                mouse_click: false,
                mouse_motion: false,
                mouse_sgr: false,
                alternate_screen: false,
                bracketed_paste: false,
                app_keypad: false,
            },
            ansi: AnsiModes::default(),
        }
    }
}

impl Default for Modes {
    fn default() -> Self {
        Self::power_on(true)
    }
}

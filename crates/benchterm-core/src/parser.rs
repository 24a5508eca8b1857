//! VT/ANSI parser.
//!
//! A deterministic state machine that converts an output byte stream into a
//! sequence of actions for the screen engine. It covers:
//!
//! - printable characters (ASCII + full UTF-8) -> `Action::Print`
//! - C0 controls -> dedicated actions
//! - CSI sequences (cursor, erase, scroll, SGR, mode set/reset)
//! - OSC sequences (window title; everything else absorbed)
//! - DCS / SOS / PM / APC strings (absorbed to their terminator)
//! - ESC-level sequences (cursor save/restore, index, charset, reset)
//! - capture of undecodable sequences as `Action::Escape` for diagnostics
//!
//! State transitions follow the published VT500-series parser model.
//! Ill-formed UTF-8 is reported as `Action::InvalidUtf8` (one per bad
//! sequence) so the engine can substitute U+FFFD; decoding failures never
//! desync the machine.

use smallvec::SmallVec;

/// Inline capacity for CSI parameter lists.
///
/// Most SGR/DECSET sequences carry <= 4 parameters; this avoids a heap
/// allocation for the common case while remaining transparent to consumers
/// via `Deref<Target = [u16]>`.
pub type CsiParams = SmallVec<[u16; 4]>;

/// Maximum number of CSI parameters accepted before the sequence is
/// treated as malformed.
const MAX_CSI_PARAMS: usize = 16;

/// Runaway-sequence guard: a CSI body longer than this is malformed.
const MAX_CSI_LEN: usize = 96;

/// OSC payloads beyond this many bytes are absorbed but no longer stored.
const MAX_OSC_LEN: usize = 4096;

/// Parser output actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print a single character (ASCII or multi-byte UTF-8).
    Print(char),
    /// An ill-formed UTF-8 sequence was consumed; print U+FFFD in its place.
    InvalidUtf8,
    /// Line feed / newline (`\n`, also VT and FF).
    Newline,
    /// Carriage return (`\r`).
    CarriageReturn,
    /// Horizontal tab (`\t`).
    Tab,
    /// Backspace (`\x08`).
    Backspace,
    /// Bell (`\x07`).
    Bell,
    /// SO (`\x0e`): shift out — invoke G1 into GL.
    ShiftOut,
    /// SI (`\x0f`): shift in — invoke G0 into GL.
    ShiftIn,
    /// CUU (`CSI Ps A`): move cursor up by count (default 1).
    CursorUp(u16),
    /// CUD (`CSI Ps B`): move cursor down by count (default 1).
    CursorDown(u16),
    /// CUF (`CSI Ps C`): move cursor right by count (default 1).
    CursorRight(u16),
    /// CUB (`CSI Ps D`): move cursor left by count (default 1).
    CursorLeft(u16),
    /// CNL (`CSI Ps E`): move cursor down by count and to column 0.
    CursorNextLine(u16),
    /// CPL (`CSI Ps F`): move cursor up by count and to column 0.
    CursorPrevLine(u16),
    /// CHA (`CSI Ps G`): move cursor to absolute column (0-indexed).
    CursorColumn(u16),
    /// VPA (`CSI Ps d`): move cursor to absolute row (0-indexed).
    CursorRow(u16),
    /// CUP/HVP: move cursor to absolute 0-indexed row/col.
    CursorPosition { row: u16, col: u16 },
    /// DECSTBM (`CSI Pt ; Pb r`): set scrolling region. `bottom == 0` means
    /// "use full height" (default), since the parser does not know the grid
    /// size. `top` is 0-indexed inclusive; `bottom` 0-indexed exclusive
    /// when non-zero.
    SetScrollRegion { top: u16, bottom: u16 },
    /// SU (`CSI Ps S`): scroll the scroll region up by count (default 1).
    ScrollUp(u16),
    /// SD (`CSI Ps T`): scroll the scroll region down by count (default 1).
    ScrollDown(u16),
    /// IL (`CSI Ps L`): insert blank lines at cursor row within scroll region.
    InsertLines(u16),
    /// DL (`CSI Ps M`): delete lines at cursor row within scroll region.
    DeleteLines(u16),
    /// ICH (`CSI Ps @`): insert blank cells at cursor column.
    InsertChars(u16),
    /// DCH (`CSI Ps P`): delete cells at cursor column.
    DeleteChars(u16),
    /// ECH (`CSI Ps X`): erase characters at cursor (replace with blanks).
    EraseChars(u16),
    /// ED mode (`CSI Ps J`): 0, 1, or 2.
    EraseInDisplay(u8),
    /// ED mode 3 (`CSI 3 J`): erase the display and the scrollback buffer.
    EraseScrollback,
    /// EL mode (`CSI Ps K`): 0, 1, or 2.
    EraseInLine(u8),
    /// SGR (`CSI ... m`): set graphics rendition parameters.
    ///
    /// Parameters are returned as parsed numeric values; interpretation is
    /// stateful and performed by the cursor's attribute set.
    Sgr(CsiParams),
    /// DECSET (`CSI ? Pm h`): enable DEC private mode(s).
    DecSet(CsiParams),
    /// DECRST (`CSI ? Pm l`): disable DEC private mode(s).
    DecRst(CsiParams),
    /// SM (`CSI Pm h`): enable ANSI standard mode(s).
    AnsiSet(CsiParams),
    /// RM (`CSI Pm l`): disable ANSI standard mode(s).
    AnsiRst(CsiParams),
    /// DECSC (`ESC 7`, also `CSI s`): save cursor state.
    SaveCursor,
    /// DECRC (`ESC 8`, also `CSI u`): restore cursor state.
    RestoreCursor,
    /// IND (`ESC D`): index — cursor down one line, scrolling if at bottom.
    Index,
    /// RI (`ESC M`): reverse index — cursor up one line, scrolling if at top.
    ReverseIndex,
    /// NEL (`ESC E`): next line — cursor to start of next line.
    NextLine,
    /// RIS (`ESC c`): full reset to initial state.
    FullReset,
    /// DECSTR (`CSI ! p`): soft terminal reset.
    ///
    /// Resets modes, SGR, scroll region, cursor visibility, and character
    /// sets without clearing the screen or scrollback — unlike RIS.
    SoftReset,
    /// OSC 0/2: set window title.
    SetTitle(String),
    /// HTS (`ESC H`): set a tab stop at the current cursor column.
    SetTabStop,
    /// TBC (`CSI Ps g`): tab clear. 0 = at cursor, 3 = all tab stops.
    ClearTabStop(u16),
    /// CBT (`CSI Ps Z`): cursor backward tabulation by count (default 1).
    BackTab(u16),
    /// DECKPAM (`ESC =`): application keypad mode.
    ApplicationKeypad,
    /// DECKPNM (`ESC >`): normal keypad mode.
    NormalKeypad,
    /// DECALN (`ESC # 8`): DEC screen alignment test — fill grid with 'E'.
    ScreenAlignment,
    /// REP (`CSI Ps b`): repeat the most recently printed graphic character.
    RepeatChar(u16),
    /// DECSCUSR (`CSI Ps SP q`): set cursor shape.
    ///
    /// 0 = default, 1 = blinking block, 2 = steady block,
    /// 3 = blinking underline, 4 = steady underline,
    /// 5 = blinking bar, 6 = steady bar.
    SetCursorShape(u8),
    /// Designate character set for slot G0..G3.
    ///
    /// `slot`: 0 = G0 (`ESC (`), 1 = G1 (`ESC )`), 2 = G2, 3 = G3.
    /// `charset`: `b'B'` = US-ASCII, `b'0'` = DEC Special Graphics, etc.
    DesignateCharset { slot: u8, charset: u8 },
    /// SS2 (`ESC N`): single shift to G2 for the next printed character.
    SingleShift2,
    /// SS3 (`ESC O`): single shift to G3 for the next printed character.
    SingleShift3,
    /// DA1 (`CSI c` / `CSI 0 c`): request primary device attributes.
    DeviceAttributes,
    /// DA2 (`CSI > c` / `CSI > 0 c`): request secondary device attributes.
    DeviceAttributesSecondary,
    /// DECID (`ESC Z`): identify terminal — answered like primary DA.
    Identify,
    /// DSR (`CSI 5 n`): device status report — "are you OK?" query.
    DeviceStatusReport,
    /// CPR (`CSI 6 n`): request a cursor position report.
    CursorPositionReport,
    /// A raw escape/CSI sequence that could not be decoded (starts with ESC).
    ///
    /// Emitted so the engine can count it; it must cause no state change.
    Escape(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Esc,
    /// ESC # intermediate — waiting for the final byte (e.g., '8' for DECALN).
    EscHash,
    /// ESC ( / ESC ) / ESC * / ESC + — waiting for the charset designator.
    EscCharset { slot: u8 },
    Csi,
    /// Absorbing a malformed CSI up to its final byte.
    CsiIgnore,
    Osc,
    OscEsc,
    /// Absorbing a DCS/SOS/PM/APC string payload (ignored).
    StringBody,
    StringEsc,
    /// Accumulating a multi-byte UTF-8 character; counts continuation
    /// bytes still expected.
    Utf8 { bytes_remaining: u8 },
}

/// VT/ANSI parser state.
#[derive(Debug, Clone)]
pub struct Parser {
    state: State,
    buf: Vec<u8>,
    /// Accumulator for multi-byte UTF-8 character assembly.
    utf8_buf: [u8; 4],
    /// Number of bytes accumulated so far in `utf8_buf`.
    utf8_len: u8,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in ground state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            buf: Vec::new(),
            utf8_buf: [0; 4],
            utf8_len: 0,
        }
    }

    /// Feed a chunk of bytes and return parsed actions.
    #[must_use]
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        let mut out = Vec::new();
        self.feed_into(bytes, &mut out);
        out
    }

    /// Feed a chunk of bytes, appending parsed actions to `out`.
    ///
    /// Callers on hot paths can reuse the output buffer across frames by
    /// calling `out.clear()` before each invocation, retaining capacity.
    pub fn feed_into(&mut self, bytes: &[u8], out: &mut Vec<Action>) {
        for &b in bytes {
            self.advance(b, out);
        }
    }

    /// Advance the parser by one byte, appending any completed actions.
    pub fn advance(&mut self, b: u8, out: &mut Vec<Action>) {
        match self.state {
            State::Ground => self.advance_ground(b, out),
            State::Esc => self.advance_esc(b, out),
            State::EscHash => self.advance_esc_hash(b, out),
            State::EscCharset { slot } => self.advance_esc_charset(b, slot, out),
            State::Csi => self.advance_csi(b, out),
            State::CsiIgnore => self.advance_csi_ignore(b, out),
            State::Osc => self.advance_osc(b, out),
            State::OscEsc => self.advance_osc_esc(b, out),
            State::StringBody => self.advance_string(b),
            State::StringEsc => self.advance_string_esc(b),
            State::Utf8 { bytes_remaining } => self.advance_utf8(b, bytes_remaining, out),
        }
    }

    fn advance_ground(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            b'\n' | 0x0B | 0x0C => out.push(Action::Newline), // LF, VT, FF
            b'\r' => out.push(Action::CarriageReturn),
            b'\t' => out.push(Action::Tab),
            0x08 => out.push(Action::Backspace),
            0x07 => out.push(Action::Bell),
            0x0E => out.push(Action::ShiftOut),
            0x0F => out.push(Action::ShiftIn),
            0x1b => {
                self.state = State::Esc;
                self.buf.clear();
                self.buf.push(0x1b);
            }
            0x20..=0x7E => out.push(Action::Print(b as char)),
            // UTF-8 multi-byte sequence leading bytes:
            0xC2..=0xDF => {
                self.utf8_buf[0] = b;
                self.utf8_len = 1;
                self.state = State::Utf8 { bytes_remaining: 1 };
            }
            0xE0..=0xEF => {
                self.utf8_buf[0] = b;
                self.utf8_len = 1;
                self.state = State::Utf8 { bytes_remaining: 2 };
            }
            0xF0..=0xF4 => {
                self.utf8_buf[0] = b;
                self.utf8_len = 1;
                self.state = State::Utf8 { bytes_remaining: 3 };
            }
            // Stray continuation bytes, overlong leads (0xC0/0xC1), and
            // leads past U+10FFFF (0xF5..) are ill-formed on arrival.
            0x80..=0xBF | 0xC0 | 0xC1 | 0xF5..=0xFF => out.push(Action::InvalidUtf8),
            _ => {} // NUL, DEL, and remaining C0 controls are dropped
        }
    }

    /// Accumulate continuation bytes for a multi-byte UTF-8 character.
    fn advance_utf8(&mut self, b: u8, bytes_remaining: u8, out: &mut Vec<Action>) {
        if (0x80..=0xBF).contains(&b) {
            let idx = self.utf8_len as usize;
            if idx < 4 {
                self.utf8_buf[idx] = b;
                self.utf8_len += 1;
            }
            if bytes_remaining == 1 {
                // Sequence complete — decode, or report the damage.
                self.state = State::Ground;
                let len = self.utf8_len as usize;
                let ch = core::str::from_utf8(&self.utf8_buf[..len])
                    .ok()
                    .and_then(|s| s.chars().next());
                self.utf8_len = 0;
                match ch {
                    Some(ch) => out.push(Action::Print(ch)),
                    None => out.push(Action::InvalidUtf8),
                }
            } else {
                self.state = State::Utf8 {
                    bytes_remaining: bytes_remaining - 1,
                };
            }
        } else {
            // Invalid continuation byte: the partial sequence is ill-formed.
            // Report it, then reprocess this byte in ground state so it is
            // not lost (it may start a new character or escape).
            self.state = State::Ground;
            self.utf8_len = 0;
            out.push(Action::InvalidUtf8);
            self.advance_ground(b, out);
        }
    }

    fn advance_esc(&mut self, b: u8, out: &mut Vec<Action>) {
        self.buf.push(b);
        match b {
            b'[' => {
                self.state = State::Csi;
                return;
            }
            b']' => {
                self.state = State::Osc;
                return;
            }
            // DCS / SOS / PM / APC string payloads: absorbed to ST.
            b'P' | b'X' | b'^' | b'_' => {
                self.state = State::StringBody;
                return;
            }
            b'#' => {
                self.state = State::EscHash;
                return;
            }
            b'(' => {
                self.state = State::EscCharset { slot: 0 };
                return;
            }
            b')' => {
                self.state = State::EscCharset { slot: 1 };
                return;
            }
            b'*' => {
                self.state = State::EscCharset { slot: 2 };
                return;
            }
            b'+' => {
                self.state = State::EscCharset { slot: 3 };
                return;
            }
            _ => {}
        }

        self.state = State::Ground;
        let action = match b {
            b'7' => Action::SaveCursor,
            b'8' => Action::RestoreCursor,
            b'D' => Action::Index,
            b'M' => Action::ReverseIndex,
            b'E' => Action::NextLine,
            b'H' => Action::SetTabStop,
            b'Z' => Action::Identify,
            b'c' => Action::FullReset,
            b'=' => Action::ApplicationKeypad,
            b'>' => Action::NormalKeypad,
            b'N' => Action::SingleShift2,
            b'O' => Action::SingleShift3,
            _ => Action::Escape(self.take_buf()),
        };
        self.buf.clear();
        out.push(action);
    }

    fn advance_esc_hash(&mut self, b: u8, out: &mut Vec<Action>) {
        self.buf.push(b);
        self.state = State::Ground;
        match b {
            // DECALN: DEC screen alignment test (ESC # 8).
            b'8' => {
                self.buf.clear();
                out.push(Action::ScreenAlignment);
            }
            _ => out.push(Action::Escape(self.take_buf())),
        }
    }

    fn advance_esc_charset(&mut self, b: u8, slot: u8, out: &mut Vec<Action>) {
        self.state = State::Ground;
        self.buf.clear();
        out.push(Action::DesignateCharset { slot, charset: b });
    }

    fn advance_csi(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            // Final byte for CSI is 0x40..=0x7E (ECMA-48).
            0x40..=0x7E => {
                self.buf.push(b);
                self.state = State::Ground;
                let seq = self.take_buf();
                out.push(Self::decode_csi(&seq).unwrap_or(Action::Escape(seq)));
            }
            // Parameter and intermediate bytes.
            0x20..=0x3F => {
                self.buf.push(b);
                if self.buf.len() > MAX_CSI_LEN {
                    self.state = State::CsiIgnore;
                }
            }
            // ESC restarts; the half-finished sequence is malformed.
            0x1b => {
                out.push(Action::Escape(self.take_buf()));
                self.state = State::Esc;
                self.buf.push(0x1b);
            }
            // CAN / SUB abort the sequence.
            0x18 | 0x1A => {
                out.push(Action::Escape(self.take_buf()));
                self.state = State::Ground;
            }
            // Any other byte makes the sequence malformed; absorb the rest.
            _ => {
                self.buf.push(b);
                self.state = State::CsiIgnore;
            }
        }
    }

    /// Absorb a malformed CSI up to its final byte, then report it.
    fn advance_csi_ignore(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x40..=0x7E => {
                self.buf.push(b);
                self.state = State::Ground;
                out.push(Action::Escape(self.take_buf()));
            }
            0x1b => {
                out.push(Action::Escape(self.take_buf()));
                self.state = State::Esc;
                self.buf.push(0x1b);
            }
            0x18 | 0x1A => {
                out.push(Action::Escape(self.take_buf()));
                self.state = State::Ground;
            }
            _ => {
                if self.buf.len() < MAX_CSI_LEN * 2 {
                    self.buf.push(b);
                }
            }
        }
    }

    fn advance_osc(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x07 => {
                // BEL terminator.
                self.buf.push(b);
                self.state = State::Ground;
                let seq = self.take_buf();
                if let Some(action) = Self::decode_osc(&seq) {
                    out.push(action);
                }
            }
            0x1b => {
                // ESC, possibly starting the ST terminator (ESC \).
                self.buf.push(b);
                self.state = State::OscEsc;
            }
            _ => {
                if self.buf.len() < MAX_OSC_LEN {
                    self.buf.push(b);
                }
            }
        }
    }

    fn advance_osc_esc(&mut self, b: u8, out: &mut Vec<Action>) {
        self.buf.push(b);
        if b == b'\\' {
            // ST terminator.
            self.state = State::Ground;
            let seq = self.take_buf();
            if let Some(action) = Self::decode_osc(&seq) {
                out.push(action);
            }
            return;
        }
        // False alarm; continue OSC.
        self.state = State::Osc;
    }

    /// DCS/SOS/PM/APC payloads are absorbed without storage.
    fn advance_string(&mut self, b: u8) {
        match b {
            0x1b => self.state = State::StringEsc,
            0x07 => {
                // Tolerate BEL termination (xterm extension for DCS).
                self.buf.clear();
                self.state = State::Ground;
            }
            _ => {}
        }
    }

    fn advance_string_esc(&mut self, b: u8) {
        if b == b'\\' {
            self.buf.clear();
            self.state = State::Ground;
        } else {
            self.state = State::StringBody;
        }
    }

    fn take_buf(&mut self) -> Vec<u8> {
        // Replace with a same-capacity Vec so `self.buf` retains its heap
        // allocation for the next escape sequence.
        let cap = self.buf.capacity();
        core::mem::replace(&mut self.buf, Vec::with_capacity(cap))
    }

    fn decode_csi(seq: &[u8]) -> Option<Action> {
        if seq.len() < 3 || seq[0] != 0x1b || seq[1] != b'[' {
            return None;
        }
        let final_byte = *seq.last()?;
        let param_bytes = &seq[2..seq.len().saturating_sub(1)];

        // DEC private mode indicator `?` prefix.
        if param_bytes.first() == Some(&b'?') {
            let params = Self::parse_csi_params(&param_bytes[1..])?;
            return match final_byte {
                b'h' => Some(Action::DecSet(params)),
                b'l' => Some(Action::DecRst(params)),
                _ => None,
            };
        }

        // `>` prefix: secondary device attributes.
        if param_bytes.first() == Some(&b'>') {
            return match final_byte {
                b'c' => {
                    let params = Self::parse_csi_params(&param_bytes[1..])?;
                    if params.first().copied().unwrap_or(0) == 0 {
                        Some(Action::DeviceAttributesSecondary)
                    } else {
                        None
                    }
                }
                _ => None,
            };
        }

        // `<` / `=` prefixes (SGR mouse input, tertiary DA): not ours.
        if matches!(param_bytes.first(), Some(&b'<') | Some(&b'=')) {
            return None;
        }

        // Separate intermediate bytes (0x20..=0x2F per ECMA-48) from
        // parameter bytes. Intermediates follow parameters.
        let intermediate_start = param_bytes
            .iter()
            .position(|&b| (0x20..=0x2F).contains(&b))
            .unwrap_or(param_bytes.len());
        let (numeric_bytes, intermediates) = param_bytes.split_at(intermediate_start);

        match (intermediates, final_byte) {
            // DECSCUSR (CSI Ps SP q): set cursor shape.
            (b" ", b'q') => {
                let params = Self::parse_csi_params(numeric_bytes)?;
                let shape = params.first().copied().unwrap_or(0);
                return Some(Action::SetCursorShape(shape.min(6) as u8));
            }
            // DECSTR (CSI ! p): soft terminal reset.
            (b"!", b'p') => return Some(Action::SoftReset),
            // Unknown intermediate+final combination.
            _ if !intermediates.is_empty() => return None,
            _ => {}
        }

        let params = Self::parse_csi_params(numeric_bytes)?;

        match final_byte {
            b'A' => Some(Action::CursorUp(Self::count_or_one(&params))),
            b'B' => Some(Action::CursorDown(Self::count_or_one(&params))),
            b'C' => Some(Action::CursorRight(Self::count_or_one(&params))),
            b'D' => Some(Action::CursorLeft(Self::count_or_one(&params))),
            b'E' => Some(Action::CursorNextLine(Self::count_or_one(&params))),
            b'F' => Some(Action::CursorPrevLine(Self::count_or_one(&params))),
            b'G' => Some(Action::CursorColumn(
                Self::count_or_one(&params).saturating_sub(1),
            )),
            b'd' => Some(Action::CursorRow(
                Self::count_or_one(&params).saturating_sub(1),
            )),
            b'H' | b'f' => {
                // CUP/HVP use 1-indexed coordinates; 0 is treated as 1.
                let row = params
                    .first()
                    .copied()
                    .unwrap_or(1)
                    .max(1)
                    .saturating_sub(1);
                let col = params.get(1).copied().unwrap_or(1).max(1).saturating_sub(1);
                Some(Action::CursorPosition { row, col })
            }
            b'J' => {
                let mode = params.first().copied().unwrap_or(0);
                match mode {
                    0..=2 => Some(Action::EraseInDisplay(mode as u8)),
                    3 => Some(Action::EraseScrollback),
                    _ => None,
                }
            }
            b'K' => {
                let mode = params.first().copied().unwrap_or(0);
                if mode <= 2 {
                    Some(Action::EraseInLine(mode as u8))
                } else {
                    None
                }
            }
            b'L' => Some(Action::InsertLines(Self::count_or_one(&params))),
            b'M' => Some(Action::DeleteLines(Self::count_or_one(&params))),
            b'@' => Some(Action::InsertChars(Self::count_or_one(&params))),
            b'P' => Some(Action::DeleteChars(Self::count_or_one(&params))),
            b'X' => Some(Action::EraseChars(Self::count_or_one(&params))),
            b'S' => Some(Action::ScrollUp(Self::count_or_one(&params))),
            b'T' => Some(Action::ScrollDown(Self::count_or_one(&params))),
            b'r' => {
                let top = params
                    .first()
                    .copied()
                    .unwrap_or(0)
                    .max(1)
                    .saturating_sub(1);
                let bottom = params.get(1).copied().unwrap_or(0);
                Some(Action::SetScrollRegion { top, bottom })
            }
            b'm' => Some(Action::Sgr(params)),
            b'g' => {
                let mode = params.first().copied().unwrap_or(0);
                Some(Action::ClearTabStop(mode))
            }
            b'Z' => Some(Action::BackTab(Self::count_or_one(&params))),
            b'b' => Some(Action::RepeatChar(Self::count_or_one(&params))),
            // SCOSC / SCORC (ANSI-style save/restore, CSI s / CSI u).
            b's' => {
                if params.is_empty() || (params.len() == 1 && params[0] == 0) {
                    Some(Action::SaveCursor)
                } else {
                    // CSI with params on 's' could be DECSLRM; not handled.
                    None
                }
            }
            b'u' => {
                if params.is_empty() || (params.len() == 1 && params[0] == 0) {
                    Some(Action::RestoreCursor)
                } else {
                    None
                }
            }
            b'c' => {
                let p = params.first().copied().unwrap_or(0);
                if p == 0 {
                    Some(Action::DeviceAttributes)
                } else {
                    None
                }
            }
            b'n' => {
                let p = params.first().copied().unwrap_or(0);
                match p {
                    5 => Some(Action::DeviceStatusReport),
                    6 => Some(Action::CursorPositionReport),
                    _ => None,
                }
            }
            b'h' => Some(Action::AnsiSet(params)),
            b'l' => Some(Action::AnsiRst(params)),
            _ => None,
        }
    }

    fn decode_osc(seq: &[u8]) -> Option<Action> {
        if seq.len() < 4 || seq[0] != 0x1b || seq[1] != b']' {
            return None;
        }

        // Strip the terminator (BEL or ST).
        let content = if *seq.last()? == 0x07 {
            &seq[2..seq.len().saturating_sub(1)]
        } else if seq.len() >= 4 && seq[seq.len() - 2] == 0x1b && seq[seq.len() - 1] == b'\\' {
            &seq[2..seq.len().saturating_sub(2)]
        } else {
            return None;
        };

        let first_semi = content.iter().position(|&b| b == b';')?;
        let cmd: u16 = core::str::from_utf8(&content[..first_semi])
            .ok()?
            .parse()
            .ok()?;
        let rest = &content[first_semi + 1..];

        match cmd {
            0 | 2 => Some(Action::SetTitle(String::from_utf8_lossy(rest).to_string())),
            // Every other OSC (colors, clipboard, hyperlinks, ...) is
            // accepted and discarded.
            _ => None,
        }
    }

    fn parse_csi_params(params: &[u8]) -> Option<CsiParams> {
        if params.is_empty() {
            return Some(CsiParams::new());
        }
        let s = core::str::from_utf8(params).ok()?;
        let mut out = CsiParams::new();
        for part in s.split(';') {
            if out.len() >= MAX_CSI_PARAMS {
                return None;
            }
            if part.is_empty() {
                out.push(0);
                continue;
            }
            let value = part.parse::<u32>().ok()?;
            out.push(value.min(u16::MAX as u32) as u16);
        }
        Some(out)
    }

    fn count_or_one(params: &[u16]) -> u16 {
        params.first().copied().unwrap_or(1).max(1)
    }
}

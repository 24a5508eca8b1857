//! Visual-caret resolution.
//!
//! Wrapped AI CLIs (Claude, Gemini, Codex) do not position the caret with
//! CUP; they paint a reverse-video cell inside their input box and leave
//! the VT cursor parked at end of line. Real terminals render the
//! highlighted cell as the cursor, so a model that reports the VT cursor
//! looks wrong next to them. The resolver derives the caret the user
//! actually perceives, without touching VT semantics: the VT cursor stays
//! standards-correct, and the caret is a separate, read-only quantity.
//!
//! Three rules are evaluated in a fixed order; the first hit wins:
//!
//! 1. reverse-video scan — a single short run of reverse cells is the caret
//! 2. prompt-marker heuristic — caret sits after the text following a
//!    configured prompt marker on a recent row
//! 3. the VT cursor itself

use crate::cell::SgrFlags;
use crate::grid::Grid;

/// How many rows up from the bottom of the grid the prompt heuristic looks.
const PROMPT_SCAN_ROWS: u16 = 8;

/// Longest reverse-video run still treated as a caret highlight.
const MAX_HIGHLIGHT_RUN: u16 = 4;

/// Prompt markers recognized out of the box: boxed AI-CLI input lines,
/// bare chevron prompts, and plain shell prompts.
pub const DEFAULT_PROMPT_MARKERS: &[&str] = &["│ > ", "> ", "$ "];

/// One resolution rule. Evaluation order is fixed regardless of the order
/// rules are listed in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretRule {
    /// Scan the grid for a single short reverse-video run.
    ReverseVideo,
    /// Look for a configured prompt marker near the bottom of the grid.
    PromptMarker,
    /// Use the VT cursor position.
    VtCursor,
}

/// Resolves the visual caret from grid contents and the VT cursor.
///
/// Resolution is read-only, deterministic for a given grid, and completes
/// in one pass over the cells per rule.
#[derive(Debug, Clone)]
pub struct CaretResolver {
    reverse_enabled: bool,
    prompt_enabled: bool,
    markers: Vec<String>,
}

impl Default for CaretResolver {
    fn default() -> Self {
        Self::new(
            &[
                CaretRule::ReverseVideo,
                CaretRule::PromptMarker,
                CaretRule::VtCursor,
            ],
            DEFAULT_PROMPT_MARKERS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl CaretResolver {
    /// Build a resolver running the given subset of rules with the given
    /// prompt markers. An empty marker list disables the prompt rule.
    ///
    /// The VT cursor remains the terminal fallback even when
    /// [`CaretRule::VtCursor`] is not listed: resolution always produces a
    /// position.
    pub fn new(rules: &[CaretRule], markers: Vec<String>) -> Self {
        Self {
            reverse_enabled: rules.contains(&CaretRule::ReverseVideo),
            prompt_enabled: rules.contains(&CaretRule::PromptMarker) && !markers.is_empty(),
            markers,
        }
    }

    /// A resolver that always reports the VT cursor (traditional shells).
    pub fn vt_only() -> Self {
        Self::new(&[CaretRule::VtCursor], Vec::new())
    }

    /// Resolve the caret position.
    ///
    /// `vt_cursor` is the current `(row, col)` of the VT cursor; it is
    /// returned unchanged when no earlier rule matches.
    pub fn resolve(&self, grid: &Grid, vt_cursor: (u16, u16)) -> (u16, u16) {
        if self.reverse_enabled {
            if let Some(pos) = self.find_reverse_highlight(grid) {
                return pos;
            }
        }
        if self.prompt_enabled {
            if let Some(pos) = self.find_prompt_caret(grid) {
                return pos;
            }
        }
        vt_cursor
    }

    /// Rule 1: exactly one contiguous reverse-video run of 1-4 cells on a
    /// single row. Its first cell is the caret.
    ///
    /// Zero runs means the application is not painting a highlight;
    /// several runs (or a long one) means reverse video is being used for
    /// selection or emphasis, not a caret.
    fn find_reverse_highlight(&self, grid: &Grid) -> Option<(u16, u16)> {
        let mut run: Option<(u16, u16, u16)> = None; // (row, start, len)
        let mut runs_seen = 0u32;

        for row in 0..grid.rows() {
            let cells = grid.row_cells(row)?;
            let mut col = 0u16;
            while (col as usize) < cells.len() {
                if cells[col as usize].attrs.flags.contains(SgrFlags::REVERSE) {
                    let start = col;
                    while (col as usize) < cells.len()
                        && cells[col as usize].attrs.flags.contains(SgrFlags::REVERSE)
                    {
                        col += 1;
                    }
                    runs_seen += 1;
                    if runs_seen > 1 {
                        return None;
                    }
                    run = Some((row, start, col - start));
                } else {
                    col += 1;
                }
            }
        }

        match run {
            Some((row, start, len)) if (1..=MAX_HIGHLIGHT_RUN).contains(&len) => {
                Some((row, start))
            }
            _ => None,
        }
    }

    /// Rule 2: search the last [`PROMPT_SCAN_ROWS`] rows, bottom-up, for a
    /// configured marker. The caret sits one past the last non-space cell
    /// after the marker (or directly after the marker on an empty input).
    fn find_prompt_caret(&self, grid: &Grid) -> Option<(u16, u16)> {
        let rows = grid.rows();
        let cols = grid.cols();
        let first_row = rows.saturating_sub(PROMPT_SCAN_ROWS);

        for row in (first_row..rows).rev() {
            let cells = grid.row_cells(row)?;
            let chars: Vec<char> = cells.iter().map(|c| c.content()).collect();

            for marker in &self.markers {
                let Some(marker_col) = find_marker(&chars, marker) else {
                    continue;
                };
                let after = marker_col + marker.chars().count() as u16;
                let last_non_space = (after..cols)
                    .rev()
                    .find(|&c| chars[c as usize] != ' ');
                let caret_col = match last_non_space {
                    Some(c) => (c + 1).min(cols.saturating_sub(1)),
                    None => after.min(cols.saturating_sub(1)),
                };
                return Some((row, caret_col));
            }
        }
        None
    }
}

/// Find the first column at which `marker` appears in the row.
fn find_marker(chars: &[char], marker: &str) -> Option<u16> {
    let needle: Vec<char> = marker.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return None;
    }
    chars
        .windows(needle.len())
        .position(|w| w == needle.as_slice())
        .map(|p| p as u16)
}

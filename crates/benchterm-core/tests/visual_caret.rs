//! End-to-end caret resolution against real CLI output shapes.
//!
//! Wrapped AI CLIs paint their caret with reverse video instead of cursor
//! positioning; traditional shells rely on the VT cursor. These tests feed
//! the actual byte patterns each produces and check where the caret lands.

use benchterm_core::{CaretRule, Screen, ScreenConfig};

fn screen(rows: u16, cols: u16) -> Screen {
    Screen::new(ScreenConfig::default().with_size(rows, cols))
}

#[test]
fn reverse_video_caret_wins_over_vt_cursor() {
    let mut s = screen(4, 80);
    s.feed("│ > welcome an\x1b[7mh\x1b[27mello !".as_bytes());

    let frame = s.snapshot();
    // 'h' is the highlighted cell at column 14; the VT cursor is parked
    // at end of line.
    assert_eq!((frame.caret.row, frame.caret.col), (0, 14));
    assert_ne!(frame.caret.col, frame.cursor.1);
}

#[test]
fn gemini_style_input_box() {
    let mut s = screen(24, 80);
    // Gemini redraws its input box, then highlights the caret cell
    // mid-word.
    s.feed(b"\r\n");
    s.feed("│ > hello w\x1b[7mo\x1b[27mrld".as_bytes());

    let frame = s.snapshot();
    assert_eq!((frame.caret.row, frame.caret.col), (1, 11));
}

#[test]
fn prompt_fallback_when_no_highlight() {
    let mut s = screen(4, 80);
    s.feed("│ > draft".as_bytes());

    let frame = s.snapshot();
    // No reverse video anywhere: the caret follows the prompt text.
    assert_eq!((frame.caret.row, frame.caret.col), (0, 9));
}

#[test]
fn vt_cursor_used_as_last_resort() {
    let mut s = screen(3, 40);
    s.feed(b"hello");

    let frame = s.snapshot();
    assert_eq!((frame.caret.row, frame.caret.col), (0, 5));
    assert_eq!(frame.cursor, (0, 5));
}

#[test]
fn shell_prompt_row_is_found_near_bottom() {
    let mut s = screen(24, 80);
    let mut input = String::new();
    for i in 1..=22 {
        input.push_str(&format!("output line {i}\r\n"));
    }
    input.push_str("$ git sta");
    s.feed(input.as_bytes());

    let frame = s.snapshot();
    assert_eq!((frame.caret.row, frame.caret.col), (22, 9));
}

#[test]
fn selection_highlight_is_not_mistaken_for_a_caret() {
    let mut s = screen(6, 40);
    // A whole highlighted word (6 cells) reads as emphasis, not a caret.
    s.feed(b"\x1b[7mchoice\x1b[27m\r\n\r\nplain text");

    let frame = s.snapshot();
    assert_eq!((frame.caret.row, frame.caret.col), (2, 10));
}

#[test]
fn vt_only_configuration_disables_heuristics() {
    let mut s = Screen::new(
        ScreenConfig::default()
            .with_size(4, 80)
            .with_caret_rules(&[CaretRule::VtCursor]),
    );
    s.feed("│ > text\x1b[7mX\x1b[27m".as_bytes());

    let frame = s.snapshot();
    // Both heuristics disabled: the caret is the VT cursor.
    assert_eq!(frame.cursor, (0, 9));
    assert_eq!((frame.caret.row, frame.caret.col), (0, 9));
}

#[test]
fn empty_prompt_marker_list_disables_prompt_rule() {
    let mut s = Screen::new(
        ScreenConfig::default()
            .with_size(4, 80)
            .with_prompt_markers(Vec::<String>::new()),
    );
    s.feed(b"$ typed");

    let frame = s.snapshot();
    assert_eq!((frame.caret.row, frame.caret.col), (0, 7));
}

#[test]
fn caret_visibility_follows_dectcem() {
    let mut s = screen(4, 40);
    s.feed(b"\x1b[?25lx");
    assert!(!s.snapshot().caret.visible);
    s.feed(b"\x1b[?25h");
    assert!(s.snapshot().caret.visible);
}

#[test]
fn caret_resolution_is_deterministic() {
    let mut a = screen(8, 60);
    let mut b = screen(8, 60);
    let bytes = "junk\r\n│ > par\x1b[7mt\x1b[27mial".as_bytes();
    a.feed(bytes);
    b.feed(bytes);
    assert_eq!(a.snapshot().caret, b.snapshot().caret);
}

#[test]
fn highlight_cleared_by_redraw_falls_back_to_prompt() {
    let mut s = screen(4, 80);
    s.feed("│ > abc\x1b[7md\x1b[27m".as_bytes());
    assert_eq!(s.snapshot().caret.col, 7);
    // The CLI redraws the row without a highlight.
    s.feed("\r\x1b[2K│ > abcd".as_bytes());
    let frame = s.snapshot();
    assert_eq!((frame.caret.row, frame.caret.col), (0, 8));
}

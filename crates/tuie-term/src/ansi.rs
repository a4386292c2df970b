// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit — that's the diff renderer's job. This
// module just knows the byte-level encoding of every terminal command the
// engine uses.
//
// Cursor positions are 0-indexed in our API and converted to 1-indexed for
// the terminal (CUP is 1-based on both axes).
//
// All functions return `io::Result` propagated from the underlying writer.
// They never fail when writing to `OutputBuffer` (backed by a Vec).
use std::io::{self, Write};

use crate::color::Color;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using CUP. Our coordinates are 0-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Move the cursor to the top-left corner.
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes, colors included (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Switch to the alternate screen buffer (DEC 1049).
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Return to the main screen buffer.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

/// Enable or disable automatic wrap at the right margin (DECAWM).
#[inline]
pub fn line_wrap(w: &mut impl Write, enable: bool) -> io::Result<()> {
    w.write_all(if enable { b"\x1b[?7h" } else { b"\x1b[?7l" })
}

// ─── Colors ──────────────────────────────────────────────────────────────────

/// Set the foreground color: 24-bit for RGB, SGR 39 for [`Color::Unset`].
pub fn fg(w: &mut impl Write, color: Color) -> io::Result<()> {
    match color {
        Color::Unset => w.write_all(b"\x1b[39m"),
        Color::Rgb(r, g, b) => write!(w, "\x1b[38;2;{r};{g};{b}m"),
    }
}

/// Set the background color: 24-bit for RGB, SGR 49 for [`Color::Unset`].
pub fn bg(w: &mut impl Write, color: Color) -> io::Result<()> {
    match color {
        Color::Unset => w.write_all(b"\x1b[49m"),
        Color::Rgb(r, g, b) => write!(w, "\x1b[48;2;{r};{g};{b}m"),
    }
}

// ─── Input Reporting Modes ───────────────────────────────────────────────────

/// Enable button press/release reporting in SGR format (1000 + 1006).
#[inline]
pub fn enable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1000h\x1b[?1006h")
}

/// Disable button reporting and the SGR format.
#[inline]
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1000l\x1b[?1006l")
}

/// Enable any-motion reporting (1003), needed for hover positions.
#[inline]
pub fn enable_mouse_motion(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1003h")
}

/// Disable any-motion reporting.
#[inline]
pub fn disable_mouse_motion(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1003l")
}

/// Enable bracketed paste (2004): pastes arrive wrapped in `CSI 200~`/`CSI 201~`.
#[inline]
pub fn enable_bracketed_paste(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2004h")
}

/// Disable bracketed paste.
#[inline]
pub fn disable_bracketed_paste(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2004l")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    // ── Cursor ──────────────────────────────────────────────────────

    #[test]
    fn cursor_to_is_one_based() {
        assert_eq!(emit(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(emit(|w| cursor_to(w, 9, 4)), "\x1b[5;10H");
    }

    #[test]
    fn cursor_to_max_coordinates_do_not_overflow() {
        assert_eq!(emit(|w| cursor_to(w, u16::MAX, u16::MAX)), "\x1b[65536;65536H");
    }

    #[test]
    fn cursor_visibility() {
        assert_eq!(emit(|w| cursor_hide(w)), "\x1b[?25l");
        assert_eq!(emit(|w| cursor_show(w)), "\x1b[?25h");
        assert_eq!(emit(|w| cursor_home(w)), "\x1b[H");
    }

    // ── Colors ──────────────────────────────────────────────────────

    #[test]
    fn rgb_foreground_is_truecolor() {
        assert_eq!(emit(|w| fg(w, Color::rgb(1, 22, 255))), "\x1b[38;2;1;22;255m");
    }

    #[test]
    fn rgb_background_is_truecolor() {
        assert_eq!(emit(|w| bg(w, Color::BLACK)), "\x1b[48;2;0;0;0m");
    }

    #[test]
    fn unset_emits_default_reset() {
        assert_eq!(emit(|w| fg(w, Color::Unset)), "\x1b[39m");
        assert_eq!(emit(|w| bg(w, Color::Unset)), "\x1b[49m");
    }

    // ── Modes ───────────────────────────────────────────────────────

    #[test]
    fn mode_toggles() {
        assert_eq!(emit(|w| enter_alt_screen(w)), "\x1b[?1049h");
        assert_eq!(emit(|w| exit_alt_screen(w)), "\x1b[?1049l");
        assert_eq!(emit(|w| line_wrap(w, false)), "\x1b[?7l");
        assert_eq!(emit(|w| line_wrap(w, true)), "\x1b[?7h");
        assert_eq!(emit(|w| enable_mouse(w)), "\x1b[?1000h\x1b[?1006h");
        assert_eq!(emit(|w| disable_mouse(w)), "\x1b[?1000l\x1b[?1006l");
        assert_eq!(emit(|w| enable_mouse_motion(w)), "\x1b[?1003h");
        assert_eq!(emit(|w| disable_mouse_motion(w)), "\x1b[?1003l");
        assert_eq!(emit(|w| enable_bracketed_paste(w)), "\x1b[?2004h");
        assert_eq!(emit(|w| disable_bracketed_paste(w)), "\x1b[?2004l");
    }

    #[test]
    fn screen_sequences() {
        assert_eq!(emit(|w| clear_screen(w)), "\x1b[2J");
        assert_eq!(emit(|w| reset(w)), "\x1b[0m");
    }
}

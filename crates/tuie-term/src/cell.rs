// SPDX-License-Identifier: MIT
//
// Cell — the atomic unit of terminal rendering.
//
// Every character position on screen is a Cell: one display byte, a
// foreground color, and a background color. Nothing else. No attributes,
// no wide characters, no continuation cells. A cell is exactly one column
// and exactly one byte of output, which keeps the diff renderer's per-cell
// model trivially correct.
//
// The display byte is restricted to printable ASCII (0x20..=0x7E). Anything
// else written through the constructors is replaced with `?` so a stray
// control byte can never reach the terminal as a command.

use std::fmt;

use crate::color::Color;

/// Replacement byte for characters outside printable ASCII.
const REPLACEMENT: u8 = b'?';

/// A single terminal cell.
///
/// Equality is structural over all three fields; the diff renderer relies
/// on it to decide what to redraw.
///
/// # Examples
///
/// ```
/// use tuie_term::cell::Cell;
/// use tuie_term::color::Color;
///
/// let cell = Cell::new('A').with_fg(Color::RED);
/// assert_eq!(cell.character(), 'A');
/// assert_eq!(cell.bg, Color::BLACK);
/// assert_eq!(Cell::default(), Cell::EMPTY);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The display byte. Only reachable through the sanitizing
    /// constructors, so always printable ASCII.
    ch: u8,
    /// Foreground (text) color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
}

impl Cell {
    /// The default cell: space, white on black.
    pub const EMPTY: Self = Self {
        ch: b' ',
        fg: Color::WHITE,
        bg: Color::BLACK,
    };

    /// Create a cell with a character and default colors.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch: sanitize(ch),
            ..Self::EMPTY
        }
    }

    /// Create a cell with a character and both colors.
    #[inline]
    #[must_use]
    pub const fn styled(ch: char, fg: Color, bg: Color) -> Self {
        Self {
            ch: sanitize(ch),
            fg,
            bg,
        }
    }

    /// The display character.
    #[inline]
    #[must_use]
    pub const fn character(self) -> char {
        self.ch as char
    }

    /// The display byte as written to the terminal.
    #[inline]
    #[must_use]
    pub const fn byte(self) -> u8 {
        self.ch
    }

    /// Replace the character, keeping colors.
    #[inline]
    #[must_use]
    pub const fn with_char(self, ch: char) -> Self {
        Self {
            ch: sanitize(ch),
            ..self
        }
    }

    /// Replace the foreground color.
    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: Color) -> Self {
        Self { fg, ..self }
    }

    /// Replace the background color.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Color) -> Self {
        Self { bg, ..self }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "['{}', {}, {}]", self.character(), self.fg, self.bg)
    }
}

/// Map a `char` to a printable ASCII byte, or `?`.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Range-checked, fits in a byte.
pub const fn sanitize(ch: char) -> u8 {
    let cp = ch as u32;
    if cp >= 0x20 && cp <= 0x7E {
        cp as u8
    } else {
        REPLACEMENT
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_white_on_black_space() {
        let cell = Cell::default();
        assert_eq!(cell.ch, b' ');
        assert_eq!(cell.fg, Color::WHITE);
        assert_eq!(cell.bg, Color::BLACK);
    }

    #[test]
    fn new_keeps_default_colors() {
        let cell = Cell::new('x');
        assert_eq!(cell.character(), 'x');
        assert_eq!(cell.fg, Color::WHITE);
        assert_eq!(cell.bg, Color::BLACK);
    }

    #[test]
    fn equality_covers_every_field() {
        let base = Cell::styled('a', Color::RED, Color::BLUE);
        assert_eq!(base, Cell::styled('a', Color::RED, Color::BLUE));
        assert_ne!(base, base.with_char('b'));
        assert_ne!(base, base.with_fg(Color::GREEN));
        assert_ne!(base, base.with_bg(Color::GREEN));
    }

    #[test]
    fn unset_background_differs_from_black() {
        assert_ne!(Cell::EMPTY, Cell::EMPTY.with_bg(Color::Unset));
    }

    #[test]
    fn non_ascii_is_replaced() {
        assert_eq!(Cell::new('é').ch, b'?');
        assert_eq!(Cell::new('中').ch, b'?');
    }

    #[test]
    fn control_bytes_are_replaced() {
        assert_eq!(Cell::new('\x1b').ch, b'?');
        assert_eq!(Cell::new('\n').ch, b'?');
        assert_eq!(Cell::new('\x7f').ch, b'?');
    }

    #[test]
    fn with_char_sanitizes_too() {
        let cell = Cell::styled('a', Color::RED, Color::BLUE).with_char('\x1b');
        assert_eq!(cell.byte(), b'?');
        assert_eq!(cell.fg, Color::RED);
    }

    #[test]
    fn printable_edges_survive() {
        assert_eq!(Cell::new(' ').ch, b' ');
        assert_eq!(Cell::new('~').ch, b'~');
    }

    #[test]
    fn display_format() {
        let cell = Cell::styled('Q', Color::RED, Color::Unset);
        assert_eq!(cell.to_string(), "['Q', #ff0000, unset]");
    }
}

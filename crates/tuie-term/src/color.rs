// SPDX-License-Identifier: MIT
//
// Color — the two kinds of color a cell can carry.
//
// Cells are painted either with an explicit 24-bit RGB triple or with
// "whatever the terminal's default is". The second case is not black and
// not white: it is the user's own terminal theme, and the only way to get it
// back is the SGR default-reset (39 / 49). So `Unset` is a distinct value
// that never compares equal to any RGB triple, black included.
//
// Both kinds flow through the diff renderer identically. A change from
// `Unset` to `Rgb` (or back) is a change like any other and gets emitted;
// `Unset` followed by `Unset` is not.

use std::fmt;

/// A cell color: explicit true-color RGB, or the terminal's default.
///
/// # Examples
///
/// ```
/// use tuie_term::color::Color;
///
/// assert_ne!(Color::Unset, Color::BLACK);
/// assert_eq!(Color::rgb(255, 0, 0), Color::RED);
/// assert!(Color::Unset.is_unset());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Use the terminal's default color (SGR 39 / 49).
    #[default]
    Unset,
    /// Explicit 24-bit color.
    Rgb(u8, u8, u8),
}

impl Color {
    pub const RED: Self = Self::Rgb(255, 0, 0);
    pub const GREEN: Self = Self::Rgb(0, 255, 0);
    pub const BLUE: Self = Self::Rgb(0, 0, 255);
    pub const YELLOW: Self = Self::Rgb(255, 255, 0);
    pub const MAGENTA: Self = Self::Rgb(255, 0, 255);
    pub const CYAN: Self = Self::Rgb(0, 255, 255);
    pub const WHITE: Self = Self::Rgb(255, 255, 255);
    pub const BLACK: Self = Self::Rgb(0, 0, 0);

    /// Create an explicit RGB color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb(r, g, b)
    }

    /// Whether this is the terminal-default marker.
    #[inline]
    #[must_use]
    pub const fn is_unset(self) -> bool {
        matches!(self, Self::Unset)
    }

    /// The RGB channels, or `None` for [`Unset`](Self::Unset).
    #[inline]
    #[must_use]
    pub const fn channels(self) -> Option<(u8, u8, u8)> {
        match self {
            Self::Unset => None,
            Self::Rgb(r, g, b) => Some((r, g, b)),
        }
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::Rgb(r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("unset"),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_is_not_black() {
        assert_ne!(Color::Unset, Color::BLACK);
        assert_ne!(Color::Unset, Color::rgb(0, 0, 0));
    }

    #[test]
    fn unset_equals_unset() {
        assert_eq!(Color::Unset, Color::Unset);
    }

    #[test]
    fn rgb_equality_is_structural() {
        assert_eq!(Color::rgb(1, 2, 3), Color::rgb(1, 2, 3));
        assert_ne!(Color::rgb(1, 2, 3), Color::rgb(1, 2, 4));
    }

    #[test]
    fn named_constants() {
        assert_eq!(Color::RED.channels(), Some((255, 0, 0)));
        assert_eq!(Color::WHITE.channels(), Some((255, 255, 255)));
        assert_eq!(Color::Unset.channels(), None);
    }

    #[test]
    fn default_is_unset() {
        assert!(Color::default().is_unset());
    }

    #[test]
    fn from_tuple() {
        assert_eq!(Color::from((10, 20, 30)), Color::Rgb(10, 20, 30));
    }

    #[test]
    fn display() {
        assert_eq!(Color::rgb(255, 0, 16).to_string(), "#ff0010");
        assert_eq!(Color::Unset.to_string(), "unset");
    }
}

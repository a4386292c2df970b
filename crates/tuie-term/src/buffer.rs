// SPDX-License-Identifier: MIT
//
// CellBuffer — the 2D cell grid that every drawing call paints to.
//
// The engine owns two of these and alternates between them: one is being
// drawn into, the other holds what the terminal currently shows. The diff
// renderer compares the two and emits escape sequences only for the cells
// that changed.
//
// Design:
//
//   - Flat `Vec<Cell>` with row-major indexing (`y * width + x`). A row's
//     cells are contiguous, so the renderer's left-to-right scan is linear.
//
//   - `cells.len() == width * height`, always. Every method that touches
//     dimensions re-establishes it before returning.
//
//   - Coordinates are signed. Drawing primitives routinely start left of or
//     above the viewport (a block sliding in from the edge), so every
//     mutator takes `i32` and silently ignores positions outside the grid.
//     Nothing in this module panics on a bad coordinate.
//
//   - Resize keeps the top-left intersection of old and new extents. New
//     cells are `Cell::EMPTY`; cells that fall outside are dropped.

use std::fmt;

use crate::cell::Cell;
use crate::color::Color;

/// A resizable grid of [`Cell`]s.
///
/// # Examples
///
/// ```
/// use tuie_term::buffer::CellBuffer;
/// use tuie_term::cell::Cell;
///
/// let mut buf = CellBuffer::new(80, 24);
/// buf.set_cell(5, 3, Cell::new('X'));
/// assert_eq!(buf.get(5, 3).map(|c| c.character()), Some('X'));
///
/// // Out of range writes are ignored.
/// buf.set_cell(-1, 3, Cell::new('Y'));
/// buf.set_cell(80, 3, Cell::new('Y'));
/// assert!(buf.get(80, 3).is_none());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CellBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellBuffer {
    // ─── Construction ────────────────────────────────────────────────────

    /// Create a buffer filled with [`Cell::EMPTY`].
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; usize::from(width) * usize::from(height)],
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    /// Buffer width in columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height in rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Total number of cells (`width × height`).
    #[inline]
    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// Whether `(x, y)` lies inside the grid.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.width) && y < i32::from(self.height)
    }

    /// Flat index for an in-bounds position.
    #[inline]
    #[allow(clippy::cast_sign_loss)] // Callers check `contains` first.
    const fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// The cell at `(x, y)`, or `None` if out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if self.contains(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// Mutable cell at `(x, y)`, or `None` if out of range.
    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if self.contains(x, y) {
            let idx = self.index(x, y);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// The raw cell slice, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// One row as a slice, or `None` if `y` is out of range.
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = usize::from(y) * usize::from(self.width);
            Some(&self.cells[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    // ─── Clipped Mutators ────────────────────────────────────────────────

    /// Replace the whole cell at `(x, y)`. Out of range is a no-op.
    #[inline]
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(c) = self.get_mut(x, y) {
            *c = cell;
        }
    }

    /// Replace only the character at `(x, y)`.
    #[inline]
    pub fn set_char(&mut self, x: i32, y: i32, ch: char) {
        if let Some(c) = self.get_mut(x, y) {
            *c = c.with_char(ch);
        }
    }

    /// Replace only the foreground color at `(x, y)`.
    #[inline]
    pub fn set_fg(&mut self, x: i32, y: i32, fg: Color) {
        if let Some(c) = self.get_mut(x, y) {
            c.fg = fg;
        }
    }

    /// Replace only the background color at `(x, y)`.
    #[inline]
    pub fn set_bg(&mut self, x: i32, y: i32, bg: Color) {
        if let Some(c) = self.get_mut(x, y) {
            c.bg = bg;
        }
    }

    // ─── Drawing Primitives ──────────────────────────────────────────────

    /// Write `text` left to right starting at `(x, y)`, one cell per char.
    ///
    /// `None` colors leave the existing cell color untouched. Characters
    /// that land outside the grid are dropped individually, so text that
    /// starts left of column 0 still shows its visible tail.
    pub fn put_str(&mut self, x: i32, y: i32, text: &str, fg: Option<Color>, bg: Option<Color>) {
        if y < 0 || y >= i32::from(self.height) {
            return;
        }
        for (col, ch) in (x..).zip(text.chars()) {
            if col >= i32::from(self.width) {
                break;
            }
            let Some(cell) = self.get_mut(col, y) else {
                continue;
            };
            *cell = cell.with_char(ch);
            if let Some(fg) = fg {
                cell.fg = fg;
            }
            if let Some(bg) = bg {
                cell.bg = bg;
            }
        }
    }

    /// Fill the rectangle at `(x, y)` of `width × height` with `cell`.
    ///
    /// The rectangle is intersected with the grid first; negative or
    /// oversized extents are fine.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, cell: Cell) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(width.max(0)).clamp(0, i32::from(self.width));
        let y1 = y.saturating_add(height.max(0)).clamp(0, i32::from(self.height));
        if x0 >= x1 {
            return;
        }

        for row in y0..y1 {
            let start = self.index(x0, row);
            let end = self.index(x1, row);
            self.cells[start..end].fill(cell);
        }
    }

    // ─── Whole-Buffer Operations ─────────────────────────────────────────

    /// Reset every cell to [`Cell::EMPTY`].
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Set every cell to `cell`.
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Resize in place, preserving the top-left overlap.
    ///
    /// Cells with `x < min(old_w, new_w)` and `y < min(old_h, new_h)` keep
    /// their content; every other cell of the new grid is [`Cell::EMPTY`].
    /// Shrinking simply drops what no longer fits.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.height {
            return;
        }

        let keep_w = usize::from(width.min(self.width));
        let keep_h = usize::from(height.min(self.height));
        let old_w = usize::from(self.width);
        let new_w = usize::from(width);

        let mut cells = vec![Cell::EMPTY; new_w * usize::from(height)];
        for y in 0..keep_h {
            let src = y * old_w;
            let dst = y * new_w;
            cells[dst..dst + keep_w].copy_from_slice(&self.cells[src..src + keep_w]);
        }

        self.cells = cells;
        self.width = width;
        self.height = height;
    }
}

impl fmt::Debug for CellBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Character-only dump inside a border, for logs and test failures.
impl fmt::Display for CellBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = usize::from(self.width);
        writeln!(f, "+{}+", "-".repeat(w))?;
        for y in 0..self.height {
            f.write_str("|")?;
            if let Some(row) = self.row(y) {
                for cell in row {
                    write!(f, "{}", cell.character())?;
                }
            }
            f.write_str("|\n")?;
        }
        write!(f, "+{}+", "-".repeat(w))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
//
// Differential renderer — turns two cell grids into the minimal terminal
// update between them.
//
// The engine keeps two physical buffers and alternates which one is being
// drawn. At frame end the freshly drawn buffer is compared, cell by cell and
// row-major, against the other one (last frame's picture). Only cells that
// differ produce output:
//
//   1. A cursor move, unless the previous emitted cell was directly to the
//      left on the same row.
//   2. A background change, if it differs from the last background emitted
//      in this pass (the first one in a pass always fires).
//   3. The same for the foreground.
//   4. The character byte.
//
// Cursor tracking is deliberately conservative: every skipped cell and every
// row end marks the cursor dirty, so we never rely on the terminal's own
// wrap behaviour (line wrap is disabled anyway) to position the next write.
//
// A coordinate that does not exist in the previous buffer (after a resize)
// counts as changed. `force_redraw` makes every cell count as changed for
// one pass, which the engine uses on the first frame and after a resize,
// when the screen contents are unknown.
//
// Nothing is emitted for a frame with no changes, so rendering the same
// picture twice costs zero bytes the second time.

use std::io::{self, Write};

use crate::ansi;
use crate::buffer::CellBuffer;
use crate::color::Color;
use crate::output::OutputBuffer;

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Statistics from a render pass, for profiling and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells that differed from the previous frame and were rendered.
    pub cells_rendered: usize,
    /// Cells that matched the previous frame and were skipped.
    pub cells_skipped: usize,
    /// Bytes of output this pass appended.
    pub bytes_written: usize,
}

impl RenderStats {
    /// Total cells processed (rendered + skipped).
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── DiffRenderer ────────────────────────────────────────────────────────────

/// Differential renderer comparing a current buffer against a previous one.
///
/// The renderer does not own either buffer; the caller decides which grid
/// plays "previous". Output accumulates in an internal [`OutputBuffer`]
/// until [`flush_to`](Self::flush_to).
///
/// A new renderer starts in forced mode, so its first pass paints every cell.
///
/// # Examples
///
/// ```
/// use tuie_term::buffer::CellBuffer;
/// use tuie_term::diff::DiffRenderer;
///
/// let mut renderer = DiffRenderer::new();
/// let mut current = CellBuffer::new(4, 1);
/// let previous = current.clone();
///
/// let first = renderer.render(&current, &previous);
/// assert_eq!(first.cells_rendered, 4);
///
/// current.set_char(2, 0, 'x');
/// let mut sink = Vec::new();
/// renderer.flush_to(&mut sink).unwrap();
/// let second = renderer.render(&current, &previous);
/// assert_eq!(second.cells_rendered, 1);
/// ```
pub struct DiffRenderer {
    output: OutputBuffer,
    force: bool,
}

impl DiffRenderer {
    /// Create a renderer whose first pass redraws everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            force: true,
        }
    }

    /// Diff `current` against `previous`, appending terminal output.
    ///
    /// Output failures cannot happen here: the sink is an in-memory buffer.
    pub fn render(&mut self, current: &CellBuffer, previous: &CellBuffer) -> RenderStats {
        let start_len = self.output.len();
        let force = std::mem::take(&mut self.force);
        let mut stats = RenderStats::default();

        let mut cursor_dirty = true;
        let mut last_fg: Option<Color> = None;
        let mut last_bg: Option<Color> = None;

        for y in 0..current.height() {
            let Some(row) = current.row(y) else { break };
            for (x, cell) in (0u16..).zip(row) {
                let unchanged = !force
                    && previous.get(i32::from(x), i32::from(y)) == Some(cell);
                if unchanged {
                    cursor_dirty = true;
                    stats.cells_skipped += 1;
                    continue;
                }

                if cursor_dirty {
                    ansi::cursor_to(&mut self.output, x, y).ok();
                    cursor_dirty = false;
                }
                if last_bg != Some(cell.bg) {
                    ansi::bg(&mut self.output, cell.bg).ok();
                    last_bg = Some(cell.bg);
                }
                if last_fg != Some(cell.fg) {
                    ansi::fg(&mut self.output, cell.fg).ok();
                    last_fg = Some(cell.fg);
                }
                self.output.push(cell.byte());
                stats.cells_rendered += 1;
            }
            cursor_dirty = true;
        }

        stats.bytes_written = self.output.len() - start_len;
        stats
    }

    /// Make the next pass treat every cell as changed.
    pub const fn force_redraw(&mut self) {
        self.force = true;
    }

    /// Whether the next pass is a forced full redraw.
    #[must_use]
    pub const fn is_forced(&self) -> bool {
        self.force
    }

    /// Queue raw bytes ahead of (or between) render passes.
    ///
    /// Used for one-off commands such as clearing the screen on resize so
    /// they reach the terminal in the same write as the frame.
    pub fn output_mut(&mut self) -> &mut OutputBuffer {
        &mut self.output
    }

    /// The bytes accumulated since the last flush (for testing and debugging).
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Write accumulated output to `w`, flush it, and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to or flushing `w` fails.
    pub fn flush_to(&mut self, w: &mut (impl Write + ?Sized)) -> io::Result<()> {
        self.output.flush_to(w)
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
//
// Backend — the seam between the engine and a real terminal.
//
// The engine never touches file descriptors, termios or signals directly.
// Everything it needs from the outside world goes through `Backend`:
//
//   - a byte source for input (non-blocking, with a "more is pending" probe
//     the decoder uses to tell a lone ESC from the start of a sequence)
//   - a writer for output
//   - the current geometry
//   - two flags set asynchronously by the OS: resize and termination
//   - release, the teardown path
//
// `Terminal` (unix) is the real implementation. `TestBackend` scripts input
// and captures output in memory, so the whole frame loop runs in unit tests.

use std::collections::VecDeque;
use std::io::{self, Write};

// ─── Size ────────────────────────────────────────────────────────────────────

/// Terminal geometry in cells. Both dimensions are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Build a size, clamping degenerate dimensions to 1.
    #[inline]
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols: if cols == 0 { 1 } else { cols },
            rows: if rows == 0 { 1 } else { rows },
        }
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub fn area(self) -> usize {
        usize::from(self.cols) * usize::from(self.rows)
    }
}

impl Default for Size {
    /// The classic 80×24.
    fn default() -> Self {
        Self::new(80, 24)
    }
}

// ─── ByteSource ──────────────────────────────────────────────────────────────

/// A non-blocking source of input bytes.
pub trait ByteSource {
    /// Whether at least one byte can be read without waiting past the
    /// source's short timeout.
    fn has_pending(&mut self) -> bool;

    /// Read one byte, or `None` if nothing is available right now.
    fn read_byte(&mut self) -> Option<u8>;
}

impl ByteSource for VecDeque<u8> {
    fn has_pending(&mut self) -> bool {
        !self.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// Everything the engine needs from a terminal.
pub trait Backend {
    /// Current geometry, clamped to at least 1×1.
    fn size(&mut self) -> Size;

    /// The input byte source.
    fn input(&mut self) -> &mut dyn ByteSource;

    /// The output sink. Frame output arrives here in one write + flush.
    fn output(&mut self) -> &mut dyn Write;

    /// Consume the pending-resize flag.
    fn take_resize(&mut self) -> bool;

    /// Consume a pending termination request, returning the signal number.
    fn take_termination(&mut self) -> Option<i32>;

    /// Restore the terminal. Calling it more than once is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the restore sequence or the original terminal
    /// attributes could not be written back.
    fn release(&mut self) -> io::Result<()>;

    /// Terminate the process after a termination signal has been handled.
    ///
    /// The default does nothing, which lets in-memory backends observe the
    /// request without exiting the test process.
    fn reraise(&mut self, _signal: i32) {}
}

// ─── TestBackend ─────────────────────────────────────────────────────────────

/// An in-memory backend: scripted input, captured output.
///
/// # Examples
///
/// ```
/// use tuie_term::backend::{Backend, Size, TestBackend};
///
/// let mut backend = TestBackend::new(Size::new(40, 10));
/// backend.push_input(b"q");
/// assert_eq!(backend.size(), Size::new(40, 10));
/// ```
#[derive(Debug, Default)]
pub struct TestBackend {
    size: Size,
    input: VecDeque<u8>,
    output: Vec<u8>,
    resized: bool,
    termination: Option<i32>,
    released: usize,
    reraised: Option<i32>,
}

impl TestBackend {
    /// A backend reporting `size`, with no input queued.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Queue input bytes for the next reads.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    /// Change the reported size and raise the resize flag.
    pub const fn resize(&mut self, size: Size) {
        self.size = size;
        self.resized = true;
    }

    /// Simulate delivery of a termination signal.
    pub const fn signal(&mut self, signal: i32) {
        self.termination = Some(signal);
    }

    /// Everything written so far.
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        &self.output
    }

    /// Take and clear the captured output.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// How many times `release` has been called.
    #[must_use]
    pub const fn release_count(&self) -> usize {
        self.released
    }

    /// The signal passed to `reraise`, if any.
    #[must_use]
    pub const fn reraised(&self) -> Option<i32> {
        self.reraised
    }
}

impl Backend for TestBackend {
    fn size(&mut self) -> Size {
        self.size
    }

    fn input(&mut self) -> &mut dyn ByteSource {
        &mut self.input
    }

    fn output(&mut self) -> &mut dyn Write {
        &mut self.output
    }

    fn take_resize(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    fn take_termination(&mut self) -> Option<i32> {
        self.termination.take()
    }

    fn release(&mut self) -> io::Result<()> {
        self.released += 1;
        Ok(())
    }

    fn reraise(&mut self, signal: i32) {
        self.reraised = Some(signal);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_clamps_zero() {
        assert_eq!(Size::new(0, 0), Size { cols: 1, rows: 1 });
        assert_eq!(Size::new(0, 7), Size { cols: 1, rows: 7 });
        assert_eq!(Size::new(3, 4).area(), 12);
    }

    #[test]
    fn deque_source_drains_in_order() {
        let mut src: VecDeque<u8> = b"ab".iter().copied().collect();
        assert!(src.has_pending());
        assert_eq!(src.read_byte(), Some(b'a'));
        assert_eq!(src.read_byte(), Some(b'b'));
        assert!(!src.has_pending());
        assert_eq!(src.read_byte(), None);
    }

    #[test]
    fn resize_flag_is_consumed() {
        let mut backend = TestBackend::new(Size::new(10, 5));
        backend.resize(Size::new(20, 3));
        assert_eq!(backend.size(), Size::new(20, 3));
        assert!(backend.take_resize());
        assert!(!backend.take_resize());
    }

    #[test]
    fn termination_is_consumed() {
        let mut backend = TestBackend::default();
        backend.signal(15);
        assert_eq!(backend.take_termination(), Some(15));
        assert_eq!(backend.take_termination(), None);
    }

    #[test]
    fn output_is_captured() {
        let mut backend = TestBackend::default();
        backend.output().write_all(b"xyz").unwrap();
        assert_eq!(backend.output_bytes(), b"xyz");
        assert_eq!(backend.take_output(), b"xyz".to_vec());
        assert!(backend.output_bytes().is_empty());
    }
}

// SPDX-License-Identifier: MIT
//
// Render engine — one frame at a time.
//
// The engine ties the pieces together around a simple loop the application
// drives:
//
//   while !engine.window_should_close() {
//       engine.begin_draw();   // resize check, input
//       ...draw calls...       // mutate the active buffer, no I/O
//       engine.end_draw();     // diff, one write, pace, swap
//   }
//
// # Buffers
//
// Two grids of the same size. Drawing goes to the *active* one; the other
// holds what the terminal currently shows. `end_draw` diffs active against
// other, then flips the index, so the grid just rendered becomes the
// reference and the older one becomes the canvas for the next frame.
// Nothing is copied: the canvas starts each frame holding the picture from
// two frames back, so applications repaint what they want shown.
//
// # Pacing
//
// `end_draw` sleeps for whatever is left of `1 / target_fps` after the
// frame's own work, then records the achieved rate. A frame that overran
// its budget does not sleep. `target_fps == 0` disables pacing.
//
// # Failure
//
// Nothing here returns an error once the engine exists. A failed write is
// logged and the frame is dropped; the next frame's diff is still correct
// because the reference buffer is whatever was last handed to the terminal.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::ansi;
use crate::backend::{Backend, Size};
use crate::buffer::CellBuffer;
use crate::cell::Cell;
use crate::color::Color;
use crate::diff::{DiffRenderer, RenderStats};
use crate::input::{Event, Input, Key, MouseButton, Position};

// ─── Configuration ──────────────────────────────────────────────────────────

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Frames per second to pace to. `0` means unpaced.
    pub target_fps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { target_fps: 30 }
    }
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// The frame orchestrator.
///
/// Generic over its [`Backend`] so the whole loop runs against a
/// [`TestBackend`](crate::backend::TestBackend) in tests.
pub struct Engine<B: Backend> {
    backend: B,
    buffers: [CellBuffer; 2],
    active: usize,
    input: Input,
    renderer: DiffRenderer,
    frame_start: Instant,
    target_fps: u32,
    fps: f64,
    last_stats: RenderStats,
    released: bool,
}

#[cfg(unix)]
impl Engine<crate::terminal::Terminal> {
    /// Take over the process's terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be put into raw mode or the
    /// signal handlers cannot be installed.
    pub fn new(config: EngineConfig) -> crate::Result<Self> {
        let terminal = crate::terminal::Terminal::acquire()?;
        Ok(Self::with_backend(terminal, config))
    }
}

impl<B: Backend> Engine<B> {
    /// Build an engine on an already-acquired backend.
    pub fn with_backend(mut backend: B, config: EngineConfig) -> Self {
        let size = backend.size();
        let buffer = CellBuffer::new(size.cols, size.rows);
        Self {
            backend,
            buffers: [buffer.clone(), buffer],
            active: 0,
            input: Input::new(),
            renderer: DiffRenderer::new(),
            frame_start: Instant::now(),
            target_fps: config.target_fps,
            fps: 0.0,
            last_stats: RenderStats::default(),
            released: false,
        }
    }

    // ── Frame ───────────────────────────────────────────────────────

    /// Start a frame: handle a pending termination or resize, then read
    /// input into a fresh event list.
    pub fn begin_draw(&mut self) {
        self.frame_start = Instant::now();

        if let Some(signal) = self.backend.take_termination() {
            debug!(signal, "termination signal received");
            self.release();
            self.backend.reraise(signal);
        }
        if self.released {
            return;
        }

        if self.backend.take_resize() {
            self.handle_resize();
        }

        self.input.clear_events();
        self.input.run(self.backend.input());
    }

    /// Finish a frame: render the difference, flush, pace, swap.
    pub fn end_draw(&mut self) {
        if self.released {
            return;
        }

        let [a, b] = &self.buffers;
        let (current, previous) = if self.active == 0 { (a, b) } else { (b, a) };
        let stats = self.renderer.render(current, previous);
        if let Err(err) = self.renderer.flush_to(self.backend.output()) {
            warn!(%err, "frame output failed");
        }
        self.last_stats = stats;

        let elapsed = self.frame_start.elapsed();
        let sleep = self.frame_budget().map_or(Duration::ZERO, |b| b.saturating_sub(elapsed));
        if !sleep.is_zero() {
            thread::sleep(sleep);
        }

        let total = (elapsed + sleep).as_secs_f64();
        self.fps = if total > 0.0 { 1.0 / total } else { 0.0 };
        trace!(
            rendered = stats.cells_rendered,
            bytes = stats.bytes_written,
            elapsed_us = elapsed.as_micros(),
            sleep_us = sleep.as_micros(),
            "frame"
        );

        self.active ^= 1;
    }

    /// `true` if this frame's input contains Escape or `q`, or the
    /// terminal has already been released.
    #[must_use]
    pub fn window_should_close(&self) -> bool {
        self.released || self.input.quit_requested()
    }

    /// Restore the terminal now instead of on drop. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.backend.release() {
            warn!(%err, "terminal release failed");
        }
    }

    /// Whether [`release`](Self::release) has run.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    fn handle_resize(&mut self) {
        let size = self.backend.size();
        for buffer in &mut self.buffers {
            buffer.resize(size.cols, size.rows);
        }
        // The terminal reflowed the old picture; nothing on screen is known.
        ansi::clear_screen(self.renderer.output_mut()).ok();
        self.renderer.force_redraw();
        debug!(cols = size.cols, rows = size.rows, "resized");
    }

    fn frame_budget(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs(1) / self.target_fps)
    }

    // ── Settings and Queries ────────────────────────────────────────

    /// Change the pacing target. `0` disables pacing.
    pub const fn set_fps(&mut self, fps: u32) {
        self.target_fps = fps;
    }

    /// The pacing target.
    #[must_use]
    pub const fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Frame rate achieved by the last `end_draw`.
    #[must_use]
    pub const fn fps(&self) -> f64 {
        self.fps
    }

    /// Statistics from the last render pass.
    #[must_use]
    pub const fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    /// Current buffer geometry (at least 1×1).
    #[must_use]
    pub fn terminal_size(&self) -> Size {
        let buffer = &self.buffers[self.active];
        Size::new(buffer.width(), buffer.height())
    }

    /// The full input state.
    #[must_use]
    pub const fn input(&self) -> &Input {
        &self.input
    }

    /// This frame's events.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        self.input.events()
    }

    #[must_use]
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.input.is_key_pressed(key)
    }

    #[must_use]
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.input.is_mouse_pressed(button)
    }

    #[must_use]
    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        self.input.is_mouse_released(button)
    }

    #[must_use]
    pub const fn mouse_position(&self) -> Position {
        self.input.mouse_position()
    }

    #[must_use]
    pub fn is_scroll_up(&self) -> bool {
        self.input.is_scroll_up()
    }

    #[must_use]
    pub fn is_scroll_down(&self) -> bool {
        self.input.is_scroll_down()
    }

    /// The backend, for inspection.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably (tests script input and resizes through it).
    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ── Drawing ─────────────────────────────────────────────────────

    /// The buffer this frame draws into.
    pub fn canvas(&mut self) -> &mut CellBuffer {
        &mut self.buffers[self.active]
    }

    /// Fill the whole canvas with `color`.
    pub fn clear_background(&mut self, color: Color) {
        self.canvas().fill(Cell::styled(' ', Color::WHITE, color));
    }

    /// Write `text` at `(x, y)`. `None` colors keep what the cell had.
    ///
    /// Characters outside printable ASCII are drawn as `?`.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, fg: Option<Color>, bg: Option<Color>) {
        self.canvas().put_str(x, y, text, fg, bg);
    }

    /// Fill a rectangle with `color` (spaces).
    pub fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        self.draw_rect_filled(x, y, width, height, color, ' ', Color::WHITE);
    }

    /// Fill a rectangle with `ch` in `ch_color` on `color`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_filled(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
        ch: char,
        ch_color: Color,
    ) {
        self.canvas()
            .fill_rect(x, y, width, height, Cell::styled(ch, ch_color, color));
    }
}

impl<B: Backend> Drop for Engine<B> {
    fn drop(&mut self) {
        self.release();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::TestBackend;

    fn engine(cols: u16, rows: u16) -> Engine<TestBackend> {
        Engine::with_backend(
            TestBackend::new(Size::new(cols, rows)),
            EngineConfig { target_fps: 0 },
        )
    }

    /// Run one frame and return what reached the backend.
    fn frame(engine: &mut Engine<TestBackend>, draw: impl FnOnce(&mut Engine<TestBackend>)) -> String {
        engine.begin_draw();
        draw(engine);
        engine.end_draw();
        String::from_utf8(engine.backend_mut().take_output()).unwrap()
    }

    // ── Frame output ────────────────────────────────────────────────

    #[test]
    fn first_frame_paints_everything() {
        let mut e = engine(3, 2);
        frame(&mut e, |_| {});
        assert_eq!(e.last_stats().cells_rendered, 6);
    }

    #[test]
    fn unchanged_frame_writes_nothing() {
        let mut e = engine(4, 2);
        let draw = |e: &mut Engine<TestBackend>| {
            e.clear_background(Color::BLUE);
            e.draw_text(0, 0, "hi", Some(Color::RED), None);
        };
        frame(&mut e, draw);
        frame(&mut e, draw);
        // Third frame draws into the grid from frame one, same contents.
        let out = frame(&mut e, draw);
        assert_eq!(out, "");
        assert_eq!(e.last_stats().cells_rendered, 0);
    }

    #[test]
    fn change_renders_only_the_changed_cell() {
        let mut e = engine(4, 1);
        frame(&mut e, |e| e.clear_background(Color::BLACK));
        frame(&mut e, |e| e.clear_background(Color::BLACK));
        let out = frame(&mut e, |e| {
            e.clear_background(Color::BLACK);
            e.draw_text(2, 0, "x", None, None);
        });
        assert_eq!(out, "\x1b[1;3H\x1b[48;2;0;0;0m\x1b[38;2;255;255;255mx");
    }

    #[test]
    fn buffers_alternate() {
        let mut e = engine(2, 1);
        frame(&mut e, |e| e.draw_text(0, 0, "a", None, None));
        // The canvas is now the other grid, still blank.
        e.begin_draw();
        assert_eq!(e.canvas().get(0, 0).map(|c| c.character()), Some(' '));
        e.end_draw();
        e.begin_draw();
        assert_eq!(e.canvas().get(0, 0).map(|c| c.character()), Some('a'));
    }

    // ── Drawing ─────────────────────────────────────────────────────

    #[test]
    fn draw_calls_clip_at_edges() {
        let mut e = engine(5, 3);
        e.begin_draw();
        e.draw_rect(-2, -1, 4, 3, Color::RED);
        e.draw_text(3, 2, "xyz", None, None);
        e.draw_text(-1, 0, "ab", None, None);
        let canvas = e.canvas();
        assert_eq!(canvas.get(0, 0).map(|c| c.character()), Some('b'));
        assert_eq!(canvas.get(1, 1).map(|c| c.bg), Some(Color::RED));
        assert_eq!(canvas.get(2, 1).map(|c| c.bg), Some(Color::BLACK));
        assert_eq!(canvas.get(1, 2).map(|c| c.bg), Some(Color::BLACK));
        assert_eq!(canvas.get(3, 2).map(|c| c.character()), Some('x'));
        assert_eq!(canvas.get(4, 2).map(|c| c.character()), Some('y'));
    }

    #[test]
    fn filled_rect_uses_glyph_and_colors() {
        let mut e = engine(3, 3);
        e.begin_draw();
        e.draw_rect_filled(1, 1, 1, 1, Color::RED, 'O', Color::YELLOW);
        assert_eq!(
            e.canvas().get(1, 1).copied(),
            Some(Cell::styled('O', Color::YELLOW, Color::RED))
        );
    }

    #[test]
    fn text_without_colors_keeps_cell_colors() {
        let mut e = engine(3, 1);
        e.begin_draw();
        e.clear_background(Color::GREEN);
        e.draw_text(0, 0, "k", None, None);
        assert_eq!(e.canvas().get(0, 0).map(|c| c.bg), Some(Color::GREEN));
        e.draw_text(0, 0, "k", Some(Color::Unset), Some(Color::Unset));
        assert_eq!(
            e.canvas().get(0, 0).copied(),
            Some(Cell::styled('k', Color::Unset, Color::Unset))
        );
    }

    // ── Resize ──────────────────────────────────────────────────────

    #[test]
    fn resize_resizes_both_buffers_and_repaints() {
        let mut e = engine(4, 2);
        frame(&mut e, |_| {});
        e.backend_mut().resize(Size::new(6, 3));
        let out = frame(&mut e, |_| {});
        assert!(out.starts_with("\x1b[2J"));
        assert_eq!(e.terminal_size(), Size::new(6, 3));
        assert_eq!(e.last_stats().cells_rendered, 18);
        assert!(e.buffers.iter().all(|b| b.width() == 6 && b.height() == 3));
    }

    #[test]
    fn shrink_keeps_drawing_in_bounds() {
        let mut e = engine(10, 5);
        frame(&mut e, |_| {});
        e.backend_mut().resize(Size::new(2, 1));
        frame(&mut e, |e| e.draw_rect(0, 0, 10, 10, Color::RED));
        assert_eq!(e.last_stats().total_cells(), 2);
    }

    // ── Input ───────────────────────────────────────────────────────

    #[test]
    fn should_close_on_q_or_escape() {
        let mut e = engine(2, 2);
        e.begin_draw();
        assert!(!e.window_should_close());

        e.backend_mut().push_input(b"q");
        e.begin_draw();
        assert!(e.window_should_close());

        e.begin_draw();
        assert!(!e.window_should_close());

        e.backend_mut().push_input(b"\x1b");
        e.begin_draw();
        assert!(e.window_should_close());
    }

    #[test]
    fn events_are_replaced_each_frame() {
        let mut e = engine(2, 2);
        e.backend_mut().push_input(b"a\x1b[<0;2;2M");
        e.begin_draw();
        assert!(e.is_key_pressed(Key::Char('a')));
        assert_eq!(e.events().len(), 2);

        e.begin_draw();
        assert!(e.events().is_empty());
        assert!(e.is_mouse_pressed(MouseButton::Left));
        assert_eq!(e.mouse_position(), Position::new(1, 1));
    }

    #[test]
    fn scroll_queries_forward() {
        let mut e = engine(2, 2);
        e.backend_mut().push_input(b"\x1b[<65;1;1M");
        e.begin_draw();
        assert!(e.is_scroll_down());
        assert!(!e.is_scroll_up());
        assert!(!e.is_mouse_released(MouseButton::WheelDown));
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    #[test]
    fn termination_releases_then_reraises() {
        let mut e = engine(2, 2);
        frame(&mut e, |_| {});
        e.backend_mut().signal(2);
        let out = frame(&mut e, |e| e.draw_text(0, 0, "x", None, None));
        assert_eq!(out, "");
        assert!(e.is_released());
        assert!(e.window_should_close());
        assert_eq!(e.backend().release_count(), 1);
        assert_eq!(e.backend().reraised(), Some(2));
    }

    #[test]
    fn release_is_idempotent() {
        let mut e = engine(2, 2);
        e.release();
        e.release();
        assert_eq!(e.backend().release_count(), 1);
    }

    // ── Pacing ──────────────────────────────────────────────────────

    #[test]
    fn pacing_sleeps_to_budget() {
        let mut e = Engine::with_backend(
            TestBackend::new(Size::new(2, 2)),
            EngineConfig { target_fps: 50 },
        );
        let start = Instant::now();
        frame(&mut e, |_| {});
        assert!(start.elapsed() >= Duration::from_millis(19));
        assert!(e.fps() > 0.0 && e.fps() <= 50.5);
    }

    #[test]
    fn zero_fps_is_unpaced() {
        let mut e = engine(2, 2);
        assert_eq!(e.target_fps(), 0);
        frame(&mut e, |_| {});
        assert!(e.fps() > 0.0);
        e.set_fps(60);
        assert_eq!(e.target_fps(), 60);
    }

    #[test]
    fn default_config_is_thirty_fps() {
        assert_eq!(EngineConfig::default().target_fps, 30);
    }
}

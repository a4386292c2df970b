// SPDX-License-Identifier: MIT
//
// tuie — demo programs for the tuie-term rendering engine.
//
// Three small programs, one per mode, each a struct with a `frame` method
// that issues one frame's worth of drawing calls:
//
//   ball        a block bouncing off the terminal edges (default)
//   draw        hold the left mouse button to paint, right to erase
//   less FILE   a minimal pager: j/k/arrows/wheel scroll, space/b page,
//               g/G jump to the ends
//
// Every mode quits on `q` or Escape. `--fps N` sets the pacing target
// (0 for unpaced).
//
// Logging is off unless `TUIE_LOG` holds an env-filter directive
// (`TUIE_LOG=debug`, `TUIE_LOG=tuie_term=trace`). Output goes to the file
// named by `TUIE_LOG_FILE`, `tuie.log` by default, never to the terminal
// the engine is drawing on.

use std::collections::HashMap;
use std::env;
use std::fs::{self, File};
use std::process;
use std::sync::Mutex;

use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tuie_term::backend::Backend;
use tuie_term::color::Color;
use tuie_term::engine::{Engine, EngineConfig};
use tuie_term::input::{Key, MouseButton};

const USAGE: &str = "usage: tuie [ball | draw | less FILE] [--fps N]";

// ─── Arguments ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Ball,
    Draw,
    Less(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    mode: Mode,
    config: EngineConfig,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut mode = None;
        let mut config = EngineConfig::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--fps" => {
                    let value = args.next().ok_or("--fps needs a value")?;
                    config.target_fps = value
                        .parse()
                        .map_err(|_| format!("invalid frame rate: {value}"))?;
                }
                _ if mode.is_some() => return Err(format!("unexpected argument: {arg}")),
                "ball" => mode = Some(Mode::Ball),
                "draw" => mode = Some(Mode::Draw),
                "less" => {
                    let path = args.next().ok_or("less needs a file")?;
                    mode = Some(Mode::Less(path));
                }
                _ => return Err(format!("unknown mode: {arg}")),
            }
        }

        Ok(Self {
            mode: mode.unwrap_or(Mode::Ball),
            config,
        })
    }
}

// ─── Ball ───────────────────────────────────────────────────────────────────

/// A block that bounces off the edges.
struct Ball {
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
}

impl Ball {
    const fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            dx: 1,
            dy: 1,
        }
    }

    fn frame<B: Backend>(&mut self, engine: &mut Engine<B>) {
        let size = engine.terminal_size();
        let (cols, rows) = (i32::from(size.cols), i32::from(size.rows));
        let height = (rows / 10).max(1);
        let width = height * 2;

        engine.clear_background(Color::WHITE);
        engine.draw_text(0, 0, &format!("Width: {cols}"), Some(Color::BLACK), None);
        engine.draw_text(0, 1, &format!("Height: {rows}"), Some(Color::BLACK), None);
        engine.draw_text(0, 2, &format!("FPS: {:.0}", engine.fps()), Some(Color::BLACK), None);
        engine.draw_rect(self.x, self.y, width, height, Color::RED);

        self.advance(cols - width, rows - height);
    }

    /// Move one step, reflecting off `0..=max` on each axis.
    const fn advance(&mut self, max_x: i32, max_y: i32) {
        self.x += self.dx;
        self.y += self.dy;
        if self.x > max_x {
            self.x = max_x;
            self.dx = -1;
        }
        if self.y > max_y {
            self.y = max_y;
            self.dy = -1;
        }
        if self.x < 0 {
            self.x = 0;
            self.dx = 1;
        }
        if self.y < 0 {
            self.y = 0;
            self.dy = 1;
        }
    }
}

// ─── Draw ───────────────────────────────────────────────────────────────────

/// Mouse painting. The engine's canvas is repainted every frame, so the
/// painted cells live here.
struct Draw {
    painted: HashMap<(i32, i32), Color>,
}

impl Draw {
    fn new() -> Self {
        Self {
            painted: HashMap::new(),
        }
    }

    fn frame<B: Backend>(&mut self, engine: &mut Engine<B>) {
        let pos = engine.mouse_position();
        if engine.is_mouse_pressed(MouseButton::Left) {
            self.painted.insert((pos.x, pos.y), Color::RED);
        }
        if engine.is_mouse_pressed(MouseButton::Right) {
            self.painted.remove(&(pos.x, pos.y));
        }

        engine.clear_background(Color::Unset);
        for (&(x, y), &color) in &self.painted {
            engine.draw_rect_filled(x, y, 1, 1, color, 'O', color);
        }
        engine.draw_text(0, 0, "left: paint  right: erase  q: quit", Some(Color::Unset), None);
    }
}

// ─── Less ───────────────────────────────────────────────────────────────────

/// A display row: a slice of a source line and its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    text: String,
    line: usize,
}

/// Split `lines` into rows of at most `width` characters.
fn wrap_lines(lines: &[String], width: usize) -> Vec<Row> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(Row {
                text: String::new(),
                line: i + 1,
            });
        }
        for chunk in chars.chunks(width) {
            rows.push(Row {
                text: chunk.iter().collect(),
                line: i + 1,
            });
        }
    }
    rows
}

/// A minimal pager.
struct Less {
    name: String,
    lines: Vec<String>,
    rows: Vec<Row>,
    wrap_width: usize,
    offset: usize,
}

impl Less {
    fn new(name: String, contents: &str) -> Self {
        Self {
            name,
            lines: contents.lines().map(str::to_owned).collect(),
            rows: Vec::new(),
            wrap_width: 0,
            offset: 0,
        }
    }

    fn frame<B: Backend>(&mut self, engine: &mut Engine<B>) {
        let size = engine.terminal_size();
        let width = usize::from(size.cols);
        let page = usize::from(size.rows).saturating_sub(1).max(1);

        if width != self.wrap_width {
            self.rows = wrap_lines(&self.lines, width);
            self.wrap_width = width;
        }
        let max_offset = self.rows.len().saturating_sub(page);

        if engine.is_key_pressed(Key::Down) || engine.is_key_pressed(Key::Char('j')) || engine.is_scroll_down() {
            self.offset += 1;
        }
        if engine.is_key_pressed(Key::Up) || engine.is_key_pressed(Key::Char('k')) || engine.is_scroll_up() {
            self.offset = self.offset.saturating_sub(1);
        }
        if engine.is_key_pressed(Key::Space) {
            self.offset += page;
        }
        if engine.is_key_pressed(Key::Char('b')) {
            self.offset = self.offset.saturating_sub(page);
        }
        if engine.is_key_pressed(Key::Char('g')) {
            self.offset = 0;
        }
        if engine.is_key_pressed(Key::Char('G')) {
            self.offset = max_offset;
        }
        self.offset = self.offset.min(max_offset);

        engine.clear_background(Color::Unset);
        for (y, row) in (0i32..).zip(self.rows.iter().skip(self.offset).take(page)) {
            engine.draw_text(0, y, &row.text, Some(Color::WHITE), None);
        }

        let status_y = i32::from(size.rows) - 1;
        engine.draw_rect(0, status_y, i32::from(size.cols), 1, Color::WHITE);
        engine.draw_text(0, status_y, &self.status(page), Some(Color::BLACK), None);
    }

    fn status(&self, page: usize) -> String {
        if self.rows.is_empty() || self.lines.is_empty() {
            return format!(" {} (empty file) (press q to quit)", self.name);
        }
        let last = (self.offset + page).min(self.rows.len()) - 1;
        format!(
            " {} lines {}-{}/{} (press q to quit)",
            self.name,
            self.rows[self.offset].line,
            self.rows[last].line,
            self.lines.len()
        )
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

/// Install a file logger when `TUIE_LOG` is set.
fn init_logging() {
    let Ok(filter) = EnvFilter::try_from_env("TUIE_LOG") else {
        return;
    };
    let path = env::var("TUIE_LOG_FILE").unwrap_or_else(|_| "tuie.log".to_owned());
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("tuie: cannot open log file {path}: {e}");
            return;
        }
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
}

fn run<B: Backend>(engine: &mut Engine<B>, mut frame: impl FnMut(&mut Engine<B>)) {
    while !engine.window_should_close() {
        engine.begin_draw();
        frame(engine);
        engine.end_draw();
    }
}

fn main() {
    let args = Args::parse(env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("tuie: {e}\n{USAGE}");
        process::exit(2);
    });
    init_logging();
    info!(mode = ?args.mode, fps = args.config.target_fps, "starting");

    // Read the file before taking over the terminal so errors print normally.
    let mut less = match &args.mode {
        Mode::Less(path) => {
            let contents = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("tuie: {path}: {e}");
                process::exit(1);
            });
            Some(Less::new(path.clone(), &contents))
        }
        _ => None,
    };

    let mut engine = Engine::new(args.config).unwrap_or_else(|e| {
        eprintln!("tuie: failed to initialize terminal: {e}");
        process::exit(1);
    });

    match (&args.mode, less.as_mut()) {
        (Mode::Less(_), Some(pager)) => run(&mut engine, |e| pager.frame(e)),
        (Mode::Draw, _) => {
            let mut draw = Draw::new();
            run(&mut engine, |e| draw.frame(e));
        }
        _ => {
            let mut ball = Ball::new();
            run(&mut engine, |e| ball.frame(e));
        }
    }

    engine.release();
    debug!("exited cleanly");
}

// ─── Tests ──────────────────────────────────────────────────────────────────

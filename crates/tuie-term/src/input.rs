// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Turns raw stdin bytes into structured events: keys, mouse actions and
// paste content. It handles exactly the protocols `terminal.rs` enables:
//
// - Printable ASCII and the handful of control keys we name
// - CSI arrow keys and Insert (`CSI 2~`)
// - SGR mouse protocol (`CSI < b ; x ; y M` press, `... m` release)
// - Bracketed paste (`CSI 200~` ... `CSI 201~`)
//
// # Design
//
// A byte-at-a-time state machine. Sequences routinely arrive split across
// reads (and, here, across frames), so all partial state lives in the
// `Decoder` and a sequence can resume on the next call.
//
//   Normal ──ESC + more pending──▶ EscapeSeen ──[──▶ Csi ──<──▶ MouseSgr
//                                                      └─200~─▶ PasteBody
//
// Every state has a way back to `Normal` on bytes it does not understand,
// and the accumulators are bounded (except paste, which is ended only by
// its terminator), so no input can wedge the decoder. Malformed sequences
// are dropped without an event.
//
// A lone ESC is reported as the Escape key immediately when nothing else
// is pending: the decoder never waits for a sequence that is not coming.

use tracing::trace;

use crate::backend::ByteSource;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A decoded input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press.
    Key(Key),
    /// A mouse button action or movement.
    Mouse(MouseEvent),
    /// Bracketed paste content, owned by the event.
    Paste(String),
}

/// Identity of a key.
///
/// Named keys have dedicated variants; other printable characters use
/// [`Char`](Key::Char).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable ASCII character other than space.
    Char(char),
    // ── Named keys ──────────────────────────────────────────────
    Space,
    Enter,
    Tab,
    /// Byte 0x08.
    Backspace,
    /// Byte 0x7F.
    Delete,
    Insert,
    Escape,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
}

/// A mouse event with 0-based cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub button: MouseButton,
    pub position: Position,
    pub action: MouseAction,
}

/// A 0-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Which button (or pseudo-button) a mouse event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    /// Motion with no button held.
    Position,
    /// Motion with a button held.
    Drag,
}

impl MouseButton {
    /// Number of variants, for per-button tables.
    pub const COUNT: usize = 7;

    const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
            Self::WheelUp => 3,
            Self::WheelDown => 4,
            Self::Position => 5,
            Self::Drag => 6,
        }
    }

    /// Map an SGR button code. Unknown codes yield `None`.
    const fn from_sgr(code: u16) -> Option<Self> {
        Some(match code {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            32 | 34 => Self::Drag,
            35 => Self::Position,
            64 => Self::WheelUp,
            65 => Self::WheelDown,
            _ => return None,
        })
    }
}

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Pressed,
    Released,
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Longest `CSI 2…` continuation we wait for (`200~`); one byte past this
/// and the sequence is dropped.
const MAX_TILDE_LEN: usize = 4;

/// Longest SGR mouse payload we accept before giving up. Real payloads are
/// at most `65;65535;65535` plus terminator.
const MAX_MOUSE_LEN: usize = 32;

const PASTE_START: &[u8] = b"200~";
const PASTE_END: &[u8] = b"\x1b[201~";

const ESC: u8 = 0x1b;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    EscapeSeen,
    Csi,
    MouseSgr,
    PasteBody,
}

/// The byte-level state machine.
///
/// # Examples
///
/// ```
/// use std::collections::VecDeque;
/// use tuie_term::input::{Decoder, Event, Key};
///
/// let mut decoder = Decoder::new();
/// let mut src: VecDeque<u8> = b"\x1b[Ax".iter().copied().collect();
/// let mut events = Vec::new();
/// decoder.run(&mut src, &mut events);
/// assert_eq!(events, vec![Event::Key(Key::Up), Event::Key(Key::Char('x'))]);
/// ```
#[derive(Debug)]
pub struct Decoder {
    state: State,
    acc: Vec<u8>,
}

impl Decoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Normal,
            acc: Vec::new(),
        }
    }

    /// Drain every byte `src` has ready, appending decoded events to `out`.
    ///
    /// Never blocks beyond the source's own timeout. A sequence cut off at
    /// the end of the available input is resumed on the next call.
    pub fn run(&mut self, src: &mut dyn ByteSource, out: &mut Vec<Event>) {
        while let Some(byte) = src.read_byte() {
            self.step(byte, src, out);
        }
    }

    /// Whether the decoder is between sequences.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == State::Normal
    }

    fn step(&mut self, byte: u8, src: &mut dyn ByteSource, out: &mut Vec<Event>) {
        match self.state {
            State::Normal => self.normal(byte, src, out),
            State::EscapeSeen => {
                if byte == b'[' {
                    self.acc.clear();
                    self.state = State::Csi;
                } else {
                    out.push(Event::Key(Key::Escape));
                    self.state = State::Normal;
                    self.normal(byte, src, out);
                }
            }
            State::Csi => self.csi(byte, out),
            State::MouseSgr => self.mouse(byte, out),
            State::PasteBody => {
                self.acc.push(byte);
                if self.acc.ends_with(PASTE_END) {
                    self.acc.truncate(self.acc.len() - PASTE_END.len());
                    let text = String::from_utf8_lossy(&self.acc).into_owned();
                    out.push(Event::Paste(text));
                    self.reset();
                }
            }
        }
    }

    fn normal(&mut self, byte: u8, src: &mut dyn ByteSource, out: &mut Vec<Event>) {
        let key = match byte {
            ESC if src.has_pending() => {
                self.state = State::EscapeSeen;
                return;
            }
            ESC => Key::Escape,
            b' ' => Key::Space,
            b'\r' | b'\n' => Key::Enter,
            b'\t' => Key::Tab,
            0x08 => Key::Backspace,
            0x7f => Key::Delete,
            0x21..=0x7e => Key::Char(char::from(byte)),
            _ => {
                trace!(byte, "dropping unmapped control byte");
                return;
            }
        };
        out.push(Event::Key(key));
    }

    fn csi(&mut self, byte: u8, out: &mut Vec<Event>) {
        if self.acc.is_empty() {
            let key = match byte {
                b'A' => Key::Up,
                b'B' => Key::Down,
                b'C' => Key::Right,
                b'D' => Key::Left,
                b'<' => {
                    self.state = State::MouseSgr;
                    return;
                }
                b'2' => {
                    self.acc.push(byte);
                    return;
                }
                _ => {
                    trace!(byte, "dropping unrecognized CSI sequence");
                    self.reset();
                    return;
                }
            };
            out.push(Event::Key(key));
            self.reset();
            return;
        }

        self.acc.push(byte);
        if self.acc == b"2~" {
            out.push(Event::Key(Key::Insert));
            self.reset();
        } else if self.acc == PASTE_START {
            self.acc.clear();
            self.state = State::PasteBody;
        } else if self.acc.len() > MAX_TILDE_LEN {
            trace!(seq = ?String::from_utf8_lossy(&self.acc), "dropping unrecognized CSI sequence");
            self.reset();
        }
    }

    fn mouse(&mut self, byte: u8, out: &mut Vec<Event>) {
        let action = match byte {
            b'M' => MouseAction::Pressed,
            b'm' => MouseAction::Released,
            _ => {
                self.acc.push(byte);
                if self.acc.len() > MAX_MOUSE_LEN {
                    trace!("dropping oversized mouse sequence");
                    self.reset();
                }
                return;
            }
        };
        match parse_sgr_payload(&self.acc) {
            Some((button, position)) => out.push(Event::Mouse(MouseEvent {
                button,
                position,
                action,
            })),
            None => {
                trace!(seq = ?String::from_utf8_lossy(&self.acc), "dropping malformed mouse sequence");
            }
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.acc.clear();
        self.state = State::Normal;
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `<code>;<x>;<y>` into a button and a 0-based position.
fn parse_sgr_payload(payload: &[u8]) -> Option<(MouseButton, Position)> {
    let text = std::str::from_utf8(payload).ok()?;
    let mut fields = text.split(';');
    let code: u16 = fields.next()?.parse().ok()?;
    let x: i32 = fields.next()?.parse().ok()?;
    let y: i32 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    let button = MouseButton::from_sgr(code)?;
    Some((button, Position::new(x.checked_sub(1)?, y.checked_sub(1)?)))
}

// ─── Input ──────────────────────────────────────────────────────────────────

/// Per-frame input state: this frame's events plus latched mouse state.
///
/// The event list is replaced every frame. The mouse table and position
/// persist across frames and change only when a mouse event arrives, so
/// "is the button held" can be answered on frames with no mouse traffic.
#[derive(Debug, Default)]
pub struct Input {
    decoder: Decoder,
    events: Vec<Event>,
    mouse_state: [Option<MouseAction>; MouseButton::COUNT],
    mouse_position: Position,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode everything `src` has ready into this frame's event list.
    pub fn run(&mut self, src: &mut dyn ByteSource) {
        let start = self.events.len();
        self.decoder.run(src, &mut self.events);
        for event in &self.events[start..] {
            if let Event::Mouse(mouse) = event {
                self.mouse_state[mouse.button.index()] = Some(mouse.action);
                self.mouse_position = mouse.position;
            }
        }
    }

    /// Drop the previous frame's events. Latched mouse state is kept.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// This frame's events, in arrival order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Whether `key` was pressed this frame.
    #[must_use]
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.events.iter().any(|e| *e == Event::Key(key))
    }

    /// Whether the last event for `button` was a press.
    #[must_use]
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_state[button.index()] == Some(MouseAction::Pressed)
    }

    /// Whether the last event for `button` was a release.
    #[must_use]
    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_state[button.index()] == Some(MouseAction::Released)
    }

    /// Position of the most recent mouse event.
    #[must_use]
    pub const fn mouse_position(&self) -> Position {
        self.mouse_position
    }

    /// Whether the wheel scrolled up this frame.
    #[must_use]
    pub fn is_scroll_up(&self) -> bool {
        self.has_mouse(MouseButton::WheelUp)
    }

    /// Whether the wheel scrolled down this frame.
    #[must_use]
    pub fn is_scroll_down(&self) -> bool {
        self.has_mouse(MouseButton::WheelDown)
    }

    /// Escape or `q` this frame.
    #[must_use]
    pub fn quit_requested(&self) -> bool {
        self.is_key_pressed(Key::Escape) || self.is_key_pressed(Key::Char('q'))
    }

    fn has_mouse(&self, button: MouseButton) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, Event::Mouse(m) if m.button == button))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

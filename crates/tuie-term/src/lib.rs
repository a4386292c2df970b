// SPDX-License-Identifier: MIT
//
// tuie-term — a small terminal rendering engine.
//
// Raw keyboard, mouse and paste input in; a double-buffered grid of
// single-byte cells out, redrawn each frame by emitting only the cells that
// changed, paced to a target frame rate.
//
// No TUI framework underneath: the terminal is driven directly through
// termios and ANSI escape sequences, and every byte written is accounted
// for by the diff renderer. Cells are deliberately ASCII-only, one byte and
// one column each.

pub mod ansi;
pub mod backend;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod diff;
pub mod engine;
pub mod error;
pub mod input;
pub mod output;
#[cfg(unix)]
pub mod reader;
#[cfg(unix)]
pub mod signal;
#[cfg(unix)]
pub mod terminal;

pub use error::{Error, Result};

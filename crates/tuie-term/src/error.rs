// SPDX-License-Identifier: MIT
//
// Error types for terminal acquisition.
//
// Only taking over the terminal can fail in a way the caller has to handle.
// Everything after that (frame output, input reads, resize queries) absorbs
// its own failures so the frame loop never has to.

use std::io;

use thiserror::Error;

/// Terminal acquisition error.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the current terminal attributes failed.
    #[error("failed to read terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),

    /// Applying raw-mode attributes failed.
    #[error("failed to enter raw mode: {0}")]
    SetAttributes(#[source] io::Error),

    /// A signal handler could not be registered.
    #[error("failed to install {signal} handler: {source}")]
    SignalHandler {
        signal: &'static str,
        #[source]
        source: io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for terminal acquisition.
pub type Result<T> = std::result::Result<T, Error>;

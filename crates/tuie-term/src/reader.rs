// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Non-blocking stdin byte source.
//
// The engine is single-threaded and frame-driven, so input is pulled, not
// pushed: once per frame the decoder drains whatever the terminal has
// already delivered and then gets out of the way. `poll()` with a zero
// timeout answers "is anything there?"; when it is, one `read()` pulls up
// to a chunk into a local buffer that the decoder then consumes byte by
// byte. Nothing here ever waits.
//
// Read errors and EOF both look like "no input right now". A terminal that
// went away shows up through the termination signal, not here.

use std::collections::VecDeque;
use std::io;
use std::os::unix::io::AsRawFd;

use crate::backend::ByteSource;

/// Bytes pulled per `read()`. A keypress is 1-6 bytes, a paste can be
/// kilobytes; 4 KB handles both without waste.
const READ_BUF_SIZE: usize = 4096;

/// Stdin as a [`ByteSource`].
pub struct StdinSource {
    fd: libc::c_int,
    pending: VecDeque<u8>,
}

impl StdinSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fd: io::stdin().as_raw_fd(),
            pending: VecDeque::with_capacity(READ_BUF_SIZE),
        }
    }

    /// Whether the fd is readable right now.
    fn readable(&self) -> bool {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: one valid pollfd, zero timeout.
        let ready = unsafe { libc::poll(&raw mut pfd, 1, 0) };
        ready > 0 && pfd.revents & libc::POLLIN != 0
    }

    /// Pull one chunk into `pending`. Returns false if nothing was read.
    fn fill(&mut self) -> bool {
        if !self.readable() {
            return false;
        }
        let mut buf = [0u8; READ_BUF_SIZE];
        // SAFETY: buf is valid for READ_BUF_SIZE bytes.
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        let Ok(n) = usize::try_from(n) else {
            return false;
        };
        self.pending.extend(&buf[..n]);
        n > 0
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSource for StdinSource {
    fn has_pending(&mut self) -> bool {
        !self.pending.is_empty() || self.fill()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.pending.is_empty() {
            self.fill();
        }
        self.pending.pop_front()
    }
}

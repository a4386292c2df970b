// SPDX-License-Identifier: MIT
//
// Signal flags — resize and termination, set asynchronously, read once per
// frame.
//
// The handlers do nothing but store into an atomic (signal-hook's `flag`
// helpers), which is about the only thing that is safe to do in a signal
// handler. The frame loop swaps the flags back to zero, so each delivery
// is observed exactly once, at most one frame late.
//
// Termination (SIGINT, SIGTERM, SIGHUP) records the signal number instead
// of a bool. Once the terminal has been restored, `reraise` hands the
// signal back to its default disposition so the process exits the way the
// sender expects (shells look at the exit status).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use signal_hook::SigId;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGWINCH};
use signal_hook::{flag, low_level};
use tracing::debug;

use crate::error::{Error, Result};

/// Signals that end the session.
const TERMINATION: [(libc::c_int, &str); 3] =
    [(SIGINT, "SIGINT"), (SIGTERM, "SIGTERM"), (SIGHUP, "SIGHUP")];

/// Registered handlers plus the flags they set. Dropping unregisters.
#[derive(Debug)]
pub struct Signals {
    resize: Arc<AtomicBool>,
    termination: Arc<AtomicUsize>,
    ids: Vec<SigId>,
}

impl Signals {
    /// Register SIGWINCH and the termination signals.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignalHandler`] if any registration fails. Handlers
    /// registered before the failure are removed again.
    pub fn install() -> Result<Self> {
        let mut signals = Self {
            resize: Arc::new(AtomicBool::new(false)),
            termination: Arc::new(AtomicUsize::new(0)),
            ids: Vec::with_capacity(1 + TERMINATION.len()),
        };

        let id = flag::register(SIGWINCH, Arc::clone(&signals.resize)).map_err(|source| {
            Error::SignalHandler {
                signal: "SIGWINCH",
                source,
            }
        })?;
        signals.ids.push(id);

        for (sig, name) in TERMINATION {
            let value = usize::try_from(sig).unwrap_or(usize::MAX);
            let id = flag::register_usize(sig, Arc::clone(&signals.termination), value)
                .map_err(|source| Error::SignalHandler {
                    signal: name,
                    source,
                })?;
            signals.ids.push(id);
        }

        debug!("signal handlers installed");
        Ok(signals)
    }

    /// Consume the resize flag.
    #[must_use]
    pub fn take_resize(&self) -> bool {
        self.resize.swap(false, Ordering::Relaxed)
    }

    /// Consume a pending termination signal.
    #[must_use]
    pub fn take_termination(&self) -> Option<i32> {
        match self.termination.swap(0, Ordering::Relaxed) {
            0 => None,
            sig => i32::try_from(sig).ok(),
        }
    }

    /// Remove every handler. Idempotent.
    pub fn uninstall(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        for id in self.ids.drain(..) {
            low_level::unregister(id);
        }
        debug!("signal handlers removed");
    }
}

impl Drop for Signals {
    fn drop(&mut self) {
        self.uninstall();
    }
}

/// Terminate with `signal`'s default behaviour.
///
/// Only call after the terminal has been released and the handlers
/// removed. Falls back to `exit(128 + signal)` if the default action does
/// not end the process.
pub fn reraise(signal: i32) -> ! {
    debug!(signal, "re-raising termination signal");
    if let Err(err) = low_level::emulate_default_handler(signal) {
        debug!(%err, "default signal action unavailable");
    }
    std::process::exit(128 + signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Handlers are process-wide, so everything that raises lives in one test.
    #[test]
    fn flags_follow_delivered_signals() {
        let mut signals = Signals::install().unwrap();
        assert!(!signals.take_resize());
        assert_eq!(signals.take_termination(), None);

        low_level::raise(SIGWINCH).unwrap();
        assert!(signals.take_resize());
        assert!(!signals.take_resize());

        low_level::raise(SIGTERM).unwrap();
        assert_eq!(signals.take_termination(), Some(SIGTERM));
        assert_eq!(signals.take_termination(), None);

        signals.uninstall();
        assert!(signals.ids.is_empty());
        signals.uninstall();
    }
}

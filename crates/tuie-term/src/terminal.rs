// SPDX-License-Identifier: MIT
//
// Terminal session — raw mode, alternate screen, and guaranteed restore.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control. Each unsafe block
// is minimal.
#![allow(unsafe_code)]
//
// `Terminal` is the one place that changes terminal state. Acquire puts the
// tty into raw mode, switches to the alternate screen, hides the cursor,
// turns on mouse (buttons + motion, SGR format) and bracketed paste, and
// turns off auto-wrap. Each step that succeeds is recorded in a `Modes`
// set, so release undoes exactly what was done, in reverse, no matter how
// far acquire got.
//
// Release runs on every exit path: explicitly, from `Drop`, after a
// termination signal (before the signal is re-raised), and, in reduced
// form, from a panic hook. The hook writes a pre-built restore sequence
// straight to fd 1 so it cannot deadlock on a stdout lock held by the
// panicking frame, then puts the saved termios back.
//
// Raw mode here keeps ISIG: Ctrl-C still raises SIGINT, which the signal
// layer turns into an orderly release instead of an abrupt death.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use bitflags::bitflags;
use tracing::debug;

use crate::ansi;
use crate::backend::{Backend, ByteSource, Size};
use crate::error::{Error, Result};
use crate::reader::StdinSource;
use crate::signal::{self, Signals};

// ─── Modes ──────────────────────────────────────────────────────────────────

bitflags! {
    /// Terminal state changes made by [`Terminal::acquire`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modes: u8 {
        /// termios switched to raw.
        const RAW = 1 << 0;
        /// Alternate screen entered.
        const ALT_SCREEN = 1 << 1;
        /// Cursor hidden.
        const CURSOR_HIDDEN = 1 << 2;
        /// Button reporting in SGR format.
        const MOUSE = 1 << 3;
        /// Any-motion reporting.
        const MOUSE_MOTION = 1 << 4;
        /// Bracketed paste.
        const BRACKETED_PASTE = 1 << 5;
        /// Auto-wrap disabled.
        const NO_WRAP = 1 << 6;
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the terminal size via `ioctl(TIOCGWINSZ)`, clamped to at least 1×1.
///
/// A failed query (stdout is not a terminal) reports 1×1.
#[must_use]
pub fn get_size() -> Size {
    // SAFETY: winsize is plain old data; ioctl fills it or fails.
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };
    if result == 0 {
        Size::new(ws.ws_col, ws.ws_row)
    } else {
        Size::new(1, 1)
    }
}

/// Check whether stdin is connected to a terminal.
#[must_use]
pub fn is_tty() -> bool {
    // SAFETY: isatty only inspects the descriptor.
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

/// Raw-mode attributes derived from `original`.
///
/// Clears echo, canonical mode and extended processing; clears flow
/// control, CR→NL translation, break-to-signal, parity checking and
/// stripping. Reads return after at most 100 ms with whatever is there.
#[must_use]
pub const fn raw_attributes(original: libc::termios) -> libc::termios {
    let mut raw = original;
    raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN);
    raw.c_iflag &= !(libc::IXON | libc::ICRNL | libc::BRKINT | libc::INPCK | libc::ISTRIP);
    raw.c_cc[libc::VMIN] = 0;
    raw.c_cc[libc::VTIME] = 1;
    raw
}

// ─── Panic-Safe Restore ─────────────────────────────────────────────────────

/// Global backup of the original termios for the panic hook.
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            // SAFETY: original came from tcgetattr on the same fd.
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Everything acquire may have turned on, turned off again.
///
/// Alternate screen exit comes last so the shell's screen reappears with
/// no engine artifacts on it.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?7h\
    \x1b[?2004l\
    \x1b[?1003l\
    \x1b[?1000l\x1b[?1006l\
    \x1b[?25h\
    \x1b[0m\
    \x1b[?1049l";

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install (once per process) a panic hook that restores the terminal
/// before the original hook prints the panic message.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            restore_termios_from_backup();
            original(info);
        }));
    });
}

/// Write [`EMERGENCY_RESTORE`] to fd 1, bypassing the stdout lock.
fn emergency_restore() {
    // SAFETY: the pointer and length describe a static byte string.
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }
}

// ─── Restore Sequence ───────────────────────────────────────────────────────

/// Bytes undoing `modes`, split around the termios restore.
///
/// The first part reverses the output modes in the opposite order they were
/// enabled. The second leaves the alternate screen and leaves the main
/// screen clean: colors reset, cursor home, cleared.
fn restore_sequence(modes: Modes) -> (Vec<u8>, Vec<u8>) {
    let mut before = Vec::new();
    let mut after = Vec::new();

    // Writes into a Vec cannot fail.
    if modes.contains(Modes::NO_WRAP) {
        ansi::line_wrap(&mut before, true).ok();
    }
    if modes.contains(Modes::BRACKETED_PASTE) {
        ansi::disable_bracketed_paste(&mut before).ok();
    }
    if modes.contains(Modes::MOUSE_MOTION) {
        ansi::disable_mouse_motion(&mut before).ok();
    }
    if modes.contains(Modes::MOUSE) {
        ansi::disable_mouse(&mut before).ok();
    }
    if modes.contains(Modes::CURSOR_HIDDEN) {
        ansi::cursor_show(&mut before).ok();
    }

    if modes.contains(Modes::ALT_SCREEN) {
        ansi::exit_alt_screen(&mut after).ok();
        ansi::reset(&mut after).ok();
        ansi::cursor_home(&mut after).ok();
        ansi::clear_screen(&mut after).ok();
    }

    (before, after)
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// The live terminal session.
///
/// # Example
///
/// ```no_run
/// use tuie_term::terminal::Terminal;
///
/// let mut term = Terminal::acquire()?;
/// // ... render frames ...
/// term.release()?; // Also happens on drop.
/// # Ok::<(), tuie_term::Error>(())
/// ```
pub struct Terminal {
    original_termios: Option<libc::termios>,
    modes: Modes,
    signals: Option<Signals>,
    input: StdinSource,
    stdout: io::Stdout,
}

impl Terminal {
    /// Take over the terminal.
    ///
    /// When stdin is not a tty the termios step is skipped; the output
    /// modes are still written.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal attributes cannot be read or set,
    /// a signal handler cannot be installed, or the mode sequences cannot
    /// be written. Whatever was already changed is undone before returning.
    pub fn acquire() -> Result<Self> {
        install_panic_hook();

        let mut term = Self {
            original_termios: None,
            modes: Modes::empty(),
            signals: None,
            input: StdinSource::new(),
            stdout: io::stdout(),
        };

        term.signals = Some(Signals::install()?);
        term.enable_raw_mode()?;
        term.enter_modes()?;

        let size = get_size();
        debug!(cols = size.cols, rows = size.rows, tty = term.modes.contains(Modes::RAW), "terminal acquired");
        Ok(term)
    }

    /// The modes currently in effect.
    #[inline]
    #[must_use]
    pub const fn modes(&self) -> Modes {
        self.modes
    }

    /// Undo everything acquire did. Idempotent.
    ///
    /// Every step is attempted even if an earlier one fails; the first
    /// failure is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the restore sequence cannot be written or the
    /// original terminal attributes cannot be set.
    pub fn release(&mut self) -> io::Result<()> {
        if let Some(mut signals) = self.signals.take() {
            signals.uninstall();
        }
        if self.modes.is_empty() {
            return Ok(());
        }

        let (before, after) = restore_sequence(self.modes);
        let mut result = self.write_now(&before);
        if let Err(err) = self.disable_raw_mode() {
            result = result.and(Err(err));
        }
        if let Err(err) = self.write_now(&after) {
            result = result.and(Err(err));
        }

        // Raw mode stays recorded until the termios restore goes through.
        self.modes = if self.original_termios.is_some() { Modes::RAW } else { Modes::empty() };
        debug!("terminal released");
        result
    }

    fn write_now(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let mut lock = self.stdout.lock();
        lock.write_all(bytes)?;
        lock.flush()
    }

    fn enter_modes(&mut self) -> Result<()> {
        let mut lock = self.stdout.lock();
        ansi::enter_alt_screen(&mut lock)?;
        self.modes |= Modes::ALT_SCREEN;
        ansi::cursor_hide(&mut lock)?;
        self.modes |= Modes::CURSOR_HIDDEN;
        ansi::enable_mouse(&mut lock)?;
        self.modes |= Modes::MOUSE;
        ansi::enable_mouse_motion(&mut lock)?;
        self.modes |= Modes::MOUSE_MOTION;
        ansi::enable_bracketed_paste(&mut lock)?;
        self.modes |= Modes::BRACKETED_PASTE;
        ansi::line_wrap(&mut lock, false)?;
        self.modes |= Modes::NO_WRAP;
        lock.flush()?;
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    fn enable_raw_mode(&mut self) -> Result<()> {
        if !is_tty() {
            return Ok(());
        }

        // SAFETY: termios is plain old data; tcgetattr fills it or fails.
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut original) } != 0 {
            return Err(Error::GetAttributes(io::Error::last_os_error()));
        }

        let raw = raw_attributes(original);
        // SAFETY: raw is a fully initialized termios.
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const raw) } != 0 {
            return Err(Error::SetAttributes(io::Error::last_os_error()));
        }

        self.original_termios = Some(original);
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = Some(original);
        }
        self.modes |= Modes::RAW;
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> io::Result<()> {
        let restored = restore_saved(&mut self.original_termios, |original| {
            // SAFETY: original came from tcgetattr on the same fd.
            if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original) } != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        })?;

        if restored {
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
        }
        Ok(())
    }
}

/// Apply a saved value and forget it only once applying succeeded, so a
/// failed restore can be retried by the next release.
///
/// Returns whether there was anything to restore.
fn restore_saved<T>(
    saved: &mut Option<T>,
    apply: impl FnOnce(&T) -> io::Result<()>,
) -> io::Result<bool> {
    let Some(value) = saved.as_ref() else {
        return Ok(false);
    };
    apply(value)?;
    *saved = None;
    Ok(true)
}

impl Backend for Terminal {
    fn size(&mut self) -> Size {
        get_size()
    }

    fn input(&mut self) -> &mut dyn ByteSource {
        &mut self.input
    }

    fn output(&mut self) -> &mut dyn Write {
        &mut self.stdout
    }

    fn take_resize(&mut self) -> bool {
        self.signals.as_ref().is_some_and(Signals::take_resize)
    }

    fn take_termination(&mut self) -> Option<i32> {
        self.signals.as_ref().and_then(Signals::take_termination)
    }

    fn release(&mut self) -> io::Result<()> {
        Self::release(self)
    }

    fn reraise(&mut self, sig: i32) {
        signal::reraise(sig);
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            debug!(%err, "terminal release on drop failed");
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn text(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ── Restore sequence ────────────────────────────────────────────

    #[test]
    fn full_restore_reverses_acquire_order() {
        let (before, after) = restore_sequence(Modes::all());
        assert_eq!(
            text(&before),
            "\x1b[?7h\x1b[?2004l\x1b[?1003l\x1b[?1000l\x1b[?1006l\x1b[?25h"
        );
        assert_eq!(text(&after), "\x1b[?1049l\x1b[0m\x1b[H\x1b[2J");
    }

    #[test]
    fn restore_skips_modes_never_entered() {
        let (before, after) = restore_sequence(Modes::RAW | Modes::ALT_SCREEN);
        assert!(before.is_empty());
        assert_eq!(text(&after), "\x1b[?1049l\x1b[0m\x1b[H\x1b[2J");

        let (before, after) = restore_sequence(Modes::RAW);
        assert!(before.is_empty());
        assert!(after.is_empty());
    }

    #[test]
    fn emergency_restore_covers_every_output_mode() {
        let (before, _) = restore_sequence(Modes::all());
        let emergency = text(EMERGENCY_RESTORE);
        for seq in text(&before).split('\x1b').filter(|s| !s.is_empty()) {
            assert!(emergency.contains(seq), "missing {seq:?}");
        }
        assert!(emergency.ends_with("\x1b[?1049l"));
    }

    // ── Raw attributes ──────────────────────────────────────────────

    #[test]
    fn raw_attributes_clear_line_discipline_but_keep_signals() {
        // SAFETY: termios is plain old data.
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        original.c_lflag = libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG;
        original.c_iflag = libc::IXON | libc::ICRNL | libc::BRKINT | libc::INPCK | libc::ISTRIP;
        original.c_cc[libc::VMIN] = 1;

        let raw = raw_attributes(original);
        assert_eq!(raw.c_lflag, libc::ISIG);
        assert_eq!(raw.c_iflag, 0);
        assert_eq!(raw.c_cc[libc::VMIN], 0);
        assert_eq!(raw.c_cc[libc::VTIME], 1);
    }

    // ── Restoring saved attributes ──────────────────────────────────

    #[test]
    fn failed_restore_keeps_saved_value_for_retry() {
        let mut saved = Some(7);
        let err = restore_saved(&mut saved, |_| Err(io::Error::other("tcsetattr"))).unwrap_err();
        assert_eq!(err.to_string(), "tcsetattr");
        assert_eq!(saved, Some(7));

        let mut applied = None;
        let restored = restore_saved(&mut saved, |value| {
            applied = Some(*value);
            Ok(())
        })
        .unwrap();
        assert!(restored);
        assert_eq!(applied, Some(7));
        assert_eq!(saved, None);
    }

    #[test]
    fn nothing_saved_is_a_no_op() {
        let mut saved: Option<u8> = None;
        let restored = restore_saved(&mut saved, |_| panic!("nothing to apply")).unwrap();
        assert!(!restored);
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[test]
    fn size_is_never_zero() {
        let size = get_size();
        assert!(size.cols >= 1);
        assert!(size.rows >= 1);
    }
}

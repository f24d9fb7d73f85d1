//! Asynchronous entry points of the shell.
//!
//! Every handler here runs in signal context on the main thread, between two
//! arbitrary instructions of the main flow. Handler bodies are therefore
//! limited to atomics, `waitpid` and `write(2)` of static bytes; anything that
//! allocates, locks or formats happens later in the main loop.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use libc::{c_int, pid_t, SIGCHLD, SIGINT, SIGTSTP};
use signal_hook::low_level;

use super::{JobTable, NotificationQueue, ProcessError};
use crate::core::config::{JOB_CAPACITY, PROMPT, QUEUE_CAPACITY};
use crate::core::state::ModeFlag;

const INTERRUPT_MESSAGE: &[u8] = b"terminated by signal 2\n";
const ENTER_FOREGROUND_ONLY: &[u8] = b"\nEntering foreground-only mode (& is now ignored)\n";
const EXIT_FOREGROUND_ONLY: &[u8] = b"\nExiting foreground-only mode\n";

/// Hand-off cell between the child-reaped handler and the foreground wait.
///
/// When the handler reaps the pid the main flow is blocked on, it parks the
/// raw status here instead of queueing a background notification.
pub struct ForegroundSlot {
    pid: AtomicI32,
    raw: AtomicI32,
    reaped: AtomicBool,
}

impl Default for ForegroundSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ForegroundSlot {
    pub const fn new() -> Self {
        Self {
            pid: AtomicI32::new(0),
            raw: AtomicI32::new(0),
            reaped: AtomicBool::new(false),
        }
    }

    pub fn begin(&self, pid: pid_t) {
        self.reaped.store(false, Ordering::SeqCst);
        self.pid.store(pid, Ordering::SeqCst);
    }

    pub fn end(&self) {
        self.pid.store(0, Ordering::SeqCst);
    }

    pub fn is_waiting(&self) -> bool {
        self.pid.load(Ordering::SeqCst) != 0
    }

    /// Called from the handler. Returns `true` if `pid` belonged to the
    /// foreground wait and the status was parked.
    pub fn claim(&self, pid: pid_t, raw: c_int) -> bool {
        if pid == 0 || self.pid.load(Ordering::SeqCst) != pid {
            return false;
        }
        self.raw.store(raw, Ordering::SeqCst);
        self.reaped.store(true, Ordering::SeqCst);
        true
    }

    pub fn take(&self) -> Option<c_int> {
        self.reaped
            .swap(false, Ordering::SeqCst)
            .then(|| self.raw.load(Ordering::SeqCst))
    }
}

/// Everything shared between the main flow and the signal handlers.
pub struct SharedState {
    pub jobs: JobTable<JOB_CAPACITY>,
    pub notifications: NotificationQueue<QUEUE_CAPACITY>,
    pub foreground: ForegroundSlot,
    pub foreground_only: ModeFlag,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            jobs: JobTable::new(),
            notifications: NotificationQueue::new(),
            foreground: ForegroundSlot::new(),
            foreground_only: ModeFlag::new(),
        }
    }
}

pub static SHARED: SharedState = SharedState::new();

/// Installs the interrupt, child-reaped and suspend-toggle handlers.
pub fn setup_signal_handlers() -> Result<(), ProcessError> {
    let register = |signal: c_int, action: fn(&'static SharedState)| {
        // SAFETY: every action only touches atomics, waitpid and write(2).
        unsafe { low_level::register(signal, move || action(&SHARED)) }
            .map(|_| ())
            .map_err(|e| ProcessError::Signal(format!("cannot install handler for {}: {}", signal, e)))
    };

    register(SIGINT, handle_interrupt)?;
    register(SIGCHLD, handle_child_exit)?;
    register(SIGTSTP, handle_suspend)?;
    tracing::debug!("signal handlers installed");
    Ok(())
}

/// Reaps every terminated child without blocking.
pub fn handle_child_exit(shared: &SharedState) {
    loop {
        let mut raw: c_int = 0;
        // SAFETY: waitpid is async-signal-safe and `raw` outlives the call.
        let pid = unsafe { libc::waitpid(-1, &mut raw, libc::WNOHANG) };
        if pid <= 0 {
            break;
        }
        if shared.foreground.claim(pid, raw) {
            continue;
        }
        shared.jobs.remove(pid);
        shared.notifications.push(pid, raw);
    }
}

/// Reports an interrupt only while a foreground child is being waited on;
/// otherwise the shell itself shrugs it off.
pub fn handle_interrupt(shared: &SharedState) {
    if shared.foreground.is_waiting() {
        write_stdout(INTERRUPT_MESSAGE);
    }
}

pub fn handle_suspend(shared: &SharedState) {
    if shared.foreground_only.toggle() {
        write_stdout(ENTER_FOREGROUND_ONLY);
    } else {
        write_stdout(EXIT_FOREGROUND_ONLY);
    }
    write_stdout(PROMPT.as_bytes());
}

fn write_stdout(bytes: &[u8]) {
    // SAFETY: write(2) is async-signal-safe; a short write is acceptable here.
    unsafe {
        libc::write(libc::STDOUT_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

/// Keeps child-termination delivery blocked while a spawn is being recorded.
///
/// Dropping the guard restores delivery, at which point any pending
/// notification runs the child-reaped handler.
pub struct ChildSignalGuard {
    set: libc::sigset_t,
}

impl ChildSignalGuard {
    pub fn block() -> Self {
        // SAFETY: the set is initialised by sigemptyset before use.
        unsafe {
            let mut set: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut set);
            libc::sigaddset(&mut set, SIGCHLD);
            libc::pthread_sigmask(libc::SIG_BLOCK, &set, std::ptr::null_mut());
            ChildSignalGuard { set }
        }
    }
}

impl Drop for ChildSignalGuard {
    fn drop(&mut self) {
        // SAFETY: `set` was built in `block`.
        unsafe {
            libc::pthread_sigmask(libc::SIG_UNBLOCK, &self.set, std::ptr::null_mut());
        }
    }
}

/// Dispositions for a freshly forked child, applied before exec.
///
/// The child inherits the parent's blocked child-termination signal from the
/// spawn guard, so the mask is cleared here as well. Only calls
/// async-signal-safe functions.
pub fn prepare_child(background: bool) -> std::io::Result<()> {
    let interrupt = if background { libc::SIG_IGN } else { libc::SIG_DFL };
    // SAFETY: signal(2) and pthread_sigmask are async-signal-safe and the set
    // is initialised by sigemptyset before use.
    unsafe {
        let mut empty: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut empty);
        if libc::signal(SIGINT, interrupt) == libc::SIG_ERR
            || libc::signal(SIGTSTP, libc::SIG_IGN) == libc::SIG_ERR
            || libc::pthread_sigmask(libc::SIG_SETMASK, &empty, std::ptr::null_mut()) != 0
        {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreground_slot_claims_only_its_pid() {
        let slot = ForegroundSlot::new();
        assert!(!slot.claim(10, 0));

        slot.begin(10);
        assert!(slot.is_waiting());
        assert!(!slot.claim(11, 0));
        assert!(slot.take().is_none());

        assert!(slot.claim(10, 3 << 8));
        assert_eq!(slot.take(), Some(3 << 8));
        assert!(slot.take().is_none());

        slot.end();
        assert!(!slot.is_waiting());
        assert!(!slot.claim(10, 0));
    }

    #[test]
    fn test_suspend_toggles_mode_twice() {
        let shared = SharedState::new();
        assert!(!shared.foreground_only.is_set());
        handle_suspend(&shared);
        assert!(shared.foreground_only.is_set());
        handle_suspend(&shared);
        assert!(!shared.foreground_only.is_set());
    }

    #[test]
    fn test_interrupt_is_silent_without_foreground_child() {
        let shared = SharedState::new();
        handle_interrupt(&shared);
        assert!(!shared.foreground.is_waiting());
    }
}

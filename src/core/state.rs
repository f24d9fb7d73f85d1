use std::sync::atomic::{AtomicBool, Ordering};

use crate::process::signal::SharedState;
use crate::process::TermStatus;

/// Foreground-only mode. The suspend-toggle handler is the only writer;
/// the execution engine reads it before every dispatch.
pub struct ModeFlag(AtomicBool);

impl Default for ModeFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeFlag {
    pub const fn new() -> Self {
        ModeFlag(AtomicBool::new(false))
    }

    /// Flips the mode and returns the new value.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ShellState {
    last_status: TermStatus,
    shared: &'static SharedState,
}

impl ShellState {
    pub fn new(shared: &'static SharedState) -> Self {
        ShellState {
            last_status: TermStatus::default(),
            shared,
        }
    }

    pub fn last_status(&self) -> TermStatus {
        self.last_status
    }

    /// Only foreground completions and foreground spawn failures land here.
    pub fn record_status(&mut self, status: TermStatus) {
        self.last_status = status;
    }

    pub fn foreground_only(&self) -> bool {
        self.shared.foreground_only.is_set()
    }

    pub fn shared(&self) -> &'static SharedState {
        self.shared
    }
}

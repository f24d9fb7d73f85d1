use std::fmt;

pub mod executor;
pub mod jobs;
pub mod notify;
pub mod signal;

pub use executor::ProcessExecutor;
pub use jobs::JobTable;
pub use notify::{Notification, NotificationQueue};

/// How a child process terminated, as reported by `waitpid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermStatus {
    Exited(i32),
    Signaled(i32),
}

impl TermStatus {
    /// Decodes a raw wait status. Anything that is not a normal exit is
    /// reported by its terminating signal.
    pub fn from_raw(raw: libc::c_int) -> Self {
        if libc::WIFEXITED(raw) {
            TermStatus::Exited(libc::WEXITSTATUS(raw))
        } else {
            TermStatus::Signaled(libc::WTERMSIG(raw))
        }
    }
}

impl Default for TermStatus {
    fn default() -> Self {
        TermStatus::Exited(0)
    }
}

impl fmt::Display for TermStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermStatus::Exited(code) => write!(f, "exit value {}", code),
            TermStatus::Signaled(sig) => write!(f, "terminated by signal {}", sig),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug)]
pub enum ProcessError {
    Spawn {
        program: String,
        source: std::io::Error,
    },
    Wait(std::io::Error),
    Signal(String),
    Io(std::io::Error),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Spawn { program, source } => write!(f, "{}: {}", program, source),
            ProcessError::Wait(e) => write!(f, "wait failed: {}", e),
            ProcessError::Signal(msg) => write!(f, "Signal error: {}", msg),
            ProcessError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Spawn { source, .. } => Some(source),
            ProcessError::Wait(e) | ProcessError::Io(e) => Some(e),
            ProcessError::Signal(_) => None,
        }
    }
}

impl From<std::io::Error> for ProcessError {
    fn from(e: std::io::Error) -> Self {
        ProcessError::Io(e)
    }
}

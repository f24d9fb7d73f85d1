use std::io::Write;
use std::path::PathBuf;

mod builtin;
mod cd;

pub use builtin::{ExitCommand, StatusCommand};
pub use cd::CdCommand;

use crate::core::config::ShellConfig;
use crate::core::state::ShellState;

#[derive(Debug)]
pub enum CommandError {
    ChangeDir {
        path: PathBuf,
        source: std::io::Error,
    },
    HomeDirNotFound,
    IoError(std::io::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::ChangeDir { path, source } => {
                write!(f, "cd: {}: {}", path.display(), source)
            }
            CommandError::HomeDirNotFound => write!(f, "cd: HOME not set"),
            CommandError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        CommandError::IoError(err)
    }
}

/// What the main loop should do after a builtin ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit(i32),
}

pub trait Command {
    fn execute(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError>;
}

/// Commands handled inside the shell process; they are never forked.
#[derive(Clone)]
pub enum Builtin {
    Exit(ExitCommand),
    Status(StatusCommand),
    Cd(CdCommand),
}

impl Builtin {
    pub const NAMES: [&'static str; 3] = ["cd", "exit", "status"];

    pub fn is_builtin(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    pub fn from_name(name: &str, config: &ShellConfig) -> Option<Self> {
        match name {
            "exit" => Some(Builtin::Exit(ExitCommand::new(config.exit_code))),
            "status" => Some(Builtin::Status(StatusCommand::new())),
            "cd" => Some(Builtin::Cd(CdCommand::new())),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Exit(_) => "exit",
            Builtin::Status(_) => "status",
            Builtin::Cd(_) => "cd",
        }
    }
}

impl Command for Builtin {
    fn execute(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        tracing::debug!(builtin = self.name(), args = args.len(), "running builtin");
        match self {
            Builtin::Exit(cmd) => cmd.execute(args, state, out),
            Builtin::Status(cmd) => cmd.execute(args, state, out),
            Builtin::Cd(cmd) => cmd.execute(args, state, out),
        }
    }
}

use std::io::Write;

use super::{Command, CommandError, CommandOutcome};
use crate::core::state::ShellState;

#[derive(Clone)]
pub struct ExitCommand {
    code: i32,
}

impl ExitCommand {
    pub fn new(code: i32) -> Self {
        Self { code }
    }
}

impl Command for ExitCommand {
    /// Flushes pending completion notices, terminates every tracked
    /// background job and asks the main loop to stop.
    fn execute(
        &self,
        _args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let shared = state.shared();
        shared.notifications.report(out)?;
        let terminated = shared.jobs.terminate_all();
        tracing::info!(terminated, "shutting down");
        Ok(CommandOutcome::Exit(self.code))
    }
}

#[derive(Clone, Default)]
pub struct StatusCommand;

impl StatusCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Command for StatusCommand {
    fn execute(
        &self,
        _args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        writeln!(out, "{}", state.last_status())?;
        out.flush()?;
        Ok(CommandOutcome::Continue)
    }
}

use std::io;

use crate::core::commands::{Builtin, Command, CommandOutcome};
use crate::error::ShellError;

pub(crate) trait CommandHandler {
    fn execute_line(&mut self, line: &str) -> Result<CommandOutcome, ShellError>;
}

impl CommandHandler for super::Shell {
    fn execute_line(&mut self, line: &str) -> Result<CommandOutcome, ShellError> {
        // Blank lines and comments produce no command.
        let Some(command) = self.parser.parse(line)? else {
            return Ok(CommandOutcome::Continue);
        };

        let mut out = io::stdout().lock();
        if let Some(builtin) = Builtin::from_name(command.program(), &self.config) {
            return Ok(builtin.execute(command.arguments(), &mut self.state, &mut out)?);
        }

        self.executor.spawn(&command, &mut self.state, &mut out)?;
        Ok(CommandOutcome::Continue)
    }
}

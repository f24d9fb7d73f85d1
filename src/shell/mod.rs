use std::io;

mod executor;

use crate::{
    core::{
        commands::CommandOutcome,
        config::ShellConfig,
        state::ShellState,
    },
    error::ShellError,
    flags::Flags,
    highlight::SyntaxHighlighter,
    input::{LineReader, Parser},
    process::{
        signal::{self, SHARED},
        ProcessExecutor,
    },
};

use executor::CommandHandler;

pub struct Shell {
    pub(crate) reader: LineReader,
    pub(crate) parser: Parser,
    pub(crate) state: ShellState,
    pub(crate) executor: ProcessExecutor,
    pub(crate) config: ShellConfig,
    pub(crate) highlighter: SyntaxHighlighter,
}

impl Shell {
    pub fn new(flags: Flags) -> Result<Self, ShellError> {
        let config = ShellConfig::from_flags(&flags);
        let reader = LineReader::new(&config)?;
        let parser = Parser::new(std::process::id(), &config);
        let executor = ProcessExecutor::new(&config, &SHARED);

        signal::setup_signal_handlers()?;
        tracing::info!(
            pid = std::process::id(),
            interactive = reader.is_interactive(),
            "shell started"
        );

        Ok(Shell {
            reader,
            parser,
            state: ShellState::new(&SHARED),
            executor,
            config,
            highlighter: SyntaxHighlighter::new(),
        })
    }

    /// Runs the prompt loop and returns the process exit code.
    pub fn run(&mut self) -> Result<i32, ShellError> {
        loop {
            self.report_notifications()?;

            let line = match self.reader.read_line(self.config.prompt)? {
                Some(line) => line,
                None => return self.finish(),
            };

            match self.execute_line(&line) {
                Ok(CommandOutcome::Continue) => {}
                Ok(CommandOutcome::Exit(code)) => return Ok(code),
                Err(e) => self.report_error(&e),
            }
        }
    }

    fn report_notifications(&self) -> Result<(), ShellError> {
        let mut out = io::stdout().lock();
        self.state.shared().notifications.report(&mut out)?;
        Ok(())
    }

    /// End of input: same cleanup as `exit`, but a normal exit code.
    fn finish(&mut self) -> Result<i32, ShellError> {
        self.report_notifications()?;
        let terminated = self.state.shared().jobs.terminate_all();
        tracing::info!(terminated, "end of input");
        Ok(0)
    }

    fn report_error(&self, error: &ShellError) {
        match error {
            ShellError::ParseError(_) if self.config.quiet => {}
            _ => eprintln!("{}", self.highlighter.highlight_error(&error.to_string())),
        }
        tracing::debug!(error = ?error, "command failed");
    }
}

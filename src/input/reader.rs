use std::io::{self, BufRead, Write};

use rustyline::{config::Configurer, error::ReadlineError, history::DefaultHistory, Editor};

use super::helper::ShellHelper;
use crate::core::config::ShellConfig;
use crate::error::ShellError;

/// Source of input lines: a line editor for people, plain stdin for scripts.
pub enum LineReader {
    Editor(Box<Editor<ShellHelper, DefaultHistory>>),
    Plain(io::StdinLock<'static>),
}

impl LineReader {
    pub fn new(config: &ShellConfig) -> Result<Self, ShellError> {
        if !config.line_editor {
            return Ok(LineReader::Plain(io::stdin().lock()));
        }

        let mut editor = Editor::<ShellHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(ShellHelper::new()));
        editor.set_auto_add_history(true);
        Ok(LineReader::Editor(Box::new(editor)))
    }

    /// Shows `prompt` and reads one line. `Ok(None)` means end of input; an
    /// interrupted read comes back as an empty line so the caller re-prompts.
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        match self {
            LineReader::Editor(editor) => match editor.readline(prompt) {
                Ok(line) => Ok(Some(line)),
                Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
                Err(ReadlineError::Eof) => Ok(None),
                Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::Interrupted => {
                    Ok(Some(String::new()))
                }
                Err(e) => Err(e.into()),
            },
            LineReader::Plain(stdin) => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(prompt.as_bytes())?;
                stdout.flush()?;
                drop(stdout);

                // Arguments are not required to be UTF-8; undecodable bytes
                // become U+FFFD instead of failing the read.
                let mut line = Vec::new();
                match stdin.read_until(b'\n', &mut line) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(String::from_utf8_lossy(&line).into_owned())),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Some(String::new())),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, LineReader::Editor(_))
    }
}

use std::fmt;
use std::path::PathBuf;

use crate::core::config::ShellConfig;

const PID_PLACEHOLDER: &str = "$$";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program name followed by its arguments; never empty.
    pub args: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub background: bool,
}

impl CommandLine {
    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    pub fn arguments(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    LineTooLong { length: usize, max: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::LineTooLong { length, max } => {
                write!(f, "line too long ({} bytes, limit {})", length, max)
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone)]
pub struct Parser {
    shell_pid: String,
    max_line_length: usize,
    max_args: usize,
}

impl Parser {
    pub fn new(shell_pid: u32, config: &ShellConfig) -> Self {
        Parser {
            shell_pid: shell_pid.to_string(),
            max_line_length: config.max_line_length,
            max_args: config.max_args,
        }
    }

    /// Returns `Ok(None)` for blank lines and comments.
    pub fn parse(&self, line: &str) -> Result<Option<CommandLine>, ParseError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.len() > self.max_line_length {
            return Err(ParseError::LineTooLong {
                length: line.len(),
                max: self.max_line_length,
            });
        }
        if line.starts_with('#') {
            return Ok(None);
        }

        let tokens: Vec<&str> = line
            .split(is_separator)
            .filter(|token| !token.is_empty())
            .collect();
        let Some((&program, rest)) = tokens.split_first() else {
            return Ok(None);
        };

        let mut command = CommandLine {
            args: vec![self.expand(program)],
            input: None,
            output: None,
            background: false,
        };

        let mut rest = rest.iter().enumerate();
        while let Some((index, &token)) = rest.next() {
            match token {
                "<" => {
                    if let Some((_, path)) = rest.next() {
                        command.input = Some(PathBuf::from(self.expand(path)));
                    }
                }
                ">" => {
                    if let Some((_, path)) = rest.next() {
                        command.output = Some(PathBuf::from(self.expand(path)));
                    }
                }
                "&" if index + 2 == tokens.len() => command.background = true,
                _ => {
                    if command.args.len() <= self.max_args {
                        command.args.push(self.expand(token));
                    }
                }
            }
        }

        Ok(Some(command))
    }

    fn expand(&self, token: &str) -> String {
        token.replace(PID_PLACEHOLDER, &self.shell_pid)
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

use std::io::IsTerminal;
use std::path::PathBuf;

use crate::flags::Flags;

/// Background jobs tracked at once; later ones run untracked.
pub const JOB_CAPACITY: usize = 200;
/// Completion notices buffered between two prompts.
pub const QUEUE_CAPACITY: usize = 50;

pub const PROMPT: &str = ": ";
pub const NULL_DEVICE: &str = "/dev/null";
pub const MAX_LINE_LENGTH: usize = 2048;
pub const MAX_ARGS: usize = 512;
pub const EXIT_BUILTIN_CODE: i32 = 3;

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub prompt: &'static str,
    pub null_device: PathBuf,
    pub max_line_length: usize,
    pub max_args: usize,
    pub exit_code: i32,
    pub line_editor: bool,
    pub quiet: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        ShellConfig {
            prompt: PROMPT,
            null_device: PathBuf::from(NULL_DEVICE),
            max_line_length: MAX_LINE_LENGTH,
            max_args: MAX_ARGS,
            exit_code: EXIT_BUILTIN_CODE,
            line_editor: false,
            quiet: false,
        }
    }
}

impl ShellConfig {
    /// The line editor is only used when a person is typing.
    pub fn from_flags(flags: &Flags) -> Self {
        let interactive = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
        ShellConfig {
            line_editor: interactive && !flags.is_set("plain"),
            quiet: flags.is_set("quiet"),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.prompt, ": ");
        assert_eq!(config.null_device, PathBuf::from("/dev/null"));
        assert_eq!(config.exit_code, 3);
        assert_eq!(config.max_args, 512);
        assert!(!config.line_editor);
    }

    #[test]
    fn test_plain_flag_disables_editor() {
        let mut flags = Flags::new();
        flags.parse(&["--plain".to_string(), "-q".to_string()]).unwrap();
        let config = ShellConfig::from_flags(&flags);
        assert!(!config.line_editor);
        assert!(config.quiet);
    }
}

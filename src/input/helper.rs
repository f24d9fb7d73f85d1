use std::borrow::Cow;

use rustyline::{
    completion::{Completer, FilenameCompleter, Pair},
    highlight::{CmdKind, Highlighter},
    hint::Hinter,
    validate::Validator,
    Context, Helper,
};

use crate::core::commands::Builtin;
use crate::highlight::SyntaxHighlighter;

/// Editor helper: builtin names for the first word, file names elsewhere.
pub struct ShellHelper {
    filenames: FilenameCompleter,
    highlighter: SyntaxHighlighter,
}

impl Default for ShellHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellHelper {
    pub fn new() -> Self {
        ShellHelper {
            filenames: FilenameCompleter::new(),
            highlighter: SyntaxHighlighter::new(),
        }
    }
}

impl Helper for ShellHelper {}

impl Highlighter for ShellHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(self.highlighter.highlight_command(line))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Validator for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before_cursor = &line[..pos];
        let first_word = !before_cursor.trim_start().contains(char::is_whitespace);

        if first_word {
            let word = before_cursor.trim_start();
            let start = pos - word.len();
            let builtins: Vec<Pair> = Builtin::NAMES
                .iter()
                .filter(|name| !word.is_empty() && name.starts_with(word))
                .map(|name| Pair {
                    display: name.to_string(),
                    replacement: format!("{} ", name),
                })
                .collect();
            if !builtins.is_empty() {
                return Ok((start, builtins));
            }
        }

        self.filenames.complete(line, pos, ctx)
    }
}

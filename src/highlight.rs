use inksac::prelude::*;

use crate::core::commands::Builtin;

#[derive(Debug, Clone, Copy)]
pub struct SyntaxHighlighter {
    color_support: ColorSupport,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let support = check_color_support().unwrap_or(ColorSupport::NoColor);
        Self {
            color_support: support,
        }
    }

    /// Colours the command word, redirection operators and a trailing `&`.
    /// Whitespace is preserved so the cursor position stays valid.
    pub fn highlight_command(&self, input: &str) -> String {
        if matches!(self.color_support, ColorSupport::NoColor) || input.starts_with('#') {
            return input.to_string();
        }

        let last_word = input.split_whitespace().last();
        let mut seen_command = false;
        let mut output = String::with_capacity(input.len());

        for (index, piece) in input.split_inclusive(char::is_whitespace).enumerate() {
            let word = piece.trim_end();
            let gap = &piece[word.len()..];
            if word.is_empty() {
                output.push_str(piece);
                continue;
            }

            let styled = if !seen_command {
                seen_command = true;
                self.command_word(word)
            } else if word == "<" || word == ">" {
                self.operator(word)
            } else if word == "&" && Some(word) == last_word && index > 0 {
                self.operator(word)
            } else {
                word.to_string()
            };
            output.push_str(&styled);
            output.push_str(gap);
        }

        output
    }

    fn command_word(&self, word: &str) -> String {
        let style = if Builtin::is_builtin(word) {
            Style::builder().foreground(Color::Green).bold().build()
        } else {
            Style::builder().foreground(Color::Cyan).bold().build()
        };
        word.style(style).to_string()
    }

    fn operator(&self, word: &str) -> String {
        let style = Style::builder().foreground(Color::Yellow).build();
        word.style(style).to_string()
    }

    pub fn highlight_error(&self, error: &str) -> String {
        if matches!(self.color_support, ColorSupport::NoColor) {
            return error.to_string();
        }

        let error_style = Style::builder().foreground(Color::Red).bold().build();
        error.style(error_style).to_string()
    }
}

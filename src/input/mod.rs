mod helper;
pub mod parser;
mod reader;

pub use helper::ShellHelper;
pub use parser::{CommandLine, ParseError, Parser};
pub use reader::LineReader;

use std::env;
use std::path::PathBuf;

#[derive(Clone, Default)]
pub struct PathExpander;

impl PathExpander {
    pub fn new() -> Self {
        Self
    }

    /// `HOME` when it is set and non-empty, otherwise the platform's idea of
    /// the user's home directory.
    pub fn home_dir(&self) -> Option<PathBuf> {
        env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_dir_is_absolute() {
        if let Some(home) = PathExpander::new().home_dir() {
            assert!(!home.as_os_str().is_empty());
        }
    }
}

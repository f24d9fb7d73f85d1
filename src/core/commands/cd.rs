use std::env;
use std::io::Write;
use std::path::PathBuf;

use super::{Command, CommandError, CommandOutcome};
use crate::core::state::ShellState;
use crate::path::PathExpander;

#[derive(Clone)]
pub struct CdCommand {
    path_expander: PathExpander,
}

impl Default for CdCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl CdCommand {
    pub fn new() -> Self {
        Self {
            path_expander: PathExpander::new(),
        }
    }

    /// No argument means the home directory; extra arguments are ignored.
    fn target(&self, args: &[String]) -> Result<PathBuf, CommandError> {
        match args.first() {
            Some(path) => Ok(PathBuf::from(path)),
            None => self
                .path_expander
                .home_dir()
                .ok_or(CommandError::HomeDirNotFound),
        }
    }
}

impl Command for CdCommand {
    fn execute(
        &self,
        args: &[String],
        _state: &mut ShellState,
        _out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        let target = self.target(args)?;
        env::set_current_dir(&target).map_err(|source| CommandError::ChangeDir {
            path: target.clone(),
            source,
        })?;
        tracing::debug!(dir = %target.display(), "changed directory");
        Ok(CommandOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::signal::SharedState;
    use std::io;
    use std::sync::Mutex;

    // The working directory is process-wide.
    static CWD_LOCK: Mutex<()> = Mutex::new(());
    static SHARED: SharedState = SharedState::new();

    fn run(args: &[&str]) -> Result<CommandOutcome, CommandError> {
        let mut state = ShellState::new(&SHARED);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        CdCommand::new().execute(&args, &mut state, &mut io::sink())
    }

    #[test]
    fn test_cd_home() {
        let _guard = CWD_LOCK.lock().unwrap();
        let home = PathExpander::new().home_dir().unwrap();

        env::set_current_dir(env::temp_dir()).unwrap();
        assert_eq!(run(&[]).unwrap(), CommandOutcome::Continue);
        assert_eq!(
            env::current_dir().unwrap().canonicalize().unwrap(),
            home.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_cd_temp() {
        let _guard = CWD_LOCK.lock().unwrap();
        let temp_dir = env::temp_dir().canonicalize().unwrap();
        run(&[temp_dir.to_str().unwrap(), "extra"]).unwrap();
        assert_eq!(env::current_dir().unwrap(), temp_dir);
    }

    #[test]
    fn test_cd_invalid_keeps_directory() {
        let _guard = CWD_LOCK.lock().unwrap();
        let before = env::current_dir().unwrap();
        let result = run(&["/nonexistent/path"]);
        assert!(matches!(result, Err(CommandError::ChangeDir { .. })));
        assert_eq!(env::current_dir().unwrap(), before);
    }
}

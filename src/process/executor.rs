use std::borrow::Cow;
use std::ffi::CString;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use libc::{c_char, c_int, pid_t};

use super::signal::{self, ChildSignalGuard, SharedState};
use super::{Direction, ProcessError, TermStatus};
use crate::core::config::ShellConfig;
use crate::core::state::ShellState;
use crate::input::CommandLine;

const OUTPUT_MODE: libc::mode_t = 0o644;

/// How a dispatched command ended up running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawned {
    Background(pid_t),
    Foreground(TermStatus),
}

/// Text a child prints when it cannot open one of its redirections.
pub fn redirect_failure(path: &Path, direction: Direction) -> String {
    format!("cannot open {} for {}\n", path.display(), direction)
}

struct Redirect {
    path: CString,
    target: c_int,
    flags: c_int,
    failure: Vec<u8>,
}

/// Everything the forked child needs, prepared before the fork so the child
/// itself never allocates.
struct ChildImage {
    program: CString,
    // Owns the strings `argv` points into.
    _args: Vec<CString>,
    argv: Vec<*const c_char>,
    redirects: Vec<Redirect>,
    exec_prefix: Vec<u8>,
    background: bool,
}

impl ChildImage {
    fn new(
        command: &CommandLine,
        input: Option<&Path>,
        output: Option<&Path>,
        background: bool,
    ) -> Result<Self, ProcessError> {
        let invalid = |source: std::ffi::NulError| ProcessError::Spawn {
            program: command.program().to_string(),
            source: source.into(),
        };

        let args = command
            .args
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
        let mut argv: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
        argv.push(std::ptr::null());

        let mut redirects = Vec::with_capacity(2);
        if let Some(path) = input {
            redirects.push(Redirect {
                path: CString::new(path.as_os_str().as_bytes()).map_err(invalid)?,
                target: libc::STDIN_FILENO,
                flags: libc::O_RDONLY,
                failure: redirect_failure(path, Direction::Input).into_bytes(),
            });
        }
        if let Some(path) = output {
            redirects.push(Redirect {
                path: CString::new(path.as_os_str().as_bytes()).map_err(invalid)?,
                target: libc::STDOUT_FILENO,
                flags: libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
                failure: redirect_failure(path, Direction::Output).into_bytes(),
            });
        }

        Ok(ChildImage {
            program: CString::new(command.program()).map_err(invalid)?,
            _args: args,
            argv,
            redirects,
            exec_prefix: format!("{}: ", command.program()).into_bytes(),
            background,
        })
    }

    /// Runs in the forked child and never returns.
    ///
    /// # Safety
    ///
    /// Must only be called in a freshly forked child. Everything in here is
    /// async-signal-safe and works on memory prepared before the fork.
    unsafe fn exec(&self) -> ! {
        if signal::prepare_child(self.background).is_err() {
            libc::_exit(1);
        }

        for redirect in &self.redirects {
            let fd = libc::open(redirect.path.as_ptr(), redirect.flags, OUTPUT_MODE as libc::c_uint);
            if fd < 0 {
                write_fd(libc::STDOUT_FILENO, &redirect.failure);
                libc::_exit(1);
            }
            if libc::dup2(fd, redirect.target) < 0 {
                write_fd(libc::STDOUT_FILENO, &redirect.failure);
                libc::_exit(1);
            }
            libc::close(fd);
        }

        libc::execvp(self.program.as_ptr(), self.argv.as_ptr());

        let reason: &[u8] = match io::Error::last_os_error().raw_os_error() {
            Some(libc::ENOENT) => b"command not found\n",
            Some(libc::EACCES) => b"permission denied\n",
            _ => b"cannot execute\n",
        };
        write_fd(libc::STDERR_FILENO, &self.exec_prefix);
        write_fd(libc::STDERR_FILENO, reason);
        libc::_exit(1);
    }
}

unsafe fn write_fd(fd: c_int, bytes: &[u8]) {
    libc::write(fd, bytes.as_ptr().cast(), bytes.len());
}

#[derive(Clone)]
pub struct ProcessExecutor {
    null_device: PathBuf,
    shared: &'static SharedState,
}

impl ProcessExecutor {
    pub fn new(config: &ShellConfig, shared: &'static SharedState) -> Self {
        ProcessExecutor {
            null_device: config.null_device.clone(),
            shared,
        }
    }

    /// Runs one external command.
    ///
    /// Background commands are recorded in the job table and announced on
    /// `out`; foreground commands are waited for and their termination is
    /// stored as the shell's last status. Redirection and exec failures happen
    /// in the child, which reports them and exits with status 1. A foreground
    /// command that cannot even be forked records `exit value 1`.
    pub fn spawn(
        &self,
        command: &CommandLine,
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> Result<Spawned, ProcessError> {
        let background = command.background && !state.foreground_only();
        if command.background && !background {
            tracing::debug!(program = command.program(), "foreground-only mode, ignoring &");
        }

        let result = self.launch(command, background, out);
        match &result {
            Ok(Spawned::Foreground(status)) => state.record_status(*status),
            Err(_) if !background => state.record_status(TermStatus::Exited(1)),
            _ => {}
        }
        result
    }

    fn launch(
        &self,
        command: &CommandLine,
        background: bool,
        out: &mut dyn Write,
    ) -> Result<Spawned, ProcessError> {
        let (input, output) = self.redirect_paths(command, background);
        let image = ChildImage::new(command, input.as_deref(), output.as_deref(), background)?;

        let guard = ChildSignalGuard::block();
        // SAFETY: the child branch only runs `ChildImage::exec`.
        let pid = unsafe { libc::fork() };
        if pid < 0 {
            return Err(ProcessError::Spawn {
                program: command.program().to_string(),
                source: io::Error::last_os_error(),
            });
        }
        if pid == 0 {
            // SAFETY: we are the freshly forked child.
            unsafe { image.exec() }
        }
        tracing::debug!(pid, background, program = command.program(), "spawned");

        if background {
            if !self.shared.jobs.insert(pid) {
                tracing::warn!(pid, "job table full, background job is untracked");
            }
            drop(guard);
            writeln!(out, "background pid is {}", pid)?;
            out.flush()?;
            return Ok(Spawned::Background(pid));
        }

        self.shared.foreground.begin(pid);
        drop(guard);
        let status = self.wait_foreground(pid);
        self.shared.foreground.end();

        let status = status?;
        tracing::debug!(pid, %status, "foreground job finished");
        Ok(Spawned::Foreground(status))
    }

    /// Explicit redirections win; a background job falls back to the null
    /// device for whichever side was not redirected.
    pub fn redirect_paths<'a>(
        &'a self,
        command: &'a CommandLine,
        background: bool,
    ) -> (Option<Cow<'a, Path>>, Option<Cow<'a, Path>>) {
        let pick = |explicit: &'a Option<PathBuf>| match explicit {
            Some(path) => Some(Cow::Borrowed(path.as_path())),
            None if background => Some(Cow::Borrowed(self.null_device.as_path())),
            None => None,
        };
        (pick(&command.input), pick(&command.output))
    }

    /// Blocks until `pid` terminates. The child-reaped handler may collect the
    /// child first, in which case its status is picked up from the hand-off
    /// slot once `waitpid` reports there is no such child.
    fn wait_foreground(&self, pid: pid_t) -> Result<TermStatus, ProcessError> {
        loop {
            let mut raw: libc::c_int = 0;
            // SAFETY: `raw` is a valid out-pointer for the duration of the call.
            let reaped = unsafe { libc::waitpid(pid, &mut raw, 0) };
            if reaped == pid {
                return Ok(TermStatus::from_raw(raw));
            }

            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::ECHILD) => {
                    return self
                        .shared
                        .foreground
                        .take()
                        .map(TermStatus::from_raw)
                        .ok_or(ProcessError::Wait(err));
                }
                _ => return Err(ProcessError::Wait(err)),
            }
        }
    }
}

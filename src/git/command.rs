use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::{Arc, Mutex},
    time::Duration,
};

use log::{debug, trace, warn};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    task::JoinHandle,
};

use super::{GitError, GitExecutor};

/// How long to keep draining the pipes once the command has exited.
const OUTPUT_GRACE: Duration = Duration::from_secs(1);

type Buffer = Arc<Mutex<Vec<u8>>>;

/// Runs `command` to completion or until `timeout` elapses.
///
/// The timeout bounds the exit of the command itself, not the end of its
/// output: helpers it leaves behind may hold the pipes open. The child is
/// placed in its own process group, and the whole group is killed once the
/// child has exited or the timeout fired. `display` is the command line used
/// in errors.
///
/// Blocks the calling thread; must not be called from within an async
/// runtime.
pub fn run_with_timeout(
    mut command: Command,
    display: &str,
    timeout: Duration,
) -> Result<String, GitError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    std::os::unix::process::CommandExt::process_group(&mut command, 0);
    let mut command = tokio::process::Command::from(command);
    command.kill_on_drop(true);

    runtime.block_on(async move {
        trace!("Running '{}' with a {:?} timeout", display, timeout);
        let mut child = command.spawn().map_err(|source| GitError::Spawn {
            command: display.to_string(),
            source,
        })?;
        let pid = child.id();
        let (stdout, stdout_task) = drain(child.stdout.take());
        let (stderr, stderr_task) = drain(child.stderr.take());

        let waited = tokio::time::timeout(timeout, child.wait()).await;
        if let Some(pid) = pid {
            kill_process_group(pid);
        }

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(error)) => return Err(GitError::IO(error)),
            Err(_) => {
                warn!("Timed out after {:?} running '{}'", timeout, display);
                if let Err(error) = child.kill().await {
                    debug!("Could not kill '{}': {}", display, error);
                }
                return Err(GitError::Timeout {
                    command: display.to_string(),
                    timeout,
                });
            }
        };

        for mut task in [stdout_task, stderr_task] {
            if tokio::time::timeout(OUTPUT_GRACE, &mut task).await.is_err() {
                debug!("Output of '{}' still open after exit", display);
                task.abort();
            }
        }
        let mut combined = take(&stdout);
        combined.extend(take(&stderr));
        let combined = String::from_utf8_lossy(&combined).into_owned();

        if status.success() {
            Ok(combined)
        } else {
            Err(GitError::CommandFailed {
                command: display.to_string(),
                status: status.to_string(),
                output: combined,
            })
        }
    })
}

/// Copies `reader` into a shared buffer until EOF, so that whatever arrived
/// is available even if the copy is abandoned.
fn drain<R>(reader: Option<R>) -> (Buffer, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buffer = Buffer::default();
    let sink = Arc::clone(&buffer);
    let task = tokio::spawn(async move {
        let Some(mut reader) = reader else {
            return;
        };
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(read) => {
                    if let Ok(mut sink) = sink.lock() {
                        sink.extend_from_slice(&chunk[..read]);
                    }
                }
            }
        }
    });
    (buffer, task)
}

fn take(buffer: &Buffer) -> Vec<u8> {
    buffer
        .lock()
        .map(|mut bytes| std::mem::take(&mut *bytes))
        .unwrap_or_default()
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this child.
    let result = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if result != 0 {
        let error = std::io::Error::last_os_error();
        // An empty group is the common case after a clean exit.
        if error.raw_os_error() != Some(libc::ESRCH) {
            debug!("Could not kill process group {}: {}", pgid, error);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

/// The `git` executable, invoked with a per-command timeout.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: PathBuf,
    timeout: Duration,
}

impl SystemGit {
    /// Resolves `git` on `PATH`.
    pub fn locate(timeout: Duration) -> Result<SystemGit, GitError> {
        Self::with_program("git", timeout)
    }

    pub fn with_program(program: impl AsRef<OsStr>, timeout: Duration) -> Result<SystemGit, GitError> {
        let program = which::which(program)?;
        debug!("Using {}", program.display());
        Ok(SystemGit { program, timeout })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, dir: &Path, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.current_dir(dir);
        cmd.args(args);
        cmd
    }

    fn display(&self, args: &[&str]) -> String {
        let mut display = self.program.display().to_string();
        for arg in args {
            display.push(' ');
            display.push_str(arg);
        }
        display
    }
}

impl GitExecutor for SystemGit {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        run_with_timeout(self.command(dir, args), &self.display(args), self.timeout)
    }
}

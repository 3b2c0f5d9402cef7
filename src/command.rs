//! Spawning a shell command with fully piped stdio.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::error::ExecError;

/// An executable invocation plus the directory it runs in.
///
/// The command line is handed to a shell (`sh -c` on unix, `cmd /C` on
/// windows), so shell operators like pipes, redirection and `&&` chains are
/// valid inside it.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    command: String,
    cwd: Option<PathBuf>,
}

impl ShellCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
        }
    }

    /// Run the command in `dir` instead of the caller's current directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn command_line(&self) -> &str {
        &self.command
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Start the process, returning a handle exposing its stdin, stdout,
    /// stderr and exit notification. No retry is attempted: if the shell
    /// starts but the command line fails, that surfaces as the shell's own
    /// non-zero exit.
    pub fn spawn(&self) -> Result<SpawnedChild, ExecError> {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.command);
            c
        };

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        debug!(command = %self.command, pid = ?child.id(), "spawned shell command");

        let stdin = take_pipe(child.stdin.take(), &self.command, "stdin")?;
        let stdout = take_pipe(child.stdout.take(), &self.command, "stdout")?;
        let stderr = take_pipe(child.stderr.take(), &self.command, "stderr")?;

        Ok(SpawnedChild {
            child,
            stdin,
            stdout,
            stderr,
        })
    }
}

/// A running child with its three pipes detached and ready to hand out.
///
/// stdin is written exclusively by the input scheduler; stdout/stderr are
/// drained by the output router; `child.wait()` is the exit notification.
pub struct SpawnedChild {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

fn take_pipe<T>(pipe: Option<T>, command: &str, name: &str) -> Result<T, ExecError> {
    pipe.ok_or_else(|| ExecError::Spawn {
        command: command.to_string(),
        source: std::io::Error::other(format!("child {name} was not piped")),
    })
}

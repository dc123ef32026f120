//! External command execution.
//!
//! Every command is written to an append-only [`LogSink`] as an audit line
//! before it runs, and its output is redirected to the same sink. Nothing here
//! writes to the process's own stdout; operator-facing progress is the
//! orchestrator's job.
//!
//! Execution modes:
//! - [`CommandRunner::run_checked`]: non-zero exit is a fatal error
//! - [`CommandRunner::run_ignored`]: all status information is swallowed
//! - [`CommandRunner::run_inspect`]: the exit status is returned as-is
//! - [`CommandRunner::run_captured`]: stdout is handed back to the caller
//! - [`CommandRunner::spawn_background`]: a long-lived process the caller
//!   blocks on later

use std::{
    fmt,
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, instrument, warn};

use crate::errors::Error;

/// Prefix of every audit line written before a command runs
pub const AUDIT_PREFIX: &str = "### Executing cmd: ";

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;

/// Append-only log file shared by every command of one invocation.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: File,
}

impl LogSink {
    /// Opens (or creates) the log file at `path` in append mode.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened command log at {:?}", path);
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the audit line for `command`.
    pub fn audit(&self, command: &str) -> Result<(), Error> {
        self.append(&format!("{}{}\n", AUDIT_PREFIX, command))
    }

    /// Appends raw text to the log.
    pub fn append(&self, text: &str) -> Result<(), Error> {
        (&self.file).write_all(text.as_bytes())?;
        (&self.file).flush()?;
        Ok(())
    }

    /// A new handle to the log usable as a child process's stdout or stderr.
    pub fn stdio(&self) -> Result<Stdio, Error> {
        Ok(Stdio::from(self.file.try_clone()?))
    }
}

/// A program and its arguments.
///
/// Arguments are passed to the OS verbatim; no shell is involved. The
/// `Display` form is what ends up in the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', "'\\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Output of [`CommandRunner::run_captured`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub code: Option<i32>,
    pub stdout: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Handle to a long-lived process started in the background.
#[async_trait]
pub trait BackgroundProcess: Send {
    /// Human readable description, used in progress messages.
    fn describe(&self) -> String;

    /// Blocks until the process exits and returns its exit code.
    ///
    /// `None` means the process was terminated by a signal.
    async fn wait(&mut self) -> Result<Option<i32>, Error>;
}

/// A child process spawned by [`CommandRunner::spawn_background`].
#[derive(Debug)]
pub struct ChildProcess {
    command: String,
    child: Child,
}

#[async_trait]
impl BackgroundProcess for ChildProcess {
    fn describe(&self) -> String {
        match self.child.id() {
            Some(pid) => format!("`{}` (pid {})", self.command, pid),
            None => format!("`{}`", self.command),
        }
    }

    async fn wait(&mut self) -> Result<Option<i32>, Error> {
        let status = self.child.wait().await?;
        debug!("Background process `{}` exited: {}", self.command, status);
        Ok(status.code())
    }
}

/// Runs external commands with their output redirected to a [`LogSink`].
#[derive(Debug, Clone)]
pub struct CommandRunner {
    log: Arc<LogSink>,
}

impl CommandRunner {
    pub fn new(log: Arc<LogSink>) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    fn prepare(&self, command: &CommandLine) -> Result<Command, Error> {
        self.log.audit(&command.to_string())?;

        let mut cmd = Command::new(command.program());
        cmd.args(command.arguments())
            .stdin(Stdio::null())
            .stdout(self.log.stdio()?)
            .stderr(self.log.stdio()?);
        Ok(cmd)
    }

    fn spawn_error(command: &CommandLine, source: std::io::Error) -> Error {
        Error::CommandSpawn {
            command: command.to_string(),
            source,
        }
    }

    /// Runs `command` and returns its exit status without judging it.
    ///
    /// Only a failure to start the process is reported as an error.
    #[instrument(skip_all, fields(command = %command))]
    pub async fn run_inspect(&self, command: &CommandLine) -> Result<ExitStatus, Error> {
        let mut cmd = self.prepare(command)?;
        let status = cmd
            .status()
            .await
            .map_err(|e| Self::spawn_error(command, e))?;
        debug!("Command finished with {}", status);
        Ok(status)
    }

    /// Runs `command` and fails unless it exits with status zero.
    pub async fn run_checked(&self, command: &CommandLine) -> Result<(), Error> {
        let status = self.run_inspect(command).await?;
        if status.success() {
            return Ok(());
        }

        Err(Error::CommandFailed {
            command: command.to_string(),
            code: status.code(),
        })
    }

    /// Runs `command`, swallowing every failure including spawn errors.
    pub async fn run_ignored(&self, command: &CommandLine) {
        match self.run_inspect(command).await {
            Ok(status) => debug!("Ignored status {} of `{}`", status, command),
            Err(e) => debug!("Ignored failure of `{}`: {}", command, e),
        }
    }

    /// Runs `command` capturing stdout; stderr still goes to the log.
    ///
    /// The captured stdout is also appended to the log so the audit trail
    /// stays complete.
    #[instrument(skip_all, fields(command = %command))]
    pub async fn run_captured(&self, command: &CommandLine) -> Result<CapturedOutput, Error> {
        let mut cmd = self.prepare(command)?;
        cmd.stdout(Stdio::piped());

        let child = cmd.spawn().map_err(|e| Self::spawn_error(command, e))?;
        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if let Err(e) = self.log.append(&stdout) {
            warn!("Failed to copy captured output to the log: {}", e);
        }

        Ok(CapturedOutput {
            code: output.status.code(),
            stdout,
        })
    }

    /// Starts `command` without waiting for it.
    #[instrument(skip_all, fields(command = %command))]
    pub fn spawn_background(&self, command: &CommandLine) -> Result<ChildProcess, Error> {
        let mut cmd = self.prepare(command)?;
        let child = cmd.spawn().map_err(|e| Self::spawn_error(command, e))?;
        debug!("Spawned background process {:?}", child.id());

        Ok(ChildProcess {
            command: command.to_string(),
            child,
        })
    }
}

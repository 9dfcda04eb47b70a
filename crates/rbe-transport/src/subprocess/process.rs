//! Process management for the engine subprocess

use crate::codec;
use crate::error::{Result, TransportError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::{BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Where the child's standard error goes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StderrMode {
    /// Share the parent's stderr
    #[default]
    Inherit,
    /// Send it to the null device
    Discard,
}

impl StderrMode {
    fn stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Discard => Stdio::null(),
        }
    }
}

/// Configuration for spawning a subprocess
#[derive(Clone, Debug)]
pub struct ProcessConfig {
    /// Path to the executable
    pub program: PathBuf,

    /// Positional arguments, passed in order
    pub args: Vec<String>,

    /// Environment variables to set
    pub env: HashMap<String, String>,

    /// Start from an empty environment instead of inheriting the parent's
    pub env_clear: bool,

    /// Where stderr goes
    pub stderr: StderrMode,

    /// Kill the child when the handle is dropped
    pub kill_on_drop: bool,

    /// Working directory for the child (parent's if unset)
    pub working_dir: Option<PathBuf>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::new("./rbe")
    }
}

impl ProcessConfig {
    /// Create a new process configuration
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            env_clear: false,
            stderr: StderrMode::default(),
            kill_on_drop: true,
            working_dir: None,
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments, keeping their order
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Do not inherit the parent's environment
    ///
    /// Only variables set via [ProcessConfig::with_env] reach the child.
    pub fn with_env_clear(mut self) -> Self {
        self.env_clear = true;
        self
    }

    /// Set where stderr goes
    pub fn with_stderr(mut self, stderr: StderrMode) -> Self {
        self.stderr = stderr;
        self
    }

    /// Set whether dropping the handle kills the child
    pub fn with_kill_on_drop(mut self, kill_on_drop: bool) -> Self {
        self.kill_on_drop = kill_on_drop;
        self
    }

    /// Set the working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Full command line: program followed by its arguments
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Handle to a running subprocess
///
/// Owns the child and both pipes. Every exchange takes `&mut self`, so at
/// most one request is in flight per handle.
pub struct ProcessHandle {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    stdout: BufReader<ChildStdout>,
    config: ProcessConfig,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.child.id())
            .field("stdin_open", &self.stdin.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl ProcessHandle {
    /// Spawn a new subprocess
    ///
    /// A single attempt is made; if the OS refuses, the error is returned
    /// as [TransportError::Spawn].
    pub async fn spawn(config: ProcessConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args);

        if config.env_clear {
            cmd.env_clear();
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(config.stderr.stdio());
        cmd.kill_on_drop(config.kill_on_drop);

        let mut child = cmd.spawn().map_err(|source| TransportError::Spawn {
            program: config.program.display().to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Process("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Process("Failed to get stdout".to_string()))?;

        info!(
            program = %config.program.display(),
            args = config.args.len(),
            pid = ?child.id(),
            "Spawned subprocess"
        );

        Ok(Self {
            child,
            stdin: Some(BufWriter::new(stdin)),
            stdout: BufReader::new(stdout),
            config,
        })
    }

    /// Write one line (a `\n` is appended) and flush it
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| TransportError::Process("stdin already closed".to_string()))?;
        codec::write_line(stdin, line).await
    }

    /// Read one trimmed line; `None` means the child closed its output
    pub async fn recv_line(&mut self) -> Result<Option<String>> {
        codec::read_line(&mut self.stdout).await
    }

    /// Send one request line and wait for exactly one response line
    pub async fn exchange(&mut self, line: &str) -> Result<String> {
        self.send_line(line).await?;
        match self.recv_line().await? {
            Some(response) => {
                debug!(
                    request_len = line.len(),
                    response_len = response.len(),
                    "Line exchange complete"
                );
                Ok(response)
            }
            None => {
                warn!(pid = ?self.child.id(), "Subprocess closed its output before answering");
                Err(TransportError::Closed)
            }
        }
    }

    /// Check if the process is still running
    pub fn is_alive(&mut self) -> bool {
        self.child.try_wait().ok().flatten().is_none()
    }

    /// OS process id, if the child has not been reaped yet
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the process (SIGKILL on unix) and reap it
    pub async fn kill(&mut self) -> Result<()> {
        info!(pid = ?self.child.id(), "Killing subprocess");
        self.child
            .kill()
            .await
            .map_err(|e| TransportError::Process(format!("Failed to kill process: {}", e)))
    }

    /// Ask the process to exit (SIGTERM on unix)
    ///
    /// Does not wait for it; follow with [ProcessHandle::close] to reap.
    /// Elsewhere this falls back to [ProcessHandle::kill].
    #[cfg(unix)]
    pub async fn terminate(&mut self) -> Result<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id() else {
            // Already reaped
            return Ok(());
        };
        let pid = i32::try_from(pid)
            .map_err(|_| TransportError::Process(format!("pid {} out of range", pid)))?;

        info!(pid, "Sending SIGTERM to subprocess");
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(errno) => Err(TransportError::Process(format!(
                "Failed to signal process: {}",
                errno
            ))),
        }
    }

    /// Ask the process to exit
    #[cfg(not(unix))]
    pub async fn terminate(&mut self) -> Result<()> {
        self.kill().await
    }

    /// Close stdin and wait for the child to exit
    ///
    /// Closing stdin is the engine's end-of-input signal, so a well-behaved
    /// child exits on its own. Wrap in a timeout if it might not.
    pub async fn close(mut self) -> Result<ExitStatus> {
        drop(self.stdin.take());
        let status = self.child.wait().await?;
        info!(%status, "Subprocess exited");
        Ok(status)
    }

    /// Get the process configuration
    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }
}

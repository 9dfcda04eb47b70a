//! Starting engine processes
//!
//! The engine takes `<metric> <direction> <database>...` as positional
//! arguments, in exactly that order.

use crate::config::RbeConfig;
use crate::error::Result;
use crate::session::RbeSession;
use rbe_transport::{ProcessConfig, ProcessHandle};
use tracing::debug;

/// Starts engine processes from one configuration
///
/// Each call to [ProcessLauncher::launch] creates a new, independent
/// process and session.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    config: RbeConfig,
}

impl ProcessLauncher {
    /// Create a launcher, validating the configuration
    pub fn new(config: RbeConfig) -> Result<Self> {
        Ok(Self {
            config: config.validated()?,
        })
    }

    /// The configuration sessions are started with
    pub fn config(&self) -> &RbeConfig {
        &self.config
    }

    /// Subprocess settings derived from the engine configuration
    pub fn process_config(&self) -> ProcessConfig {
        let config = &self.config;
        let mut process = ProcessConfig::new(config.binary.clone())
            .with_arg(config.metric.clone())
            .with_arg(config.direction.clone())
            .with_args(config.database_files.iter().cloned())
            .with_stderr(config.stderr);
        for (key, value) in &config.env {
            process = process.with_env(key.clone(), value.clone());
        }
        process
    }

    /// Full command line: `[binary, metric, direction, file_1, ..., file_n]`
    pub fn command_line(&self) -> Vec<String> {
        self.process_config().command_line()
    }

    /// Spawn the engine and wrap it in a session
    pub async fn launch(&self) -> Result<RbeSession> {
        let process_config = self.process_config();
        debug!(command = ?process_config.command_line(), "Launching rule based engine");
        let process = ProcessHandle::spawn(process_config).await?;
        Ok(RbeSession::new(process, &self.config))
    }
}

/// Start the engine at the default path with the given databases
///
/// Convenience over [ProcessLauncher] for the common case; the binary is
/// `./rbe` and no timeout is applied.
pub async fn start_process<S: AsRef<str>>(
    database_files: &[S],
    metric: impl Into<String>,
    direction: impl Into<String>,
) -> Result<RbeSession> {
    let config = RbeConfig::builder()
        .database_files(database_files.iter().map(|f| f.as_ref().to_string()))
        .metric(metric)
        .direction(direction)
        .build()?;
    ProcessLauncher::new(config)?.launch().await
}

//! Engine session configuration

use crate::error::{RbeError, Result};
use crate::token::TokenPolicy;
use rbe_transport::StderrMode;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Binary path used when nothing else is configured
pub const DEFAULT_BINARY: &str = "./rbe";

/// Configuration for launching the engine and talking to it
///
/// `metric` and `direction` are opaque to this crate; the engine parses and
/// validates them.
#[derive(Debug, Clone, PartialEq)]
pub struct RbeConfig {
    /// Path to the engine executable
    pub binary: PathBuf,

    /// Rule database files, passed in this order
    pub database_files: Vec<String>,

    /// Metric identifier (first positional argument)
    pub metric: String,

    /// Direction identifier (second positional argument)
    pub direction: String,

    /// Deadline for each response line (`None` waits forever)
    pub response_timeout: Option<Duration>,

    /// Token checking before each request
    pub token_policy: TokenPolicy,

    /// Where the engine's stderr goes
    pub stderr: StderrMode,

    /// Extra environment variables for the engine
    pub env: HashMap<String, String>,
}

impl Default for RbeConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            database_files: Vec::new(),
            metric: "0".to_string(),
            direction: "-1".to_string(),
            response_timeout: None,
            token_policy: TokenPolicy::default(),
            stderr: StderrMode::default(),
            env: HashMap::new(),
        }
    }
}

/// On-disk form of [RbeConfig]; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    binary: Option<PathBuf>,
    database_files: Option<Vec<String>>,
    metric: Option<String>,
    direction: Option<String>,
    timeout_ms: Option<u64>,
    token_policy: Option<TokenPolicy>,
    stderr: Option<StderrMode>,
    env: HashMap<String, String>,
}

impl RbeConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder
    pub fn builder() -> RbeConfigBuilder {
        RbeConfigBuilder::default()
    }

    /// Load configuration from environment variables on top of the defaults
    ///
    /// See [RbeConfig::apply_env] for the variables read.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Overlay environment variables onto this config
    ///
    /// This will look for:
    /// - `RBE_BINARY` for the engine path
    /// - `RBE_METRIC` and `RBE_DIRECTION`
    /// - `RBE_DATABASES`, split with the platform path separator
    /// - `RBE_TIMEOUT_MS` for the response deadline in milliseconds
    pub fn apply_env(mut self) -> Result<Self> {
        use std::env;

        if let Ok(binary) = env::var("RBE_BINARY") {
            self.binary = PathBuf::from(binary);
        }

        if let Ok(metric) = env::var("RBE_METRIC") {
            self.metric = metric;
        }

        if let Ok(direction) = env::var("RBE_DIRECTION") {
            self.direction = direction;
        }

        if let Some(databases) = env::var_os("RBE_DATABASES") {
            self.database_files = env::split_paths(&databases)
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
        }

        if let Ok(timeout_str) = env::var("RBE_TIMEOUT_MS") {
            let millis = timeout_str.trim().parse::<u64>().map_err(|e| {
                RbeError::Config(format!("RBE_TIMEOUT_MS={:?}: {}", timeout_str, e))
            })?;
            self.response_timeout = Some(Duration::from_millis(millis));
        }

        self.validated()
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| RbeError::Config(e.to_string()))?;
        Self::default().merge_file(file).validated()
    }

    /// Read and parse a TOML config file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&text)
            .map_err(|e| RbeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::default().merge_file(file).validated()
    }

    fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(binary) = file.binary {
            self.binary = binary;
        }
        if let Some(database_files) = file.database_files {
            self.database_files = database_files;
        }
        if let Some(metric) = file.metric {
            self.metric = metric;
        }
        if let Some(direction) = file.direction {
            self.direction = direction;
        }
        if let Some(timeout_ms) = file.timeout_ms {
            self.response_timeout = Some(Duration::from_millis(timeout_ms));
        }
        if let Some(policy) = file.token_policy {
            self.token_policy = policy;
        }
        if let Some(stderr) = file.stderr {
            self.stderr = stderr;
        }
        self.env.extend(file.env);
        self
    }

    /// Check invariants the launcher relies on
    pub fn validated(self) -> Result<Self> {
        if self.binary.as_os_str().is_empty() {
            return Err(RbeError::Config("binary path is empty".to_string()));
        }
        if self.response_timeout == Some(Duration::ZERO) {
            return Err(RbeError::Config(
                "response timeout must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Builder for [RbeConfig]
#[derive(Debug, Default)]
pub struct RbeConfigBuilder {
    config: RbeConfig,
}

impl RbeConfigBuilder {
    /// Set the engine binary path
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.binary = path.into();
        self
    }

    /// Append one rule database
    pub fn database_file(mut self, file: impl Into<String>) -> Self {
        self.config.database_files.push(file.into());
        self
    }

    /// Replace the rule database list
    pub fn database_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.database_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Set the metric identifier
    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.config.metric = metric.into();
        self
    }

    /// Set the direction identifier
    pub fn direction(mut self, direction: impl Into<String>) -> Self {
        self.config.direction = direction.into();
        self
    }

    /// Set a deadline for each response line
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = Some(timeout);
        self
    }

    /// Set the token policy
    pub fn token_policy(mut self, policy: TokenPolicy) -> Self {
        self.config.token_policy = policy;
        self
    }

    /// Set where the engine's stderr goes
    pub fn stderr(mut self, stderr: StderrMode) -> Self {
        self.config.stderr = stderr;
        self
    }

    /// Set an environment variable for the engine
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.env.insert(key.into(), value.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RbeConfig> {
        self.config.validated()
    }
}

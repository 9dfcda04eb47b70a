//! Error types for engine sessions
//!
//! Errors implement [ErrorRecovery], which tells the caller whether the
//! same call may succeed again and whether the session is still usable.
//! Nothing in this crate retries on its own.

use rbe_transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, RbeError>;

/// Recovery guidance attached to an error
pub trait ErrorRecovery {
    /// Whether repeating the same call could succeed
    fn is_retriable(&self) -> bool;

    /// Whether the session that produced the error must be replaced
    fn is_fatal_to_session(&self) -> bool;

    /// User-facing action to take
    fn suggested_action(&self) -> &'static str;
}

/// Errors that can occur while starting or talking to the engine
#[derive(Debug, Error)]
pub enum RbeError {
    /// The engine binary could not be started
    #[error("failed to start rule based engine '{binary}': {source}")]
    ProcessStart {
        /// Binary path that was launched
        binary: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Pipe failure or end-of-stream during an exchange
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// No response line arrived within the configured deadline
    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),

    /// A token would break the line framing
    #[error("token {index} ({token:?}) contains a space or line break")]
    InvalidToken {
        /// Position of the offending token in the request
        index: usize,
        /// The token itself
        token: String,
    },

    /// An earlier timeout, stream failure or shutdown ended the session
    #[error("session is unusable after an earlier failure; start a new one")]
    SessionPoisoned,

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error outside an exchange (e.g. reading a config file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for RbeError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Spawn { program, source } => Self::ProcessStart {
                binary: program,
                source,
            },
            other => Self::Transport(other),
        }
    }
}

impl ErrorRecovery for RbeError {
    fn is_retriable(&self) -> bool {
        match self {
            // Same request on a fresh session may work
            Self::Transport(_) | Self::Timeout(_) | Self::SessionPoisoned => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::Interrupted,
            Self::ProcessStart { .. } | Self::InvalidToken { .. } | Self::Config(_) => false,
        }
    }

    fn is_fatal_to_session(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_stream_broken(),
            Self::Timeout(_) | Self::SessionPoisoned => true,
            Self::ProcessStart { .. } => true,
            Self::InvalidToken { .. } | Self::Config(_) | Self::Io(_) => false,
        }
    }

    fn suggested_action(&self) -> &'static str {
        match self {
            Self::ProcessStart { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => {
                    "Engine binary not found. Build rbe or point RBE_BINARY at it."
                }
                std::io::ErrorKind::PermissionDenied => {
                    "Engine binary is not executable. Check its file permissions."
                }
                _ => "The OS refused to start the engine. Check the binary path.",
            },
            Self::Transport(TransportError::Closed) => {
                "Engine exited before answering. Check its stderr and the rule \
                databases, then start a new session."
            }
            Self::Transport(_) => "Pipe to the engine failed. Start a new session.",
            Self::Timeout(_) => {
                "Engine did not answer in time. Raise the timeout or simplify \
                the request, then start a new session."
            }
            Self::InvalidToken { .. } => {
                "Split the token on whitespace, or drop TokenPolicy::Strict \
                if the engine expects it verbatim."
            }
            Self::SessionPoisoned => "Start a new session.",
            Self::Config(_) => "Fix the configuration and try again.",
            Self::Io(_) => "Check the file path and permissions.",
        }
    }
}

//! Transport error types

use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur in transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    /// The operating system refused to start the program
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that was being launched
        program: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// I/O error on one of the pipes (including broken pipe on write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The child closed its output before producing a line
    #[error("process closed its output before answering")]
    Closed,

    /// Process management error (missing pipe, signal delivery, ...)
    #[error("process error: {0}")]
    Process(String),
}

impl TransportError {
    /// Whether the handle that produced this error can no longer carry requests
    pub fn is_stream_broken(&self) -> bool {
        match self {
            Self::Closed | Self::Spawn { .. } => true,
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
            ),
            Self::Process(_) => false,
        }
    }
}

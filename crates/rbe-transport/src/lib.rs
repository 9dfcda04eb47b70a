//! Line-oriented subprocess transport
//!
//! Spawns an external program with piped stdin/stdout and exchanges
//! newline-terminated text lines with it. This layer knows nothing about
//! rule databases or metrics; it only owns the process and frames lines.
//!
//! # Architecture
//!
//! - **ProcessHandle**: owned child process plus its buffered pipes
//! - **Codec**: request/response line framing over any async stream

#![deny(unsafe_code)]
#![warn(missing_docs)]
//! - **LineTransport trait**: seam for swapping the real process for a mock
//! - **Error handling**: one error type for spawn, I/O and EOF failures
//!
//! # Usage
//!
//! ```ignore
//! use rbe_transport::{ProcessConfig, ProcessHandle};
//!
//! let config = ProcessConfig::new("./rbe").with_args(["0", "-1", "rules.rbe"]);
//! let mut process = ProcessHandle::spawn(config).await?;
//! let answer = process.exchange("x + 0").await?;
//! ```

pub mod codec;
pub mod error;
pub mod subprocess;
pub mod traits;

// Re-export commonly used types
pub use error::{Result, TransportError};
pub use subprocess::{ProcessConfig, ProcessHandle, StderrMode};
pub use traits::LineTransport;

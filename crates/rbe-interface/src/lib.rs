//! Drive the rule based engine (rbe) from Rust
//!
//! The engine is an external program that loads rule databases, then reads
//! space-separated token lines on stdin and answers each with one line on
//! stdout. This crate starts it and turns each request into an ordinary
//! async call.
//!
//! # Architecture
//!
//! 1. **Transport layer** (`rbe-transport`): subprocess and line framing
//! 2. **Engine layer** (this crate): command-line assembly, token checks,
//!    timeouts, and session state

#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! # Usage Example
//!
//! ```ignore
//! use rbe_interface::start_process;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut session = start_process(&["test2.rbe"], "0", "-1").await?;
//!     let result = session
//!         .optimize_tokens(&["(", "4", "+", "2", ")", "^", "2"])
//!         .await?;
//!     println!("RESULT: {}", result);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod launcher;
pub mod session;
pub mod testing;
pub mod token;

pub use config::{DEFAULT_BINARY, RbeConfig, RbeConfigBuilder};
pub use error::{ErrorRecovery, RbeError, Result};
pub use launcher::{ProcessLauncher, start_process};
pub use rbe_transport::StderrMode;
pub use session::RbeSession;
pub use token::TokenPolicy;

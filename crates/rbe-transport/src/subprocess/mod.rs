//! Subprocess management
//!
//! Spawns the external program with piped stdin/stdout and exposes a
//! line-at-a-time request/response interface over those pipes.

pub mod process;

pub use process::{ProcessConfig, ProcessHandle, StderrMode};

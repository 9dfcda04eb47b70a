//! Transport trait
//!
//! Defines the line-level request/response interface that the session
//! layer is written against. [ProcessHandle] is the real implementation;
//! tests substitute scripted ones.

use crate::error::Result;
use crate::subprocess::ProcessHandle;
use async_trait::async_trait;

/// A strictly request/response line channel
#[async_trait]
pub trait LineTransport: Send {
    /// Send one line (without its terminator) and return the trimmed answer
    async fn exchange(&mut self, line: &str) -> Result<String>;

    /// Check if the peer is still there
    fn is_alive(&mut self) -> bool;

    /// Stop the peer and release the channel
    async fn shutdown(&mut self) -> Result<()>;
}

#[async_trait]
impl LineTransport for ProcessHandle {
    async fn exchange(&mut self, line: &str) -> Result<String> {
        ProcessHandle::exchange(self, line).await
    }

    fn is_alive(&mut self) -> bool {
        ProcessHandle::is_alive(self)
    }

    async fn shutdown(&mut self) -> Result<()> {
        if ProcessHandle::is_alive(self) {
            self.kill().await?;
        }
        Ok(())
    }
}

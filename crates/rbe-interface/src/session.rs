//! Request/response sessions with a running engine
//!
//! A session turns the engine into a function call: one token list in,
//! one trimmed answer line out. It owns its transport, and every exchange
//! takes `&mut self`, so a second request cannot be written before the
//! first answer has been read.

use crate::config::RbeConfig;
use crate::error::{RbeError, Result};
use crate::token::TokenPolicy;
use rbe_transport::codec;
use rbe_transport::{LineTransport, ProcessHandle};
use std::process::ExitStatus;
use std::time::Duration;
use tracing::{debug, warn};

/// A live engine session
///
/// Generic over the transport so the protocol can be exercised without a
/// real process; in normal use it wraps a [ProcessHandle].
#[derive(Debug)]
pub struct RbeSession<T: LineTransport = ProcessHandle> {
    transport: T,
    token_policy: TokenPolicy,
    response_timeout: Option<Duration>,
    exchanges: u64,
    poisoned: bool,
}

impl<T: LineTransport> RbeSession<T> {
    /// Wrap a transport using the policy and timeout from `config`
    pub fn new(transport: T, config: &RbeConfig) -> Self {
        Self {
            transport,
            token_policy: config.token_policy,
            response_timeout: config.response_timeout,
            exchanges: 0,
            poisoned: false,
        }
    }

    /// Send tokens to the engine and return its answer
    ///
    /// The request is the tokens joined by single spaces plus `\n`; the
    /// answer is the next line of output with surrounding whitespace
    /// removed. Blocks until that line arrives unless a response timeout
    /// is configured.
    pub async fn optimize_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<String> {
        if self.poisoned {
            return Err(RbeError::SessionPoisoned);
        }
        self.token_policy.check(tokens)?;

        let line = codec::join_tokens(tokens);
        let outcome = match self.response_timeout {
            Some(limit) => {
                let timed = tokio::time::timeout(limit, self.transport.exchange(&line)).await;
                match timed {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        // A late answer would be read as the reply to the next request
                        warn!(?limit, exchange = self.exchanges + 1, "Engine response timed out");
                        self.poisoned = true;
                        return Err(RbeError::Timeout(limit));
                    }
                }
            }
            None => self.transport.exchange(&line).await,
        };

        match outcome {
            Ok(response) => {
                self.exchanges += 1;
                debug!(
                    exchange = self.exchanges,
                    tokens = tokens.len(),
                    response_len = response.len(),
                    "Engine exchange complete"
                );
                Ok(response)
            }
            Err(err) => {
                if err.is_stream_broken() {
                    warn!(error = %err, "Engine stream broken; session is no longer usable");
                    self.poisoned = true;
                }
                Err(err.into())
            }
        }
    }

    /// Alias for [RbeSession::optimize_tokens]
    pub async fn send<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<String> {
        self.optimize_tokens(tokens).await
    }

    /// Number of successful exchanges so far
    pub fn exchange_count(&self) -> u64 {
        self.exchanges
    }

    /// Whether an earlier failure made the session unusable
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Check if the engine is still running
    pub fn is_alive(&mut self) -> bool {
        self.transport.is_alive()
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Take the underlying transport back
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Stop the engine
    ///
    /// The session stays around for inspection; further requests fail with
    /// [RbeError::SessionPoisoned].
    pub async fn shutdown(&mut self) -> Result<()> {
        self.poisoned = true;
        self.transport.shutdown().await?;
        Ok(())
    }
}

impl RbeSession<ProcessHandle> {
    /// OS process id of the engine
    pub fn id(&self) -> Option<u32> {
        self.transport.id()
    }

    /// Ask the engine to exit without waiting for it
    pub async fn terminate(&mut self) -> Result<()> {
        self.transport.terminate().await?;
        Ok(())
    }

    /// Close the engine's input and wait for it to exit
    pub async fn close(self) -> Result<ExitStatus> {
        Ok(self.transport.close().await?)
    }
}

//! Testing utilities
//!
//! Provides a scripted [LineTransport] so session behaviour can be tested
//! without a real engine process.

use async_trait::async_trait;
use rbe_transport::{LineTransport, Result as TransportResult, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<String>,
    queued: VecDeque<TransportResult<String>>,
}

/// A mock engine transport
///
/// Records every line sent and answers from a queue. Clones share state,
/// so a test can keep one clone for assertions while a session owns
/// another. An empty queue answers like an engine that closed its output.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    alive: Arc<AtomicBool>,
    delay: Option<Duration>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new mock with an empty response queue
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            alive: Arc::new(AtomicBool::new(true)),
            delay: None,
        }
    }

    /// Wait this long before each answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue an answer line
    pub fn queue_response(&self, response: impl Into<String>) {
        self.lock().queued.push_back(Ok(response.into()));
    }

    /// Queue a failure for the next exchange
    pub fn queue_error(&self, error: TransportError) {
        self.lock().queued.push_back(Err(error));
    }

    /// Lines sent so far, without terminators
    pub fn sent_lines(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Whether the mock engine has not been shut down
    pub fn is_running(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LineTransport for MockTransport {
    async fn exchange(&mut self, line: &str) -> TransportResult<String> {
        if !self.is_running() {
            return Err(TransportError::Io(std::io::Error::from(
                std::io::ErrorKind::BrokenPipe,
            )));
        }
        self.lock().sent.push(line.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.lock().queued.pop_front();
        next.unwrap_or(Err(TransportError::Closed))
    }

    fn is_alive(&mut self) -> bool {
        self.is_running()
    }

    async fn shutdown(&mut self) -> TransportResult<()> {
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_answers_in_order() {
        let mut mock = MockTransport::new();
        mock.queue_response("one");
        mock.queue_response("two");

        assert_eq!(mock.exchange("a").await.unwrap(), "one");
        assert_eq!(mock.exchange("b").await.unwrap(), "two");
        assert_eq!(mock.sent_lines(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_mock_empty_queue_is_closed() {
        let mut mock = MockTransport::new();
        assert!(matches!(
            mock.exchange("a").await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_mock_after_shutdown() {
        let mut mock = MockTransport::new();
        mock.shutdown().await.unwrap();
        assert!(!mock.is_alive());
        let err = mock.exchange("a").await.unwrap_err();
        assert!(err.is_stream_broken());
        assert!(mock.sent_lines().is_empty());
    }
}

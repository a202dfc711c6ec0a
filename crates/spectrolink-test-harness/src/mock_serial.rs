//! Mock transport for deterministic testing of the acquisition session.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! byte chunks. Each `receive()` call returns at most one chunk, so the way
//! a test splits its bytes is exactly the way the frame pipeline sees them.
//! Once the transport has been moved into a session, a [`MockHandle`] keeps
//! feeding chunks and observing open/close calls.
//!
//! # Example
//!
//! ```
//! use spectrolink_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! mock.push_chunk(&[0x01, 0xFF, 0xFF]);
//! let handle = mock.handle();
//! handle.push(&[0xFF, 0xFF]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use spectrolink_core::error::{Error, Result};
use spectrolink_core::transport::Transport;

/// Something fed to the mock after construction.
#[derive(Debug)]
enum Feed {
    Chunk(Vec<u8>),
    Error(Error),
    ConnectionLost,
}

/// Open/close counters shared between the mock and its handles.
#[derive(Debug, Default)]
struct CallCounts {
    open_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

/// A mock [`Transport`] that replays byte chunks.
#[derive(Debug)]
pub struct MockTransport {
    /// Chunks waiting to be returned by `receive()`.
    pending: VecDeque<Vec<u8>>,
    /// Sender side kept so handles can be created at any time.
    feed_tx: mpsc::UnboundedSender<Feed>,
    /// Chunks pushed through a [`MockHandle`].
    feed_rx: mpsc::UnboundedReceiver<Feed>,
    /// Remaining number of `open()` calls that should fail.
    open_failures: u32,
    /// Whether the transport is "open".
    connected: bool,
    calls: Arc<CallCounts>,
    name: String,
}

impl MockTransport {
    /// Create a new mock transport in the closed state.
    pub fn new() -> Self {
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        MockTransport {
            pending: VecDeque::new(),
            feed_tx,
            feed_rx,
            open_failures: 0,
            connected: false,
            calls: Arc::new(CallCounts::default()),
            name: "mock".to_string(),
        }
    }

    /// Create a mock with a custom name, used in diagnostics.
    pub fn named(name: &str) -> Self {
        MockTransport {
            name: name.to_string(),
            ..Self::new()
        }
    }

    /// Queue one chunk to be returned by a future `receive()`.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.pending.push_back(chunk.to_vec());
    }

    /// Queue `data` split into chunks of at most `chunk_size` bytes.
    pub fn push_split(&mut self, data: &[u8], chunk_size: usize) {
        for chunk in data.chunks(chunk_size.max(1)) {
            self.push_chunk(chunk);
        }
    }

    /// Make the next `n` calls to `open()` fail.
    pub fn fail_opens(&mut self, n: u32) {
        self.open_failures = n;
    }

    /// Return a handle for feeding chunks after the mock has been moved.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            feed_tx: self.feed_tx.clone(),
            calls: Arc::clone(&self.calls),
        }
    }

    fn deliver(&mut self, mut chunk: Vec<u8>, buf: &mut [u8]) -> usize {
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            // Caller's buffer was too small; keep the rest for the next read.
            self.pending.push_front(chunk.split_off(n));
        }
        n
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self) -> Result<()> {
        self.calls.open_calls.fetch_add(1, Ordering::SeqCst);
        if self.open_failures > 0 {
            self.open_failures -= 1;
            return Err(Error::Transport(format!(
                "mock open failure on {}",
                self.name
            )));
        }
        self.connected = true;
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        if let Some(chunk) = self.pending.pop_front() {
            return Ok(self.deliver(chunk, buf));
        }

        match tokio::time::timeout(timeout, self.feed_rx.recv()).await {
            Ok(Some(Feed::Chunk(chunk))) => Ok(self.deliver(chunk, buf)),
            Ok(Some(Feed::Error(e))) => Err(e),
            Ok(Some(Feed::ConnectionLost)) => {
                self.connected = false;
                Err(Error::ConnectionLost)
            }
            // The mock holds its own sender, so the channel never closes.
            Ok(None) => Err(Error::ConnectionLost),
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.calls.close_calls.fetch_add(1, Ordering::SeqCst);
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Remote control for a [`MockTransport`] that has been moved elsewhere.
#[derive(Debug, Clone)]
pub struct MockHandle {
    feed_tx: mpsc::UnboundedSender<Feed>,
    calls: Arc<CallCounts>,
}

impl MockHandle {
    /// Deliver one chunk on a future `receive()`.
    pub fn push(&self, chunk: &[u8]) {
        // The receiver lives as long as the mock; once it's gone nobody reads.
        let _ = self.feed_tx.send(Feed::Chunk(chunk.to_vec()));
    }

    /// Make the next `receive()` fail with `error`. The link stays open.
    pub fn fail_read(&self, error: Error) {
        let _ = self.feed_tx.send(Feed::Error(error));
    }

    /// Make the next `receive()` fail with [`Error::ConnectionLost`].
    pub fn lose_connection(&self) {
        let _ = self.feed_tx.send(Feed::ConnectionLost);
    }

    /// Number of times `open()` has been called.
    pub fn open_calls(&self) -> usize {
        self.calls.open_calls.load(Ordering::SeqCst)
    }

    /// Number of times `close()` has been called.
    pub fn close_calls(&self) -> usize {
        self.calls.close_calls.load(Ordering::SeqCst)
    }
}

//! Acquisition session: owns the transport and drives the frame pipeline.
//!
//! [`AcquisitionSession::start`] opens the transport (retrying a bounded
//! number of times) and spawns a reader task that owns the transport for as
//! long as the session is open. Every successful `receive()` becomes one
//! [`SpectrumPipeline::on_bytes_received`] call, so frames are decoded and
//! published on the reader task.
//!
//! [`AcquisitionSession::stop`] cancels the reader, waits for it to hand the
//! transport back, then closes it. Once `stop()` returns the reader is gone,
//! so nothing more is published.
//!
//! ```text
//!   Idle --start()--> Open --stop()--> Closed
//!     |                                  ^
//!     +-------------stop()---------------+
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use spectrolink_core::error::{Error, Result};
use spectrolink_core::events::{Diagnostic, DiagnosticSink};
use spectrolink_core::transport::Transport;

use crate::pipeline::{PipelineStats, SpectrumPipeline};

/// Reader and open-retry settings, filled in by the builder.
#[derive(Debug, Clone)]
pub(crate) struct SessionConfig {
    /// Size of the buffer handed to each `receive()`.
    pub read_chunk_size: usize,
    /// How long a single `receive()` may wait before the reader re-checks
    /// for cancellation.
    pub poll_interval: Duration,
    /// Total number of `open()` attempts per `start()`.
    pub open_attempts: u32,
    /// Pause between failed `open()` attempts.
    pub open_retry_delay: Duration,
}

/// Lifecycle state of an [`AcquisitionSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, transport not yet opened.
    Idle,
    /// Transport open; inbound bytes are being processed.
    Open,
    /// Stopped. Terminal.
    Closed,
}

/// Handle to the running reader task.
struct Reader {
    cancel: CancellationToken,
    /// Resolves to the transport once the reader exits.
    task: JoinHandle<Box<dyn Transport>>,
}

enum Inner {
    Idle(Box<dyn Transport>),
    Open(Reader),
    Closed,
}

/// A spectrometer acquisition session.
///
/// Construct one with [`SessionBuilder`](crate::builder::SessionBuilder).
pub struct AcquisitionSession {
    inner: Mutex<Inner>,
    pipeline: Arc<SpectrumPipeline>,
    diagnostics: Arc<dyn DiagnosticSink>,
    config: SessionConfig,
    port: String,
}

impl AcquisitionSession {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        pipeline: Arc<SpectrumPipeline>,
        diagnostics: Arc<dyn DiagnosticSink>,
        config: SessionConfig,
    ) -> Self {
        let port = transport.name().to_string();
        AcquisitionSession {
            inner: Mutex::new(Inner::Idle(transport)),
            pipeline,
            diagnostics,
            config,
            port,
        }
    }

    /// Open the transport and start processing inbound bytes.
    ///
    /// Each failed open attempt is reported as
    /// [`Diagnostic::TransportOpenFailed`]. If every attempt fails the last
    /// error is returned and the session stays [`SessionState::Idle`], so
    /// `start()` may be called again.
    ///
    /// Returns [`Error::AlreadyStarted`] if the session is open and
    /// [`Error::SessionClosed`] once it has been stopped.
    pub async fn start(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let transport = match &mut *inner {
            Inner::Open(_) => return Err(Error::AlreadyStarted),
            Inner::Closed => return Err(Error::SessionClosed),
            Inner::Idle(transport) => transport,
        };

        self.open_transport(transport.as_mut()).await?;
        self.pipeline.reset();

        if let Inner::Idle(transport) = std::mem::replace(&mut *inner, Inner::Closed) {
            *inner = Inner::Open(self.spawn_reader(transport));
        }
        debug!(port = %self.port, "acquisition started");
        Ok(())
    }

    /// Stop the session and close the transport.
    ///
    /// Waits for the reader task to exit before closing, so no record is
    /// published after this returns. A reader that died abnormally is
    /// reported as [`Diagnostic::TransportError`] and `stop()` still
    /// succeeds. Calling `stop()` on a closed session is a no-op. Stopping an
    /// idle session closes it without ever opening the transport.
    pub async fn stop(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match std::mem::replace(&mut *inner, Inner::Closed) {
            Inner::Closed => Ok(()),
            Inner::Idle(mut transport) => {
                debug!(port = %self.port, "closing idle session");
                transport.close().await
            }
            Inner::Open(reader) => {
                reader.cancel.cancel();
                match reader.task.await {
                    Ok(mut transport) => {
                        transport.close().await?;
                        debug!(port = %self.port, "acquisition stopped");
                    }
                    Err(e) => {
                        // The transport went down with the task and was
                        // dropped, which releases the port.
                        self.diagnostics.report(Diagnostic::TransportError {
                            port: self.port.clone(),
                            reason: format!("reader task failed: {e}"),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        match &*self.inner.lock().await {
            Inner::Idle(_) => SessionState::Idle,
            Inner::Open(_) => SessionState::Open,
            Inner::Closed => SessionState::Closed,
        }
    }

    /// Whether the reader task is still running.
    ///
    /// A session can be [`SessionState::Open`] with a finished reader after
    /// the link was lost; call [`stop`](Self::stop) to release it.
    pub async fn is_receiving(&self) -> bool {
        match &*self.inner.lock().await {
            Inner::Open(reader) => !reader.task.is_finished(),
            _ => false,
        }
    }

    /// Pipeline counters for this session.
    pub fn stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    /// Name of the underlying transport.
    pub fn port(&self) -> &str {
        &self.port
    }

    #[cfg(test)]
    pub(crate) fn buffered_len(&self) -> usize {
        self.pipeline.buffered_len()
    }

    async fn open_transport(&self, transport: &mut dyn Transport) -> Result<()> {
        let mut attempt = 1;
        loop {
            match transport.open().await {
                Ok(()) => {
                    debug!(port = %self.port, attempt, "transport opened");
                    return Ok(());
                }
                Err(e) => {
                    self.diagnostics.report(Diagnostic::TransportOpenFailed {
                        port: self.port.clone(),
                        attempt,
                        reason: e.to_string(),
                    });
                    if attempt >= self.config.open_attempts {
                        return Err(e);
                    }
                    attempt += 1;
                    tokio::time::sleep(self.config.open_retry_delay).await;
                }
            }
        }
    }

    fn spawn_reader(&self, transport: Box<dyn Transport>) -> Reader {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(read_loop(
            transport,
            Arc::clone(&self.pipeline),
            Arc::clone(&self.diagnostics),
            self.config.clone(),
            cancel.clone(),
        ));
        Reader { cancel, task }
    }
}

impl Drop for AcquisitionSession {
    fn drop(&mut self) {
        if let Inner::Open(reader) = self.inner.get_mut() {
            reader.cancel.cancel();
        }
    }
}

/// The reader loop. Runs as a spawned Tokio task and returns the transport
/// when cancelled or when the link goes away.
async fn read_loop(
    mut transport: Box<dyn Transport>,
    pipeline: Arc<SpectrumPipeline>,
    diagnostics: Arc<dyn DiagnosticSink>,
    config: SessionConfig,
    cancel: CancellationToken,
) -> Box<dyn Transport> {
    let port = transport.name().to_string();
    let mut buf = vec![0u8; config.read_chunk_size];

    loop {
        let received = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(port = %port, "reader cancelled");
                break;
            }

            r = transport.receive(&mut buf, config.poll_interval) => r,
        };

        match received {
            Ok(0) | Err(Error::Timeout) => {}
            Ok(n) => {
                let chunk = &buf[..n];
                if let Err(payload) =
                    panic::catch_unwind(AssertUnwindSafe(|| pipeline.on_bytes_received(chunk)))
                {
                    diagnostics.report(Diagnostic::SinkPanicked {
                        reason: panic_message(payload.as_ref()),
                    });
                }
            }
            Err(e @ (Error::ConnectionLost | Error::NotConnected)) => {
                diagnostics.report(Diagnostic::TransportError {
                    port: port.clone(),
                    reason: e.to_string(),
                });
                break;
            }
            Err(e) => {
                diagnostics.report(Diagnostic::TransportError {
                    port: port.clone(),
                    reason: e.to_string(),
                });
                // Back off before the next read, but stay responsive to stop().
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(config.poll_interval) => {}
                }
            }
        }
    }

    transport
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

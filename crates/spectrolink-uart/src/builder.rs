//! SessionBuilder -- fluent builder for [`AcquisitionSession`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial port parameters, reader tuning and the open retry policy before
//! the transport is touched. Nothing is opened until
//! [`AcquisitionSession::start`] is called.
//!
//! # Example
//!
//! ```no_run
//! use spectrolink_uart::builder::SessionBuilder;
//! use std::sync::Arc;
//!
//! # async fn example() -> spectrolink_core::Result<()> {
//! let session = SessionBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(115_200)
//!     .on_spectrum(Arc::new(|record: spectrolink_core::SpectrumRecord| {
//!         println!("{} samples, snr {}", record.len(), record.snr);
//!     }))
//!     .build()?;
//! session.start().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use spectrolink_core::error::{Error, Result};
use spectrolink_core::events::{DiagnosticSink, TracingSink};
use spectrolink_core::spectrum::SpectrumSink;
use spectrolink_core::transport::Transport;
use spectrolink_transport::{SerialConfig, SerialTransport};

use crate::pipeline::SpectrumPipeline;
use crate::session::{AcquisitionSession, SessionConfig};

/// Fluent builder for [`AcquisitionSession`].
///
/// Only a spectrum sink is mandatory; everything else has a default:
/// 115200 baud, 4096-byte reads, a 100 ms receive poll, and three open
/// attempts 100 ms apart. Diagnostics go to `tracing` unless another sink
/// is supplied.
pub struct SessionBuilder {
    serial_port: Option<String>,
    serial_config: SerialConfig,
    read_chunk_size: usize,
    poll_interval: Duration,
    open_attempts: u32,
    open_retry_delay: Duration,
    sink: Option<Arc<dyn SpectrumSink>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl SessionBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        SessionBuilder {
            serial_port: None,
            serial_config: SerialConfig::default(),
            read_chunk_size: 4096,
            poll_interval: Duration::from_millis(100),
            open_attempts: 3,
            open_retry_delay: Duration::from_millis(100),
            sink: None,
            diagnostics: None,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the baud rate (default: 115200).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.serial_config.baud_rate = baud;
        self
    }

    /// Replace the whole serial line configuration, including baud rate.
    pub fn serial_config(mut self, config: SerialConfig) -> Self {
        self.serial_config = config;
        self
    }

    /// Size of the buffer passed to each transport read (default: 4096).
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// How long each transport read waits before the reader re-checks for
    /// shutdown (default: 100ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Number of times `start()` tries to open the transport (default: 3).
    pub fn open_attempts(mut self, attempts: u32) -> Self {
        self.open_attempts = attempts;
        self
    }

    /// Pause between failed open attempts (default: 100ms).
    pub fn open_retry_delay(mut self, delay: Duration) -> Self {
        self.open_retry_delay = delay;
        self
    }

    /// Set the subscriber that receives every decoded spectrum.
    ///
    /// The sink is called on the reader task and must not block; hand the
    /// record off (e.g. over an `mpsc` channel) if it needs real work.
    pub fn on_spectrum(mut self, sink: Arc<dyn SpectrumSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the sink for transport and framing diagnostics
    /// (default: [`TracingSink`]).
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Build an [`AcquisitionSession`] with a caller-provided transport.
    ///
    /// This is the entry point for tests (pass a `MockTransport` from
    /// `spectrolink-test-harness`) and for custom links. The transport is
    /// not opened until [`AcquisitionSession::start`].
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<AcquisitionSession> {
        if self.read_chunk_size == 0 {
            return Err(Error::InvalidParameter(
                "read_chunk_size must be non-zero".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidParameter(
                "poll_interval must be non-zero".into(),
            ));
        }
        if self.open_attempts == 0 {
            return Err(Error::InvalidParameter(
                "open_attempts must be at least 1".into(),
            ));
        }
        let sink = self.sink.ok_or_else(|| {
            Error::InvalidParameter("on_spectrum sink is required".into())
        })?;
        let diagnostics: Arc<dyn DiagnosticSink> = match self.diagnostics {
            Some(diagnostics) => diagnostics,
            None => Arc::new(TracingSink),
        };

        let pipeline = Arc::new(SpectrumPipeline::new(sink, Arc::clone(&diagnostics)));
        let config = SessionConfig {
            read_chunk_size: self.read_chunk_size,
            poll_interval: self.poll_interval,
            open_attempts: self.open_attempts,
            open_retry_delay: self.open_retry_delay,
        };

        Ok(AcquisitionSession::new(
            transport,
            pipeline,
            diagnostics,
            config,
        ))
    }

    /// Build an [`AcquisitionSession`] over a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub fn build(self) -> Result<AcquisitionSession> {
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = SerialTransport::with_config(port, self.serial_config.clone());
        self.build_with_transport(Box::new(transport))
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_frame;
    use crate::layout::TYPE_B;
    use crate::session::SessionState;
    use spectrolink_core::SpectrumRecord;
    use spectrolink_test_harness::{CollectingDiagnostics, MockTransport, RecordingSink};

    fn sink() -> Arc<RecordingSink> {
        Arc::new(RecordingSink::new())
    }

    #[tokio::test]
    async fn builder_defaults() {
        let builder = SessionBuilder::new();
        assert_eq!(builder.serial_config.baud_rate, 115_200);
        assert_eq!(builder.read_chunk_size, 4096);
        assert_eq!(builder.poll_interval, Duration::from_millis(100));
        assert_eq!(builder.open_attempts, 3);
        assert_eq!(builder.open_retry_delay, Duration::from_millis(100));

        let session = builder
            .on_spectrum(sink())
            .build_with_transport(Box::new(MockTransport::named("mock0")))
            .unwrap();
        assert_eq!(session.state().await, SessionState::Idle);
        assert_eq!(session.port(), "mock0");
    }

    #[tokio::test]
    async fn builder_fluent_chain() {
        let diags = Arc::new(CollectingDiagnostics::new());
        let builder = SessionBuilder::new()
            .serial_port("/dev/ttyUSB0")
            .baud_rate(921_600)
            .read_chunk_size(512)
            .poll_interval(Duration::from_millis(20))
            .open_attempts(5)
            .open_retry_delay(Duration::from_millis(5))
            .diagnostics(diags)
            .on_spectrum(sink());
        assert_eq!(builder.serial_config.baud_rate, 921_600);

        let session = builder
            .build_with_transport(Box::new(MockTransport::new()))
            .unwrap();
        assert_eq!(session.state().await, SessionState::Idle);
    }

    #[test]
    fn serial_config_replaces_baud_rate() {
        let config = SerialConfig {
            baud_rate: 57_600,
            ..SerialConfig::default()
        };
        let builder = SessionBuilder::new().baud_rate(9600).serial_config(config);
        assert_eq!(builder.serial_config.baud_rate, 57_600);
    }

    #[test]
    fn sink_is_required() {
        let result = SessionBuilder::new().build_with_transport(Box::new(MockTransport::new()));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn zero_values_are_rejected() {
        let cases = [
            SessionBuilder::new().read_chunk_size(0),
            SessionBuilder::new().poll_interval(Duration::ZERO),
            SessionBuilder::new().open_attempts(0),
        ];
        for builder in cases {
            let result = builder
                .on_spectrum(sink())
                .build_with_transport(Box::new(MockTransport::new()));
            assert!(matches!(result, Err(Error::InvalidParameter(_))));
        }
    }

    #[test]
    fn serial_port_required_for_build() {
        let result = SessionBuilder::new().on_spectrum(sink()).build();
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn build_does_not_open_the_port() {
        // Constructing a serial session must succeed even if the device
        // does not exist; the port is only opened by start().
        let session = SessionBuilder::new()
            .serial_port("/dev/does-not-exist")
            .on_spectrum(sink())
            .build()
            .unwrap();
        assert_eq!(session.port(), "/dev/does-not-exist");
    }

    #[tokio::test]
    async fn channel_sink_receives_records() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SpectrumRecord>();
        let mut mock = MockTransport::new();
        mock.push_chunk(&encode_frame(&TYPE_B, &[7; 512], 1, 2, 3).unwrap());

        let session = SessionBuilder::new()
            .poll_interval(Duration::from_millis(10))
            .on_spectrum(Arc::new(tx))
            .diagnostics(Arc::new(CollectingDiagnostics::new()))
            .build_with_transport(Box::new(mock))
            .unwrap();

        session.start().await.unwrap();
        let record = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        session.stop().await.unwrap();

        assert_eq!(record.samples, vec![7; 512]);
        assert_eq!((record.average, record.snr, record.quality), (1, 2, 3));
    }
}

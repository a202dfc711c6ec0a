//! # spectrolink -- Spectrum acquisition from UART spectrometers
//!
//! `spectrolink` reads the framed binary stream a spectrometer pushes over a
//! USB virtual COM port and turns it into decoded spectra. It is meant for
//! live displays and acquisition tools that need every good frame and
//! must shrug off line noise and torn frames.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use spectrolink::SpectrumRecord;
//! use spectrolink::uart::SessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SpectrumRecord>();
//!     let session = SessionBuilder::new()
//!         .serial_port("/dev/ttyUSB0")
//!         .on_spectrum(Arc::new(tx))
//!         .build()?;
//!
//!     session.start().await?;
//!     if let Some(record) = rx.recv().await {
//!         println!("{}: {} samples, SNR {}", record.kind, record.len(), record.snr);
//!     }
//!     session.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                       | Purpose                                            |
//! |-----------------------------|----------------------------------------------------|
//! | `spectrolink-core`          | [`Transport`], [`SpectrumRecord`], sinks, errors   |
//! | `spectrolink-transport`     | Serial transport                                   |
//! | `spectrolink-uart`          | Frame extraction, decoding, acquisition session    |
//! | **`spectrolink`**           | This facade crate -- re-exports everything         |
//!
//! ## Wire format
//!
//! Two fixed-length frame types share one layout: a 10-byte header, a
//! big-endian `u16` payload, three big-endian `u16` metrics (average, SNR,
//! quality) and a 10-byte trailer.
//!
//! | Frame  | Header                          | Samples | Total bytes |
//! |--------|---------------------------------|---------|-------------|
//! | Type A | `01 FF FF FF FF FF FF FF FF 1E` | 2048    | 4122        |
//! | Type B | `02 FF FF FF FF FF FF FF FF 1E` | 512     | 1050        |
//!
//! Bytes before a header are dropped as noise. A frame whose trailer does
//! not match is reported through the [`DiagnosticSink`] and skipped.
//!
//! ## Diagnostics
//!
//! Recoverable conditions (open failures, noise, corrupt frames) are
//! delivered as [`Diagnostic`] values to a [`DiagnosticSink`] injected at
//! build time. The default [`TracingSink`] logs them through `tracing`.

// Re-export everything from spectrolink-core at the crate root.
pub use spectrolink_core::*;

/// Serial transport.
pub mod transport {
    pub use spectrolink_transport::*;
}

/// Frame layouts, extraction, decoding and the acquisition session.
pub mod uart {
    pub use spectrolink_uart::*;
}

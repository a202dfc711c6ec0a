//! spectrolink-core: Core traits, types, and error definitions for spectrolink.
//!
//! This crate defines the transport-agnostic abstractions shared by the
//! acquisition pipeline, the concrete transports, and the test harness.
//! Display and calibration layers depend on these types without pulling in
//! the serial stack.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level link to a spectrometer
//! - [`SpectrumRecord`] -- one decoded spectrum with its quality metrics
//! - [`SpectrumSink`] -- where decoded spectra are published
//! - [`Diagnostic`] / [`DiagnosticSink`] -- recoverable pipeline conditions
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod spectrum;
pub mod transport;

// Re-export key types at crate root for ergonomic `use spectrolink_core::*`.
pub use error::{Error, Result};
pub use events::{Diagnostic, DiagnosticSink, TracingSink};
pub use spectrum::{FrameKind, SpectrumRecord, SpectrumSink};
pub use transport::Transport;

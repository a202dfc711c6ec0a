//! spectrolink-test-harness: Test utilities for spectrolink.
//!
//! This crate provides [`MockTransport`] for deterministic testing of the
//! acquisition session without a spectrometer attached, and capture sinks
//! ([`RecordingSink`], [`CollectingDiagnostics`]) that replace the UI and
//! the log in tests.

pub mod mock_serial;
pub mod sinks;

pub use mock_serial::{MockHandle, MockTransport};
pub use sinks::{CollectingDiagnostics, RecordingSink};

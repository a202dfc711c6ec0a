//! Diagnostics emitted by the acquisition pipeline.
//!
//! Nothing that goes wrong inside the frame pipeline is allowed to cross the
//! publish boundary as an error. Instead each condition becomes a
//! [`Diagnostic`] handed to the [`DiagnosticSink`] the session was built
//! with. [`TracingSink`] is the default and forwards everything to `tracing`;
//! tests inject a collecting sink and assert on what was reported.

use crate::spectrum::FrameKind;

/// A recoverable condition observed by the session or the frame pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Opening the transport failed. The session stays idle.
    TransportOpenFailed {
        /// Transport name (port path).
        port: String,
        /// 1-based attempt number.
        attempt: u32,
        /// Rendered error.
        reason: String,
    },

    /// A read from an open transport failed.
    TransportError {
        /// Transport name (port path).
        port: String,
        /// Rendered error.
        reason: String,
    },

    /// Bytes were dropped while resynchronising on a frame header.
    NoiseDiscarded {
        /// Number of bytes dropped.
        bytes: usize,
    },

    /// A frame with a valid header ended in the wrong trailer and was dropped.
    TrailerMismatch {
        /// Layout matched by the header.
        kind: FrameKind,
    },

    /// A validated frame could not be decoded.
    DecodeFailed {
        /// Layout matched by the header.
        kind: FrameKind,
        /// Rendered error.
        reason: String,
    },

    /// The spectrum sink panicked while handling a record. The record is
    /// lost; acquisition continues.
    SinkPanicked {
        /// Panic message, if it was a string.
        reason: String,
    },
}

/// Destination for [`Diagnostic`] values.
///
/// Implementations are called from the reader thread and must not block.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

/// Default [`DiagnosticSink`] that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::TransportOpenFailed {
                port,
                attempt,
                reason,
            } => {
                tracing::error!(port = %port, attempt, error = %reason, "Failed to open transport");
            }
            Diagnostic::TransportError { port, reason } => {
                tracing::error!(port = %port, error = %reason, "Transport read failed");
            }
            Diagnostic::NoiseDiscarded { bytes } => {
                tracing::trace!(bytes, "discarded bytes while resynchronising");
            }
            Diagnostic::TrailerMismatch { kind } => {
                tracing::warn!(kind = %kind, "invalid frame trailer, dropping frame");
            }
            Diagnostic::DecodeFailed { kind, reason } => {
                tracing::warn!(kind = %kind, error = %reason, "failed to decode frame");
            }
            Diagnostic::SinkPanicked { reason } => {
                tracing::error!(error = %reason, "spectrum sink panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_sink_accepts_every_variant() {
        let sink = TracingSink;
        sink.report(Diagnostic::TransportOpenFailed {
            port: "/dev/ttyUSB0".into(),
            attempt: 1,
            reason: "busy".into(),
        });
        sink.report(Diagnostic::TransportError {
            port: "/dev/ttyUSB0".into(),
            reason: "broken pipe".into(),
        });
        sink.report(Diagnostic::NoiseDiscarded { bytes: 3 });
        sink.report(Diagnostic::TrailerMismatch {
            kind: FrameKind::TypeA,
        });
        sink.report(Diagnostic::DecodeFailed {
            kind: FrameKind::TypeB,
            reason: "short".into(),
        });
        sink.report(Diagnostic::SinkPanicked {
            reason: "index out of bounds".into(),
        });
    }

    #[test]
    fn diagnostic_sink_is_object_safe() {
        let sink: Box<dyn DiagnosticSink> = Box::new(TracingSink);
        sink.report(Diagnostic::NoiseDiscarded { bytes: 1 });
    }
}

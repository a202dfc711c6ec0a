//! The synchronous extract -> validate -> decode -> publish pipeline.
//!
//! [`SpectrumPipeline`] owns the raw receive buffer. Feed it every inbound
//! chunk through [`on_bytes_received`](SpectrumPipeline::on_bytes_received),
//! from whatever thread the transport delivers on; it drains every complete
//! frame the chunk made available and publishes each decoded spectrum to the
//! sink before returning.
//!
//! Locking: the buffer mutex is held only while appending a chunk or while
//! the extractor trims/splits the buffer, never during validation, decoding
//! or publication. A `draining` flag kept under the same mutex makes sure
//! only one thread runs the drain loop at a time. A thread that appends
//! while another is draining returns immediately and leaves its bytes to the
//! active loop, so frames are published in the order their last byte
//! arrived and a slow sink never blocks the producer on the lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use parking_lot::Mutex;
use tracing::trace;

use spectrolink_core::events::{Diagnostic, DiagnosticSink};
use spectrolink_core::spectrum::SpectrumSink;

use crate::decode::decode_payload;
use crate::frame::{CandidateFrame, ExtractResult, try_extract_next, validate_trailer};

/// Not-yet-consumed transport bytes plus the drain ownership flag.
struct RawBuffer {
    bytes: BytesMut,
    draining: bool,
}

#[derive(Debug, Default)]
struct Counters {
    frames_published: AtomicU64,
    trailer_mismatches: AtomicU64,
    decode_failures: AtomicU64,
    bytes_discarded: AtomicU64,
}

/// Snapshot of pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Records handed to the spectrum sink.
    pub frames_published: u64,
    /// Header-matched frames dropped for a bad trailer.
    pub trailer_mismatches: u64,
    /// Validated frames that failed to decode.
    pub decode_failures: u64,
    /// Noise bytes dropped while resynchronising.
    pub bytes_discarded: u64,
}

/// Clears the `draining` flag if the drain loop unwinds (e.g. a panicking
/// sink), so later chunks can still be drained.
struct DrainGuard<'a> {
    raw: &'a Mutex<RawBuffer>,
    armed: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.raw.lock().draining = false;
        }
    }
}

/// Reassembles frames from a byte stream and publishes decoded spectra.
pub struct SpectrumPipeline {
    raw: Mutex<RawBuffer>,
    sink: Arc<dyn SpectrumSink>,
    diagnostics: Arc<dyn DiagnosticSink>,
    counters: Counters,
}

impl SpectrumPipeline {
    /// Create a pipeline publishing to `sink` and reporting to `diagnostics`.
    pub fn new(sink: Arc<dyn SpectrumSink>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        SpectrumPipeline {
            raw: Mutex::new(RawBuffer {
                bytes: BytesMut::new(),
                draining: false,
            }),
            sink,
            diagnostics,
            counters: Counters::default(),
        }
    }

    /// Append one inbound chunk and publish every frame it completes.
    ///
    /// Returns the number of records published by this call. Returns 0
    /// without draining if another thread is already draining; that thread
    /// will process the appended bytes before it stops.
    ///
    /// The sink must not feed bytes back into this pipeline synchronously
    /// and expect them to be published before it returns.
    pub fn on_bytes_received(&self, chunk: &[u8]) -> usize {
        {
            let mut raw = self.raw.lock();
            raw.bytes.extend_from_slice(chunk);
            trace!(
                bytes = chunk.len(),
                buffered = raw.bytes.len(),
                "appended chunk"
            );
            if raw.draining {
                return 0;
            }
            raw.draining = true;
        }

        let mut guard = DrainGuard {
            raw: &self.raw,
            armed: true,
        };
        let mut published = 0;

        loop {
            let result = {
                let mut raw = self.raw.lock();
                let result = try_extract_next(&mut raw.bytes);
                if matches!(result, ExtractResult::Incomplete { .. }) {
                    // Give up drain ownership under the same lock that the
                    // producers check, so no appended chunk is stranded.
                    raw.draining = false;
                    guard.armed = false;
                }
                result
            };

            self.note_discarded(result.discarded());

            match result {
                ExtractResult::Frame { frame, .. } => {
                    if self.process(frame) {
                        published += 1;
                    }
                }
                ExtractResult::Incomplete { .. } => break,
            }
        }

        published
    }

    /// Drop everything buffered so far.
    pub fn reset(&self) {
        self.raw.lock().bytes.clear();
    }

    /// Current counter values.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            frames_published: self.counters.frames_published.load(Ordering::Relaxed),
            trailer_mismatches: self.counters.trailer_mismatches.load(Ordering::Relaxed),
            decode_failures: self.counters.decode_failures.load(Ordering::Relaxed),
            bytes_discarded: self.counters.bytes_discarded.load(Ordering::Relaxed),
        }
    }

    #[cfg(test)]
    pub(crate) fn buffered_len(&self) -> usize {
        self.raw.lock().bytes.len()
    }

    #[cfg(test)]
    pub(crate) fn buffered_bytes(&self) -> Vec<u8> {
        self.raw.lock().bytes.to_vec()
    }

    fn note_discarded(&self, bytes: usize) {
        if bytes > 0 {
            self.counters
                .bytes_discarded
                .fetch_add(bytes as u64, Ordering::Relaxed);
            self.diagnostics.report(Diagnostic::NoiseDiscarded { bytes });
        }
    }

    /// Validate, decode and publish one candidate. Returns `true` if a
    /// record was published.
    fn process(&self, frame: CandidateFrame) -> bool {
        let layout = frame.layout;

        if !validate_trailer(&frame.bytes, layout) {
            self.counters
                .trailer_mismatches
                .fetch_add(1, Ordering::Relaxed);
            self.diagnostics
                .report(Diagnostic::TrailerMismatch { kind: layout.kind });
            return false;
        }

        match decode_payload(&frame.bytes, layout) {
            Ok(record) => {
                trace!(kind = %layout.kind, samples = record.len(), "publishing spectrum");
                self.counters
                    .frames_published
                    .fetch_add(1, Ordering::Relaxed);
                self.sink.on_spectrum(record);
                true
            }
            Err(e) => {
                self.counters.decode_failures.fetch_add(1, Ordering::Relaxed);
                self.diagnostics.report(Diagnostic::DecodeFailed {
                    kind: layout.kind,
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}

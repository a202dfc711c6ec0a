//! Decoded spectrum records and the publication seam.
//!
//! A [`SpectrumRecord`] is produced for every frame that survives extraction
//! and trailer validation. Ownership moves into the registered
//! [`SpectrumSink`]; the pipeline keeps no reference to it afterwards.

use std::fmt;

use tokio::sync::mpsc;

/// Which of the two device frame layouts a record was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// 2048-sample frame, header starts with `0x01`.
    TypeA,
    /// 512-sample frame, header starts with `0x02`.
    TypeB,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::TypeA => write!(f, "type-A"),
            FrameKind::TypeB => write!(f, "type-B"),
        }
    }
}

/// One decoded spectrum plus its three device-computed quality metrics.
///
/// `samples[0]` is the first byte-pair after the frame header. Values are
/// exactly what the device sent; promotion to floating point happens only
/// through [`intensities`](Self::intensities).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumRecord {
    /// Layout the record was decoded from.
    pub kind: FrameKind,
    /// Intensity samples in pixel order.
    pub samples: Vec<u16>,
    /// Average intensity reported by the device.
    pub average: u16,
    /// Signal-to-noise ratio reported by the device.
    pub snr: u16,
    /// Quality figure reported by the device.
    pub quality: u16,
}

impl SpectrumRecord {
    /// A zero-sample record, the shape of a failed decode.
    pub fn empty(kind: FrameKind) -> Self {
        SpectrumRecord {
            kind,
            samples: Vec::new(),
            average: 0,
            snr: 0,
            quality: 0,
        }
    }

    /// Number of samples in the spectrum.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the record carries no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Highest sample value, or `None` for an empty record.
    pub fn peak(&self) -> Option<u16> {
        self.samples.iter().copied().max()
    }

    /// Samples promoted to `f64` for plotting and calibration.
    pub fn intensities(&self) -> Vec<f64> {
        self.samples.iter().map(|&s| f64::from(s)).collect()
    }

    /// Invert the spectrum in place: every sample becomes `peak - sample`.
    ///
    /// Used by display layers that show absorption rather than emission.
    /// The scalar metrics are left untouched.
    pub fn invert_in_place(&mut self) {
        if let Some(peak) = self.peak() {
            for sample in &mut self.samples {
                *sample = peak - *sample;
            }
        }
    }
}

/// Receiver of decoded spectra.
///
/// Called synchronously on the thread that delivered the completing byte
/// chunk, so implementations must hand work off rather than block.
pub trait SpectrumSink: Send + Sync {
    /// Take ownership of one decoded spectrum.
    fn on_spectrum(&self, record: SpectrumRecord);
}

impl<F> SpectrumSink for F
where
    F: Fn(SpectrumRecord) + Send + Sync,
{
    fn on_spectrum(&self, record: SpectrumRecord) {
        self(record)
    }
}

impl SpectrumSink for mpsc::UnboundedSender<SpectrumRecord> {
    fn on_spectrum(&self, record: SpectrumRecord) {
        if self.send(record).is_err() {
            tracing::trace!("spectrum receiver dropped, discarding record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn record(samples: Vec<u16>) -> SpectrumRecord {
        SpectrumRecord {
            kind: FrameKind::TypeB,
            samples,
            average: 10,
            snr: 20,
            quality: 30,
        }
    }

    #[test]
    fn empty_record_has_no_samples() {
        let r = SpectrumRecord::empty(FrameKind::TypeA);
        assert!(r.is_empty());
        assert_eq!(r.len(), 0);
        assert_eq!(r.peak(), None);
    }

    #[test]
    fn intensities_are_exact() {
        let r = record(vec![0, 1, 65_535]);
        assert_eq!(r.intensities(), vec![0.0, 1.0, 65_535.0]);
    }

    #[test]
    fn invert_subtracts_from_peak() {
        let mut r = record(vec![5, 100, 40]);
        r.invert_in_place();
        assert_eq!(r.samples, vec![95, 0, 60]);
        // Metrics are not part of the inversion.
        assert_eq!((r.average, r.snr, r.quality), (10, 20, 30));
    }

    #[test]
    fn invert_empty_is_noop() {
        let mut r = SpectrumRecord::empty(FrameKind::TypeB);
        r.invert_in_place();
        assert!(r.is_empty());
    }

    #[test]
    fn frame_kind_display() {
        assert_eq!(FrameKind::TypeA.to_string(), "type-A");
        assert_eq!(FrameKind::TypeB.to_string(), "type-B");
    }

    #[test]
    fn closure_is_a_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink = move |r: SpectrumRecord| seen_clone.lock().unwrap().push(r.len());

        sink.on_spectrum(record(vec![1, 2, 3]));
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn unbounded_sender_is_a_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.on_spectrum(record(vec![7]));
        let got = rx.recv().await.unwrap();
        assert_eq!(got.samples, vec![7]);
    }

    #[test]
    fn sender_with_dropped_receiver_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel::<SpectrumRecord>();
        drop(rx);
        tx.on_spectrum(record(vec![7]));
    }
}

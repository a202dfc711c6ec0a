//! Capture sinks standing in for the UI and the log in tests.

use std::time::Duration;

use parking_lot::Mutex;

use spectrolink_core::events::{Diagnostic, DiagnosticSink};
use spectrolink_core::spectrum::{SpectrumRecord, SpectrumSink};

/// A [`SpectrumSink`] that keeps every published record.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<SpectrumRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far, in publication order.
    pub fn records(&self) -> Vec<SpectrumRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Wait until at least `n` records have arrived or `timeout` elapses.
    ///
    /// Returns `true` if the count was reached.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.len() >= n {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl SpectrumSink for RecordingSink {
    fn on_spectrum(&self, record: SpectrumRecord) {
        self.records.lock().push(record);
    }
}

/// A [`DiagnosticSink`] that keeps every reported diagnostic.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    reported: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reported(&self) -> Vec<Diagnostic> {
        self.reported.lock().clone()
    }

    /// Count diagnostics matching a predicate.
    pub fn count(&self, pred: impl Fn(&Diagnostic) -> bool) -> usize {
        self.reported.lock().iter().filter(|d| pred(d)).count()
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.reported.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectrolink_core::FrameKind;

    #[tokio::test]
    async fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        let mut a = SpectrumRecord::empty(FrameKind::TypeA);
        a.average = 1;
        let mut b = SpectrumRecord::empty(FrameKind::TypeB);
        b.average = 2;
        sink.on_spectrum(a);
        sink.on_spectrum(b);

        assert!(sink.wait_for(2, Duration::from_millis(10)).await);
        let got = sink.records();
        assert_eq!(got[0].average, 1);
        assert_eq!(got[1].average, 2);
    }

    #[tokio::test]
    async fn wait_for_times_out() {
        let sink = RecordingSink::new();
        assert!(!sink.wait_for(1, Duration::from_millis(20)).await);
        assert!(sink.is_empty());
    }

    #[test]
    fn collecting_diagnostics_counts() {
        let diags = CollectingDiagnostics::new();
        diags.report(Diagnostic::NoiseDiscarded { bytes: 4 });
        diags.report(Diagnostic::TrailerMismatch {
            kind: FrameKind::TypeA,
        });
        assert_eq!(diags.reported().len(), 2);
        assert_eq!(
            diags.count(|d| matches!(d, Diagnostic::TrailerMismatch { .. })),
            1
        );
    }
}

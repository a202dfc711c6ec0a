// Simulated spectrometer for `--mock` runs. Pushes synthetic frames into a
// MockTransport the way a real device dribbles them over USB serial: split
// into uneven chunks, with line noise between frames and the occasional
// corrupted trailer.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use spectrolink::uart::{MessageLayout, TYPE_A, TYPE_B, encode_frame};
use spectrolink_test_harness::MockHandle;

pub struct MockDeviceOptions {
    /// Pause between frames.
    pub interval: Duration,
    /// Corrupt every Nth frame's trailer (0 = never).
    pub corrupt_every: u64,
    /// Every Nth frame is Type B, the rest Type A (0 = Type A only).
    pub type_b_every: u64,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for MockDeviceOptions {
    fn default() -> Self {
        MockDeviceOptions {
            interval: Duration::from_millis(50),
            corrupt_every: 0,
            type_b_every: 4,
            seed: None,
        }
    }
}

/// Start the simulated device. The task returns the number of frames sent.
pub fn spawn(
    handle: MockHandle,
    opts: MockDeviceOptions,
    cancel: CancellationToken,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut sent: u64 = 0;

        loop {
            let n = sent + 1;
            let layout = if opts.type_b_every > 0 && n % opts.type_b_every == 0 {
                &TYPE_B
            } else {
                &TYPE_A
            };

            match synth_frame(layout, &mut rng) {
                Ok(mut frame) => {
                    if opts.corrupt_every > 0 && n % opts.corrupt_every == 0 {
                        if let Some(last) = frame.last_mut() {
                            *last ^= 0xFF;
                            debug!(frame = n, "corrupting trailer");
                        }
                    }
                    let mut bytes = line_noise(&mut rng);
                    bytes.extend_from_slice(&frame);
                    push_uneven(&handle, &bytes, &mut rng);
                    sent = n;
                }
                Err(e) => warn!(error = %e, kind = %layout.kind, "skipping simulated frame"),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(opts.interval) => {}
            }
        }

        sent
    })
}

/// Push `bytes` in chunks of 1 to 700 bytes, like a USB serial adapter.
fn push_uneven(handle: &MockHandle, bytes: &[u8], rng: &mut StdRng) {
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + rng.gen_range(1..=700)).min(bytes.len());
        handle.push(&bytes[offset..end]);
        offset = end;
    }
}

/// A few random bytes that can never form a header (no 0xFF).
fn line_noise(rng: &mut StdRng) -> Vec<u8> {
    let len = rng.gen_range(0..24);
    (0..len).map(|_| rng.gen_range(0x00..0xFF)).collect()
}

/// One emission line on a noisy baseline, with jittered metrics.
fn synth_frame(layout: &MessageLayout, rng: &mut StdRng) -> spectrolink::Result<Vec<u8>> {
    let count = layout.sample_count();
    let center = rng.gen_range(count / 4..count * 3 / 4) as f64;
    let width = count as f64 / 40.0;
    let height: f64 = rng.gen_range(20_000.0..60_000.0);

    let samples: Vec<u16> = (0..count)
        .map(|i| {
            let d = (i as f64 - center) / width;
            let line = height * (-d * d).exp();
            let baseline = 1_000.0 + rng.gen_range(0.0..200.0);
            (line + baseline).min(f64::from(u16::MAX)) as u16
        })
        .collect();

    let average = (samples.iter().map(|&s| u64::from(s)).sum::<u64>() / count as u64) as u16;
    let snr = rng.gen_range(200..900);
    let quality = rng.gen_range(80..100);

    encode_frame(layout, &samples, average, snr, quality)
}

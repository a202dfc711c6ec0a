//! Monitor spectra from a spectrometer.
//!
//! Opens an acquisition session, prints a one-line summary of every
//! spectrum as it arrives and reports pipeline counters at the end.
//!
//! # Requirements
//!
//! - A spectrometer connected over USB serial
//! - Serial port path adjusted for your system
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=spectrolink=debug cargo run -p spectrolink --example monitor_spectrum
//! ```

use std::sync::Arc;
use std::time::Duration;

use spectrolink::SpectrumRecord;
use spectrolink::uart::SessionBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let serial_port = "/dev/ttyUSB0";

    println!("Opening spectrometer on {}...", serial_port);

    // Decoded records are handed off over a channel so the reader task
    // never waits on the console.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SpectrumRecord>();

    let session = SessionBuilder::new()
        .serial_port(serial_port)
        .baud_rate(115_200)
        .on_spectrum(Arc::new(tx))
        .build()?;

    session.start().await?;
    println!("Acquiring for 30 seconds...\n");

    println!(
        "{:<12} {:<7} {:>7} {:>7} {:>7} {:>7} {:>7}",
        "Timestamp", "Type", "Samples", "Peak", "Avg", "SNR", "Quality"
    );
    println!("{:-<12} {:-<7} {:->7} {:->7} {:->7} {:->7} {:->7}", "", "", "", "", "", "", "");

    let start = tokio::time::Instant::now();
    let deadline = start + Duration::from_secs(30);

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(record)) => {
                let elapsed = start.elapsed();
                let timestamp = format!("{:>6}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis());
                println!(
                    "{:<12} {:<7} {:>7} {:>7} {:>7} {:>7} {:>7}",
                    timestamp,
                    record.kind,
                    record.len(),
                    record.peak().unwrap_or(0),
                    record.average,
                    record.snr,
                    record.quality
                );
            }
            Ok(None) => {
                println!("Spectrum channel closed.");
                break;
            }
            Err(_) => break,
        }
    }

    session.stop().await?;

    let stats = session.stats();
    println!("\nAcquisition complete.");
    println!("  Published:          {}", stats.frames_published);
    println!("  Trailer mismatches: {}", stats.trailer_mismatches);
    println!("  Decode failures:    {}", stats.decode_failures);
    println!("  Noise bytes:        {}", stats.bytes_discarded);
    Ok(())
}

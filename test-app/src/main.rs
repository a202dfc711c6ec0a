// spectrolink test application -- CLI tool for exercising the acquisition
// pipeline against a real spectrometer or a simulated one.
//
// Usage:
//   spectrolink-test-app layouts
//   spectrolink-test-app --port /dev/ttyUSB0 monitor --duration 30
//   spectrolink-test-app --port COM3 --baud 921600 monitor --frames 100
//   spectrolink-test-app --mock monitor --frames 20 --corrupt-every 5
//   spectrolink-test-app --mock --seed 7 monitor --invert
//
// Set RUST_LOG (e.g. RUST_LOG=spectrolink_uart=debug) for pipeline logs.

mod mock_device;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use spectrolink::SpectrumRecord;
use spectrolink::uart::{AcquisitionSession, LAYOUTS, SessionBuilder};
use spectrolink_test_harness::{MockHandle, MockTransport};

use crate::mock_device::MockDeviceOptions;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// spectrolink test application -- acquires spectra from the command line.
#[derive(Parser)]
#[command(name = "spectrolink-test-app", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate.
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Use a simulated spectrometer instead of a real serial port.
    #[arg(long)]
    mock: bool,

    /// Seed for the simulated spectrometer (mock only).
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the frame layouts the decoder recognises.
    Layouts,

    /// Print one line per received spectrum.
    Monitor {
        /// Stop after this many seconds.
        #[arg(long, default_value_t = 10)]
        duration: u64,

        /// Stop after this many spectra.
        #[arg(long)]
        frames: Option<u64>,

        /// Show absorption (peak minus sample) instead of emission.
        #[arg(long)]
        invert: bool,

        /// Corrupt every Nth simulated frame (mock only).
        #[arg(long, default_value_t = 0)]
        corrupt_every: u64,
    },
}

fn validate_options(cli: &Cli) -> Result<()> {
    if matches!(cli.command, Command::Layouts) {
        return Ok(());
    }
    if cli.mock && cli.port.is_some() {
        bail!("--port and --mock are mutually exclusive");
    }
    if !cli.mock && cli.port.is_none() {
        bail!("--port is required unless --mock is used");
    }
    if !cli.mock && cli.seed.is_some() {
        bail!("--seed only applies to --mock");
    }
    if let Command::Monitor {
        frames: Some(0), ..
    } = cli.command
    {
        bail!("--frames must be at least 1");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Session construction
// ---------------------------------------------------------------------------

/// Build a session for the CLI options. Returns the mock handle when the
/// session runs against the simulated device.
fn create_session(
    cli: &Cli,
    tx: mpsc::UnboundedSender<SpectrumRecord>,
) -> Result<(AcquisitionSession, Option<MockHandle>)> {
    let builder = SessionBuilder::new()
        .baud_rate(cli.baud)
        .on_spectrum(Arc::new(tx));

    if cli.mock {
        let mock = MockTransport::named("mock-spectrometer");
        let handle = mock.handle();
        let session = builder
            .poll_interval(Duration::from_millis(20))
            .build_with_transport(Box::new(mock))?;
        println!("Using simulated spectrometer");
        Ok((session, Some(handle)))
    } else {
        let port = cli
            .port
            .as_deref()
            .context("--port is required unless --mock is used")?;
        let session = builder.serial_port(port).build()?;
        println!("Using {port} at {} baud", cli.baud);
        Ok((session, None))
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_layouts() -> Result<()> {
    println!(
        "{:<8} {:<31} {:<31} {:>8} {:>6}",
        "Type", "Header", "Trailer", "Samples", "Bytes"
    );
    println!("{:-<8} {:-<31} {:-<31} {:->8} {:->6}", "", "", "", "", "");
    for layout in LAYOUTS {
        println!(
            "{:<8} {:<31} {:<31} {:>8} {:>6}",
            layout.kind.to_string(),
            hex(&layout.header),
            hex(&layout.trailer),
            layout.sample_count(),
            layout.total_len()
        );
    }
    Ok(())
}

async fn cmd_monitor(
    cli: &Cli,
    duration: u64,
    frames: Option<u64>,
    invert: bool,
    corrupt_every: u64,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<SpectrumRecord>();
    let (session, mock) = create_session(cli, tx)?;

    session
        .start()
        .await
        .with_context(|| format!("failed to open {}", session.port()))?;

    let cancel = CancellationToken::new();
    let device = mock.map(|handle| {
        let opts = MockDeviceOptions {
            corrupt_every,
            seed: cli.seed,
            ..MockDeviceOptions::default()
        };
        mock_device::spawn(handle, opts, cancel.clone())
    });

    println!("Monitoring for {duration} seconds (Ctrl-C to stop)...\n");
    println!(
        "{:<12} {:<7} {:>7} {:>7} {:>6} {:>7} {:>6} {:>7}",
        "Timestamp", "Type", "Samples", "Peak", "At", "Avg", "SNR", "Quality"
    );
    println!(
        "{:-<12} {:-<7} {:->7} {:->7} {:->6} {:->7} {:->6} {:->7}",
        "", "", "", "", "", "", "", ""
    );

    let start = tokio::time::Instant::now();
    let deadline = start + Duration::from_secs(duration);
    let mut received: u64 = 0;

    loop {
        if frames.is_some_and(|limit| received >= limit) {
            break;
        }

        let record = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nInterrupted.");
                break;
            }
            r = tokio::time::timeout_at(deadline, rx.recv()) => match r {
                Ok(Some(record)) => record,
                Ok(None) => {
                    println!("Spectrum channel closed.");
                    break;
                }
                Err(_) => break,
            },
        };

        received += 1;
        print_record(start.elapsed(), record, invert);
    }

    cancel.cancel();
    if let Some(device) = device {
        let sent = device.await.context("simulated device task failed")?;
        println!("\nSimulated device sent {sent} frames.");
    }
    session.stop().await?;

    let stats = session.stats();
    println!();
    println!("Summary");
    println!("  Received:           {received}");
    println!("  Published:          {}", stats.frames_published);
    println!("  Trailer mismatches: {}", stats.trailer_mismatches);
    println!("  Decode failures:    {}", stats.decode_failures);
    println!("  Noise bytes:        {}", stats.bytes_discarded);
    Ok(())
}

fn print_record(elapsed: Duration, mut record: SpectrumRecord, invert: bool) {
    if invert {
        record.invert_in_place();
    }
    let (at, peak) = record
        .samples
        .iter()
        .copied()
        .enumerate()
        .max_by_key(|&(_, s)| s)
        .unwrap_or((0, 0));
    println!(
        "{:>6}.{:03}s  {:<7} {:>7} {:>7} {:>6} {:>7} {:>6} {:>7}",
        elapsed.as_secs(),
        elapsed.subsec_millis(),
        record.kind.to_string(),
        record.len(),
        peak,
        at,
        record.average,
        record.snr,
        record.quality
    );
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    validate_options(&cli)?;

    match &cli.command {
        Command::Layouts => cmd_layouts(),
        Command::Monitor {
            duration,
            frames,
            invert,
            corrupt_every,
        } => cmd_monitor(&cli, *duration, *frames, *invert, *corrupt_every).await,
    }
}

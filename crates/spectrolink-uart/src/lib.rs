//! spectrolink-uart: framed spectrum acquisition over a UART link.
//!
//! The spectrometer streams two fixed-length binary frame types over a
//! serial line. This crate turns that byte stream back into
//! [`SpectrumRecord`](spectrolink_core::SpectrumRecord)s:
//!
//! - [`layout`] -- the registry of frame layouts (headers, trailers, sizes)
//! - [`frame`] -- resynchronising frame extraction and trailer validation
//! - [`decode`] -- big-endian payload decoding
//! - [`pipeline`] -- the thread-safe extract/validate/decode/publish loop
//! - [`session`] -- start/stop lifecycle around a [`Transport`](spectrolink_core::Transport)
//! - [`builder`] -- fluent construction of sessions
//!
//! # Example
//!
//! ```no_run
//! use spectrolink_uart::SessionBuilder;
//! use spectrolink_core::SpectrumRecord;
//! use std::sync::Arc;
//!
//! # async fn example() -> spectrolink_core::Result<()> {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<SpectrumRecord>();
//! let session = SessionBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .on_spectrum(Arc::new(tx))
//!     .build()?;
//!
//! session.start().await?;
//! while let Some(record) = rx.recv().await {
//!     println!("{}: peak {:?}", record.kind, record.peak());
//! }
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod decode;
pub mod frame;
pub mod layout;
pub mod pipeline;
pub mod session;

pub use builder::SessionBuilder;
pub use decode::decode_payload;
pub use frame::{CandidateFrame, ExtractResult, encode_frame, try_extract_next, validate_trailer};
pub use layout::{LAYOUTS, MessageLayout, TYPE_A, TYPE_B, layout_for, match_header};
pub use pipeline::{PipelineStats, SpectrumPipeline};
pub use session::{AcquisitionSession, SessionState};

//! Transport implementations for spectrolink.
//!
//! This crate provides concrete implementations of the
//! [`Transport`](spectrolink_core::Transport) trait from `spectrolink-core`:
//!
//! - [`SerialTransport`]: USB virtual COM ports and RS-232 links to the
//!   spectrometer
//!
//! # Example
//!
//! ```no_run
//! use spectrolink_transport::SerialTransport;
//! use spectrolink_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> spectrolink_core::Result<()> {
//! let mut transport = SerialTransport::new("/dev/ttyUSB0", 115_200);
//! transport.open().await?;
//!
//! let mut buf = [0u8; 4096];
//! let n = transport.receive(&mut buf, Duration::from_millis(100)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};

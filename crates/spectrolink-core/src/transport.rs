//! Transport trait for spectrometer communication.
//!
//! The [`Transport`] trait abstracts over the physical link to the device.
//! `spectrolink-transport` implements it for serial ports and
//! `spectrolink-test-harness` provides a scripted mock.
//!
//! The acquisition session owns a `Transport` and turns every successful
//! [`receive`](Transport::receive) into one inbound byte chunk for the frame
//! pipeline, so protocol code never touches the serial port directly.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a spectrometer.
///
/// The device only streams towards the host, so there is no send side.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the underlying link.
    ///
    /// Calling `open()` on an already-open transport is a no-op.
    async fn open(&mut self) -> Result<()>;

    /// Receive bytes into the provided buffer.
    ///
    /// Returns the number of bytes read. Will wait up to `timeout` for data
    /// to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout) if
    /// nothing arrives within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the link. Closing a closed transport is a no-op.
    ///
    /// After `close()`, `receive()` returns
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently open.
    fn is_connected(&self) -> bool;

    /// Human-readable name of the link (port path, "mock", ...).
    fn name(&self) -> &str;
}

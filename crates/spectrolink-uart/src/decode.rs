//! Payload decoding: frame bytes to [`SpectrumRecord`].

use bytes::Buf;
use spectrolink_core::{Error, Result, SpectrumRecord};

use crate::layout::{HEADER_LEN, MessageLayout};

/// Decode a validated frame into a spectrum record.
///
/// Reads `layout.sample_count()` big-endian `u16` samples starting right
/// after the header, then the average, SNR and quality fields. Values are
/// copied exactly; nothing is scaled or rounded.
///
/// Returns [`Error::Protocol`] if `frame` is not exactly
/// `layout.total_len()` bytes. The extractor never produces such a frame,
/// so hitting this indicates a bug upstream rather than line noise.
///
/// # Example
///
/// ```
/// use spectrolink_uart::decode::decode_payload;
/// use spectrolink_uart::frame::encode_frame;
/// use spectrolink_uart::layout::TYPE_B;
///
/// let samples: Vec<u16> = (0..512).collect();
/// let frame = encode_frame(&TYPE_B, &samples, 100, 200, 300).unwrap();
/// let record = decode_payload(&frame, &TYPE_B).unwrap();
/// assert_eq!(record.samples[511], 511);
/// assert_eq!(record.snr, 200);
/// ```
pub fn decode_payload(frame: &[u8], layout: &MessageLayout) -> Result<SpectrumRecord> {
    if frame.len() != layout.total_len() {
        return Err(Error::Protocol(format!(
            "{} frame is {} bytes, expected {}",
            layout.kind,
            frame.len(),
            layout.total_len()
        )));
    }

    let mut body = &frame[HEADER_LEN..layout.trailer_offset()];
    let samples: Vec<u16> = (0..layout.sample_count()).map(|_| body.get_u16()).collect();
    let average = body.get_u16();
    let snr = body.get_u16();
    let quality = body.get_u16();

    Ok(SpectrumRecord {
        kind: layout.kind,
        samples,
        average,
        snr,
        quality,
    })
}

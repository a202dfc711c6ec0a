//! Frame extraction, trailer validation, and frame encoding.
//!
//! The device streams frames back to back with no length prefix and no
//! checksum. A frame is recognised by its header, delimited by the fixed
//! length of its layout, and accepted only if it ends in the trailer that
//! layout expects.
//!
//! [`try_extract_next`] works directly on the raw receive buffer: it drops
//! noise in front of the first header, waits while a frame is still
//! arriving, and splits a complete candidate frame off the front. Callers
//! must keep calling it until it reports [`ExtractResult::Incomplete`],
//! since one chunk can complete several frames.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use spectrolink_core::{Error, Result};

use crate::layout::{HEADER_LEN, MessageLayout, TRAILER_LEN, match_header};

/// A header-matched, full-length frame that has not been validated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFrame {
    /// Layout selected by the header.
    pub layout: &'static MessageLayout,
    /// Exactly `layout.total_len()` bytes, header first.
    pub bytes: Bytes,
}

/// Outcome of one [`try_extract_next`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractResult {
    /// A complete candidate frame was removed from the buffer.
    Frame {
        frame: CandidateFrame,
        /// Noise bytes dropped in front of the header.
        discarded: usize,
    },

    /// No complete frame is available yet. More data is needed.
    Incomplete {
        /// Noise bytes dropped while looking for a header.
        discarded: usize,
    },
}

impl ExtractResult {
    /// Number of bytes dropped as noise by this call.
    pub fn discarded(&self) -> usize {
        match self {
            ExtractResult::Frame { discarded, .. } | ExtractResult::Incomplete { discarded } => {
                *discarded
            }
        }
    }
}

/// Find the earliest offset at which any registered header starts.
///
/// Each window is checked with [`match_header`], so the first layout in
/// [`LAYOUTS`](crate::layout::LAYOUTS) wins a tie.
pub fn find_header(buf: &[u8]) -> Option<(usize, &'static MessageLayout)> {
    buf.windows(HEADER_LEN)
        .enumerate()
        .find_map(|(pos, window)| match_header(window).map(|layout| (pos, layout)))
}

/// Pull the next complete candidate frame off the front of `buf`.
///
/// - No header anywhere: keep only the last `HEADER_LEN - 1` bytes (a header
///   may be arriving in pieces) and drop the rest.
/// - Header at offset `p > 0`: drop the `p` bytes in front of it at once,
///   even if the frame is not complete yet.
/// - Header at offset 0 but fewer than `total_len()` bytes buffered: leave
///   the buffer alone.
/// - Otherwise split exactly `total_len()` bytes off the front; anything
///   after them stays for the next call.
pub fn try_extract_next(buf: &mut BytesMut) -> ExtractResult {
    let (pos, layout) = match find_header(buf) {
        Some(found) => found,
        None => {
            let keep = buf.len().min(HEADER_LEN - 1);
            let discarded = buf.len() - keep;
            buf.advance(discarded);
            return ExtractResult::Incomplete { discarded };
        }
    };

    buf.advance(pos);

    let total = layout.total_len();
    if buf.len() < total {
        return ExtractResult::Incomplete { discarded: pos };
    }

    let bytes = buf.split_to(total).freeze();
    ExtractResult::Frame {
        frame: CandidateFrame { layout, bytes },
        discarded: pos,
    }
}

/// Check that `frame` ends in the trailer `layout` expects.
///
/// A header-matched frame with the wrong trailer lost or gained bytes in
/// transit. The payload carries no redundancy, so such frames are dropped.
pub fn validate_trailer(frame: &[u8], layout: &MessageLayout) -> bool {
    frame.len() >= TRAILER_LEN && frame.ends_with(&layout.trailer)
}

/// Encode a frame exactly as the device sends it.
///
/// Returns [`Error::InvalidParameter`] if `samples` does not have
/// `layout.sample_count()` entries.
///
/// # Example
///
/// ```
/// use spectrolink_uart::frame::encode_frame;
/// use spectrolink_uart::layout::TYPE_B;
///
/// let samples = vec![0u16; 512];
/// let bytes = encode_frame(&TYPE_B, &samples, 100, 200, 300).unwrap();
/// assert_eq!(bytes.len(), 1050);
/// assert_eq!(&bytes[..10], &TYPE_B.header);
/// ```
pub fn encode_frame(
    layout: &MessageLayout,
    samples: &[u16],
    average: u16,
    snr: u16,
    quality: u16,
) -> Result<Vec<u8>> {
    if samples.len() != layout.sample_count() {
        return Err(Error::InvalidParameter(format!(
            "{} frame needs {} samples, got {}",
            layout.kind,
            layout.sample_count(),
            samples.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(layout.total_len());
    buf.put_slice(&layout.header);
    for &sample in samples {
        buf.put_u16(sample);
    }
    buf.put_u16(average);
    buf.put_u16(snr);
    buf.put_u16(quality);
    buf.put_slice(&layout.trailer);
    Ok(buf.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{TYPE_A, TYPE_B};
    use spectrolink_core::FrameKind;

    fn frame_a(fill: u16) -> Vec<u8> {
        encode_frame(&TYPE_A, &vec![fill; 2048], 1, 2, 3).unwrap()
    }

    fn frame_b(fill: u16) -> Vec<u8> {
        encode_frame(&TYPE_B, &vec![fill; 512], 4, 5, 6).unwrap()
    }

    // ---------------------------------------------------------------
    // Encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_places_fields_big_endian() {
        let mut samples = vec![0u16; 512];
        samples[0] = 0x1234;
        let bytes = encode_frame(&TYPE_B, &samples, 0x0064, 0x00C8, 0x012C).unwrap();

        assert_eq!(bytes.len(), TYPE_B.total_len());
        assert_eq!(&bytes[..HEADER_LEN], &TYPE_B.header);
        assert_eq!(&bytes[10..12], &[0x12, 0x34]);
        assert_eq!(&bytes[1034..1036], &[0x00, 0x64]);
        assert_eq!(&bytes[1036..1038], &[0x00, 0xC8]);
        assert_eq!(&bytes[1038..1040], &[0x01, 0x2C]);
        assert_eq!(&bytes[1040..], &TYPE_B.trailer);
    }

    #[test]
    fn encode_rejects_wrong_sample_count() {
        let result = encode_frame(&TYPE_A, &[0u16; 512], 0, 0, 0);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    // ---------------------------------------------------------------
    // Header search
    // ---------------------------------------------------------------

    #[test]
    fn find_header_at_start() {
        let bytes = frame_b(0);
        let (pos, layout) = find_header(&bytes).unwrap();
        assert_eq!(pos, 0);
        assert_eq!(layout.kind, FrameKind::TypeB);
    }

    #[test]
    fn find_header_returns_earliest_of_either_type() {
        let mut bytes = vec![0x55, 0x66, 0x77];
        bytes.extend_from_slice(&TYPE_B.header);
        bytes.extend_from_slice(&TYPE_A.header);
        let (pos, layout) = find_header(&bytes).unwrap();
        assert_eq!(pos, 3);
        assert_eq!(layout.kind, FrameKind::TypeB);
    }

    #[test]
    fn find_header_agrees_with_match_header_at_every_offset() {
        let mut bytes = vec![0xFF, 0x1E, 0x01];
        bytes.extend_from_slice(&TYPE_A.header[..9]);
        bytes.extend_from_slice(&TYPE_B.header);
        let expected = (0..bytes.len())
            .find_map(|pos| match_header(&bytes[pos..]).map(|l| (pos, l.kind)));
        let found = find_header(&bytes).map(|(pos, l)| (pos, l.kind));
        assert_eq!(found, expected);
        assert_eq!(found, Some((12, FrameKind::TypeB)));
    }

    #[test]
    fn find_header_none_in_noise() {
        assert!(find_header(&[0xFF; 64]).is_none());
        assert!(find_header(&[]).is_none());
    }

    // ---------------------------------------------------------------
    // Extraction
    // ---------------------------------------------------------------

    #[test]
    fn extract_complete_frame() {
        let bytes = frame_a(7);
        let mut buf = BytesMut::from(&bytes[..]);
        match try_extract_next(&mut buf) {
            ExtractResult::Frame { frame, discarded } => {
                assert_eq!(frame.layout.kind, FrameKind::TypeA);
                assert_eq!(frame.bytes.len(), 4122);
                assert_eq!(&frame.bytes[..], &bytes[..]);
                assert_eq!(discarded, 0);
            }
            other => panic!("expected Frame, got {other:?}"),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn extract_empty_buffer() {
        let mut buf = BytesMut::new();
        assert_eq!(
            try_extract_next(&mut buf),
            ExtractResult::Incomplete { discarded: 0 }
        );
    }

    #[test]
    fn extract_no_header_keeps_possible_header_prefix() {
        let mut buf = BytesMut::from(&[0x10, 0x20, 0x30, 0x40][..]);
        buf.extend_from_slice(&TYPE_A.header[..6]);
        let before = buf.len();

        let result = try_extract_next(&mut buf);
        assert_eq!(result.discarded(), before - (HEADER_LEN - 1));
        assert_eq!(buf.len(), HEADER_LEN - 1);
        assert!(buf.ends_with(&TYPE_A.header[..6]));

        // The rest of the header arrives and completes it.
        buf.extend_from_slice(&TYPE_A.header[6..]);
        assert_eq!(find_header(&buf).map(|(pos, _)| pos), Some(3));
    }

    #[test]
    fn extract_short_noise_is_retained() {
        let mut buf = BytesMut::from(&[0x01, 0xFF, 0xFF][..]);
        assert_eq!(
            try_extract_next(&mut buf),
            ExtractResult::Incomplete { discarded: 0 }
        );
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn extract_drops_noise_before_header_immediately() {
        let bytes = frame_b(1);
        let mut buf = BytesMut::from(&[0xAA, 0xBB, 0xCC][..]);
        buf.extend_from_slice(&bytes[..100]);

        let result = try_extract_next(&mut buf);
        assert_eq!(result, ExtractResult::Incomplete { discarded: 3 });
        // Noise gone even though the frame is not complete yet.
        assert_eq!(&buf[..], &bytes[..100]);
    }

    #[test]
    fn extract_partial_frame_waits() {
        let bytes = frame_a(0);
        let mut buf = BytesMut::from(&bytes[..4000]);
        assert_eq!(
            try_extract_next(&mut buf),
            ExtractResult::Incomplete { discarded: 0 }
        );
        assert_eq!(buf.len(), 4000);
    }

    #[test]
    fn extract_leaves_leftover_for_next_call() {
        let first = frame_b(1);
        let second = frame_a(2);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&first);
        buf.extend_from_slice(&second[..20]);

        match try_extract_next(&mut buf) {
            ExtractResult::Frame { frame, .. } => {
                assert_eq!(frame.layout.kind, FrameKind::TypeB);
            }
            other => panic!("expected Frame, got {other:?}"),
        }
        assert_eq!(&buf[..], &second[..20]);
        assert!(matches!(
            try_extract_next(&mut buf),
            ExtractResult::Incomplete { discarded: 0 }
        ));
    }

    #[test]
    fn extract_two_frames_back_to_back() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&frame_a(1));
        buf.extend_from_slice(&frame_b(2));

        let kinds: Vec<FrameKind> = std::iter::from_fn(|| match try_extract_next(&mut buf) {
            ExtractResult::Frame { frame, .. } => Some(frame.layout.kind),
            ExtractResult::Incomplete { .. } => None,
        })
        .collect();

        assert_eq!(kinds, vec![FrameKind::TypeA, FrameKind::TypeB]);
        assert!(buf.is_empty());
    }

    // ---------------------------------------------------------------
    // Trailer validation
    // ---------------------------------------------------------------

    #[test]
    fn validate_good_trailer() {
        assert!(validate_trailer(&frame_a(0), &TYPE_A));
        assert!(validate_trailer(&frame_b(0), &TYPE_B));
    }

    #[test]
    fn validate_mutated_trailer_byte() {
        let mut bytes = frame_a(0);
        let last = bytes.len() - 1;
        bytes[last] = 0x02;
        assert!(!validate_trailer(&bytes, &TYPE_A));
    }

    #[test]
    fn validate_against_other_layout_fails() {
        assert!(!validate_trailer(&frame_b(0), &TYPE_A));
    }

    #[test]
    fn validate_too_short() {
        assert!(!validate_trailer(&[0x1E, 0xFF], &TYPE_A));
    }
}

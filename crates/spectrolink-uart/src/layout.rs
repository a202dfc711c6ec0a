//! Static descriptions of the device's two frame layouts.
//!
//! # Frame format
//!
//! ```text
//! <header:10> <payload:N> <average:2> <snr:2> <quality:2> <trailer:10>
//! ```
//!
//! | Field   | Type A                          | Type B                          |
//! |---------|---------------------------------|---------------------------------|
//! | Header  | `01 FF FF FF FF FF FF FF FF 1E` | `02 FF FF FF FF FF FF FF FF 1E` |
//! | Payload | 4096 bytes, 2048 x BE u16       | 1024 bytes, 512 x BE u16        |
//! | Trailer | `1E FF FF FF FF FF FF FF FF 01` | `1E FF FF FF FF FF FF FF FF 02` |
//! | Total   | 4122 bytes                      | 1050 bytes                      |
//!
//! All multi-byte fields are big-endian.

use spectrolink_core::FrameKind;

/// Length of every frame header.
pub const HEADER_LEN: usize = 10;

/// Length of every frame trailer.
pub const TRAILER_LEN: usize = 10;

/// Average, SNR and quality: three big-endian `u16` fields after the payload.
pub const METRICS_LEN: usize = 6;

/// Fixed layout of one frame type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLayout {
    /// Frame type this layout describes.
    pub kind: FrameKind,
    /// Exact bytes the frame starts with.
    pub header: [u8; HEADER_LEN],
    /// Exact bytes the frame ends with.
    pub trailer: [u8; TRAILER_LEN],
    /// Byte length of the sample payload.
    pub payload_len: usize,
}

impl MessageLayout {
    /// Total frame length: header + payload + metrics + trailer.
    pub const fn total_len(&self) -> usize {
        HEADER_LEN + self.payload_len + METRICS_LEN + TRAILER_LEN
    }

    /// Number of `u16` samples in the payload.
    pub const fn sample_count(&self) -> usize {
        self.payload_len / 2
    }

    /// Offset of the average field.
    pub const fn average_offset(&self) -> usize {
        HEADER_LEN + self.payload_len
    }

    /// Offset of the SNR field.
    pub const fn snr_offset(&self) -> usize {
        self.average_offset() + 2
    }

    /// Offset of the quality field.
    pub const fn quality_offset(&self) -> usize {
        self.snr_offset() + 2
    }

    /// Offset of the first trailer byte.
    pub const fn trailer_offset(&self) -> usize {
        self.average_offset() + METRICS_LEN
    }
}

/// Type A: 2048-sample spectrum.
pub const TYPE_A: MessageLayout = MessageLayout {
    kind: FrameKind::TypeA,
    header: [0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x1E],
    trailer: [0x1E, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01],
    payload_len: 4096,
};

/// Type B: 512-sample spectrum.
pub const TYPE_B: MessageLayout = MessageLayout {
    kind: FrameKind::TypeB,
    header: [0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x1E],
    trailer: [0x1E, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02],
    payload_len: 1024,
};

/// Registered layouts in match-priority order.
pub static LAYOUTS: [&MessageLayout; 2] = [&TYPE_A, &TYPE_B];

/// Look up the layout for a frame kind.
pub fn layout_for(kind: FrameKind) -> &'static MessageLayout {
    match kind {
        FrameKind::TypeA => &TYPE_A,
        FrameKind::TypeB => &TYPE_B,
    }
}

/// Return the first registered layout whose header `bytes` starts with.
pub fn match_header(bytes: &[u8]) -> Option<&'static MessageLayout> {
    LAYOUTS
        .iter()
        .copied()
        .find(|layout| bytes.starts_with(&layout.header))
}

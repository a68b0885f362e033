//! H.264 bitstream assembly
//!
//! VA clients hand slice data over without guaranteeing Annex B framing,
//! while VDPAU expects every slice to start with a start code. Slices are
//! collected as `Bytes` chunks so the payload is never copied twice.

use bytes::Bytes;

/// Annex B start code (3-byte version), prepended when a slice lacks one
const ANNEX_B_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// Check if data already begins with a 3- or 4-byte Annex B start code
pub fn has_start_code(data: &[u8]) -> bool {
    data.starts_with(&[0x00, 0x00, 0x01]) || data.starts_with(&[0x00, 0x00, 0x00, 0x01])
}

/// Ordered bitstream chunks of the picture being decoded.
#[derive(Debug, Clone, Default)]
pub struct Bitstream {
    chunks: Vec<Bytes>,
}

impl Bitstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one slice, adding a start code chunk first if it has none
    pub fn push_slice(&mut self, slice: Bytes) {
        if !has_start_code(&slice) {
            self.chunks.push(Bytes::from_static(&ANNEX_B_START_CODE));
        }
        self.chunks.push(slice);
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total payload size across all chunks
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }
}

use bytes::Bytes;

/// A peer's advertised piece set.
///
/// Bits are numbered from the high bit of the first byte. The bytes are kept
/// exactly as the peer sent them; spare trailing bits are not cleared and the
/// length is not checked against the torrent's piece count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitfield {
    bits: Vec<u8>,
}

impl Bitfield {
    /// Creates an empty bitfield with room for `piece_count` pieces.
    pub fn new(piece_count: usize) -> Self {
        Self {
            bits: vec![0; piece_count.div_ceil(8)],
        }
    }

    /// Wraps a received bitfield payload verbatim.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self {
            bits: bytes.to_vec(),
        }
    }

    /// Returns true if the bit for `index` is set. Indices past the end of
    /// the bitfield are reported as absent.
    pub fn has_piece(&self, index: usize) -> bool {
        match self.bits.get(index / 8) {
            Some(byte) => (byte >> (7 - (index % 8))) & 1 == 1,
            None => false,
        }
    }

    /// Sets the bit for `index`, growing the bitfield if needed.
    pub fn set_piece(&mut self, index: usize) {
        let byte_index = index / 8;
        if byte_index >= self.bits.len() {
            self.bits.resize(byte_index + 1, 0);
        }
        self.bits[byte_index] |= 1 << (7 - (index % 8));
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// Number of pieces the bitfield can describe.
    pub fn capacity(&self) -> usize {
        self.bits.len() * 8
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}

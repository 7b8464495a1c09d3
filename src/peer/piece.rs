/// A request for one block of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRequest {
    pub piece: u32,
    pub offset: u32,
    pub length: u32,
}

impl BlockRequest {
    pub fn new(piece: u32, offset: u32, length: u32) -> Self {
        Self {
            piece,
            offset,
            length,
        }
    }
}

/// Splits a piece into consecutive block requests of `block_size` bytes;
/// the last one carries the remainder.
pub fn plan_blocks(piece: u32, piece_length: u64, block_size: u32) -> Vec<BlockRequest> {
    (0..compute_block_count(piece_length, block_size))
        .map(|i| {
            BlockRequest::new(
                piece,
                i * block_size,
                compute_block_length(piece_length, i, block_size),
            )
        })
        .collect()
}

pub fn compute_block_count(piece_length: u64, block_size: u32) -> u32 {
    piece_length.div_ceil(block_size as u64) as u32
}

pub fn compute_block_length(piece_length: u64, block_index: u32, block_size: u32) -> u32 {
    let offset = block_index as u64 * block_size as u64;
    let remaining = piece_length.saturating_sub(offset);
    remaining.min(block_size as u64) as u32
}

use core::ops::Add;

/// Size (in bytes) of an AES, GHASH or Poly1305 block.
pub const BLOCK_LEN: usize = 16;
/// Size (in bytes) of one ChaCha20 keystream block.
pub const CHACHA_BLOCK_LEN: usize = CHACHA_SIZE * size_of::<u32>();
pub const CHACHA_COLUMNS: usize = 4;
pub const CHACHA_ROWS: usize = 4;
/// Size (in 32-bit integers) of a ChaCha matrix.
pub const CHACHA_SIZE: usize = CHACHA_ROWS * CHACHA_COLUMNS;
/// ChaCha20 performs 20 rounds, applied as 10 column/diagonal pairs.
pub const DOUBLE_ROUNDS: usize = 10;
/// Index of the 32-bit block counter inside the ChaCha state.
pub const COUNTER_WORD: usize = 12;
/// Standard constant used in all ChaCha implementations, "expand 32-byte k" read as
/// little-endian words.
pub const ROW_A: [u32; CHACHA_COLUMNS] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

pub type Block = [u8; BLOCK_LEN];

#[inline(always)]
pub fn xor_block(dst: &mut Block, src: &Block) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Xors `src` into `dst`, stopping at the shorter of the two.
#[inline(always)]
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Copies a slice that the caller already checked to be exactly one block long.
#[inline(always)]
pub fn to_block(bytes: &[u8]) -> Block {
    let mut block = [0; BLOCK_LEN];
    block.copy_from_slice(bytes);
    block
}

/// Copies a short tail into a zero-padded block.
#[inline(always)]
pub fn pad_block(tail: &[u8]) -> Block {
    debug_assert!(tail.len() <= BLOCK_LEN);
    let mut block = [0; BLOCK_LEN];
    block[..tail.len()].copy_from_slice(tail);
    block
}

/// Defines the interface that concrete implementations need to
/// implement to process `DEPTH` ChaCha20 blocks at once.
pub trait Machine
where
    Self: Add<Output = Self> + Clone,
{
    /// The amount of distinct ChaCha blocks processed in parallel.
    const DEPTH: usize;

    /// Loads `DEPTH` copies of `state`, the i-th copy with its block counter advanced by i.
    fn new(state: &[u32; CHACHA_SIZE]) -> Self;

    /// Advances every block counter by `DEPTH`.
    fn increment(&mut self);

    fn double_round(&mut self);

    /// Serialises the blocks into `buf`, which is exactly `DEPTH * CHACHA_BLOCK_LEN` long.
    fn fetch_result(self, buf: &mut [u8]);

    #[inline(always)]
    fn chacha(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len(), Self::DEPTH * CHACHA_BLOCK_LEN);
        let mut cur = self.clone();
        for _ in 0..DOUBLE_ROUNDS {
            cur.double_round();
        }
        let result = cur + self.clone();
        self.increment();
        result.fetch_result(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_a_spells_the_sigma_constant() {
        let mut bytes = [0u8; 16];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(ROW_A) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        assert_eq!(&bytes, b"expand 32-byte k");
    }

    #[test]
    fn xor_stops_at_shorter_operand() {
        let mut dst = [0xffu8; 4];
        xor_in_place(&mut dst, &[0x0f, 0xf0]);
        assert_eq!(dst, [0xf0, 0x0f, 0xff, 0xff]);
        assert_eq!(pad_block(&[1, 2])[..3], [1, 2, 0]);
    }
}

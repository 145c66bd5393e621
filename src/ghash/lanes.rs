use super::field::{FieldElement, Product};
use crate::util::{BLOCK_LEN, to_block};

/// Adds the blocks of `bytes` into `acc` without reducing, block `i` of `bytes` being block
/// `offset + i` of a superblock of `superblock` blocks. Only block 0 picks up `state`.
///
/// `powers[i]` must hold `H^(i + 1)` for every `i < superblock`.
#[inline(always)]
pub(crate) fn accumulate(
    acc: &mut Product,
    state: FieldElement,
    powers: &[FieldElement],
    superblock: usize,
    offset: usize,
    bytes: &[u8],
) {
    debug_assert!(superblock <= powers.len());
    for (i, block) in bytes.chunks_exact(BLOCK_LEN).enumerate() {
        let index = offset + i;
        let mut x = FieldElement::from_bytes(&to_block(block));
        if index == 0 {
            x ^= state;
        }
        *acc ^= Product::of(x, powers[superblock - 1 - index]);
    }
}

/// Folds `M` blocks into the running state with a single reduction:
///
/// ```text
/// state' = (state ^ b0) H^M ^ b1 H^(M-1) ^ .. ^ b(M-1) H
/// ```
pub(crate) struct Superblock<const M: usize>;

impl<const M: usize> Superblock<M> {
    pub(crate) const LEN: usize = M * BLOCK_LEN;

    /// Folds every whole superblock of `blocks` and returns the bytes consumed.
    pub(crate) fn fold(state: &mut FieldElement, powers: &[FieldElement], blocks: &[u8]) -> usize {
        if powers.len() < M {
            return 0;
        }
        let mut consumed = 0;
        for chunk in blocks.chunks_exact(Self::LEN) {
            let mut acc = Product::default();
            accumulate(&mut acc, *state, powers, M, 0, chunk);
            *state = acc.reduce();
            consumed += Self::LEN;
        }
        consumed
    }
}

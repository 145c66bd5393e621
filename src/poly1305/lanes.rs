use super::limbs::{self, Limbs, Multiplier};
use super::powers::MAX_POWER;
use crate::util::{BLOCK_LEN, Block, to_block};
use zeroize::Zeroize;

/// One way of absorbing a run of full blocks into an accumulator.
pub(crate) trait Absorb {
    /// Blocks consumed per pass.
    const LANES: usize;

    /// Absorbs as many whole passes of `blocks` as fit and returns the number of bytes
    /// consumed. `blocks` holds full blocks only.
    fn absorb(h: &mut Limbs, powers: &[Multiplier; MAX_POWER], blocks: &[u8]) -> usize;
}

/// Plain Horner evaluation, one block at a time.
pub(crate) struct Scalar;

impl Absorb for Scalar {
    const LANES: usize = 1;

    #[inline]
    fn absorb(h: &mut Limbs, powers: &[Multiplier; MAX_POWER], blocks: &[u8]) -> usize {
        let r = &powers[0];
        let mut consumed = 0;
        for block in blocks.chunks_exact(BLOCK_LEN) {
            *h = limbs::mul_reduce(limbs::add(*h, limbs::load_block(&to_block(block), true)), r);
            consumed += BLOCK_LEN;
        }
        consumed
    }
}

/// `N` independent Horner chains stepping by `r^N`, block `i` going to lane `i % N`.
///
/// For a run of `m = k * N` blocks starting from accumulator `h`:
///
/// ```text
/// lane j = sum over passes p of block[p*N + j] * r^(N*(k-1-p))   (h added to block 0)
/// h'     = sum over j of lane j * r^(N-j)
/// ```
///
/// which is exactly `(..((h + b0) r + b1) r + .. + b(m-1)) r`.
pub(crate) struct Lanes<const N: usize>;

impl<const N: usize> Lanes<N> {
    #[inline(always)]
    fn load(blocks: &[u8], lanes: &mut [Limbs; N]) {
        for (lane, block) in lanes.iter_mut().zip(blocks.chunks_exact(BLOCK_LEN)) {
            let block: Block = to_block(block);
            *lane = limbs::load_block(&block, true);
        }
    }
}

impl<const N: usize> Absorb for Lanes<N> {
    const LANES: usize = N;

    fn absorb(h: &mut Limbs, powers: &[Multiplier; MAX_POWER], blocks: &[u8]) -> usize {
        debug_assert!(N.is_power_of_two() && N <= MAX_POWER);
        let pass = N * BLOCK_LEN;
        let passes = blocks.len() / pass;
        if passes == 0 {
            return 0;
        }

        let mut lanes = [[0u64; 3]; N];
        let mut next = [[0u64; 3]; N];
        Self::load(&blocks[..pass], &mut lanes);
        lanes[0] = limbs::add(lanes[0], *h);

        let step = &powers[N - 1];
        for chunk in blocks[pass..passes * pass].chunks_exact(pass) {
            Self::load(chunk, &mut next);
            for (lane, block) in lanes.iter_mut().zip(next.iter()) {
                *lane = limbs::add(limbs::mul_reduce(*lane, step), *block);
            }
        }

        for (j, lane) in lanes.iter_mut().enumerate() {
            *lane = limbs::mul_reduce(*lane, &powers[N - 1 - j]);
        }
        // Fixed pairwise order: (0+1), (2+3), .. then the same on the halves.
        let mut width = N;
        while width > 1 {
            width /= 2;
            for k in 0..width {
                lanes[k] = limbs::add(lanes[2 * k], lanes[2 * k + 1]);
            }
        }
        *h = limbs::carry(lanes[0]);

        lanes.zeroize();
        next.zeroize();
        passes * pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly1305::limbs::Accumulator;
    use crate::poly1305::powers::PowerTable;
    use std::vec;

    /// Canonical value of the accumulator after absorbing `blocks`.
    fn run<A: Absorb>(powers: &[Multiplier; MAX_POWER], start: Limbs, blocks: &[u8]) -> Block {
        let mut h = start;
        let consumed = A::absorb(&mut h, powers, blocks);
        Scalar::absorb(&mut h, powers, &blocks[consumed..]);
        let mut acc = Accumulator::new();
        acc.set_limbs(h);
        acc.finish(&[0; BLOCK_LEN])
    }

    #[test]
    fn lanes_match_scalar_horner() {
        let mut key = [0u8; 16];
        getrandom::fill(&mut key).unwrap();
        let r = Multiplier::clamp(&key);
        let mut table = PowerTable::default();
        let powers = *table.generate(&r);

        for count in [0, 1, 7, 8, 9, 15, 16, 17, 33, 64, 100] {
            let mut blocks = vec![0u8; count * BLOCK_LEN];
            getrandom::fill(&mut blocks).unwrap();
            let start = [123, 456, 789];
            let expected = run::<Scalar>(&powers, start, &blocks);
            assert_eq!(run::<Lanes<8>>(&powers, start, &blocks), expected, "{count} blocks");
            assert_eq!(run::<Lanes<16>>(&powers, start, &blocks), expected, "{count} blocks");
        }
    }

    #[test]
    fn lanes_leave_partial_passes_alone() {
        let powers = *PowerTable::default().generate(&Multiplier::clamp(&[1; 16]));
        let mut h = [0; 3];
        assert_eq!(Lanes::<8>::absorb(&mut h, &powers, &[0; 7 * BLOCK_LEN]), 0);
        assert_eq!(Lanes::<8>::absorb(&mut h, &powers, &[0; 17 * BLOCK_LEN]), 16 * BLOCK_LEN);
    }
}

//! Arithmetic modulo 2^130 - 5 on three limbs of 44, 44 and 42 bits.
//!
//! Limb `i` sits at bit `44 * i`. A product term landing at 2^132 or above wraps to
//! 2^132 = 4 * 2^130 = 4 * 5 (mod p), which is why the upper multiplier limbs are kept
//! pre-scaled by 20.

use crate::util::Block;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub(crate) const MASK44: u64 = (1 << 44) - 1;
pub(crate) const MASK42: u64 = (1 << 42) - 1;
/// The implicit 2^128 bit of a full block, as seen from the top limb.
const HIBIT: u64 = 1 << 40;

pub(crate) type Limbs = [u64; 3];

/// `r` (or a power of it) together with `20 * r1` and `20 * r2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Zeroize)]
pub struct Multiplier {
    r: Limbs,
    s: [u64; 2],
}

impl Multiplier {
    pub(crate) fn new(r: Limbs) -> Self {
        Self {
            r,
            s: [r[1] * 20, r[2] * 20],
        }
    }

    /// Clamps the first half of a Poly1305 key as RFC 8439 requires.
    pub fn clamp(bytes: &Block) -> Self {
        let (t0, t1) = split(bytes);
        Self::new([
            t0 & 0xffc_0fff_ffff,
            ((t0 >> 44) | (t1 << 20)) & 0xfff_ffc0_ffff,
            (t1 >> 24) & 0x00f_ffff_fc0f,
        ])
    }

    pub fn limbs(&self) -> Limbs {
        self.r
    }

    /// `self * other mod p`, carried but not fully reduced.
    pub fn mul(&self, other: &Multiplier) -> Multiplier {
        Multiplier::new(mul_reduce(other.r, self))
    }
}

#[inline(always)]
fn split(bytes: &Block) -> (u64, u64) {
    let mut lo = [0; 8];
    let mut hi = [0; 8];
    lo.copy_from_slice(&bytes[..8]);
    hi.copy_from_slice(&bytes[8..]);
    (u64::from_le_bytes(lo), u64::from_le_bytes(hi))
}

/// Splits a 16-byte little-endian block into limbs, setting the 2^128 bit if `is_full`.
#[inline(always)]
pub(crate) fn load_block(block: &Block, is_full: bool) -> Limbs {
    let (t0, t1) = split(block);
    let hibit = if is_full { HIBIT } else { 0 };
    [
        t0 & MASK44,
        ((t0 >> 44) | (t1 << 20)) & MASK44,
        (t1 >> 24) | hibit,
    ]
}

#[inline(always)]
pub(crate) fn add(h: Limbs, m: Limbs) -> Limbs {
    [h[0] + m[0], h[1] + m[1], h[2] + m[2]]
}

/// `h * m mod p` followed by one carry pass.
#[inline(always)]
pub(crate) fn mul_reduce(h: Limbs, m: &Multiplier) -> Limbs {
    let [h0, h1, h2] = h.map(u128::from);
    let [r0, r1, r2] = m.r.map(u128::from);
    let [s1, s2] = m.s.map(u128::from);

    let d0 = h0 * r0 + h1 * s2 + h2 * s1;
    let d1 = h0 * r1 + h1 * r0 + h2 * s2;
    let d2 = h0 * r2 + h1 * r1 + h2 * r0;
    carry_wide([d0, d1, d2])
}

/// Carries a three-term product back into limb range. Limb 0 and 1 may end up a few bits
/// over 44, which every consumer tolerates.
#[inline(always)]
fn carry_wide(d: [u128; 3]) -> Limbs {
    let [d0, mut d1, mut d2] = d;
    let c = d0 >> 44;
    let mut h0 = (d0 as u64) & MASK44;
    d1 += c;
    let c = d1 >> 44;
    let mut h1 = (d1 as u64) & MASK44;
    d2 += c;
    let c = (d2 >> 42) as u64;
    let h2 = (d2 as u64) & MASK42;
    h0 += c * 5;
    let c = h0 >> 44;
    h0 &= MASK44;
    h1 += c;
    [h0, h1, h2]
}

/// Same carry chain on limbs that only grew by additions.
#[inline(always)]
pub(crate) fn carry(h: Limbs) -> Limbs {
    let [mut h0, mut h1, mut h2] = h;
    let c = h0 >> 44;
    h0 &= MASK44;
    h1 += c;
    let c = h1 >> 44;
    h1 &= MASK44;
    h2 += c;
    let c = h2 >> 42;
    h2 &= MASK42;
    h0 += c * 5;
    let c = h0 >> 44;
    h0 &= MASK44;
    h1 += c;
    [h0, h1, h2]
}

/// Running Poly1305 state. Congruent to the true accumulator modulo 2^130 - 5 at every step,
/// canonical only inside [`Accumulator::finish`].
#[derive(Debug, Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct Accumulator {
    h: Limbs,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `h = (h + block) * r`. A short final block must already be padded with a single
    /// `0x01` byte followed by zeros and passed with `is_full = false`.
    #[inline]
    pub fn absorb(&mut self, r: &Multiplier, block: &Block, is_full: bool) {
        self.h = mul_reduce(add(self.h, load_block(block, is_full)), r);
    }

    /// Pads a tail of 1 to 15 bytes and absorbs it.
    pub fn absorb_tail(&mut self, r: &Multiplier, tail: &[u8]) {
        debug_assert!(!tail.is_empty() && tail.len() < 16);
        let mut block = [0; 16];
        block[..tail.len()].copy_from_slice(tail);
        block[tail.len()] = 1;
        self.absorb(r, &block, false);
        block.zeroize();
    }

    /// Fully reduces, adds `pad` modulo 2^128 and serialises the tag.
    pub fn finish(&self, pad: &Block) -> Block {
        let mut h = carry(carry(self.h));
        let [h0, h1, h2] = &mut h;
        // Two carry passes leave h < 2^130 + small; h + 5 - 2^130 is non-negative
        // exactly when h >= p.
        let mut g0 = *h0 + 5;
        let c = g0 >> 44;
        g0 &= MASK44;
        let mut g1 = *h1 + c;
        let c = g1 >> 44;
        g1 &= MASK44;
        let g2 = (*h2 + c).wrapping_sub(1 << 42);

        let mask = (g2 >> 63).wrapping_sub(1);
        *h0 = (*h0 & !mask) | (g0 & mask);
        *h1 = (*h1 & !mask) | (g1 & mask);
        *h2 = (*h2 & !mask) | (g2 & mask);

        let (t0, t1) = split(pad);
        *h0 += t0 & MASK44;
        let c = *h0 >> 44;
        *h0 &= MASK44;
        *h1 += (((t0 >> 44) | (t1 << 20)) & MASK44) + c;
        let c = *h1 >> 44;
        *h1 &= MASK44;
        *h2 += (t1 >> 24) + c;
        *h2 &= MASK42;

        let lo = *h0 | (*h1 << 44);
        let hi = (*h1 >> 20) | (*h2 << 24);
        h.zeroize();
        let mut tag = [0; 16];
        tag[..8].copy_from_slice(&lo.to_le_bytes());
        tag[8..].copy_from_slice(&hi.to_le_bytes());
        tag
    }

    pub(crate) fn limbs(&self) -> Limbs {
        self.h
    }

    pub(crate) fn set_limbs(&mut self, h: Limbs) {
        self.h = h;
    }
}

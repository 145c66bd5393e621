//! GF(2^128) in GCM's bit order, carry-less multiplication without tables.
//!
//! GCM numbers bits from the most significant end, so a block read big-endian is the field
//! element with its polynomial bits reversed. Multiplying two reversed operands as plain
//! polynomials gives the reversed product shifted right by one, which [`Product::reduce`]
//! undoes before folding the top half back with the `x^128 = x^7 + x^2 + x + 1` relation.

use crate::util::Block;
use core::ops::{BitXor, BitXorAssign};
use zeroize::Zeroize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Zeroize)]
pub struct FieldElement(u128);

impl FieldElement {
    pub const ZERO: Self = Self(0);

    pub fn from_bytes(bytes: &Block) -> Self {
        Self(u128::from_be_bytes(*bytes))
    }

    pub fn to_bytes(self) -> Block {
        self.0.to_be_bytes()
    }

    /// Multiplies and reduces.
    #[inline]
    pub fn mul(self, other: Self) -> Self {
        Product::of(self, other).reduce()
    }
}

impl From<Block> for FieldElement {
    fn from(bytes: Block) -> Self {
        Self::from_bytes(&bytes)
    }
}

impl From<FieldElement> for Block {
    fn from(element: FieldElement) -> Self {
        element.to_bytes()
    }
}

impl BitXor for FieldElement {
    type Output = Self;

    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for FieldElement {
    #[inline(always)]
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

/// Low 64 bits of the carry-less product.
///
/// Each operand is split into four interleaved bit classes (every fourth bit) so the
/// integer multiplier's carries land in bits that get masked away.
#[inline(always)]
fn bmul64(x: u64, y: u64) -> u64 {
    const M0: u64 = 0x1111_1111_1111_1111;
    const M1: u64 = 0x2222_2222_2222_2222;
    const M2: u64 = 0x4444_4444_4444_4444;
    const M3: u64 = 0x8888_8888_8888_8888;

    let [x0, x1, x2, x3] = [x & M0, x & M1, x & M2, x & M3];
    let [y0, y1, y2, y3] = [y & M0, y & M1, y & M2, y & M3];
    let m = u64::wrapping_mul;

    let z0 = m(x0, y0) ^ m(x1, y3) ^ m(x2, y2) ^ m(x3, y1);
    let z1 = m(x0, y1) ^ m(x1, y0) ^ m(x2, y3) ^ m(x3, y2);
    let z2 = m(x0, y2) ^ m(x1, y1) ^ m(x2, y0) ^ m(x3, y3);
    let z3 = m(x0, y3) ^ m(x1, y2) ^ m(x2, y1) ^ m(x3, y0);

    (z0 & M0) | (z1 & M1) | (z2 & M2) | (z3 & M3)
}

/// Full 128-bit carry-less product of two 64-bit polynomials. The high half is the low half
/// of the bit-reversed product, reversed back.
#[inline(always)]
fn clmul64(x: u64, y: u64) -> u128 {
    let lo = bmul64(x, y);
    let hi = bmul64(x.reverse_bits(), y.reverse_bits()).reverse_bits() >> 1;
    (u128::from(hi) << 64) | u128::from(lo)
}

/// A 256-bit carry-less product that has not been reduced yet. Products under the same
/// reduction can be xored together and reduced once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Zeroize)]
pub(crate) struct Product {
    hi: u128,
    lo: u128,
}

impl Product {
    /// Four-way schoolbook multiplication of the 64-bit halves.
    #[inline(always)]
    pub(crate) fn of(a: FieldElement, b: FieldElement) -> Self {
        let (a1, a0) = ((a.0 >> 64) as u64, a.0 as u64);
        let (b1, b0) = ((b.0 >> 64) as u64, b.0 as u64);

        let lo = clmul64(a0, b0);
        let hi = clmul64(a1, b1);
        let mid = clmul64(a0, b1) ^ clmul64(a1, b0);
        Self {
            hi: hi ^ (mid >> 64),
            lo: lo ^ (mid << 64),
        }
    }

    /// Two-phase shift-xor reduction modulo `x^128 + x^7 + x^2 + x + 1`.
    #[inline(always)]
    pub(crate) fn reduce(self) -> FieldElement {
        let hi = (self.hi << 1) | (self.lo >> 127);
        let lo = self.lo << 1;
        let (x0, x1) = (lo as u64, (lo >> 64) as u64);
        let (x2, x3) = (hi as u64, (hi >> 64) as u64);

        // Phase one: fold x0 into x1.
        let d = x1 ^ (x0 << 63) ^ (x0 << 62) ^ (x0 << 57);
        // Phase two: fold [d:x0] into the upper half.
        let dx = (u128::from(d) << 64) | u128::from(x0);
        let (e, f, g) = (dx >> 1, dx >> 2, dx >> 7);
        let h1 = d ^ (e >> 64) as u64 ^ (f >> 64) as u64 ^ (g >> 64) as u64;
        let h0 = x0 ^ e as u64 ^ f as u64 ^ g as u64;

        FieldElement((u128::from(x3 ^ h1) << 64) | u128::from(x2 ^ h0))
    }
}

impl BitXorAssign for Product {
    #[inline(always)]
    fn bitxor_assign(&mut self, rhs: Self) {
        self.hi ^= rhs.hi;
        self.lo ^= rhs.lo;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit-serial multiplication straight from the GCM definition.
    fn mul_reference(x: FieldElement, y: FieldElement) -> FieldElement {
        const R: u128 = 0xe1 << 120;
        let (mut z, mut v) = (0u128, y.0);
        for i in 0..128 {
            if (x.0 >> (127 - i)) & 1 == 1 {
                z ^= v;
            }
            v = if v & 1 == 1 { (v >> 1) ^ R } else { v >> 1 };
        }
        FieldElement(z)
    }

    fn clmul_reference(x: u64, y: u64) -> u128 {
        (0..64)
            .filter(|i| (y >> i) & 1 == 1)
            .fold(0, |acc, i| acc ^ (u128::from(x) << i))
    }

    fn random() -> FieldElement {
        let mut bytes = [0u8; 16];
        getrandom::fill(&mut bytes).unwrap();
        FieldElement::from_bytes(&bytes)
    }

    #[test]
    fn clmul64_matches_shift_and_xor() {
        for (x, y) in [(u64::MAX, u64::MAX), (1 << 63, 1 << 63), (0, 5), (1, 1)] {
            assert_eq!(clmul64(x, y), clmul_reference(x, y));
        }
        for _ in 0..500 {
            let x = getrandom::u64().unwrap();
            let y = getrandom::u64().unwrap();
            assert_eq!(clmul64(x, y), clmul_reference(x, y));
        }
    }

    #[test]
    fn mul_matches_bit_serial_definition() {
        for _ in 0..300 {
            let (a, b) = (random(), random());
            assert_eq!(a.mul(b), mul_reference(a, b));
        }
    }

    #[test]
    fn one_is_the_top_bit() {
        let one = FieldElement(1 << 127);
        let a = random();
        assert_eq!(a.mul(one), a);
        assert_eq!(one.mul(a), a);
    }

    #[test]
    fn products_can_be_summed_before_reducing() {
        let (a, b, c, d) = (random(), random(), random(), random());
        let mut sum = Product::of(a, b);
        sum ^= Product::of(c, d);
        assert_eq!(sum.reduce(), a.mul(b) ^ c.mul(d));
    }
}

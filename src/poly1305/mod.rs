/*!
Poly1305 one-time authenticator (RFC 8439).

The accumulator lives in three 44/44/42-bit limbs in every path. Runs of full blocks go
through one of three absorbers picked from the host's [`SimdWidth`]: plain Horner, or 8 or
16 independent Horner chains stepping by `r^8`/`r^16` that are folded back into one
accumulator at the end of the run. The powers of `r` are derived the first time a batched
absorber runs and kept with the key.
*/

mod lanes;
mod limbs;
mod powers;

pub use limbs::{Accumulator, Multiplier};

use self::lanes::{Absorb, Lanes, Scalar};
use self::powers::PowerTable;
use crate::error::{Error, Result};
use crate::util::{BLOCK_LEN, Block, to_block};
use crate::width::SimdWidth;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const KEY_LEN: usize = 32;
pub const TAG_LEN: usize = 16;

pub type Tag = [u8; TAG_LEN];

/// Number of Horner chains used for runs of full blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolyLanes {
    One,
    Eight,
    Sixteen,
}

impl PolyLanes {
    pub const ALL: [PolyLanes; 3] = [Self::One, Self::Eight, Self::Sixteen];

    pub const fn for_width(width: SimdWidth) -> Self {
        match width {
            SimdWidth::Scalar | SimdWidth::W128 => Self::One,
            SimdWidth::W256 => Self::Eight,
            SimdWidth::W512 => Self::Sixteen,
        }
    }

    pub const fn count(self) -> usize {
        match self {
            Self::One => Scalar::LANES,
            Self::Eight => Lanes::<8>::LANES,
            Self::Sixteen => Lanes::<16>::LANES,
        }
    }
}

/// A Poly1305 key split into the clamped multiplier and the final pad.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key {
    r: Multiplier,
    pad: Block,
    powers: PowerTable,
}

impl Key {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        let (r, pad) = key.split_at(BLOCK_LEN);
        Self {
            r: Multiplier::clamp(&to_block(r)),
            pad: to_block(pad),
            powers: PowerTable::Uninitialized,
        }
    }

    pub fn new_from_slice(key: &[u8]) -> Result<Self> {
        let key: &[u8; KEY_LEN] = key.try_into().map_err(|_| Error::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        })?;
        Ok(Self::new(key))
    }

    pub fn r(&self) -> &Multiplier {
        &self.r
    }

    /// Whether `r^2..r^16` have been derived yet.
    pub fn has_powers(&self) -> bool {
        self.powers.is_ready()
    }

    /// Absorbs `blocks` (a whole number of full blocks) with the given number of chains.
    /// Blocks left over after the last whole pass go through the one-chain path.
    pub fn absorb_blocks(&mut self, acc: &mut Accumulator, lanes: PolyLanes, blocks: &[u8]) {
        debug_assert_eq!(blocks.len() % BLOCK_LEN, 0);
        let mut h = acc.limbs();
        let consumed = match lanes {
            PolyLanes::One => 0,
            PolyLanes::Eight => self.absorb_with::<Lanes<8>>(&mut h, blocks),
            PolyLanes::Sixteen => self.absorb_with::<Lanes<16>>(&mut h, blocks),
        };
        for block in blocks[consumed..].chunks_exact(BLOCK_LEN) {
            h = limbs::mul_reduce(limbs::add(h, limbs::load_block(&to_block(block), true)), &self.r);
        }
        acc.set_limbs(h);
        h.zeroize();
    }

    fn absorb_with<A: Absorb>(&mut self, h: &mut [u64; 3], blocks: &[u8]) -> usize {
        if blocks.len() < A::LANES * BLOCK_LEN {
            return 0;
        }
        let powers = self.powers.generate(&self.r);
        A::absorb(h, powers, blocks)
    }

    pub fn finish(&self, acc: &Accumulator) -> Tag {
        acc.finish(&self.pad)
    }
}

/// Incremental Poly1305.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Poly1305 {
    key: Key,
    acc: Accumulator,
    buffer: Block,
    buffered: usize,
    #[zeroize(skip)]
    lanes: PolyLanes,
}

impl Poly1305 {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self::with_lanes(key, PolyLanes::for_width(SimdWidth::detect()))
    }

    pub fn new_from_slice(key: &[u8]) -> Result<Self> {
        let key: &[u8; KEY_LEN] = key.try_into().map_err(|_| Error::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        })?;
        Ok(Self::new(key))
    }

    pub fn with_lanes(key: &[u8; KEY_LEN], lanes: PolyLanes) -> Self {
        log::trace!("poly1305: {} lane(s)", lanes.count());
        Self {
            key: Key::new(key),
            acc: Accumulator::new(),
            buffer: [0; BLOCK_LEN],
            buffered: 0,
            lanes,
        }
    }

    pub fn lanes(&self) -> PolyLanes {
        self.lanes
    }

    pub fn update(&mut self, mut data: &[u8]) {
        if self.buffered > 0 {
            let take = (BLOCK_LEN - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
            if self.buffered < BLOCK_LEN {
                return;
            }
            self.acc.absorb(&self.key.r, &self.buffer, true);
            self.buffered = 0;
        }

        let whole = data.len() - data.len() % BLOCK_LEN;
        let (blocks, tail) = data.split_at(whole);
        if !blocks.is_empty() {
            self.key.absorb_blocks(&mut self.acc, self.lanes, blocks);
        }
        self.buffer[..tail.len()].copy_from_slice(tail);
        self.buffered = tail.len();
    }

    pub fn finalize(mut self) -> Tag {
        if self.buffered > 0 {
            self.acc.absorb_tail(&self.key.r, &self.buffer[..self.buffered]);
        }
        self.key.finish(&self.acc)
    }

    /// Compares against `expected` in constant time.
    pub fn verify(self, expected: &[u8]) -> Result<()> {
        if expected.len() != TAG_LEN {
            return Err(Error::InvalidTagLength {
                expected: TAG_LEN,
                actual: expected.len(),
            });
        }
        let tag = self.finalize();
        if bool::from(tag[..].ct_eq(expected)) {
            Ok(())
        } else {
            Err(Error::AuthenticationFailed)
        }
    }
}

/// One-shot MAC over `data`.
pub fn mac(key: &[u8; KEY_LEN], data: &[u8]) -> Tag {
    let mut poly = Poly1305::new(key);
    poly.update(data);
    poly.finalize()
}

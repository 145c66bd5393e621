/*!
GHASH, the universal hash behind AES-GCM.

Multiplication is table-free (four 64x64 carry-less products and a shift-xor reduction).
The only precomputation is the list of powers `H^1..H^n`, built lazily on the
[`HashKey`] the first time a batched fold needs it. Batched folds multiply each block of a
superblock by its own power of `H`, xor the unreduced 256-bit products together and reduce
once per superblock.
*/

mod field;
mod lanes;
mod table;

pub use field::FieldElement;
pub use table::{HashKey, MAX_POWERS, TableSize};

pub(crate) use field::Product;
pub(crate) use lanes::accumulate;

use self::lanes::Superblock;
use crate::error::{Error, Result};
use crate::util::{BLOCK_LEN, Block, pad_block};
use crate::width::SimdWidth;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// `state * h` in GF(2^128).
pub fn multiply_reduce(state: FieldElement, h: FieldElement) -> FieldElement {
    state.mul(h)
}

/// Folds the full blocks of `blocks` into `state`, using the largest superblock the table
/// for `width` and the message length allow. Trailing bytes that do not fill a block are
/// ignored.
pub fn process_blocks(
    key: &mut HashKey,
    width: SimdWidth,
    state: FieldElement,
    blocks: &[u8],
) -> FieldElement {
    let full = blocks.len() / BLOCK_LEN;
    let powers = key.generate_table(TableSize::for_message(width, full));
    let mut state = state;
    let mut rest = &blocks[..full * BLOCK_LEN];
    rest = &rest[Superblock::<MAX_POWERS>::fold(&mut state, powers, rest)..];
    rest = &rest[Superblock::<8>::fold(&mut state, powers, rest)..];
    Superblock::<1>::fold(&mut state, powers, rest);
    state
}

/// Incremental GHASH.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct GHash {
    key: HashKey,
    state: FieldElement,
    buffer: Block,
    buffered: usize,
    #[zeroize(skip)]
    width: SimdWidth,
}

impl GHash {
    pub fn new(h: &Block) -> Self {
        Self::with_width(h, SimdWidth::detect())
    }

    pub fn with_width(h: &Block, width: SimdWidth) -> Self {
        log::trace!("ghash: {} width", width);
        Self {
            key: HashKey::new(h),
            state: FieldElement::ZERO,
            buffer: [0; BLOCK_LEN],
            buffered: 0,
            width,
        }
    }

    pub fn state(&self) -> FieldElement {
        self.state
    }

    /// Absorbs `data` as a continuation of everything absorbed so far. A partial block is
    /// held back until more data or [`GHash::finalize`] arrives.
    pub fn update(&mut self, mut data: &[u8]) {
        if self.buffered > 0 {
            let take = (BLOCK_LEN - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
            if self.buffered < BLOCK_LEN {
                return;
            }
            self.state = (self.state ^ FieldElement::from_bytes(&self.buffer)).mul(self.key.h());
            self.buffered = 0;
        }
        let whole = data.len() - data.len() % BLOCK_LEN;
        self.state = process_blocks(&mut self.key, self.width, self.state, &data[..whole]);
        let tail = &data[whole..];
        self.buffer[..tail.len()].copy_from_slice(tail);
        self.buffered = tail.len();
    }

    /// Absorbs `data` zero-padded to a block boundary, as GCM does for the associated data
    /// and the ciphertext. Any partial block held back by [`GHash::update`] is padded first.
    pub fn update_padded(&mut self, data: &[u8]) {
        self.flush();
        self.update(data);
        self.flush();
    }

    /// Absorbs whole blocks only.
    pub fn update_blocks(&mut self, blocks: &[u8]) -> Result<()> {
        if blocks.len() % BLOCK_LEN != 0 {
            return Err(Error::PartialBlock {
                len: blocks.len(),
                block: BLOCK_LEN,
            });
        }
        self.update(blocks);
        Ok(())
    }

    pub fn finalize(mut self) -> Block {
        self.flush();
        self.state.to_bytes()
    }

    fn flush(&mut self) {
        if self.buffered > 0 {
            let block = pad_block(&self.buffer[..self.buffered]);
            self.state = (self.state ^ FieldElement::from_bytes(&block)).mul(self.key.h());
            self.buffered = 0;
        }
    }
}

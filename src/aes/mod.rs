/*!
AES-128/192/256 over batches of independent blocks.

The round function is written once, generic over the number of blocks `N` it carries, and
instantiated for 1, 4, 8, 16 and 32 lanes. Every lane of a batch goes through the same round
key at the same time. ECB lives directly on [`Aes`]; the chaining modes are in [`modes`].
*/

mod keys;
pub mod modes;
mod round;
mod sbox;

pub use keys::RoundKeys;

pub(crate) use round::{decrypt_lanes, encrypt_lanes};

use crate::error::{Error, Result};
use crate::util::{BLOCK_LEN, Block, to_block};
use crate::width::SimdWidth;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Encrypts a single block.
pub fn encrypt_block(keys: &RoundKeys, block: &Block) -> Block {
    let mut lanes = [*block];
    encrypt_lanes::<1>(keys, &mut lanes);
    lanes[0]
}

/// Decrypts a single block.
pub fn decrypt_block(keys: &RoundKeys, block: &Block) -> Block {
    let mut lanes = [*block];
    decrypt_lanes::<1>(keys, &mut lanes);
    lanes[0]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Direction {
    Encrypt,
    Decrypt,
}

/// Number of blocks a batch carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AesLanes {
    One,
    Four,
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl AesLanes {
    pub const ALL: [AesLanes; 5] = [
        Self::One,
        Self::Four,
        Self::Eight,
        Self::Sixteen,
        Self::ThirtyTwo,
    ];

    pub const fn for_width(width: SimdWidth) -> Self {
        match width {
            SimdWidth::Scalar => Self::One,
            SimdWidth::W128 => Self::Four,
            SimdWidth::W256 => Self::Eight,
            SimdWidth::W512 => Self::ThirtyTwo,
        }
    }

    pub const fn count(self) -> usize {
        match self {
            Self::One => 1,
            Self::Four => 4,
            Self::Eight => 8,
            Self::Sixteen => 16,
            Self::ThirtyTwo => 32,
        }
    }
}

/// Runs every whole batch of `N` blocks of `data` through the cipher in place and returns the
/// number of bytes processed.
#[inline(always)]
fn blocks_with<const N: usize>(keys: &RoundKeys, direction: Direction, data: &mut [u8]) -> usize {
    let mut lanes = [[0u8; BLOCK_LEN]; N];
    let mut done = 0;
    for chunk in data.chunks_exact_mut(N * BLOCK_LEN) {
        for (lane, block) in lanes.iter_mut().zip(chunk.chunks_exact(BLOCK_LEN)) {
            *lane = to_block(block);
        }
        match direction {
            Direction::Encrypt => encrypt_lanes::<N>(keys, &mut lanes),
            Direction::Decrypt => decrypt_lanes::<N>(keys, &mut lanes),
        }
        for (block, lane) in chunk.chunks_exact_mut(BLOCK_LEN).zip(lanes.iter()) {
            block.copy_from_slice(lane);
        }
        done += N * BLOCK_LEN;
    }
    lanes.zeroize();
    done
}

/// Processes `data` in batches of `lanes`, finishing the leftovers one block at a time.
pub(crate) fn process_blocks(
    keys: &RoundKeys,
    lanes: AesLanes,
    direction: Direction,
    data: &mut [u8],
) {
    debug_assert_eq!(data.len() % BLOCK_LEN, 0);
    let done = match lanes {
        AesLanes::One => 0,
        AesLanes::Four => blocks_with::<4>(keys, direction, data),
        AesLanes::Eight => blocks_with::<8>(keys, direction, data),
        AesLanes::Sixteen => blocks_with::<16>(keys, direction, data),
        AesLanes::ThirtyTwo => blocks_with::<32>(keys, direction, data),
    };
    blocks_with::<1>(keys, direction, &mut data[done..]);
}

/// An AES key schedule paired with a batch width.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Aes {
    keys: RoundKeys,
    #[zeroize(skip)]
    lanes: AesLanes,
}

impl Aes {
    /// Expands a 16, 24 or 32 byte key.
    pub fn new(key: &[u8]) -> Result<Self> {
        Ok(Self::with_lanes(
            RoundKeys::expand(key)?,
            AesLanes::for_width(SimdWidth::detect()),
        ))
    }

    pub fn with_lanes(keys: RoundKeys, lanes: AesLanes) -> Self {
        log::trace!("aes: {} rounds, {} lane(s)", keys.rounds(), lanes.count());
        Self { keys, lanes }
    }

    pub fn keys(&self) -> &RoundKeys {
        &self.keys
    }

    pub fn lanes(&self) -> AesLanes {
        self.lanes
    }

    pub fn encrypt_block(&self, block: &mut Block) {
        *block = encrypt_block(&self.keys, block);
    }

    pub fn decrypt_block(&self, block: &mut Block) {
        *block = decrypt_block(&self.keys, block);
    }

    /// ECB encryption of whole blocks in place.
    pub fn encrypt_blocks(&self, data: &mut [u8]) -> Result<()> {
        self.ecb(Direction::Encrypt, data)
    }

    /// ECB decryption of whole blocks in place.
    pub fn decrypt_blocks(&self, data: &mut [u8]) -> Result<()> {
        self.ecb(Direction::Decrypt, data)
    }

    fn ecb(&self, direction: Direction, data: &mut [u8]) -> Result<()> {
        if data.len() % BLOCK_LEN != 0 {
            return Err(Error::PartialBlock {
                len: data.len(),
                block: BLOCK_LEN,
            });
        }
        process_blocks(&self.keys, self.lanes, direction, data);
        Ok(())
    }
}

/*!
AES-GCM with the counter-mode encryption and the GHASH folding interleaved.

A message is cut into superblocks of 48, 8 or 1 blocks (the size of the `H` table in use)
and each superblock into keystream passes of 16, 8 or 1 blocks. Within a superblock the
256-bit products are only xored together; the single reduction happens at the superblock
boundary. When encrypting, the ciphertext of a pass is hashed after the keystream of the
following pass has been applied, so the cipher and the hash work on independent data. When
decrypting, the ciphertext is hashed before it is overwritten.

```text
AwaitingFirstBlock -> Accumulating -> SuperblockReduce -> Accumulating ... -> DrainTail -> Finalize
```

Whatever does not fill the current superblock falls through to the next smaller one; the
final partial block (if any) is handled in `DrainTail`.
*/

use crate::aes::modes::{increment_be32, keystream};
use crate::aes::{Direction, RoundKeys, encrypt_block};
use crate::error::{Error, Result};
use crate::ghash::{self, FieldElement, HashKey, Product, TableSize, accumulate};
use crate::util::{BLOCK_LEN, Block, pad_block, xor_block, xor_in_place};
use crate::width::SimdWidth;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
/// Largest keystream pass.
const MAX_PASS: usize = 16;
/// The 32-bit block counter allows 2^32 - 2 data blocks after `J0`.
const MAX_MESSAGE_LEN: u64 = ((1 << 32) - 2) * BLOCK_LEN as u64;

pub type Tag = [u8; TAG_LEN];

/// Blocks per keystream pass on each width.
const fn pass_for_width(width: SimdWidth) -> usize {
    match width {
        SimdWidth::Scalar => 1,
        SimdWidth::W128 | SimdWidth::W256 => 8,
        SimdWidth::W512 => MAX_PASS,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tier {
    superblock: usize,
    pass: usize,
}

/// Superblock/pass sizes to go through, largest first, always ending with single blocks.
fn tiers(width: SimdWidth, blocks: usize) -> ([Tier; 3], usize) {
    let top = TableSize::for_message(width, blocks).len();
    let mut tiers = [Tier {
        superblock: 1,
        pass: 1,
    }; 3];
    let mut count = 0;
    for superblock in [top, 8, 1] {
        if superblock <= top && (count == 0 || superblock < tiers[count - 1].superblock) {
            tiers[count] = Tier {
                superblock,
                pass: pass_for_width(width).min(superblock),
            };
            count += 1;
        }
    }
    (tiers, count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingFirstBlock,
    Accumulating,
    SuperblockReduce,
    DrainTail,
    Finalize,
}

struct Pipeline<'a> {
    keys: &'a RoundKeys,
    powers: &'a [FieldElement],
    counter: &'a mut Block,
    state: &'a mut FieldElement,
    direction: Direction,
    tiers: [Tier; 3],
    tier_count: usize,
    tier: usize,
    acc: Product,
    keystream: [Block; MAX_PASS],
    offset: usize,
    phase: Phase,
}

impl Pipeline<'_> {
    fn run(mut self, data: &mut [u8]) {
        loop {
            self.phase = match self.phase {
                Phase::AwaitingFirstBlock => {
                    if data.len() >= BLOCK_LEN {
                        Phase::Accumulating
                    } else {
                        Phase::DrainTail
                    }
                }
                Phase::Accumulating => {
                    let tier = self.tiers[self.tier];
                    let len = tier.superblock * BLOCK_LEN;
                    if data.len() - self.offset >= len {
                        self.superblock(tier, &mut data[self.offset..self.offset + len]);
                        self.offset += len;
                        Phase::SuperblockReduce
                    } else if self.tier + 1 < self.tier_count {
                        self.tier += 1;
                        Phase::Accumulating
                    } else {
                        Phase::DrainTail
                    }
                }
                Phase::SuperblockReduce => {
                    *self.state = self.acc.reduce();
                    self.acc = Product::default();
                    Phase::Accumulating
                }
                Phase::DrainTail => {
                    self.tail(&mut data[self.offset..]);
                    Phase::Finalize
                }
                Phase::Finalize => {
                    self.keystream.zeroize();
                    self.acc.zeroize();
                    return;
                }
            };
        }
    }

    /// Xors the next `pass` keystream blocks into `bytes`.
    fn apply_pass(&mut self, pass: usize, bytes: &mut [u8]) {
        let (keys, counter, out) = (self.keys, &mut *self.counter, &mut self.keystream[..]);
        let inc: fn(&mut Block) = increment_be32;
        match pass {
            MAX_PASS => keystream::<MAX_PASS>(keys, counter, inc, out),
            8 => keystream::<8>(keys, counter, inc, out),
            _ => keystream::<1>(keys, counter, inc, out),
        }
        xor_in_place(bytes, self.keystream[..pass].as_flattened());
    }

    fn superblock(&mut self, tier: Tier, bytes: &mut [u8]) {
        let Tier { superblock, pass } = tier;
        let pass_len = pass * BLOCK_LEN;
        let passes = superblock / pass;
        let state = *self.state;
        for k in 0..passes {
            let (done, rest) = bytes.split_at_mut(k * pass_len);
            let current = &mut rest[..pass_len];
            match self.direction {
                Direction::Encrypt => {
                    self.apply_pass(pass, current);
                    if k > 0 {
                        let previous = &done[(k - 1) * pass_len..];
                        let offset = (k - 1) * pass;
                        accumulate(&mut self.acc, state, self.powers, superblock, offset, previous);
                    }
                }
                Direction::Decrypt => {
                    accumulate(&mut self.acc, state, self.powers, superblock, k * pass, current);
                    self.apply_pass(pass, current);
                }
            }
        }
        if self.direction == Direction::Encrypt {
            let last = &bytes[(passes - 1) * pass_len..];
            let offset = (passes - 1) * pass;
            accumulate(&mut self.acc, state, self.powers, superblock, offset, last);
        }
    }

    fn tail(&mut self, bytes: &mut [u8]) {
        if bytes.is_empty() {
            return;
        }
        let ciphertext = match self.direction {
            Direction::Encrypt => {
                self.apply_pass(1, bytes);
                pad_block(bytes)
            }
            Direction::Decrypt => {
                let ciphertext = pad_block(bytes);
                self.apply_pass(1, bytes);
                ciphertext
            }
        };
        let h = self.powers[0];
        *self.state = (*self.state ^ FieldElement::from_bytes(&ciphertext)).mul(h);
    }
}

/// AES-GCM key material: the AES schedule and the hash subkey `H = E(K, 0)` with its powers.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesGcm {
    keys: RoundKeys,
    hash_key: HashKey,
    #[zeroize(skip)]
    width: SimdWidth,
}

impl AesGcm {
    /// Expands a 16, 24 or 32 byte AES key.
    pub fn new(key: &[u8]) -> Result<Self> {
        Ok(Self::with_width(RoundKeys::expand(key)?, SimdWidth::detect()))
    }

    pub fn with_width(keys: RoundKeys, width: SimdWidth) -> Self {
        let h = encrypt_block(&keys, &[0; BLOCK_LEN]);
        Self::from_parts(keys, HashKey::new(&h), width)
    }

    /// Pairs a schedule with a hash subkey computed elsewhere.
    pub fn from_parts(keys: RoundKeys, hash_key: HashKey, width: SimdWidth) -> Self {
        log::trace!("aes-gcm: {} rounds, {} width", keys.rounds(), width);
        Self {
            keys,
            hash_key,
            width,
        }
    }

    pub fn hash_key(&self) -> &HashKey {
        &self.hash_key
    }

    pub fn width(&self) -> SimdWidth {
        self.width
    }

    /// Encrypts `data` in place with the counter blocks starting at `counter` and folds the
    /// ciphertext into `state`. On return `counter` is the next unused counter block.
    ///
    /// Calls can be chained on whole-block segments; a final partial block is hashed
    /// zero-padded, so it has to come last.
    pub fn encrypt_authenticate(
        &mut self,
        counter: &mut Block,
        state: &mut FieldElement,
        data: &mut [u8],
    ) {
        self.pipeline(Direction::Encrypt, counter, state, data);
    }

    /// Folds the ciphertext in `data` into `state` and decrypts it in place.
    pub fn decrypt_authenticate(
        &mut self,
        counter: &mut Block,
        state: &mut FieldElement,
        data: &mut [u8],
    ) {
        self.pipeline(Direction::Decrypt, counter, state, data);
    }

    fn pipeline(
        &mut self,
        direction: Direction,
        counter: &mut Block,
        state: &mut FieldElement,
        data: &mut [u8],
    ) {
        let (tiers, tier_count) = tiers(self.width, data.len() / BLOCK_LEN);
        let powers = self
            .hash_key
            .generate_table(TableSize::for_message(self.width, data.len() / BLOCK_LEN));
        Pipeline {
            keys: &self.keys,
            powers,
            counter,
            state,
            direction,
            tiers,
            tier_count,
            tier: 0,
            acc: Product::default(),
            keystream: [[0; BLOCK_LEN]; MAX_PASS],
            offset: 0,
            phase: Phase::AwaitingFirstBlock,
        }
        .run(data);
    }

    /// Encrypts `buffer` in place and returns the tag over `aad` and the ciphertext.
    pub fn seal_in_place(&mut self, nonce: &[u8], aad: &[u8], buffer: &mut [u8]) -> Result<Tag> {
        let j0 = Self::check(nonce, buffer)?;
        let mut counter = j0;
        increment_be32(&mut counter);
        let mut state = self.hash_padded(FieldElement::ZERO, aad);
        self.encrypt_authenticate(&mut counter, &mut state, buffer);
        Ok(self.tag(&j0, state, aad.len(), buffer.len()))
    }

    /// Checks `tag` and decrypts `buffer` in place. On a mismatch the decrypted bytes are
    /// wiped before [`Error::AuthenticationFailed`] is returned.
    pub fn open_in_place(
        &mut self,
        nonce: &[u8],
        aad: &[u8],
        buffer: &mut [u8],
        tag: &[u8],
    ) -> Result<()> {
        if tag.len() != TAG_LEN {
            return Err(Error::InvalidTagLength {
                expected: TAG_LEN,
                actual: tag.len(),
            });
        }
        let j0 = Self::check(nonce, buffer)?;
        let mut counter = j0;
        increment_be32(&mut counter);
        let mut state = self.hash_padded(FieldElement::ZERO, aad);
        self.decrypt_authenticate(&mut counter, &mut state, buffer);
        let expected = self.tag(&j0, state, aad.len(), buffer.len());
        if bool::from(expected[..].ct_eq(tag)) {
            Ok(())
        } else {
            buffer.zeroize();
            Err(Error::AuthenticationFailed)
        }
    }

    /// Validates the inputs and builds `J0 = nonce || 0x00000001`.
    fn check(nonce: &[u8], buffer: &[u8]) -> Result<Block> {
        if nonce.len() != NONCE_LEN {
            return Err(Error::InvalidNonceLength {
                expected: NONCE_LEN,
                actual: nonce.len(),
            });
        }
        if buffer.len() as u64 > MAX_MESSAGE_LEN {
            return Err(Error::CounterOverflow);
        }
        let mut j0 = [0u8; BLOCK_LEN];
        j0[..NONCE_LEN].copy_from_slice(nonce);
        j0[BLOCK_LEN - 1] = 1;
        Ok(j0)
    }

    fn hash_padded(&mut self, state: FieldElement, data: &[u8]) -> FieldElement {
        let mut state = ghash::process_blocks(&mut self.hash_key, self.width, state, data);
        let tail = &data[data.len() - data.len() % BLOCK_LEN..];
        if !tail.is_empty() {
            state = (state ^ FieldElement::from_bytes(&pad_block(tail))).mul(self.hash_key.h());
        }
        state
    }

    fn tag(&self, j0: &Block, state: FieldElement, aad_len: usize, text_len: usize) -> Tag {
        let lengths = (u128::from(aad_len as u64 * 8) << 64) | u128::from(text_len as u64 * 8);
        let lengths = FieldElement::from_bytes(&lengths.to_be_bytes());
        let state = (state ^ lengths).mul(self.hash_key.h());
        let mut tag = encrypt_block(&self.keys, j0);
        xor_block(&mut tag, &state.to_bytes());
        tag
    }
}

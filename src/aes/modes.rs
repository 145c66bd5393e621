//! Counter and cipher-block-chaining modes on top of the batched block cipher.

use super::{AesLanes, RoundKeys, decrypt_lanes, encrypt_lanes};
use crate::error::{Error, Result};
use crate::util::{BLOCK_LEN, Block, to_block, xor_block, xor_in_place};
use crate::width::SimdWidth;
use zeroize::{Zeroize, ZeroizeOnDrop};

const MAX_LANES: usize = 32;

/// Adds one to the whole block read as a big-endian 128-bit integer.
#[inline(always)]
pub(crate) fn increment_be128(counter: &mut Block) {
    *counter = u128::from_be_bytes(*counter).wrapping_add(1).to_be_bytes();
}

/// Adds one to the last four bytes read as a big-endian 32-bit integer, leaving the first
/// twelve untouched (GCM's `inc32`).
#[inline(always)]
pub(crate) fn increment_be32(counter: &mut Block) {
    let low = u32::from_be_bytes([counter[12], counter[13], counter[14], counter[15]]);
    counter[12..].copy_from_slice(&low.wrapping_add(1).to_be_bytes());
}

/// Encrypts `N` consecutive counter blocks into `out[..N]`, advancing `counter` past them.
#[inline(always)]
pub(crate) fn keystream<const N: usize>(
    keys: &RoundKeys,
    counter: &mut Block,
    increment: fn(&mut Block),
    out: &mut [Block],
) {
    let mut lanes = [[0u8; BLOCK_LEN]; N];
    for lane in lanes.iter_mut() {
        *lane = *counter;
        increment(counter);
    }
    encrypt_lanes::<N>(keys, &mut lanes);
    out[..N].copy_from_slice(&lanes);
    lanes.zeroize();
}

/// Counter mode with a full 128-bit big-endian counter. Unused keystream from the last block
/// carries over to the next call, so any split of the input gives the same output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Ctr {
    keys: RoundKeys,
    #[zeroize(skip)]
    lanes: AesLanes,
    counter: Block,
    buffer: [Block; MAX_LANES],
    buffer_pos: usize,
    buffer_len: usize,
}

impl Ctr {
    pub fn new(key: &[u8], counter: &Block) -> Result<Self> {
        Ok(Self::with_lanes(
            RoundKeys::expand(key)?,
            AesLanes::for_width(SimdWidth::detect()),
            counter,
        ))
    }

    pub fn with_lanes(keys: RoundKeys, lanes: AesLanes, counter: &Block) -> Self {
        Self {
            keys,
            lanes,
            counter: *counter,
            buffer: [[0; BLOCK_LEN]; MAX_LANES],
            buffer_pos: 0,
            buffer_len: 0,
        }
    }

    /// The next counter block that will be encrypted.
    pub fn counter(&self) -> Block {
        self.counter
    }

    pub fn apply_keystream(&mut self, mut data: &mut [u8]) {
        while !data.is_empty() {
            if self.buffer_pos == self.buffer_len {
                self.refill();
            }
            let buffer = self.buffer.as_flattened();
            let available = &buffer[self.buffer_pos..self.buffer_len];
            let take = available.len().min(data.len());
            let (head, rest) = data.split_at_mut(take);
            xor_in_place(head, available);
            self.buffer_pos += take;
            data = rest;
        }
    }

    fn refill(&mut self) {
        let (keys, counter, out) = (&self.keys, &mut self.counter, &mut self.buffer[..]);
        let inc: fn(&mut Block) = increment_be128;
        match self.lanes {
            AesLanes::One => keystream::<1>(keys, counter, inc, out),
            AesLanes::Four => keystream::<4>(keys, counter, inc, out),
            AesLanes::Eight => keystream::<8>(keys, counter, inc, out),
            AesLanes::Sixteen => keystream::<16>(keys, counter, inc, out),
            AesLanes::ThirtyTwo => keystream::<32>(keys, counter, inc, out),
        }
        self.buffer_pos = 0;
        self.buffer_len = self.lanes.count() * BLOCK_LEN;
    }
}

#[inline(always)]
fn cbc_decrypt_with<const N: usize>(keys: &RoundKeys, iv: &mut Block, data: &mut [u8]) -> usize {
    let mut lanes = [[0u8; BLOCK_LEN]; N];
    let mut done = 0;
    for chunk in data.chunks_exact_mut(N * BLOCK_LEN) {
        for (lane, block) in lanes.iter_mut().zip(chunk.chunks_exact(BLOCK_LEN)) {
            *lane = to_block(block);
        }
        decrypt_lanes::<N>(keys, &mut lanes);
        for (block, lane) in chunk.chunks_exact_mut(BLOCK_LEN).zip(lanes.iter_mut()) {
            let ciphertext = to_block(block);
            xor_block(lane, iv);
            block.copy_from_slice(lane);
            *iv = ciphertext;
        }
        done += N * BLOCK_LEN;
    }
    lanes.zeroize();
    done
}

/// Cipher block chaining over whole blocks. Encryption is inherently one block at a time;
/// decryption runs in batches since every block only needs the previous ciphertext.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Cbc {
    keys: RoundKeys,
    #[zeroize(skip)]
    lanes: AesLanes,
    iv: Block,
}

impl Cbc {
    pub fn new(key: &[u8], iv: &Block) -> Result<Self> {
        Ok(Self::with_lanes(
            RoundKeys::expand(key)?,
            AesLanes::for_width(SimdWidth::detect()),
            iv,
        ))
    }

    pub fn with_lanes(keys: RoundKeys, lanes: AesLanes, iv: &Block) -> Self {
        Self {
            keys,
            lanes,
            iv: *iv,
        }
    }

    /// The chaining value for the next block.
    pub fn iv(&self) -> Block {
        self.iv
    }

    pub fn encrypt(&mut self, data: &mut [u8]) -> Result<()> {
        check_blocks(data)?;
        for block in data.chunks_exact_mut(BLOCK_LEN) {
            let mut lanes = [to_block(block)];
            xor_block(&mut lanes[0], &self.iv);
            encrypt_lanes::<1>(&self.keys, &mut lanes);
            block.copy_from_slice(&lanes[0]);
            self.iv = lanes[0];
        }
        Ok(())
    }

    pub fn decrypt(&mut self, data: &mut [u8]) -> Result<()> {
        check_blocks(data)?;
        let (keys, iv) = (&self.keys, &mut self.iv);
        let done = match self.lanes {
            AesLanes::One => 0,
            AesLanes::Four => cbc_decrypt_with::<4>(keys, iv, data),
            AesLanes::Eight => cbc_decrypt_with::<8>(keys, iv, data),
            AesLanes::Sixteen => cbc_decrypt_with::<16>(keys, iv, data),
            AesLanes::ThirtyTwo => cbc_decrypt_with::<32>(keys, iv, data),
        };
        cbc_decrypt_with::<1>(keys, iv, &mut data[done..]);
        Ok(())
    }
}

fn check_blocks(data: &[u8]) -> Result<()> {
    if data.len() % BLOCK_LEN == 0 {
        Ok(())
    } else {
        Err(Error::PartialBlock {
            len: data.len(),
            block: BLOCK_LEN,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aes::encrypt_block;
    use std::vec;

    fn hex(s: &str) -> std::vec::Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    const SP800_38A_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const SP800_38A_PLAINTEXT: &str = "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51\
                                       30c81c46a35ce411e5fbc1191a0a52eff69f2445df4f9b17ad2b417be66c3710";

    #[test]
    fn counter_increments() {
        let mut counter = [0xff; 16];
        increment_be128(&mut counter);
        assert_eq!(counter, [0; 16]);

        let mut counter = [0xff; 16];
        increment_be32(&mut counter);
        assert_eq!(counter[..12], [0xff; 12]);
        assert_eq!(counter[12..], [0; 4]);

        let mut counter = [0; 16];
        counter[15] = 0xff;
        increment_be128(&mut counter);
        assert_eq!(counter[14..], [1, 0]);
    }

    #[test]
    fn sp800_38a_ctr() {
        // F.5.1 CTR-AES128.Encrypt
        let keys = RoundKeys::expand(&hex(SP800_38A_KEY)).unwrap();
        let counter = to_block(&hex("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff"));
        let expected = hex(
            "874d6191b620e3261bef6864990db6ce9806f66b7970fdff8617187bb9fffdff\
             5ae4df3edbd5d35e5b4f09020db03eab1e031dda2fbe03d1792170a0f3009cee",
        );
        for lanes in AesLanes::ALL {
            let mut data = hex(SP800_38A_PLAINTEXT);
            let mut ctr = Ctr::with_lanes(keys.clone(), lanes, &counter);
            ctr.apply_keystream(&mut data);
            assert_eq!(data, expected, "{lanes:?}");
        }
    }

    #[test]
    fn ctr_blocks_are_independent() {
        // block i of the stream only depends on counter + i
        let keys = RoundKeys::expand(&[7; 32]).unwrap();
        let start = [0xab; 16];
        let mut stream = vec![0u8; 16 * 40];
        Ctr::with_lanes(keys.clone(), AesLanes::ThirtyTwo, &start).apply_keystream(&mut stream);

        let mut counter = start;
        for block in stream.chunks_exact(BLOCK_LEN) {
            assert_eq!(block, encrypt_block(&keys, &counter));
            increment_be128(&mut counter);
        }
    }

    #[test]
    fn ctr_resumes_mid_block() {
        let keys = RoundKeys::expand(&[1; 16]).unwrap();
        let mut whole = vec![0u8; 700];
        Ctr::with_lanes(keys.clone(), AesLanes::Eight, &[0; 16]).apply_keystream(&mut whole);

        for lanes in AesLanes::ALL {
            let mut ctr = Ctr::with_lanes(keys.clone(), lanes, &[0; 16]);
            let mut pieces = vec![0u8; 700];
            for chunk in pieces.chunks_mut(13) {
                ctr.apply_keystream(chunk);
            }
            assert_eq!(pieces, whole, "{lanes:?}");
        }
    }

    #[test]
    fn sp800_38a_cbc() {
        // F.2.1 / F.2.2
        let keys = RoundKeys::expand(&hex(SP800_38A_KEY)).unwrap();
        let iv = to_block(&hex("000102030405060708090a0b0c0d0e0f"));
        let expected = hex(
            "7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2\
             73bed6b8e3c1743b7116e69e222295163ff1caa1681fac09120eca307586e1a7",
        );
        for lanes in AesLanes::ALL {
            let mut data = hex(SP800_38A_PLAINTEXT);
            let mut cbc = Cbc::with_lanes(keys.clone(), lanes, &iv);
            cbc.encrypt(&mut data).unwrap();
            assert_eq!(data, expected, "{lanes:?}");
            assert_eq!(cbc.iv()[..], expected[48..]);

            let mut cbc = Cbc::with_lanes(keys.clone(), lanes, &iv);
            cbc.decrypt(&mut data).unwrap();
            assert_eq!(data, hex(SP800_38A_PLAINTEXT), "{lanes:?}");
        }
    }

    #[test]
    fn cbc_batched_decrypt_round_trips() {
        let keys = RoundKeys::expand(&[3; 24]).unwrap();
        let mut data = vec![0u8; 16 * 70];
        getrandom::fill(&mut data).unwrap();
        let original = data.clone();

        Cbc::with_lanes(keys.clone(), AesLanes::One, &[9; 16])
            .encrypt(&mut data)
            .unwrap();
        Cbc::with_lanes(keys, AesLanes::ThirtyTwo, &[9; 16])
            .decrypt(&mut data)
            .unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn cbc_rejects_partial_blocks() {
        let mut cbc = Cbc::new(&[0; 16], &[0; 16]).unwrap();
        assert_eq!(
            cbc.encrypt(&mut [0; 15]),
            Err(Error::PartialBlock { len: 15, block: 16 })
        );
    }
}

use super::sbox::{RCON, SBOX};
use crate::error::{Error, Result};
use crate::util::{BLOCK_LEN, Block, to_block};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Most round keys any key size needs (AES-256).
const MAX_ROUND_KEYS: usize = 15;

/// An expanded AES key: `rounds + 1` round keys of 16 bytes each.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RoundKeys {
    keys: [Block; MAX_ROUND_KEYS],
    rounds: usize,
}

impl core::fmt::Debug for RoundKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RoundKeys")
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}

/// Rounds for a schedule of `count` round keys.
fn rounds_for(count: usize) -> Result<usize> {
    match count {
        11 | 13 | 15 => Ok(count - 1),
        _ => Err(Error::InvalidRoundKeyCount(count)),
    }
}

#[inline(always)]
fn sub_word(word: u32) -> u32 {
    u32::from_be_bytes(word.to_be_bytes().map(|b| SBOX[b as usize]))
}

impl RoundKeys {
    /// FIPS-197 key expansion of a 16, 24 or 32 byte key.
    pub fn expand(key: &[u8]) -> Result<Self> {
        let nk = match key.len() {
            16 | 24 | 32 => key.len() / 4,
            len => return Err(Error::InvalidAesKeyLength(len)),
        };
        let rounds = nk + 6;
        let total = 4 * (rounds + 1);

        let mut words = [0u32; 4 * MAX_ROUND_KEYS];
        for (word, chunk) in words.iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        for i in nk..total {
            let mut temp = words[i - 1];
            if i % nk == 0 {
                temp = sub_word(temp.rotate_left(8)) ^ (u32::from(RCON[i / nk - 1]) << 24);
            } else if nk > 6 && i % nk == 4 {
                temp = sub_word(temp);
            }
            words[i] = words[i - nk] ^ temp;
        }

        let schedule = Self::from_words(&words[..total]);
        words.zeroize();
        schedule
    }

    /// Loads a schedule given as `4 * (rounds + 1)` big-endian words, the layout a standard
    /// word-oriented key expansion produces.
    pub fn from_words(words: &[u32]) -> Result<Self> {
        if words.len() % 4 != 0 {
            return Err(Error::InvalidRoundKeyCount(words.len() / 4));
        }
        let rounds = rounds_for(words.len() / 4)?;
        let mut keys = [[0u8; BLOCK_LEN]; MAX_ROUND_KEYS];
        for (key, quad) in keys.iter_mut().zip(words.chunks_exact(4)) {
            for (bytes, word) in key.chunks_exact_mut(4).zip(quad) {
                bytes.copy_from_slice(&word.to_be_bytes());
            }
        }
        Ok(Self { keys, rounds })
    }

    /// Loads a schedule given as `rounds + 1` consecutive 16-byte round keys.
    pub fn from_bytes(schedule: &[u8]) -> Result<Self> {
        if schedule.len() % BLOCK_LEN != 0 {
            return Err(Error::PartialBlock {
                len: schedule.len(),
                block: BLOCK_LEN,
            });
        }
        let rounds = rounds_for(schedule.len() / BLOCK_LEN)?;
        let mut keys = [[0u8; BLOCK_LEN]; MAX_ROUND_KEYS];
        for (key, chunk) in keys.iter_mut().zip(schedule.chunks_exact(BLOCK_LEN)) {
            *key = to_block(chunk);
        }
        Ok(Self { keys, rounds })
    }

    /// 10, 12 or 14.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    #[inline(always)]
    pub fn round_key(&self, round: usize) -> &Block {
        &self.keys[round]
    }

    /// The schedule as consecutive round keys.
    pub fn as_blocks(&self) -> &[Block] {
        &self.keys[..=self.rounds]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fips197_aes128_expansion() {
        // FIPS-197 appendix A.1
        let key = [
            0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf,
            0x4f, 0x3c,
        ];
        let keys = RoundKeys::expand(&key).unwrap();
        assert_eq!(keys.rounds(), 10);
        assert_eq!(keys.round_key(0), &key);
        assert_eq!(
            keys.round_key(10),
            &[
                0xd0, 0x14, 0xf9, 0xa8, 0xc9, 0xee, 0x25, 0x89, 0xe1, 0x3f, 0x0c, 0xc8, 0xb6, 0x63,
                0x0c, 0xa6
            ]
        );
    }

    #[test]
    fn rounds_follow_key_size() {
        assert_eq!(RoundKeys::expand(&[0; 16]).unwrap().rounds(), 10);
        assert_eq!(RoundKeys::expand(&[0; 24]).unwrap().rounds(), 12);
        assert_eq!(RoundKeys::expand(&[0; 32]).unwrap().rounds(), 14);
        assert_eq!(
            RoundKeys::expand(&[0; 20]).err(),
            Some(Error::InvalidAesKeyLength(20))
        );
    }

    #[test]
    fn byte_and_word_layouts_agree() {
        let keys = RoundKeys::expand(&[0x5c; 24]).unwrap();
        let mut bytes = [0u8; 13 * 16];
        let mut words = [0u32; 13 * 4];
        for (i, key) in keys.as_blocks().iter().enumerate() {
            bytes[16 * i..16 * (i + 1)].copy_from_slice(key);
            for j in 0..4 {
                words[4 * i + j] = u32::from_be_bytes(key[4 * j..4 * j + 4].try_into().unwrap());
            }
        }
        let from_bytes = RoundKeys::from_bytes(&bytes).unwrap();
        let from_words = RoundKeys::from_words(&words).unwrap();
        assert_eq!(from_bytes.as_blocks(), keys.as_blocks());
        assert_eq!(from_words.as_blocks(), keys.as_blocks());
    }

    #[test]
    fn schedule_sizes_are_checked() {
        assert_eq!(
            RoundKeys::from_bytes(&[0; 12 * 16]).err(),
            Some(Error::InvalidRoundKeyCount(12))
        );
        assert_eq!(
            RoundKeys::from_bytes(&[0; 17]).err(),
            Some(Error::PartialBlock { len: 17, block: 16 })
        );
        assert_eq!(
            RoundKeys::from_words(&[0; 40]).err(),
            Some(Error::InvalidRoundKeyCount(10))
        );
    }
}

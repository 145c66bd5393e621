/*!
"So how does one crate push Poly1305, GHASH, AES and ChaCha20 through the same pipe?"
It doesn't, really. Each primitive keeps its own arithmetic, but they all share one idea:
**work on many blocks at once, and only fall back to one block at a time for what's left.**

Every engine is built from a per-batch kernel that is written once and instantiated for a
handful of fixed lane counts:

| engine   | one block | batched                                                 |
|----------|-----------|---------------------------------------------------------|
| Poly1305 | Horner    | 8 or 16 independent Horner chains stepping by `r^N`     |
| GHASH    | Horner    | superblocks of 8 or 48 blocks, one reduction each       |
| AES      | 1 lane    | 4, 8, 16 or 32 lanes sharing each round key             |
| ChaCha20 | 1 matrix  | 2 or 4 matrices, the 4-matrix one in SSE2/NEON          |

The lane arrays are plain fixed-size arrays, so the compiler is free to keep them in vector
registers. The only hand-vectorised code is the 4-block ChaCha20 machine (see the
`backends` module docs). Which lane count each engine uses is decided once, when the engine
is built, from the [`SimdWidth`] the CPU reports. Every constructor has a variant that takes
the lane count explicitly, and every lane count produces exactly the bytes the one-block path
would.

The process of authenticating a message with [`Poly1305`] looks like this:

1. The key is split into the multiplier `r` (clamped) and the pad `s`. `r` lives in three
44/44/42-bit limbs, together with `20 * r1` and `20 * r2` for the wrap-around terms.

2. Full blocks are buffered up and handed to the batched absorber. The first time it runs
it derives `r^2..r^16` and keeps them with the key.

3. Each lane absorbs every `N`-th block: `lane = lane * r^N + block`. At the end of the run
lane `j` is multiplied by `r^(N-j)` and the lanes are summed pairwise back into one
accumulator.

4. Whatever is left (less than `N` blocks, or a short final block padded with `0x01`) goes
through the one-block path, and the accumulator is fully reduced and added to `s`.

[`GHash`] and [`AesGcm`] follow the same shape with the powers of `H` and an unreduced
256-bit accumulator, and [`ChaCha20`] and [`aes::modes::Ctr`] simply buffer whatever part of
the last batch of keystream the caller didn't consume.

## Security

Tags are compared with `subtle`, and key material and keystream are wiped with `zeroize`
when they go out of scope. The AES and GF(2^8) code uses table lookups and is not hardened
against cache-timing attacks.
*/

#![no_std]

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod chacha_reference;

pub mod aes;
mod backends;
pub mod chacha;
pub mod error;
pub mod gcm;
pub mod ghash;
pub mod poly1305;
mod util;
pub mod width;

pub use aes::{Aes, AesLanes, RoundKeys};
pub use chacha::ChaCha20;
pub use error::{Error, Result};
pub use gcm::AesGcm;
pub use ghash::{FieldElement, GHash, HashKey};
pub use poly1305::{Poly1305, PolyLanes};
pub use util::{BLOCK_LEN, Block, CHACHA_BLOCK_LEN};
pub use width::SimdWidth;

#[cfg(test)]
mod tests {
    use super::backends::*;
    use super::chacha::{ChaCha20, State};
    use super::chacha_reference::ChaCha as ChaChaRef;
    use super::util::*;
    use std::vec;

    const TEST_COUNT: usize = 50;
    const TEST_LEN: usize = 16;

    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    #[test]
    fn chacha_neon() {
        test_machine::<neon::Matrix>();
    }

    #[cfg(all(
        any(target_arch = "x86_64", target_arch = "x86"),
        target_feature = "sse2"
    ))]
    #[test]
    fn chacha_sse2() {
        test_machine::<sse2::Matrix>();
    }

    #[test]
    fn chacha_soft_1() {
        test_machine::<soft::Matrix<1>>();
    }

    #[test]
    fn chacha_soft_2() {
        test_machine::<soft::Matrix<2>>();
    }

    #[test]
    fn chacha_soft_4() {
        test_machine::<soft::Matrix<4>>();
    }

    #[test]
    fn chacha_selected() {
        test_machine::<Matrix>();
    }

    fn random_state() -> [u32; CHACHA_SIZE] {
        let mut state = [0; CHACHA_SIZE];
        for word in state.iter_mut() {
            *word = getrandom::u32().unwrap();
        }
        state[..CHACHA_COLUMNS].copy_from_slice(&ROW_A);
        state
    }

    fn test_machine<M: Machine>() {
        for i in 0..TEST_COUNT {
            let mut state = random_state();
            // Only the 32-bit counter word wraps; the nonce word next to it must stay put.
            if i >= (TEST_COUNT / 2) {
                state[COUNTER_WORD] = u32::MAX - 5;
            }
            let mut machine = M::new(&state);
            let mut chacha_ref = ChaChaRef::from(state);

            let mut buf = vec![0; M::DEPTH * CHACHA_BLOCK_LEN];
            let mut buf_ref = vec![0; M::DEPTH * CHACHA_BLOCK_LEN];
            for _ in 0..TEST_LEN {
                machine.chacha(&mut buf);
                chacha_ref.fill(&mut buf_ref);
                assert_eq!(buf, buf_ref);
            }
        }
    }

    #[test]
    fn matches_rand_chacha() {
        use rand_chacha::ChaCha20Rng;
        use rand_chacha::rand_core::{RngCore, SeedableRng};

        // rand_chacha uses a 64-bit counter in words 12-13 and a 64-bit stream id in words
        // 14-15, which lines up with an IETF nonce whose first word is zero.
        for _ in 0..TEST_COUNT {
            let mut key = [0u8; 32];
            getrandom::fill(&mut key).unwrap();
            let stream = getrandom::u64().unwrap();
            let counter = getrandom::u32().unwrap() >> 1;
            let mut nonce = [0u8; 12];
            nonce[4..].copy_from_slice(&stream.to_le_bytes());

            let mut rng = ChaCha20Rng::from_seed(key);
            rng.set_stream(stream);
            rng.set_word_pos(u128::from(counter) * 16);
            let size = getrandom::u32().unwrap() as usize % 2000;
            let mut expected = vec![0u8; size];
            rng.fill_bytes(&mut expected);

            let mut buf = vec![0u8; size];
            ChaCha20::new(&key, &nonce, counter)
                .write_keystream(&mut buf)
                .unwrap();
            assert_eq!(buf, expected);

            let state = State::new(&key, &nonce, counter);
            assert_eq!(state.words()[COUNTER_WORD], counter);
        }
    }
}

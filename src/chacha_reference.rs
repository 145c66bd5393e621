//! Straight RFC 8439 ChaCha20, one block at a time. Only used to check the machines.

use crate::util::*;

#[inline]
fn quarter_round(x: &mut [u32; CHACHA_SIZE], a: usize, b: usize, c: usize, d: usize) {
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(16);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(12);
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(8);
    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(7);
}

pub struct ChaCha {
    state: [u32; CHACHA_SIZE],
}

impl From<[u32; CHACHA_SIZE]> for ChaCha {
    fn from(state: [u32; CHACHA_SIZE]) -> Self {
        Self { state }
    }
}

impl ChaCha {
    pub fn get_block(&mut self) -> [u8; CHACHA_BLOCK_LEN] {
        let mut x = self.state;
        for _ in 0..DOUBLE_ROUNDS {
            quarter_round(&mut x, 0, 4, 8, 12);
            quarter_round(&mut x, 1, 5, 9, 13);
            quarter_round(&mut x, 2, 6, 10, 14);
            quarter_round(&mut x, 3, 7, 11, 15);
            quarter_round(&mut x, 0, 5, 10, 15);
            quarter_round(&mut x, 1, 6, 11, 12);
            quarter_round(&mut x, 2, 7, 8, 13);
            quarter_round(&mut x, 3, 4, 9, 14);
        }
        let mut out = [0; CHACHA_BLOCK_LEN];
        for ((chunk, a), b) in out.chunks_exact_mut(4).zip(x).zip(self.state) {
            chunk.copy_from_slice(&a.wrapping_add(b).to_le_bytes());
        }
        self.state[COUNTER_WORD] = self.state[COUNTER_WORD].wrapping_add(1);
        out
    }

    pub fn fill(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(CHACHA_BLOCK_LEN) {
            let block = self.get_block();
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }
}

use crate::backends::{self, soft};
use crate::error::{Error, Result};
use crate::util::*;
use crate::width::SimdWidth;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
/// Largest batch any machine produces.
const MAX_DEPTH: usize = 4;
const BUF_LEN: usize = MAX_DEPTH * CHACHA_BLOCK_LEN;
/// One past the last usable value of the 32-bit block counter.
const COUNTER_LIMIT: u64 = 1 << 32;

/// The 16-word ChaCha20 input matrix.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct State {
    words: [u32; CHACHA_SIZE],
}

impl State {
    pub fn new(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], counter: u32) -> Self {
        let mut words = [0; CHACHA_SIZE];
        words[..CHACHA_COLUMNS].copy_from_slice(&ROW_A);
        for (word, chunk) in words[4..COUNTER_WORD].iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        words[COUNTER_WORD] = counter;
        for (word, chunk) in words[COUNTER_WORD + 1..].iter_mut().zip(nonce.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self { words }
    }

    pub fn from_slices(key: &[u8], nonce: &[u8], counter: u32) -> Result<Self> {
        let key: &[u8; KEY_LEN] = key.try_into().map_err(|_| Error::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        })?;
        let nonce: &[u8; NONCE_LEN] =
            nonce.try_into().map_err(|_| Error::InvalidNonceLength {
                expected: NONCE_LEN,
                actual: nonce.len(),
            })?;
        Ok(Self::new(key, nonce, counter))
    }

    /// Wraps a raw matrix. The first row is taken as given, so non-standard constants are
    /// the caller's business.
    pub fn from_words(words: [u32; CHACHA_SIZE]) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[u32; CHACHA_SIZE] {
        &self.words
    }

    pub fn counter(&self) -> u32 {
        self.words[COUNTER_WORD]
    }

    pub fn set_counter(&mut self, counter: u32) {
        self.words[COUNTER_WORD] = counter;
    }
}

/// Number of blocks a ChaCha20 call computes at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lanes {
    One,
    Two,
    Four,
}

impl Lanes {
    pub const ALL: [Lanes; 3] = [Self::One, Self::Two, Self::Four];

    pub const fn for_width(width: SimdWidth) -> Self {
        match width {
            SimdWidth::Scalar => Self::One,
            SimdWidth::W128 => Self::Two,
            SimdWidth::W256 | SimdWidth::W512 => Self::Four,
        }
    }

    pub const fn depth(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => MAX_DEPTH,
        }
    }
}

#[inline(always)]
fn run<M: Machine>(state: &[u32; CHACHA_SIZE], buf: &mut [u8]) {
    M::new(state).chacha(&mut buf[..M::DEPTH * CHACHA_BLOCK_LEN]);
}

/// Computes `lanes.depth()` consecutive blocks starting at the counter in `state` into the
/// front of `buf`.
#[inline(always)]
fn run_lanes(lanes: Lanes, state: &[u32; CHACHA_SIZE], buf: &mut [u8]) {
    match lanes {
        Lanes::One => run::<soft::Matrix<1>>(state, buf),
        Lanes::Two => run::<soft::Matrix<2>>(state, buf),
        Lanes::Four => run::<backends::Matrix>(state, buf),
    }
}

/// The ChaCha20 block function: one 64-byte keystream block for the counter in `state`.
pub fn block(state: &State) -> [u8; CHACHA_BLOCK_LEN] {
    let mut out = [0; CHACHA_BLOCK_LEN];
    run_lanes(Lanes::One, &state.words, &mut out);
    out
}

/// Fills `out` (a whole number of blocks) with keystream and advances the counter in `state`
/// past the blocks written. Fails without touching anything if that would run the 32-bit
/// counter past its last value.
pub fn keystream_blocks(lanes: Lanes, state: &mut State, out: &mut [u8]) -> Result<()> {
    if out.len() % CHACHA_BLOCK_LEN != 0 {
        return Err(Error::PartialBlock {
            len: out.len(),
            block: CHACHA_BLOCK_LEN,
        });
    }
    let blocks = (out.len() / CHACHA_BLOCK_LEN) as u64;
    if u64::from(state.counter()) + blocks > COUNTER_LIMIT {
        return Err(Error::CounterOverflow);
    }

    let batch = lanes.depth() * CHACHA_BLOCK_LEN;
    let mut chunks = out.chunks_exact_mut(batch);
    for chunk in &mut chunks {
        run_lanes(lanes, &state.words, chunk);
        state.words[COUNTER_WORD] = state.words[COUNTER_WORD].wrapping_add(lanes.depth() as u32);
    }
    for chunk in chunks.into_remainder().chunks_exact_mut(CHACHA_BLOCK_LEN) {
        run_lanes(Lanes::One, &state.words, chunk);
        state.words[COUNTER_WORD] = state.words[COUNTER_WORD].wrapping_add(1);
    }
    Ok(())
}

/// ChaCha20 stream cipher keeping unused keystream between calls.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ChaCha20 {
    state: State,
    #[zeroize(skip)]
    lanes: Lanes,
    /// Absolute counter value of the next block to compute.
    next_block: u64,
    buffer: [u8; BUF_LEN],
    buffer_pos: usize,
    buffer_len: usize,
}

impl ChaCha20 {
    pub fn new(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], counter: u32) -> Self {
        Self::with_lanes(
            State::new(key, nonce, counter),
            Lanes::for_width(SimdWidth::detect()),
        )
    }

    pub fn new_from_slices(key: &[u8], nonce: &[u8], counter: u32) -> Result<Self> {
        Ok(Self::with_lanes(
            State::from_slices(key, nonce, counter)?,
            Lanes::for_width(SimdWidth::detect()),
        ))
    }

    pub fn with_lanes(state: State, lanes: Lanes) -> Self {
        log::trace!("chacha20: {} block(s) per call", lanes.depth());
        let next_block = u64::from(state.counter());
        Self {
            state,
            lanes,
            next_block,
            buffer: [0; BUF_LEN],
            buffer_pos: 0,
            buffer_len: 0,
        }
    }

    pub fn lanes(&self) -> Lanes {
        self.lanes
    }

    /// Xors keystream into `data`. Either the whole slice is processed or, when the block
    /// counter would be exhausted, nothing is.
    pub fn apply_keystream(&mut self, data: &mut [u8]) -> Result<()> {
        let buffered = self.buffer_len - self.buffer_pos;
        let needed = data.len().saturating_sub(buffered).div_ceil(CHACHA_BLOCK_LEN) as u64;
        if self.next_block + needed > COUNTER_LIMIT {
            return Err(Error::CounterOverflow);
        }

        let mut data = data;
        while !data.is_empty() {
            if self.buffer_pos == self.buffer_len {
                self.refill();
            }
            let available = &self.buffer[self.buffer_pos..self.buffer_len];
            let take = available.len().min(data.len());
            let (head, rest) = data.split_at_mut(take);
            xor_in_place(head, available);
            self.buffer_pos += take;
            data = rest;
        }
        Ok(())
    }

    /// Overwrites `out` with raw keystream.
    pub fn write_keystream(&mut self, out: &mut [u8]) -> Result<()> {
        out.fill(0);
        self.apply_keystream(out)
    }

    fn refill(&mut self) {
        debug_assert!(self.next_block < COUNTER_LIMIT);
        self.state.set_counter(self.next_block as u32);
        run_lanes(self.lanes, &self.state.words, &mut self.buffer);
        // Blocks computed past the end of the counter space wrapped around and must
        // never be handed out.
        let usable = (self.lanes.depth() as u64).min(COUNTER_LIMIT - self.next_block);
        self.next_block += usable;
        self.buffer_pos = 0;
        self.buffer_len = usable as usize * CHACHA_BLOCK_LEN;
    }
}

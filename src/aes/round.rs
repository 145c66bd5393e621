//! The AES round function over `N` independent blocks.
//!
//! Blocks are kept in the FIPS-197 byte order, which is column-major: byte `r + 4c` is row
//! `r` of column `c`. Every step loops over the lanes with the same round key so the compiler
//! can keep the lanes side by side in vector registers.

use super::keys::RoundKeys;
use super::sbox::{INV_SBOX, SBOX};
use crate::util::{Block, xor_block};

#[inline(always)]
const fn xtime(b: u8) -> u8 {
    (b << 1) ^ (((b >> 7) & 1) * 0x1b)
}

#[inline(always)]
fn mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    product
}

#[inline(always)]
fn sub_bytes(state: &mut Block, table: &[u8; 256]) {
    for byte in state.iter_mut() {
        *byte = table[*byte as usize];
    }
}

/// Row `r` rotates left by `r` columns.
#[inline(always)]
fn shift_rows(state: &mut Block) {
    let old = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[r + 4 * c] = old[r + 4 * ((c + r) % 4)];
        }
    }
}

#[inline(always)]
fn inv_shift_rows(state: &mut Block) {
    let old = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[r + 4 * ((c + r) % 4)] = old[r + 4 * c];
        }
    }
}

#[inline(always)]
fn mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [column[0], column[1], column[2], column[3]];
        let all = a0 ^ a1 ^ a2 ^ a3;
        column[0] ^= all ^ xtime(a0 ^ a1);
        column[1] ^= all ^ xtime(a1 ^ a2);
        column[2] ^= all ^ xtime(a2 ^ a3);
        column[3] ^= all ^ xtime(a3 ^ a0);
    }
}

#[inline(always)]
fn inv_mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [column[0], column[1], column[2], column[3]];
        column[0] = mul(a0, 14) ^ mul(a1, 11) ^ mul(a2, 13) ^ mul(a3, 9);
        column[1] = mul(a0, 9) ^ mul(a1, 14) ^ mul(a2, 11) ^ mul(a3, 13);
        column[2] = mul(a0, 13) ^ mul(a1, 9) ^ mul(a2, 14) ^ mul(a3, 11);
        column[3] = mul(a0, 11) ^ mul(a1, 13) ^ mul(a2, 9) ^ mul(a3, 14);
    }
}

/// Encrypts `N` blocks in place.
#[inline]
pub(crate) fn encrypt_lanes<const N: usize>(keys: &RoundKeys, lanes: &mut [Block; N]) {
    let rounds = keys.rounds();
    for lane in lanes.iter_mut() {
        xor_block(lane, keys.round_key(0));
    }
    for round in 1..rounds {
        let key = keys.round_key(round);
        for lane in lanes.iter_mut() {
            sub_bytes(lane, &SBOX);
            shift_rows(lane);
            mix_columns(lane);
            xor_block(lane, key);
        }
    }
    let key = keys.round_key(rounds);
    for lane in lanes.iter_mut() {
        sub_bytes(lane, &SBOX);
        shift_rows(lane);
        xor_block(lane, key);
    }
}

/// Decrypts `N` blocks in place with the inverse cipher on the encryption schedule.
#[inline]
pub(crate) fn decrypt_lanes<const N: usize>(keys: &RoundKeys, lanes: &mut [Block; N]) {
    let rounds = keys.rounds();
    for lane in lanes.iter_mut() {
        xor_block(lane, keys.round_key(rounds));
    }
    for round in (1..rounds).rev() {
        let key = keys.round_key(round);
        for lane in lanes.iter_mut() {
            inv_shift_rows(lane);
            sub_bytes(lane, &INV_SBOX);
            xor_block(lane, key);
            inv_mix_columns(lane);
        }
    }
    let key = keys.round_key(0);
    for lane in lanes.iter_mut() {
        inv_shift_rows(lane);
        sub_bytes(lane, &INV_SBOX);
        xor_block(lane, key);
    }
}

use crate::util::*;
use core::ops::Add;

/// Portable machine holding `N` ChaCha matrices side by side. Every operation walks the
/// matrices in lockstep so the compiler can turn the inner loops into vector code.
#[derive(Clone)]
#[repr(C)]
pub struct Matrix<const N: usize> {
    state: [[u32; CHACHA_SIZE]; N],
}

impl<const N: usize> Add for Matrix<N> {
    type Output = Self;

    #[inline]
    fn add(mut self, rhs: Self) -> Self::Output {
        for (lhs, rhs) in self.state.iter_mut().zip(rhs.state.iter()) {
            for (a, b) in lhs.iter_mut().zip(rhs.iter()) {
                *a = a.wrapping_add(*b);
            }
        }
        self
    }
}

impl<const N: usize> Matrix<N> {
    #[inline]
    fn quarter_round(&mut self, a: usize, b: usize, c: usize, d: usize) {
        for matrix in self.state.iter_mut() {
            matrix[a] = matrix[a].wrapping_add(matrix[b]);
            matrix[d] ^= matrix[a];
            matrix[d] = matrix[d].rotate_left(16);

            matrix[c] = matrix[c].wrapping_add(matrix[d]);
            matrix[b] ^= matrix[c];
            matrix[b] = matrix[b].rotate_left(12);

            matrix[a] = matrix[a].wrapping_add(matrix[b]);
            matrix[d] ^= matrix[a];
            matrix[d] = matrix[d].rotate_left(8);

            matrix[c] = matrix[c].wrapping_add(matrix[d]);
            matrix[b] ^= matrix[c];
            matrix[b] = matrix[b].rotate_left(7);
        }
    }
}

impl<const N: usize> Machine for Matrix<N> {
    const DEPTH: usize = N;

    #[inline]
    fn new(state: &[u32; CHACHA_SIZE]) -> Self {
        let mut result = Matrix { state: [*state; N] };
        for (i, matrix) in result.state.iter_mut().enumerate() {
            matrix[COUNTER_WORD] = matrix[COUNTER_WORD].wrapping_add(i as u32);
        }
        result
    }

    #[inline]
    fn increment(&mut self) {
        for matrix in self.state.iter_mut() {
            matrix[COUNTER_WORD] = matrix[COUNTER_WORD].wrapping_add(N as u32);
        }
    }

    #[inline]
    fn double_round(&mut self) {
        // Column rounds
        self.quarter_round(0, 4, 8, 12);
        self.quarter_round(1, 5, 9, 13);
        self.quarter_round(2, 6, 10, 14);
        self.quarter_round(3, 7, 11, 15);
        // Diagonal rounds
        self.quarter_round(0, 5, 10, 15);
        self.quarter_round(1, 6, 11, 12);
        self.quarter_round(2, 7, 8, 13);
        self.quarter_round(3, 4, 9, 14);
    }

    #[inline]
    fn fetch_result(self, buf: &mut [u8]) {
        let words = self.state.iter().flat_map(|matrix| matrix.iter());
        for (chunk, word) in buf.chunks_exact_mut(size_of::<u32>()).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }
}

use crate::util::*;
use core::arch::aarch64::*;
use core::ops::Add;

const DEPTH: usize = 4;

/// Four ChaCha matrices, one `uint32x4_t` per row.
#[derive(Clone)]
#[repr(C)]
pub struct Matrix {
    state: [[uint32x4_t; CHACHA_ROWS]; DEPTH],
}

impl Add for Matrix {
    type Output = Self;

    #[inline]
    fn add(mut self, rhs: Self) -> Self::Output {
        unsafe {
            for i in 0..self.state.len() {
                for j in 0..self.state[i].len() {
                    self.state[i][j] = vaddq_u32(self.state[i][j], rhs.state[i][j]);
                }
            }
            self
        }
    }
}

macro_rules! rotate_left_epi32 {
    ($value:expr, $LEFT_SHIFT:expr) => {{
        const RIGHT_SHIFT: i32 = 32 - $LEFT_SHIFT;
        let left_shift = vshlq_n_u32($value, $LEFT_SHIFT);
        let right_shift = vshrq_n_u32($value, RIGHT_SHIFT);
        vorrq_u32(left_shift, right_shift)
    }};
}

impl Matrix {
    #[inline]
    fn quarter_round(&mut self) {
        unsafe {
            for [a, b, c, d] in self.state.iter_mut() {
                *a = vaddq_u32(*a, *b);
                *d = veorq_u32(*d, *a);
                *d = rotate_left_epi32!(*d, 16);

                *c = vaddq_u32(*c, *d);
                *b = veorq_u32(*b, *c);
                *b = rotate_left_epi32!(*b, 12);

                *a = vaddq_u32(*a, *b);
                *d = veorq_u32(*d, *a);
                *d = rotate_left_epi32!(*d, 8);

                *c = vaddq_u32(*c, *d);
                *b = veorq_u32(*b, *c);
                *b = rotate_left_epi32!(*b, 7);
            }
        }
    }

    #[inline]
    fn make_diagonal(&mut self) {
        unsafe {
            for [a, _, c, d] in self.state.iter_mut() {
                *a = vextq_u32(*a, *a, 3);
                *c = vextq_u32(*c, *c, 1);
                *d = vextq_u32(*d, *d, 2);
            }
        }
    }

    #[inline]
    fn unmake_diagonal(&mut self) {
        unsafe {
            for [a, _, c, d] in self.state.iter_mut() {
                *c = vextq_u32(*c, *c, 3);
                *d = vextq_u32(*d, *d, 2);
                *a = vextq_u32(*a, *a, 1);
            }
        }
    }
}

impl Machine for Matrix {
    const DEPTH: usize = DEPTH;

    #[inline]
    fn new(state: &[u32; CHACHA_SIZE]) -> Self {
        unsafe {
            let row = |i: usize| vld1q_u32(state[i * CHACHA_COLUMNS..].as_ptr());
            let rows = [row(0), row(1), row(2), row(3)];
            let mut result = Matrix {
                state: [rows; DEPTH],
            };
            for (i, matrix) in result.state.iter_mut().enumerate() {
                matrix[3] = vaddq_u32(
                    matrix[3],
                    vcombine_u32(vcreate_u32(i as u64), vcreate_u32(0)),
                );
            }
            result
        }
    }

    #[inline]
    fn increment(&mut self) {
        unsafe {
            let increment = vcombine_u32(vcreate_u32(DEPTH as u64), vcreate_u32(0));
            for matrix in self.state.iter_mut() {
                matrix[3] = vaddq_u32(matrix[3], increment);
            }
        }
    }

    #[inline]
    fn double_round(&mut self) {
        // Column rounds
        self.quarter_round();
        // Diagonal rounds
        self.make_diagonal();
        self.quarter_round();
        self.unmake_diagonal();
    }

    #[inline]
    fn fetch_result(self, buf: &mut [u8]) {
        let rows = self.state.iter().flat_map(|matrix| matrix.iter());
        for (chunk, row) in buf.chunks_exact_mut(size_of::<uint32x4_t>()).zip(rows) {
            unsafe { vst1q_u8(chunk.as_mut_ptr(), vreinterpretq_u8_u32(*row)) };
        }
    }
}

/*!
Capability probe used to pick a batch width for each engine.

Every engine is written once per lane count and the lane arrays are left for the compiler to
vectorise, so any width runs correctly on any host. The probe only decides which width is
*worth* running: wider batches amortise more per-block overhead but cost more setup (power
tables, lane folds), which only pays off when the hardware can keep the lanes in registers.
*/

use core::fmt;

/// Widest data-parallel register file the host offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimdWidth {
    /// No usable vector unit, every engine runs its one-block path.
    Scalar,
    /// 128-bit vectors (SSE2, NEON).
    W128,
    /// 256-bit vectors (AVX2).
    W256,
    /// 512-bit vectors (AVX-512 F/VL/BW).
    W512,
}

impl SimdWidth {
    pub const ALL: [SimdWidth; 4] = [Self::Scalar, Self::W128, Self::W256, Self::W512];

    /// Probes the running CPU.
    ///
    /// `cpufeatures` caches the cpuid result, so calling this repeatedly is cheap, but
    /// engines still call it once at construction and keep the answer.
    pub fn detect() -> Self {
        let width = probe();
        log::debug!("detected {} SIMD width", width);
        width
    }

    /// Register width in bits, `0` for [`SimdWidth::Scalar`].
    pub const fn bits(self) -> usize {
        match self {
            Self::Scalar => 0,
            Self::W128 => 128,
            Self::W256 => 256,
            Self::W512 => 512,
        }
    }
}

impl fmt::Display for SimdWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("scalar"),
            width => write!(f, "{}-bit", width.bits()),
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(any(target_arch = "x86_64", target_arch = "x86"))] {
        cpufeatures::new!(avx512_cpuid, "avx512f", "avx512vl", "avx512bw");
        cpufeatures::new!(avx2_cpuid, "avx2");
        cpufeatures::new!(sse2_cpuid, "sse2");

        fn probe() -> SimdWidth {
            if avx512_cpuid::get() {
                SimdWidth::W512
            } else if avx2_cpuid::get() {
                SimdWidth::W256
            } else if sse2_cpuid::get() {
                SimdWidth::W128
            } else {
                SimdWidth::Scalar
            }
        }
    } else if #[cfg(any(target_arch = "aarch64", target_arch = "arm64ec"))] {
        fn probe() -> SimdWidth {
            // neon is a baseline feature of arm64
            if cfg!(target_feature = "neon") {
                SimdWidth::W128
            } else {
                SimdWidth::Scalar
            }
        }
    } else {
        fn probe() -> SimdWidth {
            SimdWidth::Scalar
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn ordering_follows_register_width() {
        for pair in SimdWidth::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].bits() < pair[1].bits());
        }
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", SimdWidth::Scalar), "scalar");
        assert_eq!(format!("{}", SimdWidth::W256), "256-bit");
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn x86_64_always_has_sse2() {
        assert!(SimdWidth::detect() >= SimdWidth::W128);
    }
}

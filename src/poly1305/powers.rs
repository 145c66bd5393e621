use super::limbs::Multiplier;
use zeroize::Zeroize;

/// Highest power of `r` any lane count needs.
pub(crate) const MAX_POWER: usize = 16;

/// `r^1 ..= r^16`, computed the first time a batched path runs.
#[derive(Debug, Clone, Default)]
pub(crate) enum PowerTable {
    #[default]
    Uninitialized,
    Ready([Multiplier; MAX_POWER]),
}

impl PowerTable {
    /// Computes the table unless it is already there. Returns the powers either way.
    pub(crate) fn generate(&mut self, r: &Multiplier) -> &[Multiplier; MAX_POWER] {
        if let Self::Uninitialized = self {
            log::trace!("poly1305: deriving r^2..r^{}", MAX_POWER);
            let mut powers = [*r; MAX_POWER];
            for i in 1..MAX_POWER {
                powers[i] = powers[i - 1].mul(r);
            }
            *self = Self::Ready(powers);
            powers.zeroize();
        }
        match self {
            Self::Ready(powers) => powers,
            Self::Uninitialized => unreachable!("power table was just generated"),
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl Zeroize for PowerTable {
    fn zeroize(&mut self) {
        if let Self::Ready(powers) = self {
            powers.zeroize();
        }
        *self = Self::Uninitialized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_idempotent() {
        let r = Multiplier::clamp(&[0x5a; 16]);
        let mut table = PowerTable::default();
        assert!(!table.is_ready());
        let first = *table.generate(&r);
        assert!(table.is_ready());
        let second = *table.generate(&r);
        assert_eq!(first, second);
        assert_eq!(first[0], r);
        assert_eq!(first[1], r.mul(&r));

        table.zeroize();
        assert!(!table.is_ready());
    }
}

use super::field::FieldElement;
use crate::util::Block;
use crate::width::SimdWidth;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Largest table any path uses.
pub const MAX_POWERS: usize = 48;

/// How many powers of `H` a pass over the message needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableSize {
    One,
    Eight,
    FortyEight,
}

impl TableSize {
    pub const ALL: [TableSize; 3] = [Self::One, Self::Eight, Self::FortyEight];

    pub const fn len(self) -> usize {
        match self {
            Self::One => 1,
            Self::Eight => 8,
            Self::FortyEight => MAX_POWERS,
        }
    }

    /// Largest table the width can make use of.
    pub const fn for_width(width: SimdWidth) -> Self {
        match width {
            SimdWidth::Scalar => Self::One,
            SimdWidth::W128 | SimdWidth::W256 => Self::Eight,
            SimdWidth::W512 => Self::FortyEight,
        }
    }

    /// Largest table worth building for a message of `blocks` full blocks: never larger than
    /// the message itself.
    pub fn for_message(width: SimdWidth, blocks: usize) -> Self {
        let cap = Self::for_width(width);
        Self::ALL
            .into_iter()
            .rev()
            .find(|size| *size <= cap && size.len() <= blocks)
            .unwrap_or(Self::One)
    }
}

#[derive(Clone)]
enum HTable {
    Uninitialized,
    /// `powers[i] = H^(i + 1)` for `i < len`.
    Ready {
        powers: [FieldElement; MAX_POWERS],
        len: usize,
    },
}

impl Zeroize for HTable {
    fn zeroize(&mut self) {
        if let Self::Ready { powers, len } = self {
            powers.zeroize();
            len.zeroize();
        }
        *self = Self::Uninitialized;
    }
}

/// The hash subkey `H` and its lazily computed powers.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HashKey {
    h: FieldElement,
    table: HTable,
}

impl HashKey {
    pub fn new(h: &Block) -> Self {
        Self {
            h: FieldElement::from_bytes(h),
            table: HTable::Uninitialized,
        }
    }

    pub fn h(&self) -> FieldElement {
        self.h
    }

    /// Number of powers computed so far.
    pub fn table_len(&self) -> usize {
        match &self.table {
            HTable::Uninitialized => 0,
            HTable::Ready { len, .. } => *len,
        }
    }

    /// Makes sure `H^1..=H^size` are available and returns every power computed so far.
    ///
    /// Asking for a size that is already covered does nothing. A larger size extends the
    /// existing table with the same sequence of multiplications a fresh table would use.
    pub fn generate_table(&mut self, size: TableSize) -> &[FieldElement] {
        let want = size.len();
        let h = self.h;
        if let HTable::Uninitialized = self.table {
            let mut powers = [FieldElement::ZERO; MAX_POWERS];
            powers[0] = h;
            self.table = HTable::Ready { powers, len: 1 };
        }
        match &mut self.table {
            HTable::Ready { powers, len } => {
                if *len < want {
                    log::trace!("ghash: extending H table from {} to {} powers", len, want);
                    for i in *len..want {
                        powers[i] = powers[i - 1].mul(h);
                    }
                    *len = want;
                }
                &powers[..*len]
            }
            HTable::Uninitialized => &[],
        }
    }
}

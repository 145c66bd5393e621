//! Error type shared by every engine's public boundary.

/// Contract violations detected at the public API boundary.
///
/// None of these are produced by the arithmetic itself. Internal helpers assume
/// validated input and never construct an `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid AES key length: {0} bytes (expected 16, 24 or 32)")]
    InvalidAesKeyLength(usize),

    #[error("invalid AES key schedule: {0} round keys (expected 11, 13 or 15)")]
    InvalidRoundKeyCount(usize),

    #[error("invalid nonce length: expected {expected} bytes, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    #[error("invalid tag length: expected {expected} bytes, got {actual}")]
    InvalidTagLength { expected: usize, actual: usize },

    #[error("length {len} is not a multiple of the {block}-byte block size")]
    PartialBlock { len: usize, block: usize },

    #[error("output length {output} does not match input length {input}")]
    LengthMismatch { input: usize, output: usize },

    #[error("block counter exhausted for this key and nonce")]
    CounterOverflow,

    #[error("authentication failed: tag mismatch")]
    AuthenticationFailed,
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn messages_carry_the_offending_sizes() {
        let err = Error::InvalidKeyLength {
            expected: 32,
            actual: 31,
        };
        assert_eq!(
            err.to_string(),
            "invalid key length: expected 32 bytes, got 31"
        );
        assert_eq!(
            Error::PartialBlock { len: 17, block: 16 }.to_string(),
            "length 17 is not a multiple of the 16-byte block size"
        );
        assert_eq!(
            Error::InvalidRoundKeyCount(12).to_string(),
            "invalid AES key schedule: 12 round keys (expected 11, 13 or 15)"
        );
    }
}

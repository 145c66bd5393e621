/*!
ChaCha20 machines. Only explicitly re-exports the best four-block implementation available as
`Matrix` for the rest of the crate, but still enables whatever other modules are available on
the target system. This is done for testing purposes: every machine is checked against the
same reference.

A ChaCha20 instance holds 16 32-bit words in the form of a 4-by-4 matrix, in the layout
standardised by the IETF (RFC 8439): four constant words, eight key words, one 32-bit block
counter and three nonce words.

```text
"expa"   "nd 3"   "2-by"   "te k"
Key      Key      Key      Key
Key      Key      Key      Key
Counter  Nonce    Nonce    Nonce
```

The soft machine is the reference algorithm batched over `N` matrices so the compiler can
auto-vectorise the rounds; it provides the one- and two-block variants everywhere and the
four-block variant on targets without a hand-vectorised machine.

The vectorized machines work on whole rows instead of individual words. Before each
"diagonal" round, the rows are rotated so the diagonal lines up as a column, the same
column round runs again, and the rotation is undone afterwards.
*/

pub mod soft;

cfg_if::cfg_if! {
    if #[cfg(all(any(target_arch = "x86_64", target_arch = "x86"), target_feature = "sse2"))] {
        pub mod sse2;
        pub use sse2::Matrix;
    } else if #[cfg(all(target_arch = "aarch64", target_feature = "neon"))] {
        pub mod neon;
        pub use neon::Matrix;
    } else {
        pub type Matrix = soft::Matrix<4>;
    }
}

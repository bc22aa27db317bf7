//! The [AES-SIV][1] [Authenticated Encryption with Associated Data (AEAD)][2]
//! cipher, RFC 5297.
//!
//! SIV is deterministic and nonce-misuse resistant: the initialization
//! vector is synthesized from the key, the associated data and the
//! plaintext itself, so a repeated (or absent) nonce degrades security no
//! further than revealing that two identical messages are identical. The
//! whole stack is built here from first principles: table-driven AES,
//! CMAC/OMAC, the S2V string-to-vector PRF, and CTR, each usable and
//! testable on its own.
//!
//! ## Security Notes
//!
//! This crate has *NOT* received any security audit.
//!
//! The AES round function is table-driven and therefore not constant-time
//! with respect to cache timing. Tag verification and the underlying
//! equality primitive are constant-time, and plaintext from a failed
//! decryption is wiped, never returned.
//!
//! **USE AT YOUR OWN RISK.**
//!
//! # Usage
//! ```
//! use siv::Siv;
//!
//! # fn main() -> Result<(), siv::Error> {
//! let key = [0x01u8; 32]; // 32, 48 or 64 bytes
//! let cipher = Siv::new(&key)?;
//!
//! let ad: [&[u8]; 2] = [b"header", b"nonce-0001"];
//! let sealed = cipher.encrypt(&ad, b"plaintext message");
//!
//! let opened = cipher.decrypt(&ad, &sealed)?; // NOTE: handle this error to avoid accepting forgeries!
//! assert_eq!(opened, b"plaintext message");
//! # Ok(())
//! # }
//! ```
//!
//! The associated-data vector is ordered and may be empty; by RFC 5297
//! convention a nonce, when used, goes last.
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc5297
//! [2]: https://en.wikipedia.org/wiki/Authenticated_encryption

pub mod aes;
pub mod block;
pub mod cmac;
pub mod ctr;
pub mod gf128;
pub mod s2v;
pub mod siv;

pub use crate::aes::{Aes, BlockCipher, BLOCK_SIZE};
pub use crate::block::ByteBlock;
pub use crate::cmac::{Cmac, Variant};
pub use crate::ctr::Ctr;
pub use crate::s2v::S2v;
pub use crate::siv::{Siv, TAG_SIZE};

/// Everything that can go wrong at this crate's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// SIV keys are 32, 48 or 64 bytes; AES keys 16, 24 or 32.
    #[error("invalid key length")]
    InvalidKeyLength,
    /// Decryption input too short to contain the 16-byte tag.
    #[error("input shorter than the tag")]
    InputTooShort,
    /// The recomputed tag does not match; the input is not authentic.
    #[error("authentication failed")]
    AuthenticationFailed,
    /// Hex input with an odd length or a non-hex digit.
    #[error("malformed hex")]
    MalformedHex,
}

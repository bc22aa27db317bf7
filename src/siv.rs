//! The SIV AEAD (RFC 5297): deterministic, nonce-misuse resistant
//! authenticated encryption with a vector of associated-data strings.
//!
//! The input key splits into equal halves: the first keys S2V, the second
//! keys CTR. S2V collapses the associated data and the plaintext into a
//! synthetic IV `V` that doubles as the authentication tag; two bits of a
//! copy of `V` are masked off to form the CTR counter so the 32-bit word
//! increment cannot carry across word boundaries. Output is `V || C`.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::aes::Aes;
use crate::block::ByteBlock;
use crate::ctr::Ctr;
use crate::gf128;
use crate::s2v::S2v;
use crate::Error;

/// Length in bytes of the tag prepended to every ciphertext.
pub const TAG_SIZE: usize = 16;

/// An AES-SIV key: both subkeys expanded, reusable across messages.
#[derive(Clone)]
pub struct Siv {
    s2v: S2v,
    ctr: Aes,
}

impl Siv {
    /// Accepts a 32-, 48- or 64-byte key (AES-128, -192 or -256 for both
    /// halves).
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        if !matches!(key.len(), 32 | 48 | 64) {
            return Err(Error::InvalidKeyLength);
        }
        let (s2v_key, ctr_key) = key.split_at(key.len() / 2);
        Ok(Self {
            s2v: S2v::new(s2v_key)?,
            ctr: Aes::encryptor(ctr_key)?,
        })
    }

    /// Encrypts and authenticates `plaintext` together with the ordered
    /// associated-data vector. Returns `tag(16) || ciphertext(|plaintext|)`.
    ///
    /// Deterministic: identical inputs produce identical output. Include a
    /// nonce as the last associated-data string for semantic security.
    pub fn encrypt<A: AsRef<[u8]>>(&self, ad: &[A], plaintext: &[u8]) -> Vec<u8> {
        let mut s2v = self.s2v.clone();
        for s in ad {
            s2v.update_aad(s.as_ref());
        }
        s2v.update(plaintext);
        let mut v = s2v.finalize();

        let mut ciphertext = ByteBlock::from_bytes(plaintext);
        Ctr::new(&self.ctr, &counter_from_tag(&v)).apply_keystream(&mut ciphertext);

        v.concat(&ciphertext);
        v.to_bytes()
    }

    /// Verifies and decrypts `tag || ciphertext`. The plaintext is only
    /// released when the recomputed tag matches; on mismatch the candidate
    /// plaintext is wiped and [`Error::AuthenticationFailed`] is returned.
    pub fn decrypt<A: AsRef<[u8]>>(&self, ad: &[A], input: &[u8]) -> Result<Vec<u8>, Error> {
        if input.len() < TAG_SIZE {
            return Err(Error::InputTooShort);
        }
        let (tag, ciphertext) = input.split_at(TAG_SIZE);
        let v = ByteBlock::from_bytes(tag);

        let mut plaintext = ByteBlock::from_bytes(ciphertext);
        Ctr::new(&self.ctr, &counter_from_tag(&v)).apply_keystream(&mut plaintext);

        let mut s2v = self.s2v.clone();
        for s in ad {
            s2v.update_aad(s.as_ref());
        }
        s2v.update_block(&plaintext);
        let expected = s2v.finalize();

        if bool::from(v.ct_eq(&expected)) {
            Ok(plaintext.to_bytes())
        } else {
            plaintext.zeroize();
            Err(Error::AuthenticationFailed)
        }
    }
}

/// Masks the tag into the initial CTR counter: `Q = V AND nonMSB`.
fn counter_from_tag(v: &ByteBlock) -> ByteBlock {
    let mut q = v.clone();
    q.bitand(&gf128::NON_MSB);
    q
}

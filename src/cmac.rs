//! CMAC (OMAC1) and OMAC2 over a [`BlockCipher`].
//!
//! Subkeys come from `L = E_K(0^128)` by GF(2^128) doubling; OMAC2 derives
//! its second subkey by halving instead. The streaming update chains a
//! block only while strictly more than one block is buffered, so the final
//! block is still uncommitted when finalization picks its subkey.

use zeroize::Zeroize;

use crate::aes::{Aes, BlockCipher, BLOCK_SIZE};
use crate::block::ByteBlock;
use crate::gf128;
use crate::Error;

/// Second-subkey derivation flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// `K2 = dbl(K1)` (RFC 4493 CMAC).
    Omac1,
    /// `K2 = inv(L)`.
    Omac2,
}

/// A one-key block cipher MAC with a 16-byte output.
#[derive(Clone)]
pub struct Cmac<C: BlockCipher> {
    cipher: C,
    k1: ByteBlock,
    k2: ByteBlock,
    x: ByteBlock,
    buffer: ByteBlock,
}

impl Cmac<Aes> {
    /// AES-CMAC with a 16-, 24- or 32-byte key.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        Ok(Self::from_cipher(Aes::encryptor(key)?, Variant::Omac1))
    }

    /// The OMAC2 flavour over AES.
    pub fn new_omac2(key: &[u8]) -> Result<Self, Error> {
        Ok(Self::from_cipher(Aes::encryptor(key)?, Variant::Omac2))
    }
}

impl<C: BlockCipher> Cmac<C> {
    /// Builds the MAC around an existing cipher, deriving both subkeys.
    pub fn from_cipher(cipher: C, variant: Variant) -> Self {
        let mut l = gf128::ZERO.clone();
        cipher.encrypt_block(l.words_mut(), 0);

        let mut k1 = l.clone();
        gf128::dbl(&mut k1);
        let k2 = match variant {
            Variant::Omac1 => {
                let mut k2 = k1.clone();
                gf128::dbl(&mut k2);
                k2
            }
            Variant::Omac2 => {
                let mut k2 = l.clone();
                gf128::inv(&mut k2);
                k2
            }
        };
        l.zeroize();

        Self {
            cipher,
            k1,
            k2,
            x: gf128::ZERO.clone(),
            buffer: ByteBlock::new(),
        }
    }

    /// Absorbs message bytes.
    pub fn update(&mut self, msg: &[u8]) -> &mut Self {
        self.absorb(&ByteBlock::from_bytes(msg));
        self
    }

    /// Absorbs an already-packed buffer.
    pub(crate) fn absorb(&mut self, msg: &ByteBlock) {
        self.buffer.concat(msg);
        // Chain every block except a possibly-final one; the last block is
        // only committed once finalize can pick the right subkey for it.
        while self.buffer.len() > BLOCK_SIZE {
            let m = self.buffer.shift_bytes(BLOCK_SIZE);
            self.x.xor(&m);
            self.cipher.encrypt_block(self.x.words_mut(), 0);
        }
    }

    /// Produces the 16-byte tag and resets for the next message.
    pub fn finalize(&mut self) -> ByteBlock {
        let mut last = std::mem::take(&mut self.buffer);
        if last.len() == BLOCK_SIZE {
            last.xor(&self.k1);
        } else {
            last.pad_one_zero(BLOCK_SIZE);
            last.xor(&self.k2);
        }
        last.xor(&self.x);
        self.cipher.encrypt_block(last.words_mut(), 0);
        self.reset();
        last
    }

    /// Discards any buffered input and chaining state.
    pub fn reset(&mut self) {
        self.x = gf128::ZERO.clone();
        self.buffer = ByteBlock::new();
    }

    /// One-shot MAC: reset, absorb, finalize.
    pub fn digest(&mut self, msg: &[u8]) -> ByteBlock {
        self.reset();
        self.update(msg);
        self.finalize()
    }

    pub(crate) fn digest_block(&mut self, msg: &ByteBlock) -> ByteBlock {
        self.reset();
        self.absorb(msg);
        self.finalize()
    }
}

impl<C: BlockCipher> Drop for Cmac<C> {
    fn drop(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
        self.x.zeroize();
        self.buffer.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4493 section 4 examples.
    const KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const MSG64: &str = "6bc1bee22e409f96e93d7e117393172a\
                         ae2d8a571e03ac9c9eb76fac45af8e51\
                         30c81c46a35ce411e5fbc1191a0a52ef\
                         f69f2445df4f9b17ad2b417be66c3710";

    fn mac() -> Cmac<Aes> {
        Cmac::new(&hex::decode(KEY).unwrap()).unwrap()
    }

    fn msg(n_hex: usize) -> Vec<u8> {
        hex::decode(&MSG64[..n_hex]).unwrap()
    }

    #[test]
    fn rfc4493_example_1_empty() {
        assert_eq!(mac().digest(&[]).to_hex(), "bb1d6929e95937287fa37d129b756746");
    }

    #[test]
    fn rfc4493_example_2_one_block() {
        assert_eq!(
            mac().digest(&msg(32)).to_hex(),
            "070a16b46b4d4144f79bdd9dd04a287c"
        );
    }

    #[test]
    fn rfc4493_example_3_forty_bytes() {
        assert_eq!(
            mac().digest(&msg(80)).to_hex(),
            "dfa66747de9ae63030ca32611497c827"
        );
    }

    #[test]
    fn rfc4493_example_4_four_blocks() {
        assert_eq!(
            mac().digest(&msg(128)).to_hex(),
            "51f0bebf7e3b9d92fc49741779363cfe"
        );
    }

    #[test]
    fn chunked_updates_match_one_shot() {
        let data = msg(128);
        let mut m = mac();
        for chunk in data.chunks(7) {
            m.update(chunk);
        }
        assert_eq!(m.finalize().to_hex(), "51f0bebf7e3b9d92fc49741779363cfe");
    }

    #[test]
    fn finalize_resets_for_reuse() {
        let mut m = mac();
        m.update(b"throwaway input");
        let _ = m.finalize();
        assert_eq!(m.digest(&[]).to_hex(), "bb1d6929e95937287fa37d129b756746");
    }

    #[test]
    fn reset_discards_pending_input() {
        let mut m = mac();
        m.update(b"to be discarded");
        m.reset();
        assert_eq!(m.finalize().to_hex(), "bb1d6929e95937287fa37d129b756746");
    }

    #[test]
    fn omac2_agrees_on_full_blocks_only() {
        // K1 is shared, so complete-block messages MAC identically; the
        // padded path diverges through K2.
        let key = hex::decode(KEY).unwrap();
        let full = msg(32);
        assert_eq!(
            Cmac::new(&key).unwrap().digest(&full),
            Cmac::new_omac2(&key).unwrap().digest(&full)
        );
        let partial = msg(20);
        assert_ne!(
            Cmac::new(&key).unwrap().digest(&partial),
            Cmac::new_omac2(&key).unwrap().digest(&partial)
        );
    }

    #[test]
    fn agrees_with_rustcrypto_cmac() {
        use cmac::{Cmac as TheirCmac, Mac};
        use rand::RngCore;

        let mut rng = rand::thread_rng();
        let mut key = [0u8; 16];
        rng.fill_bytes(&mut key);
        for len in [0usize, 1, 15, 16, 17, 40, 64, 100, 256] {
            let mut data = vec![0u8; len];
            rng.fill_bytes(&mut data);

            let mut theirs = TheirCmac::<aes::Aes128>::new_from_slice(&key).unwrap();
            theirs.update(&data);
            let expected = theirs.finalize().into_bytes();

            let ours = Cmac::new(&key).unwrap().digest(&data);
            assert_eq!(ours.to_bytes()[..], expected[..]);
        }
    }
}

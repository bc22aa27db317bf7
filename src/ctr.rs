//! Counter mode keystream over a [`BlockCipher`].
//!
//! The counter starts as a copy of the IV and its last 32-bit word is
//! incremented (wrapping) once per block. Each block encrypts a fresh copy
//! of the counter so the running counter is never aliased by the cipher.
//! Encryption and decryption are the same operation.

use crate::aes::{BlockCipher, BLOCK_WORDS};
use crate::block::ByteBlock;

/// CTR mode state bound to a cipher.
pub struct Ctr<'c, C: BlockCipher> {
    cipher: &'c C,
    counter: [u32; BLOCK_WORDS],
    iv: Option<[u32; BLOCK_WORDS]>,
}

impl<'c, C: BlockCipher> Ctr<'c, C> {
    /// Starts a keystream at the given 16-byte IV.
    pub fn new(cipher: &'c C, iv: &ByteBlock) -> Self {
        debug_assert_eq!(iv.len(), 16);
        let words = iv.words();
        Self {
            cipher,
            counter: [0; BLOCK_WORDS],
            iv: Some([words[0], words[1], words[2], words[3]]),
        }
    }

    /// XORs one keystream block into `words[offset..offset + 4]`.
    pub fn process_block(&mut self, words: &mut [u32], offset: usize) {
        if let Some(iv) = self.iv.take() {
            self.counter = iv;
        }
        let mut keystream = self.counter;
        self.cipher.encrypt_block(&mut keystream, 0);
        self.counter[BLOCK_WORDS - 1] = self.counter[BLOCK_WORDS - 1].wrapping_add(1);
        for i in 0..BLOCK_WORDS {
            words[offset + i] ^= keystream[i];
        }
    }

    /// XORs the keystream over a whole buffer. The final partial block is
    /// masked byte-for-byte with the truncated keystream; no padding.
    pub fn apply_keystream(&mut self, data: &mut ByteBlock) {
        let block_words = self.cipher.block_size();
        let n_blocks = data.len().div_ceil(block_words * 4);
        data.ensure_words(n_blocks * block_words);
        for b in 0..n_blocks {
            self.process_block(data.words_mut(), b * block_words);
        }
        data.clamp();
    }
}

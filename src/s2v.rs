//! S2V, the string-to-vector PRF at the heart of SIV (RFC 5297 section 2.4).
//!
//! An ordered vector of associated-data strings folds into a 128-bit
//! accumulator through doubled CMACs; the plaintext is then combined with
//! the accumulator and MACed to produce the synthetic IV. Plaintext may be
//! streamed: complete blocks flow into the MAC early while enough tail is
//! held back for the end-of-message combination.

use zeroize::Zeroize;

use crate::aes::{Aes, BLOCK_SIZE};
use crate::block::ByteBlock;
use crate::cmac::Cmac;
use crate::gf128;
use crate::Error;

/// S2V state for a single message. Associated data must be supplied before
/// any plaintext; once plaintext streaming starts, further associated data
/// is ignored.
#[derive(Clone)]
pub struct S2v {
    cmac_ad: Cmac<Aes>,
    cmac_pt: Cmac<Aes>,
    d: ByteBlock,
    empty: bool,
    pt_started: bool,
    buffer: ByteBlock,
}

impl S2v {
    /// Initializes the accumulator to `CMAC(0^128)` under the given key.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        let mut cmac_ad = Cmac::new(key)?;
        let cmac_pt = Cmac::new(key)?;
        let d = cmac_ad.digest_block(&gf128::ZERO);
        Ok(Self {
            cmac_ad,
            cmac_pt,
            d,
            empty: true,
            pt_started: false,
            buffer: ByteBlock::new(),
        })
    }

    /// Folds one associated-data string: `d = dbl(d) XOR CMAC(s)`.
    /// A no-op once plaintext streaming has begun.
    pub fn update_aad(&mut self, s: &[u8]) {
        if self.pt_started {
            return;
        }
        gf128::dbl(&mut self.d);
        let mac = self.cmac_ad.digest(s);
        self.d.xor(&mac);
        self.empty = false;
    }

    /// Streams a plaintext chunk. At least one full block stays buffered
    /// so the final combination still has a tail to work on.
    pub fn update(&mut self, chunk: &[u8]) {
        self.pt_started = true;
        self.buffer.concat(&ByteBlock::from_bytes(chunk));
        self.drain_buffer();
    }

    pub(crate) fn update_block(&mut self, chunk: &ByteBlock) {
        self.pt_started = true;
        self.buffer.concat(chunk);
        self.drain_buffer();
    }

    fn drain_buffer(&mut self) {
        while self.buffer.len() >= 2 * BLOCK_SIZE {
            let block = self.buffer.shift_bytes(BLOCK_SIZE);
            self.cmac_pt.absorb(&block);
        }
    }

    /// Combines the buffered tail with the accumulator and returns the
    /// 16-byte synthetic IV.
    pub fn finalize(&mut self) -> ByteBlock {
        self.pt_started = true;
        let tail = std::mem::take(&mut self.buffer);

        if self.empty && tail.is_empty() {
            // Empty vector, empty plaintext.
            return self.cmac_ad.digest_block(&gf128::ONE);
        }

        let t = if tail.len() >= BLOCK_SIZE {
            gf128::xorend(&tail, &self.d)
        } else {
            let mut t = self.d.clone();
            gf128::dbl(&mut t);
            let mut padded = tail;
            padded.pad_one_zero(BLOCK_SIZE);
            t.xor(&padded);
            t
        };
        self.cmac_pt.absorb(&t);
        self.cmac_pt.finalize()
    }

    /// Read-only view of the running accumulator `d`.
    pub fn accumulator(&self) -> &ByteBlock {
        &self.d
    }
}

impl Drop for S2v {
    fn drop(&mut self) {
        self.d.zeroize();
        self.buffer.zeroize();
    }
}

//! Byte strings backed by big-endian packed 32-bit words.
//!
//! Every primitive in this crate (AES state, CMAC chaining values, S2V
//! accumulators, CTR keystreams) works on 32-bit words, so the byte buffer
//! type stores its content the same way: byte `i` lives in `words[i / 4]`
//! at shift `24 - 8 * (i % 4)`. A buffer may be shorter than its word
//! storage; `sig_bytes` tracks the significant length and [`ByteBlock::clamp`]
//! restores the invariant that everything past it is zero.

use core::fmt;

use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use crate::Error;

/// A byte string stored as big-endian packed 32-bit words.
#[derive(Clone, Default)]
pub struct ByteBlock {
    words: Vec<u32>,
    sig_bytes: usize,
}

impl ByteBlock {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a buffer from raw words and a significant byte count.
    pub fn from_words(words: Vec<u32>, sig_bytes: usize) -> Self {
        debug_assert!(sig_bytes <= words.len() * 4);
        Self { words, sig_bytes }
    }

    /// `n` zero bytes.
    pub fn zeroed(n: usize) -> Self {
        Self {
            words: vec![0; n.div_ceil(4)],
            sig_bytes: n,
        }
    }

    /// Packs a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut words = vec![0u32; bytes.len().div_ceil(4)];
        for (i, &b) in bytes.iter().enumerate() {
            words[i / 4] |= u32::from(b) << (24 - 8 * (i % 4));
        }
        Self {
            words,
            sig_bytes: bytes.len(),
        }
    }

    /// Parses a hex string (case-insensitive, even length).
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|_| Error::MalformedHex)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Lowercase hex rendering of the significant bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Unpacks the significant bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        (0..self.sig_bytes).map(|i| self.byte(i)).collect()
    }

    /// Number of significant bytes.
    pub fn len(&self) -> usize {
        self.sig_bytes
    }

    /// True when no byte is significant.
    pub fn is_empty(&self) -> bool {
        self.sig_bytes == 0
    }

    /// Backing words. Only the first `len()` bytes are significant.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Mutable backing words, for block-at-a-time cipher processing.
    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Byte at index `i`, zero past the backing storage.
    pub fn byte(&self, i: usize) -> u8 {
        (self.word(i / 4) >> (24 - 8 * (i % 4))) as u8
    }

    /// Word at index `i`, zero past the backing storage.
    pub(crate) fn word(&self, i: usize) -> u32 {
        self.words.get(i).copied().unwrap_or(0)
    }

    /// Grows the word storage (zero filled) to at least `n` words.
    pub(crate) fn ensure_words(&mut self, n: usize) {
        if self.words.len() < n {
            self.words.resize(n, 0);
        }
    }

    /// Zeroes the bits past the significant length and truncates the word
    /// storage to `ceil(sig_bytes / 4)`.
    pub fn clamp(&mut self) {
        let full = self.sig_bytes / 4;
        let rem = self.sig_bytes % 4;
        if rem != 0 {
            if let Some(w) = self.words.get_mut(full) {
                *w &= 0xffff_ffff << (32 - 8 * rem);
            }
        }
        self.words.resize(self.sig_bytes.div_ceil(4), 0);
    }

    /// Appends `other`. Word-aligned when possible, byte splicing otherwise.
    pub fn concat(&mut self, other: &ByteBlock) -> &mut Self {
        self.clamp();
        if self.sig_bytes % 4 == 0 {
            let n = other.sig_bytes.div_ceil(4);
            self.words.extend(other.words.iter().take(n));
        } else {
            for i in 0..other.sig_bytes {
                let pos = self.sig_bytes + i;
                self.ensure_words(pos / 4 + 1);
                self.words[pos / 4] |= u32::from(other.byte(i)) << (24 - 8 * (pos % 4));
            }
        }
        self.sig_bytes += other.sig_bytes;
        self
    }

    /// In-place bit shift; positive is left, negative is right. Returns the
    /// bits most recently dropped off the shifted-out end (exact for shifts
    /// of up to 32 bits; callers may ignore it).
    pub fn bitshift(&mut self, n: i32) -> u32 {
        if n > 0 {
            self.shift_left(n as u32)
        } else if n < 0 {
            self.shift_right(n.unsigned_abs())
        } else {
            0
        }
    }

    fn shift_left(&mut self, n: u32) -> u32 {
        let len = self.words.len();
        if len == 0 {
            return 0;
        }
        let word_shift = ((n / 32) as usize).min(len);
        let bit_shift = n % 32;
        let mut carry = 0u32;
        if word_shift > 0 {
            carry = self.words[word_shift - 1];
            self.words.rotate_left(word_shift);
            for w in &mut self.words[len - word_shift..] {
                *w = 0;
            }
        }
        if bit_shift > 0 {
            carry = self.words[0] >> (32 - bit_shift);
            for i in 0..len {
                let lo = if i + 1 < len {
                    self.words[i + 1] >> (32 - bit_shift)
                } else {
                    0
                };
                self.words[i] = (self.words[i] << bit_shift) | lo;
            }
        }
        carry
    }

    fn shift_right(&mut self, n: u32) -> u32 {
        let len = self.words.len();
        if len == 0 {
            return 0;
        }
        let word_shift = ((n / 32) as usize).min(len);
        let bit_shift = n % 32;
        let mut carry = 0u32;
        if word_shift > 0 {
            carry = self.words[len - word_shift];
            self.words.rotate_right(word_shift);
            for w in &mut self.words[..word_shift] {
                *w = 0;
            }
        }
        if bit_shift > 0 {
            carry = self.words[len - 1] & ((1 << bit_shift) - 1);
            for i in (0..len).rev() {
                let hi = if i > 0 {
                    self.words[i - 1] << (32 - bit_shift)
                } else {
                    0
                };
                self.words[i] = (self.words[i] >> bit_shift) | hi;
            }
        }
        carry
    }

    /// Word-wise XOR with a buffer of the same significant length.
    pub fn xor(&mut self, other: &ByteBlock) -> &mut Self {
        debug_assert_eq!(self.sig_bytes, other.sig_bytes);
        let n = self.sig_bytes.div_ceil(4);
        self.ensure_words(n);
        for i in 0..n {
            self.words[i] ^= other.word(i);
        }
        self
    }

    /// Word-wise AND with a buffer of the same significant length.
    pub fn bitand(&mut self, other: &ByteBlock) -> &mut Self {
        debug_assert_eq!(self.sig_bytes, other.sig_bytes);
        let n = self.sig_bytes.div_ceil(4);
        self.ensure_words(n);
        for i in 0..n {
            self.words[i] &= other.word(i);
        }
        self
    }

    /// Word-wise bitwise complement.
    pub fn neg(&mut self) -> &mut Self {
        for w in &mut self.words {
            *w = !*w;
        }
        self
    }

    /// Destructively removes the first `n` bytes and returns them.
    pub fn shift_bytes(&mut self, n: usize) -> ByteBlock {
        let n = n.min(self.sig_bytes);
        if n % 4 == 0 {
            return self.pop_words(n / 4);
        }
        let head = self.leftmost_bytes(n);
        let tail = self.rightmost_bytes(self.sig_bytes - n);
        *self = tail;
        head
    }

    /// Destructively removes the first `n` words and returns them.
    pub fn pop_words(&mut self, n: usize) -> ByteBlock {
        let n = n.min(self.words.len());
        let head: Vec<u32> = self.words.drain(..n).collect();
        let taken = (n * 4).min(self.sig_bytes);
        self.sig_bytes -= taken;
        ByteBlock::from_words(head, taken)
    }

    /// Copy of the first `n` bytes.
    pub fn leftmost_bytes(&self, n: usize) -> ByteBlock {
        let n = n.min(self.sig_bytes);
        let mut out = ByteBlock {
            words: self.words[..n.div_ceil(4).min(self.words.len())].to_vec(),
            sig_bytes: n,
        };
        out.clamp();
        out
    }

    /// Copy of the last `n` bytes.
    pub fn rightmost_bytes(&self, n: usize) -> ByteBlock {
        let n = n.min(self.sig_bytes);
        let skip = self.sig_bytes - n;
        if skip % 4 == 0 {
            let start = (skip / 4).min(self.words.len());
            let mut out = ByteBlock {
                words: self.words[start..].to_vec(),
                sig_bytes: n,
            };
            out.clamp();
            return out;
        }
        let mut out = ByteBlock::zeroed(n);
        for i in 0..n {
            out.words[i / 4] |= u32::from(self.byte(skip + i)) << (24 - 8 * (i % 4));
        }
        out
    }

    /// Appends a `1` bit and zeros up to a total of `n` bytes.
    pub(crate) fn pad_one_zero(&mut self, n: usize) {
        debug_assert!(self.sig_bytes < n);
        let mut pad = vec![0u8; n - self.sig_bytes];
        pad[0] = 0x80;
        self.concat(&ByteBlock::from_bytes(&pad));
    }
}

impl ConstantTimeEq for ByteBlock {
    /// Word XOR-OR reduction over the significant bytes. Mismatched lengths
    /// compare unequal immediately; lengths are not secret.
    fn ct_eq(&self, other: &Self) -> Choice {
        if self.sig_bytes != other.sig_bytes {
            return Choice::from(0);
        }
        let full = self.sig_bytes / 4;
        let rem = self.sig_bytes % 4;
        let mut acc = 0u32;
        for i in 0..full {
            acc |= self.word(i) ^ other.word(i);
        }
        if rem != 0 {
            let mask = 0xffff_ffffu32 << (32 - 8 * rem);
            acc |= (self.word(full) ^ other.word(full)) & mask;
        }
        acc.ct_eq(&0)
    }
}

impl PartialEq for ByteBlock {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for ByteBlock {}

impl Zeroize for ByteBlock {
    fn zeroize(&mut self) {
        self.words.zeroize();
    }
}

impl fmt::Debug for ByteBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteBlock({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let b = ByteBlock::from_hex("00010203a0b0c0d0ff").unwrap();
        assert_eq!(b.len(), 9);
        assert_eq!(b.to_hex(), "00010203a0b0c0d0ff");
        assert_eq!(b.to_bytes(), vec![0x00, 0x01, 0x02, 0x03, 0xa0, 0xb0, 0xc0, 0xd0, 0xff]);
    }

    #[test]
    fn hex_rejects_garbage() {
        assert_eq!(ByteBlock::from_hex("0g").unwrap_err(), Error::MalformedHex);
        assert_eq!(ByteBlock::from_hex("abc").unwrap_err(), Error::MalformedHex);
    }

    #[test]
    fn word_packing_is_big_endian() {
        let b = ByteBlock::from_bytes(&[0xde, 0xad, 0xbe, 0xef, 0x01]);
        assert_eq!(b.words(), &[0xdead_beef, 0x0100_0000]);
        assert_eq!(b.byte(4), 0x01);
    }

    #[test]
    fn clamp_zeroes_trailing_bits() {
        let mut b = ByteBlock::from_words(vec![0x1122_3344, 0x5566_7788], 5);
        b.clamp();
        assert_eq!(b.words(), &[0x1122_3344, 0x5500_0000]);
        assert_eq!(b.to_hex(), "1122334455");
    }

    #[test]
    fn concat_word_aligned() {
        let mut a = ByteBlock::from_hex("00112233").unwrap();
        a.concat(&ByteBlock::from_hex("445566").unwrap());
        assert_eq!(a.to_hex(), "00112233445566");
    }

    #[test]
    fn concat_unaligned_splices_bytes() {
        let mut a = ByteBlock::from_hex("001122").unwrap();
        a.concat(&ByteBlock::from_hex("334455667788").unwrap());
        assert_eq!(a.to_hex(), "001122334455667788");
        assert_eq!(a.words(), &[0x0011_2233, 0x4455_6677, 0x8800_0000]);
    }

    #[test]
    fn concat_empty_is_identity() {
        let mut a = ByteBlock::from_hex("0011").unwrap();
        a.concat(&ByteBlock::new());
        assert_eq!(a.to_hex(), "0011");
        let mut e = ByteBlock::new();
        e.concat(&a);
        assert_eq!(e.to_hex(), "0011");
    }

    #[test]
    fn bitshift_left_crosses_words() {
        let mut b = ByteBlock::from_hex("80000000000000000000000000000001").unwrap();
        let carry = b.bitshift(1);
        assert_eq!(carry, 1);
        assert_eq!(b.to_hex(), "00000000000000000000000000000002");
    }

    #[test]
    fn bitshift_right_crosses_words() {
        let mut b = ByteBlock::from_hex("00000000000000010000000000000000").unwrap();
        b.bitshift(-1);
        assert_eq!(b.to_hex(), "00000000000000008000000000000000");
    }

    #[test]
    fn bitshift_by_whole_words() {
        let mut b = ByteBlock::from_hex("00112233445566778899aabbccddeeff").unwrap();
        b.bitshift(32);
        assert_eq!(b.to_hex(), "445566778899aabbccddeeff00000000");
        b.bitshift(-64);
        assert_eq!(b.to_hex(), "0000000000000000445566778899aabb");
    }

    #[test]
    fn shift_bytes_splits_destructively() {
        let mut b = ByteBlock::from_hex("00112233445566778899").unwrap();
        let head = b.shift_bytes(4);
        assert_eq!(head.to_hex(), "00112233");
        assert_eq!(b.to_hex(), "445566778899");
        let head = b.shift_bytes(3);
        assert_eq!(head.to_hex(), "445566");
        assert_eq!(b.to_hex(), "778899");
    }

    #[test]
    fn pop_words_takes_prefix() {
        let mut b = ByteBlock::from_hex("00112233445566778899aabb").unwrap();
        let head = b.pop_words(2);
        assert_eq!(head.to_hex(), "0011223344556677");
        assert_eq!(b.to_hex(), "8899aabb");
    }

    #[test]
    fn leftmost_rightmost_are_non_destructive() {
        let b = ByteBlock::from_hex("00112233445566778899").unwrap();
        assert_eq!(b.leftmost_bytes(3).to_hex(), "001122");
        assert_eq!(b.rightmost_bytes(3).to_hex(), "778899");
        assert_eq!(b.rightmost_bytes(8).to_hex(), "2233445566778899");
        assert_eq!(b.to_hex(), "00112233445566778899");
    }

    #[test]
    fn xor_and_neg() {
        let mut a = ByteBlock::from_hex("ff00ff00").unwrap();
        a.xor(&ByteBlock::from_hex("0f0f0f0f").unwrap());
        assert_eq!(a.to_hex(), "f00ff00f");
        a.neg();
        assert_eq!(a.to_hex(), "0ff00ff0");
        a.bitand(&ByteBlock::from_hex("00ffff00").unwrap());
        assert_eq!(a.to_hex(), "00f00f00");
    }

    #[test]
    fn equality_requires_matching_length() {
        let a = ByteBlock::from_hex("001122").unwrap();
        let b = ByteBlock::from_hex("00112233").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, b.leftmost_bytes(3));
    }

    #[test]
    fn equality_ignores_unclamped_garbage() {
        let a = ByteBlock::from_words(vec![0x1122_33ff], 3);
        let b = ByteBlock::from_words(vec![0x1122_3300], 3);
        assert_eq!(a, b);
    }

    #[test]
    fn pad_one_zero_marks_boundary() {
        let mut b = ByteBlock::from_hex("aabb").unwrap();
        b.pad_one_zero(16);
        assert_eq!(b.to_hex(), "aabb8000000000000000000000000000");
        let mut e = ByteBlock::new();
        e.pad_one_zero(16);
        assert_eq!(e.to_hex(), "80000000000000000000000000000000");
    }
}

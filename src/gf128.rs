//! GF(2^128) helpers shared by the MAC and the SIV tag masking.
//!
//! The field is GF(2)[x] modulo `x^128 + x^7 + x^2 + x + 1`. Doubling
//! (multiplication by `x`) reduces with `RB = 0x87` after a left shift;
//! its inverse (division by `x`) reduces with the bit-reversed constant
//! after a right shift.

use std::sync::LazyLock;

use crate::block::ByteBlock;

/// 128 zero bits.
pub static ZERO: LazyLock<ByteBlock> =
    LazyLock::new(|| ByteBlock::from_words(vec![0, 0, 0, 0], 16));

/// `0^127 || 1`, the S2V tag for an empty input vector.
pub static ONE: LazyLock<ByteBlock> =
    LazyLock::new(|| ByteBlock::from_words(vec![0, 0, 0, 1], 16));

/// Reduction constant for [`dbl`].
pub static RB: LazyLock<ByteBlock> =
    LazyLock::new(|| ByteBlock::from_words(vec![0, 0, 0, 0x87], 16));

/// Reduction constant for [`inv`], `RB` rotated right by one bit.
pub static RB_SHIFTED: LazyLock<ByteBlock> =
    LazyLock::new(|| ByteBlock::from_words(vec![0x8000_0000, 0, 0, 0x43], 16));

/// Mask clearing bit 31 of the third and fourth words. ANDed onto the SIV
/// tag before it becomes a CTR counter, so the 32-bit word increment cannot
/// carry across those positions (RFC 5297 section 2.6).
pub static NON_MSB: LazyLock<ByteBlock> = LazyLock::new(|| {
    ByteBlock::from_words(vec![0xffff_ffff, 0xffff_ffff, 0x7fff_ffff, 0x7fff_ffff], 16)
});

/// Most significant bit of a 128-bit block.
pub fn msb(x: &ByteBlock) -> u32 {
    debug_assert_eq!(x.len(), 16);
    x.words()[0] >> 31
}

/// In-place doubling: multiply by `x` modulo the field polynomial.
pub fn dbl(x: &mut ByteBlock) {
    debug_assert_eq!(x.len(), 16);
    let carry = msb(x);
    x.bitshift(1);
    if carry == 1 {
        x.xor(&RB);
    }
}

/// In-place halving: multiply by `x^-1` modulo the field polynomial.
/// Only the OMAC2 subkey derivation uses it.
pub fn inv(x: &mut ByteBlock) {
    debug_assert_eq!(x.len(), 16);
    let carry = x.words()[3] & 1;
    x.bitshift(-1);
    if carry == 1 {
        x.xor(&RB_SHIFTED);
    }
}

/// `leftmost(a, |a|-|b|) || (rightmost(a, |b|) XOR b)`: XOR `b` onto the
/// tail of `a`, leaving the prefix untouched.
pub fn xorend(a: &ByteBlock, b: &ByteBlock) -> ByteBlock {
    debug_assert!(a.len() >= b.len());
    let mut out = a.leftmost_bytes(a.len() - b.len());
    let mut tail = a.rightmost_bytes(b.len());
    tail.xor(b);
    out.concat(&tail);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Subkey chain from RFC 4493 section 4: L, K1 = dbl(L), K2 = dbl(K1).
    const L: &str = "7df76b0c1ab899b33e42f047b91b546f";
    const K1: &str = "fbeed618357133667c85e08f7236a8de";
    const K2: &str = "f7ddac306ae266ccf90bc11ee46d513b";

    fn blk(hex: &str) -> ByteBlock {
        ByteBlock::from_hex(hex).unwrap()
    }

    #[test]
    fn dbl_without_carry_is_a_plain_shift() {
        let mut x = blk(L);
        dbl(&mut x);
        assert_eq!(x.to_hex(), K1);
    }

    #[test]
    fn dbl_with_carry_folds_in_rb() {
        let mut x = blk(K1);
        dbl(&mut x);
        assert_eq!(x.to_hex(), K2);
    }

    #[test]
    fn dbl_of_zero_is_zero() {
        let mut x = ZERO.clone();
        dbl(&mut x);
        assert_eq!(x, *ZERO);
    }

    #[test]
    fn inv_undoes_dbl() {
        for hex in [L, K1, K2, "00000000000000000000000000000001"] {
            let mut x = blk(hex);
            dbl(&mut x);
            inv(&mut x);
            assert_eq!(x.to_hex(), hex);
        }
    }

    #[test]
    fn dbl_undoes_inv() {
        // Odd input, so the inverse path reduces with the shifted constant.
        let mut x = blk("7df76b0c1ab899b33e42f047b91b546f");
        inv(&mut x);
        dbl(&mut x);
        assert_eq!(x.to_hex(), L);
    }

    #[test]
    fn msb_reads_bit_127() {
        assert_eq!(msb(&blk(L)), 0);
        assert_eq!(msb(&blk(K1)), 1);
    }

    #[test]
    fn xorend_touches_only_the_tail() {
        let a = blk("00112233445566778899aabbccddeeff0102030405060708090a0b0c0d0e0f10");
        let b = blk("ffffffffffffffffffffffffffffffff");
        let out = xorend(&a, &b);
        assert_eq!(
            out.to_hex(),
            "00112233445566778899aabbccddeefffefdfcfbfaf9f8f7f6f5f4f3f2f1f0ef"
        );
    }

    #[test]
    fn xorend_with_equal_lengths_is_plain_xor() {
        let a = blk("000102030405060708090a0b0c0d0e0f");
        let out = xorend(&a, &blk("000102030405060708090a0b0c0d0e0f"));
        assert_eq!(out, *ZERO);
    }

    #[test]
    fn non_msb_clears_the_counter_carry_bits() {
        let mut v = blk("ffffffffffffffffffffffffffffffff");
        v.bitand(&NON_MSB);
        assert_eq!(v.to_hex(), "ffffffffffffffff7fffffff7fffffff");
    }
}

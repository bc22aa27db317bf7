//! AES-128/192/256 block primitive over four big-endian state words.
//!
//! The round function is table-driven: the S-box and the combined
//! SubBytes+MixColumns tables are generated at compile time by walking
//! GF(2^8) with a generator, exactly as FIPS 197 defines them. The
//! decryption path keeps a transposed schedule layout and compensates by
//! swapping state words 1 and 3 around the inverse rounds; both sides of
//! the swap must stay in sync with the schedule construction.
//!
//! Not constant-time: table lookups are data-dependent, so cache timing is
//! observable. Callers needing side-channel hardening should swap in a
//! bitsliced or hardware-backed implementation behind [`BlockCipher`].

use zeroize::Zeroize;

use crate::Error;

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Cipher block size in 32-bit words.
pub(crate) const BLOCK_WORDS: usize = 4;

/// A 128-bit block cipher over big-endian packed state words.
///
/// Modes ([`crate::Ctr`]) and MACs ([`crate::Cmac`]) are generic over this
/// so an alternative AES backend can be slotted in underneath them.
pub trait BlockCipher {
    /// Block size in 32-bit words.
    fn block_size(&self) -> usize {
        BLOCK_WORDS
    }

    /// Encrypts the block at `words[offset..offset + 4]` in place.
    fn encrypt_block(&self, words: &mut [u32], offset: usize);

    /// Decrypts the block at `words[offset..offset + 4]` in place.
    fn decrypt_block(&self, words: &mut [u32], offset: usize);
}

const RCON: [u32; 11] = [
    0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36,
];

struct Tables {
    sbox: [u8; 256],
    inv_sbox: [u8; 256],
    sub_mix: [[u32; 256]; 4],
    inv_sub_mix: [[u32; 256]; 4],
}

/// Walks GF(2^8) once, filling the S-boxes and the rotated
/// SubBytes+MixColumns tables for both directions.
const fn build_tables() -> Tables {
    // Doubling table over the AES polynomial 0x11b.
    let mut d = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        d[i] = if i < 128 {
            (i as u32) << 1
        } else {
            ((i as u32) << 1) ^ 0x11b
        };
        i += 1;
    }

    let mut t = Tables {
        sbox: [0; 256],
        inv_sbox: [0; 256],
        sub_mix: [[0; 256]; 4],
        inv_sub_mix: [[0; 256]; 4],
    };

    // x walks the multiplicative group via x -> x * 03; xi tracks 1/x.
    let mut x: u32 = 0;
    let mut xi: u32 = 0;
    let mut i = 0;
    while i < 256 {
        // Affine transform of the inverse gives the S-box entry.
        let mut sx = xi ^ (xi << 1) ^ (xi << 2) ^ (xi << 3) ^ (xi << 4);
        sx = (sx >> 8) ^ (sx & 0xff) ^ 0x63;
        t.sbox[x as usize] = sx as u8;
        t.inv_sbox[sx as usize] = x as u8;

        let x2 = d[x as usize];
        let x4 = d[x2 as usize];
        let x8 = d[x4 as usize];

        // Forward tables: MixColumn of the S-box output, four rotations.
        let tt = (d[sx as usize] * 0x101) ^ (sx * 0x0101_0100);
        t.sub_mix[0][x as usize] = tt.rotate_left(24);
        t.sub_mix[1][x as usize] = tt.rotate_left(16);
        t.sub_mix[2][x as usize] = tt.rotate_left(8);
        t.sub_mix[3][x as usize] = tt;

        // Inverse tables: InvMixColumn of x, indexed by the S-box output.
        let tt = (x8 * 0x0101_0101) ^ (x4 * 0x0001_0001) ^ (x2 * 0x101) ^ (x * 0x0101_0100);
        t.inv_sub_mix[0][sx as usize] = tt.rotate_left(24);
        t.inv_sub_mix[1][sx as usize] = tt.rotate_left(16);
        t.inv_sub_mix[2][sx as usize] = tt.rotate_left(8);
        t.inv_sub_mix[3][sx as usize] = tt;

        if x == 0 {
            x = 1;
            xi = 1;
        } else {
            x = x2 ^ d[d[d[(x8 ^ x2) as usize] as usize] as usize];
            xi ^= d[d[xi as usize] as usize];
        }
        i += 1;
    }

    t
}

static TABLES: Tables = build_tables();

fn sub_word(w: u32) -> u32 {
    (u32::from(TABLES.sbox[(w >> 24) as usize]) << 24)
        | (u32::from(TABLES.sbox[((w >> 16) & 0xff) as usize]) << 16)
        | (u32::from(TABLES.sbox[((w >> 8) & 0xff) as usize]) << 8)
        | u32::from(TABLES.sbox[(w & 0xff) as usize])
}

/// An AES key schedule. Immutable once built; one instance encrypts and
/// decrypts any number of blocks.
#[derive(Clone)]
pub struct Aes {
    n_rounds: usize,
    key_schedule: Vec<u32>,
    inv_key_schedule: Vec<u32>,
}

impl Aes {
    /// Expands a 16-, 24- or 32-byte key into both round-key schedules.
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(Error::InvalidKeyLength);
        }
        let key_words: Vec<u32> = key
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let nk = key_words.len();
        let n_rounds = nk + 6;
        let ks_rows = (n_rounds + 1) * 4;

        let mut ks = Vec::with_capacity(ks_rows);
        for row in 0..ks_rows {
            if row < nk {
                ks.push(key_words[row]);
                continue;
            }
            let mut t = ks[row - 1];
            if row % nk == 0 {
                t = sub_word(t.rotate_left(8)) ^ (RCON[row / nk] << 24);
            } else if nk > 6 && row % nk == 4 {
                t = sub_word(t);
            }
            ks.push(ks[row - nk] ^ t);
        }

        // The inverse schedule reads the forward one back to front; inner
        // rows pass through InvMixColumn of their substituted bytes.
        let mut inv_ks = Vec::with_capacity(ks_rows);
        for inv_row in 0..ks_rows {
            let row = ks_rows - inv_row;
            let t = if inv_row % 4 != 0 { ks[row] } else { ks[row - 4] };
            inv_ks.push(if inv_row < 4 || row <= 4 {
                t
            } else {
                TABLES.inv_sub_mix[0][TABLES.sbox[(t >> 24) as usize] as usize]
                    ^ TABLES.inv_sub_mix[1][TABLES.sbox[((t >> 16) & 0xff) as usize] as usize]
                    ^ TABLES.inv_sub_mix[2][TABLES.sbox[((t >> 8) & 0xff) as usize] as usize]
                    ^ TABLES.inv_sub_mix[3][TABLES.sbox[(t & 0xff) as usize] as usize]
            });
        }

        Ok(Self {
            n_rounds,
            key_schedule: ks,
            inv_key_schedule: inv_ks,
        })
    }

    /// Constructor for call sites that only encrypt (CMAC subkey
    /// derivation, CTR keystreams). Both schedules are derived either way;
    /// the paired constructors name the direction at the call site.
    pub fn encryptor(key: &[u8]) -> Result<Self, Error> {
        Self::new(key)
    }

    /// Constructor for call sites that only decrypt.
    pub fn decryptor(key: &[u8]) -> Result<Self, Error> {
        Self::new(key)
    }

    /// Encrypts one 16-byte block.
    pub fn encrypt(&self, block: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut words = pack(block);
        self.encrypt_block(&mut words, 0);
        unpack(&words)
    }

    /// Decrypts one 16-byte block.
    pub fn decrypt(&self, block: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut words = pack(block);
        self.decrypt_block(&mut words, 0);
        unpack(&words)
    }

    fn do_crypt_block(
        &self,
        m: &mut [u32],
        offset: usize,
        ks: &[u32],
        sub_mix: &[[u32; 256]; 4],
        sbox: &[u8; 256],
    ) {
        let mut s0 = m[offset] ^ ks[0];
        let mut s1 = m[offset + 1] ^ ks[1];
        let mut s2 = m[offset + 2] ^ ks[2];
        let mut s3 = m[offset + 3] ^ ks[3];
        let mut ks_row = 4;

        for _ in 1..self.n_rounds {
            let t0 = sub_mix[0][(s0 >> 24) as usize]
                ^ sub_mix[1][((s1 >> 16) & 0xff) as usize]
                ^ sub_mix[2][((s2 >> 8) & 0xff) as usize]
                ^ sub_mix[3][(s3 & 0xff) as usize]
                ^ ks[ks_row];
            let t1 = sub_mix[0][(s1 >> 24) as usize]
                ^ sub_mix[1][((s2 >> 16) & 0xff) as usize]
                ^ sub_mix[2][((s3 >> 8) & 0xff) as usize]
                ^ sub_mix[3][(s0 & 0xff) as usize]
                ^ ks[ks_row + 1];
            let t2 = sub_mix[0][(s2 >> 24) as usize]
                ^ sub_mix[1][((s3 >> 16) & 0xff) as usize]
                ^ sub_mix[2][((s0 >> 8) & 0xff) as usize]
                ^ sub_mix[3][(s1 & 0xff) as usize]
                ^ ks[ks_row + 2];
            let t3 = sub_mix[0][(s3 >> 24) as usize]
                ^ sub_mix[1][((s0 >> 16) & 0xff) as usize]
                ^ sub_mix[2][((s1 >> 8) & 0xff) as usize]
                ^ sub_mix[3][(s2 & 0xff) as usize]
                ^ ks[ks_row + 3];
            ks_row += 4;
            s0 = t0;
            s1 = t1;
            s2 = t2;
            s3 = t3;
        }

        // Final round drops MixColumns, so raw S-box lookups.
        let t0 = ((u32::from(sbox[(s0 >> 24) as usize]) << 24)
            | (u32::from(sbox[((s1 >> 16) & 0xff) as usize]) << 16)
            | (u32::from(sbox[((s2 >> 8) & 0xff) as usize]) << 8)
            | u32::from(sbox[(s3 & 0xff) as usize]))
            ^ ks[ks_row];
        let t1 = ((u32::from(sbox[(s1 >> 24) as usize]) << 24)
            | (u32::from(sbox[((s2 >> 16) & 0xff) as usize]) << 16)
            | (u32::from(sbox[((s3 >> 8) & 0xff) as usize]) << 8)
            | u32::from(sbox[(s0 & 0xff) as usize]))
            ^ ks[ks_row + 1];
        let t2 = ((u32::from(sbox[(s2 >> 24) as usize]) << 24)
            | (u32::from(sbox[((s3 >> 16) & 0xff) as usize]) << 16)
            | (u32::from(sbox[((s0 >> 8) & 0xff) as usize]) << 8)
            | u32::from(sbox[(s1 & 0xff) as usize]))
            ^ ks[ks_row + 2];
        let t3 = ((u32::from(sbox[(s3 >> 24) as usize]) << 24)
            | (u32::from(sbox[((s0 >> 16) & 0xff) as usize]) << 16)
            | (u32::from(sbox[((s1 >> 8) & 0xff) as usize]) << 8)
            | u32::from(sbox[(s2 & 0xff) as usize]))
            ^ ks[ks_row + 3];

        m[offset] = t0;
        m[offset + 1] = t1;
        m[offset + 2] = t2;
        m[offset + 3] = t3;
    }
}

impl BlockCipher for Aes {
    fn encrypt_block(&self, words: &mut [u32], offset: usize) {
        self.do_crypt_block(
            words,
            offset,
            &self.key_schedule,
            &TABLES.sub_mix,
            &TABLES.sbox,
        );
    }

    fn decrypt_block(&self, words: &mut [u32], offset: usize) {
        // The inverse schedule is laid out transposed; swapping state words
        // 1 and 3 on the way in and out lines the rounds back up.
        words.swap(offset + 1, offset + 3);
        self.do_crypt_block(
            words,
            offset,
            &self.inv_key_schedule,
            &TABLES.inv_sub_mix,
            &TABLES.inv_sbox,
        );
        words.swap(offset + 1, offset + 3);
    }
}

impl Drop for Aes {
    fn drop(&mut self) {
        self.key_schedule.zeroize();
        self.inv_key_schedule.zeroize();
    }
}

fn pack(block: &[u8; BLOCK_SIZE]) -> [u32; BLOCK_WORDS] {
    let mut words = [0u32; BLOCK_WORDS];
    for (i, c) in block.chunks_exact(4).enumerate() {
        words[i] = u32::from_be_bytes([c[0], c[1], c[2], c[3]]);
    }
    words
}

fn unpack(words: &[u32; BLOCK_WORDS]) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    for (i, w) in words.iter().enumerate() {
        block[i * 4..i * 4 + 4].copy_from_slice(&w.to_be_bytes());
    }
    block
}

//! 1024-bit-state xorshift generator with multiplicative output tempering,
//! seeded from PBKDF2-SHA256. See original_source/src/hashblock/ramhog.c's
//! `xorshift_ctx` for the reference this must stay bit-exact with.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;

/// Output tempering constant from the reference implementation. Any other
/// multiplier changes every digest produced by `hash()`.
const OUTPUT_MULTIPLIER: u64 = 8372773778140471301;

/// 64 words of 1024-bit state plus a 6-bit rotor index.
pub struct XorshiftCtx {
    s: [u64; 64],
    p: u8,
}

impl XorshiftCtx {
    /// Seed from `PBKDF2-SHA256(password=seed, salt=salt, iterations=128,
    /// dkLen=520)`. The 65th derived word only ever influences `p` via word
    /// index 16 (not 64) — a quirk of the reference implementation that
    /// callers must preserve bit-exactly for cross-implementation digest
    /// compatibility.
    pub fn seed(seed: &[u8], salt: &[u8]) -> Self {
        let mut full = [0u8; 65 * 8];
        pbkdf2::<Hmac<Sha256>>(seed, salt, 128, &mut full)
            .expect("pbkdf2 dkLen within HMAC-SHA256 output limit");

        let mut s = [0u64; 64];
        for (i, word) in s.iter_mut().enumerate() {
            let start = i * 8;
            *word = u64::from_le_bytes(full[start..start + 8].try_into().unwrap());
        }

        let word16_start = 16 * 8;
        let word16 = u64::from_le_bytes(full[word16_start..word16_start + 8].try_into().unwrap());
        let p = (word16 & 63) as u8;

        XorshiftCtx { s, p }
    }

    /// Produce one 64-bit output and advance the state.
    pub fn next(&mut self) -> u64 {
        let s0 = self.s[self.p as usize];
        self.p = (self.p + 1) & 63;
        let mut s1 = self.s[self.p as usize];
        s1 ^= s1 << 25;
        s1 ^= s1 >> 3;
        let s0 = s0 ^ (s0 >> 49);
        self.s[self.p as usize] = s0 ^ s1;
        self.s[self.p as usize].wrapping_mul(OUTPUT_MULTIPLIER)
    }
}

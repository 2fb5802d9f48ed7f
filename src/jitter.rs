//! Deterministic per-(country, year) variation.
//!
//! The key `"{country}{year}"` is hashed with 64-bit FNV-1a and xored with the
//! run seed. That word is expanded with splitmix64 into a 256-bit key for a
//! [`ChaCha8Rng`], whose first 64-bit output is scaled into `[0.9, 1.1]`.
//! ChaCha's output stream is fixed by its algorithm, and the seed expansion and
//! float mapping live here, so a key gives the same factor on every platform,
//! run and dependency upgrade.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const JITTER_MIN: f64 = 0.9;
pub const JITTER_MAX: f64 = 1.1;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;
// 2^-53
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

#[derive(Debug, Clone, Copy, Default)]
pub struct Jitter {
    seed: u64,
}

impl Jitter {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn factor(&self, country: &str, year: i32) -> f64 {
        let key = format!("{country}{year}");
        let mut rng = ChaCha8Rng::from_seed(expand_key(fnv1a(key.as_bytes()) ^ self.seed));
        let unit = (rng.next_u64() >> 11) as f64 * UNIT_SCALE;
        JITTER_MIN + (JITTER_MAX - JITTER_MIN) * unit
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Four splitmix64 outputs, little-endian.
fn expand_key(word: u64) -> [u8; 32] {
    let mut state = word;
    let mut seed = [0u8; 32];
    for chunk in seed.chunks_exact_mut(8) {
        state = state.wrapping_add(GOLDEN_GAMMA);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        chunk.copy_from_slice(&(z ^ (z >> 31)).to_le_bytes());
    }
    seed
}

//! Bucket hash for scope chains (MurmurHash2, 32-bit)

use crate::constants::{HASH_SEED, HASH_SIZE};

const M: u32 = 0x5bd1_e995;
const R: u32 = 24;

pub fn murmur2(key: &[u8], seed: u32) -> u32 {
    let mut h = seed ^ key.len() as u32;

    let mut chunks = key.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);

        h = h.wrapping_mul(M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if tail.len() == 3 {
        h ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        h ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        h ^= tail[0] as u32;
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}

/// Bucket index of `name` in a scope.
pub fn bucket_index(name: &str) -> usize {
    murmur2(name.as_bytes(), HASH_SEED) as usize % HASH_SIZE
}

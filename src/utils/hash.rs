//! Pure hash helpers: a cryptographic digest, salted password hashing, and
//! a fast 32-bit non-cryptographic hash for sharding keys.

use sha2::{Digest, Sha256};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a 32-bit hash. Fast and well-distributed; never use it for
/// anything security-sensitive.
pub fn fnv1a32(data: &[u8]) -> u32 {
    data.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// SHA-256 digest of a byte sequence.
pub fn digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Digest of `salt || secret`, for storing password verifiers.
pub fn salted_hash(salt: &[u8], secret: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(secret);
    hasher.finalize().into()
}

/// Constant-time comparison of a candidate secret against a stored salted
/// hash.
pub fn verify_salted(salt: &[u8], secret: &[u8], expected: &[u8; 32]) -> bool {
    let computed = salted_hash(salt, secret);
    computed
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

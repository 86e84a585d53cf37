//! Cryptographic primitives for the Private Ride Ledger
//!
//! Domain-separated Keccak-256 hashing, the pseudo-random obfuscation multipliers
//! derived from the processing timestamp, and constant-time digest comparison.

use sha3::{Digest, Keccak256};
use constant_time_eq::constant_time_eq;

/// Hash domains used across the crate
pub mod domains {
    /// Multiplier applied to both sides of the fare comparison at match time
    pub const MATCH_MULTIPLIER: &str = "PRIVATERIDE_MATCH_MULTIPLIER";

    /// Decoy multiplier applied to the stored final fare at completion
    pub const FARE_OBFUSCATION: &str = "PRIVATERIDE_FARE_OBFUSCATION";

    /// Ciphertext handle derivation in the clear engine
    pub const HANDLE: &str = "PRIVATERIDE_HANDLE";

    /// Encrypted input proofs in the clear engine
    pub const INPUT_PROOF: &str = "PRIVATERIDE_INPUT_PROOF";

    /// Oracle signatures over decryption results
    pub const DECRYPTION: &str = "PRIVATERIDE_DECRYPTION";
}

/// Create a domain-separated Keccak-256 hash of multiple inputs
///
/// # Arguments
///
/// * `domain` - Domain prefix (see [`domains`])
/// * `data` - Slices to hash, each length-prefixed
///
/// # Returns
///
/// A 32-byte hash with domain separation
pub fn keccak_multiple(domain: &str, data: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();

    hasher.update(domain.as_bytes());
    hasher.update([domain.len() as u8]);
    hasher.update([data.len() as u8]);

    for element in data {
        // 4-byte big-endian length prefix keeps element boundaries unambiguous
        hasher.update((element.len() as u32).to_be_bytes());
        hasher.update(element);
    }

    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Derive an obfuscation multiplier in `[1, range]` from a timestamp and a ride id
///
/// A `range` of zero is treated as one.
pub fn obfuscation_multiplier(domain: &str, timestamp: i64, ride_id: u64, range: u64) -> u64 {
    let digest = keccak_multiple(domain, &[&timestamp.to_be_bytes(), &ride_id.to_be_bytes()]);

    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[24..]);

    (u64::from_be_bytes(word) % range.max(1)) + 1
}

/// Verify a digest in constant time to prevent timing attacks
pub fn verify_digest(expected: &[u8], actual: &[u8]) -> bool {
    constant_time_eq(expected, actual)
}

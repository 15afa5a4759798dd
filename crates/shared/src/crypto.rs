//! Hashing helpers for gateway signatures, idempotency keys and session
//! token fingerprints.

use sha2::{Digest, Sha256, Sha512};

/// Lowercase hex SHA-256 of the input.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Lowercase hex SHA-512 of the input. The payment gateway signs its
/// request and callback payloads with SHA-512 over a pipe-joined string.
pub fn sha512_hex(input: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison of two hex digests.
///
/// Comparison must not short-circuit on the first differing byte, otherwise
/// callback signature checks leak timing information about the salt.
pub fn constant_time_eq_hex(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        // Hex digests are case-insensitive; normalize ASCII letters.
        diff |= x.to_ascii_lowercase() ^ y.to_ascii_lowercase();
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha512_hex_known_vector() {
        assert_eq!(
            sha512_hex("abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn constant_time_eq_is_case_insensitive() {
        assert!(constant_time_eq_hex("aBcDeF", "abcdef"));
        assert!(!constant_time_eq_hex("abcdef", "abcdee"));
        assert!(!constant_time_eq_hex("abc", "abcd"));
    }
}

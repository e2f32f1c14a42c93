// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content integrity for stored files via SHA-256.

use prism_core::error::{PrismError, Result};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Check `data` against a digest recorded at save time.
///
/// A mismatch is reported as [`PrismError::Integrity`] carrying both digests.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<()> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(PrismError::Integrity {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    #[test]
    fn verify_accepts_matching_digest() {
        let digest = hash_bytes(b"%PDF-1.7");
        verify_hash(b"%PDF-1.7", &digest).expect("match");
        verify_hash(b"%PDF-1.7", &digest.to_uppercase()).expect("case-insensitive");
    }

    #[test]
    fn verify_reports_both_digests() {
        let err = verify_hash(b"tampered", EMPTY_SHA256).expect_err("mismatch");
        match err {
            PrismError::Integrity { expected, actual } => {
                assert_eq!(expected, EMPTY_SHA256);
                assert_eq!(actual, hash_bytes(b"tampered"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

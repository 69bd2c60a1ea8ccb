// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Content digest used for Blob identity and inventory dedup (§4.D).

use sha1::{Digest, Sha1};

/// Hex-encoded SHA-1 over a byte string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sha1Digest(String);

impl Sha1Digest {
    pub fn compute(content: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(content);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_digest() {
        let a = Sha1Digest::compute(b"hello");
        let b = Sha1Digest::compute(b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_different_digest() {
        let a = Sha1Digest::compute(b"hello");
        let b = Sha1Digest::compute(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn known_vector() {
        // sha1("") = da39a3ee5e6b4b0d3255bfef95601890afd80709
        let d = Sha1Digest::compute(b"");
        assert_eq!(d.as_str(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }
}

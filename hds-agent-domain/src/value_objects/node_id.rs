// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! 128-bit agent identity, persisted verbatim across restarts (§3, §8.5).

use crate::error::AgentError;
use std::fmt;

/// 16 random bytes, hex-encoded. Generated once on first run and persisted
/// to `node.id` in the working directory; reused verbatim thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh identifier from 16 bytes of randomness.
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(hex::encode(bytes))
    }

    /// Parse a persisted `node.id` file's contents. Whitespace is trimmed;
    /// anything other than exactly 32 hex characters is a fatal
    /// configuration error (§6 "Persisted state").
    pub fn parse(s: &str) -> Result<Self, AgentError> {
        let trimmed = s.trim();
        if trimmed.len() != 32 || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AgentError::Config(format!(
                "node.id must be 32 hex characters, got {:?}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! JSON envelope for inventory and command-output, sent as one line per
//! object on the wire (§3, §6).

use crate::value_objects::{NodeId, Sha1Digest};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// `{type, id, digest, nodeID, timestamp, content}`.
///
/// `id` is a monotonically increasing per-process counter assigned only to
/// inventory blobs (command-output blobs carry `id = 0`); scoped to the
/// single inventory scheduler task so the increment is serial (§9 open
/// question 3).
#[derive(Debug, Clone, Serialize)]
pub struct Blob {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub id: u64,
    pub digest: String,
    #[serde(rename = "nodeID")]
    pub node_id: String,
    pub timestamp: String,
    pub content: serde_json::Value,
}

impl Blob {
    /// Build a blob, computing its digest over the canonical JSON encoding
    /// of `content`. Callers that need dedup stability (the inventory
    /// pipeline) must pass a `content` whose key order is deterministic
    /// across sweeps, e.g. built from a `BTreeMap`.
    pub fn new(type_tag: impl Into<String>, id: u64, node_id: &NodeId, content: serde_json::Value) -> Self {
        let bytes = serde_json::to_vec(&content).unwrap_or_default();
        let digest = Sha1Digest::compute(&bytes);
        Self {
            type_tag: type_tag.into(),
            id,
            digest: digest.as_str().to_string(),
            node_id: node_id.as_str().to_string(),
            timestamp: now_unix_secs(),
            content,
        }
    }

    /// Render as the single-line JSON object the transport writes.
    pub fn to_wire_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn now_unix_secs() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    secs.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_content_same_digest() {
        let node = NodeId::generate();
        let a = Blob::new("inventory.all", 1, &node, json!({"a": 1}));
        let b = Blob::new("inventory.all", 2, &node, json!({"a": 1}));
        assert_eq!(a.digest, b.digest);
    }

    #[test]
    fn wire_line_is_single_json_object() {
        let node = NodeId::generate();
        let blob = Blob::new("execCommand", 0, &node, json!({"status": "success"}));
        let line = blob.to_wire_line().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["type"], "execCommand");
        assert_eq!(parsed["id"], 0);
    }
}

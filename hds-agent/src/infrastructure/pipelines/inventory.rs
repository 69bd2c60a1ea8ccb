// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Groups one inventory sweep by type-tag, dedups by content digest, and
//! emits blobs (§4.D).
//!
//! `sha1cache` and the `Blob.id` counter live on [`InventoryPipeline`]
//! itself rather than on the shared `AgentState`, so the increment is
//! serial by construction (§9 open question 3): exactly one task, the
//! inventory scheduler, ever owns a pipeline instance.

use std::collections::BTreeMap;

use hds_agent_domain::entities::{Blob, InventoryOutcome};
use hds_agent_domain::repositories::BlobSink;
use hds_agent_domain::value_objects::NodeId;

const PACKAGE_PREFIX: &str = "sysinfo.package";
const INVENTORY_ALL: &str = "inventory.all";

/// One collector's outcome, named and type-tagged for grouping.
pub struct InventoryItem {
    pub name: String,
    pub type_tag: String,
    pub outcome: InventoryOutcome,
}

#[derive(Default)]
pub struct InventoryPipeline {
    sha1cache: BTreeMap<String, String>,
    next_id: u64,
}

impl InventoryPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one sweep (already in sorted-name order). Returns the
    /// number of blobs actually enqueued.
    pub fn process(&mut self, node_id: &NodeId, items: &[InventoryItem], sink: &dyn BlobSink) -> usize {
        let mut by_type: BTreeMap<String, BTreeMap<String, serde_json::Value>> = BTreeMap::new();
        let mut any_success = false;

        for item in items {
            let InventoryOutcome::Success { payload } = &item.outcome else {
                continue;
            };
            any_success = true;
            let key = inventory_key(&item.name, &item.type_tag);
            by_type
                .entry(item.type_tag.clone())
                .or_default()
                .entry(key)
                .or_insert_with(|| decode_payload(payload));
        }

        if !any_success {
            tracing::info!("inventory sweep produced no successful collectors");
            return 0;
        }

        let mut emitted = 0;
        for (type_tag, grouped) in by_type {
            let content = serde_json::to_value(&grouped).unwrap_or(serde_json::Value::Null);
            let probe = Blob::new(type_tag.clone(), 0, node_id, content);

            if self.sha1cache.get(&type_tag) == Some(&probe.digest) {
                continue;
            }
            self.sha1cache.insert(type_tag.clone(), probe.digest.clone());
            self.next_id += 1;
            let blob = Blob { id: self.next_id, ..probe };
            if sink.try_send_blob(blob) {
                emitted += 1;
            }
        }
        emitted
    }
}

/// Computes the grouping key for one successful inventory result (§4.D
/// "Grouping key").
fn inventory_key(name: &str, type_tag: &str) -> String {
    if name.starts_with(PACKAGE_PREFIX) {
        return name.to_string();
    }
    if type_tag == INVENTORY_ALL {
        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() == 3 {
            return format!("{}.{}", segments[0], segments[2]);
        }
    }
    name.to_string()
}

/// The reference encoding is JSON; pass through parsed JSON so the
/// grouped object nests it structurally, falling back to a raw string
/// for extractors that emitted something else self-describing.
fn decode_payload(payload: &[u8]) -> serde_json::Value {
    serde_json::from_slice(payload).unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(payload).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CollectingSink {
        blobs: Mutex<Vec<Blob>>,
        full: AtomicUsize,
    }

    impl CollectingSink {
        fn new() -> Self {
            Self {
                blobs: Mutex::new(Vec::new()),
                full: AtomicUsize::new(0),
            }
        }
    }

    impl BlobSink for CollectingSink {
        fn try_send_blob(&self, blob: Blob) -> bool {
            if self.full.load(Ordering::SeqCst) > 0 {
                return false;
            }
            self.blobs.lock().unwrap().push(blob);
            true
        }
    }

    fn success(bytes: &[u8]) -> InventoryOutcome {
        InventoryOutcome::Success { payload: bytes.to_vec() }
    }

    #[test]
    fn sysinfo_package_key_keeps_full_name() {
        assert_eq!(inventory_key("sysinfo.package.rpm", "inventory.other"), "sysinfo.package.rpm");
    }

    #[test]
    fn inventory_all_three_segments_collapses_middle() {
        assert_eq!(inventory_key("sysinfo.bmc.bmc-info", "inventory.all"), "sysinfo.bmc");
        assert_eq!(inventory_key("sysinfo.bmc.ipmi-tool", "inventory.all"), "sysinfo.bmc");
    }

    #[test]
    fn other_names_use_themselves_as_key() {
        assert_eq!(inventory_key("cpu", "inventory.other"), "cpu");
    }

    #[test]
    fn identical_sweep_produces_no_second_blob() {
        let mut pipeline = InventoryPipeline::new();
        let node = NodeId::generate();
        let sink = CollectingSink::new();

        let items = vec![InventoryItem {
            name: "sysinfo.bmc.bmc-info".to_string(),
            type_tag: "inventory.all".to_string(),
            outcome: success(br#"{"a":1}"#),
        }];

        assert_eq!(pipeline.process(&node, &items, &sink), 1);
        assert_eq!(pipeline.process(&node, &items, &sink), 0);
        assert_eq!(sink.blobs.lock().unwrap().len(), 1);
    }

    #[test]
    fn changed_content_increments_id_and_emits_again() {
        let mut pipeline = InventoryPipeline::new();
        let node = NodeId::generate();
        let sink = CollectingSink::new();

        let first = vec![InventoryItem {
            name: "sysinfo.bmc.bmc-info".to_string(),
            type_tag: "inventory.all".to_string(),
            outcome: success(br#"{"a":1}"#),
        }];
        let second = vec![InventoryItem {
            name: "sysinfo.bmc.bmc-info".to_string(),
            type_tag: "inventory.all".to_string(),
            outcome: success(br#"{"a":2}"#),
        }];

        pipeline.process(&node, &first, &sink);
        pipeline.process(&node, &second, &sink);

        let blobs = sink.blobs.lock().unwrap();
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].id, 1);
        assert_eq!(blobs[1].id, 2);
    }

    #[test]
    fn no_successes_emits_nothing() {
        let mut pipeline = InventoryPipeline::new();
        let node = NodeId::generate();
        let sink = CollectingSink::new();

        let items = vec![InventoryItem {
            name: "cpu".to_string(),
            type_tag: "inventory.other".to_string(),
            outcome: InventoryOutcome::Error("boom".to_string()),
        }];

        assert_eq!(pipeline.process(&node, &items, &sink), 0);
    }

    #[test]
    fn first_payload_wins_within_a_merged_key() {
        let mut pipeline = InventoryPipeline::new();
        let node = NodeId::generate();
        let sink = CollectingSink::new();

        let items = vec![
            InventoryItem {
                name: "sysinfo.bmc.bmc-info".to_string(),
                type_tag: "inventory.all".to_string(),
                outcome: success(br#"{"source":"bmc-info"}"#),
            },
            InventoryItem {
                name: "sysinfo.bmc.ipmi-tool".to_string(),
                type_tag: "inventory.all".to_string(),
                outcome: success(br#"{"source":"ipmi-tool"}"#),
            },
        ];

        pipeline.process(&node, &items, &sink);
        let blobs = sink.blobs.lock().unwrap();
        let content = &blobs[0].content;
        assert_eq!(content["sysinfo.bmc"]["source"], "bmc-info");
    }
}

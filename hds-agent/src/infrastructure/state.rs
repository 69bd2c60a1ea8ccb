// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Consolidated agent-wide state (§9 "Global state" redesign note): the
//! metric header cache, per-column metadata, node identity, and hostname
//! live here as one explicit value instead of scattered singletons.
//!
//! Both caches store the fully wire-formatted line (`:=:header ...` /
//! `:=:metadata ...`, complete with nodeID, freqSec, and the `#timestamp`
//! marker), not just the bare header text, so the connection handshake can
//! replay them verbatim (`examples/original_source/agent/metric.go`'s
//! `a.metricHeaders.Map[...] = headers[i]`, replayed by `destination.go`'s
//! `initialSendData()`).
//!
//! The inventory `sha1cache` and `Blob.id` counter are deliberately *not*
//! here — §9 open question 3 scopes them to the single inventory
//! scheduler task so their mutation is serial by construction, not by
//! locking discipline.

use std::collections::BTreeMap;

use hds_agent_domain::error::AgentError;
use hds_agent_domain::repositories::MetadataSetter;
use hds_agent_domain::value_objects::{Frequency, NodeId};
use parking_lot::RwLock;

const ALL_METRICS: &str = ":all";

pub struct AgentState {
    pub node_id: NodeId,
    pub hostname: String,
    /// metric name -> full `:=:header ...` line last sent for it.
    headers: RwLock<BTreeMap<String, String>>,
    /// metric name -> column -> full `:=:metadata ...` line.
    metadata: RwLock<BTreeMap<String, BTreeMap<String, String>>>,
    /// metric name -> its configured cadence, needed to format `freqSec`
    /// when metadata is set outside the pipeline (via [`MetadataSetter`]).
    known_metrics: RwLock<BTreeMap<String, Frequency>>,
}

impl AgentState {
    pub fn new(node_id: NodeId, hostname: String) -> Self {
        Self {
            node_id,
            hostname,
            headers: RwLock::new(BTreeMap::new()),
            metadata: RwLock::new(BTreeMap::new()),
            known_metrics: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn register_metric_name(&self, name: &str, frequency: Frequency) {
        self.known_metrics.write().insert(name.to_string(), frequency);
    }

    /// If `header` differs from the last header cached for `metric_name`,
    /// caches and returns the full wire-formatted header line; returns
    /// `None` if unchanged (§4.E "header-change detection").
    pub fn header_changed(&self, metric_name: &str, freq_sec: &str, header: &str) -> Option<String> {
        let suffix = format!("#timestamp {header}");
        let mut headers = self.headers.write();
        if headers.get(metric_name).is_some_and(|line| line.ends_with(&suffix)) {
            return None;
        }
        let line = format!(":=:header {metric_name} {} {freq_sec} {suffix}", self.node_id);
        headers.insert(metric_name.to_string(), line.clone());
        Some(line)
    }

    /// Formats, caches, and returns the full `:=:metadata ...` line for
    /// one column of `metric_name`, unconditionally overwriting whatever
    /// was cached before (mirrors the original's `setOneMetadata` called
    /// from the header-change path, where the result is never gated on
    /// whether the value actually changed).
    pub fn cache_metadata_line(&self, metric_name: &str, freq_sec: &str, column: &str, descriptor: &str) -> String {
        let line = format!(":=:metadata {metric_name} {} {freq_sec} {column} {descriptor}", self.node_id);
        self.metadata.write().entry(metric_name.to_string()).or_default().insert(column.to_string(), line.clone());
        line
    }

    /// Cached header lines, ready to replay verbatim at the connection
    /// handshake (§4.G).
    pub fn header_snapshot(&self) -> Vec<String> {
        self.headers.read().values().cloned().collect()
    }

    /// Cached metadata lines, ready to replay verbatim at the connection
    /// handshake (§4.G).
    pub fn metadata_snapshot(&self) -> Vec<String> {
        self.metadata.read().values().flat_map(|columns| columns.values().cloned()).collect()
    }
}

impl MetadataSetter for AgentState {
    fn set_metadata(&self, metric: &str, name: &str, value: &str, notify_peer: bool) -> Result<bool, AgentError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(AgentError::InvalidMetadata(format!("column name {name:?} is empty or contains whitespace")));
        }
        if value.contains('\n') {
            return Err(AgentError::InvalidMetadata("value must not contain a newline".to_string()));
        }

        let known = self.known_metrics.read();
        let targets: Vec<String> = if metric == ALL_METRICS {
            known.keys().cloned().collect()
        } else {
            if !known.contains_key(metric) {
                return Err(AgentError::UnknownMetric(metric.to_string()));
            }
            vec![metric.to_string()]
        };

        let mut any_changed = false;
        let mut metadata = self.metadata.write();
        for target in &targets {
            let freq_sec = known.get(target).copied().unwrap_or(Frequency::ONCE).as_wire_string();
            let columns = metadata.entry(target.clone()).or_default();
            let changed = if value.is_empty() {
                columns.remove(name).is_some()
            } else {
                let line = format!(":=:metadata {target} {} {freq_sec} {name} {value}", self.node_id);
                let old = columns.insert(name.to_string(), line.clone());
                old.as_deref() != Some(line.as_str())
            };
            any_changed |= changed;
        }

        // `notify_peer` is honored by the caller, which holds the outbound
        // sink this module doesn't have access to; it only reports whether
        // anything changed.
        let _ = notify_peer;
        Ok(any_changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_changed_true_on_first_header() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        assert!(state.header_changed("cpu", "30", "a b c").is_some());
    }

    #[test]
    fn header_changed_false_when_identical() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        state.header_changed("cpu", "30", "a b c");
        assert!(state.header_changed("cpu", "30", "a b c").is_none());
    }

    #[test]
    fn header_changed_true_when_different() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        state.header_changed("cpu", "30", "a b c");
        assert!(state.header_changed("cpu", "30", "a b c d").is_some());
    }

    #[test]
    fn header_snapshot_contains_nodeid_and_freq() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        state.header_changed("cpu", "30", "a b c");
        let snapshot = state.header_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].starts_with(&format!(":=:header cpu {} 30 #timestamp a b c", state.node_id)));
    }

    #[test]
    fn metadata_snapshot_contains_nodeid_and_freq() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        state.register_metric_name("cpu", Frequency::from_secs(30));
        state.set_metadata("cpu", "unit", "percent", false).unwrap();
        let snapshot = state.metadata_snapshot();
        assert_eq!(snapshot, vec![format!(":=:metadata cpu {} 30 unit percent", state.node_id)]);
    }

    #[test]
    fn set_metadata_rejects_whitespace_in_name() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        state.register_metric_name("cpu", Frequency::from_secs(30));
        assert!(state.set_metadata("cpu", "bad name", "v", false).is_err());
    }

    #[test]
    fn set_metadata_rejects_newline_in_value() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        state.register_metric_name("cpu", Frequency::from_secs(30));
        assert!(state.set_metadata("cpu", "name", "a\nb", false).is_err());
    }

    #[test]
    fn set_metadata_rejects_unknown_metric() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        assert!(matches!(state.set_metadata("ghost", "name", "v", false), Err(AgentError::UnknownMetric(_))));
    }

    #[test]
    fn set_metadata_empty_value_deletes_entry() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        state.register_metric_name("cpu", Frequency::from_secs(30));
        assert!(state.set_metadata("cpu", "unit", "percent", false).unwrap());
        assert!(state.set_metadata("cpu", "unit", "", false).unwrap());
        assert!(state.metadata_snapshot().is_empty());
    }

    #[test]
    fn set_metadata_all_applies_to_every_known_metric() {
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        state.register_metric_name("cpu", Frequency::from_secs(30));
        state.register_metric_name("memory", Frequency::from_secs(30));
        state.set_metadata(":all", "unit", "percent", false).unwrap();
        assert_eq!(state.metadata_snapshot().len(), 2);
    }
}

// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Formats one collector's run into header/metadata/data lines (§4.E).

use std::time::{SystemTime, UNIX_EPOCH};

use hds_agent_domain::entities::MetricResult;
use hds_agent_domain::value_objects::{Frequency, NodeId};

use crate::infrastructure::state::AgentState;
use crate::infrastructure::transport::OutboundSink;

const HIDDEN_PREFIX: &str = "hidden.";

/// Formats and enqueues every [`MetricResult`] from one collector run.
/// `collector_name` is the registry name (without suffix); each result's
/// own `suffix` is appended to form the wire metric name.
pub fn emit(state: &AgentState, sink: &OutboundSink, collector_name: &str, node_id: &NodeId, frequency: Frequency, results: &[MetricResult]) {
    for result in results {
        emit_one(state, sink, collector_name, node_id, frequency, result);
    }
}

fn emit_one(state: &AgentState, sink: &OutboundSink, collector_name: &str, node_id: &NodeId, frequency: Frequency, result: &MetricResult) {
    if result.is_empty_header() {
        return;
    }

    let hidden = collector_name.starts_with(HIDDEN_PREFIX);
    let (header, values) = if hidden {
        (result.header.clone(), result.values.clone())
    } else {
        (result.header.trim().to_string(), result.values.trim().to_string())
    };

    let metric_name = match &result.suffix {
        Some(suffix) => format!("{collector_name}{suffix}"),
        None => collector_name.to_string(),
    };
    let freq_sec = frequency.as_wire_string();

    if let Some(header_line) = state.header_changed(&metric_name, &freq_sec, &header) {
        sink.try_send_line(header_line);
        for (column, descriptor) in &result.metadata {
            sink.try_send_line(state.cache_metadata_line(&metric_name, &freq_sec, column, descriptor));
        }
    }

    let unix_time = now_unix_secs();
    sink.try_send_line(format!(":=:{metric_name} {node_id} {freq_sec} {unix_time} {values}"));
}

fn now_unix_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

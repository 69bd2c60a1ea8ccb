// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Per-filesystem disk usage via `df -kP` (§3 "disk" metric). One
//! [`MetricResult`] per mounted filesystem, suffixed `-<mount>`.
//!
//! §9 open question 1: a data line split on whitespace that yields zero
//! fields (a stray blank line `df` sometimes emits) is skipped outright
//! rather than treated as a malformed row worth an error; a short-but-
//! nonzero split is still an extraction error.

use hds_agent_domain::entities::MetricResult;
use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::MetricExtractor;

use super::capture;

const HEADER: &str = "blocks1k used available capacityPercent";

pub struct DiskUsageCollector;

impl MetricExtractor for DiskUsageCollector {
    fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
        let output = capture("df", &["-kP"])?;
        parse_df(&output)
    }
}

fn parse_df(output: &str) -> Result<Vec<MetricResult>, AgentError> {
    let mut results = Vec::new();
    for line in output.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 6 {
            return Err(AgentError::Extraction(format!("malformed df line: {line}")));
        }

        let blocks = fields[1];
        let used = fields[2];
        let available = fields[3];
        let capacity = fields[4].trim_end_matches('%');
        let mount = fields[5..].join(" ");

        let values = format!("{blocks} {used} {available} {capacity}");
        results.push(MetricResult::new(HEADER, values).with_suffix(format!("-{mount}")));
    }
    Ok(results)
}

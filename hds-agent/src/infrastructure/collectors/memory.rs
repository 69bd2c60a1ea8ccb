// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Memory usage from `/proc/meminfo` (§3 "memory" metric), all values in
//! kilobytes as the kernel reports them.

use hds_agent_domain::entities::MetricResult;
use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::MetricExtractor;

const PROC_MEMINFO: &str = "/proc/meminfo";
const HEADER: &str = "total free available buffers cached swapTotal swapFree";
const FIELDS: &[&str] = &["MemTotal", "MemFree", "MemAvailable", "Buffers", "Cached", "SwapTotal", "SwapFree"];

pub struct MemoryCollector;

impl MetricExtractor for MemoryCollector {
    fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
        let contents = std::fs::read_to_string(PROC_MEMINFO)?;
        let parsed = parse_meminfo(&contents);

        let mut values = Vec::with_capacity(FIELDS.len());
        for field in FIELDS {
            let value = parsed.get(*field).copied().unwrap_or(0);
            values.push(value.to_string());
        }

        Ok(vec![MetricResult::new(HEADER, values.join(" "))])
    }
}

fn parse_meminfo(contents: &str) -> std::collections::BTreeMap<&str, u64> {
    let mut out = std::collections::BTreeMap::new();
    for line in contents.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let kb: u64 = rest.split_whitespace().next().and_then(|s| s.parse().ok()).unwrap_or(0);
        out.insert(key, kb);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kb_values() {
        let sample = "MemTotal:       16384000 kB\nMemFree:         1024000 kB\n";
        let parsed = parse_meminfo(sample);
        assert_eq!(parsed.get("MemTotal"), Some(&16384000));
        assert_eq!(parsed.get("MemFree"), Some(&1024000));
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let parsed = parse_meminfo("MemTotal: 100 kB\n");
        assert_eq!(parsed.get("SwapFree"), None);
    }
}

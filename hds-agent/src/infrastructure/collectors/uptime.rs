// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! System uptime from `/proc/uptime` (§3 "uptime" metric), seconds since
//! boot with fractional jiffies truncated.

use hds_agent_domain::entities::MetricResult;
use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::MetricExtractor;

const PROC_UPTIME: &str = "/proc/uptime";
const HEADER: &str = "uptimeSeconds";

pub struct UptimeCollector;

impl MetricExtractor for UptimeCollector {
    fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
        let contents = std::fs::read_to_string(PROC_UPTIME)?;
        let seconds: f64 = contents
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| AgentError::Extraction("malformed /proc/uptime".to_string()))?;

        Ok(vec![MetricResult::new(HEADER, (seconds as u64).to_string())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_fractional_seconds() {
        let seconds: f64 = "12345.67 54321.00".split_whitespace().next().unwrap().parse().unwrap();
        assert_eq!(seconds as u64, 12345);
    }
}

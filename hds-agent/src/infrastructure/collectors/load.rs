// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Load averages from `/proc/loadavg` (§3 "load" metric).

use hds_agent_domain::entities::MetricResult;
use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::MetricExtractor;

const PROC_LOADAVG: &str = "/proc/loadavg";
const HEADER: &str = "load1 load5 load15";

pub struct LoadCollector;

impl MetricExtractor for LoadCollector {
    fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
        let contents = std::fs::read_to_string(PROC_LOADAVG)?;
        let fields: Vec<&str> = contents.split_whitespace().take(3).collect();
        if fields.len() < 3 {
            return Err(AgentError::Extraction("short /proc/loadavg".to_string()));
        }
        Ok(vec![MetricResult::new(HEADER, fields.join(" "))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_three_fields() {
        let sample = "0.10 0.20 0.30 1/200 12345";
        let fields: Vec<&str> = sample.split_whitespace().take(3).collect();
        assert_eq!(fields.join(" "), "0.10 0.20 0.30");
    }
}

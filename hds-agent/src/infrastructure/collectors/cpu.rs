// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! CPU time breakdown from `/proc/stat` (§3 "cpu" metric).

use hds_agent_domain::entities::MetricResult;
use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::MetricExtractor;

const PROC_STAT: &str = "/proc/stat";
const HEADER: &str = "user nice system idle iowait irq softirq steal";

pub struct CpuCollector;

impl MetricExtractor for CpuCollector {
    fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
        let contents = std::fs::read_to_string(PROC_STAT)?;
        let line = contents
            .lines()
            .find(|l| l.starts_with("cpu "))
            .ok_or_else(|| AgentError::Extraction("no aggregate cpu line in /proc/stat".to_string()))?;

        let fields: Vec<&str> = line.split_whitespace().skip(1).take(8).collect();
        if fields.len() < 8 {
            return Err(AgentError::Extraction("short cpu line in /proc/stat".to_string()));
        }

        Ok(vec![MetricResult::new(HEADER, fields.join(" "))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aggregate_line() {
        let sample = "cpu  1 2 3 4 5 6 7 8\ncpu0 1 1 1 1 1 1 1 1\n";
        let line = sample.lines().find(|l| l.starts_with("cpu ")).unwrap();
        let fields: Vec<&str> = line.split_whitespace().skip(1).take(8).collect();
        assert_eq!(fields, vec!["1", "2", "3", "4", "5", "6", "7", "8"]);
    }
}

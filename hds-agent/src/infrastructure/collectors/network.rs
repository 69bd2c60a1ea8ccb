// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Per-interface network counters from `/proc/net/dev` (§3 "network"
//! metric). One [`MetricResult`] per interface, suffixed `-<iface>` so
//! each gets its own wire metric name (§4.E "per-device suffix").

use hds_agent_domain::entities::MetricResult;
use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::MetricExtractor;

const PROC_NET_DEV: &str = "/proc/net/dev";
const HEADER: &str = "rxBytes rxPackets rxErrs rxDrop txBytes txPackets txErrs txDrop";

pub struct NetworkCollector;

impl MetricExtractor for NetworkCollector {
    fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
        let contents = std::fs::read_to_string(PROC_NET_DEV)?;
        Ok(parse_net_dev(&contents))
    }
}

fn parse_net_dev(contents: &str) -> Vec<MetricResult> {
    let mut results = Vec::new();
    for line in contents.lines().skip(2) {
        let Some((iface, rest)) = line.split_once(':') else {
            continue;
        };
        let iface = iface.trim();
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 16 {
            continue;
        }
        // Receive: bytes packets errs drop fifo frame compressed multicast (0..8)
        // Transmit: bytes packets errs drop fifo colls carrier compressed (8..16)
        let values = [fields[0], fields[1], fields[2], fields[3], fields[8], fields[9], fields[10], fields[11]].join(" ");
        results.push(MetricResult::new(HEADER, values).with_suffix(format!("-{iface}")));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Inter-|   Receive                                                |  Transmit\n face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n    lo: 100 1 0 0 0 0 0 0 100 1 0 0 0 0 0 0\n  eth0: 200 2 0 0 0 0 0 0 300 3 0 0 0 0 0 0\n";

    #[test]
    fn parses_one_result_per_interface() {
        let results = parse_net_dev(SAMPLE);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].suffix.as_deref(), Some("-lo"));
        assert_eq!(results[1].suffix.as_deref(), Some("-eth0"));
    }

    #[test]
    fn extracts_rx_and_tx_columns() {
        let results = parse_net_dev(SAMPLE);
        assert_eq!(results[1].values, "200 2 0 0 300 3 0 0");
    }
}

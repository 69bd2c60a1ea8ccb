// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Metric collectors backed by an external helper binary. Each is a thin
//! pass-through: the helper's own output becomes the metric line, so
//! these are modeled only by their dependency contract, not by parsing
//! `smartctl`/`ipmitool` output byte-for-byte (§1 Non-goal).

use hds_agent_domain::entities::MetricResult;
use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::MetricExtractor;

use super::capture;

pub struct SmartCollector;

impl MetricExtractor for SmartCollector {
    fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
        let mut results = Vec::new();
        for device in list_block_devices()? {
            let output = capture("smartctl", &["-A", "-H", &device])?;
            let (header, values) = first_two_nonblank_lines(&output);
            if header.is_empty() {
                continue;
            }
            results.push(MetricResult::new(header, values).with_suffix(format!("-{}", device_suffix(&device))));
        }
        Ok(results)
    }
}

pub struct IpmiCollector;

impl MetricExtractor for IpmiCollector {
    fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
        let output = capture("ipmitool", &["sensor"])?;
        let (header, values) = first_two_nonblank_lines(&output);
        if header.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![MetricResult::new(header, values)])
    }
}

fn list_block_devices() -> Result<Vec<String>, AgentError> {
    let mut devices = Vec::new();
    for entry in std::fs::read_dir("/sys/block")?.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("loop") || name.starts_with("ram") {
            continue;
        }
        devices.push(format!("/dev/{name}"));
    }
    Ok(devices)
}

fn device_suffix(device: &str) -> String {
    device.rsplit('/').next().unwrap_or(device).to_string()
}

fn first_two_nonblank_lines(output: &str) -> (String, String) {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().unwrap_or_default().to_string();
    let values = lines.next().unwrap_or_default().to_string();
    (header, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_suffix_strips_path() {
        assert_eq!(device_suffix("/dev/sda"), "sda");
    }

    #[test]
    fn skips_blank_lines() {
        let (header, values) = first_two_nonblank_lines("\n\nid value\n1 2\n");
        assert_eq!(header, "id value");
        assert_eq!(values, "1 2");
    }
}

// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Inventory collectors backed by an external helper binary. Each wraps
//! the helper's stdout as a JSON string payload (§4.F "opaque payload"),
//! leaving interpretation to the downstream consumer of the blob stream.

use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::InventoryExtractor;

use super::capture;

fn json_string_payload(text: String) -> Result<Vec<u8>, AgentError> {
    Ok(serde_json::to_vec(&serde_json::Value::String(text))?)
}

pub struct RpmPackagesCollector;
impl InventoryExtractor for RpmPackagesCollector {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        json_string_payload(capture("rpm", &["-qa"])?)
    }
}

pub struct DpkgPackagesCollector;
impl InventoryExtractor for DpkgPackagesCollector {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        json_string_payload(capture("dpkg-query", &["-W", "-f=${Package} ${Version}\n"])?)
    }
}

pub struct PciCollector;
impl InventoryExtractor for PciCollector {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        json_string_payload(capture("lspci", &["-mm"])?)
    }
}

pub struct UsbCollector;
impl InventoryExtractor for UsbCollector {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        json_string_payload(capture("lsusb", &[])?)
    }
}

pub struct NicsCollector;
impl InventoryExtractor for NicsCollector {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        let mut report = String::new();
        for entry in std::fs::read_dir("/sys/class/net")?.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Ok(output) = capture("ethtool", &[&name]) {
                report.push_str(&format!("{name}:\n{output}\n"));
            }
        }
        json_string_payload(report)
    }
}

pub struct SmbiosCollector;
impl InventoryExtractor for SmbiosCollector {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        json_string_payload(capture("dmidecode", &[])?)
    }
}

pub struct BmcCollector;
impl InventoryExtractor for BmcCollector {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        json_string_payload(capture("ipmitool", &["fru"])?)
    }
}

pub struct ScsiCollector;
impl InventoryExtractor for ScsiCollector {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        json_string_payload(capture("lsscsi", &[])?)
    }
}

/// No dependency: reads the kernel's own EDAC log lines out of `dmesg`
/// rather than a separate helper binary.
pub struct EccCollector;
impl InventoryExtractor for EccCollector {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        let output = capture("dmesg", &[])?;
        let edac: String = output.lines().filter(|l| l.contains("EDAC")).collect::<Vec<_>>().join("\n");
        json_string_payload(edac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_string_payload_wraps_as_json_string() {
        let payload = json_string_payload("hello".to_string()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value, serde_json::Value::String("hello".to_string()));
    }
}

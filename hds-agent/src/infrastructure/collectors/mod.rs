// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Built-in collector extractors (§1 "out of scope": each is modeled only
//! by its contract). The `/proc`-backed ones (cpu, memory, load, uptime,
//! network, disk usage) do their own parsing; the ones that shell out to
//! a helper utility (`smartctl`, `ipmitool`, `lspci`, `lsusb`, `ethtool`,
//! `dmidecode`, `rpm`/`dpkg-query`) are thin pass-through wrappers whose
//! dependency list drives precheck (§4.A "Dependency-miss is precheck
//! failure").

mod cpu;
mod disk_usage;
mod external_inventory;
mod external_metric;
mod load;
mod memory;
mod network;
mod uptime;

use std::sync::Arc;
use std::time::Duration;

use hds_agent_domain::entities::{CollectorMeta, CollectorOrigin};
use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::{InventoryExtractor, MetricExtractor};
use hds_agent_domain::value_objects::Frequency;

use crate::infrastructure::registry::CollectorRegistry;

/// Runs a helper binary with the given arguments and captures stdout,
/// failing if it exits non-zero.
fn capture(cmd: &str, args: &[&str]) -> Result<String, AgentError> {
    let output = std::process::Command::new(cmd).args(args).output()?;
    if !output.status.success() {
        return Err(AgentError::Extraction(format!("{cmd} exited with {}", output.status)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `true` if `name` resolves to an executable file somewhere on `PATH`.
fn binary_on_path(name: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(name).is_file()))
        .unwrap_or(false)
}

/// Generic precheck: every named dependency must resolve on `PATH`.
fn precheck_dependencies(dependencies: &[String]) -> Result<(), AgentError> {
    for dep in dependencies {
        if !binary_on_path(dep) {
            return Err(AgentError::Precheck {
                collector: dep.clone(),
                reason: format!("{dep} not found on PATH"),
            });
        }
    }
    Ok(())
}

/// `true` if this builtin should be registered already-stopped: its
/// precheck failed, or its name (or `all`) was passed to `-skip` (§6,
/// §4.A "Built-in collectors are constructed once at init, set stopped
/// if ... name in skip-set").
fn should_stop(name: &str, precheck: Result<(), AgentError>, is_skipped: &dyn Fn(&str) -> bool) -> bool {
    if is_skipped(name) {
        tracing::info!(collector = %name, "collector skipped by configuration, registering as stopped");
        return true;
    }
    if let Err(err) = precheck {
        tracing::warn!(collector = %name, error = %err, "precheck failed, registering as stopped");
        return true;
    }
    false
}

fn add_metric(registry: &CollectorRegistry, meta: CollectorMeta, extractor: Arc<dyn MetricExtractor>, is_skipped: &dyn Fn(&str) -> bool) {
    let precheck = precheck_dependencies(&meta.dependencies).and_then(|_| extractor.precheck());
    if should_stop(&meta.name, precheck, is_skipped) {
        meta.budget.stop();
    }
    registry.add_metric(meta, extractor);
}

fn add_inventory(registry: &CollectorRegistry, meta: CollectorMeta, extractor: Arc<dyn InventoryExtractor>, is_skipped: &dyn Fn(&str) -> bool) {
    let precheck = precheck_dependencies(&meta.dependencies).and_then(|_| extractor.precheck());
    if should_stop(&meta.name, precheck, is_skipped) {
        meta.budget.stop();
    }
    registry.add_inventory(meta, extractor);
}

/// Registers every built-in collector at the configured `frequency` and
/// `collection_timeout` (§3 "Lifecycle": constructed once at init).
/// `is_skipped` is `ValidatedCli::is_skipped`, threaded through as a
/// closure so this module doesn't depend on the bootstrap crate's CLI type.
pub fn register_builtins(registry: &CollectorRegistry, collection_timeout: Duration, frequency: Frequency, is_skipped: &dyn Fn(&str) -> bool) {
    add_metric(
        registry,
        CollectorMeta::new_metric("cpu", CollectorOrigin::Builtin, "metric.cpu", vec![], collection_timeout, frequency),
        Arc::new(cpu::CpuCollector),
        is_skipped,
    );
    add_metric(
        registry,
        CollectorMeta::new_metric("memory", CollectorOrigin::Builtin, "metric.memory", vec![], collection_timeout, frequency),
        Arc::new(memory::MemoryCollector),
        is_skipped,
    );
    add_metric(
        registry,
        CollectorMeta::new_metric("load", CollectorOrigin::Builtin, "metric.load", vec![], collection_timeout, frequency),
        Arc::new(load::LoadCollector),
        is_skipped,
    );
    add_metric(
        registry,
        CollectorMeta::new_metric("uptime", CollectorOrigin::Builtin, "metric.uptime", vec![], collection_timeout, frequency),
        Arc::new(uptime::UptimeCollector),
        is_skipped,
    );
    add_metric(
        registry,
        CollectorMeta::new_metric("network", CollectorOrigin::Builtin, "metric.network", vec![], collection_timeout, frequency),
        Arc::new(network::NetworkCollector),
        is_skipped,
    );
    add_metric(
        registry,
        CollectorMeta::new_metric(
            "disk",
            CollectorOrigin::Builtin,
            "metric.disk",
            vec!["df".to_string()],
            collection_timeout,
            frequency,
        ),
        Arc::new(disk_usage::DiskUsageCollector),
        is_skipped,
    );
    add_metric(
        registry,
        CollectorMeta::new_metric(
            "smart",
            CollectorOrigin::Builtin,
            "metric.smart",
            vec!["smartctl".to_string()],
            collection_timeout,
            frequency,
        ),
        Arc::new(external_metric::SmartCollector),
        is_skipped,
    );
    add_metric(
        registry,
        CollectorMeta::new_metric(
            "ipmi",
            CollectorOrigin::Builtin,
            "metric.ipmi",
            vec!["ipmitool".to_string()],
            collection_timeout,
            frequency,
        ),
        Arc::new(external_metric::IpmiCollector),
        is_skipped,
    );

    add_inventory(
        registry,
        CollectorMeta::new_inventory(
            "sysinfo.package.rpm",
            CollectorOrigin::Builtin,
            "inventory.other",
            vec!["rpm".to_string()],
            collection_timeout,
        ),
        Arc::new(external_inventory::RpmPackagesCollector),
        is_skipped,
    );
    add_inventory(
        registry,
        CollectorMeta::new_inventory(
            "sysinfo.package.dpkg",
            CollectorOrigin::Builtin,
            "inventory.other",
            vec!["dpkg-query".to_string()],
            collection_timeout,
        ),
        Arc::new(external_inventory::DpkgPackagesCollector),
        is_skipped,
    );
    add_inventory(
        registry,
        CollectorMeta::new_inventory(
            "sysinfo.pci",
            CollectorOrigin::Builtin,
            "inventory.other",
            vec!["lspci".to_string()],
            collection_timeout,
        ),
        Arc::new(external_inventory::PciCollector),
        is_skipped,
    );
    add_inventory(
        registry,
        CollectorMeta::new_inventory(
            "sysinfo.usb",
            CollectorOrigin::Builtin,
            "inventory.other",
            vec!["lsusb".to_string()],
            collection_timeout,
        ),
        Arc::new(external_inventory::UsbCollector),
        is_skipped,
    );
    add_inventory(
        registry,
        CollectorMeta::new_inventory(
            "sysinfo.nics",
            CollectorOrigin::Builtin,
            "inventory.other",
            vec!["ethtool".to_string()],
            collection_timeout,
        ),
        Arc::new(external_inventory::NicsCollector),
        is_skipped,
    );
    add_inventory(
        registry,
        CollectorMeta::new_inventory(
            "sysinfo.smbios.dmidecode",
            CollectorOrigin::Builtin,
            "inventory.all",
            vec!["dmidecode".to_string()],
            collection_timeout,
        ),
        Arc::new(external_inventory::SmbiosCollector),
        is_skipped,
    );
    add_inventory(
        registry,
        CollectorMeta::new_inventory(
            "sysinfo.bmc.ipmi-tool",
            CollectorOrigin::Builtin,
            "inventory.all",
            vec!["ipmitool".to_string()],
            collection_timeout,
        ),
        Arc::new(external_inventory::BmcCollector),
        is_skipped,
    );
    add_inventory(
        registry,
        CollectorMeta::new_inventory(
            "sysinfo.scsi",
            CollectorOrigin::Builtin,
            "inventory.other",
            vec!["lsscsi".to_string()],
            collection_timeout,
        ),
        Arc::new(external_inventory::ScsiCollector),
        is_skipped,
    );
    add_inventory(
        registry,
        CollectorMeta::new_inventory("sysinfo.ecc", CollectorOrigin::Builtin, "inventory.other", vec![], collection_timeout),
        Arc::new(external_inventory::EccCollector),
        is_skipped,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_on_path_finds_a_real_binary() {
        assert!(binary_on_path("ls"));
        assert!(!binary_on_path("definitely-not-a-real-binary-xyz"));
    }

    #[test]
    fn precheck_dependencies_fails_on_missing_binary() {
        assert!(precheck_dependencies(&["definitely-not-a-real-binary-xyz".to_string()]).is_err());
        assert!(precheck_dependencies(&[]).is_ok());
    }

    #[test]
    fn should_stop_honors_skip_before_precheck() {
        assert!(should_stop("cpu", Ok(()), &|name| name == "cpu"));
        assert!(!should_stop("cpu", Ok(()), &|_| false));
        assert!(should_stop("cpu", Err(AgentError::Extraction("x".to_string())), &|_| false));
    }

    #[test]
    fn register_builtins_stops_skipped_collectors() {
        let registry = CollectorRegistry::new();
        register_builtins(&registry, Duration::from_secs(30), Frequency::from_secs(30), &|name| name == "cpu");

        let cpu = registry.get_metric("cpu").unwrap();
        assert!(!cpu.meta.budget.is_running());

        let memory = registry.get_metric("memory").unwrap();
        assert!(memory.meta.budget.is_running());
    }
}

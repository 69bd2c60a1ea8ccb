// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `-dry-run` (§4.I, S1): runs every collector against a detached sink
//! for a fixed window, then prints a summary of what would have been
//! sent, instead of opening the network transport.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use hds_agent_bootstrap::platform::{self, Platform};
use hds_agent_bootstrap::shutdown::ShutdownCoordinator;
use hds_agent_bootstrap::{ExitCode, ValidatedCli};
use hds_agent_domain::value_objects::Frequency;

use crate::infrastructure::collectors::register_builtins;
use crate::infrastructure::registry::CollectorRegistry;
use crate::infrastructure::scheduler::Scheduler;
use crate::infrastructure::state::AgentState;
use crate::infrastructure::transport::{load_or_create_node_id, OutboundSink};
use crate::infrastructure::userscript::UserScriptSupervisor;

/// How long to let collectors run before summarizing (§4.I "~10s").
const CAPTURE_WINDOW: Duration = Duration::from_secs(10);

pub async fn run(cli: ValidatedCli) -> ExitCode {
    let node_id = match load_or_create_node_id(&cli.chdir) {
        Ok(node_id) => node_id,
        Err(err) => {
            tracing::error!(error = %err, "failed to resolve node.id");
            return ExitCode::ConfigError;
        }
    };

    let platform: Arc<dyn Platform> = Arc::from(platform::create_platform());
    let state = Arc::new(AgentState::new(node_id, platform.hostname()));
    let registry = Arc::new(CollectorRegistry::new());

    let frequency = if cli.frequency.is_zero() {
        Frequency::ONCE
    } else {
        Frequency::from_secs(cli.frequency.as_secs())
    };
    register_builtins(&registry, cli.collection_timeout, frequency, &|name| cli.is_skipped(name));

    let (sink, mut rx) = OutboundSink::detached(1024, cli.stdout);
    let shutdown = ShutdownCoordinator::default();

    let scheduler = Arc::new(Scheduler::new(registry.clone(), state, sink, cli.collection_timeout, shutdown.token()));
    scheduler.start_all_metrics();
    scheduler.spawn_inventory_scheduler(!frequency.is_once());

    let supervisor = Arc::new(UserScriptSupervisor::new(
        registry.clone(),
        scheduler.clone(),
        platform,
        cli.chdir.clone(),
        cli.collection_timeout,
        frequency,
    ));
    if let Err(err) = supervisor.start() {
        tracing::warn!(error = %err, "user-script watch did not start during dry run");
    }

    tokio::time::sleep(CAPTURE_WINDOW).await;

    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }

    print_summary(&registry, &lines, cli.frequency.as_secs());
    ExitCode::DryRunComplete
}

/// Prints the dry-run report mandated by S1: a labeled block of the
/// metric header/value pairs observed, the collectors that are running
/// versus stopped, the items/bytes sent in one capture iteration, and
/// that same volume projected over one hour via `timesSent =
/// 3600/frequency` (grounded on
/// `examples/original_source/agent/dryrun.go`'s `dryRunResults`/
/// `projectDataSize`; collector pass/fail is read directly from the
/// registry's budget state rather than re-parsed out of log text, since
/// this agent already has that state in hand).
fn print_summary(registry: &CollectorRegistry, lines: &[String], frequency_secs: u64) {
    println!("-------- dry run results --------");
    println!("metric header columns and values that were collected");

    let mut by_metric: BTreeMap<String, (Option<&str>, Option<&str>)> = BTreeMap::new();
    let mut items = 0u64;
    let mut bytes = 0u64;

    for line in lines {
        bytes += line.len() as u64;
        if let Some(rest) = line.strip_prefix(":=:header ") {
            if let Some(name) = rest.split_whitespace().next() {
                by_metric.entry(name.to_string()).or_default().0 = Some(line);
            }
        } else if let Some(rest) = line.strip_prefix(":=:") {
            if rest.starts_with("metadata ") {
                continue;
            }
            items += 1;
            if let Some(name) = rest.split_whitespace().next() {
                by_metric.entry(name.to_string()).or_default().1 = Some(line);
            }
        } else {
            items += 1;
        }
    }

    for (name, (header, values)) in &by_metric {
        println!("--------{name}");
        println!("{}", header.unwrap_or(""));
        println!("----");
        println!("{}", values.unwrap_or(""));
    }
    println!("------------");

    let passed = collector_names(registry, true);
    let failed = collector_names(registry, false);
    println!("Collectors report:");
    println!("{} successfully running collectors: {}", passed.len(), passed.join(", "));
    println!("{} failed collectors: {}", failed.len(), failed.join(", "));

    println!("{items} items ({bytes} bytes) will be sent during one iteration");

    let (estimated_items, estimated_bytes) = if frequency_secs > 0 {
        let times_sent = 3600 / frequency_secs;
        (times_sent * items, times_sent * bytes)
    } else {
        (items, bytes)
    };
    println!(
        "{estimated_items} items ({estimated_bytes} bytes) will be sent over one hour since we have -frequency {frequency_secs} seconds"
    );
}

fn collector_names(registry: &CollectorRegistry, running: bool) -> Vec<String> {
    registry
        .metric_snapshot()
        .iter()
        .map(|entry| (&entry.meta.name, entry.meta.budget.is_running()))
        .chain(registry.inventory_snapshot().iter().map(|entry| (&entry.meta.name, entry.meta.budget.is_running())))
        .filter(|(_, is_running)| *is_running == running)
        .map(|(name, _)| name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_summary_does_not_panic_on_mixed_input() {
        let registry = CollectorRegistry::new();
        let lines = vec![
            ":=:header cpu nodeid 30 #timestamp user sys".to_string(),
            ":=:cpu nodeid 30 12345 1 2".to_string(),
            "{\"type\":\"inventory.other\"}".to_string(),
        ];
        // Smoke test only: print_summary has no return value to assert on
        // directly, so this just confirms it doesn't panic on mixed input.
        print_summary(&registry, &lines, 60);
    }

    #[test]
    fn collector_names_splits_running_from_stopped() {
        let registry = CollectorRegistry::new();
        assert!(collector_names(&registry, true).is_empty());
        assert!(collector_names(&registry, false).is_empty());
    }
}

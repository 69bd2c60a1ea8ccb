// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Normal (non-`-dry-run`) operation: registers built-ins, starts the
//! scheduler and user-script supervisor, and drives the transport until
//! shutdown (§4.I).

use std::sync::Arc;

use hds_agent_bootstrap::platform::{self, Platform};
use hds_agent_bootstrap::shutdown::ShutdownCoordinator;
use hds_agent_bootstrap::signals::UnixSignalHandler;
use hds_agent_bootstrap::{ExitCode, ValidatedCli};
use hds_agent_domain::value_objects::Frequency;

use crate::infrastructure::collectors::register_builtins;
use crate::infrastructure::dispatcher::CommandDispatcher;
use crate::infrastructure::registry::CollectorRegistry;
use crate::infrastructure::scheduler::Scheduler;
use crate::infrastructure::state::AgentState;
use crate::infrastructure::transport::{channel_capacity, load_or_create_node_id, Transport};
use crate::infrastructure::userscript::UserScriptSupervisor;

/// Runs the agent until shutdown completes, returning the process exit
/// code. A failure resolving `node.id` is a config error (§8 invariant 5).
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

    let coordinator = ShutdownCoordinator::default();
    coordinator.spawn_signal_listener(Arc::new(UnixSignalHandler::new()));
    coordinator.spawn_duration_watchdog(cli.duration);

    let dispatcher = Arc::new(CommandDispatcher::new(state.clone(), platform.clone()));
    let capacity = channel_capacity(registry.inventory_names_sorted().len());
    let (transport, sink) = Transport::new(
        cli.destination.clone(),
        cli.retrywait,
        capacity,
        cli.stdout,
        state.clone(),
        dispatcher.clone(),
        coordinator.token(),
        coordinator.grace_period(),
    );

    let scheduler = Arc::new(Scheduler::new(registry.clone(), state.clone(), sink, cli.collection_timeout, coordinator.token()));
    scheduler.start_all_metrics();
    scheduler.spawn_inventory_scheduler(!frequency.is_once());

    let supervisor = Arc::new(UserScriptSupervisor::new(
        registry.clone(),
        scheduler.clone(),
        platform.clone(),
        cli.chdir.clone(),
        cli.collection_timeout,
        frequency,
    ));
    if let Err(err) = supervisor.start() {
        tracing::warn!(error = %err, "user-script watch did not start, continuing with built-ins only");
    }

    transport.run().await;

    ExitCode::Success
}

// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Runs each collector on its cadence with a timeout and failure budget
//! (§4.C). One long-lived task per metric collector plus one for
//! inventory; a bounded per-collector work queue absorbs ticks that
//! arrive while the previous run is still in flight (§9 "Goroutine-per-
//! tick").

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use hds_agent_domain::entities::InventoryOutcome;
use hds_agent_domain::repositories::BlobSink;
use hds_agent_domain::value_objects::Frequency;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use hds_agent_bootstrap::shutdown::CancellationToken;

use crate::infrastructure::pipelines::inventory::{InventoryItem, InventoryPipeline};
use crate::infrastructure::pipelines::metric;
use crate::infrastructure::registry::{CollectorRegistry, RegisteredInventory, RegisteredMetric};
use crate::infrastructure::state::AgentState;
use crate::infrastructure::transport::OutboundSink;

/// Per-collector work queue capacity. A policy choice, not a protocol
/// requirement (§9): large enough to absorb a transient slow run without
/// losing cadence, small enough that a permanently wedged extractor
/// cannot accumulate unbounded memory.
const WORK_QUEUE_CAPACITY: usize = 100;

/// Inventory sweep cadence when at least one metric collector runs
/// periodically (§4.C).
const INVENTORY_FREQUENCY: Duration = Duration::from_secs(30 * 60);

enum RunOutcome<T> {
    Success(T),
    Error(String),
    Timeout,
}

pub struct Scheduler {
    registry: Arc<CollectorRegistry>,
    state: Arc<AgentState>,
    sink: OutboundSink,
    collection_timeout: Duration,
    shutdown: CancellationToken,
    metric_tokens: RwLock<BTreeMap<String, CancellationToken>>,
}

impl Scheduler {
    pub fn new(registry: Arc<CollectorRegistry>, state: Arc<AgentState>, sink: OutboundSink, collection_timeout: Duration, shutdown: CancellationToken) -> Self {
        Self {
            registry,
            state,
            sink,
            collection_timeout,
            shutdown,
            metric_tokens: RwLock::new(BTreeMap::new()),
        }
    }

    /// Starts every currently-registered metric collector that is still
    /// `running` (builtins not disabled by precheck or `-skip`).
    pub fn start_all_metrics(&self) {
        for entry in self.registry.metric_snapshot() {
            self.start_metric(&entry.meta.name);
        }
    }

    /// Starts (or, if already running, no-ops) the named collector's
    /// ticker and worker. Called at startup for builtins and by the
    /// user-script supervisor when a metric script appears (§4.F).
    pub fn start_metric(&self, name: &str) {
        if self.metric_tokens.read().contains_key(name) {
            return;
        }
        let Some(entry) = self.registry.get_metric(name) else {
            return;
        };
        if !entry.meta.budget.is_running() {
            return;
        }

        let token = self.shutdown.child_token();
        self.metric_tokens.write().insert(name.to_string(), token.clone());

        let frequency = entry.meta.frequency.unwrap_or(Frequency::ONCE);
        let state = self.state.clone();
        let sink = self.sink.clone();
        let collection_timeout = self.collection_timeout;

        tokio::spawn(run_metric_collector(entry, state, sink, frequency, collection_timeout, token));
    }

    /// Cancels the named collector's ticker/worker (§4.F "Rename or
    /// Remove"). The caller is responsible for removing it from the
    /// registry afterward.
    pub fn kill_metric(&self, name: &str) {
        if let Some(token) = self.metric_tokens.write().remove(name) {
            token.cancel();
        }
    }

    /// Spawns the single inventory sweep task. `any_metric_periodic`
    /// decides run-once vs. the 30-minute ticker (§4.C).
    pub fn spawn_inventory_scheduler(&self, any_metric_periodic: bool) {
        let registry = self.registry.clone();
        let state = self.state.clone();
        let sink = self.sink.clone();
        let collection_timeout = self.collection_timeout;
        let shutdown = self.shutdown.child_token();

        tokio::spawn(async move {
            let mut pipeline = InventoryPipeline::new();
            run_inventory_sweep(&registry, &state, &sink, collection_timeout, &mut pipeline).await;

            if !any_metric_periodic {
                return;
            }

            let mut interval = tokio::time::interval(INVENTORY_FREQUENCY);
            interval.tick().await; // consume the immediate first tick; the sweep above already ran
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        run_inventory_sweep(&registry, &state, &sink, collection_timeout, &mut pipeline).await;
                    }
                    _ = shutdown.cancelled() => return,
                }
            }
        });
    }
}

async fn run_inventory_sweep(registry: &CollectorRegistry, state: &AgentState, sink: &OutboundSink, timeout: Duration, pipeline: &mut InventoryPipeline) {
    let mut items = Vec::new();
    for entry in registry.inventory_snapshot() {
        if !entry.meta.budget.is_running() {
            continue;
        }
        let outcome = run_inventory_once(&entry, timeout).await;
        items.push(InventoryItem {
            name: entry.meta.name.clone(),
            type_tag: entry.meta.type_tag.clone(),
            outcome,
        });
    }

    let emitted = pipeline.process(&state.node_id, &items, sink as &dyn BlobSink);
    tracing::debug!(emitted, collectors = items.len(), "inventory sweep complete");
}

async fn run_inventory_once(entry: &Arc<RegisteredInventory>, timeout: Duration) -> InventoryOutcome {
    let extractor = entry.extractor.clone();
    let run = tokio::task::spawn_blocking(move || extractor.run());

    match tokio::time::timeout(timeout, run).await {
        Err(_) => {
            entry.meta.budget.record_timeout();
            InventoryOutcome::Timeout
        }
        Ok(Err(join_err)) => {
            entry.meta.budget.record_error();
            InventoryOutcome::Error(format!("worker task failed: {join_err}"))
        }
        Ok(Ok(Err(err))) => {
            entry.meta.budget.record_error();
            InventoryOutcome::Error(err.to_string())
        }
        Ok(Ok(Ok(payload))) => {
            entry.meta.budget.record_success();
            InventoryOutcome::Success { payload }
        }
    }
}

async fn run_metric_collector(entry: Arc<RegisteredMetric>, state: Arc<AgentState>, sink: OutboundSink, frequency: Frequency, collection_timeout: Duration, token: CancellationToken) {
    state.register_metric_name(&entry.meta.name, frequency);

    if let Err(err) = entry.extractor.precheck() {
        tracing::warn!(collector = %entry.meta.name, error = %err, "precheck failed, collector disabled");
        entry.meta.budget.stop();
        return;
    }

    let (tx, mut rx) = mpsc::channel::<()>(WORK_QUEUE_CAPACITY);
    let _ = tx.try_send(()); // initial burst (§4.C)

    let worker_entry = entry.clone();
    let worker_state = state.clone();
    let worker_sink = sink.clone();
    let worker_token = token.clone();
    let worker = tokio::spawn(async move {
        loop {
            tokio::select! {
                received = rx.recv() => {
                    match received {
                        Some(()) => run_metric_once(&worker_entry, &worker_state, &worker_sink, frequency, collection_timeout).await,
                        None => return,
                    }
                }
                _ = worker_token.cancelled() => return,
            }
        }
    });

    if frequency.is_once() {
        drop(tx);
        let _ = worker.await;
        entry.meta.budget.stop();
        return;
    }

    let mut interval = tokio::time::interval(frequency.as_duration());
    interval.tick().await; // the initial burst above already covers the first observation
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if !entry.meta.budget.is_running() {
                    break;
                }
                if tx.try_send(()).is_err() {
                    tracing::warn!(collector = %entry.meta.name, "work queue full, dropping tick");
                }
            }
            _ = token.cancelled() => break,
        }
    }
    drop(tx);
    let _ = worker.await;
}

async fn run_metric_once(entry: &Arc<RegisteredMetric>, state: &AgentState, sink: &OutboundSink, frequency: Frequency, timeout: Duration) {
    let extractor = entry.extractor.clone();
    let run = tokio::task::spawn_blocking(move || extractor.run());

    let outcome = match tokio::time::timeout(timeout, run).await {
        Err(_) => RunOutcome::Timeout,
        Ok(Err(join_err)) => RunOutcome::Error(format!("worker task failed: {join_err}")),
        Ok(Ok(inner)) => match inner {
            Ok(results) => RunOutcome::Success(results),
            Err(err) => RunOutcome::Error(err.to_string()),
        },
    };

    match outcome {
        RunOutcome::Success(results) => {
            entry.meta.budget.record_success();
            metric::emit(state, sink, &entry.meta.name, &state.node_id, frequency, &results);
        }
        RunOutcome::Error(err) => {
            tracing::warn!(collector = %entry.meta.name, error = %err, "extractor error");
            entry.meta.budget.record_error();
        }
        RunOutcome::Timeout => {
            tracing::warn!(collector = %entry.meta.name, "extractor timed out");
            entry.meta.budget.record_timeout();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hds_agent_domain::entities::{CollectorMeta, CollectorOrigin, MetricResult};
    use hds_agent_domain::error::AgentError;
    use hds_agent_domain::value_objects::NodeId;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyMetric {
        failures_remaining: AtomicU32,
    }

    impl hds_agent_domain::services::MetricExtractor for FlakyMetric {
        fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
            if self.failures_remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| if n > 0 { Some(n - 1) } else { None }).is_ok() {
                Err(AgentError::Extraction("induced failure".to_string()))
            } else {
                Ok(vec![MetricResult::new("a b", "1 2")])
            }
        }
    }

    fn metric_entry(failures: u32) -> Arc<RegisteredMetric> {
        let meta = CollectorMeta::new_metric(
            "flaky",
            CollectorOrigin::Builtin,
            "metric.flaky",
            vec![],
            Duration::from_secs(30),
            Frequency::from_secs(60),
        );
        Arc::new(RegisteredMetric {
            meta,
            extractor: Arc::new(FlakyMetric {
                failures_remaining: AtomicU32::new(failures),
            }),
        })
    }

    #[tokio::test]
    async fn run_metric_once_records_error_then_recovers() {
        let entry = metric_entry(1);
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        let (sink, mut rx) = OutboundSink::for_test(16);

        run_metric_once(&entry, &state, &sink, Frequency::from_secs(60), Duration::from_secs(5)).await;
        assert_eq!(entry.meta.budget.errors(), 1);
        assert!(rx.try_recv().is_err());

        run_metric_once(&entry, &state, &sink, Frequency::from_secs(60), Duration::from_secs(5)).await;
        assert_eq!(entry.meta.budget.errors(), 0);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn five_consecutive_errors_stop_the_collector() {
        let entry = metric_entry(10);
        let state = AgentState::new(NodeId::generate(), "host".to_string());
        let (sink, _rx) = OutboundSink::for_test(16);

        for _ in 0..5 {
            run_metric_once(&entry, &state, &sink, Frequency::from_secs(60), Duration::from_secs(5)).await;
        }
        assert!(!entry.meta.budget.is_running());
    }
}

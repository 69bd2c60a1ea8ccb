// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Recursively watches `<chdir>/Inventory` and `<chdir>/Metrics`, adding
//! and removing user collectors as executable scripts appear, move, or
//! disappear (§4.F).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hds_agent_domain::entities::{CollectorMeta, CollectorOrigin, MetricResult};
use hds_agent_domain::error::AgentError;
use hds_agent_domain::services::{InventoryExtractor, MetricExtractor};
use hds_agent_domain::value_objects::Frequency;
use notify::{EventKind, RecursiveMode, Watcher};
use notify::event::ModifyKind;

use hds_agent_bootstrap::platform::Platform;

use crate::infrastructure::registry::CollectorRegistry;
use crate::infrastructure::scheduler::Scheduler;

const USER_METRIC_PREFIX: &str = "user.";
const INVENTORY_TYPE_TAG: &str = "inventory.user";
const METRIC_TYPE_TAG: &str = "metric.user";

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScriptKind {
    Inventory,
    Metric,
}

impl ScriptKind {
    fn dir_name(self) -> &'static str {
        match self {
            ScriptKind::Inventory => "Inventory",
            ScriptKind::Metric => "Metrics",
        }
    }

    /// §4.B "User-script naming rule": `X.ext` becomes `X` for inventory,
    /// `user.X` for metric (avoids colliding with a built-in of the same
    /// name and is recognized by the scheduler as dynamically added).
    fn collector_name(self, path: &Path) -> String {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        match self {
            ScriptKind::Inventory => stem,
            ScriptKind::Metric => format!("{USER_METRIC_PREFIX}{stem}"),
        }
    }
}

pub struct UserScriptSupervisor {
    registry: Arc<CollectorRegistry>,
    scheduler: Arc<Scheduler>,
    platform: Arc<dyn Platform>,
    workdir: PathBuf,
    collection_timeout: Duration,
    metric_frequency: Frequency,
}

impl UserScriptSupervisor {
    pub fn new(registry: Arc<CollectorRegistry>, scheduler: Arc<Scheduler>, platform: Arc<dyn Platform>, workdir: PathBuf, collection_timeout: Duration, metric_frequency: Frequency) -> Self {
        Self {
            registry,
            scheduler,
            platform,
            workdir,
            collection_timeout,
            metric_frequency,
        }
    }

    /// Establishes both watches and performs the initial bulk scan.
    /// Each watch runs its dispatch loop on a blocking task for the
    /// lifetime of the process; there is no explicit stop, matching the
    /// "watcher loop continues until channel closes" behavior (§4.F).
    pub fn start(self: Arc<Self>) -> Result<(), AgentError> {
        self.clone().watch_kind(ScriptKind::Inventory)?;
        self.watch_kind(ScriptKind::Metric)?;
        Ok(())
    }

    fn watch_kind(self: Arc<Self>, kind: ScriptKind) -> Result<(), AgentError> {
        let dir = self.workdir.join(kind.dir_name());
        std::fs::create_dir_all(&dir)?;
        self.bulk_add(&dir, kind);

        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx).map_err(|e| AgentError::Io(e.to_string()))?;
        watcher
            .watch(&dir, RecursiveMode::Recursive)
            .map_err(|e| AgentError::Io(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _watcher = watcher;
            for event in rx {
                match event {
                    Ok(event) => self.handle_event(kind, event),
                    Err(err) => tracing::warn!(error = %err, "user-script watch error"),
                }
            }
        });
        Ok(())
    }

    fn handle_event(&self, kind: ScriptKind, event: notify::Event) {
        match event.kind {
            EventKind::Create(_) => {
                for path in &event.paths {
                    if path.is_dir() {
                        self.bulk_add(path, kind);
                    } else {
                        self.maybe_add(path, kind);
                    }
                }
            }
            EventKind::Remove(_) => {
                for path in &event.paths {
                    self.remove(path, kind);
                }
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                for path in &event.paths {
                    if path.exists() {
                        self.maybe_add(path, kind);
                    } else {
                        self.remove(path, kind);
                    }
                }
            }
            _ => {}
        }
    }

    /// Adds every already-executable file directly under `dir` (non
    /// recursive; subdirectories arrive as their own `Create` events
    /// under the recursive watch, §4.F "Create (directory)").
    fn bulk_add(&self, dir: &Path, kind: ScriptKind) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                self.maybe_add(&path, kind);
            }
        }
    }

    fn maybe_add(&self, path: &Path, kind: ScriptKind) {
        if !path.is_file() || !self.platform.is_executable(path) {
            return;
        }
        let name = kind.collector_name(path);

        match kind {
            ScriptKind::Inventory => {
                let meta = CollectorMeta::new_inventory(name.clone(), CollectorOrigin::User, INVENTORY_TYPE_TAG, vec![], self.collection_timeout);
                let extractor: Arc<dyn InventoryExtractor> = Arc::new(UserScriptInventoryExtractor { path: path.to_path_buf() });
                if !self.registry.add_inventory(meta, extractor) {
                    tracing::info!(collector = %name, "user inventory script already registered");
                }
            }
            ScriptKind::Metric => {
                let meta = CollectorMeta::new_metric(name.clone(), CollectorOrigin::User, METRIC_TYPE_TAG, vec![], self.collection_timeout, self.metric_frequency);
                let extractor: Arc<dyn MetricExtractor> = Arc::new(UserScriptMetricExtractor { path: path.to_path_buf() });
                if self.registry.add_metric(meta, extractor) {
                    self.scheduler.start_metric(&name);
                } else {
                    tracing::info!(collector = %name, "user metric script already registered");
                }
            }
        }
    }

    fn remove(&self, path: &Path, kind: ScriptKind) {
        let name = kind.collector_name(path);
        match kind {
            ScriptKind::Inventory => {
                self.registry.remove_inventory(&name);
            }
            ScriptKind::Metric => {
                self.scheduler.kill_metric(&name);
                self.registry.remove_metric(&name);
            }
        }
    }
}

struct UserScriptInventoryExtractor {
    path: PathBuf,
}

impl InventoryExtractor for UserScriptInventoryExtractor {
    fn run(&self) -> Result<Vec<u8>, AgentError> {
        let output = std::process::Command::new(&self.path).output()?;
        if !output.status.success() {
            return Err(AgentError::Extraction(format!("script exited with {}", output.status)));
        }
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(serde_json::to_vec(&serde_json::Value::String(stdout))?)
    }
}

struct UserScriptMetricExtractor {
    path: PathBuf,
}

impl MetricExtractor for UserScriptMetricExtractor {
    fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
        let output = std::process::Command::new(&self.path).output()?;
        if !output.status.success() {
            return Err(AgentError::Extraction(format!("script exited with {}", output.status)));
        }
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let mut lines = stdout.lines();
        let header = lines.next().unwrap_or_default().to_string();
        let values = lines.next().unwrap_or_default().to_string();

        if stdout.lines().count() != 2 {
            tracing::warn!(script = %self.path.display(), "metric script did not emit exactly two lines, using the first two anyway");
        }
        Ok(vec![MetricResult::new(header, values)])
    }
}

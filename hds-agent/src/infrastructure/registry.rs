// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Collector registry (§4.B): two name-keyed maps, one per kind, guarded
//! by `parking_lot::RwLock`. `add` under an existing name is a no-op
//! (logged); `remove` is left to the caller to restrict to user-origin
//! collectors, since the registry itself doesn't know why a removal was
//! requested.

use std::collections::BTreeMap;
use std::sync::Arc;

use hds_agent_domain::entities::CollectorMeta;
use hds_agent_domain::services::{InventoryExtractor, MetricExtractor};
use parking_lot::RwLock;

pub struct RegisteredMetric {
    pub meta: CollectorMeta,
    pub extractor: Arc<dyn MetricExtractor>,
}

pub struct RegisteredInventory {
    pub meta: CollectorMeta,
    pub extractor: Arc<dyn InventoryExtractor>,
}

#[derive(Default)]
pub struct CollectorRegistry {
    metrics: RwLock<BTreeMap<String, Arc<RegisteredMetric>>>,
    inventories: RwLock<BTreeMap<String, Arc<RegisteredInventory>>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the collector was newly added; `false` (logged
    /// by the caller) if the name already existed.
    pub fn add_metric(&self, meta: CollectorMeta, extractor: Arc<dyn MetricExtractor>) -> bool {
        let mut metrics = self.metrics.write();
        if metrics.contains_key(&meta.name) {
            return false;
        }
        let name = meta.name.clone();
        metrics.insert(name, Arc::new(RegisteredMetric { meta, extractor }));
        true
    }

    pub fn add_inventory(&self, meta: CollectorMeta, extractor: Arc<dyn InventoryExtractor>) -> bool {
        let mut inventories = self.inventories.write();
        if inventories.contains_key(&meta.name) {
            return false;
        }
        let name = meta.name.clone();
        inventories.insert(name, Arc::new(RegisteredInventory { meta, extractor }));
        true
    }

    pub fn remove_metric(&self, name: &str) -> Option<Arc<RegisteredMetric>> {
        self.metrics.write().remove(name)
    }

    pub fn remove_inventory(&self, name: &str) -> Option<Arc<RegisteredInventory>> {
        self.inventories.write().remove(name)
    }

    pub fn get_metric(&self, name: &str) -> Option<Arc<RegisteredMetric>> {
        self.metrics.read().get(name).cloned()
    }

    pub fn get_inventory(&self, name: &str) -> Option<Arc<RegisteredInventory>> {
        self.inventories.read().get(name).cloned()
    }

    /// Sorted snapshot, taken under the read lock (§4.B "snapshot-keys").
    pub fn metric_names_sorted(&self) -> Vec<String> {
        self.metrics.read().keys().cloned().collect()
    }

    pub fn inventory_names_sorted(&self) -> Vec<String> {
        self.inventories.read().keys().cloned().collect()
    }

    pub fn metric_snapshot(&self) -> Vec<Arc<RegisteredMetric>> {
        self.metrics.read().values().cloned().collect()
    }

    pub fn inventory_snapshot(&self) -> Vec<Arc<RegisteredInventory>> {
        self.inventories.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hds_agent_domain::error::AgentError;
    use hds_agent_domain::entities::MetricResult;

    struct StubMetric;
    impl MetricExtractor for StubMetric {
        fn run(&self) -> Result<Vec<MetricResult>, AgentError> {
            Ok(vec![])
        }
    }

    fn cpu_meta() -> CollectorMeta {
        CollectorMeta::new_metric(
            "cpu",
            hds_agent_domain::entities::CollectorOrigin::Builtin,
            "metric.cpu",
            vec![],
            std::time::Duration::from_secs(30),
            hds_agent_domain::value_objects::Frequency::ONCE,
        )
    }

    #[test]
    fn add_metric_rejects_duplicate_name() {
        let registry = CollectorRegistry::new();

        assert!(registry.add_metric(cpu_meta(), Arc::new(StubMetric)));
        assert!(!registry.add_metric(cpu_meta(), Arc::new(StubMetric)));
        assert_eq!(registry.metric_names_sorted(), vec!["cpu".to_string()]);
    }

    #[test]
    fn remove_metric_returns_removed_entry() {
        let registry = CollectorRegistry::new();
        registry.add_metric(cpu_meta(), Arc::new(StubMetric));

        assert!(registry.remove_metric("cpu").is_some());
        assert!(registry.get_metric("cpu").is_none());
    }

    #[test]
    fn names_are_sorted() {
        let registry = CollectorRegistry::new();
        for name in ["memory", "cpu", "disk"] {
            let meta = CollectorMeta::new_metric(name, hds_agent_domain::entities::CollectorOrigin::Builtin, "metric.x", vec![], std::time::Duration::from_secs(30), hds_agent_domain::value_objects::Frequency::ONCE);
            registry.add_metric(meta, Arc::new(StubMetric));
        }
        assert_eq!(registry.metric_names_sorted(), vec!["cpu", "disk", "memory"]);
    }
}

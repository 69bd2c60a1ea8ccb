// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! One logical table produced by a metric collector run (§3).

use std::collections::BTreeMap;

/// `header`/`values` share arity; `metadata` maps column name to a
/// free-form descriptor beginning with a type tag (`int|float|string`).
/// `suffix` disambiguates multiple logical tables from one collector
/// (e.g. `-sas`, `-ata`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricResult {
    pub header: String,
    pub values: String,
    pub suffix: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl MetricResult {
    pub fn new(header: impl Into<String>, values: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            values: values.into(),
            suffix: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_metadata(mut self, column: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.metadata.insert(column.into(), descriptor.into());
        self
    }

    /// Records with an empty header are skipped in full by the metric
    /// pipeline (§4.E).
    pub fn is_empty_header(&self) -> bool {
        self.header.is_empty()
    }
}

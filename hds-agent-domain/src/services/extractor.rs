// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Two extractor shapes (§4.A): metric producers yield zero or more
//! [`MetricResult`](crate::entities::MetricResult) rows; inventory producers
//! yield one opaque encoded document.
//!
//! Extractors are plain synchronous functions — they block on `/proc`,
//! `/sys`, or a spawned helper binary. The scheduler in `hds-agent` is
//! responsible for running them under a deadline (via `spawn_blocking` +
//! `tokio::time::timeout`); the trait itself makes no promise about
//! cancellation mid-call (§5 "Cancellation").

use crate::entities::MetricResult;
use crate::error::AgentError;

/// Produces metric rows on demand.
pub trait MetricExtractor: Send + Sync {
    /// Must pass before the collector is enabled. The default accepts
    /// unconditionally; collectors with an external binary dependency
    /// override this to check `PATH`.
    fn precheck(&self) -> Result<(), AgentError> {
        Ok(())
    }

    /// Run once, returning zero or more result rows or an error.
    fn run(&self) -> Result<Vec<MetricResult>, AgentError>;
}

/// Produces one opaque, self-describing encoded document per run.
pub trait InventoryExtractor: Send + Sync {
    fn precheck(&self) -> Result<(), AgentError> {
        Ok(())
    }

    /// Run once, returning the encoded document bytes or an error.
    fn run(&self) -> Result<Vec<u8>, AgentError>;
}

// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Layer
//!
//! Pure data model and trait contracts for the host telemetry agent. This
//! crate has no knowledge of tokio, sockets, or the filesystem: everything
//! here is the vocabulary that the registry, scheduler, pipelines, transport
//! and dispatcher (all in `hds-agent`) are built out of.
//!
//! ## Layout
//!
//! - [`entities`] — `Collector`/`FailureBudget`, `MetricResult`, `Inventory`,
//!   `Blob`, `Command`, `SyslogRecord`.
//! - [`value_objects`] — `NodeId`, `Frequency`, `Sha1Digest`.
//! - [`services`] — the `MetricExtractor`/`InventoryExtractor` contracts
//!   that platform-specific extractors implement.
//! - [`repositories`] — the `BlobSink`/`MetadataSetter` capabilities handed
//!   to collectors so they never reach back into agent-wide state.
//! - [`error`] — `AgentError`, the single error type used end to end.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use error::AgentError;

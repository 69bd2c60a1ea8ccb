// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Opaque capabilities passed down to pipelines, replacing the original
//! design's global `AgentState` reach-back (§9 redesign note).

use crate::entities::Blob;
use crate::error::AgentError;

/// Non-blocking enqueue of an outbound blob. Implementations try-send and
/// drop on a full channel, logging the drop (§4.G "Non-blocking send",
/// §8 invariant 7).
pub trait BlobSink: Send + Sync {
    /// Returns `true` if the blob was enqueued, `false` if it was dropped
    /// because the outbound channel was full.
    fn try_send_blob(&self, blob: Blob) -> bool;
}

/// Capability for collectors/pipelines to mutate per-column metric
/// metadata without reaching into agent-wide state directly (§4.E
/// "Metadata mutation API").
pub trait MetadataSetter: Send + Sync {
    /// Returns `Ok(changed)` where `changed` is whether the stored value
    /// actually differed from what was already there.
    fn set_metadata(
        &self,
        metric: &str,
        name: &str,
        value: &str,
        notify_peer: bool,
    ) -> Result<bool, AgentError>;
}

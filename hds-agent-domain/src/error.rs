// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Single error type shared by collectors, pipelines, and the runtime.

use thiserror::Error;

/// Errors surfaced by collector extraction, metadata mutation, and the
/// command dispatcher.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A dependency (external binary) required by a collector is missing
    /// from `PATH`, or the collector's precheck otherwise failed.
    #[error("precheck failed for {collector}: {reason}")]
    Precheck { collector: String, reason: String },

    /// The extractor ran and returned an error.
    #[error("extractor error: {0}")]
    Extraction(String),

    /// The extractor did not complete within its deadline.
    #[error("extractor timed out")]
    Timeout,

    /// `setMetadata` was called with an invalid name or value.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// `setMetadata` referenced a metric that isn't registered.
    #[error("unknown metric collector: {0}")]
    UnknownMetric(String),

    /// A resolved path escaped its expected root (command artifact
    /// extraction, run-file resolution).
    #[error("path traversal rejected: {0}")]
    PathTraversal(String),

    /// Generic I/O failure, wrapped so call sites don't need to match on
    /// `std::io::Error` directly.
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON encode/decode failure.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Configuration is invalid (fatal at startup, §7).
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for AgentError {
    fn from(e: std::io::Error) -> Self {
        AgentError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(e: serde_json::Error) -> Self {
        AgentError::Encoding(e.to_string())
    }
}

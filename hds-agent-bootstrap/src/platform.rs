// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Platform Abstraction Module
//!
//! A small `Platform` trait isolating the handful of OS calls the agent
//! actually needs: a node-identity fallback (hostname), the destination
//! for downloaded command artifacts (temp dir), the executable-bit check
//! before running a downloaded or discovered user script, and the chmod
//! applied to a freshly-downloaded artifact (§4.F, §4.H).
//!
//! Linux and macOS are the only supported targets; there is no Windows
//! implementation.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::UnixPlatform;

/// Platform-specific errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not supported on this platform: {0}")]
    NotSupported(String),
}

/// Platform abstraction trait for the handful of OS-specific operations
/// the agent performs outside of `/proc`/`/sys` reads (which go through
/// the extractor traits instead).
pub trait Platform: Send + Sync {
    /// Best-effort machine hostname, used only as a log field; node
    /// identity itself comes from the generated/persisted [`NodeId`]
    /// (hds_agent_domain::value_objects::NodeId), never from this.
    fn hostname(&self) -> String;

    /// Directory downloaded command artifacts are written into before
    /// execution (§4.H).
    fn temp_dir(&self) -> PathBuf;

    /// `true` if the execute bit is set on `path`.
    fn is_executable(&self, path: &Path) -> bool;

    /// Sets Unix permission bits on `path` (used to chmod a downloaded
    /// artifact to `0700` before executing it, §4.H step 6).
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError>;
}

#[cfg(unix)]
type PlatformImpl = UnixPlatform;

/// Returns the platform implementation selected at compile time.
pub fn create_platform() -> Box<dyn Platform> {
    Box::new(PlatformImpl::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_platform_returns_nonempty_hostname() {
        let platform = create_platform();
        assert!(!platform.hostname().is_empty());
    }

    #[test]
    fn temp_dir_exists() {
        let platform = create_platform();
        assert!(platform.temp_dir().exists());
    }
}

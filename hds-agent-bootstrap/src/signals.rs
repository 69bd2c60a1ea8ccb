// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Signal handling for graceful shutdown (§4.I, §9 "Signal handling").
//!
//! `SIGKILL` cannot be intercepted by any process on any platform, so the
//! `{INT, KILL, TERM}` trio named in §4.I is honored as `{INT, TERM}` here;
//! receiving `KILL` always terminates the process immediately regardless of
//! what any handler does. This is a property of the OS, not a design
//! choice, and is recorded in DESIGN.md.

use std::future::Future;
use std::pin::Pin;

pub type ShutdownCallback = Box<dyn FnOnce() + Send + 'static>;

/// Abstracts platform-specific signal handling so it can be mocked in
/// tests.
pub trait SystemSignals: Send + Sync {
    /// Waits for SIGINT or SIGTERM, then invokes the callback once.
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

#[cfg(unix)]
pub struct UnixSignalHandler;

#[cfg(unix)]
impl UnixSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl Default for UnixSignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl SystemSignals for UnixSignalHandler {
    fn wait_for_signal(&self, on_shutdown: ShutdownCallback) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
            let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");

            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    tracing::info!("received SIGINT, initiating graceful shutdown");
                }
            }

            on_shutdown();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn wait_for_signal_invokes_callback_on_sigterm() {
        let handler = UnixSignalHandler::new();
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();

        let wait = tokio::spawn(async move {
            handler
                .wait_for_signal(Box::new(move || fired_clone.store(true, Ordering::SeqCst)))
                .await;
        });

        // Give the handler a moment to register before signalling.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        unsafe {
            libc::raise(libc::SIGTERM);
        }

        tokio::time::timeout(std::time::Duration::from_secs(2), wait)
            .await
            .expect("signal handler did not fire in time")
            .unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }
}

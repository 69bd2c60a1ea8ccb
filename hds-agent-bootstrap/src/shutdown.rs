// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! Coordinates graceful shutdown across the scheduler, pipelines, and
//! transport (§4.I "Agent Root", §9 "Signal handling" redesign note).
//!
//! On `SIGINT`/`SIGTERM` or expiry of the `-duration` watchdog, the
//! coordinator cancels its token, which causes the scheduler to stop
//! arming new collector runs and every collector's state to flip to
//! `Stopped`. The transport reads `grace_period()` and, once connected,
//! flushes whatever is already queued for up to that long before closing
//! the socket and letting the caller exit `0`. This replaces the literal
//! behavior described in the original agent, which exits with status `1`
//! on signal receipt with no drain window; an abrupt exit there was an
//! artifact of the original's lack of a shutdown primitive; it was not
//! something worth preserving.
//!
//! ## Usage
//!
//! ```rust
//! use hds_agent_bootstrap::shutdown::ShutdownCoordinator;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
//!     let token = coordinator.token();
//!
//!     tokio::spawn(async move {
//!         tokio::select! {
//!             _ = token.cancelled() => {}
//!             _ = tokio::time::sleep(Duration::from_secs(1)) => {}
//!         }
//!     });
//!
//!     coordinator.initiate_shutdown();
//!     coordinator.wait_for_shutdown().await;
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::signals::{ShutdownCallback, SystemSignals};

/// Default grace period for graceful shutdown.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;

/// Lightweight clone-able cancellation flag, passed to every long-running
/// task (scheduler loop, pipeline workers, transport writer).
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }

    /// Creates an independent token that also cancels whenever `self`
    /// does, without `self` observing the child's own cancellation.
    /// Used to give one collector's ticker/worker pair a cancellation
    /// source that both the global shutdown and a targeted per-collector
    /// kill (§4.F) can trigger.
    pub fn child_token(&self) -> CancellationToken {
        let child = CancellationToken::new();
        let parent = self.clone();
        let child_for_task = child.clone();
        tokio::spawn(async move {
            parent.cancelled().await;
            child_for_task.cancel();
        });
        child
    }
}

/// Owns the token, the grace period, and the plumbing to wait for drain
/// completion or time out.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    grace_period: Duration,
    shutdown_initiated: Arc<AtomicBool>,
    shutdown_complete: Arc<Notify>,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            grace_period,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_complete: Arc::new(Notify::new()),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Flips the shutdown flag and cancels the token. Idempotent: a second
    /// call (e.g. the duration watchdog firing after a signal already did)
    /// is a no-op.
    pub fn initiate_shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::info!(grace_period_secs = self.grace_period.as_secs(), "initiating graceful shutdown");
            self.token.cancel();
        }
    }

    /// Waits for the drain to report complete, or for the grace period to
    /// expire. Returns `true` if the drain finished cleanly.
    pub async fn wait_for_shutdown(&self) -> bool {
        if !self.is_shutting_down() {
            tracing::warn!("wait_for_shutdown called before shutdown was initiated");
            return true;
        }

        tokio::select! {
            _ = self.shutdown_complete.notified() => {
                tracing::info!("shutdown drain completed within grace period");
                true
            }
            _ = tokio::time::sleep(self.grace_period) => {
                tracing::warn!("shutdown grace period expired before drain completed");
                false
            }
        }
    }

    pub fn complete_shutdown(&self) {
        self.shutdown_complete.notify_waiters();
    }

    pub async fn wait_with_timeout(&self, timeout: Duration) -> bool {
        if !self.is_shutting_down() {
            return true;
        }

        tokio::select! {
            _ = self.shutdown_complete.notified() => true,
            _ = tokio::time::sleep(timeout) => false,
        }
    }

    /// Spawns a task that waits on `signals` and calls `initiate_shutdown`
    /// once INT or TERM arrives (§4.I).
    pub fn spawn_signal_listener(&self, signals: Arc<dyn SystemSignals>) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let callback: ShutdownCallback = Box::new(move || {});
            signals.wait_for_signal(callback).await;
            coordinator.initiate_shutdown();
        });
    }

    /// Spawns the `-duration` watchdog (§4.I: "if Duration > 0, after that
    /// many seconds it calls Stop"). A `duration` of zero means unbounded
    /// runtime and spawns nothing.
    pub fn spawn_duration_watchdog(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            tracing::info!(duration_secs = duration.as_secs(), "duration watchdog expired");
            coordinator.initiate_shutdown();
        });
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancellation_token_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancellation_token_clone_shares_state() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();
        token1.cancel();
        assert!(token2.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_if_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_wakes_on_cancel() {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token_clone.cancel();
        });

        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn child_token_cancels_when_parent_does() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        assert!(!child.is_cancelled());
        parent.cancel();
        child.cancelled().await;
        assert!(child.is_cancelled());
    }

    #[test]
    fn child_token_can_cancel_independently_of_parent() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn coordinator_starts_not_shutting_down() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        assert!(!coordinator.is_shutting_down());
    }

    #[test]
    fn coordinator_default_uses_default_grace_period() {
        let coordinator = ShutdownCoordinator::default();
        assert!(!coordinator.is_shutting_down());
        assert_eq!(coordinator.grace_period(), Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS));
    }

    #[test]
    fn initiate_shutdown_cancels_token() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.initiate_shutdown();
        assert!(coordinator.is_shutting_down());
        assert!(coordinator.token().is_cancelled());
    }

    #[test]
    fn initiate_shutdown_is_idempotent() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.initiate_shutdown();
        coordinator.initiate_shutdown();
        assert!(coordinator.is_shutting_down());
    }

    #[tokio::test]
    async fn wait_for_shutdown_returns_true_on_clean_drain() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.initiate_shutdown();

        let coordinator_clone = coordinator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            coordinator_clone.complete_shutdown();
        });

        let result = tokio::time::timeout(Duration::from_millis(500), coordinator.wait_for_shutdown()).await;
        assert!(result.unwrap());
    }

    #[tokio::test]
    async fn wait_for_shutdown_times_out_without_drain_signal() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));
        coordinator.initiate_shutdown();
        assert!(!coordinator.wait_for_shutdown().await);
    }

    #[tokio::test]
    async fn wait_with_timeout_honors_custom_timeout() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(10));
        coordinator.initiate_shutdown();
        assert!(!coordinator.wait_with_timeout(Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn duration_watchdog_of_zero_never_fires() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.spawn_duration_watchdog(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!coordinator.is_shutting_down());
    }

    #[tokio::test]
    async fn duration_watchdog_initiates_shutdown_after_elapsed() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.spawn_duration_watchdog(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(coordinator.is_shutting_down());
    }
}

//! Purge Coordinator
//!
//! When the gateway connection drops, every reminder loop is bound to a
//! connection context that no longer exists. The coordinator drains the
//! registry and stops every loop. While it runs, the registry refuses new
//! reminders and the controller reports the service as reconnecting.
//!
//! Idle -> Purging -> Idle. A second trigger while purging is a no-op, and the
//! gate always returns to Idle even when individual loops fail to stop.

use crate::features::reminders::registry::ReminderRegistry;
use log::{info, warn};
use serenity::gateway::ConnectionStage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Connection lifecycle signals emitted by the transport shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Disconnected,
    Resumed,
}

/// Map a shard stage transition to a connection event.
///
/// Serenity never dispatches a `Disconnected` stage for a running shard. A
/// dropped session shows up as the shard leaving `Connected`, either into
/// `Resuming` or back to the handshake.
pub fn connection_event(old: ConnectionStage, new: ConnectionStage) -> Option<ConnectionEvent> {
    match (old, new) {
        (_, ConnectionStage::Connected) => None,
        (ConnectionStage::Connected, _) | (_, ConnectionStage::Disconnected) => {
            Some(ConnectionEvent::Disconnected)
        }
        _ => None,
    }
}

/// Turns gateway lifecycle callbacks into [`ConnectionEvent`]s
///
/// A full re-identify throws the old shard away and starts a fresh one, so
/// the only trace it leaves is a second `ready`.
#[derive(Debug)]
pub struct ConnectionMonitor {
    first_ready: AtomicBool,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self {
            first_ready: AtomicBool::new(true),
        }
    }
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` for the first ready of the process, `Disconnected` after that
    pub fn on_ready(&self) -> Option<ConnectionEvent> {
        if self.first_ready.swap(false, Ordering::SeqCst) {
            None
        } else {
            Some(ConnectionEvent::Disconnected)
        }
    }

    pub fn on_stage_change(
        &self,
        old: ConnectionStage,
        new: ConnectionStage,
    ) -> Option<ConnectionEvent> {
        connection_event(old, new)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Loops that were cancelled and joined cleanly
    pub stopped: usize,
    /// Loops that had to be aborted or could not be joined
    pub failed: usize,
}

impl PurgeReport {
    pub fn total(&self) -> usize {
        self.stopped + self.failed
    }
}

/// Clears the purge flag however the purge exits
struct PurgeGuard {
    registry: Option<Arc<ReminderRegistry>>,
}

impl PurgeGuard {
    async fn release(mut self) {
        if let Some(registry) = self.registry.take() {
            registry.end_purge().await;
        }
    }
}

impl Drop for PurgeGuard {
    fn drop(&mut self) {
        // Only reached if the purge future was dropped mid-way.
        if let Some(registry) = self.registry.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move { registry.end_purge().await });
            }
        }
    }
}

#[derive(Clone)]
pub struct PurgeCoordinator {
    registry: Arc<ReminderRegistry>,
    stop_timeout: Duration,
}

impl PurgeCoordinator {
    pub fn new(registry: Arc<ReminderRegistry>, stop_timeout: Duration) -> Self {
        Self {
            registry,
            stop_timeout,
        }
    }

    /// Stop every reminder loop and clear the registry.
    ///
    /// Returns `None` when another purge is already in progress.
    pub async fn purge(&self) -> Option<PurgeReport> {
        let entries = match self.registry.begin_purge().await {
            Some(entries) => entries,
            None => {
                info!("🧹 Purge already in progress, ignoring trigger");
                return None;
            }
        };
        let guard = PurgeGuard {
            registry: Some(self.registry.clone()),
        };

        info!("🧹 Purging {} reminder loop(s)", entries.len());
        let mut report = PurgeReport::default();

        for entry in &entries {
            entry.task.cancel();
        }
        for entry in entries {
            match entry.task.stop(self.stop_timeout).await {
                Ok(()) => report.stopped += 1,
                Err(e) => {
                    warn!(
                        "Failed to stop {} reminder for user {} in channel {}: {e}",
                        entry.kind, entry.owner, entry.destination
                    );
                    report.failed += 1;
                }
            }
        }

        guard.release().await;
        info!(
            "🧹 Purge complete: {} stopped, {} failed",
            report.stopped, report.failed
        );
        Some(report)
    }

    pub async fn on_connection_event(&self, event: ConnectionEvent) -> Option<PurgeReport> {
        match event {
            ConnectionEvent::Disconnected => {
                warn!("🔌 Gateway disconnected, purging reminder loops");
                self.purge().await
            }
            ConnectionEvent::Resumed => {
                info!("🔌 Gateway resumed; purged reminders stay stopped until restarted");
                None
            }
        }
    }

    pub async fn is_purging(&self) -> bool {
        self.registry.is_purging().await
    }
}

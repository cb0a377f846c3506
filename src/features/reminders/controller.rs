//! Reminder Controller
//!
//! Public start/stop operations invoked by the command layer. Every operation
//! checks the purge gate first and reports `Reconnecting` while the registry is
//! being drained.
//!
//! - **Version**: 1.3.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.3.0: Destinations scoped to the invoking guild, plain-text fallback
//!   when an image is refused
//! - 1.2.0: Loops evict themselves when their channel becomes unwritable
//! - 1.1.0: Reject starts while a purge is running
//! - 1.0.0: Initial release with hydrate and stretch loops

use crate::features::reminders::assets::AssetSource;
use crate::features::reminders::delivery::{CommandOrigin, ReminderTransport};
use crate::features::reminders::periodic::{PeriodicTask, TaskId, TickOutcome};
use crate::features::reminders::registry::{
    InsertOutcome, ReminderEntry, ReminderKey, ReminderRegistry,
};
use crate::features::reminders::ReminderKind;
use chrono::Utc;
use log::{debug, info, warn};
use serenity::model::id::{ChannelId, UserId};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReminderError {
    #[error("interval must be between {min} and {max} minutes, got {minutes}")]
    InvalidPeriod { minutes: i64, min: u32, max: u32 },
    #[error("{0} reminder already active")]
    AlreadyActive(ReminderKind),
    #[error("no permission to post in channel {0}")]
    PermissionDenied(ChannelId),
    #[error("no active {0} reminder")]
    NotActive(ReminderKind),
    #[error("no active reminders")]
    NoneActive,
    #[error("service is reconnecting")]
    Reconnecting,
}

/// Closed range of accepted reminder intervals, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalBounds {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl Default for IntervalBounds {
    fn default() -> Self {
        Self {
            min_minutes: 1,
            max_minutes: 1440,
        }
    }
}

impl IntervalBounds {
    pub fn validate(&self, minutes: i64) -> Result<u32, ReminderError> {
        let valid = u32::try_from(minutes)
            .ok()
            .filter(|m| (self.min_minutes..=self.max_minutes).contains(m));
        valid.ok_or(ReminderError::InvalidPeriod {
            minutes,
            min: self.min_minutes,
            max: self.max_minutes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedReminder {
    pub kind: ReminderKind,
    pub minutes: u32,
    pub destination: ChannelId,
}

/// State a loop needs to fire one notification
struct ReminderTick {
    key: ReminderKey,
    destination: ChannelId,
    registry: Weak<ReminderRegistry>,
    transport: Arc<dyn ReminderTransport>,
    assets: Arc<dyn AssetSource>,
}

impl ReminderTick {
    async fn fire(&self, task_id: TaskId) -> TickOutcome {
        let mention = format!("<@{}>", self.key.owner.0);
        let text = self.key.kind.notification_text(&mention);
        let attachment = self.assets.pick(self.key.kind);
        let with_image = attachment.is_some();

        let mut result = self.transport.send(self.destination, &text, attachment).await;
        if with_image && result.as_ref().is_err_and(|e| e.is_fatal()) {
            // Missing attach permission still allows a plain ping.
            debug!("{task_id}: image refused in {}, retrying as text", self.destination);
            result = self.transport.send(self.destination, &text, None).await;
        }

        match result {
            Ok(()) => {
                debug!(
                    "{task_id}: sent {} reminder to {} in {}",
                    self.key.kind, self.key.owner, self.destination
                );
                TickOutcome::Continue
            }
            Err(e) if e.is_fatal() => {
                warn!(
                    "{task_id}: {e}; stopping {} reminder for user {} in {}",
                    self.key.kind, self.key.owner, self.destination
                );
                if let Some(registry) = self.registry.upgrade() {
                    if registry.remove_if_task(self.key, task_id).await.is_some() {
                        info!("🗑️ Evicted {} reminder for user {}", self.key.kind, self.key.owner);
                    }
                }
                TickOutcome::Stop
            }
            Err(e) => {
                warn!("{task_id}: {e}; will retry next interval");
                TickOutcome::Continue
            }
        }
    }
}

#[derive(Clone)]
pub struct ReminderController {
    registry: Arc<ReminderRegistry>,
    transport: Arc<dyn ReminderTransport>,
    assets: Arc<dyn AssetSource>,
    bounds: IntervalBounds,
    stop_timeout: Duration,
}

impl ReminderController {
    pub fn new(
        registry: Arc<ReminderRegistry>,
        transport: Arc<dyn ReminderTransport>,
        assets: Arc<dyn AssetSource>,
        bounds: IntervalBounds,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            assets,
            bounds,
            stop_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<ReminderRegistry> {
        &self.registry
    }

    /// Start a `kind` loop for `owner` posting to `destination` every
    /// `minutes` minutes. `origin` is where the command was issued and limits
    /// which channels may be targeted.
    pub async fn start(
        &self,
        owner: UserId,
        kind: ReminderKind,
        minutes: i64,
        destination: ChannelId,
        origin: CommandOrigin,
    ) -> Result<StartedReminder, ReminderError> {
        self.check_gate().await?;
        let minutes = self.bounds.validate(minutes)?;

        if !self.transport.can_send(destination, origin).await {
            return Err(ReminderError::PermissionDenied(destination));
        }

        let key = ReminderKey::new(owner, kind);
        let period = Duration::from_secs(u64::from(minutes) * 60);
        let tick = Arc::new(ReminderTick {
            key,
            destination,
            registry: Arc::downgrade(&self.registry),
            transport: self.transport.clone(),
            assets: self.assets.clone(),
        });

        let outcome = self
            .registry
            .try_insert(key, || {
                let task = PeriodicTask::start(period, move |task_id| {
                    let tick = tick.clone();
                    async move { tick.fire(task_id).await }
                });
                ReminderEntry {
                    owner,
                    kind,
                    destination,
                    minutes,
                    started_at: Utc::now(),
                    task: Arc::new(task),
                }
            })
            .await;

        match outcome {
            InsertOutcome::Inserted => {
                info!(
                    "{} Started {kind} reminder for user {owner} every {minutes} min in {destination}",
                    kind.emoji()
                );
                Ok(StartedReminder {
                    kind,
                    minutes,
                    destination,
                })
            }
            InsertOutcome::Duplicate => Err(ReminderError::AlreadyActive(kind)),
            InsertOutcome::Purging => Err(ReminderError::Reconnecting),
        }
    }

    /// Stop `owner`'s `kind` loop and wait for it to wind down
    pub async fn stop(&self, owner: UserId, kind: ReminderKind) -> Result<(), ReminderError> {
        self.check_gate().await?;

        let entry = self
            .registry
            .remove(ReminderKey::new(owner, kind))
            .await
            .ok_or(ReminderError::NotActive(kind))?;
        self.shutdown(entry).await;

        info!("🛑 Stopped {kind} reminder for user {owner}");
        Ok(())
    }

    /// Stop every loop `owner` has. Returns the kinds that were stopped.
    pub async fn stop_all(&self, owner: UserId) -> Result<Vec<ReminderKind>, ReminderError> {
        self.check_gate().await?;

        let mut stopped = Vec::new();
        for kind in ReminderKind::ALL {
            if let Some(entry) = self.registry.remove(ReminderKey::new(owner, kind)).await {
                self.shutdown(entry).await;
                stopped.push(kind);
            }
        }

        if stopped.is_empty() {
            return Err(ReminderError::NoneActive);
        }
        info!("🛑 Stopped {} reminder(s) for user {owner}", stopped.len());
        Ok(stopped)
    }

    async fn check_gate(&self) -> Result<(), ReminderError> {
        if self.registry.is_purging().await {
            return Err(ReminderError::Reconnecting);
        }
        Ok(())
    }

    async fn shutdown(&self, entry: ReminderEntry) {
        if entry.task.is_current() {
            // Joining here would wait on ourselves; the loop exits after this tick.
            entry.task.cancel();
            return;
        }
        if let Err(e) = entry.task.stop(self.stop_timeout).await {
            warn!(
                "{} reminder for user {} did not stop cleanly: {e}",
                entry.kind, entry.owner
            );
        }
    }
}

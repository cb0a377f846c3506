//! Reminder Registry
//!
//! Sole owner of the `(user, kind) -> running loop` mapping. Every read and
//! mutation goes through one registry-wide lock, and the purge flag lives
//! under the same lock so a start can never slip an entry in behind a purge's
//! drain.
//!
//! The lock is never held while a task is being cancelled or joined: callers
//! take the entry out and shut the task down afterwards.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Purge flag moved under the registry lock; task-scoped removal
//! - 1.0.0: Single map keyed by (user, kind), replacing one map per kind

use crate::features::reminders::periodic::{PeriodicTask, TaskId};
use crate::features::reminders::ReminderKind;
use chrono::{DateTime, Utc};
use log::debug;
use serenity::model::id::{ChannelId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReminderKey {
    pub owner: UserId,
    pub kind: ReminderKind,
}

impl ReminderKey {
    pub fn new(owner: UserId, kind: ReminderKind) -> Self {
        Self { owner, kind }
    }
}

/// A live reminder: who owns it, where it posts, and the loop driving it
#[derive(Debug, Clone)]
pub struct ReminderEntry {
    pub owner: UserId,
    pub kind: ReminderKind,
    pub destination: ChannelId,
    pub minutes: u32,
    pub started_at: DateTime<Utc>,
    pub task: Arc<PeriodicTask>,
}

impl ReminderEntry {
    pub fn key(&self) -> ReminderKey {
        ReminderKey::new(self.owner, self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A live entry already exists for the key; nothing changed
    Duplicate,
    /// A purge is draining the registry; nothing changed
    Purging,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<ReminderKey, ReminderEntry>,
    purging: bool,
}

#[derive(Default)]
pub struct ReminderRegistry {
    state: Mutex<RegistryState>,
}

impl ReminderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the entry produced by `build` iff `key` is free and no purge is
    /// running.
    ///
    /// `build` runs inside the critical section and only on success, so the
    /// task it starts is referenced by an entry from the moment it exists.
    /// It must not block or await.
    pub async fn try_insert<F>(&self, key: ReminderKey, build: F) -> InsertOutcome
    where
        F: FnOnce() -> ReminderEntry,
    {
        let mut state = self.state.lock().await;
        if state.purging {
            return InsertOutcome::Purging;
        }
        if state.entries.contains_key(&key) {
            return InsertOutcome::Duplicate;
        }

        let entry = build();
        debug_assert_eq!(entry.key(), key);
        state.entries.insert(key, entry);
        InsertOutcome::Inserted
    }

    pub async fn remove(&self, key: ReminderKey) -> Option<ReminderEntry> {
        self.state.lock().await.entries.remove(&key)
    }

    /// Remove the entry for `key` only if it is still driven by `task_id`.
    ///
    /// Used by a loop evicting itself: if the entry was already stopped (and
    /// possibly replaced by a fresh start) this is a no-op.
    pub async fn remove_if_task(&self, key: ReminderKey, task_id: TaskId) -> Option<ReminderEntry> {
        let mut state = self.state.lock().await;
        match state.entries.get(&key) {
            Some(entry) if entry.task.id() == task_id => state.entries.remove(&key),
            _ => {
                debug!("{task_id} already absent from registry for {:?}", key);
                None
            }
        }
    }

    pub async fn get(&self, key: ReminderKey) -> Option<ReminderEntry> {
        self.state.lock().await.entries.get(&key).cloned()
    }

    /// Point-in-time copy of every entry
    pub async fn snapshot_all(&self) -> Vec<ReminderEntry> {
        self.state.lock().await.entries.values().cloned().collect()
    }

    /// Kinds `owner` currently has running, in `ReminderKind::ALL` order
    pub async fn kinds_for(&self, owner: UserId) -> Vec<ReminderKind> {
        let state = self.state.lock().await;
        ReminderKind::ALL
            .into_iter()
            .filter(|kind| state.entries.contains_key(&ReminderKey::new(owner, *kind)))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_purging(&self) -> bool {
        self.state.lock().await.purging
    }

    /// Raise the purge flag and take every entry out.
    ///
    /// Returns `None` if a purge is already running.
    pub async fn begin_purge(&self) -> Option<Vec<ReminderEntry>> {
        let mut state = self.state.lock().await;
        if state.purging {
            return None;
        }
        state.purging = true;
        Some(state.entries.drain().map(|(_, entry)| entry).collect())
    }

    pub async fn end_purge(&self) {
        self.state.lock().await.purging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::periodic::TickOutcome;
    use std::time::Duration;

    fn entry(owner: u64, kind: ReminderKind) -> ReminderEntry {
        let task = PeriodicTask::start(Duration::from_secs(3600), |_| async {
            TickOutcome::Continue
        });
        ReminderEntry {
            owner: UserId(owner),
            kind,
            destination: ChannelId(500),
            minutes: 60,
            started_at: Utc::now(),
            task: Arc::new(task),
        }
    }

    fn key(owner: u64, kind: ReminderKind) -> ReminderKey {
        ReminderKey::new(UserId(owner), kind)
    }

    #[tokio::test]
    async fn test_try_insert_rejects_duplicate() {
        let registry = ReminderRegistry::new();
        let k = key(1, ReminderKind::Hydrate);

        assert_eq!(
            registry.try_insert(k, || entry(1, ReminderKind::Hydrate)).await,
            InsertOutcome::Inserted
        );

        let mut built = false;
        let outcome = registry
            .try_insert(k, || {
                built = true;
                entry(1, ReminderKind::Hydrate)
            })
            .await;
        assert_eq!(outcome, InsertOutcome::Duplicate);
        assert!(!built);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_kinds_are_independent() {
        let registry = ReminderRegistry::new();
        registry.try_insert(key(1, ReminderKind::Hydrate), || entry(1, ReminderKind::Hydrate)).await;
        registry.try_insert(key(1, ReminderKind::Stretch), || entry(1, ReminderKind::Stretch)).await;
        registry.try_insert(key(2, ReminderKind::Hydrate), || entry(2, ReminderKind::Hydrate)).await;

        assert_eq!(registry.len().await, 3);
        assert_eq!(
            registry.kinds_for(UserId(1)).await,
            vec![ReminderKind::Hydrate, ReminderKind::Stretch]
        );
        assert_eq!(registry.kinds_for(UserId(2)).await, vec![ReminderKind::Hydrate]);
        assert!(registry.kinds_for(UserId(3)).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_returns_entry_once() {
        let registry = ReminderRegistry::new();
        let k = key(1, ReminderKind::Stretch);
        registry.try_insert(k, || entry(1, ReminderKind::Stretch)).await;

        let removed = registry.remove(k).await.unwrap();
        assert_eq!(removed.key(), k);
        assert!(registry.remove(k).await.is_none());
        assert!(registry.is_empty().await);
        removed.task.cancel();
    }

    #[tokio::test]
    async fn test_remove_if_task_ignores_other_tasks() {
        let registry = ReminderRegistry::new();
        let k = key(9, ReminderKind::Hydrate);

        let stale = entry(9, ReminderKind::Hydrate);
        let stale_id = stale.task.id();
        registry.try_insert(k, || stale.clone()).await;
        registry.remove(k).await;

        // Same key, new loop
        registry.try_insert(k, || entry(9, ReminderKind::Hydrate)).await;
        assert!(registry.remove_if_task(k, stale_id).await.is_none());
        assert!(registry.get(k).await.is_some());

        let current_id = registry.get(k).await.unwrap().task.id();
        assert!(registry.remove_if_task(k, current_id).await.is_some());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_flag_blocks_inserts_and_is_one_shot() {
        let registry = ReminderRegistry::new();
        registry.try_insert(key(1, ReminderKind::Hydrate), || entry(1, ReminderKind::Hydrate)).await;

        let drained = registry.begin_purge().await.unwrap();
        assert_eq!(drained.len(), 1);
        assert!(registry.is_purging().await);
        assert!(registry.begin_purge().await.is_none());
        assert!(registry.snapshot_all().await.is_empty());

        assert_eq!(
            registry.try_insert(key(2, ReminderKind::Stretch), || entry(2, ReminderKind::Stretch)).await,
            InsertOutcome::Purging
        );

        registry.end_purge().await;
        assert!(!registry.is_purging().await);
        assert_eq!(
            registry.try_insert(key(2, ReminderKind::Stretch), || entry(2, ReminderKind::Stretch)).await,
            InsertOutcome::Inserted
        );
    }
}

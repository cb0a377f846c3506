//! # Reminders Feature
//!
//! Per-user recurring hydrate and stretch reminders. Each user may run one
//! loop per kind; loops post to a chosen channel on a fixed interval and are
//! purged wholesale when the gateway connection drops.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Recurring per-kind loops with registry, purge gate and self-eviction
//! - 1.0.0: Initial release

pub mod assets;
pub mod controller;
pub mod delivery;
pub mod kind;
pub mod periodic;
pub mod purge;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use assets::{AssetPicker, AssetSource};
pub use controller::{IntervalBounds, ReminderController, ReminderError, StartedReminder};
pub use delivery::{CommandOrigin, DeliveryError, ReminderTransport, SerenityTransport};
pub use kind::ReminderKind;
pub use periodic::{PeriodicTask, TaskError, TaskId, TickOutcome};
pub use purge::{connection_event, ConnectionEvent, ConnectionMonitor, PurgeCoordinator, PurgeReport};
pub use registry::{InsertOutcome, ReminderEntry, ReminderKey, ReminderRegistry};

//! # Features Layer
//!
//! Self-contained bot features. Each feature module documents its version and
//! changelog in its module header.

pub mod reminders;

pub use reminders::{
    AssetPicker, ConnectionEvent, PurgeCoordinator, ReminderController, ReminderKind,
    ReminderRegistry, SerenityTransport,
};

// Core layer - configuration and shared builders
pub mod core;

// Features layer - reminder loops and their lifecycle
pub mod features;

// Application layer - message commands
pub mod commands;

pub use crate::core::Config;

pub use features::{
    AssetPicker, ConnectionEvent, PurgeCoordinator, ReminderController, ReminderKind,
    ReminderRegistry, SerenityTransport,
};

pub use commands::CommandHandler;

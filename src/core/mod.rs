//! # Core Module
//!
//! Configuration and shared response builders for the hydrate bot.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.7.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Reminder interval bounds and asset folders in config; help embed
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod embeds;

// Re-export commonly used items
pub use config::Config;
pub use embeds::{help_embed, HELP_COLOR};

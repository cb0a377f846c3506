//! # Command System
//!
//! Prefix (`!`) message commands for starting and stopping reminders.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Reminder commands (hydrate, stretch, stop*, help) with friendly parse errors
//! - 2.0.0: Slash-only command system
//! - 1.0.0: Initial reorganization with modular command structure

pub mod handler;
pub mod parser;
pub mod replies;

pub use handler::{CommandHandler, Reply};
pub use parser::{parse, Command, ParseError};

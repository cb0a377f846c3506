//! User-facing reply text for command outcomes

use crate::commands::parser::ParseError;
use crate::features::reminders::{ReminderError, ReminderKind, StartedReminder};

pub fn started(started: &StartedReminder) -> String {
    let noun = match started.kind {
        ReminderKind::Hydrate => "Hydration",
        ReminderKind::Stretch => "Stretch",
    };
    format!(
        "{} {noun} reminder every {} min in <#{}>",
        started.kind.emoji(),
        started.minutes,
        started.destination.0
    )
}

pub fn stopped(kind: ReminderKind) -> String {
    let noun = match kind {
        ReminderKind::Hydrate => "Hydration",
        ReminderKind::Stretch => "Stretch",
    };
    format!("🛑 {noun} reminder stopped.")
}

pub fn stopped_all(kinds: &[ReminderKind]) -> String {
    let labels: Vec<&str> = kinds.iter().map(|kind| kind.label()).collect();
    format!("🛑 Stopped {} reminder(s).", labels.join(" & "))
}

pub fn reminder_error(err: &ReminderError, prefix: &str) -> String {
    match err {
        ReminderError::InvalidPeriod { min, max, .. } => {
            format!("⛔ Interval must be between {min} and {max} minutes.")
        }
        ReminderError::AlreadyActive(kind) => {
            let stop = match kind {
                ReminderKind::Hydrate => "stophydrate",
                ReminderKind::Stretch => "stopstretch",
            };
            format!(
                "{} You already have a {} reminder. Use `{prefix}{stop}` first.",
                kind.emoji(),
                kind.label()
            )
        }
        ReminderError::PermissionDenied(channel) => {
            format!("⛔ I can't post in <#{}>. Pick a channel I can write to.", channel.0)
        }
        ReminderError::NotActive(kind) => format!("⚠️ No active {} reminder.", kind.label()),
        ReminderError::NoneActive => "⚠️ You have no active reminders.".to_string(),
        ReminderError::Reconnecting => {
            "🔄 I'm reconnecting right now, so reminders are paused. Try again in a moment."
                .to_string()
        }
    }
}

pub fn parse_error(err: &ParseError, prefix: &str) -> String {
    match err {
        ParseError::UnknownCommand(_) => format!("❓ Unknown command. Type `{prefix}help`."),
        ParseError::MissingArgument(name) => {
            format!("⚠️ Missing `{name}` argument. See `{prefix}help` for usage.")
        }
        ParseError::BadArgument(_) => "⚠️ *minutes* must be a number; channel must be a \
            channel mention (type `#` and pick it from the list)."
            .to_string(),
    }
}

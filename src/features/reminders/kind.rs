//! Reminder kinds
//!
//! The closed set of reminder families a user can subscribe to.

use std::fmt;
use std::str::FromStr;

/// A reminder family. Each user may run at most one loop per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReminderKind {
    Hydrate,
    Stretch,
}

impl ReminderKind {
    /// Every kind, in the order `stop_all` visits them
    pub const ALL: [ReminderKind; 2] = [ReminderKind::Hydrate, ReminderKind::Stretch];

    /// Command-style name (`hydrate`, `stretch`)
    pub fn name(&self) -> &'static str {
        match self {
            ReminderKind::Hydrate => "hydrate",
            ReminderKind::Stretch => "stretch",
        }
    }

    /// Noun used in replies ("hydration reminder", "stretch reminder")
    pub fn label(&self) -> &'static str {
        match self {
            ReminderKind::Hydrate => "hydration",
            ReminderKind::Stretch => "stretch",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ReminderKind::Hydrate => "💧",
            ReminderKind::Stretch => "🤸",
        }
    }

    /// Text of the periodic ping, mentioning the owner
    pub fn notification_text(&self, mention: &str) -> String {
        format!("{} Time to {}, {}!", self.emoji(), self.name(), mention)
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ReminderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hydrate" | "hydration" => Ok(ReminderKind::Hydrate),
            "stretch" => Ok(ReminderKind::Stretch),
            _ => Err(anyhow::anyhow!("Invalid reminder kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("hydrate".parse::<ReminderKind>().unwrap(), ReminderKind::Hydrate);
        assert_eq!("Hydration".parse::<ReminderKind>().unwrap(), ReminderKind::Hydrate);
        assert_eq!("STRETCH".parse::<ReminderKind>().unwrap(), ReminderKind::Stretch);
        assert!("nap".parse::<ReminderKind>().is_err());
    }

    #[test]
    fn test_notification_text() {
        assert_eq!(
            ReminderKind::Hydrate.notification_text("<@42>"),
            "💧 Time to hydrate, <@42>!"
        );
        assert_eq!(
            ReminderKind::Stretch.notification_text("<@7>"),
            "🤸 Time to stretch, <@7>!"
        );
    }

    #[test]
    fn test_all_kinds_are_distinct() {
        assert_ne!(ReminderKind::ALL[0], ReminderKind::ALL[1]);
        assert_eq!(ReminderKind::Hydrate.to_string(), "hydrate");
    }
}

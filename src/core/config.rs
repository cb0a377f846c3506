//! Environment-driven bot configuration

use crate::features::reminders::{IntervalBounds, ReminderKind};
use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub log_level: String,
    pub command_prefix: String,
    pub min_interval_minutes: u32,
    pub max_interval_minutes: u32,
    pub hydrate_assets_dir: PathBuf,
    pub stretch_assets_dir: PathBuf,
    pub stop_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| anyhow!("DISCORD_TOKEN must be set (put DISCORD_TOKEN=... in .env)"))?;

        let min_interval_minutes = parse_or(&lookup, "REMINDER_MIN_MINUTES", 1)?;
        let max_interval_minutes = parse_or(&lookup, "REMINDER_MAX_MINUTES", 1440)?;
        if min_interval_minutes == 0 {
            bail!("REMINDER_MIN_MINUTES must be at least 1");
        }
        if max_interval_minutes < min_interval_minutes {
            bail!(
                "REMINDER_MAX_MINUTES ({max_interval_minutes}) is below REMINDER_MIN_MINUTES ({min_interval_minutes})"
            );
        }

        Ok(Config {
            discord_token,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            command_prefix: lookup("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()),
            min_interval_minutes,
            max_interval_minutes,
            hydrate_assets_dir: lookup("HYDRATE_ASSETS_DIR")
                .unwrap_or_else(|| "memes".to_string())
                .into(),
            stretch_assets_dir: lookup("STRETCH_ASSETS_DIR")
                .unwrap_or_else(|| "stretch".to_string())
                .into(),
            stop_timeout_secs: parse_or(&lookup, "REMINDER_STOP_TIMEOUT_SECS", 10)?,
        })
    }

    pub fn interval_bounds(&self) -> IntervalBounds {
        IntervalBounds {
            min_minutes: self.min_interval_minutes,
            max_minutes: self.max_interval_minutes,
        }
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn asset_folders(&self) -> HashMap<ReminderKind, PathBuf> {
        HashMap::from([
            (ReminderKind::Hydrate, self.hydrate_assets_dir.clone()),
            (ReminderKind::Stretch, self.stretch_assets_dir.clone()),
        ])
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DISCORD_TOKEN", "abc")]).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.interval_bounds(), IntervalBounds::default());
        assert_eq!(config.hydrate_assets_dir, PathBuf::from("memes"));
        assert_eq!(config.stretch_assets_dir, PathBuf::from("stretch"));
        assert_eq!(config.stop_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("COMMAND_PREFIX", "?"),
            ("REMINDER_MIN_MINUTES", "5"),
            ("REMINDER_MAX_MINUTES", "120"),
            ("REMINDER_STOP_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(config.command_prefix, "?");
        assert_eq!(
            config.interval_bounds(),
            IntervalBounds {
                min_minutes: 5,
                max_minutes: 120
            }
        );
        assert_eq!(config.stop_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(config_from(&[("DISCORD_TOKEN", "abc"), ("REMINDER_MIN_MINUTES", "0")]).is_err());
        assert!(config_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("REMINDER_MIN_MINUTES", "60"),
            ("REMINDER_MAX_MINUTES", "30"),
        ])
        .is_err());
        assert!(config_from(&[("DISCORD_TOKEN", "abc"), ("REMINDER_MAX_MINUTES", "lots")]).is_err());
    }
}

//! Prefix command parsing
//!
//! Turns message content like `!hydrate 30 #wellness` into a [`Command`].
//! Parsing is pure; dispatch lives in the handler.
//!
//! Channels are taken from mentions (`<#id>`, what Discord sends when a
//! channel is picked from the `#` list) or raw ids. Plain channel names are
//! not looked up.

use crate::features::reminders::ReminderKind;
use regex::Regex;
use serenity::model::id::ChannelId;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Start {
        kind: ReminderKind,
        minutes: i64,
        /// Target channel; `None` means the channel the command was sent in
        channel: Option<ChannelId>,
    },
    Stop(ReminderKind),
    StopAll,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("missing `{0}` argument")]
    MissingArgument(&'static str),
    #[error("bad argument `{0}`")]
    BadArgument(String),
}

fn channel_mention() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<#(\d+)>$").expect("channel mention pattern is valid"))
}

fn parse_channel(raw: &str) -> Result<ChannelId, ParseError> {
    let digits = channel_mention()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    digits
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(ChannelId)
        .ok_or_else(|| ParseError::BadArgument(raw.to_string()))
}

fn parse_start(kind: ReminderKind, args: &[&str]) -> Result<Command, ParseError> {
    let raw_minutes = args.first().ok_or(ParseError::MissingArgument("minutes"))?;
    let minutes = raw_minutes
        .parse::<i64>()
        .map_err(|_| ParseError::BadArgument(raw_minutes.to_string()))?;
    let channel = args.get(1).map(|raw| parse_channel(raw)).transpose()?;

    Ok(Command::Start {
        kind,
        minutes,
        channel,
    })
}

/// Parse `content` as a command.
///
/// Returns `None` when the message does not start with `prefix`, so ordinary
/// chat is ignored.
pub fn parse(prefix: &str, content: &str) -> Option<Result<Command, ParseError>> {
    let body = content.trim().strip_prefix(prefix)?;
    let mut words = body.split_whitespace();
    let name = words.next()?.to_lowercase();
    let args: Vec<&str> = words.collect();

    let command = match name.as_str() {
        "help" => Ok(Command::Help),
        "stop" | "stopall" | "stopreminders" => Ok(Command::StopAll),
        other => {
            let stop_kind = other
                .strip_prefix("stop")
                .and_then(|kind| kind.parse::<ReminderKind>().ok());
            match (stop_kind, other.parse::<ReminderKind>()) {
                (Some(kind), _) => Ok(Command::Stop(kind)),
                (None, Ok(kind)) => parse_start(kind, &args),
                (None, Err(_)) => Err(ParseError::UnknownCommand(other.to_string())),
            }
        }
    };
    Some(command)
}

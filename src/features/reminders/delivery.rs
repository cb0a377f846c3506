//! Notification delivery
//!
//! The seam between the reminder core and Discord. The core only needs two
//! things from the transport: whether a reminder may post in a channel, and a
//! way to post a notification with an optional image.

use async_trait::async_trait;
use log::debug;
use serenity::cache::Cache;
use serenity::http::{Http, HttpError};
use serenity::model::channel::{AttachmentType, Channel, ChannelType};
use serenity::model::id::{ChannelId, GuildId};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The destination can never be written to again (missing permission,
    /// deleted channel). The loop bound to it evicts itself.
    #[error("delivery forbidden: {0}")]
    Forbidden(String),
    /// Anything else. Logged; the loop keeps going.
    #[error("delivery failed: {0}")]
    Transient(String),
}

impl DeliveryError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeliveryError::Forbidden(_))
    }
}

impl From<serenity::Error> for DeliveryError {
    fn from(err: serenity::Error) -> Self {
        if let serenity::Error::Http(http_err) = &err {
            if let HttpError::UnsuccessfulRequest(response) = &**http_err {
                let status = response.status_code.as_u16();
                if status == 403 || status == 404 {
                    return DeliveryError::Forbidden(format!(
                        "{} ({})",
                        response.error.message, status
                    ));
                }
            }
        }
        DeliveryError::Transient(err.to_string())
    }
}

/// Where a reminder command was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOrigin {
    pub channel: ChannelId,
    /// `None` for direct messages
    pub guild: Option<GuildId>,
}

impl CommandOrigin {
    /// Guild commands may only target text or announcement channels of the
    /// same guild.
    pub fn admits_guild_channel(&self, guild: GuildId, kind: ChannelType) -> bool {
        self.guild == Some(guild) && matches!(kind, ChannelType::Text | ChannelType::News)
    }

    /// A DM command may only target the conversation it came from.
    pub fn admits_private_channel(&self, channel: ChannelId) -> bool {
        self.guild.is_none() && self.channel == channel
    }
}

/// Write access to notification destinations
#[async_trait]
pub trait ReminderTransport: Send + Sync {
    /// Whether a reminder started from `origin` may post in `destination`
    async fn can_send(&self, destination: ChannelId, origin: CommandOrigin) -> bool;

    /// Post `text`, attaching the file at `attachment` when present
    async fn send(
        &self,
        destination: ChannelId,
        text: &str,
        attachment: Option<PathBuf>,
    ) -> Result<(), DeliveryError>;
}

/// Transport backed by the serenity HTTP client and cache
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }
}

#[async_trait]
impl ReminderTransport for SerenityTransport {
    async fn can_send(&self, destination: ChannelId, origin: CommandOrigin) -> bool {
        let channel = match destination.to_channel(&self.http).await {
            Ok(channel) => channel,
            Err(e) => {
                debug!("Cannot resolve channel {destination}: {e}");
                return false;
            }
        };

        match channel {
            Channel::Guild(guild_channel) => {
                if !origin.admits_guild_channel(guild_channel.guild_id, guild_channel.kind) {
                    debug!(
                        "Channel {destination} ({:?} in guild {}) is not a text channel of {:?}",
                        guild_channel.kind, guild_channel.guild_id, origin.guild
                    );
                    return false;
                }
                let bot_id = self.cache.current_user_id();
                match guild_channel.permissions_for_user(&self.cache, bot_id) {
                    Ok(perms) => perms.view_channel() && perms.send_messages(),
                    Err(e) => {
                        debug!("Cannot compute permissions in {destination}: {e}");
                        false
                    }
                }
            }
            Channel::Private(private) => origin.admits_private_channel(private.id),
            _ => false,
        }
    }

    async fn send(
        &self,
        destination: ChannelId,
        text: &str,
        attachment: Option<PathBuf>,
    ) -> Result<(), DeliveryError> {
        destination
            .send_message(&self.http, |m| {
                m.content(text);
                if let Some(path) = attachment.as_deref() {
                    m.add_file(AttachmentType::Path(path));
                }
                m
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_forbidden_is_fatal() {
        assert!(DeliveryError::Forbidden("Missing Access".into()).is_fatal());
        assert!(!DeliveryError::Transient("timeout".into()).is_fatal());
    }

    #[test]
    fn test_guild_origin_admits_own_text_channels_only() {
        let origin = CommandOrigin {
            channel: ChannelId(10),
            guild: Some(GuildId(1)),
        };
        assert!(origin.admits_guild_channel(GuildId(1), ChannelType::Text));
        assert!(origin.admits_guild_channel(GuildId(1), ChannelType::News));
        assert!(!origin.admits_guild_channel(GuildId(2), ChannelType::Text));
        for kind in [
            ChannelType::Voice,
            ChannelType::Stage,
            ChannelType::Directory,
            ChannelType::Category,
        ] {
            assert!(!origin.admits_guild_channel(GuildId(1), kind));
        }
        assert!(!origin.admits_private_channel(ChannelId(10)));
    }

    #[test]
    fn test_dm_origin_admits_its_own_conversation() {
        let origin = CommandOrigin {
            channel: ChannelId(10),
            guild: None,
        };
        assert!(origin.admits_private_channel(ChannelId(10)));
        assert!(!origin.admits_private_channel(ChannelId(11)));
        assert!(!origin.admits_guild_channel(GuildId(1), ChannelType::Text));
    }

    #[test]
    fn test_non_http_errors_are_transient() {
        let err: DeliveryError = serenity::Error::Other("gateway hiccup").into();
        assert!(matches!(err, DeliveryError::Transient(_)));
        assert!(!err.is_fatal());
    }
}

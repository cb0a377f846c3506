//! In-memory transport and asset source for reminder tests

use crate::features::reminders::assets::AssetSource;
use crate::features::reminders::delivery::{CommandOrigin, DeliveryError, ReminderTransport};
use crate::features::reminders::ReminderKind;
use async_trait::async_trait;
use serenity::model::channel::ChannelType;
use serenity::model::id::{ChannelId, GuildId};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: ChannelId,
    pub text: String,
    pub attachment: Option<PathBuf>,
}

/// Guild that channels belong to unless registered otherwise
pub const HOME_GUILD: GuildId = GuildId(1);

/// A command issued in `channel` of [`HOME_GUILD`]
pub fn guild_origin(channel: ChannelId) -> CommandOrigin {
    CommandOrigin {
        channel,
        guild: Some(HOME_GUILD),
    }
}

#[derive(Debug, Clone, Copy)]
enum MockChannel {
    Guild(GuildId, ChannelType),
    Private,
}

/// Pauses the next `send` until the test releases it
pub struct SendHold {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct MockTransport {
    denied: AtomicBool,
    channels: Mutex<HashMap<ChannelId, MockChannel>>,
    sent: Mutex<Vec<SentMessage>>,
    scripted: Mutex<VecDeque<DeliveryError>>,
    hold: Mutex<Option<Arc<SendHold>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deny_all(&self) {
        self.denied.store(true, Ordering::SeqCst);
    }

    /// Register a guild channel; unregistered ids are text channels of
    /// [`HOME_GUILD`]
    pub fn add_guild_channel(&self, id: ChannelId, guild: GuildId, kind: ChannelType) {
        self.channels
            .lock()
            .unwrap()
            .insert(id, MockChannel::Guild(guild, kind));
    }

    pub fn add_private_channel(&self, id: ChannelId) {
        self.channels.lock().unwrap().insert(id, MockChannel::Private);
    }

    /// Queue an error for the next `send` call
    pub fn fail_next(&self, err: DeliveryError) {
        self.scripted.lock().unwrap().push_back(err);
    }

    pub fn hold_sends(&self) -> Arc<SendHold> {
        let hold = Arc::new(SendHold {
            entered: Notify::new(),
            release: Notify::new(),
        });
        *self.hold.lock().unwrap() = Some(hold.clone());
        hold
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReminderTransport for MockTransport {
    async fn can_send(&self, destination: ChannelId, origin: CommandOrigin) -> bool {
        if self.denied.load(Ordering::SeqCst) {
            return false;
        }
        let channel = self
            .channels
            .lock()
            .unwrap()
            .get(&destination)
            .copied()
            .unwrap_or(MockChannel::Guild(HOME_GUILD, ChannelType::Text));
        match channel {
            MockChannel::Guild(guild, kind) => origin.admits_guild_channel(guild, kind),
            MockChannel::Private => origin.admits_private_channel(destination),
        }
    }

    async fn send(
        &self,
        destination: ChannelId,
        text: &str,
        attachment: Option<PathBuf>,
    ) -> Result<(), DeliveryError> {
        let hold = self.hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        if let Some(err) = self.scripted.lock().unwrap().pop_front() {
            return Err(err);
        }

        self.sent.lock().unwrap().push(SentMessage {
            destination,
            text: text.to_string(),
            attachment,
        });
        Ok(())
    }
}

/// Always hands out `<kind>.png`
pub struct StubAssets;

impl AssetSource for StubAssets {
    fn pick(&self, kind: ReminderKind) -> Option<PathBuf> {
        Some(PathBuf::from(format!("{}.png", kind.name())))
    }
}

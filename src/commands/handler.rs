//! Message command dispatch
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::commands::parser::{self, Command};
use crate::commands::replies;
use crate::core::help_embed;
use crate::features::reminders::{CommandOrigin, ReminderController};
use anyhow::Result;
use log::{debug, info};
use serenity::model::channel::Message;
use serenity::model::id::UserId;
use serenity::prelude::Context;
use uuid::Uuid;

/// What to send back to the channel a command came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Help,
}

#[derive(Clone)]
pub struct CommandHandler {
    controller: ReminderController,
    prefix: String,
}

impl CommandHandler {
    pub fn new(controller: ReminderController, prefix: impl Into<String>) -> Self {
        Self {
            controller,
            prefix: prefix.into(),
        }
    }

    pub fn controller(&self) -> &ReminderController {
        &self.controller
    }

    /// Run a parsed command on behalf of `author`, issued at `origin`
    pub async fn execute(&self, author: UserId, origin: CommandOrigin, command: Command) -> Reply {
        let prefix = self.prefix.as_str();
        let text = match command {
            Command::Help => return Reply::Help,
            Command::Start {
                kind,
                minutes,
                channel: target,
            } => {
                let destination = target.unwrap_or(origin.channel);
                match self
                    .controller
                    .start(author, kind, minutes, destination, origin)
                    .await
                {
                    Ok(started) => replies::started(&started),
                    Err(e) => replies::reminder_error(&e, prefix),
                }
            }
            Command::Stop(kind) => match self.controller.stop(author, kind).await {
                Ok(()) => replies::stopped(kind),
                Err(e) => replies::reminder_error(&e, prefix),
            },
            Command::StopAll => match self.controller.stop_all(author).await {
                Ok(kinds) => replies::stopped_all(&kinds),
                Err(e) => replies::reminder_error(&e, prefix),
            },
        };
        Reply::Text(text)
    }

    pub async fn handle_message(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let parsed = match parser::parse(&self.prefix, &msg.content) {
            Some(parsed) => parsed,
            None => return Ok(()),
        };

        let request_id = Uuid::new_v4();
        info!(
            "[{request_id}] 📥 Command | User: {} | Channel: {} | Content: '{}'",
            msg.author.id,
            msg.channel_id,
            msg.content.chars().take(100).collect::<String>()
        );

        let reply = match parsed {
            Ok(command) => {
                debug!("[{request_id}] Dispatching {command:?}");
                let origin = CommandOrigin {
                    channel: msg.channel_id,
                    guild: msg.guild_id,
                };
                self.execute(msg.author.id, origin, command).await
            }
            Err(e) => {
                debug!("[{request_id}] Parse error: {e}");
                Reply::Text(replies::parse_error(&e, &self.prefix))
            }
        };

        match reply {
            Reply::Text(text) => {
                msg.channel_id.say(&ctx.http, text).await?;
            }
            Reply::Help => {
                let embed = help_embed(&self.prefix);
                msg.channel_id
                    .send_message(&ctx.http, |m| m.set_embed(embed))
                    .await?;
            }
        }
        debug!("[{request_id}] ✅ Reply sent");
        Ok(())
    }
}

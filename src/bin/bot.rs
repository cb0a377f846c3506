use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::client::bridge::gateway::event::ShardStageUpdateEvent;
use serenity::model::channel::Message;
use serenity::model::event::ResumedEvent;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;

use hydrate::commands::CommandHandler;
use hydrate::core::Config;
use hydrate::features::reminders::{
    AssetPicker, ConnectionEvent, ConnectionMonitor, PurgeCoordinator, ReminderController,
    ReminderRegistry, SerenityTransport,
};

struct Services {
    commands: CommandHandler,
    purge: PurgeCoordinator,
    /// First-ready tracking and shard stage mapping
    monitor: ConnectionMonitor,
}

impl Services {
    async fn connection_changed(&self, event: ConnectionEvent) {
        if let Some(report) = self.purge.on_connection_event(event).await {
            info!(
                "🧹 Dropped {} reminder loop(s) after disconnect",
                report.total()
            );
        }
    }
}

struct ReminderServices;

impl TypeMapKey for ReminderServices {
    type Value = Arc<Services>;
}

async fn services(ctx: &Context) -> Option<Arc<Services>> {
    ctx.data.read().await.get::<ReminderServices>().cloned()
}

struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(services) = services(&ctx).await else {
            warn!("Message received before reminder services were registered");
            return;
        };

        if let Err(e) = services.commands.handle_message(&ctx, &msg).await {
            error!("Error handling message: {e}");
            if let Err(why) = msg
                .channel_id
                .say(
                    &ctx.http,
                    "Sorry, I encountered an error processing your command.",
                )
                .await
            {
                error!("Failed to send error message: {why}");
            }
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🔗 Gateway session ID: {:?}", ready.session_id);

        let Some(services) = services(&ctx).await else {
            warn!("Ready received before reminder services were registered");
            return;
        };
        match services.monitor.on_ready() {
            None => info!("🎉 {} is online ✅", ready.user.name),
            Some(event) => {
                info!(
                    "🔁 {} re-identified; reminders must be restarted by their owners",
                    ready.user.name
                );
                services.connection_changed(event).await;
            }
        }
    }

    async fn resume(&self, ctx: Context, _: ResumedEvent) {
        if let Some(services) = services(&ctx).await {
            services.connection_changed(ConnectionEvent::Resumed).await;
        }
    }

    async fn shard_stage_update(&self, ctx: Context, event: ShardStageUpdateEvent) {
        info!(
            "⚡ Shard {} stage: {:?} -> {:?}",
            event.shard_id.0, event.old, event.new
        );

        if let Some(services) = services(&ctx).await {
            if let Some(change) = services.monitor.on_stage_change(event.old, event.new) {
                services.connection_changed(change).await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Hydrate & Stretch Bot...");

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(Handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    let transport = Arc::new(SerenityTransport::new(
        client.cache_and_http.http.clone(),
        client.cache_and_http.cache.clone(),
    ));
    let registry = Arc::new(ReminderRegistry::new());
    let assets = Arc::new(AssetPicker::new(config.asset_folders()));
    let controller = ReminderController::new(
        registry.clone(),
        transport,
        assets,
        config.interval_bounds(),
        config.stop_timeout(),
    );
    let purge = PurgeCoordinator::new(registry, config.stop_timeout());

    {
        let mut data = client.data.write().await;
        data.insert::<ReminderServices>(Arc::new(Services {
            commands: CommandHandler::new(controller, config.command_prefix.clone()),
            purge,
            monitor: ConnectionMonitor::new(),
        }));
    }

    info!(
        "⏰ Reminder intervals: {}..={} minutes, prefix '{}'",
        config.min_interval_minutes, config.max_interval_minutes, config.command_prefix
    );
    info!("Establishing WebSocket connection to Discord gateway...");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}

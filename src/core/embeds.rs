//! Embed builders for bot responses
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Single-embed command help replacing the default help listing
//! - 1.0.0: Initial release

use serenity::builder::CreateEmbed;

/// Accent colour of the help embed
pub const HELP_COLOR: u32 = 0x00B2FF;

/// (usage, description) pairs shown in the help embed
pub fn help_fields(prefix: &str) -> Vec<(String, String)> {
    vec![
        (
            format!("{prefix}hydrate <minutes> [#channel]"),
            "Start hydration reminders. The channel must be a mention (type `#` and pick \
             it from the list) in this server; if no channel is given, the current channel \
             is used."
                .to_string(),
        ),
        (
            format!("{prefix}stophydrate"),
            "Stop your hydration reminder.".to_string(),
        ),
        (
            format!("{prefix}stretch <minutes> [#channel]"),
            "Start stretch reminders.".to_string(),
        ),
        (
            format!("{prefix}stopstretch"),
            "Stop your stretch reminder.".to_string(),
        ),
        (
            format!("{prefix}stop / {prefix}stopall / {prefix}stopreminders"),
            "Stop **all** of your reminders.".to_string(),
        ),
        (
            "Examples".to_string(),
            format!("`{prefix}hydrate 30 #wellness`\n`{prefix}stretch 15`\n`{prefix}stop`"),
        ),
    ]
}

/// Build the help embed listing every reminder command
pub fn help_embed(prefix: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed.title("Hydrate & Stretch Bot – commands");
    embed.color(HELP_COLOR);
    embed.description("All reminders are **per-user** – only *you* are pinged.");
    for (name, value) in help_fields(prefix) {
        embed.field(name, value, false);
    }
    embed
}

use poise::serenity_prelude as serenity;
use tracing::debug;

use bastion_core::Data;
use bastion_guard::{MessageEvent, Verdict};

/// Run a guild message through the content checks.
pub async fn handle_message(data: &Data, message: &serenity::Message) {
    let Some(guild_id) = message.guild_id else {
        return;
    };

    let event = MessageEvent {
        guild_id: guild_id.get(),
        channel_id: message.channel_id.get(),
        message_id: message.id.get(),
        author_id: message.author.id.get(),
        body: message.content.clone(),
        author_is_bot: message.author.bot || message.webhook_id.is_some(),
    };

    let verdict = data.guard.on_message(&event).await;
    if let Verdict::Skipped(reason) = verdict {
        debug!(guild_id = event.guild_id, ?reason, "message skipped");
    }
}

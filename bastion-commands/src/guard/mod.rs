pub mod exempt;
pub mod protection;

use poise::serenity_prelude as serenity;

use bastion_core::{Context, Error};
use bastion_utils::permissions::is_guild_administrator;

pub(crate) fn guild_only_message() -> &'static str {
    "This command can only be used in a server."
}

/// Resolve the invoking guild, replying and returning `None` when the command
/// was used outside a guild or by someone without Administrator.
pub(crate) async fn administrator_guild(
    ctx: Context<'_>,
) -> Result<Option<serenity::GuildId>, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(None);
    };

    if !is_guild_administrator(ctx.http(), guild_id, ctx.author().id).await? {
        ctx.say("You need the **Administrator** permission to use this command.")
            .await?;
        return Ok(None);
    }

    Ok(Some(guild_id))
}

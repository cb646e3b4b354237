use poise::serenity_prelude as serenity;
use tracing::info;

use crate::CommandMeta;
use crate::guard::administrator_guild;
use bastion_core::{Context, Error};
use bastion_database::impls::exemptions::{add_exemption, list_exemptions, remove_exemption};
use bastion_database::model::exemption::ExemptionEntry;
use bastion_utils::embed::build_list_embed;

pub const META: CommandMeta = CommandMeta {
    name: "exempt",
    desc: "Manage members whose actions are never counted or remediated.",
    category: "guard",
    usage: "!exempt <add|remove|list> [user]",
};

/// Manage protection exemptions.
#[poise::command(
    prefix_command,
    slash_command,
    category = "Guard",
    subcommands("add", "remove", "list")
)]
pub async fn exempt(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(
        "Usage:\n\
         `!exempt add <user>` - exempt a member from all protections\n\
         `!exempt remove <user>` - remove an exemption\n\
         `!exempt list` - list exempt members",
    )
    .await?;

    Ok(())
}

/// Exempt a member from all protections.
#[poise::command(prefix_command, slash_command, category = "Guard")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Member to exempt"] user: serenity::User,
) -> Result<(), Error> {
    let Some(guild_id) = administrator_guild(ctx).await? else {
        return Ok(());
    };

    let inserted =
        add_exemption(&ctx.data().db, guild_id.get(), user.id.get(), ctx.author().id.get())
            .await?;

    if inserted {
        info!(
            guild_id = guild_id.get(),
            user_id = user.id.get(),
            added_by = ctx.author().id.get(),
            "exemption added"
        );
        ctx.say(format!("<@{}> is now exempt from protections.", user.id))
            .await?;
    } else {
        ctx.say(format!("<@{}> is already exempt.", user.id)).await?;
    }

    Ok(())
}

/// Remove a member's exemption.
#[poise::command(prefix_command, slash_command, category = "Guard")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Member to stop exempting"] user: serenity::User,
) -> Result<(), Error> {
    let Some(guild_id) = administrator_guild(ctx).await? else {
        return Ok(());
    };

    if remove_exemption(&ctx.data().db, guild_id.get(), user.id.get()).await? {
        info!(
            guild_id = guild_id.get(),
            user_id = user.id.get(),
            removed_by = ctx.author().id.get(),
            "exemption removed"
        );
        ctx.say(format!("<@{}> is no longer exempt.", user.id))
            .await?;
    } else {
        ctx.say(format!("<@{}> was not exempt.", user.id)).await?;
    }

    Ok(())
}

/// List exempt members.
#[poise::command(prefix_command, slash_command, category = "Guard")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = administrator_guild(ctx).await? else {
        return Ok(());
    };

    let entries = list_exemptions(&ctx.data().db, guild_id.get()).await?;
    let lines = entries.iter().map(exemption_line).collect::<Vec<_>>();

    let embed = build_list_embed(
        "Exempt Members",
        &lines,
        "No members are exempt.",
        Some(&format!("{} exempt member(s)", entries.len())),
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

fn exemption_line(entry: &ExemptionEntry) -> String {
    format!(
        "<@{}> - added by <@{}> <t:{}:R>",
        entry.user_id, entry.added_by, entry.added_at
    )
}

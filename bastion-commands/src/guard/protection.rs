use poise::serenity_prelude as serenity;
use tracing::info;

use crate::CommandMeta;
use crate::guard::administrator_guild;
use bastion_core::{Context, Error};
use bastion_database::impls::protections::{
    get_guild_policy, set_protection_enabled, set_protection_threshold,
};
use bastion_guard::{Category, GuardConfig, GuildPolicy};
use bastion_utils::embed::DEFAULT_EMBED_COLOR;
use bastion_utils::formatting::{format_compact_duration, status_label};

pub const META: CommandMeta = CommandMeta {
    name: "protection",
    desc: "Show or change which abuse protections are active.",
    category: "guard",
    usage: "!protection [enable|disable|limit] <category> [limit]",
};

/// Show every protection category and its state.
#[poise::command(
    prefix_command,
    slash_command,
    category = "Guard",
    subcommands("enable", "disable", "limit")
)]
pub async fn protection(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = administrator_guild(ctx).await? else {
        return Ok(());
    };

    let policy = get_guild_policy(&ctx.data().db, guild_id.get())
        .await?
        .unwrap_or_else(|| GuildPolicy::new(guild_id.get()));

    let embed = serenity::CreateEmbed::new()
        .title("Protections")
        .description(protection_lines(&policy).join("\n"))
        .color(DEFAULT_EMBED_COLOR)
        .footer(serenity::CreateEmbedFooter::new(windows_note(
            ctx.data().guard.config(),
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Enable a protection category.
#[poise::command(prefix_command, slash_command, category = "Guard")]
pub async fn enable(
    ctx: Context<'_>,
    #[description = "Protection category"] category: String,
) -> Result<(), Error> {
    toggle(ctx, &category, true).await
}

/// Disable a protection category.
#[poise::command(prefix_command, slash_command, category = "Guard")]
pub async fn disable(
    ctx: Context<'_>,
    #[description = "Protection category"] category: String,
) -> Result<(), Error> {
    toggle(ctx, &category, false).await
}

/// Set how many actions a category tolerates per window.
#[poise::command(prefix_command, slash_command, category = "Guard")]
pub async fn limit(
    ctx: Context<'_>,
    #[description = "Protection category"] category: String,
    #[description = "Actions tolerated per window (percent for shout_ratio)"] limit: u32,
) -> Result<(), Error> {
    let Some(guild_id) = administrator_guild(ctx).await? else {
        return Ok(());
    };

    let category = match category.parse::<Category>() {
        Ok(category) => category,
        Err(err) => {
            ctx.say(unknown_category_reply(&err.to_string())).await?;
            return Ok(());
        }
    };

    let limit = match validate_limit(category, limit) {
        Ok(limit) => limit,
        Err(reply) => {
            ctx.say(reply).await?;
            return Ok(());
        }
    };

    set_protection_threshold(&ctx.data().db, guild_id.get(), category, limit).await?;
    info!(
        guild_id = guild_id.get(),
        %category,
        limit,
        changed_by = ctx.author().id.get(),
        "protection limit changed"
    );

    let unit = if category == Category::ShoutRatio {
        "%"
    } else {
        ""
    };
    ctx.say(format!(
        "**{}** protection limit set to **{}{}**.",
        category.label(),
        limit,
        unit
    ))
    .await?;

    Ok(())
}

async fn toggle(ctx: Context<'_>, raw_category: &str, enabled: bool) -> Result<(), Error> {
    let Some(guild_id) = administrator_guild(ctx).await? else {
        return Ok(());
    };

    let category = match raw_category.parse::<Category>() {
        Ok(category) => category,
        Err(err) => {
            ctx.say(unknown_category_reply(&err.to_string())).await?;
            return Ok(());
        }
    };

    set_protection_enabled(&ctx.data().db, guild_id.get(), category, enabled).await?;
    info!(
        guild_id = guild_id.get(),
        %category,
        enabled,
        changed_by = ctx.author().id.get(),
        "protection toggled"
    );

    ctx.say(format!(
        "**{}** protection has been **{}**.",
        category.label(),
        if enabled { "enabled" } else { "disabled" }
    ))
    .await?;

    Ok(())
}

fn unknown_category_reply(error: &str) -> String {
    let names = Category::ALL
        .iter()
        .map(|category| format!("`{}`", category.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{error}. Valid categories: {names}")
}

fn validate_limit(category: Category, limit: u32) -> Result<u32, String> {
    if !category.uses_threshold() {
        return Err(format!(
            "**{}** acts on the first occurrence and has no limit.",
            category.label()
        ));
    }

    let max = category.max_threshold();
    if limit > max {
        return Err(format!("The limit must be between 0 and {max}."));
    }

    Ok(limit)
}

fn protection_lines(policy: &GuildPolicy) -> Vec<String> {
    Category::ALL
        .iter()
        .map(|&category| {
            let Some(threshold) = policy.threshold(category) else {
                return format!("**{} :** {}", category.label(), status_label(false));
            };

            if !category.uses_threshold() {
                format!("**{} :** {}", category.label(), status_label(true))
            } else if category == Category::ShoutRatio {
                format!(
                    "**{} :** {} (over {}% capitals)",
                    category.label(),
                    status_label(true),
                    threshold
                )
            } else {
                format!(
                    "**{} :** {} (limit {})",
                    category.label(),
                    status_label(true),
                    threshold
                )
            }
        })
        .collect()
}

fn windows_note(config: &GuardConfig) -> String {
    format!(
        "Window: {} for server changes, {} for messages. Spammers are timed out for {}.",
        format_compact_duration(config.structural_window),
        format_compact_duration(config.spam_window),
        format_compact_duration(config.spam_timeout),
    )
}

#[cfg(test)]
mod tests {
    use bastion_guard::Protection;

    use super::*;

    #[test]
    fn lists_every_category_once() {
        let policy = GuildPolicy::new(1)
            .with(Category::Channel, Protection::enabled(2))
            .with(Category::ShoutRatio, Protection::enabled(70))
            .with(Category::Link, Protection::enabled(0));

        let lines = protection_lines(&policy);

        assert_eq!(lines.len(), Category::ALL.len());
        assert!(lines.contains(&"**Channel :** Enabled (limit 2)".to_owned()));
        assert!(lines.iter().any(|line| line.contains("over 70% capitals")));
        assert!(
            lines
                .iter()
                .any(|line| line.starts_with(&format!("**{} :**", Category::Link.label()))
                    && line.ends_with("Enabled"))
        );
        assert!(
            lines
                .iter()
                .any(|line| line.starts_with(&format!("**{} :**", Category::Role.label()))
                    && line.ends_with("Disabled"))
        );
    }

    #[test]
    fn limits_are_bounded_per_category() {
        assert_eq!(validate_limit(Category::Channel, 0), Ok(0));
        assert_eq!(validate_limit(Category::Spam, 1_000), Ok(1_000));
        assert!(validate_limit(Category::Spam, 1_001).is_err());
        assert!(validate_limit(Category::ShoutRatio, 101).is_err());
        assert!(validate_limit(Category::Link, 3).is_err());
    }

    #[test]
    fn unknown_category_reply_lists_names() {
        let reply = unknown_category_reply("unknown protection category `x`");

        assert!(reply.starts_with("unknown protection category `x`."));
        assert!(reply.contains("`shout_ratio`"));
    }

    #[test]
    fn footer_reports_windows() {
        assert_eq!(
            windows_note(&GuardConfig::default()),
            "Window: 1m for server changes, 5s for messages. Spammers are timed out for 5m."
        );
    }
}

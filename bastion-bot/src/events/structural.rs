use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use bastion_core::Data;
use bastion_guard::{AssetKind, StructuralChange, StructuralEvent, Verdict};

/// Translate a gateway event into the structural changes it represents.
///
/// Emoji and sticker updates carry the full current list and are diffed
/// against the guild's inventory; everything else maps one to one.
fn structural_changes(data: &Data, event: &serenity::FullEvent) -> Vec<StructuralEvent> {
    let single = |guild_id: serenity::GuildId, change| {
        vec![StructuralEvent::new(guild_id.get(), change)]
    };

    match event {
        serenity::FullEvent::GuildUpdate { new_data, .. } => {
            single(new_data.id, StructuralChange::GuildSettingsUpdated)
        }
        serenity::FullEvent::ChannelCreate { channel } => single(
            channel.guild_id,
            StructuralChange::ChannelCreated {
                channel_id: channel.id.get(),
            },
        ),
        serenity::FullEvent::ChannelDelete { channel, .. } => single(
            channel.guild_id,
            StructuralChange::ChannelDeleted {
                channel_id: channel.id.get(),
            },
        ),
        serenity::FullEvent::GuildRoleCreate { new } => single(
            new.guild_id,
            StructuralChange::RoleCreated {
                role_id: new.id.get(),
            },
        ),
        serenity::FullEvent::GuildRoleDelete {
            guild_id,
            removed_role_id,
            ..
        } => single(
            *guild_id,
            StructuralChange::RoleDeleted {
                role_id: removed_role_id.get(),
            },
        ),
        serenity::FullEvent::GuildEmojisUpdate {
            guild_id,
            current_state,
        } => inventory_changes(
            data,
            *guild_id,
            AssetKind::Emoji,
            current_state.keys().map(|id| id.get()),
        ),
        serenity::FullEvent::GuildStickersUpdate {
            guild_id,
            current_state,
        } => inventory_changes(
            data,
            *guild_id,
            AssetKind::Sticker,
            current_state.keys().map(|id| id.get()),
        ),
        serenity::FullEvent::GuildBanAddition {
            guild_id,
            banned_user,
        } => single(
            *guild_id,
            StructuralChange::BanAdded {
                user_id: banned_user.id.get(),
            },
        ),
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => single(
            *guild_id,
            StructuralChange::MemberRemoved {
                user_id: user.id.get(),
            },
        ),
        serenity::FullEvent::GuildMemberAddition { new_member } => single(
            new_member.guild_id,
            StructuralChange::MemberAdded {
                user_id: new_member.user.id.get(),
                is_bot: new_member.user.bot,
            },
        ),
        _ => Vec::new(),
    }
}

fn inventory_changes(
    data: &Data,
    guild_id: serenity::GuildId,
    kind: AssetKind,
    current: impl Iterator<Item = u64>,
) -> Vec<StructuralEvent> {
    data.inventory
        .reconcile(guild_id.get(), kind, current)
        .into_changes(kind)
        .into_iter()
        .map(|change| StructuralEvent::new(guild_id.get(), change))
        .collect()
}

/// Feed structural gateway events to the engine.
pub async fn handle_structural_event(data: &Data, event: &serenity::FullEvent) {
    for change in structural_changes(data, event) {
        let verdict = data.guard.on_structural(change).await;
        match verdict {
            Verdict::Skipped(reason) => {
                debug!(guild_id = change.guild_id, ?reason, "structural change skipped");
            }
            Verdict::Tolerated { count, threshold } => {
                debug!(
                    guild_id = change.guild_id,
                    count,
                    threshold,
                    "structural change counted"
                );
            }
            Verdict::Clean | Verdict::Remediated { .. } => {}
        }
    }
}

/// Seed emoji and sticker inventories when a guild becomes available, and
/// drop them when it goes away.
pub fn track_guild_availability(data: &Data, event: &serenity::FullEvent) {
    match event {
        serenity::FullEvent::GuildCreate { guild, .. } => {
            let guild_id = guild.id.get();
            data.inventory.seed(
                guild_id,
                AssetKind::Emoji,
                guild.emojis.keys().map(|id| id.get()),
            );
            data.inventory.seed(
                guild_id,
                AssetKind::Sticker,
                guild.stickers.keys().map(|id| id.get()),
            );
            info!(guild_id, "guild inventory seeded");
        }
        serenity::FullEvent::GuildDelete { incomplete, .. } => {
            data.inventory.forget_guild(incomplete.id.get());
        }
        _ => {}
    }
}

//! Serenity-backed implementations of the engine's audit and remediation
//! seams.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use ::serenity::model::guild::audit_log::{
    Action, ChannelAction, EmojiAction, MemberAction, RoleAction, StickerAction,
};

use bastion_guard::{AuditEntry, AuditKind, AuditTrail, RemediationError, Remediator, Reversal};
use bastion_utils::errors::{DiscordFailure, classify};

fn audit_action(kind: AuditKind) -> Action {
    match kind {
        AuditKind::GuildUpdate => Action::GuildUpdate,
        AuditKind::ChannelCreate => Action::Channel(ChannelAction::Create),
        AuditKind::ChannelDelete => Action::Channel(ChannelAction::Delete),
        AuditKind::MemberKick => Action::Member(MemberAction::Kick),
        AuditKind::MemberBanAdd => Action::Member(MemberAction::BanAdd),
        AuditKind::BotAdd => Action::Member(MemberAction::BotAdd),
        AuditKind::RoleCreate => Action::Role(RoleAction::Create),
        AuditKind::RoleDelete => Action::Role(RoleAction::Delete),
        AuditKind::EmojiCreate => Action::Emoji(EmojiAction::Create),
        AuditKind::EmojiDelete => Action::Emoji(EmojiAction::Delete),
        AuditKind::StickerCreate => Action::Sticker(StickerAction::Create),
        AuditKind::StickerDelete => Action::Sticker(StickerAction::Delete),
    }
}

/// Reads the guild audit log over HTTP.
pub struct SerenityAudit {
    http: Arc<serenity::Http>,
}

impl SerenityAudit {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AuditTrail for SerenityAudit {
    async fn latest_entry(
        &self,
        guild_id: u64,
        kind: AuditKind,
    ) -> anyhow::Result<Option<AuditEntry>> {
        let logs = serenity::GuildId::new(guild_id)
            .audit_logs(self.http.as_ref(), Some(audit_action(kind)), None, None, Some(1))
            .await?;

        Ok(logs.entries.first().map(|entry| AuditEntry {
            actor_id: entry.user_id.get(),
            target_id: entry.target_id.map(|id| id.get()),
            created_at: u64::try_from(entry.id.created_at().unix_timestamp()).unwrap_or(0),
        }))
    }
}

/// Applies remediation through the Discord HTTP API.
pub struct SerenityRemediator {
    http: Arc<serenity::Http>,
}

impl SerenityRemediator {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

fn remediation_error(source: serenity::Error) -> RemediationError {
    match classify(&source) {
        DiscordFailure::MissingPermissions => RemediationError::MissingPermission,
        DiscordFailure::UnknownResource => RemediationError::TargetGone,
        DiscordFailure::Other => RemediationError::Platform(source.into()),
    }
}

fn timeout_until(duration: Duration) -> Result<serenity::Timestamp, RemediationError> {
    let until = SystemTime::now()
        .checked_add(duration)
        .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
        .ok_or_else(|| anyhow::anyhow!("timeout end is out of range"))?;
    let seconds = i64::try_from(until.as_secs())
        .map_err(|_| anyhow::anyhow!("timeout end is out of range"))?;

    Ok(serenity::Timestamp::from_unix_timestamp(seconds)
        .map_err(|e| anyhow::anyhow!("invalid timeout end: {e}"))?)
}

#[async_trait]
impl Remediator for SerenityRemediator {
    async fn reverse_change(
        &self,
        guild_id: u64,
        reversal: Reversal,
    ) -> Result<(), RemediationError> {
        let guild_id = serenity::GuildId::new(guild_id);
        let http = self.http.as_ref();

        match reversal {
            Reversal::DeleteRole(role_id) => guild_id
                .delete_role(http, serenity::RoleId::new(role_id))
                .await
                .map_err(remediation_error),
            Reversal::DeleteChannel(channel_id) => serenity::ChannelId::new(channel_id)
                .delete(http)
                .await
                .map(|_| ())
                .map_err(remediation_error),
            Reversal::DeleteEmoji(emoji_id) => guild_id
                .delete_emoji(http, serenity::EmojiId::new(emoji_id))
                .await
                .map_err(remediation_error),
            Reversal::DeleteSticker(sticker_id) => guild_id
                .delete_sticker(http, serenity::StickerId::new(sticker_id))
                .await
                .map_err(remediation_error),
            Reversal::LiftBan(user_id) => guild_id
                .unban(http, serenity::UserId::new(user_id))
                .await
                .map_err(remediation_error),
            Reversal::EjectMember(user_id) => guild_id
                .kick_with_reason(http, serenity::UserId::new(user_id), "Unauthorized bot addition")
                .await
                .map_err(remediation_error),
        }
    }

    async fn banish_actor(
        &self,
        guild_id: u64,
        actor_id: u64,
        reason: &str,
    ) -> Result<(), RemediationError> {
        serenity::GuildId::new(guild_id)
            .ban_with_reason(self.http.as_ref(), serenity::UserId::new(actor_id), 0, reason)
            .await
            .map_err(remediation_error)
    }

    async fn suspend_actor(
        &self,
        guild_id: u64,
        actor_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), RemediationError> {
        let edit = serenity::EditMember::new()
            .disable_communication_until_datetime(timeout_until(duration)?)
            .audit_log_reason(reason);

        serenity::GuildId::new(guild_id)
            .edit_member(self.http.as_ref(), serenity::UserId::new(actor_id), edit)
            .await
            .map(|_| ())
            .map_err(remediation_error)
    }

    async fn delete_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<(), RemediationError> {
        serenity::ChannelId::new(channel_id)
            .delete_message(self.http.as_ref(), serenity::MessageId::new(message_id))
            .await
            .map_err(remediation_error)
    }

    async fn send_channel_notice(
        &self,
        channel_id: u64,
        text: &str,
    ) -> Result<(), RemediationError> {
        serenity::ChannelId::new(channel_id)
            .say(self.http.as_ref(), text)
            .await
            .map(|_| ())
            .map_err(remediation_error)
    }
}

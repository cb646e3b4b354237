//! Structural abuse detection.
//!
//! Attributes role, channel, emoji, sticker, ban, kick, bot-addition and
//! guild-settings changes to an actor through the audit trail, counts them
//! per actor and category, and banishes actors whose rate exceeds the guild's
//! threshold. The actor's own permission level is never consulted: only the
//! rate of the sensitive action matters.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::audit::{AuditKind, AuditTrail};
use crate::category::Category;
use crate::counter::{ActionKey, Breach, WindowCounter};
use crate::policy::PolicySource;
use crate::remediation::{RemediationOutcome, Remediator, Reversal, Sanction, log_failure};
use crate::verdict::{Skip, Verdict};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuralChange {
    GuildSettingsUpdated,
    ChannelCreated { channel_id: u64 },
    ChannelDeleted { channel_id: u64 },
    RoleCreated { role_id: u64 },
    RoleDeleted { role_id: u64 },
    EmojiCreated { emoji_id: u64 },
    EmojiDeleted { emoji_id: u64 },
    StickerCreated { sticker_id: u64 },
    StickerDeleted { sticker_id: u64 },
    BanAdded { user_id: u64 },
    MemberRemoved { user_id: u64 },
    MemberAdded { user_id: u64, is_bot: bool },
}

impl StructuralChange {
    pub fn category(self) -> Category {
        match self {
            StructuralChange::GuildSettingsUpdated => Category::GuildSettings,
            StructuralChange::ChannelCreated { .. } | StructuralChange::ChannelDeleted { .. } => {
                Category::Channel
            }
            StructuralChange::RoleCreated { .. } | StructuralChange::RoleDeleted { .. } => {
                Category::Role
            }
            StructuralChange::EmojiCreated { .. } | StructuralChange::EmojiDeleted { .. } => {
                Category::Emoji
            }
            StructuralChange::StickerCreated { .. } | StructuralChange::StickerDeleted { .. } => {
                Category::Sticker
            }
            StructuralChange::BanAdded { .. } => Category::Ban,
            StructuralChange::MemberRemoved { .. } => Category::Kick,
            StructuralChange::MemberAdded { .. } => Category::AddedBot,
        }
    }

    pub fn audit_kind(self) -> AuditKind {
        match self {
            StructuralChange::GuildSettingsUpdated => AuditKind::GuildUpdate,
            StructuralChange::ChannelCreated { .. } => AuditKind::ChannelCreate,
            StructuralChange::ChannelDeleted { .. } => AuditKind::ChannelDelete,
            StructuralChange::RoleCreated { .. } => AuditKind::RoleCreate,
            StructuralChange::RoleDeleted { .. } => AuditKind::RoleDelete,
            StructuralChange::EmojiCreated { .. } => AuditKind::EmojiCreate,
            StructuralChange::EmojiDeleted { .. } => AuditKind::EmojiDelete,
            StructuralChange::StickerCreated { .. } => AuditKind::StickerCreate,
            StructuralChange::StickerDeleted { .. } => AuditKind::StickerDelete,
            StructuralChange::BanAdded { .. } => AuditKind::MemberBanAdd,
            StructuralChange::MemberRemoved { .. } => AuditKind::MemberKick,
            StructuralChange::MemberAdded { .. } => AuditKind::BotAdd,
        }
    }

    pub fn target_id(self) -> Option<u64> {
        match self {
            StructuralChange::GuildSettingsUpdated => None,
            StructuralChange::ChannelCreated { channel_id }
            | StructuralChange::ChannelDeleted { channel_id } => Some(channel_id),
            StructuralChange::RoleCreated { role_id } | StructuralChange::RoleDeleted { role_id } => {
                Some(role_id)
            }
            StructuralChange::EmojiCreated { emoji_id }
            | StructuralChange::EmojiDeleted { emoji_id } => Some(emoji_id),
            StructuralChange::StickerCreated { sticker_id }
            | StructuralChange::StickerDeleted { sticker_id } => Some(sticker_id),
            StructuralChange::BanAdded { user_id }
            | StructuralChange::MemberRemoved { user_id }
            | StructuralChange::MemberAdded { user_id, .. } => Some(user_id),
        }
    }

    /// Undo step for reversible changes. Deletions cannot be undone here.
    pub fn reversal(self) -> Option<Reversal> {
        match self {
            StructuralChange::ChannelCreated { channel_id } => {
                Some(Reversal::DeleteChannel(channel_id))
            }
            StructuralChange::RoleCreated { role_id } => Some(Reversal::DeleteRole(role_id)),
            StructuralChange::EmojiCreated { emoji_id } => Some(Reversal::DeleteEmoji(emoji_id)),
            StructuralChange::StickerCreated { sticker_id } => {
                Some(Reversal::DeleteSticker(sticker_id))
            }
            StructuralChange::BanAdded { user_id } => Some(Reversal::LiftBan(user_id)),
            StructuralChange::MemberAdded { user_id, .. } => Some(Reversal::EjectMember(user_id)),
            _ => None,
        }
    }

    /// A member leaving looks like a kick only when the latest kick entry
    /// names that same member; anything else is a voluntary leave or an
    /// unrelated kick.
    fn requires_target_match(self) -> bool {
        matches!(self, StructuralChange::MemberRemoved { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructuralEvent {
    pub guild_id: u64,
    pub change: StructuralChange,
}

impl StructuralEvent {
    pub fn new(guild_id: u64, change: StructuralChange) -> Self {
        Self { guild_id, change }
    }
}

pub struct StructuralGuard {
    policies: Arc<dyn PolicySource>,
    audit: Arc<dyn AuditTrail>,
    remediator: Arc<dyn Remediator>,
    counter: Arc<WindowCounter<ActionKey>>,
    self_id: Option<u64>,
}

impl StructuralGuard {
    pub fn new(
        policies: Arc<dyn PolicySource>,
        audit: Arc<dyn AuditTrail>,
        remediator: Arc<dyn Remediator>,
        window: Duration,
    ) -> Self {
        Self {
            policies,
            audit,
            remediator,
            counter: Arc::new(WindowCounter::new(window)),
            self_id: None,
        }
    }

    /// Never count changes made by this account (our own reversals and bans).
    pub fn ignoring_actor(mut self, actor_id: u64) -> Self {
        self.self_id = Some(actor_id);
        self
    }

    pub fn counter(&self) -> &Arc<WindowCounter<ActionKey>> {
        &self.counter
    }

    pub async fn handle(&self, event: StructuralEvent) -> Verdict {
        let StructuralEvent { guild_id, change } = event;
        let category = change.category();

        if let StructuralChange::MemberAdded { is_bot: false, .. } = change {
            return Verdict::Skipped(Skip::NotABot);
        }

        let threshold = match self.policies.guild_policy(guild_id).await {
            Ok(Some(policy)) => match policy.threshold(category) {
                Some(threshold) => threshold,
                None => return Verdict::Skipped(Skip::Disabled),
            },
            Ok(None) => return Verdict::Skipped(Skip::Disabled),
            Err(source) => {
                error!(?source, guild_id, %category, "failed to read guild policy");
                return Verdict::Skipped(Skip::StoreUnavailable);
            }
        };

        let entry = match self.audit.latest_entry(guild_id, change.audit_kind()).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(guild_id, %category, "no audit entry; change left unattributed");
                return Verdict::Skipped(Skip::Unattributed);
            }
            Err(source) => {
                warn!(?source, guild_id, %category, "audit log lookup failed");
                return Verdict::Skipped(Skip::Unattributed);
            }
        };

        if change.requires_target_match() && entry.target_id != change.target_id() {
            return Verdict::Skipped(Skip::TargetMismatch);
        }

        let actor_id = entry.actor_id;
        debug!(
            guild_id,
            actor_id,
            %category,
            entry_created_at = entry.created_at,
            "change attributed from audit log"
        );
        if self.self_id == Some(actor_id) {
            return Verdict::Skipped(Skip::OwnAction);
        }

        match self.policies.is_exempt(guild_id, actor_id).await {
            Ok(false) => {}
            Ok(true) => return Verdict::Skipped(Skip::Exempt),
            Err(source) => {
                error!(?source, guild_id, actor_id, "failed to read exemption list");
                return Verdict::Skipped(Skip::StoreUnavailable);
            }
        }

        // Unauthorized bots are removed on sight; the category threshold only
        // gates whether the protection is on.
        if let StructuralChange::MemberAdded { user_id, .. } = change {
            warn!(guild_id, actor_id, bot_id = user_id, "unauthorized bot addition");
            return self
                .escalate(guild_id, actor_id, change, "Unauthorized bot addition")
                .await;
        }

        let key = ActionKey::new(guild_id, actor_id, category);
        match self.counter.increment_past(key, threshold) {
            Breach::Within(count) => {
                debug!(guild_id, actor_id, %category, count, threshold, "structural action counted");
                Verdict::Tolerated { count, threshold }
            }
            Breach::Exceeded(count) => {
                warn!(guild_id, actor_id, %category, count, threshold, "structural limit exceeded");
                let reason = format!("{} protection: limit exceeded", category.label());
                self.escalate(guild_id, actor_id, change, &reason).await
            }
        }
    }

    async fn escalate(
        &self,
        guild_id: u64,
        actor_id: u64,
        change: StructuralChange,
        reason: &str,
    ) -> Verdict {
        let reversal = change.reversal();
        if let Some(reversal) = reversal {
            log_failure(
                "reverse_change",
                guild_id,
                self.remediator.reverse_change(guild_id, reversal).await,
            );
        }

        log_failure(
            "banish_actor",
            guild_id,
            self.remediator.banish_actor(guild_id, actor_id, reason).await,
        );
        info!(guild_id, actor_id, reverted = reversal.is_some(), "actor banished");

        Verdict::Remediated {
            category: change.category(),
            outcome: RemediationOutcome {
                revert: reversal.is_some(),
                sanction: Sanction::Banish,
            },
        }
    }
}

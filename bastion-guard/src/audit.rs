use async_trait::async_trait;

/// Audit-log entry types the structural detector correlates events with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuditKind {
    GuildUpdate,
    ChannelCreate,
    ChannelDelete,
    MemberKick,
    MemberBanAdd,
    BotAdd,
    RoleCreate,
    RoleDelete,
    EmojiCreate,
    EmojiDelete,
    StickerCreate,
    StickerDelete,
}

impl AuditKind {
    /// Numeric audit-log action type on the platform.
    pub fn code(self) -> u8 {
        match self {
            AuditKind::GuildUpdate => 1,
            AuditKind::ChannelCreate => 10,
            AuditKind::ChannelDelete => 12,
            AuditKind::MemberKick => 20,
            AuditKind::MemberBanAdd => 22,
            AuditKind::BotAdd => 28,
            AuditKind::RoleCreate => 30,
            AuditKind::RoleDelete => 32,
            AuditKind::EmojiCreate => 60,
            AuditKind::EmojiDelete => 62,
            AuditKind::StickerCreate => 90,
            AuditKind::StickerDelete => 92,
        }
    }
}

/// Freshest audit entry of a given kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub actor_id: u64,
    pub target_id: Option<u64>,
    /// Unix seconds. Carried for logging; attribution does not compare it
    /// against the event time.
    pub created_at: u64,
}

/// Platform audit trail.
///
/// Only the single most recent entry of a kind is consulted. Two actors doing
/// the same kind of change at nearly the same moment can therefore be
/// confused with one another; the detector does not try to disambiguate.
/// Entry age is not checked either, so a change the audit log never records
/// is attributed to whoever last performed that kind of change.
#[async_trait]
pub trait AuditTrail: Send + Sync {
    async fn latest_entry(
        &self,
        guild_id: u64,
        kind: AuditKind,
    ) -> anyhow::Result<Option<AuditEntry>>;
}

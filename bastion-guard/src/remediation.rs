use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, warn};

/// Undo step applied before the actor is sanctioned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reversal {
    DeleteRole(u64),
    DeleteChannel(u64),
    DeleteEmoji(u64),
    DeleteSticker(u64),
    LiftBan(u64),
    /// Remove a member that was added without authorization (bots).
    EjectMember(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sanction {
    None,
    Banish,
    Suspend(Duration),
}

/// What a detector decided to do about an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemediationOutcome {
    pub revert: bool,
    pub sanction: Sanction,
}

#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("missing platform permission")]
    MissingPermission,
    #[error("target no longer exists")]
    TargetGone,
    #[error(transparent)]
    Platform(#[from] anyhow::Error),
}

/// Side-effecting sink implemented by the platform client.
#[async_trait]
pub trait Remediator: Send + Sync {
    async fn reverse_change(&self, guild_id: u64, reversal: Reversal)
    -> Result<(), RemediationError>;

    async fn banish_actor(
        &self,
        guild_id: u64,
        actor_id: u64,
        reason: &str,
    ) -> Result<(), RemediationError>;

    async fn suspend_actor(
        &self,
        guild_id: u64,
        actor_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), RemediationError>;

    async fn delete_message(&self, channel_id: u64, message_id: u64)
    -> Result<(), RemediationError>;

    async fn send_channel_notice(&self, channel_id: u64, text: &str)
    -> Result<(), RemediationError>;
}

/// Log a failed remediation call. Failures are never retried and never undo
/// counter state.
pub(crate) fn log_failure(step: &'static str, guild_id: u64, result: Result<(), RemediationError>) {
    match result {
        Ok(()) => {}
        Err(RemediationError::MissingPermission) => {
            warn!(guild_id, step, "missing permissions for remediation (check role hierarchy)");
        }
        Err(RemediationError::TargetGone) => {
            warn!(guild_id, step, "remediation target no longer exists");
        }
        Err(RemediationError::Platform(source)) => {
            error!(?source, guild_id, step, "remediation call failed");
        }
    }
}

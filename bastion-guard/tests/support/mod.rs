#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use bastion_guard::{
    AuditEntry, AuditKind, AuditTrail, Category, GuildPolicy, PolicySource, Protection,
    RemediationError, Remediator, Reversal,
};

pub const GUILD: u64 = 100;

#[derive(Default)]
pub struct MemoryPolicies {
    policies: Mutex<HashMap<u64, GuildPolicy>>,
    exemptions: Mutex<HashSet<(u64, u64)>>,
    pub reads: Mutex<u32>,
}

impl MemoryPolicies {
    pub fn with_policy(policy: GuildPolicy) -> Arc<Self> {
        let store = Self::default();
        store.policies.lock().unwrap().insert(policy.guild_id, policy);
        Arc::new(store)
    }

    pub fn enabled(category: Category, threshold: u32) -> Arc<Self> {
        Self::with_policy(GuildPolicy::new(GUILD).with(category, Protection::enabled(threshold)))
    }

    pub fn exempt(&self, guild_id: u64, user_id: u64) {
        self.exemptions.lock().unwrap().insert((guild_id, user_id));
    }
}

#[async_trait]
impl PolicySource for MemoryPolicies {
    async fn guild_policy(&self, guild_id: u64) -> anyhow::Result<Option<GuildPolicy>> {
        *self.reads.lock().unwrap() += 1;
        Ok(self.policies.lock().unwrap().get(&guild_id).cloned())
    }

    async fn is_exempt(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
        Ok(self.exemptions.lock().unwrap().contains(&(guild_id, user_id)))
    }
}

/// Policy source that yields to the scheduler before every read, so
/// concurrent handlers interleave on a multi-threaded runtime.
pub struct YieldingPolicies(pub Arc<MemoryPolicies>);

#[async_trait]
impl PolicySource for YieldingPolicies {
    async fn guild_policy(&self, guild_id: u64) -> anyhow::Result<Option<GuildPolicy>> {
        tokio::task::yield_now().await;
        self.0.guild_policy(guild_id).await
    }

    async fn is_exempt(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
        tokio::task::yield_now().await;
        self.0.is_exempt(guild_id, user_id).await
    }
}

/// Audit trail answering every lookup of a kind with a fixed entry.
#[derive(Default)]
pub struct ScriptedAudit {
    entries: Mutex<HashMap<AuditKind, AuditEntry>>,
}

impl ScriptedAudit {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, kind: AuditKind, actor_id: u64, target_id: Option<u64>) {
        self.entries.lock().unwrap().insert(
            kind,
            AuditEntry {
                actor_id,
                target_id,
                created_at: 1_700_000_000,
            },
        );
    }
}

#[async_trait]
impl AuditTrail for ScriptedAudit {
    async fn latest_entry(
        &self,
        _guild_id: u64,
        kind: AuditKind,
    ) -> anyhow::Result<Option<AuditEntry>> {
        Ok(self.entries.lock().unwrap().get(&kind).copied())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Reverse(Reversal),
    Banish { actor_id: u64, reason: String },
    Suspend { actor_id: u64, duration: Duration },
    DeleteMessage { channel_id: u64, message_id: u64 },
    Notice { channel_id: u64, text: String },
}

#[derive(Default)]
pub struct RecordingRemediator {
    calls: Mutex<Vec<Call>>,
    pub fail_reverse: Mutex<bool>,
    pub fail_banish: Mutex<bool>,
    pub fail_delete: Mutex<bool>,
}

impl RecordingRemediator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn banished(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Banish { actor_id, .. } => Some(actor_id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Remediator for RecordingRemediator {
    async fn reverse_change(
        &self,
        _guild_id: u64,
        reversal: Reversal,
    ) -> Result<(), RemediationError> {
        self.record(Call::Reverse(reversal));
        if *self.fail_reverse.lock().unwrap() {
            return Err(RemediationError::TargetGone);
        }
        Ok(())
    }

    async fn banish_actor(
        &self,
        _guild_id: u64,
        actor_id: u64,
        reason: &str,
    ) -> Result<(), RemediationError> {
        self.record(Call::Banish {
            actor_id,
            reason: reason.to_owned(),
        });
        if *self.fail_banish.lock().unwrap() {
            return Err(RemediationError::MissingPermission);
        }
        Ok(())
    }

    async fn suspend_actor(
        &self,
        _guild_id: u64,
        actor_id: u64,
        duration: Duration,
        _reason: &str,
    ) -> Result<(), RemediationError> {
        self.record(Call::Suspend { actor_id, duration });
        Ok(())
    }

    async fn delete_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<(), RemediationError> {
        self.record(Call::DeleteMessage {
            channel_id,
            message_id,
        });
        if *self.fail_delete.lock().unwrap() {
            return Err(RemediationError::TargetGone);
        }
        Ok(())
    }

    async fn send_channel_notice(
        &self,
        channel_id: u64,
        text: &str,
    ) -> Result<(), RemediationError> {
        self.record(Call::Notice {
            channel_id,
            text: text.to_owned(),
        });
        Ok(())
    }
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Enable flag and threshold for a single category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protection {
    pub enabled: bool,
    /// Count for rate categories, percentage for shout ratio.
    pub threshold: u32,
}

impl Protection {
    pub fn enabled(threshold: u32) -> Self {
        Self {
            enabled: true,
            threshold,
        }
    }
}

/// Per-guild protection settings.
///
/// A category missing from `protections` is disabled, and so is every
/// category of a guild that has no policy at all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildPolicy {
    pub guild_id: u64,
    pub protections: BTreeMap<Category, Protection>,
}

impl GuildPolicy {
    pub fn new(guild_id: u64) -> Self {
        Self {
            guild_id,
            protections: BTreeMap::new(),
        }
    }

    pub fn with(mut self, category: Category, protection: Protection) -> Self {
        self.protections.insert(category, protection);
        self
    }

    /// Threshold for `category` if, and only if, it is enabled.
    pub fn threshold(&self, category: Category) -> Option<u32> {
        self.protections
            .get(&category)
            .filter(|protection| protection.enabled)
            .map(|protection| protection.threshold)
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        self.threshold(category).is_some()
    }

    pub fn any_content_enabled(&self) -> bool {
        self.protections
            .iter()
            .any(|(category, protection)| category.is_content() && protection.enabled)
    }
}

/// Read side of the persisted configuration consumed by the detectors.
#[async_trait]
pub trait PolicySource: Send + Sync {
    async fn guild_policy(&self, guild_id: u64) -> anyhow::Result<Option<GuildPolicy>>;

    async fn is_exempt(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool>;
}

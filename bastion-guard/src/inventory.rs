//! Emoji and sticker inventories.
//!
//! The gateway reports a guild's full emoji or sticker list on every change,
//! so creations and deletions are derived by diffing against the last list
//! seen for that guild.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::structural::StructuralChange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Emoji,
    Sticker,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetDiff {
    pub created: Vec<u64>,
    pub deleted: Vec<u64>,
}

impl AssetDiff {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty()
    }

    pub fn into_changes(self, kind: AssetKind) -> Vec<StructuralChange> {
        let created = self.created.into_iter().map(move |id| match kind {
            AssetKind::Emoji => StructuralChange::EmojiCreated { emoji_id: id },
            AssetKind::Sticker => StructuralChange::StickerCreated { sticker_id: id },
        });
        let deleted = self.deleted.into_iter().map(move |id| match kind {
            AssetKind::Emoji => StructuralChange::EmojiDeleted { emoji_id: id },
            AssetKind::Sticker => StructuralChange::StickerDeleted { sticker_id: id },
        });

        created.chain(deleted).collect()
    }
}

#[derive(Debug, Default)]
pub struct AssetInventory {
    known: DashMap<(u64, AssetKind), HashSet<u64>>,
}

impl AssetInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the known list without reporting a diff (guild became available).
    pub fn seed(&self, guild_id: u64, kind: AssetKind, ids: impl IntoIterator<Item = u64>) {
        self.known.insert((guild_id, kind), ids.into_iter().collect());
    }

    /// Store `current` and return what changed since the previous list.
    ///
    /// The first list seen for a guild only seeds the inventory.
    pub fn reconcile(
        &self,
        guild_id: u64,
        kind: AssetKind,
        current: impl IntoIterator<Item = u64>,
    ) -> AssetDiff {
        let current: HashSet<u64> = current.into_iter().collect();
        let Some(previous) = self.known.insert((guild_id, kind), current.clone()) else {
            return AssetDiff::default();
        };

        let mut created: Vec<u64> = current.difference(&previous).copied().collect();
        let mut deleted: Vec<u64> = previous.difference(&current).copied().collect();
        created.sort_unstable();
        deleted.sort_unstable();

        AssetDiff { created, deleted }
    }

    pub fn forget_guild(&self, guild_id: u64) {
        self.known.retain(|(known_guild, _), _| *known_guild != guild_id);
    }
}

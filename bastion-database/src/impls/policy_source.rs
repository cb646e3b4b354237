use async_trait::async_trait;
use bastion_guard::{GuildPolicy, PolicySource};

use crate::database::Database;
use crate::impls::{exemptions, protections};

#[async_trait]
impl PolicySource for Database {
    async fn guild_policy(&self, guild_id: u64) -> anyhow::Result<Option<GuildPolicy>> {
        protections::get_guild_policy(self, guild_id).await
    }

    async fn is_exempt(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
        exemptions::is_exempt(self, guild_id, user_id).await
    }
}

use anyhow::Context as _;

use crate::cache::{exemptions_key, invalidate_exemptions};
use crate::database::Database;
use crate::model::exemption::ExemptionEntry;

/// Exempt `user_id` in `guild_id`. Returns `false` if the member was already
/// exempt.
pub async fn add_exemption(
    db: &Database,
    guild_id: u64,
    user_id: u64,
    added_by: u64,
) -> anyhow::Result<bool> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;
    let added_by_i64 = i64::try_from(added_by).context("added_by out of i64 range")?;

    let result = sqlx::query(
        "INSERT INTO guild_exemptions (guild_id, user_id, added_by)
         VALUES ($1, $2, $3)
         ON CONFLICT (guild_id, user_id) DO NOTHING",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .bind(added_by_i64)
    .execute(db.pool())
    .await?;

    invalidate_exemptions(db.cache(), guild_id).await?;

    Ok(result.rows_affected() > 0)
}

/// Returns `true` if an exemption was removed.
pub async fn remove_exemption(db: &Database, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;

    let result = sqlx::query("DELETE FROM guild_exemptions WHERE guild_id = $1 AND user_id = $2")
        .bind(guild_id_i64)
        .bind(user_id_i64)
        .execute(db.pool())
        .await?;

    invalidate_exemptions(db.cache(), guild_id).await?;

    Ok(result.rows_affected() > 0)
}

/// Every exemption of a guild, oldest first.
pub async fn list_exemptions(db: &Database, guild_id: u64) -> anyhow::Result<Vec<ExemptionEntry>> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    let rows = sqlx::query_as::<_, (i64, i64, i64)>(
        "SELECT user_id, added_by, added_at
         FROM guild_exemptions
         WHERE guild_id = $1
         ORDER BY added_at ASC, user_id ASC",
    )
    .bind(guild_id_i64)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter()
        .map(|(user_id, added_by, added_at)| {
            Ok(ExemptionEntry {
                user_id: u64::try_from(user_id).context("user_id out of u64 range")?,
                added_by: u64::try_from(added_by).context("added_by out of u64 range")?,
                added_at: u64::try_from(added_at).context("added_at out of u64 range")?,
            })
        })
        .collect()
}

/// Exempt member ids of a guild, served through the cache for the hot path.
pub async fn exempt_user_ids(db: &Database, guild_id: u64) -> anyhow::Result<Vec<u64>> {
    let cache_key = exemptions_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, db.cache().config_ttl(), || async {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let ids: Vec<i64> =
                sqlx::query_scalar("SELECT user_id FROM guild_exemptions WHERE guild_id = $1")
                    .bind(guild_id_i64)
                    .fetch_all(db.pool())
                    .await?;

            ids.into_iter()
                .map(|id| u64::try_from(id).context("user_id out of u64 range"))
                .collect()
        })
        .await
}

pub async fn is_exempt(db: &Database, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
    Ok(exempt_user_ids(db, guild_id).await?.contains(&user_id))
}

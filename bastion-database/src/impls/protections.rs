use anyhow::Context as _;
use bastion_guard::{Category, GuildPolicy, Protection};
use tracing::warn;

use crate::cache::{invalidate_protections, protections_key};
use crate::database::Database;

/// Load the protection settings of a guild, or `None` when nothing was ever
/// configured for it.
pub async fn get_guild_policy(db: &Database, guild_id: u64) -> anyhow::Result<Option<GuildPolicy>> {
    let cache_key = protections_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, db.cache().config_ttl(), || async {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let rows = sqlx::query_as::<_, (String, bool, i32)>(
                "SELECT category, enabled, threshold FROM guild_protections WHERE guild_id = $1",
            )
            .bind(guild_id_i64)
            .fetch_all(db.pool())
            .await?;

            Ok(policy_from_rows(guild_id, rows))
        })
        .await
}

/// Turn stored rows into a policy. Rows naming a category this build does
/// not know are skipped.
pub fn policy_from_rows(
    guild_id: u64,
    rows: impl IntoIterator<Item = (String, bool, i32)>,
) -> Option<GuildPolicy> {
    let mut rows = rows.into_iter().peekable();
    rows.peek()?;

    let mut policy = GuildPolicy::new(guild_id);
    for (category, enabled, threshold) in rows {
        let Ok(category) = category.parse::<Category>() else {
            warn!(guild_id, category = %category, "skipping unknown protection category");
            continue;
        };
        policy.protections.insert(
            category,
            Protection {
                enabled,
                threshold: u32::try_from(threshold).unwrap_or(0),
            },
        );
    }

    Some(policy)
}

/// Switch a category on or off. A category enabled for the first time
/// starts at its default threshold.
pub async fn set_protection_enabled(
    db: &Database,
    guild_id: u64,
    category: Category,
    enabled: bool,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let threshold = i32::try_from(category.default_threshold()).context("threshold out of range")?;

    sqlx::query(
        "INSERT INTO guild_protections (guild_id, category, enabled, threshold)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (guild_id, category) DO UPDATE SET enabled = EXCLUDED.enabled",
    )
    .bind(guild_id_i64)
    .bind(category.as_str())
    .bind(enabled)
    .bind(threshold)
    .execute(db.pool())
    .await?;

    invalidate_protections(db.cache(), guild_id).await?;

    Ok(())
}

/// Store a new threshold without touching the enabled flag.
pub async fn set_protection_threshold(
    db: &Database,
    guild_id: u64,
    category: Category,
    threshold: u32,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let threshold = i32::try_from(threshold).context("threshold out of range")?;

    sqlx::query(
        "INSERT INTO guild_protections (guild_id, category, threshold)
         VALUES ($1, $2, $3)
         ON CONFLICT (guild_id, category) DO UPDATE SET threshold = EXCLUDED.threshold",
    )
    .bind(guild_id_i64)
    .bind(category.as_str())
    .bind(threshold)
    .execute(db.pool())
    .await?;

    invalidate_protections(db.cache(), guild_id).await?;

    Ok(())
}

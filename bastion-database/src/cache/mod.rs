mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use redis_store::RedisCacheStore;

/// How long guild configuration may be served from cache before a reload.
pub const DEFAULT_CONFIG_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled,
    Redis(RedisCacheStore),
}

#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
    config_ttl: Duration,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled,
            config_ttl: DEFAULT_CONFIG_CACHE_TTL,
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
            config_ttl: DEFAULT_CONFIG_CACHE_TTL,
        })
    }

    /// Bound the staleness of cached guild configuration.
    pub fn configure_config_ttl(&mut self, ttl: Duration) {
        self.config_ttl = ttl;
    }

    pub fn config_ttl(&self) -> Duration {
        self.config_ttl
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled => Ok(()),
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            CacheBackend::Disabled => None,
            CacheBackend::Redis(store) => store.get(key).await?,
        };

        match value {
            Some(bytes) => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let CacheBackend::Redis(store) = &self.backend else {
            return Ok(());
        };
        let ttl_seconds = ttl.as_secs().max(1);
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;

        store.set(key, payload, ttl_seconds).await
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled => Ok(()),
            CacheBackend::Redis(store) => store.del(key).await,
        }
    }

    /// Serve `key` from cache, or load it, store it for `ttl` and return it.
    /// Cache failures degrade to a direct load.
    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(
                ?e,
                cache_key = key,
                "cache get failed; falling back to database"
            ),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded, ttl).await {
            warn!(
                ?e,
                cache_key = key,
                "cache set failed; returning database value"
            );
        }

        Ok(loaded)
    }
}

pub fn protections_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("guild:{guild_id}:protections"))
}

pub fn exemptions_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("guild:{guild_id}:exemptions"))
}

pub async fn invalidate_protections(cache: &CacheService, guild_id: u64) -> anyhow::Result<()> {
    cache.del(&protections_key(cache, guild_id)).await
}

pub async fn invalidate_exemptions(cache: &CacheService, guild_id: u64) -> anyhow::Result<()> {
    cache.del(&exemptions_key(cache, guild_id)).await
}

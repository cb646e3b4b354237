mod events;
mod platform;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use bastion_core::{Data, Error};
use bastion_database::{CacheService, Database};
use bastion_guard::{AssetInventory, Guard, GuardConfig};

use platform::{SerenityAudit, SerenityRemediator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();

    let token = env::var("DISCORD_TOKEN")?;
    let database_url = env::var("DATABASE_URL")?;
    let guild_id = env::var("DISCORD_GUILD_ID")?.parse::<u64>()?;

    let mut cache = build_cache();
    cache.configure_config_ttl(Duration::from_secs(env_u64(
        "GUARD_POLICY_CACHE_SECONDS",
        cache.config_ttl().as_secs(),
    )));

    if cache.is_redis_enabled() {
        if let Err(err) = cache.ping().await {
            warn!(
                ?err,
                "Redis cache ping failed; cache operations will continue with fallback behavior."
            );
        } else {
            info!("Redis cache health check passed.");
        }
    }

    let db = Database::connect(&database_url, 5, cache).await?;

    if env_bool("AUTO_RUN_MIGRATIONS", true) {
        db.migrate().await?;
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    let config = guard_config_from_env();
    info!(
        structural_window_seconds = config.structural_window.as_secs(),
        spam_window_seconds = config.spam_window.as_secs(),
        spam_timeout_seconds = config.spam_timeout.as_secs(),
        sweep_interval_seconds = config.sweep_interval.as_secs(),
        policy_cache_seconds = db.cache().config_ttl().as_secs(),
        "Guard configured."
    );

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MODERATION
        | serenity::GatewayIntents::GUILD_EMOJIS_AND_STICKERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: bastion_commands::commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handle_event(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(bastion_utils::COMMAND_PREFIX.to_string()),
                mention_as_prefix: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let db = db.clone();
            Box::pin(async move {
                let guard = Guard::new(
                    config,
                    Arc::new(db.clone()),
                    Arc::new(SerenityAudit::new(ctx.http.clone())),
                    Arc::new(SerenityRemediator::new(ctx.http.clone())),
                )
                .ignoring_actor(ready.user.id.get());
                let guard = Arc::new(guard);
                guard.spawn_sweepers();

                info!(user_id = ready.user.id.get(), "Bastion is on watch.");

                poise::builtins::register_in_guild(
                    ctx,
                    &framework.options().commands,
                    serenity::GuildId::new(guild_id),
                )
                .await?;

                Ok(Data {
                    db,
                    guard,
                    inventory: Arc::new(AssetInventory::new()),
                })
            })
        })
        .build();

    info!("Bastion is connecting...");

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}

fn build_cache() -> CacheService {
    let redis_key_prefix =
        env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "bastion:prod".to_string());

    if !env_bool("REDIS_ENABLED", false) {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        return CacheService::disabled(redis_key_prefix);
    }

    let Ok(redis_url) = env::var("REDIS_URL") else {
        warn!(key_prefix = %redis_key_prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
        return CacheService::disabled(redis_key_prefix);
    };

    match CacheService::redis(&redis_url, redis_key_prefix.clone()) {
        Ok(cache) => {
            info!(key_prefix = %redis_key_prefix, "Redis cache enabled.");
            cache
        }
        Err(err) => {
            warn!(?err, key_prefix = %redis_key_prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
            CacheService::disabled(redis_key_prefix)
        }
    }
}

/// Longest timeout the platform accepts; also caps the counting windows.
const MAX_GUARD_DURATION: Duration = Duration::from_secs(28 * 24 * 60 * 60);

fn guard_config_from_env() -> GuardConfig {
    let defaults = GuardConfig::default();
    let seconds = |key: &str, default: Duration| clamp_guard_seconds(env_u64(key, default.as_secs()));

    GuardConfig {
        structural_window: seconds(
            "GUARD_STRUCTURAL_WINDOW_SECONDS",
            defaults.structural_window,
        ),
        spam_window: seconds("GUARD_SPAM_WINDOW_SECONDS", defaults.spam_window),
        spam_timeout: seconds("GUARD_SPAM_TIMEOUT_SECONDS", defaults.spam_timeout),
        sweep_interval: seconds("GUARD_SWEEP_INTERVAL_SECONDS", defaults.sweep_interval),
    }
}

fn clamp_guard_seconds(seconds: u64) -> Duration {
    Duration::from_secs(seconds.clamp(1, MAX_GUARD_DURATION.as_secs()))
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(?error, command = %ctx.command().qualified_name, "command error");

            let embed = serenity::CreateEmbed::new()
                .title("Command Error")
                .description("Something went wrong while running this command.")
                .color(bastion_utils::embed::DEFAULT_EMBED_COLOR);

            let _ = ctx
                .send(poise::CreateReply::default().ephemeral(true).embed(embed))
                .await;
        }
        poise::FrameworkError::ArgumentParse { ctx, input, .. } => {
            let usage = format!("Usage: `!{}`", ctx.command().qualified_name);
            let description = if let Some(input) = input {
                format!("Invalid argument: `{}`\n{}", input, usage)
            } else {
                format!("Missing required argument.\n{}", usage)
            };

            let _ = ctx.say(description).await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            debug!("unknown command invocation");
        }
        other => {
            error!(?other, "framework error");
        }
    }
}

async fn handle_event(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            events::content::handle_message(data, new_message).await;
        }
        serenity::FullEvent::GuildCreate { .. } | serenity::FullEvent::GuildDelete { .. } => {
            events::structural::track_guild_availability(data, event);
        }
        _ => {
            events::structural::handle_structural_event(data, event).await;
        }
    }

    Ok(())
}

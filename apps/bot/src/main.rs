//! Floodgate bot composition root.

#![forbid(unsafe_code)]

mod bot_config;
mod commands;
mod dispatch;
mod error;
mod handlers;
mod state;
mod telegram_update;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use chrono::Utc;
use floodgate_application::{ChatPlatform, ModerationService, SettingsService, StrikeRepository};
use floodgate_core::AppError;
use floodgate_infrastructure::{
    MIGRATOR, PostgresChatSettingsRepository, PostgresStrikeRepository, RedisStrikeRepository,
    TelegramChatPlatform,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::bot_config::{BotConfig, StrikeStoreConfig, init_tracing};
use crate::handlers::health::health_handler;
use crate::handlers::webhook::webhook_handler;
use crate::state::AppState;

const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = BotConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    let strike_repository: Arc<dyn StrikeRepository> = match &config.strike_store {
        StrikeStoreConfig::Postgres => Arc::new(PostgresStrikeRepository::new(pool.clone())),
        StrikeStoreConfig::Redis { url } => {
            let client = redis::Client::open(url.as_str()).map_err(|error| {
                AppError::Configuration(format!("invalid REDIS_URL: {error}"))
            })?;
            Arc::new(RedisStrikeRepository::new(client, "floodgate"))
        }
    };
    let settings_repository = Arc::new(PostgresChatSettingsRepository::new(pool));

    let telegram = Arc::new(TelegramChatPlatform::new(
        config.bot_token.as_str(),
        config.moderation.platform_timeout,
    )?);
    let platform: Arc<dyn ChatPlatform> = telegram.clone();

    let settings_service =
        SettingsService::new(settings_repository, config.settings_defaults.clone());
    let moderation_service = ModerationService::new(
        strike_repository,
        platform.clone(),
        settings_service.clone(),
        config.moderation.clone(),
    );

    telegram.set_webhook(config.webhook_url().as_str()).await?;
    info!(public_url = %config.public_url, "webhook registered");

    spawn_rate_eviction(moderation_service.clone());

    let state = AppState {
        moderation_service,
        settings_service,
        platform,
        admin_ids: Arc::new(config.admin_ids.clone()),
        bot_username: config.bot_username.as_deref().map(Arc::from),
        webhook_secret: Arc::from(config.webhook_secret.as_str()),
        platform_timeout: config.moderation.platform_timeout,
    };

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/webhook/{secret}", post(webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "floodgate bot listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}

fn spawn_rate_eviction(moderation_service: ModerationService) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            moderation_service.evict_idle(Utc::now());
        }
    });
}

//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_chat_settings_repository;
mod in_memory_strike_repository;
mod postgres_chat_settings_repository;
mod postgres_strike_repository;
mod redis_strike_repository;
mod telegram_chat_platform;

pub use in_memory_chat_settings_repository::InMemoryChatSettingsRepository;
pub use in_memory_strike_repository::InMemoryStrikeRepository;
pub use postgres_chat_settings_repository::PostgresChatSettingsRepository;
pub use postgres_strike_repository::PostgresStrikeRepository;
pub use redis_strike_repository::RedisStrikeRepository;
pub use telegram_chat_platform::TelegramChatPlatform;

/// Embedded SQL migrations for the PostgreSQL adapters.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

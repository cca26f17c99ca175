//! Redis-backed strike counters.

use async_trait::async_trait;
use floodgate_application::StrikeRepository;
use floodgate_core::{AppError, AppResult, MemberKey};
use redis::AsyncCommands;

/// Redis implementation of the strike repository port.
///
/// `INCR` is atomic on the server. Durability follows the Redis persistence
/// configuration (AOF or RDB must be enabled).
#[derive(Clone)]
pub struct RedisStrikeRepository {
    client: redis::Client,
    key_prefix: String,
}

impl RedisStrikeRepository {
    /// Creates a repository with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, member: MemberKey) -> String {
        format!(
            "{}:strikes:{}:{}",
            self.key_prefix, member.chat_id, member.user_id
        )
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Store(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl StrikeRepository for RedisStrikeRepository {
    async fn increment(&self, member: MemberKey) -> AppResult<u32> {
        let mut connection = self.connection().await?;
        let count: i64 = connection
            .incr(self.key_for(member), 1)
            .await
            .map_err(|error| AppError::Store(format!("failed to increment strikes: {error}")))?;

        to_count(count)
    }

    async fn get(&self, member: MemberKey) -> AppResult<u32> {
        let mut connection = self.connection().await?;
        let count: Option<i64> = connection
            .get(self.key_for(member))
            .await
            .map_err(|error| AppError::Store(format!("failed to read strikes: {error}")))?;

        count.map_or(Ok(0), to_count)
    }

    async fn reset(&self, member: MemberKey) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let _removed: i64 = connection
            .del(self.key_for(member))
            .await
            .map_err(|error| AppError::Store(format!("failed to reset strikes: {error}")))?;

        Ok(())
    }
}

fn to_count(value: i64) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|error| AppError::Store(format!("invalid stored strike count {value}: {error}")))
}

//! PostgreSQL-backed strike counters using the `member_strikes` table.

use async_trait::async_trait;
use sqlx::PgPool;

use floodgate_application::StrikeRepository;
use floodgate_core::{AppError, AppResult, MemberKey};

/// PostgreSQL implementation of the strike repository port.
#[derive(Clone)]
pub struct PostgresStrikeRepository {
    pool: PgPool,
}

impl PostgresStrikeRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StrikeRepository for PostgresStrikeRepository {
    async fn increment(&self, member: MemberKey) -> AppResult<u32> {
        // The upsert takes a row lock, so concurrent increments serialize.
        let count = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO member_strikes (chat_id, user_id, strike_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (chat_id, user_id) DO UPDATE
            SET
                strike_count = member_strikes.strike_count + 1,
                updated_at = now()
            RETURNING strike_count
            "#,
        )
        .bind(member.chat_id.as_i64())
        .bind(member.user_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Store(format!("failed to increment strikes: {error}")))?;

        to_count(count)
    }

    async fn get(&self, member: MemberKey) -> AppResult<u32> {
        let count = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT strike_count
            FROM member_strikes
            WHERE chat_id = $1 AND user_id = $2
            "#,
        )
        .bind(member.chat_id.as_i64())
        .bind(member.user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Store(format!("failed to read strikes: {error}")))?;

        count.map_or(Ok(0), to_count)
    }

    async fn reset(&self, member: MemberKey) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE member_strikes
            SET strike_count = 0, updated_at = now()
            WHERE chat_id = $1 AND user_id = $2
            "#,
        )
        .bind(member.chat_id.as_i64())
        .bind(member.user_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Store(format!("failed to reset strikes: {error}")))?;

        Ok(())
    }
}

fn to_count(value: i32) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|error| AppError::Store(format!("invalid stored strike count {value}: {error}")))
}

//! PostgreSQL-backed chat settings using the `chat_settings` table.

use async_trait::async_trait;
use sqlx::PgPool;

use floodgate_application::ChatSettingsRepository;
use floodgate_core::{AppError, AppResult, ChatId, NonEmptyString};
use floodgate_domain::ChatSettings;

/// PostgreSQL implementation of the chat settings repository port.
#[derive(Clone)]
pub struct PostgresChatSettingsRepository {
    pool: PgPool,
}

impl PostgresChatSettingsRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatSettingsRepository for PostgresChatSettingsRepository {
    async fn get_settings(&self, chat_id: ChatId) -> AppResult<ChatSettings> {
        let row = sqlx::query_as::<_, ChatSettingsRow>(
            r#"
            SELECT welcome_text, rules_text
            FROM chat_settings
            WHERE chat_id = $1
            "#,
        )
        .bind(chat_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Store(format!("failed to read chat settings: {error}")))?;

        Ok(row.map(ChatSettingsRow::into_settings).unwrap_or_default())
    }

    async fn set_welcome(&self, chat_id: ChatId, text: NonEmptyString) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_settings (chat_id, welcome_text)
            VALUES ($1, $2)
            ON CONFLICT (chat_id) DO UPDATE
            SET welcome_text = EXCLUDED.welcome_text, updated_at = now()
            "#,
        )
        .bind(chat_id.as_i64())
        .bind(text.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Store(format!("failed to save welcome text: {error}")))?;

        Ok(())
    }

    async fn set_rules(&self, chat_id: ChatId, text: NonEmptyString) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_settings (chat_id, rules_text)
            VALUES ($1, $2)
            ON CONFLICT (chat_id) DO UPDATE
            SET rules_text = EXCLUDED.rules_text, updated_at = now()
            "#,
        )
        .bind(chat_id.as_i64())
        .bind(text.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Store(format!("failed to save rules text: {error}")))?;

        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChatSettingsRow {
    welcome_text: Option<String>,
    rules_text: Option<String>,
}

impl ChatSettingsRow {
    // Blank values written outside the bot count as unset.
    fn into_settings(self) -> ChatSettings {
        ChatSettings {
            welcome_text: self.welcome_text.and_then(|text| NonEmptyString::new(text).ok()),
            rules_text: self.rules_text.and_then(|text| NonEmptyString::new(text).ok()),
        }
    }
}

use async_trait::async_trait;

use floodgate_core::{AppResult, ChatId, MemberKey, NonEmptyString};
use floodgate_domain::ChatSettings;

/// Repository port for durable strike counters.
#[async_trait]
pub trait StrikeRepository: Send + Sync {
    /// Atomically adds one strike and returns the new count.
    ///
    /// Concurrent calls for the same member must each be applied exactly once.
    async fn increment(&self, member: MemberKey) -> AppResult<u32>;

    /// Returns the current count, zero when the member has no record.
    ///
    /// Read failures are errors and must never be reported as zero.
    async fn get(&self, member: MemberKey) -> AppResult<u32>;

    /// Sets the count to zero. Succeeds when no record exists.
    async fn reset(&self, member: MemberKey) -> AppResult<()>;
}

/// Repository port for per-chat welcome and rules overrides.
#[async_trait]
pub trait ChatSettingsRepository: Send + Sync {
    /// Returns the stored overrides, empty when the chat has none.
    async fn get_settings(&self, chat_id: ChatId) -> AppResult<ChatSettings>;

    /// Stores the welcome text override.
    async fn set_welcome(&self, chat_id: ChatId, text: NonEmptyString) -> AppResult<()>;

    /// Stores the rules text override.
    async fn set_rules(&self, chat_id: ChatId, text: NonEmptyString) -> AppResult<()>;
}

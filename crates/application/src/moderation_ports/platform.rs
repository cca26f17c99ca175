use async_trait::async_trait;
use chrono::{DateTime, Utc};

use floodgate_core::{AppResult, ChatId, MemberKey};
use floodgate_domain::{MemberPermissions, MemberRole};

/// Chat platform capabilities the moderation engine depends on.
///
/// Every call is treated as fallible and may suspend; callers bound each one
/// with a timeout.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Posts a message to the chat.
    async fn send_reply(&self, chat_id: ChatId, text: &str) -> AppResult<()>;

    /// Replaces a member's permissions, optionally until a point in time.
    ///
    /// `until` of `None` applies the restriction indefinitely.
    async fn restrict_member(
        &self,
        member: MemberKey,
        permissions: MemberPermissions,
        until: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    /// Removes a member from the chat.
    async fn remove_member(&self, member: MemberKey) -> AppResult<()>;

    /// Looks up a member's role in the chat.
    async fn get_member_status(&self, member: MemberKey) -> AppResult<MemberRole>;
}

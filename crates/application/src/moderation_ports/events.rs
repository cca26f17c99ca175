use chrono::{DateTime, Utc};
use floodgate_core::{ChatId, MemberKey, UserId};

/// Inbound chat message handed to the moderation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// Chat the message was posted in.
    pub chat_id: ChatId,
    /// Author of the message.
    pub user_id: UserId,
    /// Message text, or the caption of a media message.
    pub text: String,
    /// Arrival time supplied by the caller.
    pub timestamp: DateTime<Utc>,
}

impl MessageEvent {
    /// Returns the (chat, user) key of the author.
    #[must_use]
    pub fn member_key(&self) -> MemberKey {
        MemberKey::new(self.chat_id, self.user_id)
    }
}

/// A user who just joined a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    /// Joining user.
    pub user_id: UserId,
    /// Name used in the greeting.
    pub display_name: String,
    /// Bot accounts are not greeted.
    pub is_bot: bool,
}

/// One or more users joined a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemberEvent {
    /// Chat that was joined.
    pub chat_id: ChatId,
    /// Users who joined.
    pub members: Vec<NewMember>,
}

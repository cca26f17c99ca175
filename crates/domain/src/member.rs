//! Chat membership roles and permissions.

use std::str::FromStr;

use floodgate_core::AppError;
use serde::{Deserialize, Serialize};

/// A member's role inside a chat, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Owner of the chat.
    Creator,
    /// Chat administrator.
    Administrator,
    /// Regular member.
    Member,
    /// Member with reduced permissions.
    Restricted,
    /// No longer in the chat.
    Left,
    /// Removed and banned from the chat.
    Banned,
}

impl MemberRole {
    /// Returns true for roles that bypass all moderation checks.
    #[must_use]
    pub fn is_exempt(&self) -> bool {
        matches!(self, Self::Creator | Self::Administrator)
    }

    /// Returns the platform status label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Administrator => "administrator",
            Self::Member => "member",
            Self::Restricted => "restricted",
            Self::Left => "left",
            Self::Banned => "kicked",
        }
    }
}

impl FromStr for MemberRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "creator" | "owner" => Ok(Self::Creator),
            "administrator" => Ok(Self::Administrator),
            "member" => Ok(Self::Member),
            "restricted" => Ok(Self::Restricted),
            "left" => Ok(Self::Left),
            "kicked" | "banned" => Ok(Self::Banned),
            other => Err(AppError::Platform(format!(
                "unknown chat member status '{other}'"
            ))),
        }
    }
}

/// What a member may do in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberPermissions {
    /// Send text messages.
    pub can_send_messages: bool,
    /// Send photos, videos, audio and documents.
    pub can_send_media_messages: bool,
    /// Send polls.
    pub can_send_polls: bool,
    /// Send stickers, animations and games.
    pub can_send_other_messages: bool,
    /// Attach link previews.
    pub can_add_web_page_previews: bool,
    /// Change chat title, photo and description.
    pub can_change_info: bool,
    /// Invite new users.
    pub can_invite_users: bool,
    /// Pin messages.
    pub can_pin_messages: bool,
}

impl MemberPermissions {
    /// Permission set applied by a mute: nothing may be sent.
    #[must_use]
    pub const fn muted() -> Self {
        Self {
            can_send_messages: false,
            can_send_media_messages: false,
            can_send_polls: false,
            can_send_other_messages: false,
            can_add_web_page_previews: false,
            can_change_info: false,
            can_invite_users: false,
            can_pin_messages: false,
        }
    }

    /// Permission set restored when a restriction is lifted.
    #[must_use]
    pub const fn member_defaults() -> Self {
        Self {
            can_send_messages: true,
            can_send_media_messages: true,
            can_send_polls: true,
            can_send_other_messages: true,
            can_add_web_page_previews: true,
            can_change_info: false,
            can_invite_users: true,
            can_pin_messages: false,
        }
    }
}

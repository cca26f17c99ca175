//! Telegram Bot API implementation of the chat platform port.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use floodgate_application::ChatPlatform;
use floodgate_core::{AppError, AppResult, ChatId, MemberKey};
use floodgate_domain::{MemberPermissions, MemberRole};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// HTTP client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramChatPlatform {
    http_client: reqwest::Client,
    api_base_url: String,
    token: String,
}

impl TelegramChatPlatform {
    /// Creates a client for the given bot token.
    ///
    /// `request_timeout` bounds each HTTP request on top of the caller's own
    /// timeout.
    pub fn new(token: impl Into<String>, request_timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|error| {
                AppError::Configuration(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            token: token.into(),
        })
    }

    /// Points the client at another Bot API server, such as a local one.
    #[must_use]
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Registers the webhook URL that receives updates, dropping pending ones.
    pub async fn set_webhook(&self, url: &str) -> AppResult<()> {
        let _: bool = self
            .call(
                "setWebhook",
                &SetWebhookRequest {
                    url,
                    drop_pending_updates: true,
                },
            )
            .await?;
        Ok(())
    }

    async fn call<T, B>(&self, method: &str, body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        // The token is part of the path; never log the full URL.
        let endpoint = format!("{}/bot{}/{method}", self.api_base_url, self.token);
        let response = self
            .http_client
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|error| {
                AppError::Platform(format!(
                    "telegram {method} transport error: {}",
                    error.without_url()
                ))
            })?;

        let status = response.status();
        let payload = response.json::<ApiResponse<T>>().await.map_err(|error| {
            AppError::Platform(format!(
                "telegram {method} returned unreadable body (status {}): {}",
                status.as_u16(),
                error.without_url()
            ))
        })?;

        debug!(method, status = status.as_u16(), ok = payload.ok, "telegram call finished");
        payload.into_result(method)
    }
}

#[async_trait]
impl ChatPlatform for TelegramChatPlatform {
    async fn send_reply(&self, chat_id: ChatId, text: &str) -> AppResult<()> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessageRequest {
                    chat_id: chat_id.as_i64(),
                    text,
                },
            )
            .await?;
        Ok(())
    }

    async fn restrict_member(
        &self,
        member: MemberKey,
        permissions: MemberPermissions,
        until: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let _: bool = self
            .call(
                "restrictChatMember",
                &RestrictChatMemberRequest {
                    chat_id: member.chat_id.as_i64(),
                    user_id: member.user_id.as_i64(),
                    permissions: ChatPermissions::from(permissions),
                    use_independent_chat_permissions: true,
                    until_date: until.map(|until| until.timestamp()),
                },
            )
            .await?;
        Ok(())
    }

    async fn remove_member(&self, member: MemberKey) -> AppResult<()> {
        let _: bool = self
            .call(
                "banChatMember",
                &MemberRequest {
                    chat_id: member.chat_id.as_i64(),
                    user_id: member.user_id.as_i64(),
                },
            )
            .await?;
        Ok(())
    }

    async fn get_member_status(&self, member: MemberKey) -> AppResult<MemberRole> {
        let chat_member: ChatMemberResponse = self
            .call(
                "getChatMember",
                &MemberRequest {
                    chat_id: member.chat_id.as_i64(),
                    user_id: member.user_id.as_i64(),
                },
            )
            .await?;

        chat_member.status.parse()
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> AppResult<T> {
        if !self.ok {
            return Err(AppError::Platform(format!(
                "telegram {method} failed ({}): {}",
                self.error_code
                    .map_or_else(|| "no code".to_owned(), |code| code.to_string()),
                self.description
                    .unwrap_or_else(|| "no description".to_owned())
            )));
        }

        self.result.ok_or_else(|| {
            AppError::Platform(format!("telegram {method} succeeded without a result"))
        })
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SetWebhookRequest<'a> {
    url: &'a str,
    drop_pending_updates: bool,
}

#[derive(Debug, Serialize)]
struct MemberRequest {
    chat_id: i64,
    user_id: i64,
}

#[derive(Debug, Serialize)]
struct RestrictChatMemberRequest {
    chat_id: i64,
    user_id: i64,
    permissions: ChatPermissions,
    use_independent_chat_permissions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    until_date: Option<i64>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct ChatPermissions {
    can_send_messages: bool,
    can_send_audios: bool,
    can_send_documents: bool,
    can_send_photos: bool,
    can_send_videos: bool,
    can_send_video_notes: bool,
    can_send_voice_notes: bool,
    can_send_polls: bool,
    can_send_other_messages: bool,
    can_add_web_page_previews: bool,
    can_change_info: bool,
    can_invite_users: bool,
    can_pin_messages: bool,
}

impl From<MemberPermissions> for ChatPermissions {
    fn from(value: MemberPermissions) -> Self {
        let media = value.can_send_media_messages;
        Self {
            can_send_messages: value.can_send_messages,
            can_send_audios: media,
            can_send_documents: media,
            can_send_photos: media,
            can_send_videos: media,
            can_send_video_notes: media,
            can_send_voice_notes: media,
            can_send_polls: value.can_send_polls,
            can_send_other_messages: value.can_send_other_messages,
            can_add_web_page_previews: value.can_add_web_page_previews,
            can_change_info: value.can_change_info,
            can_invite_users: value.can_invite_users,
            can_pin_messages: value.can_pin_messages,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatMemberResponse {
    status: String,
}

#[cfg(test)]
mod tests {
    use floodgate_core::AppError;
    use floodgate_domain::{MemberPermissions, MemberRole};
    use serde_json::json;

    use super::{ApiResponse, ChatMemberResponse, ChatPermissions, RestrictChatMemberRequest};

    #[test]
    fn error_response_becomes_platform_error() {
        let response: ApiResponse<bool> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: not enough rights to restrict/unrestrict chat member"
        }))
        .unwrap_or_else(|_| unreachable!());

        let result = response.into_result("restrictChatMember");
        let Err(AppError::Platform(message)) = result else {
            unreachable!();
        };
        assert!(message.contains("400"));
        assert!(message.contains("not enough rights"));
    }

    #[test]
    fn member_status_parses_into_role() {
        let response: ApiResponse<ChatMemberResponse> = serde_json::from_value(json!({
            "ok": true,
            "result": { "status": "administrator", "user": { "id": 1, "is_bot": false } }
        }))
        .unwrap_or_else(|_| unreachable!());

        let member = response
            .into_result("getChatMember")
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(member.status.parse::<MemberRole>().ok(), Some(MemberRole::Administrator));
    }

    #[test]
    fn mute_request_revokes_every_send_permission() {
        let permissions = ChatPermissions::from(MemberPermissions::muted());
        assert!(!permissions.can_send_messages);
        assert!(!permissions.can_send_photos);
        assert!(!permissions.can_send_voice_notes);

        let request = RestrictChatMemberRequest {
            chat_id: -100,
            user_id: 5,
            permissions,
            use_independent_chat_permissions: true,
            until_date: None,
        };
        let body = serde_json::to_value(&request).unwrap_or_default();
        assert!(body.get("until_date").is_none());
        assert_eq!(body["permissions"]["can_send_messages"], json!(false));
    }
}

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use floodgate_application::{
    ChatPlatform, ModerationConfig, ModerationService, SettingsService, StrikeRepository,
};
use floodgate_core::{AppError, AppResult, ChatId, MemberKey};
use floodgate_domain::{FloodPolicy, MemberPermissions, MemberRole, SettingsDefaults};
use floodgate_infrastructure::{InMemoryChatSettingsRepository, InMemoryStrikeRepository};
use serde_json::json;

use super::dispatch_update;
use crate::state::AppState;
use crate::telegram_update::Update;

const CHAT: i64 = -100_900;
const SENDER: i64 = 3_003;

#[derive(Default)]
struct SlowLookupPlatform {
    replies: Mutex<Vec<String>>,
    status_delays: Mutex<VecDeque<Duration>>,
}

impl SlowLookupPlatform {
    fn replies(&self) -> Vec<String> {
        self.replies
            .lock()
            .map(|replies| replies.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatPlatform for SlowLookupPlatform {
    async fn send_reply(&self, _chat_id: ChatId, text: &str) -> AppResult<()> {
        self.replies
            .lock()
            .map_err(|error| AppError::Internal(format!("replies lock poisoned: {error}")))?
            .push(text.to_owned());
        Ok(())
    }

    async fn restrict_member(
        &self,
        _member: MemberKey,
        _permissions: MemberPermissions,
        _until: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn remove_member(&self, _member: MemberKey) -> AppResult<()> {
        Ok(())
    }

    async fn get_member_status(&self, _member: MemberKey) -> AppResult<MemberRole> {
        let delay = self
            .status_delays
            .lock()
            .map_err(|error| AppError::Internal(format!("delays lock poisoned: {error}")))?
            .pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(MemberRole::Member)
    }
}

fn state(platform: Arc<SlowLookupPlatform>) -> AppState {
    let strikes: Arc<dyn StrikeRepository> = Arc::new(InMemoryStrikeRepository::new());
    let chat_platform: Arc<dyn ChatPlatform> = platform;
    let settings_service = SettingsService::new(
        Arc::new(InMemoryChatSettingsRepository::new()),
        SettingsDefaults::default(),
    );
    // One message per window is allowed, so the second message is a flood
    // only when it is processed after the first.
    let moderation = ModerationConfig {
        flood_policy: FloodPolicy::new(60, 1, 3).unwrap_or_else(|_| unreachable!()),
        platform_timeout: Duration::from_millis(500),
        ..ModerationConfig::default()
    };

    AppState {
        moderation_service: ModerationService::new(
            strikes,
            chat_platform.clone(),
            settings_service.clone(),
            moderation,
        ),
        settings_service,
        platform: chat_platform,
        admin_ids: Arc::new(HashSet::new()),
        bot_username: None,
        webhook_secret: Arc::from("secret"),
        platform_timeout: Duration::from_millis(500),
    }
}

fn text_update(update_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id,
            "chat": { "id": CHAT },
            "from": { "id": SENDER, "is_bot": false, "first_name": "Eve" },
            "text": text,
        }
    }))
    .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn spawned_updates_of_one_member_keep_arrival_order() {
    let platform = Arc::new(SlowLookupPlatform {
        status_delays: Mutex::new(VecDeque::from([Duration::from_millis(100)])),
        ..SlowLookupPlatform::default()
    });
    let state = state(platform.clone());

    let first = tokio::spawn(dispatch_update(
        state.clone(),
        text_update(1, "join https://evil.com"),
    ));
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = tokio::spawn(dispatch_update(state, text_update(2, "anyone here?")));

    assert!(first.await.is_ok());
    assert!(second.await.is_ok());

    let replies = platform.replies();
    assert_eq!(replies.len(), 2);
    assert!(replies[0].starts_with("⚠️ Warning"));
    assert!(replies[0].contains("Link spam"));
    assert!(replies[1].starts_with("🔇"));
    assert!(replies[1].contains("Flood"));
}

#[tokio::test]
async fn updates_without_messages_are_ignored() {
    let platform = Arc::new(SlowLookupPlatform::default());
    let update: Update =
        serde_json::from_value(json!({ "update_id": 9 })).unwrap_or_else(|_| unreachable!());

    dispatch_update(state(platform.clone()), update).await;

    assert!(platform.replies().is_empty());
}

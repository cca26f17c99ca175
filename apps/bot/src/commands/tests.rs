use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use floodgate_application::{
    ChatPlatform, ModerationConfig, ModerationService, SettingsService, StrikeRepository,
};
use floodgate_core::{AppError, AppResult, ChatId, MemberKey, UserId};
use floodgate_domain::{MemberPermissions, MemberRole, SettingsDefaults};
use floodgate_infrastructure::{InMemoryChatSettingsRepository, InMemoryStrikeRepository};

use super::{BotCommand, CommandContext, MemberCommand, execute_command};
use crate::state::AppState;

const CHAT: ChatId = ChatId::new(-100_777);
const OWNER: UserId = UserId::new(1_001);
const MEMBER: UserId = UserId::new(2_002);

#[derive(Default)]
struct RecordingPlatform {
    replies: Mutex<Vec<String>>,
    restricted: Mutex<Vec<(MemberKey, MemberPermissions)>>,
    fail_removal: bool,
}

impl RecordingPlatform {
    fn replies(&self) -> Vec<String> {
        self.replies
            .lock()
            .map(|replies| replies.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn send_reply(&self, _chat_id: ChatId, text: &str) -> AppResult<()> {
        self.replies
            .lock()
            .map_err(|error| AppError::Internal(format!("replies lock poisoned: {error}")))?
            .push(text.to_owned());
        Ok(())
    }

    async fn restrict_member(
        &self,
        member: MemberKey,
        permissions: MemberPermissions,
        _until: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        self.restricted
            .lock()
            .map_err(|error| AppError::Internal(format!("restricted lock poisoned: {error}")))?
            .push((member, permissions));
        Ok(())
    }

    async fn remove_member(&self, _member: MemberKey) -> AppResult<()> {
        if self.fail_removal {
            return Err(AppError::Platform(
                "Bad Request: not enough rights".to_owned(),
            ));
        }
        Ok(())
    }

    async fn get_member_status(&self, _member: MemberKey) -> AppResult<MemberRole> {
        Ok(MemberRole::Member)
    }
}

struct Harness {
    state: AppState,
    platform: Arc<RecordingPlatform>,
    strikes: Arc<InMemoryStrikeRepository>,
}

fn harness(platform: RecordingPlatform) -> Harness {
    let platform = Arc::new(platform);
    let strikes = Arc::new(InMemoryStrikeRepository::new());
    let strike_repository: Arc<dyn StrikeRepository> = strikes.clone();
    let chat_platform: Arc<dyn ChatPlatform> = platform.clone();

    let settings_service = SettingsService::new(
        Arc::new(InMemoryChatSettingsRepository::new()),
        SettingsDefaults::default(),
    );
    let moderation_service = ModerationService::new(
        strike_repository,
        chat_platform.clone(),
        settings_service.clone(),
        ModerationConfig::default(),
    );

    Harness {
        state: AppState {
            moderation_service,
            settings_service,
            platform: chat_platform,
            admin_ids: Arc::new(HashSet::from([OWNER])),
            bot_username: Some(Arc::from("floodgate_bot")),
            webhook_secret: Arc::from("secret"),
            platform_timeout: Duration::from_millis(200),
        },
        platform,
        strikes,
    }
}

fn context(sender: UserId, reply_target: Option<UserId>) -> CommandContext {
    CommandContext {
        chat_id: CHAT,
        sender: Some(sender),
        reply_target,
    }
}

#[test]
fn parse_reads_name_mention_and_arguments() {
    assert_eq!(
        BotCommand::parse("/setrules@floodgate_bot  Be kind.\nNo ads.", Some("floodgate_bot")),
        Some(BotCommand::SetRules("Be kind.\nNo ads.".to_owned()))
    );
    assert_eq!(
        BotCommand::parse("/BAN", None),
        Some(BotCommand::Member(MemberCommand::Ban))
    );
    assert_eq!(BotCommand::parse("/setwelcome", None), Some(BotCommand::SetWelcome(String::new())));
}

#[test]
fn parse_rejects_plain_text_unknown_and_foreign_commands() {
    assert_eq!(BotCommand::parse("hello /help", None), None);
    assert_eq!(BotCommand::parse("/shrug", None), None);
    assert_eq!(BotCommand::parse("/help@other_bot", Some("floodgate_bot")), None);
}

#[tokio::test]
async fn admin_commands_from_non_owners_are_ignored() {
    let harness = harness(RecordingPlatform::default());

    let result = execute_command(
        &harness.state,
        context(MEMBER, Some(OWNER)),
        BotCommand::Member(MemberCommand::Ban),
    )
    .await;

    assert!(result.is_ok());
    assert!(harness.platform.replies().is_empty());
}

#[tokio::test]
async fn rules_are_public_and_reflect_updates() {
    let harness = harness(RecordingPlatform::default());

    let set = execute_command(
        &harness.state,
        context(OWNER, None),
        BotCommand::SetRules("Be kind.".to_owned()),
    )
    .await;
    assert!(set.is_ok());

    let read = execute_command(&harness.state, context(MEMBER, None), BotCommand::Rules).await;
    assert!(read.is_ok());

    assert_eq!(
        harness.platform.replies(),
        vec!["✅ Rules updated.".to_owned(), "Be kind.".to_owned()]
    );
}

#[tokio::test]
async fn blank_settings_text_gets_usage_reply() {
    let harness = harness(RecordingPlatform::default());

    let result = execute_command(
        &harness.state,
        context(OWNER, None),
        BotCommand::SetWelcome("   ".to_owned()),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        harness.platform.replies(),
        vec!["Usage: /setwelcome <welcome text>".to_owned()]
    );
}

#[tokio::test]
async fn member_commands_need_a_reply_target() {
    let harness = harness(RecordingPlatform::default());

    let result = execute_command(
        &harness.state,
        context(OWNER, None),
        BotCommand::Member(MemberCommand::Status),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(
        harness.platform.replies(),
        vec!["Reply to a user's message with /status".to_owned()]
    );
}

#[tokio::test]
async fn status_and_forgive_report_strikes() {
    let harness = harness(RecordingPlatform::default());
    let member = MemberKey::new(CHAT, MEMBER);
    for _ in 0..2 {
        assert!(harness.strikes.increment(member).await.is_ok());
    }

    let status = BotCommand::Member(MemberCommand::Status);
    assert!(
        execute_command(&harness.state, context(OWNER, Some(MEMBER)), status.clone())
            .await
            .is_ok()
    );
    assert!(
        execute_command(
            &harness.state,
            context(OWNER, Some(MEMBER)),
            BotCommand::Member(MemberCommand::Forgive),
        )
        .await
        .is_ok()
    );
    assert!(
        execute_command(&harness.state, context(OWNER, Some(MEMBER)), status)
            .await
            .is_ok()
    );

    assert_eq!(
        harness.platform.replies(),
        vec![
            "👤 User: 2002\nStrikes: 2".to_owned(),
            "✅ Strikes reset (forgiven).".to_owned(),
            "👤 User: 2002\nStrikes: 0".to_owned(),
        ]
    );
}

#[tokio::test]
async fn unrestrict_restores_member_defaults() {
    let harness = harness(RecordingPlatform::default());

    let result = execute_command(
        &harness.state,
        context(OWNER, Some(MEMBER)),
        BotCommand::Member(MemberCommand::Unrestrict),
    )
    .await;

    assert!(result.is_ok());
    let restricted = harness
        .platform
        .restricted
        .lock()
        .map(|calls| calls.clone())
        .unwrap_or_default();
    assert_eq!(
        restricted,
        vec![(
            MemberKey::new(CHAT, MEMBER),
            MemberPermissions::member_defaults()
        )]
    );
    assert_eq!(
        harness.platform.replies(),
        vec!["✅ User unmuted/unrestricted.".to_owned()]
    );
}

#[tokio::test]
async fn failed_ban_is_reported_to_the_chat() {
    let harness = harness(RecordingPlatform {
        fail_removal: true,
        ..RecordingPlatform::default()
    });

    let result = execute_command(
        &harness.state,
        context(OWNER, Some(MEMBER)),
        BotCommand::Member(MemberCommand::Ban),
    )
    .await;

    assert!(result.is_ok());
    let replies = harness.platform.replies();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("❌ Failed: "));
    assert!(replies[0].contains("not enough rights"));
}

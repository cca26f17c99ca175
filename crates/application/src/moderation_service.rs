mod config;
mod enforcement;
mod overrides;
mod welcome;


use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use floodgate_core::{AppError, AppResult, MemberKey};
use floodgate_domain::{PunishmentAction, ViolationReason};
use tracing::{debug, warn};

use crate::{
    ChatPlatform, MemberLocks, MemberTurn, MessageEvent, RateTracker, SettingsService,
    StrikeRepository,
};

pub use config::ModerationConfig;

/// A detected violation and the punishment chosen for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    /// Why the message was treated as abuse.
    pub reason: ViolationReason,
    /// Strike count after this violation was recorded.
    pub strikes: u32,
    /// Action chosen for that strike count.
    pub action: PunishmentAction,
}

/// Result of moderating one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// Nothing to do: clean message or exempt author.
    None,
    /// Author was warned.
    Warned(Violation),
    /// Author was muted.
    Muted(Violation),
    /// Author was removed from the chat.
    Banned(Violation),
    /// The strike was recorded but enforcement failed.
    Error {
        /// Violation whose enforcement failed.
        violation: Violation,
        /// Platform error description.
        message: String,
    },
}

/// Application service deciding and enforcing moderation for chat events.
#[derive(Clone)]
pub struct ModerationService {
    strikes: Arc<dyn StrikeRepository>,
    platform: Arc<dyn ChatPlatform>,
    settings: SettingsService,
    rate_tracker: Arc<RateTracker>,
    locks: Arc<MemberLocks>,
    config: Arc<ModerationConfig>,
}

impl ModerationService {
    /// Creates a moderation service.
    #[must_use]
    pub fn new(
        strikes: Arc<dyn StrikeRepository>,
        platform: Arc<dyn ChatPlatform>,
        settings: SettingsService,
        config: ModerationConfig,
    ) -> Self {
        Self {
            strikes,
            platform,
            settings,
            rate_tracker: Arc::new(RateTracker::new(config.flood_policy)),
            locks: Arc::new(MemberLocks::new()),
            config: Arc::new(config),
        }
    }

    /// Moderates one inbound message.
    ///
    /// Admins and creators are exempt. Otherwise the rate tracker runs first
    /// and the link classifier second; the first match is punished.
    ///
    /// The member's turn is reserved when this is called, before the returned
    /// future is polled. Events of one member are therefore processed one at a
    /// time in the order `on_message` was called, even when the returned
    /// futures are spawned and scheduled in another order.
    ///
    /// Strike store failures are returned as errors. Platform failures during
    /// enforcement are reported through [`ModerationOutcome::Error`].
    pub fn on_message(
        &self,
        event: MessageEvent,
    ) -> impl Future<Output = AppResult<ModerationOutcome>> + Send + use<> {
        let turn = (!event.text.trim().is_empty())
            .then(|| self.locks.reserve(event.member_key()));
        let service = self.clone();

        async move {
            let Some(turn) = turn else {
                return Ok(ModerationOutcome::None);
            };
            service.moderate(turn, event).await
        }
    }

    /// Drops rate state of members idle longer than the configured period.
    ///
    /// Returns the number of evicted windows.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let evicted = self
            .rate_tracker
            .evict_idle(now, self.config.idle_eviction);
        debug!(
            evicted_windows = evicted,
            queued_members = self.locks.len(),
            tracked_members = self.rate_tracker.tracked_members(),
            "rate state eviction finished"
        );
        evicted
    }

    async fn moderate(
        &self,
        turn: MemberTurn,
        event: MessageEvent,
    ) -> AppResult<ModerationOutcome> {
        let _guard = turn.wait().await;

        let member = event.member_key();
        if self.is_exempt(member).await {
            debug!(chat_id = %member.chat_id, user_id = %member.user_id, "exempt member skipped");
            return Ok(ModerationOutcome::None);
        }

        let Some(reason) = self.detect(&event) else {
            return Ok(ModerationOutcome::None);
        };

        self.punish(member, reason, event.timestamp).await
    }

    fn detect(&self, event: &MessageEvent) -> Option<ViolationReason> {
        if let Some(kind) =
            self.rate_tracker
                .evaluate(event.member_key(), event.text.as_str(), event.timestamp)
        {
            return Some(ViolationReason::from(kind));
        }

        self.config
            .link_classifier
            .is_disallowed_link(event.text.as_str())
            .then_some(ViolationReason::LinkSpam)
    }

    async fn is_exempt(&self, member: MemberKey) -> bool {
        match self
            .call_platform("get_member_status", self.platform.get_member_status(member))
            .await
        {
            Ok(role) => role.is_exempt(),
            Err(error) => {
                warn!(
                    chat_id = %member.chat_id,
                    user_id = %member.user_id,
                    error = %error,
                    "member status lookup failed, moderating as regular member"
                );
                false
            }
        }
    }

    async fn call_platform<T, F>(&self, operation: &str, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        let timeout = self.config.platform_timeout;
        tokio::time::timeout(timeout, call).await.map_err(|_| {
            AppError::Platform(format!(
                "{operation} timed out after {}ms",
                timeout.as_millis()
            ))
        })?
    }
}

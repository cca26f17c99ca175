use chrono::{DateTime, Utc};
use floodgate_core::{AppError, AppResult, ChatId, MemberKey};
use floodgate_domain::{MemberPermissions, PunishmentAction, ViolationReason};
use tracing::{info, warn};

use super::{ModerationOutcome, ModerationService, Violation};

impl ModerationService {
    /// Records a strike and applies the punishment for the new count.
    ///
    /// The increment is never rolled back, even when enforcement fails.
    pub(super) async fn punish(
        &self,
        member: MemberKey,
        reason: ViolationReason,
        now: DateTime<Utc>,
    ) -> AppResult<ModerationOutcome> {
        let strikes = self.strikes.increment(member).await?;
        let action = self.config.escalation.action_for(strikes).ok_or_else(|| {
            AppError::Internal(format!("no escalation band covers {strikes} strikes"))
        })?;
        let violation = Violation {
            reason,
            strikes,
            action,
        };

        match self.enforce(member, action, now).await {
            Ok(()) => {
                info!(
                    chat_id = %member.chat_id,
                    user_id = %member.user_id,
                    reason = reason.description(),
                    strikes,
                    action = %action,
                    "violation enforced"
                );
                self.notify(member.chat_id, violation_notice(member, &violation))
                    .await;

                Ok(match action {
                    PunishmentAction::Warn => ModerationOutcome::Warned(violation),
                    PunishmentAction::Mute => ModerationOutcome::Muted(violation),
                    PunishmentAction::Ban => ModerationOutcome::Banned(violation),
                })
            }
            Err(error) => {
                warn!(
                    chat_id = %member.chat_id,
                    user_id = %member.user_id,
                    reason = reason.description(),
                    strikes,
                    action = %action,
                    error = %error,
                    "violation enforcement failed"
                );
                self.notify(
                    member.chat_id,
                    format!(
                        "❌ Could not {action} user {}: {error}\nStrike {strikes} was recorded.",
                        member.user_id
                    ),
                )
                .await;

                Ok(ModerationOutcome::Error {
                    violation,
                    message: error.to_string(),
                })
            }
        }
    }

    async fn enforce(
        &self,
        member: MemberKey,
        action: PunishmentAction,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        match action {
            PunishmentAction::Warn => Ok(()),
            PunishmentAction::Mute => {
                let until = self.config.mute_duration.map(|duration| now + duration);
                self.call_platform(
                    "restrict_member",
                    self.platform
                        .restrict_member(member, MemberPermissions::muted(), until),
                )
                .await
            }
            PunishmentAction::Ban => {
                self.call_platform("remove_member", self.platform.remove_member(member))
                    .await
            }
        }
    }

    /// Sends a chat notice; failures are logged and otherwise ignored.
    pub(super) async fn notify(&self, chat_id: ChatId, text: String) {
        if let Err(error) = self
            .call_platform("send_reply", self.platform.send_reply(chat_id, text.as_str()))
            .await
        {
            warn!(chat_id = %chat_id, error = %error, "failed to send moderation notice");
        }
    }
}

fn violation_notice(member: MemberKey, violation: &Violation) -> String {
    let reason = violation.reason.description();
    let strikes = violation.strikes;
    let user_id = member.user_id;

    match violation.action {
        PunishmentAction::Warn => format!(
            "⚠️ Warning for user {user_id}: {reason}\nStrike {strikes}. Further violations lead to a mute."
        ),
        PunishmentAction::Mute => {
            format!("🔇 User {user_id} muted: {reason}\nStrike {strikes}.")
        }
        PunishmentAction::Ban => {
            format!("⛔ User {user_id} removed: {reason}\nStrike {strikes}.")
        }
    }
}

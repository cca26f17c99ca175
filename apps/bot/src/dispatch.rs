//! Routes webhook updates to commands, greetings or moderation.

use std::future::{Future, ready};
use std::pin::Pin;

use chrono::Utc;
use floodgate_application::{MessageEvent, ModerationOutcome, NewMember, NewMemberEvent};
use floodgate_core::{AppError, AppResult, ChatId, UserId};
use tracing::{debug, error, warn};

use crate::commands::{BotCommand, CommandContext, execute_command};
use crate::state::AppState;
use crate::telegram_update::{Message, Update};

type Handling = Pin<Box<dyn Future<Output = AppResult<()>> + Send>>;

/// Routes one update and returns the work that is left to do.
///
/// Routing runs before the returned future is polled: a message handed to
/// moderation holds its place in the member's queue from this call on, so
/// spawning the future keeps each member's updates in arrival order.
/// Errors are logged, never propagated.
pub fn dispatch_update(
    state: AppState,
    update: Update,
) -> impl Future<Output = ()> + Send + use<> {
    let update_id = update.update_id;
    let handling = update.message.map(|message| route_message(&state, message));

    async move {
        let Some(handling) = handling else {
            debug!(update_id, "ignoring update without a message");
            return;
        };

        if let Err(error) = handling.await {
            error!(update_id, %error, "failed to handle update");
        }
    }
}

fn route_message(state: &AppState, message: Message) -> Handling {
    let chat_id = ChatId::new(message.chat.id);

    if !message.new_chat_members.is_empty() {
        let event = NewMemberEvent {
            chat_id,
            members: message
                .new_chat_members
                .iter()
                .map(|user| NewMember {
                    user_id: UserId::new(user.id),
                    display_name: user.display_name(),
                    is_bot: user.is_bot,
                })
                .collect(),
        };
        let state = state.clone();
        return Box::pin(async move { state.moderation_service.on_new_member(&event).await });
    }

    let Some(text) = message.text_or_caption() else {
        return Box::pin(ready(Ok(())));
    };
    let Some(sender) = message.from.as_ref() else {
        return Box::pin(ready(Ok(())));
    };
    let sender_id = UserId::new(sender.id);

    if let Some(command) = BotCommand::parse(text, state.bot_username.as_deref()) {
        let context = CommandContext {
            chat_id,
            sender: Some(sender_id),
            reply_target: message
                .reply_to_message
                .as_ref()
                .and_then(|replied| replied.from.as_ref())
                .map(|author| UserId::new(author.id)),
        };
        let state = state.clone();
        return Box::pin(async move { execute_command(&state, context, command).await });
    }

    let moderation = state.moderation_service.on_message(MessageEvent {
        chat_id,
        user_id: sender_id,
        text: text.to_owned(),
        timestamp: Utc::now(),
    });
    let message_id = message.message_id;

    Box::pin(async move {
        let outcome = moderation.await?;

        if let ModerationOutcome::Error { violation, message: reason } = &outcome {
            warn!(
                %chat_id,
                user_id = %sender_id,
                message_id,
                strikes = violation.strikes,
                %reason,
                "enforcement failed"
            );
        } else if outcome != ModerationOutcome::None {
            debug!(%chat_id, user_id = %sender_id, ?outcome, "message moderated");
        }
        Ok(())
    })
}

/// Sends a reply bounded by the configured platform timeout.
pub async fn send_text(state: &AppState, chat_id: ChatId, text: &str) -> AppResult<()> {
    tokio::time::timeout(state.platform_timeout, state.platform.send_reply(chat_id, text))
        .await
        .map_err(|_| {
            AppError::Platform(format!(
                "send_reply timed out after {}ms",
                state.platform_timeout.as_millis()
            ))
        })?
}

#[cfg(test)]
mod tests;

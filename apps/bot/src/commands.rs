//! Slash commands: parsing and owner-gated execution.

use floodgate_core::{AppError, AppResult, ChatId, MemberKey, UserId};
use tracing::{debug, info};

use crate::dispatch::send_text;
use crate::state::AppState;

const START_TEXT: &str = "✅ Moderation is active.\nSend /help to list commands.";

const HELP_TEXT: &str = "Commands:\n\
/start\n\
/help\n\
/rules - show the chat rules\n\
/setrules <text> (owner)\n\
/setwelcome <text> (owner)\n\
/status (owner) - reply to a message to show strikes\n\
/forgive (owner) - reply to a message to reset strikes\n\
/unrestrict (owner) - reply to a message to lift a mute\n\
/ban (owner) - reply to a message to remove its author";

/// Commands that act on the author of the replied-to message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberCommand {
    Status,
    Forgive,
    Unrestrict,
    Ban,
}

impl MemberCommand {
    fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Forgive => "forgive",
            Self::Unrestrict => "unrestrict",
            Self::Ban => "ban",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Rules,
    SetRules(String),
    SetWelcome(String),
    Member(MemberCommand),
}

impl BotCommand {
    /// Parses `/name[@bot] [args]`.
    ///
    /// Returns `None` for plain text, unknown commands and commands addressed
    /// to another bot.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let body = text.trim_start().strip_prefix('/')?;
        let (head, args) = match body.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (body, ""),
        };
        let (name, mention) = match head.split_once('@') {
            Some((name, mention)) => (name, Some(mention)),
            None => (head, None),
        };

        if let (Some(mention), Some(username)) = (mention, bot_username)
            && !mention.eq_ignore_ascii_case(username)
        {
            return None;
        }

        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "rules" => Self::Rules,
            "setrules" => Self::SetRules(args.to_owned()),
            "setwelcome" => Self::SetWelcome(args.to_owned()),
            "status" => Self::Member(MemberCommand::Status),
            "forgive" => Self::Member(MemberCommand::Forgive),
            "unrestrict" => Self::Member(MemberCommand::Unrestrict),
            "ban" => Self::Member(MemberCommand::Ban),
            _ => return None,
        };
        Some(command)
    }

    fn requires_owner(&self) -> bool {
        !matches!(self, Self::Start | Self::Help | Self::Rules)
    }
}

/// Where a command was issued and what it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandContext {
    pub chat_id: ChatId,
    pub sender: Option<UserId>,
    /// Author of the message the command replied to.
    pub reply_target: Option<UserId>,
}

/// Runs a command and sends its reply. Non-owners get no reply for admin
/// commands.
pub async fn execute_command(
    state: &AppState,
    context: CommandContext,
    command: BotCommand,
) -> AppResult<()> {
    if command.requires_owner() && !context.sender.is_some_and(|sender| state.is_owner(sender))
    {
        debug!(chat_id = %context.chat_id, ?command, "ignoring admin command from non-owner");
        return Ok(());
    }

    let reply = command_reply(state, context, command).await;
    send_text(state, context.chat_id, reply.as_str()).await
}

async fn command_reply(state: &AppState, context: CommandContext, command: BotCommand) -> String {
    let chat_id = context.chat_id;
    match command {
        BotCommand::Start => START_TEXT.to_owned(),
        BotCommand::Help => HELP_TEXT.to_owned(),
        BotCommand::Rules => match state.settings_service.get_settings(chat_id).await {
            Ok(settings) => settings.rules_text,
            Err(error) => failure(&error),
        },
        BotCommand::SetRules(text) => settings_update_reply(
            state.settings_service.set_rules(chat_id, text.as_str()).await,
            "✅ Rules updated.",
            "Usage: /setrules <rules text>",
        ),
        BotCommand::SetWelcome(text) => settings_update_reply(
            state.settings_service.set_welcome(chat_id, text.as_str()).await,
            "✅ Welcome message updated.",
            "Usage: /setwelcome <welcome text>",
        ),
        BotCommand::Member(command) => match context.reply_target {
            Some(user_id) => member_reply(state, command, MemberKey::new(chat_id, user_id)).await,
            None => format!("Reply to a user's message with /{}", command.name()),
        },
    }
}

async fn member_reply(state: &AppState, command: MemberCommand, member: MemberKey) -> String {
    let moderation = &state.moderation_service;
    let result = match command {
        MemberCommand::Status => moderation
            .strike_status(member)
            .await
            .map(|strikes| format!("👤 User: {}\nStrikes: {strikes}", member.user_id)),
        MemberCommand::Forgive => moderation
            .forgive(member)
            .await
            .map(|()| "✅ Strikes reset (forgiven).".to_owned()),
        MemberCommand::Unrestrict => moderation
            .unrestrict(member)
            .await
            .map(|()| "✅ User unmuted/unrestricted.".to_owned()),
        MemberCommand::Ban => moderation
            .ban(member)
            .await
            .map(|()| "⛔ User banned.".to_owned()),
    };

    match result {
        Ok(reply) => {
            info!(%member, command = command.name(), "admin command applied");
            reply
        }
        Err(error) => failure(&error),
    }
}

fn settings_update_reply(result: AppResult<()>, confirmation: &str, usage: &str) -> String {
    match result {
        Ok(()) => confirmation.to_owned(),
        Err(AppError::Validation(_)) => usage.to_owned(),
        Err(error) => failure(&error),
    }
}

fn failure(error: &AppError) -> String {
    format!("❌ Failed: {error}")
}

#[cfg(test)]
mod tests;

use floodgate_core::AppResult;

use super::ModerationService;
use crate::NewMemberEvent;

impl ModerationService {
    /// Greets human members who just joined with the chat's welcome text.
    ///
    /// Bypasses detection entirely.
    pub async fn on_new_member(&self, event: &NewMemberEvent) -> AppResult<()> {
        let names: Vec<&str> = event
            .members
            .iter()
            .filter(|member| !member.is_bot)
            .map(|member| member.display_name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(());
        }

        let settings = self.settings.get_settings(event.chat_id).await?;
        let text = format!("👋 {}\n{}", names.join(", "), settings.welcome_text);

        self.call_platform(
            "send_reply",
            self.platform.send_reply(event.chat_id, text.as_str()),
        )
        .await
    }
}

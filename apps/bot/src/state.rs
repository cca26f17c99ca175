use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use floodgate_application::{ChatPlatform, ModerationService, SettingsService};
use floodgate_core::UserId;

/// Shared state handed to every webhook request.
#[derive(Clone)]
pub struct AppState {
    pub moderation_service: ModerationService,
    pub settings_service: SettingsService,
    pub platform: Arc<dyn ChatPlatform>,
    pub admin_ids: Arc<HashSet<UserId>>,
    pub bot_username: Option<Arc<str>>,
    pub webhook_secret: Arc<str>,
    pub platform_timeout: Duration,
}

impl AppState {
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

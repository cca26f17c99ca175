use std::sync::Arc;

use floodgate_core::{AppResult, ChatId, NonEmptyString};
use floodgate_domain::{ResolvedChatSettings, SettingsDefaults};

use crate::ChatSettingsRepository;

/// Application service for per-chat welcome and rules text.
#[derive(Clone)]
pub struct SettingsService {
    repository: Arc<dyn ChatSettingsRepository>,
    defaults: Arc<SettingsDefaults>,
}

impl SettingsService {
    /// Creates a service from a repository and fallback texts.
    #[must_use]
    pub fn new(repository: Arc<dyn ChatSettingsRepository>, defaults: SettingsDefaults) -> Self {
        Self {
            repository,
            defaults: Arc::new(defaults),
        }
    }

    /// Returns the chat's welcome and rules text with defaults applied.
    pub async fn get_settings(&self, chat_id: ChatId) -> AppResult<ResolvedChatSettings> {
        let settings = self.repository.get_settings(chat_id).await?;
        Ok(settings.resolve(&self.defaults))
    }

    /// Overrides the chat's welcome text.
    pub async fn set_welcome(&self, chat_id: ChatId, text: &str) -> AppResult<()> {
        let text = NonEmptyString::new(text)?;
        self.repository.set_welcome(chat_id, text).await
    }

    /// Overrides the chat's rules text.
    pub async fn set_rules(&self, chat_id: ChatId, text: &str) -> AppResult<()> {
        let text = NonEmptyString::new(text)?;
        self.repository.set_rules(chat_id, text).await
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use floodgate_application::ChatSettingsRepository;
use floodgate_core::{AppResult, ChatId, NonEmptyString};
use floodgate_domain::ChatSettings;
use tokio::sync::RwLock;

/// In-memory chat settings for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryChatSettingsRepository {
    chats: RwLock<HashMap<ChatId, ChatSettings>>,
}

impl InMemoryChatSettingsRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatSettingsRepository for InMemoryChatSettingsRepository {
    async fn get_settings(&self, chat_id: ChatId) -> AppResult<ChatSettings> {
        Ok(self
            .chats
            .read()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_welcome(&self, chat_id: ChatId, text: NonEmptyString) -> AppResult<()> {
        self.chats
            .write()
            .await
            .entry(chat_id)
            .or_default()
            .welcome_text = Some(text);
        Ok(())
    }

    async fn set_rules(&self, chat_id: ChatId, text: NonEmptyString) -> AppResult<()> {
        self.chats.write().await.entry(chat_id).or_default().rules_text = Some(text);
        Ok(())
    }
}

//! Subset of the Telegram `Update` payload the bot reacts to.

use serde::Deserialize;

/// Incoming webhook update. Kinds other than `message` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub new_chat_members: Vec<User>,
    #[serde(default)]
    pub reply_to_message: Option<Box<Message>>,
}

impl Message {
    /// Text of the message, falling back to the caption of media messages.
    pub fn text_or_caption(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last_name) if !last_name.is_empty() => {
                format!("{} {last_name}", self.first_name.trim())
            }
            _ => self.first_name.trim().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Update;

    #[test]
    fn parses_reply_with_caption() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 10,
            "message": {
                "message_id": 7,
                "date": 1_700_000_000,
                "chat": { "id": -1001, "type": "supergroup" },
                "from": { "id": 5, "is_bot": false, "first_name": "Ada" },
                "caption": "look at this",
                "reply_to_message": {
                    "message_id": 6,
                    "chat": { "id": -1001, "type": "supergroup" },
                    "from": { "id": 9, "is_bot": false, "first_name": "Eve", "last_name": "Spam" },
                    "text": "buy now"
                }
            }
        }))
        .unwrap_or_else(|_| unreachable!());

        let message = update.message.unwrap_or_else(|| unreachable!());
        assert_eq!(message.text_or_caption(), Some("look at this"));
        assert!(message.new_chat_members.is_empty());

        let replied = message.reply_to_message.unwrap_or_else(|| unreachable!());
        let author = replied.from.unwrap_or_else(|| unreachable!());
        assert_eq!(author.id, 9);
        assert_eq!(author.display_name(), "Eve Spam");
    }

    #[test]
    fn non_message_updates_have_no_message() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 11,
            "callback_query": { "id": "abc" }
        }))
        .unwrap_or_else(|_| unreachable!());

        assert!(update.message.is_none());
    }
}

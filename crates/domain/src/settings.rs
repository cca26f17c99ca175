//! Per-chat welcome and rules text.

use floodgate_core::NonEmptyString;
use serde::{Deserialize, Serialize};

/// Overrides stored for one chat. Unset fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Greeting sent to new members.
    pub welcome_text: Option<NonEmptyString>,
    /// Text returned by the rules command.
    pub rules_text: Option<NonEmptyString>,
}

impl ChatSettings {
    /// Fills unset fields from the defaults.
    #[must_use]
    pub fn resolve(&self, defaults: &SettingsDefaults) -> ResolvedChatSettings {
        ResolvedChatSettings {
            welcome_text: self
                .welcome_text
                .as_ref()
                .map_or_else(|| defaults.welcome_text.clone(), |text| text.to_string()),
            rules_text: self
                .rules_text
                .as_ref()
                .map_or_else(|| defaults.rules_text.clone(), |text| text.to_string()),
        }
    }
}

/// Fallback texts used when a chat has no override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDefaults {
    /// Default greeting.
    pub welcome_text: String,
    /// Default rules.
    pub rules_text: String,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            welcome_text: "Welcome! ✅ Please follow the rules and don't spam 🙂".to_owned(),
            rules_text: "Rules:\n1) No spam or flooding\n2) No links without permission\n\
                         3) No abuse\n4) Keep off-topic to a minimum\n\
                         Violations are restricted automatically."
                .to_owned(),
        }
    }
}

/// Effective settings for a chat after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedChatSettings {
    /// Greeting sent to new members.
    pub welcome_text: String,
    /// Text returned by the rules command.
    pub rules_text: String,
}

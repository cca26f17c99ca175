//! Strike escalation bands.

use std::fmt::{Display, Formatter};

use floodgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::FloodKind;

/// Enforcement applied for a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunishmentAction {
    /// Reply with the reason, no platform mutation.
    Warn,
    /// Restrict the member from sending messages.
    Mute,
    /// Remove the member from the chat.
    Ban,
}

impl PunishmentAction {
    /// Returns a stable storage/log label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Mute => "mute",
            Self::Ban => "ban",
        }
    }
}

impl Display for PunishmentAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Why a message was treated as abuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    /// Too many messages inside the flood window.
    Flood,
    /// The same text sent too many times in a row.
    RepeatedMessages,
    /// A link that is not allowed in the chat.
    LinkSpam,
}

impl ViolationReason {
    /// Returns the human-readable reason shown in the chat.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Flood => "Flood / too many messages",
            Self::RepeatedMessages => "Repeated messages",
            Self::LinkSpam => "Link spam / unauthorized link",
        }
    }
}

impl From<FloodKind> for ViolationReason {
    fn from(value: FloodKind) -> Self {
        match value {
            FloodKind::Volume => Self::Flood,
            FloodKind::Repeat => Self::RepeatedMessages,
        }
    }
}

/// One row of the escalation table: from `threshold` strikes on, apply `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationBand {
    /// Minimum post-increment strike count for this band.
    pub threshold: u32,
    /// Action applied inside the band.
    pub action: PunishmentAction,
}

impl EscalationBand {
    /// Creates a band.
    #[must_use]
    pub const fn new(threshold: u32, action: PunishmentAction) -> Self {
        Self { threshold, action }
    }
}

/// Ordered mapping from strike count to punishment.
///
/// The last band saturates: any count above its threshold keeps its action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationPolicy {
    bands: Vec<EscalationBand>,
}

impl EscalationPolicy {
    /// Creates a policy from bands with strictly increasing thresholds
    /// starting at one.
    pub fn new(bands: Vec<EscalationBand>) -> AppResult<Self> {
        let Some(first) = bands.first() else {
            return Err(AppError::Validation(
                "escalation policy requires at least one band".to_owned(),
            ));
        };

        if first.threshold != 1 {
            return Err(AppError::Validation(
                "first escalation band must start at one strike".to_owned(),
            ));
        }

        if bands
            .windows(2)
            .any(|pair| pair[0].threshold >= pair[1].threshold)
        {
            return Err(AppError::Validation(
                "escalation band thresholds must be strictly increasing".to_owned(),
            ));
        }

        Ok(Self { bands })
    }

    /// Returns the action for a post-increment strike count, or `None` for zero.
    #[must_use]
    pub fn action_for(&self, strikes: u32) -> Option<PunishmentAction> {
        self.bands
            .iter()
            .rev()
            .find(|band| band.threshold <= strikes)
            .map(|band| band.action)
    }

    /// Returns the configured bands in ascending order.
    #[must_use]
    pub fn bands(&self) -> &[EscalationBand] {
        self.bands.as_slice()
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            bands: vec![
                EscalationBand::new(1, PunishmentAction::Warn),
                EscalationBand::new(2, PunishmentAction::Mute),
                EscalationBand::new(3, PunishmentAction::Ban),
            ],
        }
    }
}

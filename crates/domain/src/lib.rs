//! Domain rules for chat moderation.

#![forbid(unsafe_code)]

mod escalation;
mod flood;
mod link;
mod member;
mod settings;

pub use escalation::{EscalationBand, EscalationPolicy, PunishmentAction, ViolationReason};
pub use flood::{FloodKind, FloodPolicy, RateWindow};
pub use link::LinkClassifier;
pub use member::{MemberPermissions, MemberRole};
pub use settings::{ChatSettings, ResolvedChatSettings, SettingsDefaults};

//! Application services and ports.

#![forbid(unsafe_code)]

mod member_locks;
mod moderation_ports;
mod moderation_service;
mod rate_tracker;
mod settings_service;

pub use member_locks::{MemberGuard, MemberLocks, MemberTurn};
pub use moderation_ports::{
    ChatPlatform, ChatSettingsRepository, MessageEvent, NewMember, NewMemberEvent,
    StrikeRepository,
};
pub use moderation_service::{ModerationConfig, ModerationOutcome, ModerationService, Violation};
pub use rate_tracker::RateTracker;
pub use settings_service::SettingsService;

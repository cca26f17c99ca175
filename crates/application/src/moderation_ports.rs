mod events;
mod platform;
mod store;

pub use events::{MessageEvent, NewMember, NewMemberEvent};
pub use platform::ChatPlatform;
pub use store::{ChatSettingsRepository, StrikeRepository};

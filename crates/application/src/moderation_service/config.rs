use std::time::Duration;

use chrono::TimeDelta;
use floodgate_domain::{EscalationPolicy, FloodPolicy, LinkClassifier};

/// Immutable moderation settings, built once at startup.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Volume and repetition thresholds.
    pub flood_policy: FloodPolicy,
    /// Link spam classifier, possibly disabled.
    pub link_classifier: LinkClassifier,
    /// Strike count to punishment table.
    pub escalation: EscalationPolicy,
    /// Mute length; `None` mutes indefinitely.
    pub mute_duration: Option<TimeDelta>,
    /// Upper bound for each chat platform call.
    pub platform_timeout: Duration,
    /// Silence after which a member's rate state is evicted.
    pub idle_eviction: TimeDelta,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            flood_policy: FloodPolicy::default(),
            link_classifier: LinkClassifier::new(true),
            escalation: EscalationPolicy::default(),
            mute_duration: None,
            platform_timeout: Duration::from_secs(5),
            idle_eviction: TimeDelta::hours(1),
        }
    }
}

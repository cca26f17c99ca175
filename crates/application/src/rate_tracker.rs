use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use floodgate_core::MemberKey;
use floodgate_domain::{FloodKind, FloodPolicy, RateWindow};

/// Keyed store of per-member rate windows.
///
/// Windows live in a sharded map, so members on different shards are
/// evaluated in parallel. Callers serialize events for the same member.
#[derive(Debug)]
pub struct RateTracker {
    policy: FloodPolicy,
    windows: DashMap<MemberKey, RateWindow>,
}

impl RateTracker {
    /// Creates an empty tracker for the given policy.
    #[must_use]
    pub fn new(policy: FloodPolicy) -> Self {
        Self {
            policy,
            windows: DashMap::new(),
        }
    }

    /// Records a message and reports the flood it completes, if any.
    ///
    /// `now` comes from the caller so tests can drive a synthetic clock.
    pub fn evaluate(&self, member: MemberKey, text: &str, now: DateTime<Utc>) -> Option<FloodKind> {
        self.windows
            .entry(member)
            .or_default()
            .record(&self.policy, text, now)
    }

    /// Drops windows whose member has been silent for at least `idle`.
    ///
    /// Returns the number of evicted members.
    pub fn evict_idle(&self, now: DateTime<Utc>, idle: TimeDelta) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.is_idle(now, idle));
        before.saturating_sub(self.windows.len())
    }

    /// Returns how many members currently have a window.
    #[must_use]
    pub fn tracked_members(&self) -> usize {
        self.windows.len()
    }

    /// Returns the active policy.
    #[must_use]
    pub fn policy(&self) -> &FloodPolicy {
        &self.policy
    }
}

//! Sliding-window flood detection for a single chat member.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use floodgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Thresholds for volume and repetition flood detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodPolicy {
    window: TimeDelta,
    max_messages: usize,
    repeat_max: usize,
}

impl FloodPolicy {
    /// Creates a validated flood policy.
    ///
    /// `max_messages` is the number of messages tolerated inside the window;
    /// one more triggers a volume flood. `repeat_max` identical consecutive
    /// texts trigger a repeat flood.
    pub fn new(window_seconds: i64, max_messages: usize, repeat_max: usize) -> AppResult<Self> {
        if window_seconds <= 0 {
            return Err(AppError::Validation(
                "flood window must be greater than zero seconds".to_owned(),
            ));
        }

        let window = TimeDelta::try_seconds(window_seconds).ok_or_else(|| {
            AppError::Validation(format!("flood window of {window_seconds}s is out of range"))
        })?;

        if max_messages == 0 {
            return Err(AppError::Validation(
                "flood max messages must be greater than zero".to_owned(),
            ));
        }

        if repeat_max < 2 {
            return Err(AppError::Validation(
                "repeat threshold must be at least 2".to_owned(),
            ));
        }

        Ok(Self {
            window,
            max_messages,
            repeat_max,
        })
    }

    /// Returns the sliding window length.
    #[must_use]
    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// Returns the number of messages tolerated inside the window.
    #[must_use]
    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Returns the identical-text run length that triggers.
    #[must_use]
    pub fn repeat_max(&self) -> usize {
        self.repeat_max
    }
}

impl Default for FloodPolicy {
    fn default() -> Self {
        Self {
            window: TimeDelta::seconds(8),
            max_messages: 6,
            repeat_max: 3,
        }
    }
}

/// Which flood rule a message tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloodKind {
    /// More messages than allowed inside the window.
    Volume,
    /// Too many identical texts in a row.
    Repeat,
}

/// Recent activity of one member in one chat.
///
/// Volume detection looks at message timestamps inside the window only.
/// Repeat detection tracks the run of identical texts ending at the latest
/// message and is not bounded by time. Both are cleared once a flood has
/// been reported so a single burst is punished once.
#[derive(Debug, Clone, Default)]
pub struct RateWindow {
    timestamps: VecDeque<DateTime<Utc>>,
    last_text: Option<String>,
    repeat_run: usize,
    last_seen: Option<DateTime<Utc>>,
}

impl RateWindow {
    /// Creates an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message and reports whether it completes a flood.
    ///
    /// `now` earlier than the latest recorded message is clamped to it so
    /// the window stays ordered.
    pub fn record(
        &mut self,
        policy: &FloodPolicy,
        text: &str,
        now: DateTime<Utc>,
    ) -> Option<FloodKind> {
        let now = match self.last_seen {
            Some(last_seen) if now < last_seen => last_seen,
            _ => now,
        };
        self.last_seen = Some(now);

        self.timestamps.push_back(now);
        self.purge(policy, now);

        if self.last_text.as_deref() == Some(text) {
            self.repeat_run = self.repeat_run.saturating_add(1);
        } else {
            self.last_text = Some(text.to_owned());
            self.repeat_run = 1;
        }

        let kind = if self.timestamps.len() > policy.max_messages {
            Some(FloodKind::Volume)
        } else if self.repeat_run >= policy.repeat_max {
            Some(FloodKind::Repeat)
        } else {
            None
        };

        if kind.is_some() {
            self.timestamps.clear();
            self.last_text = None;
            self.repeat_run = 0;
        }

        kind
    }

    /// Returns how many messages currently count toward the volume check.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns true when no message is inside the window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Returns the length of the identical-text run ending at the latest message.
    #[must_use]
    pub fn repeat_run(&self) -> usize {
        self.repeat_run
    }

    /// Returns true when the member has been silent for at least `idle`.
    #[must_use]
    pub fn is_idle(&self, now: DateTime<Utc>, idle: TimeDelta) -> bool {
        self.last_seen
            .is_none_or(|last_seen| now.signed_duration_since(last_seen) >= idle)
    }

    fn purge(&mut self, policy: &FloodPolicy, now: DateTime<Utc>) {
        let cutoff = now - policy.window;
        while self
            .timestamps
            .front()
            .is_some_and(|timestamp| *timestamp < cutoff)
        {
            self.timestamps.pop_front();
        }
    }
}

//! Deployment-tunable engine behavior.

use chrono::TimeDelta;

/// How long an unresolved ticket must wait before it may be escalated.
pub const DEFAULT_URGENCY_THRESHOLD_SECS: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnginePolicy {
    /// Minimum ticket age before `mark_urgent` is allowed.
    pub urgency_threshold: TimeDelta,
    /// Tell the reporter when work starts on their ticket.
    pub notify_on_start: bool,
    /// Alert the resolver pool when a new ticket is reported.
    pub notify_on_create: bool,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            urgency_threshold: TimeDelta::seconds(DEFAULT_URGENCY_THRESHOLD_SECS),
            notify_on_start: true,
            notify_on_create: true,
        }
    }
}

impl EnginePolicy {
    pub fn with_urgency_threshold(mut self, threshold: TimeDelta) -> Self {
        self.urgency_threshold = threshold;
        self
    }
}

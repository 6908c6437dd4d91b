use crate::{Moment, Signal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A signal level and the moment at which it takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduledValue {
    /// The level being driven.
    pub signal: Signal,
    /// When the level becomes effective.
    pub moment: Moment,
}

impl ScheduledValue {
    /// Create a scheduled value.
    pub fn new(signal: Signal, moment: Moment) -> Self {
        Self { signal, moment }
    }

    /// True once `now` has reached the effective moment.
    pub fn is_due(&self, now: Moment) -> bool {
        self.moment <= now
    }
}

impl fmt::Display for ScheduledValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.signal, self.moment)
    }
}

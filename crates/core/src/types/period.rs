//! Timetable period currently in progress.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::PeriodId;

/// The lesson period running right now for the viewer's class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPeriod {
    pub id: PeriodId,
    pub subject: String,
    pub class_name: String,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
}

impl CurrentPeriod {
    /// Whether `time` falls inside the period (start inclusive, end exclusive).
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.starts_at <= time && time < self.ends_at
    }

    /// Minutes left in the period at `time`, or zero once it has ended.
    #[must_use]
    pub fn minutes_remaining(&self, time: NaiveTime) -> i64 {
        (self.ends_at - time).num_minutes().max(0)
    }
}

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use crate::config::PortalConfig;

/// Registration window: opens on `launch_date` and closes `window_days` later
/// at midnight UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalSchedule {
    pub launch_date: NaiveDate,
    pub window_days: u32,
}

impl PortalSchedule {
    pub fn new(launch_date: NaiveDate, window_days: u32) -> Self {
        Self {
            launch_date,
            window_days,
        }
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        let closing_day = self
            .launch_date
            .checked_add_days(Days::new(u64::from(self.window_days)))
            .unwrap_or(NaiveDate::MAX);
        closing_day.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline()
    }

    /// Time left before closing, or `None` once the portal has closed.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Countdown> {
        let remaining = self.deadline().signed_duration_since(now);
        if remaining <= chrono::Duration::zero() {
            return None;
        }
        let total = remaining.num_seconds();
        Some(Countdown {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
        })
    }
}

impl From<PortalConfig> for PortalSchedule {
    fn from(config: PortalConfig) -> Self {
        Self::new(config.launch_date, config.window_days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

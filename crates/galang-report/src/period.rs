use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// A half-open reporting window `[from, to)`.
///
/// Half-open so that adjacent periods tile without double-counting a
/// donation landing exactly on a boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReportPeriod {
    /// Create a period. Fails unless `from` is strictly before `to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, ReportError> {
        if from >= to {
            return Err(ReportError::InvalidPeriod { from, to });
        }
        Ok(Self { from, to })
    }

    /// The trailing window of `days` days ending at `now`.
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Result<Self, ReportError> {
        Self::new(now - Duration::days(days), now)
    }

    /// Returns `true` if the instant falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && instant < self.to
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn boundaries_are_half_open() {
        let from = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let period = ReportPeriod::new(from, to).unwrap();

        assert!(period.contains(from));
        assert!(!period.contains(to));
        assert!(period.contains(to - Duration::seconds(1)));
        assert!(!period.contains(from - Duration::seconds(1)));
    }

    #[test]
    fn empty_or_inverted_period_is_rejected() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(ReportPeriod::new(instant, instant).is_err());
        assert!(ReportPeriod::new(instant, instant - Duration::days(1)).is_err());
    }

    #[test]
    fn trailing_window_ends_at_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let period = ReportPeriod::trailing_days(now, 30).unwrap();
        assert_eq!(period.to, now);
        assert_eq!(period.from, now - Duration::days(30));
    }
}

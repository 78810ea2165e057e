use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Minutes after the scheduled time during which a missed tick may still fire.
pub const DEFAULT_WINDOW_MINUTES: i64 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScheduleError {
    #[error("reminder window must be between one minute and one day")]
    InvalidWindow,
}

/// Once-a-day reminder bookkeeping.
///
/// A reminder is due when the local time of day falls in `[at, at + window)`
/// and the occurrence containing it has not fired yet. Windows may wrap past
/// midnight; the occurrence is then attributed to the previous date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSchedule {
    at: NaiveTime,
    window: Duration,
    last_fired: Option<NaiveDate>,
}

impl ReminderSchedule {
    /// # Errors
    ///
    /// Returns `ScheduleError::InvalidWindow` unless `1 min <= window <= 1 day`.
    pub fn new(at: NaiveTime, window: Duration) -> Result<Self, ScheduleError> {
        if window < Duration::minutes(1) || window > Duration::days(1) {
            return Err(ScheduleError::InvalidWindow);
        }
        Ok(Self {
            at,
            window,
            last_fired: None,
        })
    }

    /// Daily schedule with the default one-hour window.
    #[must_use]
    pub fn daily(at: NaiveTime) -> Self {
        Self {
            at,
            window: Duration::minutes(DEFAULT_WINDOW_MINUTES),
            last_fired: None,
        }
    }

    #[must_use]
    pub fn at(&self) -> NaiveTime {
        self.at
    }

    #[must_use]
    pub fn last_fired(&self) -> Option<NaiveDate> {
        self.last_fired
    }

    /// Date of the occurrence whose window contains `now`, if any.
    #[must_use]
    pub fn occurrence(&self, now: NaiveDateTime) -> Option<NaiveDate> {
        let since = now.time().signed_duration_since(self.at);
        if since >= Duration::zero() {
            return (since < self.window).then(|| now.date());
        }
        let wrapped = since + Duration::days(1);
        if wrapped < self.window {
            now.date().pred_opt()
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.occurrence(now)
            .is_some_and(|day| self.last_fired != Some(day))
    }

    /// Record a firing if one is due. Returns whether the caller should notify.
    pub fn fire_if_due(&mut self, now: NaiveDateTime) -> bool {
        match self.occurrence(now) {
            Some(day) if self.last_fired != Some(day) => {
                self.last_fired = Some(day);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn moment(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn fires_once_per_day() {
        let mut schedule = ReminderSchedule::daily(at(3, 0));
        assert!(!schedule.fire_if_due(moment(1, 2, 59)));
        assert!(schedule.fire_if_due(moment(1, 3, 0)));
        assert!(!schedule.fire_if_due(moment(1, 3, 1)));
        assert!(!schedule.fire_if_due(moment(1, 3, 30)));
        assert_eq!(schedule.last_fired(), NaiveDate::from_ymd_opt(2025, 3, 1));

        assert!(schedule.fire_if_due(moment(2, 3, 10)));
    }

    #[test]
    fn late_tick_inside_window_still_fires() {
        let mut schedule = ReminderSchedule::daily(at(3, 0));
        assert!(schedule.fire_if_due(moment(1, 3, 59)));
    }

    #[test]
    fn tick_after_window_is_skipped() {
        let schedule = ReminderSchedule::daily(at(3, 0));
        assert!(!schedule.is_due(moment(1, 4, 0)));
        assert!(!schedule.is_due(moment(1, 12, 0)));
    }

    #[test]
    fn window_wrapping_midnight_belongs_to_previous_day() {
        let mut schedule = ReminderSchedule::new(at(23, 30), Duration::minutes(60)).unwrap();
        assert!(schedule.fire_if_due(moment(1, 23, 45)));
        assert!(!schedule.fire_if_due(moment(2, 0, 15)));
        assert_eq!(
            schedule.occurrence(moment(2, 0, 15)),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert!(schedule.fire_if_due(moment(2, 23, 31)));
    }

    #[test]
    fn rejects_degenerate_windows() {
        assert_eq!(
            ReminderSchedule::new(at(3, 0), Duration::zero()),
            Err(ScheduleError::InvalidWindow)
        );
        assert!(ReminderSchedule::new(at(3, 0), Duration::days(2)).is_err());
    }
}

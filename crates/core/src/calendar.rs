use std::fmt;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Mean length of a lunation in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_67;

/// Days-from-CE of the reference new moon, 2000-01-06.
const REFERENCE_NEW_MOON: i32 = 730_125;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CalendarError {
    #[error("Ramadan window ends ({end}) before it starts ({start})")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

//
// ─── MOON PHASE ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    const ALL: [MoonPhase; 8] = [
        MoonPhase::NewMoon,
        MoonPhase::WaxingCrescent,
        MoonPhase::FirstQuarter,
        MoonPhase::WaxingGibbous,
        MoonPhase::FullMoon,
        MoonPhase::WaningGibbous,
        MoonPhase::LastQuarter,
        MoonPhase::WaningCrescent,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position within the current lunation, in `[0, 1)`; 0 is new, 0.5 is full.
#[must_use]
pub fn lunation_fraction(date: NaiveDate) -> f64 {
    let days = f64::from(date.num_days_from_ce() - REFERENCE_NEW_MOON);
    let lunations = days / SYNODIC_MONTH_DAYS;
    lunations - lunations.floor()
}

/// Approximate named phase for a calendar date.
#[must_use]
pub fn moon_phase(date: NaiveDate) -> MoonPhase {
    // fraction is in [0, 1) so the product truncates into 0..=7
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let idx = (lunation_fraction(date) * 8.0) as usize % 8;
    MoonPhase::ALL[idx]
}

//
// ─── RAMADAN WINDOW ────────────────────────────────────────────────────────────
//

/// Inclusive range of fasting days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamadanWindow {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamadanProgress {
    pub days_passed: u32,
    pub days_total: u32,
}

impl RamadanProgress {
    #[must_use]
    pub fn days_left(&self) -> u32 {
        self.days_total.saturating_sub(self.days_passed)
    }

    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.days_total == 0 {
            return 0.0;
        }
        f64::from(self.days_passed) / f64::from(self.days_total)
    }
}

impl RamadanWindow {
    /// # Errors
    ///
    /// Returns `CalendarError::EndBeforeStart` when `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CalendarError> {
        if end < start {
            return Err(CalendarError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn days_total(&self) -> u32 {
        let span = (self.end - self.start).num_days() + 1;
        u32::try_from(span).unwrap_or(u32::MAX)
    }

    /// Days elapsed since the first day, clamped to the window length.
    #[must_use]
    pub fn progress(&self, today: NaiveDate) -> RamadanProgress {
        let days_total = self.days_total();
        let elapsed = (today - self.start).num_days().max(0);
        let days_passed = u32::try_from(elapsed).unwrap_or(u32::MAX).min(days_total);
        RamadanProgress {
            days_passed,
            days_total,
        }
    }
}

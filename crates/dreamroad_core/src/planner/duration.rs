//! Goal duration input and validation.
//!
//! # Responsibility
//! - Convert wizard period selections (preset, custom, deadline) to a day count.
//! - Reject invalid durations before any breakdown is built.
//!
//! # Invariants
//! - A `TotalDays` value is always within `1..=MAX_TOTAL_DAYS`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound for one goal: one hundred 365-day years.
pub const MAX_TOTAL_DAYS: u32 = 100 * 365;

const DAYS_PER_YEAR: u64 = 365;
const DAYS_PER_MONTH: u64 = 30;
const DAYS_PER_WEEK: u64 = 7;
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Validated goal duration in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct TotalDays(u32);

impl TotalDays {
    /// Validates an integer day count.
    pub fn new(days: i64) -> Result<Self, InvalidDurationError> {
        if days <= 0 {
            return Err(InvalidDurationError::NotPositive(days));
        }
        let days = u32::try_from(days)
            .ok()
            .filter(|value| *value <= MAX_TOTAL_DAYS)
            .ok_or(InvalidDurationError::TooLarge(days))?;
        Ok(Self(days))
    }

    /// Validates a numeric day count coming from an untyped caller.
    ///
    /// Rejects NaN, infinities and values with a fractional part.
    pub fn from_f64(value: f64) -> Result<Self, InvalidDurationError> {
        if !value.is_finite() {
            return Err(InvalidDurationError::NotNumeric(value.to_string()));
        }
        if value.fract() != 0.0 {
            return Err(InvalidDurationError::NotInteger(value.to_string()));
        }
        if value > i64::MAX as f64 || value < i64::MIN as f64 {
            return Err(InvalidDurationError::NotNumeric(value.to_string()));
        }
        Self::new(value as i64)
    }

    /// Parses a day count from free text, e.g. a form field.
    pub fn parse(text: &str) -> Result<Self, InvalidDurationError> {
        let trimmed = text.trim();
        if let Ok(days) = trimmed.parse::<i64>() {
            return Self::new(days);
        }
        match trimmed.parse::<f64>() {
            Ok(value) => Self::from_f64(value),
            Err(_) => Err(InvalidDurationError::NotNumeric(trimmed.to_string())),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for TotalDays {
    type Error = InvalidDurationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TotalDays> for u32 {
    fn from(value: TotalDays) -> Self {
        value.0
    }
}

impl Display for TotalDays {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rejected goal duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidDurationError {
    /// Zero or negative day count.
    NotPositive(i64),
    /// Numeric input with a fractional part.
    NotInteger(String),
    /// Input is not a finite number.
    NotNumeric(String),
    /// Day count above `MAX_TOTAL_DAYS`.
    TooLarge(i64),
    /// Deadline lies before the reference day.
    DeadlinePassed { deadline_ms: i64, today_ms: i64 },
}

impl Display for InvalidDurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive(days) => {
                write!(f, "goal duration must be at least one day, got {days}")
            }
            Self::NotInteger(value) => {
                write!(f, "goal duration must be a whole number of days, got {value}")
            }
            Self::NotNumeric(value) => write!(f, "goal duration is not a number: `{value}`"),
            Self::TooLarge(days) => write!(
                f,
                "goal duration of {days} days exceeds the maximum of {MAX_TOTAL_DAYS}"
            ),
            Self::DeadlinePassed {
                deadline_ms,
                today_ms,
            } => write!(
                f,
                "deadline {deadline_ms} is earlier than today {today_ms}"
            ),
        }
    }
}

impl Error for InvalidDurationError {}

/// Fixed wizard presets. Months are counted as four weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodPreset {
    Week,
    Month,
    Quarter,
    HalfYear,
    Year,
}

impl PeriodPreset {
    pub fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 28,
            Self::Quarter => 84,
            Self::HalfYear => 168,
            Self::Year => 336,
        }
    }

    /// Parses the wizard value (`week`, `month`, `quarter`, `half-year`, `year`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "quarter" => Some(Self::Quarter),
            "half-year" | "half_year" => Some(Self::HalfYear),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

/// How the user picked the goal duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodChoice {
    Preset {
        preset: PeriodPreset,
    },
    Custom {
        #[serde(default)]
        years: u32,
        #[serde(default)]
        months: u32,
        #[serde(default)]
        weeks: u32,
        #[serde(default)]
        days: u32,
    },
    /// Both values are epoch milliseconds; `today_ms` is the start of the
    /// caller's current day.
    Deadline { deadline_ms: i64, today_ms: i64 },
}

impl PeriodChoice {
    /// Resolves the selection to a validated day count.
    pub fn total_days(&self) -> Result<TotalDays, InvalidDurationError> {
        match *self {
            Self::Preset { preset } => TotalDays::new(i64::from(preset.days())),
            Self::Custom {
                years,
                months,
                weeks,
                days,
            } => {
                let total = u64::from(years) * DAYS_PER_YEAR
                    + u64::from(months) * DAYS_PER_MONTH
                    + u64::from(weeks) * DAYS_PER_WEEK
                    + u64::from(days);
                TotalDays::new(i64::try_from(total).unwrap_or(i64::MAX))
            }
            Self::Deadline {
                deadline_ms,
                today_ms,
            } => {
                if deadline_ms < today_ms {
                    return Err(InvalidDurationError::DeadlinePassed {
                        deadline_ms,
                        today_ms,
                    });
                }
                let span = deadline_ms.saturating_sub(today_ms);
                let days = span / MILLIS_PER_DAY + i64::from(span % MILLIS_PER_DAY != 0);
                TotalDays::new(days)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InvalidDurationError, PeriodChoice, PeriodPreset, TotalDays, MAX_TOTAL_DAYS};

    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn new_rejects_zero_and_negative() {
        assert_eq!(TotalDays::new(0), Err(InvalidDurationError::NotPositive(0)));
        assert_eq!(
            TotalDays::new(-3),
            Err(InvalidDurationError::NotPositive(-3))
        );
        assert_eq!(TotalDays::new(1).unwrap().get(), 1);
    }

    #[test]
    fn new_rejects_values_above_limit() {
        let too_large = i64::from(MAX_TOTAL_DAYS) + 1;
        assert_eq!(
            TotalDays::new(too_large),
            Err(InvalidDurationError::TooLarge(too_large))
        );
    }

    #[test]
    fn from_f64_rejects_fractions_and_nan() {
        assert!(matches!(
            TotalDays::from_f64(2.5),
            Err(InvalidDurationError::NotInteger(_))
        ));
        assert!(matches!(
            TotalDays::from_f64(f64::NAN),
            Err(InvalidDurationError::NotNumeric(_))
        ));
        assert_eq!(TotalDays::from_f64(45.0).unwrap().get(), 45);
    }

    #[test]
    fn parse_handles_text_input() {
        assert_eq!(TotalDays::parse(" 10 ").unwrap().get(), 10);
        assert!(matches!(
            TotalDays::parse("ten"),
            Err(InvalidDurationError::NotNumeric(_))
        ));
        assert!(matches!(
            TotalDays::parse("1.5"),
            Err(InvalidDurationError::NotInteger(_))
        ));
    }

    #[test]
    fn presets_use_four_week_months() {
        let month = PeriodChoice::Preset {
            preset: PeriodPreset::Month,
        };
        assert_eq!(month.total_days().unwrap().get(), 28);
        assert_eq!(PeriodPreset::parse("half-year"), Some(PeriodPreset::HalfYear));
        assert_eq!(PeriodPreset::HalfYear.days(), 168);
    }

    #[test]
    fn custom_sums_components_and_rejects_empty() {
        let choice = PeriodChoice::Custom {
            years: 1,
            months: 1,
            weeks: 1,
            days: 1,
        };
        assert_eq!(choice.total_days().unwrap().get(), 365 + 30 + 7 + 1);

        let empty = PeriodChoice::Custom {
            years: 0,
            months: 0,
            weeks: 0,
            days: 0,
        };
        assert_eq!(
            empty.total_days(),
            Err(InvalidDurationError::NotPositive(0))
        );
    }

    #[test]
    fn deadline_rounds_partial_days_up() {
        let today = 1_700_006_400_000;
        let choice = PeriodChoice::Deadline {
            deadline_ms: today + 2 * DAY_MS + 1,
            today_ms: today,
        };
        assert_eq!(choice.total_days().unwrap().get(), 3);

        let passed = PeriodChoice::Deadline {
            deadline_ms: today - 1,
            today_ms: today,
        };
        assert!(matches!(
            passed.total_days(),
            Err(InvalidDurationError::DeadlinePassed { .. })
        ));
    }

    #[test]
    fn choice_serializes_with_kind_tag() {
        let choice = PeriodChoice::Preset {
            preset: PeriodPreset::HalfYear,
        };
        let json = serde_json::to_value(choice).unwrap();
        assert_eq!(json["kind"], "preset");
        assert_eq!(json["preset"], "half-year");
    }
}

//! Decomposition granularity for a goal duration.

use crate::planner::duration::TotalDays;

pub(crate) const YEAR_DAYS: u32 = 365;
pub(crate) const MONTH_DAYS: u32 = 30;
pub(crate) const WEEK_DAYS: u32 = 7;

/// Top-level rule the builder applies to a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// `full_years` whole year blocks plus an optional remainder block.
    Years { full_years: u32, remainder: u32 },
    Months,
    Weeks,
    Days,
}

/// Picks the rule for `total`. First match wins:
/// `>= 365` years, `>= 30` months, `>= 7` weeks, otherwise days.
pub fn classify(total: TotalDays) -> Granularity {
    let days = total.get();
    if days >= YEAR_DAYS {
        Granularity::Years {
            full_years: days / YEAR_DAYS,
            remainder: days % YEAR_DAYS,
        }
    } else if days >= MONTH_DAYS {
        Granularity::Months
    } else if days >= WEEK_DAYS {
        Granularity::Weeks
    } else {
        Granularity::Days
    }
}

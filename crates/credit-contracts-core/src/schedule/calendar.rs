//! Calendar arithmetic: period stepping, end dates and term conversion.
//!
//! Month and year steps go through `chrono::Months`, so a step from the
//! 31st lands on the last day of shorter months instead of spilling over.
//! Due dates are always stepped from the anchor date, never chained, so a
//! clamp in February does not drag every later installment to the 28th.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::PaymentFrequency;
use crate::error::ContractError;
use crate::ContractResult;

const DAYS_PER_YEAR: u32 = 365;
const DAYS_PER_WEEK: u32 = 7;

/// Unit a contract or funding-request duration is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    #[serde(alias = "DAYS")]
    Days,
    #[serde(alias = "WEEKS")]
    Weeks,
    #[serde(alias = "MONTHS")]
    Months,
    #[serde(alias = "YEARS")]
    Years,
}

/// Advance `anchor` by `periods` payment periods of `frequency`.
pub fn add_periods(
    anchor: NaiveDate,
    frequency: PaymentFrequency,
    periods: u32,
) -> ContractResult<NaiveDate> {
    let months = periods
        .checked_mul(frequency.months_per_period())
        .ok_or_else(|| ContractError::invalid("term", "Too many periods"))?;
    anchor
        .checked_add_months(Months::new(months))
        .ok_or_else(|| {
            ContractError::invalid(
                "start_date",
                format!("{anchor} + {months} months is outside the supported calendar"),
            )
        })
}

/// Maturity date: `start` advanced by `term` units of `unit`.
pub fn derive_end_date(start: NaiveDate, term: u32, unit: DurationUnit) -> ContractResult<NaiveDate> {
    let end = match unit {
        DurationUnit::Days => start.checked_add_days(Days::new(u64::from(term))),
        DurationUnit::Weeks => {
            start.checked_add_days(Days::new(u64::from(term) * u64::from(DAYS_PER_WEEK)))
        }
        DurationUnit::Months => start.checked_add_months(Months::new(term)),
        DurationUnit::Years => term
            .checked_mul(12)
            .and_then(|m| start.checked_add_months(Months::new(m))),
    };
    end.ok_or_else(|| {
        ContractError::invalid(
            "term",
            format!("{start} + {term} {unit:?} is outside the supported calendar"),
        )
    })
}

/// Number of installments a duration yields at `frequency`.
///
/// Months round up per period so the borrower is never short-scheduled
/// (18 months paid quarterly → 6). Years multiply exactly. Days and weeks
/// round up over the average period length of 365 / periods-per-year days.
pub fn convert_term(
    duration: u32,
    unit: DurationUnit,
    frequency: PaymentFrequency,
) -> ContractResult<u32> {
    if duration == 0 {
        return Err(ContractError::invalid("duration", "Duration must be > 0"));
    }

    let per_year = u64::from(frequency.periods_per_year());
    let duration = u64::from(duration);
    let periods = match unit {
        DurationUnit::Months => duration.div_ceil(u64::from(frequency.months_per_period())),
        DurationUnit::Years => duration * per_year,
        DurationUnit::Weeks => {
            (duration * u64::from(DAYS_PER_WEEK) * per_year).div_ceil(u64::from(DAYS_PER_YEAR))
        }
        DurationUnit::Days => (duration * per_year).div_ceil(u64::from(DAYS_PER_YEAR)),
    };

    u32::try_from(periods.max(1))
        .map_err(|_| ContractError::invalid("duration", "Converted term does not fit in u32"))
}

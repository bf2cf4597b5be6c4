//! Repayment schedule generation and recalculation.
//!
//! Everything in this module is pure: no I/O, no shared state. Amounts are
//! `rust_decimal::Decimal` rounded to the currency minimum unit, with the
//! last installment absorbing any residual so that cumulative principal
//! equals the financed principal exactly.

pub mod calendar;
pub mod generator;
pub mod recalculation;
pub mod report;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate, DEFAULT_ROUNDING_SCALE};

pub use calendar::{add_periods, convert_term, derive_end_date, DurationUnit};
pub use generator::generate_schedule;
pub use recalculation::recalculate_after_partial_payment;

/// How often installments fall due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Monthly,
    Quarterly,
    Biannual,
    Annual,
}

impl PaymentFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::Biannual => 2,
            PaymentFrequency::Annual => 1,
        }
    }

    pub fn months_per_period(self) -> u32 {
        12 / self.periods_per_year()
    }

    /// Periodic rate from an annual percentage rate (12 → 0.01 monthly).
    pub fn periodic_rate(self, annual_rate_pct: Rate) -> Rate {
        annual_rate_pct / Decimal::ONE_HUNDRED / Decimal::from(self.periods_per_year())
    }
}

/// Amortization policy: how each installment splits into principal and interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmortizationType {
    /// Level total payment (annuity).
    Constant,
    /// Level principal, declining total.
    Degressive,
    /// Level payment with a lump sum on the final installment.
    Balloon,
    /// Interest only, full principal at maturity.
    Bullet,
}

/// Terms a schedule is generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleParams {
    pub principal: Money,
    /// Annual rate as a percentage (12 = 12%).
    pub annual_rate: Rate,
    /// Number of installments, grace period included.
    pub term: u32,
    /// Installment 1 falls due one period after this date.
    pub start_date: NaiveDate,
    pub frequency: PaymentFrequency,
    pub amortization_type: AmortizationType,
    /// Leading interest-only installments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<u32>,
    /// Lump sum due on the final installment of a balloon schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balloon_payment: Option<Money>,
    /// Decimal places of the currency minimum unit.
    #[serde(default = "default_rounding_scale")]
    pub rounding_scale: u32,
}

fn default_rounding_scale() -> u32 {
    DEFAULT_ROUNDING_SCALE
}

impl ScheduleParams {
    pub fn periodic_rate(&self) -> Rate {
        self.frequency.periodic_rate(self.annual_rate)
    }

    pub fn grace(&self) -> u32 {
        self.grace_period.unwrap_or(0)
    }

    /// The policy actually applied: balloon without a balloon amount is constant.
    pub fn effective_amortization(&self) -> AmortizationType {
        match (self.amortization_type, self.balloon_payment) {
            (AmortizationType::Balloon, None) => AmortizationType::Constant,
            (policy, _) => policy,
        }
    }
}

/// One generated installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub principal_amount: Money,
    pub interest_amount: Money,
    pub total_amount: Money,
    /// Outstanding principal once this installment is settled.
    pub remaining_balance: Money,
}

/// Aggregate view over a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub installment_count: usize,
    pub total_principal: Money,
    pub total_interest: Money,
    pub total_payable: Money,
    pub first_due_date: Option<NaiveDate>,
    pub last_due_date: Option<NaiveDate>,
}

pub fn summarize(schedule: &[Installment]) -> ScheduleSummary {
    ScheduleSummary {
        installment_count: schedule.len(),
        total_principal: schedule.iter().map(|i| i.principal_amount).sum(),
        total_interest: schedule.iter().map(|i| i.interest_amount).sum(),
        total_payable: schedule.iter().map(|i| i.total_amount).sum(),
        first_due_date: schedule.first().map(|i| i.due_date),
        last_due_date: schedule.last().map(|i| i.due_date),
    }
}

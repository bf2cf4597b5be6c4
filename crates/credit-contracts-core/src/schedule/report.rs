//! Schedule operations wrapped in the standard computation envelope, for
//! front-ends that exchange JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::calendar::{convert_term, derive_end_date, DurationUnit};
use super::generator::generate_schedule;
use super::recalculation::recalculate_after_partial_payment;
use super::{summarize, AmortizationType, Installment, PaymentFrequency, ScheduleParams, ScheduleSummary};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ContractResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub schedule: Vec<Installment>,
    pub summary: ScheduleSummary,
}

/// Input for a partial-payment recalculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalculationInput {
    pub params: ScheduleParams,
    /// Current schedule; generated from `params` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<Installment>>,
    pub payment_date: NaiveDate,
    pub paid_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermConversionInput {
    pub duration: u32,
    pub duration_unit: DurationUnit,
    pub frequency: PaymentFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermConversionOutput {
    pub periods: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Generate a schedule with its summary.
pub fn build_schedule(params: &ScheduleParams) -> ContractResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if params.amortization_type == AmortizationType::Balloon && params.balloon_payment.is_none() {
        warnings.push("Balloon policy without balloon_payment; generated as constant".to_string());
    }
    if params.amortization_type == AmortizationType::Bullet && params.grace() > 0 {
        warnings.push("Grace period has no effect on a bullet schedule".to_string());
    }

    let schedule = generate_schedule(params)?;
    let summary = summarize(&schedule);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Repayment schedule — grace, constant/degressive/balloon/bullet amortization",
        &serde_json::json!({
            "principal": params.principal.to_string(),
            "annual_rate_pct": params.annual_rate.to_string(),
            "periodic_rate": params.periodic_rate().to_string(),
            "term": params.term,
            "frequency": params.frequency,
            "amortization": params.effective_amortization(),
            "grace_period": params.grace(),
        }),
        warnings,
        elapsed,
        ScheduleOutput { schedule, summary },
    ))
}

/// Recalculate a schedule after a partial payment, with its summary.
pub fn build_recalculation(
    input: &RecalculationInput,
) -> ContractResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let current = match &input.schedule {
        Some(schedule) => schedule.clone(),
        None => generate_schedule(&input.params)?,
    };
    let schedule = recalculate_after_partial_payment(
        &current,
        input.payment_date,
        input.paid_amount,
        &input.params,
    )?;
    if schedule == current {
        warnings.push(format!(
            "No installment due on or after {} exceeds {}; schedule unchanged",
            input.payment_date, input.paid_amount
        ));
    }
    let summary = summarize(&schedule);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Partial-payment recalculation — proportional reduction and tail re-amortization",
        &serde_json::json!({
            "payment_date": input.payment_date,
            "paid_amount": input.paid_amount.to_string(),
            "amortization": input.params.effective_amortization(),
        }),
        warnings,
        elapsed,
        ScheduleOutput { schedule, summary },
    ))
}

/// Convert a duration into a period count, and optionally a maturity date.
pub fn build_term_conversion(
    input: &TermConversionInput,
) -> ContractResult<ComputationOutput<TermConversionOutput>> {
    let start = Instant::now();
    let periods = convert_term(input.duration, input.duration_unit, input.frequency)?;
    let end_date = input
        .start_date
        .map(|d| derive_end_date(d, input.duration, input.duration_unit))
        .transpose()?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Term conversion — months round up per period, years multiply exactly",
        input,
        Vec::new(),
        elapsed,
        TermConversionOutput { periods, end_date },
    ))
}

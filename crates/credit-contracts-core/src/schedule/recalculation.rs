//! Schedule revision after a partial payment.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::generator::generate_schedule;
use super::{Installment, ScheduleParams};
use crate::error::ContractError;
use crate::types::{round_money, Money};
use crate::ContractResult;

/// Revise `schedule` after `paid_amount` was received on `payment_date`.
///
/// The affected installment is the first one due on or after the payment
/// date whose total exceeds the amount paid. Its principal and interest are
/// reduced by their proportional share of the payment and its total becomes
/// the unpaid remainder. Every later installment is regenerated from the
/// new outstanding balance with the policy of `original`. Installments
/// before the affected one are returned untouched.
///
/// When no installment qualifies the schedule is returned unchanged. The
/// result is not persisted; the caller replaces the stored tail.
pub fn recalculate_after_partial_payment(
    schedule: &[Installment],
    payment_date: NaiveDate,
    paid_amount: Money,
    original: &ScheduleParams,
) -> ContractResult<Vec<Installment>> {
    if paid_amount <= Decimal::ZERO {
        return Err(ContractError::invalid(
            "paid_amount",
            "Paid amount must be positive",
        ));
    }
    if schedule.len() > original.term as usize {
        return Err(ContractError::invalid(
            "schedule",
            format!(
                "Schedule has {} installments but the term is {}",
                schedule.len(),
                original.term
            ),
        ));
    }

    let Some(index) = schedule
        .iter()
        .position(|i| i.due_date >= payment_date && i.total_amount > paid_amount)
    else {
        tracing::debug!(%payment_date, %paid_amount, "no installment affected by partial payment");
        return Ok(schedule.to_vec());
    };

    let scale = original.rounding_scale;
    let current = &schedule[index];
    let ratio = paid_amount / current.total_amount;
    let paid_principal = round_money(current.principal_amount * ratio, scale);

    let prior_balance = if index == 0 {
        original.principal
    } else {
        schedule[index - 1].remaining_balance
    };
    let outstanding = prior_balance - paid_principal;

    let unpaid_total = current.total_amount - paid_amount;
    let unpaid_principal = current.principal_amount - paid_principal;
    let affected = Installment {
        installment_number: current.installment_number,
        due_date: current.due_date,
        principal_amount: unpaid_principal,
        interest_amount: unpaid_total - unpaid_principal,
        total_amount: unpaid_total,
        remaining_balance: outstanding,
    };

    let remaining_term = original.term - (index as u32 + 1);
    let tail = if remaining_term > 0 && outstanding > Decimal::ZERO {
        generate_schedule(&tail_params(original, index, remaining_term, outstanding, affected.due_date))?
    } else {
        Vec::new()
    };

    tracing::debug!(
        affected = current.installment_number,
        %paid_amount,
        %outstanding,
        regenerated = tail.len(),
        "recalculated schedule after partial payment"
    );

    let revised = schedule[..index]
        .iter()
        .cloned()
        .chain(std::iter::once(affected))
        .chain(tail)
        .enumerate()
        .map(|(n, mut item)| {
            item.installment_number = n as u32 + 1;
            item
        })
        .collect();
    Ok(revised)
}

/// Terms for the regenerated tail. Installment 1 of the tail falls due one
/// period after the affected installment; unused grace carries over.
fn tail_params(
    original: &ScheduleParams,
    index: usize,
    remaining_term: u32,
    outstanding: Money,
    affected_due: NaiveDate,
) -> ScheduleParams {
    let grace = original
        .grace()
        .saturating_sub(index as u32 + 1)
        .min(remaining_term - 1);
    ScheduleParams {
        principal: outstanding,
        term: remaining_term,
        start_date: affected_due,
        grace_period: (grace > 0).then_some(grace),
        balloon_payment: original.balloon_payment.map(|b| b.min(outstanding)),
        ..original.clone()
    }
}

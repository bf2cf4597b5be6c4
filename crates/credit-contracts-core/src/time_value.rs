use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::ContractError;
use crate::types::{Money, Rate};
use crate::ContractResult;

/// Compound growth factor `(1 + rate)^nper`.
///
/// Fails with `InvalidInput` on `term` when the factor exceeds the Decimal
/// range, e.g. very high rates compounded over many periods.
pub fn growth_factor(rate: Rate, nper: u32) -> ContractResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(nper))
        .ok_or_else(|| overflow(rate, nper))
}

fn overflow(rate: Rate, nper: u32) -> ContractError {
    ContractError::InvalidInput {
        field: "term".into(),
        reason: format!("Compounding {rate} per period over {nper} periods overflows"),
    }
}

/// Level payment that amortizes `principal` over `nper` periods at the
/// periodic `rate`: `M = P·r·(1+r)^n / ((1+r)^n − 1)`.
///
/// Returned as a positive amount. A zero rate spreads the principal evenly.
pub fn level_payment(rate: Rate, nper: u32, principal: Money) -> ContractResult<Money> {
    if nper == 0 {
        return Err(ContractError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if rate < Decimal::ZERO {
        return Err(ContractError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate must not be negative".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = growth_factor(rate, nper)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(ContractError::InvalidInput {
            field: "rate".into(),
            reason: "Rate too small to amortize over the requested periods".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| overflow(rate, nper))
}

/// Value today of `amount` received `nper` periods from now.
pub fn discount(amount: Money, rate: Rate, nper: u32) -> ContractResult<Money> {
    if rate.is_zero() || nper == 0 {
        return Ok(amount);
    }
    Ok(amount / growth_factor(rate, nper)?)
}

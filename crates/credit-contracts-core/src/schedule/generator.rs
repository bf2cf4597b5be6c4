//! Schedule generation for the four amortization policies.

use rust_decimal::Decimal;

use super::calendar::add_periods;
use super::{AmortizationType, Installment, ScheduleParams};
use crate::error::ContractError;
use crate::time_value::{discount, level_payment};
use crate::types::{round_money, Money, Rate};
use crate::ContractResult;

const MAX_ROUNDING_SCALE: u32 = 12;

/// Generate the full installment list for `params`.
///
/// Grace installments come first and pay interest only. The remaining
/// `term - grace` installments follow the requested policy; balloon without
/// a balloon amount is generated exactly as constant.
pub fn generate_schedule(params: &ScheduleParams) -> ContractResult<Vec<Installment>> {
    validate_schedule_params(params)?;

    let mut builder = ScheduleBuilder::new(params);
    for _ in 0..params.grace() {
        builder.push_interest_only()?;
    }

    let amortizing = params.term - params.grace();
    match params.effective_amortization() {
        AmortizationType::Constant => builder.constant(amortizing)?,
        AmortizationType::Degressive => builder.degressive(amortizing)?,
        AmortizationType::Balloon => {
            let balloon = params.balloon_payment.unwrap_or(Decimal::ZERO);
            builder.balloon(amortizing, balloon)?
        }
        AmortizationType::Bullet => builder.bullet(amortizing)?,
    }

    let items = builder.finish();
    tracing::debug!(
        policy = ?params.effective_amortization(),
        installments = items.len(),
        principal = %params.principal,
        "generated repayment schedule"
    );
    Ok(items)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_schedule_params(params: &ScheduleParams) -> ContractResult<()> {
    if params.principal <= Decimal::ZERO {
        return Err(ContractError::invalid("principal", "Principal must be positive"));
    }
    if params.annual_rate < Decimal::ZERO {
        return Err(ContractError::invalid(
            "annual_rate",
            "Interest rate must not be negative",
        ));
    }
    if params.term == 0 {
        return Err(ContractError::invalid("term", "Term must be at least 1 period"));
    }
    if params.grace() >= params.term {
        return Err(ContractError::invalid(
            "grace_period",
            format!(
                "Grace period ({}) must be shorter than the term ({})",
                params.grace(),
                params.term
            ),
        ));
    }
    if let Some(balloon) = params.balloon_payment {
        if balloon < Decimal::ZERO || balloon > params.principal {
            return Err(ContractError::invalid(
                "balloon_payment",
                "Balloon payment must be between 0 and the principal",
            ));
        }
    }
    if params.rounding_scale > MAX_ROUNDING_SCALE {
        return Err(ContractError::invalid(
            "rounding_scale",
            format!("Rounding scale must be at most {MAX_ROUNDING_SCALE}"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Accumulates installments while tracking the outstanding principal.
struct ScheduleBuilder<'a> {
    params: &'a ScheduleParams,
    rate: Rate,
    balance: Money,
    items: Vec<Installment>,
}

impl<'a> ScheduleBuilder<'a> {
    fn new(params: &'a ScheduleParams) -> Self {
        Self {
            params,
            rate: params.periodic_rate(),
            balance: params.principal,
            items: Vec::with_capacity(params.term as usize),
        }
    }

    fn round(&self, amount: Money) -> Money {
        round_money(amount, self.params.rounding_scale)
    }

    fn interest_due(&self) -> Money {
        self.round(self.balance * self.rate)
    }

    fn push(&mut self, principal: Money, interest: Money) -> ContractResult<()> {
        let number = self.items.len() as u32 + 1;
        let due_date = add_periods(self.params.start_date, self.params.frequency, number)?;
        self.balance -= principal;
        self.items.push(Installment {
            installment_number: number,
            due_date,
            principal_amount: principal,
            interest_amount: interest,
            total_amount: principal + interest,
            remaining_balance: self.balance,
        });
        Ok(())
    }

    fn push_interest_only(&mut self) -> ContractResult<()> {
        let interest = self.interest_due();
        self.push(Decimal::ZERO, interest)
    }

    /// Final installment: settles whatever principal is left, rounding residue included.
    fn push_final(&mut self) -> ContractResult<()> {
        let interest = self.interest_due();
        let principal = self.balance;
        self.push(principal, interest)
    }

    /// Principal for a non-final installment, never more than is outstanding.
    fn capped(&self, principal: Money) -> Money {
        principal.max(Decimal::ZERO).min(self.balance)
    }

    /// Level payments over `periods`, principal = payment − interest.
    fn level_installments(&mut self, periods: u32, payment: Money) -> ContractResult<()> {
        for _ in 0..periods {
            let interest = self.interest_due();
            let principal = self.capped(payment - interest);
            self.push(principal, interest)?;
        }
        Ok(())
    }

    fn constant(&mut self, periods: u32) -> ContractResult<()> {
        let payment = self.round(level_payment(self.rate, periods, self.balance)?);
        self.level_installments(periods - 1, payment)?;
        self.push_final()
    }

    fn degressive(&mut self, periods: u32) -> ContractResult<()> {
        let level_principal = self.round(self.balance / Decimal::from(periods));
        for _ in 0..periods - 1 {
            let interest = self.interest_due();
            let principal = self.capped(level_principal);
            self.push(principal, interest)?;
        }
        self.push_final()
    }

    /// Annuity on `balance − balloon/(1+r)^(n−1)` over `n − 1` periods, after
    /// which exactly the balloon remains and is settled by the last installment.
    fn balloon(&mut self, periods: u32, balloon: Money) -> ContractResult<()> {
        if periods > 1 {
            let amortized = self.balance - discount(balloon, self.rate, periods - 1)?;
            let payment = self.round(level_payment(self.rate, periods - 1, amortized)?);
            self.level_installments(periods - 1, payment)?;
        }
        self.push_final()
    }

    fn bullet(&mut self, periods: u32) -> ContractResult<()> {
        for _ in 0..periods - 1 {
            self.push_interest_only()?;
        }
        self.push_final()
    }

    fn finish(self) -> Vec<Installment> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::PaymentFrequency;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn params(policy: AmortizationType) -> ScheduleParams {
        ScheduleParams {
            principal: dec!(1_200_000),
            annual_rate: dec!(12),
            term: 12,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            frequency: PaymentFrequency::Monthly,
            amortization_type: policy,
            grace_period: None,
            balloon_payment: None,
            rounding_scale: 2,
        }
    }

    fn total_principal(items: &[Installment]) -> Money {
        items.iter().map(|i| i.principal_amount).sum()
    }

    // -----------------------------------------------------------------------
    // Constant
    // -----------------------------------------------------------------------

    #[test]
    fn test_constant_reference_scenario() {
        let items = generate_schedule(&params(AmortizationType::Constant)).unwrap();
        assert_eq!(items.len(), 12);

        // M = 1.2M · 0.01 · 1.01^12 / (1.01^12 − 1) ≈ 106,618.55
        for item in &items {
            assert!(
                (item.total_amount - dec!(106618.55)).abs() <= dec!(0.10),
                "installment {} total {}",
                item.installment_number,
                item.total_amount
            );
        }
        assert_eq!(items[0].interest_amount, dec!(12000.00));
        assert_eq!(items[11].remaining_balance, Decimal::ZERO);
        assert_eq!(total_principal(&items), dec!(1_200_000));
    }

    #[test]
    fn test_constant_sum_principal_exact_across_terms() {
        let cases = [
            (dec!(1000), dec!(7.5), 7u32, PaymentFrequency::Monthly),
            (dec!(250_000), dec!(18), 20, PaymentFrequency::Quarterly),
            (dec!(999_999.99), dec!(3.25), 9, PaymentFrequency::Biannual),
            (dec!(12_345.67), dec!(0), 5, PaymentFrequency::Annual),
            (dec!(50), dec!(99), 36, PaymentFrequency::Monthly),
        ];
        for (principal, rate, term, frequency) in cases {
            let mut p = params(AmortizationType::Constant);
            p.principal = principal;
            p.annual_rate = rate;
            p.term = term;
            p.frequency = frequency;
            let items = generate_schedule(&p).unwrap();
            assert_eq!(items.len(), term as usize);
            assert_eq!(total_principal(&items), principal, "case {principal}/{rate}/{term}");
            assert_eq!(items.last().unwrap().remaining_balance, Decimal::ZERO);
        }
    }

    #[test]
    fn test_constant_zero_rate_spreads_evenly() {
        let mut p = params(AmortizationType::Constant);
        p.principal = dec!(1000);
        p.annual_rate = Decimal::ZERO;
        p.term = 3;
        let items = generate_schedule(&p).unwrap();
        assert_eq!(items[0].principal_amount, dec!(333.33));
        assert_eq!(items[1].principal_amount, dec!(333.33));
        assert_eq!(items[2].principal_amount, dec!(333.34));
        assert!(items.iter().all(|i| i.interest_amount.is_zero()));
    }

    // -----------------------------------------------------------------------
    // Degressive
    // -----------------------------------------------------------------------

    #[test]
    fn test_degressive_level_principal_declining_total() {
        let mut p = params(AmortizationType::Degressive);
        p.principal = dec!(100_000);
        p.term = 7;
        let items = generate_schedule(&p).unwrap();

        let level = items[0].principal_amount;
        assert_eq!(level, dec!(14285.71));
        for item in &items[..items.len() - 1] {
            assert_eq!(item.principal_amount, level);
        }
        assert_eq!(items[6].principal_amount, dec!(14285.74));
        assert_eq!(total_principal(&items), dec!(100_000));
        for pair in items.windows(2) {
            assert!(pair[1].total_amount < pair[0].total_amount);
        }
    }

    // -----------------------------------------------------------------------
    // Bullet
    // -----------------------------------------------------------------------

    #[test]
    fn test_bullet_interest_only_then_full_principal() {
        let items = generate_schedule(&params(AmortizationType::Bullet)).unwrap();
        for item in &items[..11] {
            assert_eq!(item.principal_amount, Decimal::ZERO);
            assert_eq!(item.interest_amount, dec!(12000.00));
            assert_eq!(item.remaining_balance, dec!(1_200_000));
        }
        assert_eq!(items[11].principal_amount, dec!(1_200_000));
        assert_eq!(items[11].total_amount, dec!(1_212_000.00));
        assert_eq!(items[11].remaining_balance, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // Balloon
    // -----------------------------------------------------------------------

    #[test]
    fn test_balloon_without_amount_matches_constant() {
        let balloon = generate_schedule(&params(AmortizationType::Balloon)).unwrap();
        let constant = generate_schedule(&params(AmortizationType::Constant)).unwrap();
        assert_eq!(balloon, constant);
        assert_eq!(
            serde_json::to_string(&balloon).unwrap(),
            serde_json::to_string(&constant).unwrap()
        );
    }

    #[test]
    fn test_balloon_final_installment_carries_lump_sum() {
        let mut p = params(AmortizationType::Balloon);
        p.principal = dec!(100_000);
        p.balloon_payment = Some(dec!(40_000));
        let items = generate_schedule(&p).unwrap();

        assert_eq!(items.len(), 12);
        let last = items.last().unwrap();
        assert!(
            (last.principal_amount - dec!(40_000)).abs() < dec!(1),
            "final principal {}",
            last.principal_amount
        );
        let level = items[0].total_amount;
        for item in &items[..11] {
            assert_eq!(item.total_amount, level);
        }
        assert!(last.total_amount > level * dec!(5));
        assert_eq!(total_principal(&items), dec!(100_000));
        assert_eq!(last.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_balloon_single_period() {
        let mut p = params(AmortizationType::Balloon);
        p.principal = dec!(10_000);
        p.term = 1;
        p.balloon_payment = Some(dec!(10_000));
        let items = generate_schedule(&p).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].principal_amount, dec!(10_000));
        assert_eq!(items[0].interest_amount, dec!(100.00));
    }

    // -----------------------------------------------------------------------
    // Grace period and dates
    // -----------------------------------------------------------------------

    #[test]
    fn test_grace_period_interest_only_then_amortizes() {
        let mut p = params(AmortizationType::Degressive);
        p.principal = dec!(90_000);
        p.term = 12;
        p.grace_period = Some(3);
        let items = generate_schedule(&p).unwrap();

        assert_eq!(items.len(), 12);
        for item in &items[..3] {
            assert_eq!(item.principal_amount, Decimal::ZERO);
            assert_eq!(item.interest_amount, dec!(900.00));
            assert_eq!(item.remaining_balance, dec!(90_000));
        }
        // 90,000 / (12 − 3)
        assert_eq!(items[3].principal_amount, dec!(10_000));
        assert_eq!(items[3].installment_number, 4);
        assert_eq!(total_principal(&items), dec!(90_000));
    }

    #[test]
    fn test_grace_period_constant_uses_post_grace_term() {
        let mut p = params(AmortizationType::Constant);
        p.grace_period = Some(2);
        let items = generate_schedule(&p).unwrap();
        let expected = round_money(
            level_payment(dec!(0.01), 10, dec!(1_200_000)).unwrap(),
            2,
        );
        assert_eq!(items[2].total_amount, expected);
        assert_eq!(total_principal(&items), dec!(1_200_000));
    }

    #[test]
    fn test_due_dates_step_by_frequency() {
        let mut p = params(AmortizationType::Constant);
        p.start_date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        p.frequency = PaymentFrequency::Quarterly;
        p.term = 4;
        let items = generate_schedule(&p).unwrap();
        let dates: Vec<_> = items.iter().map(|i| i.due_date.to_string()).collect();
        assert_eq!(dates, vec!["2025-04-30", "2025-07-31", "2025-10-31", "2026-01-31"]);
        let numbers: Vec<_> = items.iter().map(|i| i.installment_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_totals_equal_principal_plus_interest() {
        for policy in [
            AmortizationType::Constant,
            AmortizationType::Degressive,
            AmortizationType::Bullet,
        ] {
            let items = generate_schedule(&params(policy)).unwrap();
            for item in &items {
                assert_eq!(item.total_amount, item.principal_amount + item.interest_amount);
            }
        }
    }

    #[test]
    fn test_small_principal_never_overpays() {
        // 0.05 / 8 rounds up to 0.01, which would overshoot after five installments
        for policy in [AmortizationType::Degressive, AmortizationType::Constant] {
            let mut p = params(policy);
            p.principal = dec!(0.05);
            p.annual_rate = Decimal::ZERO;
            p.term = 8;
            let items = generate_schedule(&p).unwrap();

            assert_eq!(items.len(), 8);
            for item in &items {
                assert!(item.principal_amount >= Decimal::ZERO, "{:?}", item);
                assert!(item.remaining_balance >= Decimal::ZERO, "{:?}", item);
            }
            assert_eq!(total_principal(&items), dec!(0.05));
            assert_eq!(items[4].remaining_balance, Decimal::ZERO);
            assert_eq!(items[7].principal_amount, Decimal::ZERO);
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn test_overflowing_growth_is_rejected_not_panicking() {
        let mut p = params(AmortizationType::Constant);
        p.principal = dec!(1000);
        p.annual_rate = dec!(100);
        p.term = 100;
        p.frequency = PaymentFrequency::Annual;
        match generate_schedule(&p) {
            Err(ContractError::InvalidInput { field, .. }) => assert_eq!(field, "term"),
            other => panic!("Expected InvalidInput on term, got {:?}", other),
        }

        p.amortization_type = AmortizationType::Balloon;
        p.balloon_payment = Some(dec!(500));
        assert!(generate_schedule(&p).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_terms() {
        let mut p = params(AmortizationType::Constant);
        p.principal = Decimal::ZERO;
        match generate_schedule(&p).unwrap_err() {
            ContractError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }

        let mut p = params(AmortizationType::Constant);
        p.grace_period = Some(12);
        match generate_schedule(&p).unwrap_err() {
            ContractError::InvalidInput { field, .. } => assert_eq!(field, "grace_period"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }

        let mut p = params(AmortizationType::Balloon);
        p.balloon_payment = Some(dec!(2_000_000));
        match generate_schedule(&p).unwrap_err() {
            ContractError::InvalidInput { field, .. } => assert_eq!(field, "balloon_payment"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }

        let mut p = params(AmortizationType::Constant);
        p.term = 0;
        assert!(generate_schedule(&p).is_err());
    }
}

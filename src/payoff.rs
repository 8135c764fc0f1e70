use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::error::{AmortizationError, AmortizationResult};
use crate::monthly_rate;

/// Economic parameters of one debt at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtTerms {
    /// Outstanding balance when amortization starts.
    pub principal: Decimal,
    /// The annual interest rate as a percentage (e.g., 18 for 18%).
    pub annual_rate_percent: Decimal,
    /// The regular monthly payment.
    pub payment: Decimal,
    /// An additional fixed amount paid every month on top of `payment`.
    #[serde(default)]
    pub extra_payment: Decimal,
}

impl DebtTerms {
    pub fn new(principal: Decimal, annual_rate_percent: Decimal, payment: Decimal) -> Self {
        DebtTerms {
            principal,
            annual_rate_percent,
            payment,
            extra_payment: Decimal::ZERO,
        }
    }

    pub fn with_extra_payment(mut self, extra_payment: Decimal) -> Self {
        self.extra_payment = extra_payment;
        self
    }

    /// Rejects any negative amount or rate.
    pub fn validate(&self) -> AmortizationResult<()> {
        ensure_non_negative("principal", self.principal)?;
        ensure_non_negative("annual_rate_percent", self.annual_rate_percent)?;
        ensure_non_negative("payment", self.payment)?;
        ensure_non_negative("extra_payment", self.extra_payment)
    }

    /// Regular plus extra payment, saturating at `Decimal::MAX`.
    pub fn effective_payment(&self) -> Decimal {
        self.payment
            .checked_add(self.extra_payment)
            .unwrap_or(Decimal::MAX)
    }

    pub fn monthly_rate(&self) -> Decimal {
        monthly_rate(self.annual_rate_percent)
    }

    /// Months until these terms pay the principal off, counting the extra payment.
    pub fn time_to_payoff(&self) -> AmortizationResult<Payoff> {
        self.validate()?;
        Ok(payoff_months(
            self.principal,
            self.annual_rate_percent,
            self.effective_payment(),
        ))
    }
}

/// Outcome of a payoff calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payoff {
    /// Whole months until the balance reaches zero, truncated toward zero.
    Months(u64),
    /// The payment never outgrows the interest, so the balance never reaches zero.
    Never,
}

impl Payoff {
    pub fn months(&self) -> Option<u64> {
        match self {
            Payoff::Months(months) => Some(*months),
            Payoff::Never => None,
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Payoff::Never)
    }
}

/// Calculates how many whole months `payment` needs to pay `principal` off.
///
/// # Arguments
///
/// * `principal` - The outstanding balance.
/// * `annual_rate_percent` - The annual interest rate as a percentage.
/// * `payment` - The monthly payment.
///
/// # Errors
///
/// Returns [`AmortizationError::InvalidInput`] if any argument is negative.
pub fn time_to_payoff(
    principal: Decimal,
    annual_rate_percent: Decimal,
    payment: Decimal,
) -> AmortizationResult<Payoff> {
    DebtTerms::new(principal, annual_rate_percent, payment).time_to_payoff()
}

/// Same as [`time_to_payoff`], with `extra_payment` added to every monthly payment.
///
/// # Errors
///
/// Returns [`AmortizationError::InvalidInput`] if any argument is negative.
pub fn time_to_payoff_with_supplement(
    principal: Decimal,
    annual_rate_percent: Decimal,
    payment: Decimal,
    extra_payment: Decimal,
) -> AmortizationResult<Payoff> {
    DebtTerms::new(principal, annual_rate_percent, payment)
        .with_extra_payment(extra_payment)
        .time_to_payoff()
}

pub(crate) fn ensure_non_negative(field: &'static str, value: Decimal) -> AmortizationResult<()> {
    if value < Decimal::ZERO {
        return Err(AmortizationError::invalid(
            field,
            format!("must not be negative, got {}", value),
        ));
    }
    Ok(())
}

// Inputs are already validated.
fn payoff_months(
    principal: Decimal,
    annual_rate_percent: Decimal,
    effective_payment: Decimal,
) -> Payoff {
    if effective_payment <= Decimal::ZERO {
        tracing::debug!(%principal, "no payment, debt is never paid off");
        return Payoff::Never;
    }

    if annual_rate_percent <= Decimal::ZERO {
        return Payoff::Months(whole_months_without_interest(principal, effective_payment));
    }

    let rate = monthly_rate(annual_rate_percent);
    let accrual = match principal.checked_mul(rate) {
        Some(accrual) if accrual < effective_payment => accrual,
        _ => {
            tracing::debug!(
                %principal,
                %annual_rate_percent,
                %effective_payment,
                "interest outgrows payment, debt is never paid off"
            );
            return Payoff::Never;
        }
    };

    // n = -ln(1 - P*r/A) / ln(1 + r), with 0 <= P*r/A < 1 here.
    let ratio = accrual / effective_payment;
    let numerator = match (Decimal::ONE - ratio).checked_ln() {
        Some(ln) => -ln,
        None => return Payoff::Never,
    };
    let periods = (Decimal::ONE + rate)
        .checked_ln()
        .filter(|ln| !ln.is_zero())
        .and_then(|ln| numerator.checked_div(ln));

    match periods {
        Some(periods) => Payoff::Months(truncate_periods(periods)),
        // A positive rate too small to register in ln(1 + r) behaves like no interest.
        None => Payoff::Months(whole_months_without_interest(principal, effective_payment)),
    }
}

fn whole_months_without_interest(principal: Decimal, effective_payment: Decimal) -> u64 {
    principal
        .checked_div(effective_payment)
        .map_or(u64::MAX, truncate_periods)
}

fn truncate_periods(periods: Decimal) -> u64 {
    if periods <= Decimal::ZERO {
        return 0;
    }
    periods.trunc().to_u64().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(1200), dec!(100), 12)]
    #[case(dec!(1000), dec!(300), 3)]
    #[case(dec!(99), dec!(100), 0)]
    #[case(dec!(0), dec!(50), 0)]
    fn test_zero_rate_truncates_division(
        #[case] principal: Decimal,
        #[case] payment: Decimal,
        #[case] expected: u64,
    ) {
        let payoff = time_to_payoff(principal, dec!(0), payment).unwrap();
        assert_eq!(payoff, Payoff::Months(expected));
    }

    #[rstest]
    #[case(dec!(1000), dec!(12), dec!(100), 10)]
    #[case(dec!(5000), dec!(18), dec!(100), 93)]
    #[case(dec!(10000), dec!(24), dec!(250), 81)]
    #[case(dec!(0), dec!(12), dec!(100), 0)]
    fn test_general_formula(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] payment: Decimal,
        #[case] expected: u64,
    ) {
        let payoff = time_to_payoff(principal, rate, payment).unwrap();
        assert_eq!(payoff, Payoff::Months(expected));
    }

    #[rstest]
    #[case(dec!(10000), dec!(24), dec!(100))]
    #[case(dec!(12000), dec!(12), dec!(120))]
    #[case(dec!(5000), dec!(0), dec!(0))]
    #[case(dec!(5000), dec!(18), dec!(0))]
    #[case(dec!(0), dec!(0), dec!(0))]
    fn test_never_payoff(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] payment: Decimal,
    ) {
        let payoff = time_to_payoff(principal, rate, payment).unwrap();
        assert!(payoff.is_never());
        assert_eq!(payoff.months(), None);
    }

    #[test]
    fn test_huge_rate_is_never_not_a_panic() {
        let payoff = time_to_payoff(dec!(1000000000000000000000), Decimal::MAX, dec!(100)).unwrap();
        assert_eq!(payoff, Payoff::Never);
    }

    #[rstest]
    #[case(dec!(-1), dec!(10), dec!(100), "principal")]
    #[case(dec!(1000), dec!(-0.5), dec!(100), "annual_rate_percent")]
    #[case(dec!(1000), dec!(10), dec!(-100), "payment")]
    fn test_negative_input_is_rejected(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] payment: Decimal,
        #[case] field: &str,
    ) {
        let err = time_to_payoff(principal, rate, payment).unwrap_err();
        assert_eq!(err.field(), field);
    }

    #[test]
    fn test_negative_extra_payment_is_rejected() {
        let err = time_to_payoff_with_supplement(dec!(1000), dec!(10), dec!(100), dec!(-1))
            .unwrap_err();
        assert_eq!(err.field(), "extra_payment");
    }

    #[test]
    fn test_rate_above_one_hundred_is_allowed() {
        // 240% a year: 20% a month on 100 is 20, paying 50.
        let payoff = time_to_payoff(dec!(100), dec!(240), dec!(50)).unwrap();
        assert!(payoff.months().is_some());
    }

    #[rstest]
    #[case(dec!(1000), dec!(12), dec!(100), dec!(100), 5)]
    #[case(dec!(10000), dec!(24), dec!(100), dec!(150), 81)]
    #[case(dec!(1200), dec!(0), dec!(0), dec!(100), 12)]
    #[case(dec!(1200), dec!(0), dec!(100), dec!(0), 12)]
    fn test_supplement(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] payment: Decimal,
        #[case] extra: Decimal,
        #[case] expected: u64,
    ) {
        let payoff = time_to_payoff_with_supplement(principal, rate, payment, extra).unwrap();
        assert_eq!(payoff, Payoff::Months(expected));
    }

    #[test]
    fn test_supplement_rescues_never_payoff() {
        assert_eq!(time_to_payoff(dec!(10000), dec!(24), dec!(100)).unwrap(), Payoff::Never);
        assert!(
            time_to_payoff_with_supplement(dec!(10000), dec!(24), dec!(100), dec!(150))
                .unwrap()
                .months()
                .is_some()
        );
    }

    #[test]
    fn test_supplement_never_takes_longer() {
        let principal = dec!(8000);
        let rate = dec!(15);
        let payment = dec!(150);
        let base = time_to_payoff(principal, rate, payment).unwrap().months().unwrap();

        let mut extra = dec!(0);
        while extra <= dec!(500) {
            let with_extra = time_to_payoff_with_supplement(principal, rate, payment, extra)
                .unwrap()
                .months()
                .unwrap();
            assert!(with_extra <= base, "extra {} gave {} > {}", extra, with_extra, base);
            extra += dec!(25);
        }
    }

    #[test]
    fn test_larger_payment_never_takes_longer() {
        let mut previous = u64::MAX;
        let mut payment = dec!(80);
        while payment <= dec!(1000) {
            let months = time_to_payoff(dec!(5000), dec!(18), payment)
                .unwrap()
                .months()
                .unwrap();
            assert!(months <= previous, "payment {} gave {} > {}", payment, months, previous);
            previous = months;
            payment += dec!(20);
        }
    }

    #[test]
    fn test_terms_method_matches_free_function() {
        let terms = DebtTerms::new(dec!(5000), dec!(18), dec!(100)).with_extra_payment(dec!(50));
        assert_eq!(terms.effective_payment(), dec!(150));
        assert_eq!(terms.monthly_rate(), dec!(0.015));
        assert_eq!(
            terms.time_to_payoff().unwrap(),
            time_to_payoff_with_supplement(dec!(5000), dec!(18), dec!(100), dec!(50)).unwrap()
        );
    }

    #[test]
    fn test_repeated_calls_agree() {
        let first = time_to_payoff(dec!(7321.55), dec!(21.9), dec!(245)).unwrap();
        for _ in 0..5 {
            assert_eq!(time_to_payoff(dec!(7321.55), dec!(21.9), dec!(245)).unwrap(), first);
        }
    }
}

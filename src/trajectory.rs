use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AmortizationError, AmortizationResult};
use crate::monthly_rate;
use crate::payoff::ensure_non_negative;

/// Default simulation horizon: ten years of monthly periods.
pub const DEFAULT_HORIZON: u32 = 120;

/// Remaining balance after each simulated month, month 1 first.
///
/// Every entry is non-negative. If the debt is paid off within the horizon the
/// last entry is zero and no entry before it is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceTrajectory {
    balances: Vec<Decimal>,
}

impl BalanceTrajectory {
    pub fn balances(&self) -> &[Decimal] {
        &self.balances
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn last(&self) -> Option<Decimal> {
        self.balances.last().copied()
    }

    /// True when the simulation reached a zero balance before the horizon ran out.
    pub fn paid_off(&self) -> bool {
        self.last().is_some_and(|balance| balance.is_zero())
    }

    /// `(month, balance)` pairs with months numbered from 1, ready for charting.
    pub fn points(&self) -> impl Iterator<Item = (u32, Decimal)> + '_ {
        (1u32..).zip(self.balances.iter().copied())
    }
}

impl IntoIterator for BalanceTrajectory {
    type Item = Decimal;
    type IntoIter = std::vec::IntoIter<Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.balances.into_iter()
    }
}

/// Simulates the remaining balance month by month.
///
/// Each month the balance accrues `annual_rate_percent / 12 / 100` interest and
/// `payment` is subtracted; the recorded value is clamped at zero. The
/// simulation stops after the first month that reaches zero, or after
/// `horizon` months, whichever comes first.
///
/// # Errors
///
/// Returns [`AmortizationError::InvalidInput`] if an amount or the rate is
/// negative, or if `horizon` is zero.
pub fn balance_trajectory(
    principal: Decimal,
    annual_rate_percent: Decimal,
    payment: Decimal,
    horizon: u32,
) -> AmortizationResult<BalanceTrajectory> {
    ensure_non_negative("principal", principal)?;
    ensure_non_negative("annual_rate_percent", annual_rate_percent)?;
    ensure_non_negative("payment", payment)?;
    if horizon == 0 {
        return Err(AmortizationError::invalid("horizon", "must be at least one month"));
    }

    let rate = monthly_rate(annual_rate_percent);
    let mut balance = principal;
    let mut balances = Vec::new();

    for _ in 0..horizon {
        if balance <= Decimal::ZERO {
            break;
        }

        // Saturate instead of overflowing on a runaway balance.
        let grown = balance
            .checked_mul(rate)
            .and_then(|interest| balance.checked_add(interest))
            .unwrap_or(Decimal::MAX);
        balance = grown - payment;
        balances.push(balance.max(Decimal::ZERO));
    }

    tracing::trace!(
        %principal,
        %annual_rate_percent,
        %payment,
        months = balances.len(),
        "balance trajectory simulated"
    );

    Ok(BalanceTrajectory { balances })
}

/// [`balance_trajectory`] with the [`DEFAULT_HORIZON`] of 120 months.
pub fn balance_trajectory_default(
    principal: Decimal,
    annual_rate_percent: Decimal,
    payment: Decimal,
) -> AmortizationResult<BalanceTrajectory> {
    balance_trajectory(principal, annual_rate_percent, payment, DEFAULT_HORIZON)
}

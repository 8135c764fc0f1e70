//! Caller-owned list of named debts and the summaries built from it.
//!
//! The engine functions know nothing about collections of debts. A
//! [`DebtLedger`] is the explicit state a presentation layer keeps between
//! interactions: it validates what the user entered, remembers debts in the
//! order they were added and turns them into payoff summaries and chart series.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AmortizationError;
use crate::payoff::{DebtTerms, Payoff, time_to_payoff, time_to_payoff_with_supplement};
use crate::trajectory::{DEFAULT_HORIZON, balance_trajectory};

/// A `#rrggbb` color used for a debt's line in a chart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineColor(String);

impl LineColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LineColor {
    fn default() -> Self {
        LineColor("#00f900".to_string())
    }
}

impl FromStr for LineColor {
    type Err = AmortizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').ok_or_else(|| {
            AmortizationError::invalid("line_color", format!("'{}' must start with '#'", s))
        })?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AmortizationError::invalid(
                "line_color",
                format!("'{}' is not a #rrggbb color", s),
            ));
        }
        Ok(LineColor(format!("#{}", hex.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for LineColor {
    type Error = AmortizationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LineColor> for String {
    fn from(color: LineColor) -> Self {
        color.0
    }
}

impl fmt::Display for LineColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Settings for a [`DebtLedger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Months simulated for each chart series.
    pub horizon: u32,
    /// Highest annual rate, in percent, the ledger accepts for a debt.
    pub max_annual_rate_percent: Decimal,
    /// Color given to debts added without one.
    pub default_line_color: LineColor,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            horizon: DEFAULT_HORIZON,
            max_annual_rate_percent: dec!(100),
            default_line_color: LineColor::default(),
        }
    }
}

impl LedgerConfig {
    /// Parses a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: LedgerConfig =
            serde_json::from_str(json).context("failed to parse ledger config")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a zero horizon or a negative rate cap.
    pub fn validate(&self) -> Result<(), AmortizationError> {
        if self.horizon == 0 {
            return Err(AmortizationError::invalid("horizon", "must be at least one month"));
        }
        if self.max_annual_rate_percent < Decimal::ZERO {
            return Err(AmortizationError::invalid(
                "max_annual_rate_percent",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

/// One debt as the user entered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub name: String,
    pub terms: DebtTerms,
    /// Loan length as entered; shown to the user, never used in the math.
    #[serde(default)]
    pub loan_length_months: u32,
    /// `None` means the ledger's default color.
    #[serde(default)]
    pub line_color: Option<LineColor>,
}

impl DebtRecord {
    pub fn new(name: impl Into<String>, terms: DebtTerms) -> Self {
        DebtRecord {
            name: name.into(),
            terms,
            loan_length_months: 0,
            line_color: None,
        }
    }

    pub fn with_loan_length(mut self, months: u32) -> Self {
        self.loan_length_months = months;
        self
    }

    pub fn with_line_color(mut self, color: LineColor) -> Self {
        self.line_color = Some(color);
        self
    }
}

/// Payoff outcome for one debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffSummary {
    pub name: String,
    pub principal: Decimal,
    pub payoff: Payoff,
}

/// Remaining-balance line for one debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub line_color: LineColor,
    /// `(month, remaining balance)`, months numbered from 1.
    pub points: Vec<(u32, Decimal)>,
}

/// What a fixed extra monthly payment does to every debt and to the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPaymentPlan {
    pub extra_payment: Decimal,
    /// Each debt's payoff with the extra payment added to its own payment.
    pub per_debt: Vec<PayoffSummary>,
    /// Total debt once the extra amount has been applied to it a single time.
    pub remaining_total: Decimal,
    /// All regular payments plus the extra payment.
    pub total_monthly_payment: Decimal,
    /// Months to clear `remaining_total` at `total_monthly_payment`, ignoring interest.
    pub combined_payoff: Payoff,
}

/// Ordered collection of debts, owned by the caller.
///
/// A deserialized ledger goes through the same checks as [`DebtLedger::add`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "StoredLedger")]
pub struct DebtLedger {
    config: LedgerConfig,
    debts: Vec<DebtRecord>,
}

#[derive(Deserialize)]
struct StoredLedger {
    #[serde(default)]
    config: LedgerConfig,
    #[serde(default)]
    debts: Vec<DebtRecord>,
}

impl TryFrom<StoredLedger> for DebtLedger {
    type Error = anyhow::Error;

    fn try_from(stored: StoredLedger) -> anyhow::Result<Self> {
        stored.config.validate().context("invalid ledger config")?;
        let mut ledger = DebtLedger::new(stored.config);
        for debt in stored.debts {
            ledger.add(debt)?;
        }
        Ok(ledger)
    }
}

impl DebtLedger {
    pub fn new(config: LedgerConfig) -> Self {
        DebtLedger {
            config,
            debts: Vec::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Validates and appends a debt.
    ///
    /// Debts sharing a name are kept as separate entries; their principals are
    /// summed in [`DebtLedger::totals_by_name`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, any amount or the rate is
    /// negative, or the rate exceeds the configured maximum.
    pub fn add(&mut self, record: DebtRecord) -> anyhow::Result<()> {
        if record.name.trim().is_empty() {
            return Err(AmortizationError::invalid("name", "debt name must not be blank").into());
        }

        record
            .terms
            .validate()
            .with_context(|| format!("cannot add debt '{}'", record.name))?;

        let max_rate = self.config.max_annual_rate_percent;
        if record.terms.annual_rate_percent > max_rate {
            return Err(AmortizationError::invalid(
                "annual_rate_percent",
                format!("must be between 0% and {}%", max_rate),
            ))
            .with_context(|| format!("cannot add debt '{}'", record.name));
        }

        tracing::info!(
            debt = %record.name,
            principal = %record.terms.principal,
            rate = %record.terms.annual_rate_percent,
            payment = %record.terms.payment,
            "debt added"
        );
        self.debts.push(record);
        Ok(())
    }

    pub fn debts(&self) -> &[DebtRecord] {
        &self.debts
    }

    pub fn len(&self) -> usize {
        self.debts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.debts.is_empty()
    }

    /// Principal owed per debt name, saturating at `Decimal::MAX`.
    pub fn totals_by_name(&self) -> BTreeMap<String, Decimal> {
        let mut totals = BTreeMap::new();
        for debt in &self.debts {
            let total = totals.entry(debt.name.clone()).or_insert(Decimal::ZERO);
            *total = saturating_add(*total, debt.terms.principal);
        }
        totals
    }

    /// Principal owed across every debt, saturating at `Decimal::MAX`.
    pub fn total_debt(&self) -> Decimal {
        saturating_sum(self.debts.iter().map(|debt| debt.terms.principal))
    }

    /// Payoff of each debt at its regular payment, in insertion order.
    pub fn payoff_summaries(&self) -> anyhow::Result<Vec<PayoffSummary>> {
        self.debts
            .iter()
            .map(|debt| -> anyhow::Result<PayoffSummary> {
                let terms = &debt.terms;
                let payoff =
                    time_to_payoff(terms.principal, terms.annual_rate_percent, terms.payment)
                        .with_context(|| {
                            format!("cannot compute payoff for debt '{}'", debt.name)
                        })?;
                Ok(summary(&debt.name, terms.principal, payoff))
            })
            .collect()
    }

    /// Remaining-balance series for each debt over the configured horizon.
    pub fn chart_series(&self) -> anyhow::Result<Vec<ChartSeries>> {
        self.debts
            .iter()
            .map(|debt| -> anyhow::Result<ChartSeries> {
                let terms = &debt.terms;
                let trajectory = balance_trajectory(
                    terms.principal,
                    terms.annual_rate_percent,
                    terms.payment,
                    self.config.horizon,
                )
                .with_context(|| format!("cannot simulate debt '{}'", debt.name))?;

                Ok(ChartSeries {
                    name: debt.name.clone(),
                    line_color: debt
                        .line_color
                        .clone()
                        .unwrap_or_else(|| self.config.default_line_color.clone()),
                    points: trajectory.points().collect(),
                })
            })
            .collect()
    }

    /// Applies a fixed extra monthly payment to every debt and to the total.
    ///
    /// The combined payoff treats the whole balance as interest-free, so it is
    /// a rough lower bound rather than an exact schedule.
    ///
    /// # Errors
    ///
    /// Returns an error unless `extra_payment` is positive.
    pub fn plan_extra_payment(&self, extra_payment: Decimal) -> anyhow::Result<ExtraPaymentPlan> {
        if extra_payment <= Decimal::ZERO {
            return Err(AmortizationError::invalid(
                "extra_payment",
                format!("must be positive, got {}", extra_payment),
            )
            .into());
        }

        let per_debt = self
            .debts
            .iter()
            .map(|debt| -> anyhow::Result<PayoffSummary> {
                let terms = &debt.terms;
                let payoff = time_to_payoff_with_supplement(
                    terms.principal,
                    terms.annual_rate_percent,
                    terms.payment,
                    extra_payment,
                )
                .with_context(|| format!("cannot compute payoff for debt '{}'", debt.name))?;
                Ok(summary(&debt.name, terms.principal, payoff))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let remaining_total = (self.total_debt() - extra_payment).max(Decimal::ZERO);
        let regular_payments = saturating_sum(self.debts.iter().map(|debt| debt.terms.payment));
        let total_monthly_payment = saturating_add(regular_payments, extra_payment);
        let combined_payoff = time_to_payoff(remaining_total, Decimal::ZERO, total_monthly_payment)
            .context("cannot compute combined payoff")?;

        tracing::info!(
            %extra_payment,
            %remaining_total,
            %total_monthly_payment,
            months = ?combined_payoff.months(),
            "extra payment plan computed"
        );

        Ok(ExtraPaymentPlan {
            extra_payment,
            per_debt,
            remaining_total,
            total_monthly_payment,
            combined_payoff,
        })
    }
}

// Amounts here are non-negative, so overflow only happens upward.
fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::MAX)
}

fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, saturating_add)
}

fn summary(name: &str, principal: Decimal, payoff: Payoff) -> PayoffSummary {
    if payoff.is_never() {
        tracing::warn!(debt = %name, "debt can never be paid off at this payment");
    }
    PayoffSummary {
        name: name.to_string(),
        principal,
        payoff,
    }
}

//! `debt_payoff` is a Rust library for answering two questions about a debt:
//! how many months until it is paid off, and what the remaining balance looks
//! like month by month.
//!
//! It provides:
//! - **Payoff calculator**: a closed-form count of whole months needed to
//!   extinguish a debt, optionally with an extra monthly payment, or
//!   [`Payoff::Never`] when the payment cannot beat the interest.
//! - **Trajectory simulator**: the month-by-month remaining balance, bounded by
//!   a horizon (120 months by default) so a runaway debt stays finite.
//! - **Debt ledger**: an ordered list of named debts owned by the caller, with
//!   per-name totals, payoff summaries, chart series and extra-payment plans.
//!
//! ## Usage
//!
//! Add `debt_payoff` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! debt_payoff = "0.1.0"
//! rust_decimal = "1.39.0"
//! rust_decimal_macros = "1.39.0"
//! ```
//!
//! Then ask the engine about a single debt:
//!
//! ```rust
//! use debt_payoff::{balance_trajectory, time_to_payoff, Payoff, DEFAULT_HORIZON};
//! use rust_decimal_macros::dec;
//!
//! fn main() {
//!     // 5,000 at 18% a year, paying 100 a month.
//!     match time_to_payoff(dec!(5000), dec!(18), dec!(100)) {
//!         Ok(Payoff::Months(months)) => println!("Paid off in about {} months", months),
//!         Ok(Payoff::Never) => println!("This payment never pays the debt off"),
//!         Err(e) => eprintln!("Bad input: {}", e),
//!     }
//!
//!     let trajectory =
//!         balance_trajectory(dec!(5000), dec!(18), dec!(100), DEFAULT_HORIZON).unwrap();
//!     for (month, balance) in trajectory.points() {
//!         println!("Month {:>3}: {:.2}", month, balance);
//!     }
//! }
//! ```
//!
//! Month counts are truncated toward zero, never rounded. The closed form
//! therefore slightly underestimates the true payoff time: treat
//! `Payoff::Months(n)` as an approximation, not a promise that the balance is
//! exactly zero after month `n`.

pub mod error;
pub mod ledger;
pub mod payoff;
pub mod trajectory;

use std::sync::Once;

use rust_decimal::Decimal;

pub use error::{AmortizationError, AmortizationResult};
pub use ledger::{
    ChartSeries, DebtLedger, DebtRecord, ExtraPaymentPlan, LedgerConfig, LineColor, PayoffSummary,
};
pub use payoff::{DebtTerms, Payoff, time_to_payoff, time_to_payoff_with_supplement};
pub use trajectory::{
    BalanceTrajectory, DEFAULT_HORIZON, balance_trajectory, balance_trajectory_default,
};

/// Converts an annual percentage rate into the plain monthly rate.
///
/// `12` (percent a year) becomes `0.01` a month. No compounding is applied:
/// the annual rate is simply split over twelve periods.
pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / Decimal::from(12) / Decimal::ONE_HUNDRED
}

static TRACING_INIT: Once = Once::new();

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, defaulting to
/// `debt_payoff=info`.
///
/// Meant for binaries embedding the crate; the library itself never installs a
/// subscriber. Calling it more than once, or after another subscriber was set,
/// is harmless.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "debt_payoff=info".parse() {
            filter = filter.add_directive(directive);
        }

        // Another subscriber may already be installed.
        fmt().with_env_filter(filter).try_init().ok();
        tracing::debug!("debt_payoff tracing initialized");
    });
}

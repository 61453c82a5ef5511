//! Full-repayment annuity loans (Volltilgung).
//!
//! The monthly payment is the level annuity that brings the balance to zero
//! after exactly `term_years * 12` payments. The schedule iterates that
//! payment month by month, splitting it into interest and principal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::defaults::{DEFAULT_ANNUAL_RATE_PCT, DEFAULT_PRINCIPAL, DEFAULT_TERM_YEARS};
use crate::error::FinPlanError;
use crate::loans::schedule::{non_negative, AmortizationRow, ScheduleTotals};
use crate::time_value::{annuity_payment, monthly_rate};
use crate::types::*;
use crate::FinPlanResult;

/// Input for a full-repayment schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityInput {
    /// Loan amount.
    pub principal: Money,
    /// Nominal interest rate, percent per year.
    pub annual_rate_pct: Percent,
    /// Term in whole years.
    pub term_years: u32,
}

impl Default for AnnuityInput {
    /// 200 000 at 3.0% over 25 years.
    fn default() -> Self {
        Self {
            principal: DEFAULT_PRINCIPAL,
            annual_rate_pct: DEFAULT_ANNUAL_RATE_PCT,
            term_years: DEFAULT_TERM_YEARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityOutput {
    pub monthly_payment: Money,
    pub number_of_payments: u32,
    #[serde(flatten)]
    pub totals: ScheduleTotals,
    pub schedule: Vec<AmortizationRow>,
}

impl AnnuityOutput {
    /// Copy with every money value rounded to `dp` places, for display.
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            monthly_payment: self.monthly_payment.round_dp(dp),
            number_of_payments: self.number_of_payments,
            totals: self.totals.rounded(dp),
            schedule: self.schedule.iter().map(|r| r.rounded(dp)).collect(),
        }
    }
}

fn validate(input: &AnnuityInput) -> FinPlanResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(FinPlanError::InvalidInput {
            field: "principal".into(),
            reason: "Loan amount must be positive".into(),
        });
    }
    if input.annual_rate_pct < Decimal::ZERO {
        return Err(FinPlanError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Interest rate must not be negative".into(),
        });
    }
    if input.term_years == 0 {
        return Err(FinPlanError::InvalidInput {
            field: "term_years".into(),
            reason: "Term must be at least 1 year".into(),
        });
    }
    Ok(())
}

/// Compute the level monthly payment and the month-by-month schedule to payoff.
pub fn compute_annuity_schedule(
    input: &AnnuityInput,
) -> FinPlanResult<ComputationOutput<AnnuityOutput>> {
    let start = Instant::now();
    validate(input)?;

    let rate = monthly_rate(input.annual_rate_pct);
    let n = input
        .term_years
        .checked_mul(12)
        .ok_or_else(|| FinPlanError::InvalidInput {
            field: "term_years".into(),
            reason: "Term is too long".into(),
        })?;

    let payment = annuity_payment(input.principal, rate, n).map_err(|e| match e {
        FinPlanError::InvalidInput { reason, .. } => FinPlanError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason,
        },
        other => other,
    })?;

    let (schedule, _) = (1..=n).fold(
        (Vec::with_capacity(n as usize), input.principal),
        |(mut rows, balance), period| {
            let interest = balance * rate;
            let principal = payment - interest;
            let remaining = non_negative(balance - principal);
            rows.push(AmortizationRow {
                period,
                due_date: None,
                payment,
                interest,
                principal,
                prepayment: Decimal::ZERO,
                remaining_balance: remaining,
            });
            (rows, remaining)
        },
    );

    let totals = ScheduleTotals::from_rows(&schedule)?;
    debug!(
        principal = %input.principal,
        payment = %payment,
        periods = n,
        total_interest = %totals.total_interest,
        "annuity schedule computed"
    );

    let output = AnnuityOutput {
        monthly_payment: payment,
        number_of_payments: n,
        totals,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level annuity, monthly compounding (payment = P*r*(1+r)^n / ((1+r)^n - 1))",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "term_years": input.term_years,
        }),
        Vec::new(),
        elapsed,
        output,
    ))
}

//! Fixed-payment loans with an annual lump-sum prepayment (Sondertilgung).
//!
//! The monthly payment is set once from the interest rate plus the initial
//! amortisation rate and never re-fixed, so every prepayment shortens the
//! term instead of lowering the payment. Prepayment timing: the first lump
//! sum lands in the 4th month of the schedule, later ones in every January.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::defaults::{
    DEFAULT_ANNUAL_PREPAYMENT, DEFAULT_ANNUAL_RATE_PCT, DEFAULT_INITIAL_AMORTIZATION_PCT,
    DEFAULT_PRINCIPAL, DEFAULT_START_MONTH, DEFAULT_START_YEAR, MAX_SCHEDULE_PERIODS,
};
use crate::error::FinPlanError;
use crate::loans::schedule::{non_negative, AmortizationRow, ScheduleTotals};
use crate::time_value::monthly_rate;
use crate::types::*;
use crate::FinPlanResult;

/// Zero-based month index of the first prepayment.
const FIRST_PREPAYMENT_INDEX: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentInput {
    /// Loan amount.
    pub principal: Money,
    /// Nominal interest rate, percent per year.
    pub annual_rate_pct: Percent,
    /// Initial amortisation rate, percent of the principal per year.
    pub initial_amortization_pct: Percent,
    /// Lump sum paid once per year on top of the regular payment.
    pub annual_prepayment: Money,
    /// Calendar month of the first payment (1-12).
    pub start_month: u32,
    pub start_year: i32,
}

impl Default for PrepaymentInput {
    /// 200 000 at 3.0% interest, 2.0% initial amortisation, 10 000 per year,
    /// first payment September 2024.
    fn default() -> Self {
        Self {
            principal: DEFAULT_PRINCIPAL,
            annual_rate_pct: DEFAULT_ANNUAL_RATE_PCT,
            initial_amortization_pct: DEFAULT_INITIAL_AMORTIZATION_PCT,
            annual_prepayment: DEFAULT_ANNUAL_PREPAYMENT,
            start_month: DEFAULT_START_MONTH,
            start_year: DEFAULT_START_YEAR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentOutput {
    pub monthly_payment: Money,
    pub number_of_payments: u32,
    /// Calendar year of the final payment.
    pub payoff_year: i32,
    pub payoff_date: NaiveDate,
    #[serde(flatten)]
    pub totals: ScheduleTotals,
    pub schedule: Vec<AmortizationRow>,
}

impl PrepaymentOutput {
    /// Copy with every money value rounded to `dp` places, for display.
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            monthly_payment: self.monthly_payment.round_dp(dp),
            number_of_payments: self.number_of_payments,
            payoff_year: self.payoff_year,
            payoff_date: self.payoff_date,
            totals: self.totals.rounded(dp),
            schedule: self.schedule.iter().map(|r| r.rounded(dp)).collect(),
        }
    }
}

fn validate(input: &PrepaymentInput) -> FinPlanResult<NaiveDate> {
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
    if input.initial_amortization_pct <= Decimal::ZERO {
        return Err(FinPlanError::InvalidInput {
            field: "initial_amortization_pct".into(),
            reason: "Initial amortisation rate must be positive".into(),
        });
    }
    if input.annual_prepayment < Decimal::ZERO {
        return Err(FinPlanError::InvalidInput {
            field: "annual_prepayment".into(),
            reason: "Prepayment must not be negative".into(),
        });
    }
    if !(1..=12).contains(&input.start_month) {
        return Err(FinPlanError::InvalidInput {
            field: "start_month".into(),
            reason: format!("Month must be within 1-12, got {}", input.start_month),
        });
    }
    NaiveDate::from_ymd_opt(input.start_year, input.start_month, 1).ok_or_else(|| {
        FinPlanError::InvalidInput {
            field: "start_year".into(),
            reason: format!("Year {} is outside the supported calendar", input.start_year),
        }
    })
}

/// Whether the lump sum is due in the month with zero-based index `index`.
///
/// The 4th month counts as the end of the first year; afterwards every
/// January, excluding the very first month.
pub fn is_prepayment_month(index: u32, due_date: NaiveDate) -> bool {
    index == FIRST_PREPAYMENT_INDEX || (due_date.month() == 1 && index > 0)
}

fn month_start(start: NaiveDate, index: u32) -> FinPlanResult<NaiveDate> {
    start
        .checked_add_months(Months::new(index))
        .ok_or_else(|| FinPlanError::InvalidInput {
            field: "start_year".into(),
            reason: format!("Schedule month {index} is outside the supported calendar"),
        })
}

/// Monthly payment: principal times (interest + initial amortisation) per month.
fn fixed_payment(input: &PrepaymentInput) -> FinPlanResult<Money> {
    input
        .annual_rate_pct
        .checked_add(input.initial_amortization_pct)
        .map(|pct| pct / dec!(100) / dec!(12))
        .and_then(|monthly| input.principal.checked_mul(monthly))
        .ok_or_else(|| FinPlanError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Monthly payment exceeds decimal range".into(),
        })
}

/// Run the schedule until the balance reaches zero.
///
/// Fails with [`FinPlanError::NeverPaysOff`] when the balance is still
/// positive after [`MAX_SCHEDULE_PERIODS`] months.
pub fn compute_prepayment_schedule(
    input: &PrepaymentInput,
) -> FinPlanResult<ComputationOutput<PrepaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let start_date = validate(input)?;

    let rate = monthly_rate(input.annual_rate_pct);
    let payment = fixed_payment(input)?;

    let mut schedule = Vec::new();
    let mut balance = input.principal;
    let mut index: u32 = 0;

    while balance > Decimal::ZERO && index < MAX_SCHEDULE_PERIODS {
        let due_date = month_start(start_date, index)?;
        let interest = balance * rate;
        let principal = payment - interest;
        let prepayment = if is_prepayment_month(index, due_date) {
            input.annual_prepayment
        } else {
            Decimal::ZERO
        };

        let after_payment = non_negative(balance - principal);
        balance = non_negative(after_payment - prepayment);

        if prepayment > after_payment {
            warnings.push(format!(
                "{}: prepayment exceeds the outstanding balance by {}",
                due_date.format("%Y-%m"),
                (prepayment - after_payment).round_dp(2)
            ));
        }

        schedule.push(AmortizationRow {
            period: index + 1,
            due_date: Some(due_date),
            payment,
            interest,
            principal,
            prepayment,
            remaining_balance: balance,
        });
        index += 1;
    }

    if balance > Decimal::ZERO {
        warn!(
            periods = index,
            remaining = %balance,
            "prepayment schedule hit the period cap"
        );
        return Err(FinPlanError::NeverPaysOff {
            periods: index,
            remaining_balance: balance,
        });
    }

    let payoff_date = month_start(start_date, index.saturating_sub(1))?;
    let totals = ScheduleTotals::from_rows(&schedule)?;
    debug!(
        principal = %input.principal,
        payment = %payment,
        periods = index,
        payoff_year = payoff_date.year(),
        "prepayment schedule computed"
    );

    let output = PrepaymentOutput {
        monthly_payment: payment,
        number_of_payments: index,
        payoff_year: payoff_date.year(),
        payoff_date,
        totals,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed payment from interest + initial amortisation; annual lump sum in month 4, then every January",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "initial_amortization_pct": input.initial_amortization_pct.to_string(),
            "annual_prepayment": input.annual_prepayment.to_string(),
            "start": start_date.format("%Y-%m").to_string(),
            "max_periods": MAX_SCHEDULE_PERIODS,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_prepayment_month_rule() {
        // Start September: index 3 is December, index 4 is January
        assert!(!is_prepayment_month(0, ymd(2024, 9)));
        assert!(is_prepayment_month(3, ymd(2024, 12)));
        assert!(is_prepayment_month(4, ymd(2025, 1)));
        assert!(!is_prepayment_month(5, ymd(2025, 2)));
        // A January start does not prepay in its first month
        assert!(!is_prepayment_month(0, ymd(2024, 1)));
    }

    #[test]
    fn test_monthly_payment_from_rates() {
        let out = compute_prepayment_schedule(&PrepaymentInput::default())
            .unwrap()
            .result;
        // 200000 * 5% / 12
        assert_eq!(out.monthly_payment.round_dp(2), dec!(833.33));
    }

    #[test]
    fn test_october_start_single_prepayment_in_january() {
        // Index 3 is January itself: only one lump sum that month
        let input = PrepaymentInput {
            start_month: 10,
            ..PrepaymentInput::default()
        };
        let out = compute_prepayment_schedule(&input).unwrap().result;
        assert_eq!(out.schedule[3].due_date, Some(ymd(2025, 1)));
        assert_eq!(out.schedule[3].prepayment, dec!(10000));
        let first_year: Decimal = out.schedule[..15].iter().map(|r| r.prepayment).sum();
        assert_eq!(first_year, dec!(10000));
        assert_eq!(out.schedule[15].due_date, Some(ymd(2026, 1)));
        assert_eq!(out.schedule[15].prepayment, dec!(10000));
    }

    #[test]
    fn test_principal_near_decimal_max_pays_off() {
        let input = PrepaymentInput {
            principal: Decimal::MAX / dec!(4),
            ..PrepaymentInput::default()
        };
        let out = compute_prepayment_schedule(&input).unwrap().result;
        assert_eq!(out.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_payment_beyond_decimal_range_rejected() {
        let input = PrepaymentInput {
            principal: Decimal::MAX / dec!(2),
            annual_rate_pct: dec!(5000),
            ..PrepaymentInput::default()
        };
        let err = compute_prepayment_schedule(&input).unwrap_err();
        assert!(matches!(err, FinPlanError::InvalidInput { ref field, .. } if field == "annual_rate_pct"));
    }

    #[test]
    fn test_invalid_start_month() {
        let input = PrepaymentInput {
            start_month: 13,
            ..PrepaymentInput::default()
        };
        let err = compute_prepayment_schedule(&input).unwrap_err();
        assert!(matches!(err, FinPlanError::InvalidInput { ref field, .. } if field == "start_month"));

        let input = PrepaymentInput {
            start_month: 0,
            ..PrepaymentInput::default()
        };
        assert!(compute_prepayment_schedule(&input).is_err());
    }

    #[test]
    fn test_zero_amortization_rejected() {
        let input = PrepaymentInput {
            initial_amortization_pct: Decimal::ZERO,
            ..PrepaymentInput::default()
        };
        assert!(compute_prepayment_schedule(&input).is_err());
    }

    #[test]
    fn test_payoff_year_matches_last_row() {
        let out = compute_prepayment_schedule(&PrepaymentInput::default())
            .unwrap()
            .result;
        let last = out.schedule.last().unwrap();
        assert_eq!(last.remaining_balance, Decimal::ZERO);
        assert_eq!(last.due_date, Some(out.payoff_date));
        assert_eq!(out.payoff_year, out.payoff_date.year());
        assert_eq!(out.number_of_payments as usize, out.schedule.len());
    }
}

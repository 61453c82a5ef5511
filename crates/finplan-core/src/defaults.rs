//! Documented input defaults and the value ranges the dashboard widgets allowed.
//!
//! The core validates domains (positive principal, non-negative rate, ...).
//! Clamping into these ranges is a front-end concern and lives with the
//! caller; the ranges are published here so every front end agrees.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Safety cap on open-ended schedules.
pub const MAX_SCHEDULE_PERIODS: u32 = 1000;

/// Most battery sizes a single capacity comparison may simulate.
pub const MAX_SWEEP_POINTS: u32 = 500;

pub const DEFAULT_PRINCIPAL: Decimal = dec!(200000);
pub const DEFAULT_ANNUAL_RATE_PCT: Decimal = dec!(3.0);
pub const DEFAULT_TERM_YEARS: u32 = 25;
pub const DEFAULT_INITIAL_AMORTIZATION_PCT: Decimal = dec!(2.0);
pub const DEFAULT_ANNUAL_PREPAYMENT: Decimal = dec!(10000);
/// September
pub const DEFAULT_START_MONTH: u32 = 9;
pub const DEFAULT_START_YEAR: i32 = 2024;
pub const DEFAULT_BATTERY_CAPACITY_KWH: Decimal = dec!(5);

/// Inclusive range for a single numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: Decimal,
    pub max: Decimal,
}

impl Range {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range.
    pub fn clamp(&self, value: Decimal) -> Decimal {
        value.max(self.min).min(self.max)
    }
}

// Full-repayment calculator
pub const ANNUITY_PRINCIPAL_RANGE: Range = Range::new(dec!(1000), dec!(2000000));
pub const ANNUITY_TERM_YEARS_RANGE: Range = Range::new(dec!(1), dec!(50));
pub const ANNUITY_RATE_RANGE: Range = Range::new(dec!(0.1), dec!(15.0));

// Prepayment calculator
pub const PREPAYMENT_PRINCIPAL_RANGE: Range = Range::new(dec!(10000), dec!(2000000));
pub const PREPAYMENT_AMOUNT_RANGE: Range = Range::new(dec!(0), dec!(100000));
pub const PREPAYMENT_RATE_RANGE: Range = Range::new(dec!(0.1), dec!(10.0));
pub const PREPAYMENT_AMORTIZATION_RANGE: Range = Range::new(dec!(1.0), dec!(10.0));
pub const START_YEAR_RANGE: Range = Range::new(dec!(2000), dec!(2100));

// Storage simulator
pub const BATTERY_CAPACITY_RANGE: Range = Range::new(dec!(1), dec!(15));

/// Prepayment suggested when the user has not chosen one: 5% of the principal.
pub fn suggested_prepayment(principal: Decimal) -> Decimal {
    (principal * dec!(0.05)).trunc()
}

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FinPlanError;
use crate::types::{Money, Percent};
use crate::FinPlanResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Monthly rate as a fraction from an annual percentage (3.0 -> 0.0025).
pub fn monthly_rate(annual_pct: Percent) -> Decimal {
    annual_pct / dec!(100) / MONTHS_PER_YEAR
}

/// Level payment that amortises `principal` over `nper` periods at `rate` per period.
///
/// `rate` is a per-period fraction. A zero rate falls back to straight division
/// so the annuity factor never divides by zero.
pub fn annuity_payment(principal: Money, rate: Decimal, nper: u32) -> FinPlanResult<Money> {
    if nper == 0 {
        return Err(FinPlanError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if rate < Decimal::ZERO {
        return Err(FinPlanError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate must not be negative".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = (Decimal::ONE + rate)
        .checked_powu(u64::from(nper))
        .ok_or_else(|| FinPlanError::InvalidInput {
            field: "rate".into(),
            reason: format!("Compounding factor over {nper} periods exceeds decimal range"),
        })?;

    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(FinPlanError::DivisionUndefined {
            context: "annuity factor".into(),
        });
    }

    // f / (f - 1) stays near 1 for large f, so divide before scaling by P * r
    (factor / denominator)
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(principal))
        .ok_or_else(|| FinPlanError::InvalidInput {
            field: "rate".into(),
            reason: "Payment exceeds decimal range".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_rate_from_percent() {
        assert_eq!(monthly_rate(dec!(3.0)), dec!(0.0025));
        assert_eq!(monthly_rate(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_annuity_payment_known_answer() {
        // 200k over 25 years at 3% p.a. => ~947.86 per month
        let pmt = annuity_payment(dec!(200000), dec!(0.0025), 300).unwrap();
        assert_eq!(pmt.round_dp(2), dec!(947.86));
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        let pmt = annuity_payment(dec!(12000), Decimal::ZERO, 120).unwrap();
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_annuity_payment_zero_periods() {
        assert!(annuity_payment(dec!(1000), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_annuity_payment_factor_overflow() {
        // 500% per month for 600 months cannot be represented
        let err = annuity_payment(dec!(1000), dec!(5), 600).unwrap_err();
        assert!(matches!(err, FinPlanError::InvalidInput { .. }));
    }

    #[test]
    fn test_annuity_payment_large_factor_within_range() {
        // 120 per month over 12 months: (1+r)^n fits, P*r*(1+r)^n alone would not
        let pmt = annuity_payment(dec!(200000), dec!(120), 12).unwrap();
        assert!(pmt >= dec!(24000000));
        assert!(pmt < dec!(24000001));
    }

    #[test]
    fn test_annuity_payment_product_overflow() {
        let err = annuity_payment(Decimal::MAX, dec!(2), 12).unwrap_err();
        assert!(matches!(err, FinPlanError::InvalidInput { ref field, .. } if field == "rate"));
    }
}

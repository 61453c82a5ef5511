use chrono::Datelike;
use clap::Args;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use finplan_core::defaults::{
    suggested_prepayment, ANNUITY_PRINCIPAL_RANGE, ANNUITY_RATE_RANGE, ANNUITY_TERM_YEARS_RANGE,
    PREPAYMENT_AMORTIZATION_RANGE, PREPAYMENT_AMOUNT_RANGE, PREPAYMENT_PRINCIPAL_RANGE,
    PREPAYMENT_RATE_RANGE, START_YEAR_RANGE,
};
use finplan_core::loans::annuity::{self, AnnuityInput};
use finplan_core::loans::prepayment::{self, PrepaymentInput};

use super::{clamp_flag, finish};
use crate::input;

/// Arguments for a full-repayment schedule
#[derive(Args)]
pub struct AnnuityArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount [default: 200000]
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Interest rate, percent per year [default: 3.0]
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years [default: 25]
    #[arg(long)]
    pub term_years: Option<u32>,
}

impl AnnuityArgs {
    fn has_flags(&self) -> bool {
        self.principal.is_some() || self.rate.is_some() || self.term_years.is_some()
    }

    fn to_input(&self, notes: &mut Vec<String>) -> AnnuityInput {
        let defaults = AnnuityInput::default();
        let principal = clamp_flag(
            "principal",
            self.principal.unwrap_or(defaults.principal),
            ANNUITY_PRINCIPAL_RANGE,
            notes,
        );
        let rate = clamp_flag(
            "rate",
            self.rate.unwrap_or(defaults.annual_rate_pct),
            ANNUITY_RATE_RANGE,
            notes,
        );
        let term = clamp_flag(
            "term-years",
            Decimal::from(self.term_years.unwrap_or(defaults.term_years)),
            ANNUITY_TERM_YEARS_RANGE,
            notes,
        );
        AnnuityInput {
            principal,
            annual_rate_pct: rate,
            term_years: term.to_u32().unwrap_or(defaults.term_years),
        }
    }
}

pub fn run_annuity(args: AnnuityArgs, precision: u32) -> Result<Value, Box<dyn std::error::Error>> {
    let mut notes = Vec::new();
    let annuity_input: AnnuityInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.has_flags() {
        args.to_input(&mut notes)
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        args.to_input(&mut notes)
    };

    let mut result = annuity::compute_annuity_schedule(&annuity_input)?;
    result.result = result.result.rounded(precision);
    finish(result, notes)
}

/// Arguments for a schedule with annual prepayments
#[derive(Args)]
pub struct PrepaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount [default: 200000]
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Interest rate, percent per year [default: 3.0]
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Initial amortisation, percent per year [default: 2.0]
    #[arg(long)]
    pub amortization: Option<Decimal>,

    /// Annual lump-sum prepayment [default: 5% of the principal]
    #[arg(long)]
    pub prepayment: Option<Decimal>,

    /// Month of the first payment, 1-12 [default: 9]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub start_month: Option<u32>,

    /// Year of the first payment [default: current year]
    #[arg(long)]
    pub start_year: Option<i32>,
}

impl PrepaymentArgs {
    fn has_flags(&self) -> bool {
        self.principal.is_some()
            || self.rate.is_some()
            || self.amortization.is_some()
            || self.prepayment.is_some()
            || self.start_month.is_some()
            || self.start_year.is_some()
    }

    fn to_input(&self, current_year: i32, notes: &mut Vec<String>) -> PrepaymentInput {
        let defaults = PrepaymentInput::default();
        let principal = clamp_flag(
            "principal",
            self.principal.unwrap_or(defaults.principal),
            PREPAYMENT_PRINCIPAL_RANGE,
            notes,
        );
        let prepayment = clamp_flag(
            "prepayment",
            self.prepayment
                .unwrap_or_else(|| suggested_prepayment(principal)),
            PREPAYMENT_AMOUNT_RANGE,
            notes,
        );
        let start_year = clamp_flag(
            "start-year",
            Decimal::from(self.start_year.unwrap_or(current_year)),
            START_YEAR_RANGE,
            notes,
        );
        PrepaymentInput {
            principal,
            annual_rate_pct: clamp_flag(
                "rate",
                self.rate.unwrap_or(defaults.annual_rate_pct),
                PREPAYMENT_RATE_RANGE,
                notes,
            ),
            initial_amortization_pct: clamp_flag(
                "amortization",
                self.amortization.unwrap_or(defaults.initial_amortization_pct),
                PREPAYMENT_AMORTIZATION_RANGE,
                notes,
            ),
            annual_prepayment: prepayment,
            start_month: self.start_month.unwrap_or(defaults.start_month),
            start_year: start_year.to_i32().unwrap_or(defaults.start_year),
        }
    }
}

pub fn run_prepayment(
    args: PrepaymentArgs,
    precision: u32,
) -> Result<Value, Box<dyn std::error::Error>> {
    let current_year = chrono::Local::now().year();
    let mut notes = Vec::new();
    let pp_input: PrepaymentInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.has_flags() {
        args.to_input(current_year, &mut notes)
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        args.to_input(current_year, &mut notes)
    };

    let mut result = prepayment::compute_prepayment_schedule(&pp_input)?;
    result.result = result.result.rounded(precision);
    finish(result, notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prepayment_args() -> PrepaymentArgs {
        PrepaymentArgs {
            input: None,
            principal: None,
            rate: None,
            amortization: None,
            prepayment: None,
            start_month: None,
            start_year: None,
        }
    }

    #[test]
    fn test_annuity_flags_clamped_to_dashboard_ranges() {
        let args = AnnuityArgs {
            input: None,
            principal: Some(dec!(500)),
            rate: Some(dec!(20)),
            term_years: Some(25),
        };
        let mut notes = Vec::new();
        let input = args.to_input(&mut notes);
        assert_eq!(input.principal, dec!(1000));
        assert_eq!(input.annual_rate_pct, dec!(15.0));
        assert_eq!(input.term_years, 25);
        assert_eq!(notes.len(), 2);
    }

    #[test]
    fn test_run_annuity_with_flags() {
        let args = AnnuityArgs {
            input: None,
            principal: Some(dec!(200000)),
            rate: Some(dec!(3)),
            term_years: Some(25),
        };
        let value = run_annuity(args, 2).unwrap();
        assert_eq!(value["result"]["monthly_payment"], "947.86");
        assert_eq!(value["result"]["schedule"].as_array().map(Vec::len), Some(300));
    }

    #[test]
    fn test_prepayment_defaults_to_five_percent_of_principal() {
        let args = PrepaymentArgs {
            principal: Some(dec!(300000)),
            ..prepayment_args()
        };
        let mut notes = Vec::new();
        let input = args.to_input(2030, &mut notes);
        assert_eq!(input.annual_prepayment, dec!(15000));
        assert_eq!(input.start_year, 2030);
        assert_eq!(input.start_month, 9);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_prepayment_start_year_clamped() {
        let args = PrepaymentArgs {
            start_year: Some(1990),
            ..prepayment_args()
        };
        let mut notes = Vec::new();
        let input = args.to_input(2025, &mut notes);
        assert_eq!(input.start_year, 2000);
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn test_run_prepayment_reports_clamp_notes_first() {
        let args = PrepaymentArgs {
            amortization: Some(dec!(0.5)),
            start_year: Some(2024),
            ..prepayment_args()
        };
        let value = run_prepayment(args, 2).unwrap();
        let warnings = value["warnings"].as_array().unwrap();
        assert!(warnings[0].as_str().unwrap().starts_with("--amortization 0.5"));
        assert_eq!(value["result"]["schedule"][3]["due_date"], "2024-12-01");
    }
}

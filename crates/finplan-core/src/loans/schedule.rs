use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FinPlanError;
use crate::types::Money;
use crate::FinPlanResult;

/// One monthly line of an amortisation schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based month index within the schedule.
    pub period: u32,
    /// First day of the month the payment falls in, for calendar-anchored schedules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub payment: Money,
    pub interest: Money,
    /// Regular principal portion (payment minus interest).
    pub principal: Money,
    pub prepayment: Money,
    pub remaining_balance: Money,
}

impl AmortizationRow {
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            period: self.period,
            due_date: self.due_date,
            payment: self.payment.round_dp(dp),
            interest: self.interest.round_dp(dp),
            principal: self.principal.round_dp(dp),
            prepayment: self.prepayment.round_dp(dp),
            remaining_balance: self.remaining_balance.round_dp(dp),
        }
    }

    /// Everything that reduced the balance this month.
    pub fn total_principal(&self) -> Money {
        self.principal + self.prepayment
    }
}

/// Aggregates shared by every schedule.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleTotals {
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_prepayments: Money,
}

impl ScheduleTotals {
    /// Sum the rows. Fails when a total no longer fits a Decimal.
    pub fn from_rows(rows: &[AmortizationRow]) -> FinPlanResult<Self> {
        rows.iter().try_fold(Self::default(), |acc, row| {
            Some(Self {
                total_paid: acc
                    .total_paid
                    .checked_add(row.payment)?
                    .checked_add(row.prepayment)?,
                total_interest: acc.total_interest.checked_add(row.interest)?,
                total_principal: acc.total_principal.checked_add(row.principal)?,
                total_prepayments: acc.total_prepayments.checked_add(row.prepayment)?,
            })
        })
        .ok_or_else(|| FinPlanError::InvalidInput {
            field: "principal".into(),
            reason: "Schedule totals exceed decimal range".into(),
        })
    }

    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            total_paid: self.total_paid.round_dp(dp),
            total_interest: self.total_interest.round_dp(dp),
            total_principal: self.total_principal.round_dp(dp),
            total_prepayments: self.total_prepayments.round_dp(dp),
        }
    }
}

/// Closing balance of the last row, or `opening` for an empty schedule.
pub fn closing_balance(rows: &[AmortizationRow], opening: Money) -> Money {
    rows.last().map(|r| r.remaining_balance).unwrap_or(opening)
}

/// True when no row's balance is above the previous one.
pub fn is_non_increasing(rows: &[AmortizationRow]) -> bool {
    rows.windows(2)
        .all(|w| w[1].remaining_balance <= w[0].remaining_balance)
}

pub(crate) fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

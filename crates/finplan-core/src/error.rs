use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinPlanError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid record {index} ({period}): {reason}")]
    Validation {
        index: usize,
        period: String,
        reason: String,
    },

    #[error("Loan never pays off: balance {remaining_balance} still outstanding after {periods} periods")]
    NeverPaysOff {
        periods: u32,
        remaining_balance: Decimal,
    },

    #[error("Division undefined in {context}")]
    DivisionUndefined { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FinPlanError {
    fn from(e: serde_json::Error) -> Self {
        FinPlanError::SerializationError(e.to_string())
    }
}

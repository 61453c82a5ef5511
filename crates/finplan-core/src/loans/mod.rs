//! Consumer loan schedules: full-repayment annuities and fixed-rate loans
//! with a yearly lump-sum prepayment (Sondertilgung).

pub mod annuity;
pub mod prepayment;
pub mod schedule;

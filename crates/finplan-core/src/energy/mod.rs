//! PV self-consumption analysis and single-battery storage simulation on
//! monthly (or any fixed-period) meter readings.

pub mod analysis;
pub mod records;
pub mod storage;

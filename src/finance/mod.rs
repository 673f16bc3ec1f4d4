pub mod aggregator;
pub mod calculator;
pub mod format;

//! Stats module - descriptive statistics behind the charts

mod calculator;

pub use calculator::{Bins, BoxStats, StatsCalculator, WelchTest, SIGNIFICANCE_THRESHOLD};

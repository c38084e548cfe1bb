//! Date normalization, bounds and range filtering for the rental table.

use crate::data::columns::DATE;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Format of the `dteday` column in both datasets.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Error, Debug)]
pub enum DateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("No parseable dates in column '{0}'")]
    NoValidDates(&'static str),
    #[error("Date out of range: {0} days since epoch")]
    OutOfRange(i32),
}

/// Parse the `date` column into a calendar date. Malformed values become null.
pub fn normalize_dates(df: DataFrame) -> Result<DataFrame, DateError> {
    let options = StrptimeOptions {
        format: Some(DATE_FORMAT.into()),
        strict: false,
        exact: true,
        cache: true,
    };
    Ok(df
        .lazy()
        .with_column(col(DATE).str().to_date(options))
        .collect()?)
}

/// Earliest and latest date present in a table (nulls ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateBounds {
    pub fn from_frame(df: &DataFrame) -> Result<Self, DateError> {
        let days = df.column(DATE)?.cast(&DataType::Int32)?;
        let days = days.i32()?;
        match (days.min(), days.max()) {
            (Some(min), Some(max)) => Ok(Self {
                min: from_epoch_days(min)?,
                max: from_epoch_days(max)?,
            }),
            _ => Err(DateError::NoValidDates(DATE)),
        }
    }

    /// Resolve an optional user range against these bounds.
    pub fn resolve(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
        (start.unwrap_or(self.min), end.unwrap_or(self.max))
    }
}

fn from_epoch_days(days: i32) -> Result<NaiveDate, DateError> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or(DateError::OutOfRange(days))
}

pub trait RentalFrameFilterExt {
    /// Keep rows whose `date` lies in `[start, end]` (inclusive).
    ///
    /// Null dates never match. A range with `start > end` selects nothing.
    fn filter_dates(self, start: NaiveDate, end: NaiveDate) -> LazyFrame;
}

impl RentalFrameFilterExt for LazyFrame {
    fn filter_dates(self, start: NaiveDate, end: NaiveDate) -> LazyFrame {
        self.filter(
            col(DATE)
                .cast(DataType::Date)
                .gt_eq(lit(start))
                .and(col(DATE).cast(DataType::Date).lt_eq(lit(end))),
        )
    }
}

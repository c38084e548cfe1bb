//! Load → merge → reconcile → derive → normalize, then filter on demand.

use crate::config::WeekdayPolicy;
use crate::data::columns::DATE;
use crate::data::dates::{normalize_dates, DateBounds, DateError, RentalFrameFilterExt};
use crate::data::loader::{DataLoader, LoaderError};
use crate::data::processor::{DataProcessor, ProcessorError, JOIN_KEYS};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Date(#[from] DateError),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// The merged rental table together with its date bounds.
#[derive(Debug, Clone)]
pub struct RentalTables {
    pub full: DataFrame,
    pub bounds: DateBounds,
    /// How `total_weekday` was derived in `full`.
    pub weekday_policy: WeekdayPolicy,
}

impl RentalTables {
    /// Read both CSV files and prepare the merged table.
    pub fn load(day_path: &Path, hour_path: &Path, policy: WeekdayPolicy) -> Result<Self, PipelineError> {
        let (day, hour) = DataLoader::load_pair(day_path, hour_path)?;
        Self::prepare(&day, &hour, policy)
    }

    /// Merge already loaded daily and hourly tables.
    pub fn prepare(day: &DataFrame, hour: &DataFrame, policy: WeekdayPolicy) -> Result<Self, PipelineError> {
        let merged = DataProcessor::merge(day, hour, &JOIN_KEYS)?;
        let reconciled = DataProcessor::reconcile(merged)?;
        let derived = DataProcessor::derive(reconciled, policy)?;
        let full = normalize_dates(derived)?;

        let null_dates = full.column(DATE)?.null_count();
        if null_dates > 0 {
            warn!(rows = null_dates, "unparseable dates set to null");
        }

        let bounds = DateBounds::from_frame(&full)?;
        info!(
            rows = full.height(),
            columns = full.width(),
            min_date = %bounds.min,
            max_date = %bounds.max,
            "prepared rental table"
        );
        Ok(Self {
            full,
            bounds,
            weekday_policy: policy,
        })
    }

    /// Rows dated within `[start, end]`. The full table is left untouched.
    pub fn filtered(&self, start: NaiveDate, end: NaiveDate) -> Result<DataFrame, PipelineError> {
        if start > end {
            warn!(%start, %end, "start date after end date, range is empty");
        }
        let filtered = self.full.clone().lazy().filter_dates(start, end).collect()?;
        info!(%start, %end, rows = filtered.height(), "applied date range");
        Ok(filtered)
    }
}

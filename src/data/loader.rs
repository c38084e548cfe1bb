//! CSV Data Loader Module
//! Reads the daily and hourly rental tables using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Dataset not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Loads rental CSV files with inferred column types.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file (header row, comma separated).
    pub fn load_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        debug!(
            path = %file_path.display(),
            columns = ?df.get_column_names(),
            "schema inferred"
        );
        info!(path = %file_path.display(), rows = df.height(), "loaded dataset");
        Ok(df)
    }

    /// Load the daily and hourly tables, in that order.
    pub fn load_pair(day_path: &Path, hour_path: &Path) -> Result<(DataFrame, DataFrame), LoaderError> {
        let day = Self::load_csv(day_path)?;
        let hour = Self::load_csv(hour_path)?;
        Ok((day, hour))
    }
}

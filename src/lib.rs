//! Bike-sharing rental dashboard
//!
//! Loads the daily and hourly rental tables, merges them, filters by a date
//! range and renders seven charts with an HTML page around them.

pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod stats;

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::info;

pub use config::{ChartFormat, DashboardConfig, ReportScope, WeekdayPolicy};
pub use data::RentalTables;
pub use error::DashboardError;
pub use report::{ChartSettings, DashboardFiles, DashboardSummary, DashboardWriter, QuestionReport, ReportOptions};

/// Reports computed for one date range, nothing written yet.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub tables: RentalTables,
    pub filtered: DataFrame,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub reports: Vec<QuestionReport>,
}

impl Dashboard {
    /// Filter and aggregate for `[start, end]`; missing ends default to the data bounds.
    pub fn compute(
        tables: RentalTables,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        options: &ReportOptions,
    ) -> Result<Self, DashboardError> {
        let (start, end) = tables.bounds.resolve(start, end);
        let filtered = tables.filtered(start, end)?;
        let reports = report::build_reports(&tables.full, &filtered, options)?;
        Ok(Self {
            tables,
            filtered,
            start,
            end,
            reports,
        })
    }

    pub fn summary(&self) -> DashboardSummary<'_> {
        DashboardSummary {
            bounds: self.tables.bounds,
            start: self.start,
            end: self.end,
            weekday_policy: self.tables.weekday_policy,
            full_rows: self.tables.full.height(),
            filtered_rows: self.filtered.height(),
            reports: &self.reports,
        }
    }
}

/// Run the whole pipeline for `config` and write the dashboard directory.
pub fn run(config: &DashboardConfig) -> Result<DashboardFiles, DashboardError> {
    let tables = RentalTables::load(&config.day_csv, &config.hour_csv, config.weekday_policy)?;
    let options = ReportOptions {
        season_scope: config.season_scope,
    };
    let dashboard = Dashboard::compute(tables, config.start, config.end, &options)?;
    info!(
        start = %dashboard.start,
        end = %dashboard.end,
        rows = dashboard.filtered.height(),
        "computed reports"
    );

    let writer = DashboardWriter::new(
        &config.output_dir,
        ChartSettings {
            format: config.format,
            width: config.width,
            height: config.height,
        },
    );
    let files = writer.write(
        &dashboard.summary(),
        &dashboard.tables.full,
        &dashboard.filtered,
        config.logo.as_deref(),
        config.preview_rows,
    )?;
    Ok(files)
}

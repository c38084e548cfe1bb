//! Dashboard configuration
//! Command line options, each overridable through the environment (or a `.env` file).

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

/// Output image format for rendered charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    Png,
    Svg,
}

impl ChartFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }
}

/// How `total_weekday` is derived from the day and hour weekday codes.
///
/// The two codes are categorical, so adding them does not produce a weekday.
/// `Sum` keeps the additive combination used by the published report,
/// `DayCode` takes the daily code as is and `Omit` drops the column entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeekdayPolicy {
    #[default]
    Sum,
    DayCode,
    Omit,
}

/// Which table a question aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportScope {
    /// Every merged row, ignoring the date range.
    Full,
    /// Only rows inside the selected date range.
    Filtered,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "bike-dashboard")]
#[command(about = "Render the bike-sharing rental dashboard", long_about = None)]
pub struct DashboardConfig {
    /// Daily rental records (CSV with header)
    #[arg(long, env = "BIKE_DAY_CSV", default_value = "bike_sharing_day_Result.csv")]
    pub day_csv: PathBuf,

    /// Hourly rental records (CSV with header)
    #[arg(long, env = "BIKE_HOUR_CSV", default_value = "bike_sharing_hour_Result.csv")]
    pub hour_csv: PathBuf,

    /// First day of the range (YYYY-MM-DD), defaults to the earliest date in the data
    #[arg(long, env = "BIKE_START")]
    pub start: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD), defaults to the latest date in the data
    #[arg(long, env = "BIKE_END")]
    pub end: Option<NaiveDate>,

    /// Directory receiving the page, charts and table dump
    #[arg(short, long, env = "BIKE_OUTPUT_DIR", default_value = "dashboard")]
    pub output_dir: PathBuf,

    /// Sidebar logo copied next to the page
    #[arg(long, env = "BIKE_LOGO")]
    pub logo: Option<PathBuf>,

    #[arg(long, env = "BIKE_CHART_FORMAT", value_enum, default_value_t = ChartFormat::Png)]
    pub format: ChartFormat,

    /// Chart width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    #[arg(long, env = "BIKE_WEEKDAY_POLICY", value_enum, default_value_t = WeekdayPolicy::Sum)]
    pub weekday_policy: WeekdayPolicy,

    /// Table used by the season question
    #[arg(long, env = "BIKE_SEASON_SCOPE", value_enum, default_value_t = ReportScope::Full)]
    pub season_scope: ReportScope,

    /// Rows shown in each table preview on the page
    #[arg(long, default_value_t = 20)]
    pub preview_rows: usize,

    /// Open the generated page with the system default application
    #[arg(long, default_value_t = false)]
    pub open: bool,
}

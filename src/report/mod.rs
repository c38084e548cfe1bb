//! Report module - the seven questions, the page and the output directory

mod output;
mod page;
mod questions;

pub use output::{
    ChartSettings, DashboardFiles, DashboardSummary, DashboardWriter, OutputError, PAGE_FILE,
    SUMMARY_FILE, TABLE_FILE,
};
pub use page::{DashboardPage, PageContent, PAGE_TITLE};
pub use questions::{
    build_report, build_reports, season_name, Findings, PeakHour, Question, QuestionReport,
    ReportError, ReportOptions,
};

//! Writes the dashboard directory: charts, logo, table dump, summary and page.

use crate::charts::{RenderError, StaticChartRenderer};
use crate::config::{ChartFormat, WeekdayPolicy};
use crate::data::DateBounds;
use crate::report::page::{DashboardPage, PageContent};
use crate::report::QuestionReport;
use chrono::NaiveDate;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const PAGE_FILE: &str = "index.html";
pub const SUMMARY_FILE: &str = "summary.json";
pub const TABLE_FILE: &str = "filtered.csv";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Failed to write '{0}'")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Chart rendering settings.
#[derive(Debug, Clone, Copy)]
pub struct ChartSettings {
    pub format: ChartFormat,
    pub width: u32,
    pub height: u32,
}

/// What went into the dashboard, serialized to `summary.json`.
#[derive(Debug, Serialize)]
pub struct DashboardSummary<'a> {
    pub bounds: DateBounds,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub weekday_policy: WeekdayPolicy,
    pub full_rows: usize,
    pub filtered_rows: usize,
    pub reports: &'a [QuestionReport],
}

/// Files produced by [`DashboardWriter::write`].
#[derive(Debug, Clone)]
pub struct DashboardFiles {
    pub page: PathBuf,
    pub summary: PathBuf,
    pub table: PathBuf,
    pub charts: Vec<PathBuf>,
    pub logo: Option<PathBuf>,
}

pub struct DashboardWriter {
    dir: PathBuf,
    settings: ChartSettings,
}

impl DashboardWriter {
    pub fn new(dir: impl Into<PathBuf>, settings: ChartSettings) -> Self {
        Self {
            dir: dir.into(),
            settings,
        }
    }

    /// File name of the chart for `report`.
    pub fn chart_file_name(&self, report: &QuestionReport) -> String {
        format!("{}.{}", report.question.slug(), self.settings.format.extension())
    }

    /// Render every chart in parallel.
    pub fn render_charts(&self, reports: &[QuestionReport]) -> Result<Vec<PathBuf>, OutputError> {
        let size = (self.settings.width, self.settings.height);
        let charts = reports
            .par_iter()
            .map(|report| {
                let path = self.dir.join(self.chart_file_name(report));
                StaticChartRenderer::render_to_file(&report.chart, &path, self.settings.format, size)?;
                debug!(
                    question = report.number,
                    observations = report.chart.data.observations(),
                    path = %path.display(),
                    "rendered chart"
                );
                Ok(path)
            })
            .collect::<Result<Vec<_>, OutputError>>()?;
        info!(count = charts.len(), dir = %self.dir.display(), "rendered charts");
        Ok(charts)
    }

    /// Copy the logo next to the page, returning its new path.
    pub fn copy_logo(&self, logo: &Path) -> Result<PathBuf, OutputError> {
        let name = logo.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logo"));
        let target = self.dir.join(name);
        let source = logo
            .canonicalize()
            .map_err(|e| OutputError::Io(logo.to_path_buf(), e))?;
        // Copying a file onto itself would truncate it.
        if target.canonicalize().is_ok_and(|existing| existing == source) {
            debug!(logo = %target.display(), "logo already in output directory");
            return Ok(target);
        }
        fs::copy(&source, &target).map_err(|e| OutputError::Io(logo.to_path_buf(), e))?;
        Ok(target)
    }

    /// Dump `df` as CSV.
    pub fn write_table(&self, df: &DataFrame) -> Result<PathBuf, OutputError> {
        let path = self.dir.join(TABLE_FILE);
        let file = File::create(&path).map_err(|e| OutputError::Io(path.clone(), e))?;
        let mut df = df.clone();
        CsvWriter::new(BufWriter::new(file))
            .include_header(true)
            .finish(&mut df)?;
        Ok(path)
    }

    pub fn write_summary(&self, summary: &DashboardSummary<'_>) -> Result<PathBuf, OutputError> {
        let path = self.dir.join(SUMMARY_FILE);
        let file = File::create(&path).map_err(|e| OutputError::Io(path.clone(), e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
        Ok(path)
    }

    /// Write the whole dashboard directory.
    pub fn write(
        &self,
        summary: &DashboardSummary<'_>,
        full: &DataFrame,
        filtered: &DataFrame,
        logo: Option<&Path>,
        preview_rows: usize,
    ) -> Result<DashboardFiles, OutputError> {
        fs::create_dir_all(&self.dir).map_err(|e| OutputError::Io(self.dir.clone(), e))?;

        let charts = self.render_charts(summary.reports)?;
        let logo = logo.map(|path| self.copy_logo(path)).transpose()?;
        let table = self.write_table(filtered)?;
        let summary_path = self.write_summary(summary)?;

        let chart_names: Vec<String> = summary
            .reports
            .iter()
            .map(|report| self.chart_file_name(report))
            .collect();
        let logo_name = logo
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string());

        let html = DashboardPage::render_html(&PageContent {
            bounds: summary.bounds,
            start: summary.start,
            end: summary.end,
            logo: logo_name.as_deref(),
            full,
            filtered,
            preview_rows,
            reports: summary.reports,
            charts: &chart_names,
        });
        let page = self.dir.join(PAGE_FILE);
        fs::write(&page, html).map_err(|e| OutputError::Io(page.clone(), e))?;
        info!(page = %page.display(), "wrote dashboard page");

        Ok(DashboardFiles {
            page,
            summary: summary_path,
            table,
            charts,
            logo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportScope;
    use crate::report::{build_report, Question};

    fn writer(dir: &Path) -> DashboardWriter {
        DashboardWriter::new(
            dir,
            ChartSettings {
                format: ChartFormat::Svg,
                width: 400,
                height: 300,
            },
        )
    }

    #[test]
    fn chart_names_follow_question_and_format() {
        let df = df!("season" => [1i64], "total_rentals" => [5i64]).unwrap();
        let report = build_report(Question::Season, ReportScope::Full, &df).unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(writer(dir.path()).chart_file_name(&report), "q1_season.svg");
    }

    #[test]
    fn writes_table_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let df = df!("season" => [1i64, 2], "total_rentals" => [Some(5i64), None]).unwrap();
        let report = build_report(Question::Season, ReportScope::Full, &df).unwrap();
        let date = NaiveDate::from_ymd_opt(2011, 1, 1).unwrap();
        let reports = [report];
        let summary = DashboardSummary {
            bounds: DateBounds { min: date, max: date },
            start: date,
            end: date,
            weekday_policy: WeekdayPolicy::Sum,
            full_rows: 2,
            filtered_rows: 2,
            reports: &reports,
        };

        let w = writer(dir.path());
        let table = w.write_table(&df).unwrap();
        let csv = fs::read_to_string(table).unwrap();
        assert_eq!(csv.lines().next(), Some("season,total_rentals"));
        assert_eq!(csv.lines().count(), 3);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(w.write_summary(&summary).unwrap()).unwrap()).unwrap();
        assert_eq!(json["start"], "2011-01-01");
        assert_eq!(json["weekday_policy"], "sum");
        assert_eq!(json["reports"][0]["question"], "season");
        assert_eq!(json["reports"][0]["chart"]["data"]["kind"], "bar");
    }

    #[test]
    fn copies_logo() {
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("source.jpg");
        fs::write(&logo, b"jpeg").unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let copied = writer(&out).copy_logo(&logo).unwrap();
        assert_eq!(copied, out.join("source.jpg"));
        assert!(copied.is_file());
    }

    #[test]
    fn logo_inside_output_directory_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("gatto.jpg");
        fs::write(&logo, b"jpegdata").unwrap();

        let copied = writer(dir.path()).copy_logo(&logo).unwrap();
        assert_eq!(copied, logo);
        assert_eq!(fs::read(&logo).unwrap(), b"jpegdata");

        // the same file reached through a relative component
        let indirect = dir.path().join(".").join("gatto.jpg");
        writer(dir.path()).copy_logo(&indirect).unwrap();
        assert_eq!(fs::read(&logo).unwrap(), b"jpegdata");
    }

    #[test]
    fn missing_logo_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = writer(dir.path()).copy_logo(&dir.path().join("absent.png")).unwrap_err();
        assert!(matches!(err, OutputError::Io(..)));
    }
}

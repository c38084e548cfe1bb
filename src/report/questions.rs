//! The seven dashboard questions and the aggregation behind each chart.

use crate::charts::{Chart, ChartData, HistogramSeries, Series};
use crate::config::ReportScope;
use crate::data::columns::*;
use crate::stats::{StatsCalculator, WelchTest};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Points on each density curve.
const DENSITY_POINTS: usize = 200;
const MEAN_RENTALS: &str = "mean_rentals";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Question {
    Season,
    WorkingDay,
    Weather,
    Temperature,
    CasualRegistered,
    WorkingDayWeekend,
    PeakHours,
}

impl Question {
    pub const ALL: [Question; 7] = [
        Question::Season,
        Question::WorkingDay,
        Question::Weather,
        Question::Temperature,
        Question::CasualRegistered,
        Question::WorkingDayWeekend,
        Question::PeakHours,
    ];

    pub fn number(&self) -> usize {
        match self {
            Question::Season => 1,
            Question::WorkingDay => 2,
            Question::Weather => 3,
            Question::Temperature => 4,
            Question::CasualRegistered => 5,
            Question::WorkingDayWeekend => 6,
            Question::PeakHours => 7,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Question::Season => "How does the season affect the number of bike rentals?",
            Question::WorkingDay => "Are there more bike users on working days or on holidays?",
            Question::Weather => "How do weather conditions affect bike usage?",
            Question::Temperature => "Is there a correlation between temperature and the number of users?",
            Question::CasualRegistered => "How are casual and registered users distributed?",
            Question::WorkingDayWeekend => "How is bike usage distributed over working days and weekends?",
            Question::PeakHours => "When are the peak hours of bike usage during the day?",
        }
    }

    /// File stem of the rendered chart.
    pub fn slug(&self) -> &'static str {
        match self {
            Question::Season => "q1_season",
            Question::WorkingDay => "q2_working_day",
            Question::Weather => "q3_weather",
            Question::Temperature => "q4_temperature",
            Question::CasualRegistered => "q5_casual_registered",
            Question::WorkingDayWeekend => "q6_working_day_weekend",
            Question::PeakHours => "q7_peak_hours",
        }
    }
}

/// Which table each question reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportOptions {
    pub season_scope: ReportScope,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            season_scope: ReportScope::Full,
        }
    }
}

impl ReportOptions {
    pub fn scope(&self, question: Question) -> ReportScope {
        match question {
            Question::Season => self.season_scope,
            _ => ReportScope::Filtered,
        }
    }
}

/// Headline numbers extracted alongside a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Findings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welch: Option<WelchTest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pearson: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_hour: Option<PeakHour>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakHour {
    pub series: String,
    pub hour: u32,
    pub mean_rentals: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionReport {
    pub question: Question,
    pub number: usize,
    pub label: String,
    pub scope: ReportScope,
    pub rows: usize,
    pub chart: Chart,
    pub findings: Findings,
}

/// Season code to name, as labelled in the published report.
pub fn season_name(code: i64) -> String {
    match code {
        1 => "Winter".to_string(),
        2 => "Spring".to_string(),
        3 => "Summer".to_string(),
        4 => "Fall".to_string(),
        other => other.to_string(),
    }
}

/// Build all seven reports from the full and the date-filtered tables.
pub fn build_reports(
    full: &DataFrame,
    filtered: &DataFrame,
    options: &ReportOptions,
) -> Result<Vec<QuestionReport>, ReportError> {
    Question::ALL
        .iter()
        .map(|&question| {
            let scope = options.scope(question);
            let df = match scope {
                ReportScope::Full => full,
                ReportScope::Filtered => filtered,
            };
            build_report(question, scope, df)
        })
        .collect()
}

/// Build one question's chart over `df`.
pub fn build_report(
    question: Question,
    scope: ReportScope,
    df: &DataFrame,
) -> Result<QuestionReport, ReportError> {
    let (chart, findings) = match question {
        Question::Season => season_totals(df)?,
        Question::WorkingDay => working_day_boxes(
            df,
            "Bike Users on Working Days vs Holidays",
            "Working Day (1 = Yes, 0 = No)",
            "Number of Users",
        )?,
        Question::Weather => weather_boxes(df)?,
        Question::Temperature => temperature_scatter(df)?,
        Question::CasualRegistered => casual_registered_histograms(df)?,
        Question::WorkingDayWeekend => working_day_boxes(
            df,
            "Bike Usage on Working Days vs Weekends",
            "Working Day (0 = Weekend, 1 = Working Day)",
            "Total Bike Users",
        )?,
        Question::PeakHours => peak_hours(df)?,
    };

    Ok(QuestionReport {
        question,
        number: question.number(),
        label: question.label().to_string(),
        scope,
        rows: df.height(),
        chart,
        findings,
    })
}

fn season_totals(df: &DataFrame) -> Result<(Chart, Findings), ReportError> {
    let grouped = df
        .clone()
        .lazy()
        .group_by([col(SEASON)])
        .agg([col(TOTAL_RENTALS).sum().alias(TOTAL_RENTALS)])
        .sort([SEASON], SortMultipleOptions::default())
        .collect()?;

    let mut named: Vec<(String, f64)> = codes(&grouped, SEASON)?
        .into_iter()
        .zip(float_values(&grouped, TOTAL_RENTALS)?)
        .filter_map(|(code, total)| Some((season_name(code?), total.unwrap_or(0.0))))
        .collect();
    // Bars are ordered by season name, as the published report groups on names.
    named.sort_by(|a, b| a.0.cmp(&b.0));
    let (categories, values): (Vec<String>, Vec<f64>) = named.into_iter().unzip();

    let top_category = categories
        .iter()
        .zip(&values)
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(name, _)| name.clone());

    let chart = Chart {
        title: "Total Rentals by Season".to_string(),
        x_label: "Season".to_string(),
        y_label: "Total Rentals".to_string(),
        data: ChartData::Bar {
            categories,
            values,
            legend: "Total Rentals".to_string(),
        },
    };
    Ok((
        chart,
        Findings {
            top_category,
            ..Default::default()
        },
    ))
}

fn working_day_boxes(
    df: &DataFrame,
    title: &str,
    x_label: &str,
    y_label: &str,
) -> Result<(Chart, Findings), ReportError> {
    let groups = grouped_values(df, WORKINGDAY, TOTAL_RENTALS)?;
    let welch = match (groups.get(&1), groups.get(&0)) {
        (Some(working), Some(off)) => StatsCalculator::perform_ttest(working, off),
        _ => None,
    };
    let top_category = top_mean(&groups);
    let chart = box_chart(groups, title, x_label, y_label);
    Ok((
        chart,
        Findings {
            top_category,
            welch,
            ..Default::default()
        },
    ))
}

fn weather_boxes(df: &DataFrame) -> Result<(Chart, Findings), ReportError> {
    let groups = grouped_values(df, WEATHERSIT_DAY, TOTAL_RENTALS)?;
    let top_category = top_mean(&groups);
    let chart = box_chart(
        groups,
        "Bike Users by Weather Category",
        "Weathersit (1 = Clear, 2 = Cloudy, 3 = Rain)",
        "Number of Users",
    );
    Ok((
        chart,
        Findings {
            top_category,
            ..Default::default()
        },
    ))
}

fn temperature_scatter(df: &DataFrame) -> Result<(Chart, Findings), ReportError> {
    let points: Vec<(f64, f64)> = float_values(df, TEMP_DAY)?
        .into_iter()
        .zip(float_values(df, TOTAL_RENTALS)?)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect();

    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    let pearson = StatsCalculator::pearson(&xs, &ys);

    let chart = Chart {
        title: match pearson {
            Some(r) => format!("Temperature vs Number of Users (r = {:.2})", r),
            None => "Temperature vs Number of Users".to_string(),
        },
        x_label: "Temperature".to_string(),
        y_label: "Number of Users".to_string(),
        data: ChartData::Scatter { points },
    };
    Ok((
        chart,
        Findings {
            pearson,
            ..Default::default()
        },
    ))
}

fn casual_registered_histograms(df: &DataFrame) -> Result<(Chart, Findings), ReportError> {
    let casual: Vec<f64> = float_values(df, TOTAL_CASUAL)?.into_iter().flatten().collect();
    let registered: Vec<f64> = float_values(df, TOTAL_REGISTERED)?.into_iter().flatten().collect();

    let bins = StatsCalculator::auto_bins(&[casual.as_slice(), registered.as_slice()]);
    let series = [("Casual", &casual), ("Registered", &registered)]
        .into_iter()
        .map(|(label, values)| HistogramSeries {
            label: label.to_string(),
            counts: bins.counts(values),
            density: scaled_density(values, bins.width()),
        })
        .collect();

    let chart = Chart {
        title: "Distribution of Casual vs Registered Users".to_string(),
        x_label: "Number of Users".to_string(),
        y_label: "Frequency".to_string(),
        data: ChartData::Histogram { bins, series },
    };
    Ok((chart, Findings::default()))
}

fn peak_hours(df: &DataFrame) -> Result<(Chart, Findings), ReportError> {
    let hue = df.column(TOTAL_WEEKDAY).is_ok().then_some(TOTAL_WEEKDAY);
    let mut keys = Vec::new();
    if let Some(hue) = hue {
        keys.push(col(hue));
    }
    keys.push(col(HOUR));
    let mut sort_by = vec![HOUR];
    if let Some(hue) = hue {
        sort_by.insert(0, hue);
    }

    let grouped = df
        .clone()
        .lazy()
        .filter(col(HOUR).is_not_null().and(col(TOTAL_RENTALS).is_not_null()))
        .group_by(keys)
        .agg([col(TOTAL_RENTALS).cast(DataType::Float64).mean().alias(MEAN_RENTALS)])
        .sort(sort_by, SortMultipleOptions::default())
        .collect()?;

    let hours = codes(&grouped, HOUR)?;
    let means = float_values(&grouped, MEAN_RENTALS)?;
    let hues = match hue {
        Some(hue) => codes(&grouped, hue)?,
        None => vec![None; grouped.height()],
    };

    let mut lines: BTreeMap<Option<i64>, Vec<(f64, f64)>> = BTreeMap::new();
    for ((hour, mean), key) in hours.into_iter().zip(means).zip(hues) {
        if let (Some(hour), Some(mean)) = (hour, mean) {
            if hue.is_some() && key.is_none() {
                continue;
            }
            lines.entry(key).or_default().push((hour as f64, mean));
        }
    }

    let series: Vec<Series> = lines
        .into_iter()
        .map(|(key, points)| Series {
            label: match (hue, key) {
                (Some(hue), Some(key)) => format!("{hue} = {key}"),
                _ => "all days".to_string(),
            },
            points,
        })
        .collect();

    let peak_hour = series
        .iter()
        .flat_map(|s| s.points.iter().map(move |p| (s, p)))
        .max_by(|a, b| a.1 .1.total_cmp(&b.1 .1))
        .map(|(s, &(hour, mean))| PeakHour {
            series: s.label.clone(),
            hour: hour as u32,
            mean_rentals: mean,
        });

    let chart = Chart {
        title: "Peak Hours of Bike Usage (by weekday code)".to_string(),
        x_label: "Hour".to_string(),
        y_label: "Total Bike Users".to_string(),
        data: ChartData::Lines { series },
    };
    Ok((
        chart,
        Findings {
            peak_hour,
            ..Default::default()
        },
    ))
}

fn box_chart(groups: BTreeMap<i64, Vec<f64>>, title: &str, x_label: &str, y_label: &str) -> Chart {
    let groups = groups
        .iter()
        .filter_map(|(code, values)| StatsCalculator::box_stats(&code.to_string(), values))
        .collect();
    Chart {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        data: ChartData::Box { groups },
    }
}

fn top_mean(groups: &BTreeMap<i64, Vec<f64>>) -> Option<String> {
    groups
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(code, values)| (code, values.iter().sum::<f64>() / values.len() as f64))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(code, _)| code.to_string())
}

/// Density curve over the sample's own range, scaled to histogram counts.
fn scaled_density(values: &[f64], bin_width: f64) -> Option<Vec<(f64, f64)>> {
    let sorted = StatsCalculator::sorted(values);
    let (lo, hi) = (*sorted.first()?, *sorted.last()?);
    let grid = StatsCalculator::linspace(lo, hi, DENSITY_POINTS);
    let density = StatsCalculator::kde(values, &grid)?;
    let scale = values.len() as f64 * bin_width;
    Some(grid.into_iter().zip(density).map(|(x, d)| (x, d * scale)).collect())
}

/// Values of `value_col` grouped by the integer code in `key_col`; nulls dropped.
fn grouped_values(
    df: &DataFrame,
    key_col: &str,
    value_col: &str,
) -> Result<BTreeMap<i64, Vec<f64>>, ReportError> {
    let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for (key, value) in codes(df, key_col)?.into_iter().zip(float_values(df, value_col)?) {
        if let (Some(key), Some(value)) = (key, value) {
            groups.entry(key).or_default().push(value);
        }
    }
    Ok(groups)
}

fn codes(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, ReportError> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().collect())
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, ReportError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column
        .f64()?
        .into_iter()
        .map(|v| v.filter(|v| !v.is_nan()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataFrame {
        df!(
            SEASON => [1i64, 1, 3, 3, 2],
            WORKINGDAY => [0i64, 1, 1, 1, 0],
            WEATHERSIT_DAY => [1i64, 2, 1, 3, 1],
            TEMP_DAY => [0.2, 0.3, 0.7, 0.8, 0.5],
            HOUR => [Some(8i64), Some(8), Some(17), Some(17), None],
            TOTAL_RENTALS => [Some(100i64), Some(200), Some(400), Some(600), None],
            TOTAL_CASUAL => [Some(10i64), Some(20), Some(40), Some(60), None],
            TOTAL_REGISTERED => [Some(90i64), Some(180), Some(360), Some(540), None],
            TOTAL_WEEKDAY => [Some(12i64), Some(2), Some(2), Some(2), None]
        )
        .unwrap()
    }

    #[test]
    fn season_scope_is_configurable() {
        assert_eq!(ReportOptions::default().scope(Question::Season), ReportScope::Full);
        let options = ReportOptions {
            season_scope: ReportScope::Filtered,
        };
        assert_eq!(options.scope(Question::Season), ReportScope::Filtered);
        assert_eq!(options.scope(Question::PeakHours), ReportScope::Filtered);
    }

    #[test]
    fn season_totals_are_named_and_sorted() {
        let report = build_report(Question::Season, ReportScope::Full, &table()).unwrap();
        match report.chart.data {
            ChartData::Bar { categories, values, .. } => {
                assert_eq!(categories, vec!["Spring", "Summer", "Winter"]);
                assert_eq!(values, vec![0.0, 1000.0, 300.0]);
            }
            other => panic!("unexpected chart {other:?}"),
        }
        assert_eq!(report.findings.top_category.as_deref(), Some("Summer"));
    }

    #[test]
    fn working_day_boxes_drop_null_totals() {
        let report = build_report(Question::WorkingDay, ReportScope::Filtered, &table()).unwrap();
        let ChartData::Box { groups } = &report.chart.data else {
            panic!("expected box chart");
        };
        let labels: Vec<&str> = groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(labels, vec!["0", "1"]);
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[1].count, 3);
        assert_eq!(groups[1].median, 400.0);
        assert_eq!(report.findings.top_category.as_deref(), Some("1"));
        // a single non-working observation is too few for a t-test
        assert!(report.findings.welch.is_none());
    }

    #[test]
    fn duplicated_question_differs_only_in_labels() {
        let q2 = build_report(Question::WorkingDay, ReportScope::Filtered, &table()).unwrap();
        let q6 = build_report(Question::WorkingDayWeekend, ReportScope::Filtered, &table()).unwrap();
        assert_eq!(q2.chart.data, q6.chart.data);
        assert_ne!(q2.chart.title, q6.chart.title);
    }

    #[test]
    fn temperature_correlation_is_positive() {
        let report = build_report(Question::Temperature, ReportScope::Filtered, &table()).unwrap();
        assert_eq!(report.chart.data.observations(), 4);
        assert!(report.findings.pearson.unwrap() > 0.9);
    }

    #[test]
    fn histograms_share_bins() {
        let report = build_report(Question::CasualRegistered, ReportScope::Filtered, &table()).unwrap();
        let ChartData::Histogram { bins, series } = &report.chart.data else {
            panic!("expected histogram");
        };
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|s| s.counts.len() == bins.len()));
        assert!(series.iter().all(|s| s.counts.iter().sum::<usize>() == 4));
        assert!(series.iter().all(|s| s.density.is_some()));
    }

    #[test]
    fn peak_hours_split_by_weekday_code() {
        let report = build_report(Question::PeakHours, ReportScope::Filtered, &table()).unwrap();
        let ChartData::Lines { series } = &report.chart.data else {
            panic!("expected lines");
        };
        let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["total_weekday = 2", "total_weekday = 12"]);
        assert_eq!(series[0].points, vec![(8.0, 200.0), (17.0, 500.0)]);
        let peak = report.findings.peak_hour.unwrap();
        assert_eq!(peak.hour, 17);
        assert_eq!(peak.mean_rentals, 500.0);
    }

    #[test]
    fn peak_hours_without_weekday_column() {
        let df = table().drop(TOTAL_WEEKDAY).unwrap();
        let report = build_report(Question::PeakHours, ReportScope::Filtered, &df).unwrap();
        let ChartData::Lines { series } = &report.chart.data else {
            panic!("expected lines");
        };
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points, vec![(8.0, 150.0), (17.0, 500.0)]);
    }

    #[test]
    fn empty_table_builds_empty_charts() {
        let empty = table().head(Some(0));
        let reports = build_reports(&table(), &empty, &ReportOptions::default()).unwrap();
        assert_eq!(reports.len(), 7);
        assert_eq!(reports[0].rows, 5);
        assert!(reports[1..].iter().all(|r| r.chart.data.observations() == 0));
    }

    #[test]
    fn missing_column_is_an_error() {
        let df = table().drop(TEMP_DAY).unwrap();
        assert!(build_report(Question::Temperature, ReportScope::Filtered, &df).is_err());
    }
}

//! Chart data handed to the renderer. Already aggregated, backend independent.

use crate::stats::{Bins, BoxStats};
use serde::Serialize;

/// One named series of (x, y) points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Counts of one sample over shared bins, with an optional density curve
/// already scaled to counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSeries {
    pub label: String,
    pub counts: Vec<usize>,
    pub density: Option<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    Bar {
        categories: Vec<String>,
        values: Vec<f64>,
        legend: String,
    },
    Box {
        groups: Vec<BoxStats>,
    },
    Scatter {
        points: Vec<(f64, f64)>,
    },
    Histogram {
        bins: Bins,
        series: Vec<HistogramSeries>,
    },
    Lines {
        series: Vec<Series>,
    },
}

impl ChartData {
    /// Number of plotted observations.
    pub fn observations(&self) -> usize {
        match self {
            ChartData::Bar { values, .. } => values.len(),
            ChartData::Box { groups } => groups.iter().map(|g| g.count).sum(),
            ChartData::Scatter { points } => points.len(),
            ChartData::Histogram { series, .. } => {
                series.iter().map(|s| s.counts.iter().sum::<usize>()).sum()
            }
            ChartData::Lines { series } => series.iter().map(|s| s.points.len()).sum(),
        }
    }
}

/// A titled chart with axis labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: ChartData,
}

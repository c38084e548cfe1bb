//! Statistics Calculator Module
//! Box-plot summaries, histogram binning, kernel density and correlation.

use serde::Serialize;
use statrs::distribution::{Continuous, ContinuousCDF, Normal, StudentsT};
use statrs::statistics::Statistics;

/// Significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Whisker reach in multiples of the interquartile range.
const WHISKER_IQR: f64 = 1.5;

/// Box-plot summary of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub group: String,
    pub count: usize,
    pub mean: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Result of Welch's t-test between two groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchTest {
    pub t: f64,
    pub p_value: f64,
    pub is_significant: bool,
}

/// Equal-width bins shared by one or more histograms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bins {
    pub edges: Vec<f64>,
}

impl Bins {
    pub fn width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count values per bin; the last bin is closed on the right.
    pub fn counts(&self, values: &[f64]) -> Vec<usize> {
        let mut counts = vec![0; self.len()];
        let (Some(&lo), Some(&hi)) = (self.edges.first(), self.edges.last()) else {
            return counts;
        };
        let width = self.width();
        for &v in values {
            if v.is_nan() || v < lo || v > hi {
                continue;
            }
            let idx = if width > 0.0 {
                (((v - lo) / width) as usize).min(counts.len() - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }
        counts
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Sort ascending, NaN-tolerant.
    pub fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Quartiles, 1.5 IQR whiskers and outliers, matplotlib style.
    pub fn box_stats(group: &str, values: &[f64]) -> Option<BoxStats> {
        if values.is_empty() {
            return None;
        }
        let sorted = Self::sorted(values);
        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;

        // whiskers stop at the most extreme data point inside the fences
        let whisker_low = sorted.iter().copied().find(|&v| v >= low_fence).unwrap_or(q1);
        let whisker_high = sorted.iter().rev().copied().find(|&v| v <= high_fence).unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < low_fence || v > high_fence)
            .collect();

        Some(BoxStats {
            group: group.to_string(),
            count: sorted.len(),
            mean: values.mean(),
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Perform Welch's t-test (independent samples, unequal variance).
    pub fn perform_ttest(group_values: &[f64], control_values: &[f64]) -> Option<WelchTest> {
        let n1 = group_values.len() as f64;
        let n2 = control_values.len() as f64;

        if n1 < 2.0 || n2 < 2.0 {
            return None;
        }

        let mean1 = group_values.mean();
        let mean2 = control_values.mean();
        let var1 = group_values.variance();
        let var2 = control_values.variance();

        let se = (var1 / n1 + var2 / n2).sqrt();
        if se == 0.0 {
            // Two constant samples: identical means are indistinguishable,
            // different ones are separated with certainty.
            let diff = mean1 - mean2;
            return Some(if diff == 0.0 {
                WelchTest {
                    t: 0.0,
                    p_value: 1.0,
                    is_significant: false,
                }
            } else {
                WelchTest {
                    t: f64::INFINITY.copysign(diff),
                    p_value: 0.0,
                    is_significant: true,
                }
            });
        }

        let t = (mean1 - mean2) / se;

        // Welch-Satterthwaite degrees of freedom
        let df_num = (var1 / n1 + var2 / n2).powi(2);
        let df_denom = (var1 / n1).powi(2) / (n1 - 1.0) + (var2 / n2).powi(2) / (n2 - 1.0);
        let df = df_num / df_denom;

        // Two-tailed p-value using t-distribution
        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        let p_value = 2.0 * (1.0 - dist.cdf(t.abs()));
        Some(WelchTest {
            t,
            p_value,
            is_significant: p_value <= SIGNIFICANCE_THRESHOLD,
        })
    }

    /// Pearson correlation coefficient of paired samples.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }
        let sx = xs.std_dev();
        let sy = ys.std_dev();
        if sx == 0.0 || sy == 0.0 || sx.is_nan() || sy.is_nan() {
            return None;
        }
        Some(xs.covariance(ys) / (sx * sy))
    }

    /// Shared bins for several samples using NumPy's "auto" rule
    /// (the smaller of the Sturges and Freedman-Diaconis widths).
    pub fn auto_bins(samples: &[&[f64]]) -> Bins {
        let all: Vec<f64> = samples
            .iter()
            .flat_map(|s| s.iter().copied())
            .filter(|v| !v.is_nan())
            .collect();
        if all.is_empty() {
            return Bins { edges: Vec::new() };
        }

        let sorted = Self::sorted(&all);
        let lo = sorted[0];
        let hi = sorted[sorted.len() - 1];
        let range = hi - lo;
        if range == 0.0 {
            return Bins {
                edges: vec![lo - 0.5, lo + 0.5],
            };
        }

        let n = sorted.len() as f64;
        let sturges = range / (n.log2() + 1.0);
        let iqr = Self::percentile(&sorted, 75.0) - Self::percentile(&sorted, 25.0);
        let fd = 2.0 * iqr * n.powf(-1.0 / 3.0);
        let width = if fd > 0.0 { fd.min(sturges) } else { sturges };

        let count = ((range / width).ceil() as usize).max(1);
        let step = range / count as f64;
        let mut edges: Vec<f64> = (0..=count).map(|i| lo + step * i as f64).collect();
        edges[count] = hi;
        Bins { edges }
    }

    /// Gaussian kernel density estimate with Scott's bandwidth, evaluated at `grid`.
    pub fn kde(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let bandwidth = values.std_dev() * (n as f64).powf(-1.0 / 5.0);
        if bandwidth <= 0.0 || bandwidth.is_nan() {
            return None;
        }
        let kernel = Normal::new(0.0, 1.0).ok()?;
        Some(
            grid.iter()
                .map(|&x| {
                    values.iter().map(|&xi| kernel.pdf((x - xi) / bandwidth)).sum::<f64>()
                        / (n as f64 * bandwidth)
                })
                .collect(),
        )
    }

    /// `points` evenly spaced values over `[lo, hi]`.
    pub fn linspace(lo: f64, hi: f64, points: usize) -> Vec<f64> {
        match points {
            0 => Vec::new(),
            1 => vec![lo],
            _ => {
                let step = (hi - lo) / (points - 1) as f64;
                (0..points).map(|i| lo + step * i as f64).collect()
            }
        }
    }
}

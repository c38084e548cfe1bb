//! Static Chart Renderer
//! Draws each report chart to a PNG or SVG file with plotters.
//!
//! Layout of every chart:
//! 1. Caption centered on top
//! 2. Cartesian plot with labelled axes and light mesh
//! 3. Series legend in the upper right when a chart has named series

use crate::charts::{Chart, ChartData, HistogramSeries, Series};
use crate::config::ChartFormat;
use crate::stats::BoxStats;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart '{title}': {message}")]
    Draw { title: String, message: String },
}

// Colors
const BAR: RGBColor = RGBColor(91, 155, 213);
const BOX_LINE: RGBColor = RGBColor(52, 152, 219);
const BOX_FILL: RGBColor = RGBColor(189, 215, 238);
const SCATTER: RGBColor = RGBColor(52, 152, 219);
const CASUAL: RGBColor = RGBColor(0, 0, 255);
const REGISTERED: RGBColor = RGBColor(255, 0, 0);
const GRID: RGBColor = RGBColor(200, 200, 200);

/// Line colors, one per series
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
    RGBColor(121, 85, 72),
    RGBColor(96, 125, 139),
];

const FONT: &str = "sans-serif";
const BOX_HALF_WIDTH: f64 = 0.3;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render `chart` to `path` in the requested format.
    pub fn render_to_file(
        chart: &Chart,
        path: &Path,
        format: ChartFormat,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        match format {
            ChartFormat::Png => Self::draw(chart, BitMapBackend::new(path, size).into_drawing_area()),
            ChartFormat::Svg => Self::draw(chart, SVGBackend::new(path, size).into_drawing_area()),
        }
    }

    /// Draw `chart` on any plotters drawing area.
    pub fn draw<DB: DrawingBackend>(
        chart: &Chart,
        root: DrawingArea<DB, Shift>,
    ) -> Result<(), RenderError> {
        let fail = |e: DrawingAreaErrorKind<DB::ErrorType>| RenderError::Draw {
            title: chart.title.clone(),
            message: e.to_string(),
        };

        root.fill(&WHITE).map_err(fail)?;
        match &chart.data {
            ChartData::Bar {
                categories,
                values,
                legend,
            } => Self::draw_bar(&root, chart, categories, values, legend),
            ChartData::Box { groups } => Self::draw_box(&root, chart, groups),
            ChartData::Scatter { points } => Self::draw_scatter(&root, chart, points),
            ChartData::Histogram { bins, series } => {
                Self::draw_histogram(&root, chart, &bins.edges, series)
            }
            ChartData::Lines { series } => Self::draw_lines(&root, chart, series),
        }
        .map_err(fail)?;
        root.present().map_err(fail)
    }

    fn draw_bar<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        categories: &[String],
        values: &[f64],
        legend: &str,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let n = categories.len().max(1) as u32;
        let y_max = values.iter().copied().fold(0.0, f64::max);
        let y_range = 0.0..Self::upper_with_headroom(y_max);

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((0u32..n).into_segmented(), y_range)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .light_line_style(GRID.mix(0.4))
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => categories.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|y| format!("{:.0}", y))
            .draw()?;

        ctx.draw_series(
            Histogram::vertical(&ctx)
                .style(BAR.filled())
                .margin(20)
                .data(values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
        )?
        .label(legend)
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], BAR.filled()));

        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }

    fn draw_box<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        groups: &[BoxStats],
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let n = groups.len().max(1);
        let (y_min, y_max) = Self::value_range(groups.iter().flat_map(|g| {
            [g.whisker_low, g.whisker_high]
                .into_iter()
                .chain(g.outliers.iter().copied())
        }));
        let labels: Vec<String> = groups.iter().map(|g| g.group.clone()).collect();

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), y_min..y_max)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .light_line_style(GRID.mix(0.4))
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .x_labels(2 * n + 2)
            .x_label_formatter(&|x| Self::category_label(&labels, *x))
            .y_label_formatter(&|y| format!("{:.0}", y))
            .draw()?;

        for (i, g) in groups.iter().enumerate() {
            let cx = i as f64;
            let (left, right) = (cx - BOX_HALF_WIDTH, cx + BOX_HALF_WIDTH);
            let cap = BOX_HALF_WIDTH / 2.0;

            ctx.draw_series(std::iter::once(Rectangle::new(
                [(left, g.q1), (right, g.q3)],
                BOX_FILL.filled(),
            )))?;
            ctx.draw_series(std::iter::once(Rectangle::new(
                [(left, g.q1), (right, g.q3)],
                BOX_LINE.stroke_width(2),
            )))?;
            ctx.draw_series(
                [
                    vec![(left, g.median), (right, g.median)],
                    vec![(cx, g.q3), (cx, g.whisker_high)],
                    vec![(cx, g.q1), (cx, g.whisker_low)],
                    vec![(cx - cap, g.whisker_high), (cx + cap, g.whisker_high)],
                    vec![(cx - cap, g.whisker_low), (cx + cap, g.whisker_low)],
                ]
                .into_iter()
                .map(|line| PathElement::new(line, BOX_LINE.stroke_width(2))),
            )?;
            ctx.draw_series(
                g.outliers
                    .iter()
                    .map(|&y| Circle::new((cx, y), 3, BOX_LINE.stroke_width(1))),
            )?;
        }
        Ok(())
    }

    fn draw_scatter<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        points: &[(f64, f64)],
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (x_min, x_max) = Self::value_range(points.iter().map(|p| p.0));
        let (y_min, y_max) = Self::value_range(points.iter().map(|p| p.1));

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        ctx.configure_mesh()
            .light_line_style(GRID.mix(0.4))
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .y_label_formatter(&|y| format!("{:.0}", y))
            .draw()?;

        ctx.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 3, SCATTER.mix(0.6).filled())),
        )?;
        Ok(())
    }

    fn draw_histogram<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        edges: &[f64],
        series: &[HistogramSeries],
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let x_range = match (edges.first(), edges.last()) {
            (Some(&lo), Some(&hi)) if hi > lo => lo..hi,
            _ => 0.0..1.0,
        };
        let max_count = series
            .iter()
            .flat_map(|s| s.counts.iter())
            .copied()
            .max()
            .unwrap_or(0) as f64;
        let max_density = series
            .iter()
            .filter_map(|s| s.density.as_ref())
            .flat_map(|d| d.iter().map(|p| p.1))
            .fold(0.0, f64::max);
        let y_range = 0.0..Self::upper_with_headroom(max_count.max(max_density));

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_range, y_range)?;

        ctx.configure_mesh()
            .light_line_style(GRID.mix(0.4))
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format!("{:.0}", y))
            .draw()?;

        for (i, s) in series.iter().enumerate() {
            let color = match i {
                0 => CASUAL,
                1 => REGISTERED,
                _ => PALETTE[i % PALETTE.len()],
            };

            ctx.draw_series(s.counts.iter().zip(edges.windows(2)).map(|(&count, edge)| {
                Rectangle::new([(edge[0], 0.0), (edge[1], count as f64)], color.mix(0.35).filled())
            }))?
            .label(s.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.mix(0.5).filled()));

            if let Some(density) = &s.density {
                ctx.draw_series(LineSeries::new(density.iter().copied(), color.stroke_width(2)))?;
            }
        }

        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }

    fn draw_lines<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        series: &[Series],
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let points = || series.iter().flat_map(|s| s.points.iter());
        let (x_min, x_max) = Self::value_range(points().map(|p| p.0));
        let y_max = points().map(|p| p.1).fold(0.0, f64::max);

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, 0.0..Self::upper_with_headroom(y_max))?;

        ctx.configure_mesh()
            .light_line_style(GRID.mix(0.4))
            .x_desc(&chart.x_label)
            .y_desc(&chart.y_label)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format!("{:.0}", y))
            .draw()?;

        for (i, s) in series.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            ctx.draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
                .label(s.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        if !series.is_empty() {
            ctx.configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
        Ok(())
    }

    /// Label for an x tick that sits on a category index, empty otherwise.
    pub fn category_label(labels: &[String], x: f64) -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }

    /// Padded (min, max) of the finite values, (0, 1) when there are none.
    pub fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
        let (min, max) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min.is_infinite() {
            return (0.0, 1.0);
        }
        let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
        (min - pad, max + pad)
    }

    fn upper_with_headroom(max: f64) -> f64 {
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_only_on_integers() {
        let labels = vec!["0".to_string(), "1".to_string()];
        assert_eq!(StaticChartRenderer::category_label(&labels, 1.0), "1");
        assert_eq!(StaticChartRenderer::category_label(&labels, 0.5), "");
        assert_eq!(StaticChartRenderer::category_label(&labels, -0.5), "");
        assert_eq!(StaticChartRenderer::category_label(&labels, 2.0), "");
    }

    #[test]
    fn value_range_pads_and_defaults() {
        assert_eq!(StaticChartRenderer::value_range(std::iter::empty()), (0.0, 1.0));
        assert_eq!(StaticChartRenderer::value_range([5.0].into_iter()), (4.0, 6.0));
        let (lo, hi) = StaticChartRenderer::value_range([0.0, 100.0, f64::NAN].into_iter());
        assert_eq!((lo, hi), (-5.0, 105.0));
    }
}

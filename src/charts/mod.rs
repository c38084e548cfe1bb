//! Charts module - Chart data and static rendering

mod model;
mod renderer;

pub use model::{Chart, ChartData, HistogramSeries, Series};
pub use renderer::{RenderError, StaticChartRenderer, PALETTE};

//! Charts module - label planning, aggregation and rendering sinks

pub mod planner;
pub mod render;
pub mod stacked;
pub mod sunburst;

mod plotter;

pub use plotter::{color32, ChartPlotter, PlotStyle};

//! Interactive chart sinks built on egui_plot.
//!
//! These draw what the aggregation and the label planner decided; no
//! labeling or threshold logic lives here.

use egui::epaint::TextShape;
use egui::{Align2, Color32, FontId, RichText, Stroke};
use egui_plot::{
    Bar, BarChart, Legend, LineStyle, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Polygon,
    Text, VLine,
};

use crate::charts::planner::{LabelPlan, LabelPosition};
use crate::charts::stacked::ChartTable;
use crate::theme::Rgb;

pub fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}

/// Appearance knobs shared by the stacked chart pages.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub show_labels: bool,
    pub show_legend: bool,
    pub show_decarb: bool,
    pub show_cutoff: bool,
    pub label_font_size: f32,
    pub height: f32,
    pub bar_width: f64,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            show_labels: true,
            show_legend: false,
            show_decarb: true,
            show_cutoff: false,
            label_font_size: 16.0,
            height: 620.0,
            bar_width: 0.54,
        }
    }
}

/// Year marked as the boundary between historical data and model output.
pub const MODEL_CUTOFF_YEAR: f64 = 2022.0;

pub struct ChartPlotter;

impl ChartPlotter {
    /// Stacked bar chart: one bar stack per category, planner-driven
    /// segment labels, optional decarbonisation markers.
    ///
    /// `plans` is category-major as produced by `planner::plan_stacks`;
    /// `fills` is aligned with `table.series`.
    pub fn draw_stacked_bars(
        ui: &mut egui::Ui,
        id: &str,
        table: &ChartTable,
        plans: &[LabelPlan],
        fills: &[Rgb],
        style: &PlotStyle,
    ) {
        let categories = table.categories.clone();
        let n_series = table.series.len();
        let max_total = table.max_stack_total();

        let mut charts: Vec<BarChart> = Vec::new();
        for (s, series) in table.series.iter().enumerate() {
            let bars: Vec<Bar> = (0..table.categories.len())
                .map(|c| Bar::new(c as f64, table.values[c][s]).width(style.bar_width))
                .collect();
            let mut chart = BarChart::new(bars)
                .name(series)
                .color(color32(fills[s]));
            {
                let below: Vec<&BarChart> = charts.iter().collect();
                chart = chart.stack_on(&below);
            }
            charts.push(chart);
        }

        let mut plot = Plot::new(id.to_string())
            .height(style.height)
            .allow_scroll(false)
            .x_axis_label("Year")
            .y_axis_label(table.axis_label.clone())
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx >= 0.0 && (mark.value - idx).abs() < 1e-6 {
                    categories.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            });
        if style.show_legend {
            plot = plot.legend(Legend::default());
        }
        plot.show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }

            if style.show_labels {
                for (c, _) in table.categories.iter().enumerate() {
                    let mut bottom = 0.0;
                    for s in 0..n_series {
                        let value = table.values[c][s];
                        let top = bottom + value;
                        if let Some(plan) = plans.get(c * n_series + s) {
                            let (y, anchor) = match plan.position {
                                LabelPosition::Inside => {
                                    ((bottom + top) / 2.0, Align2::CENTER_CENTER)
                                }
                                LabelPosition::Outside | LabelPosition::Above => {
                                    (top + 0.01 * max_total, Align2::CENTER_BOTTOM)
                                }
                                LabelPosition::None => {
                                    bottom = top;
                                    continue;
                                }
                            };
                            let color = plan.color.rgb();
                            plot_ui.text(
                                Text::new(
                                    PlotPoint::new(c as f64, y),
                                    RichText::new(&plan.text).size(style.label_font_size),
                                )
                                .color(color32(color))
                                .anchor(anchor),
                            );
                        }
                        bottom = top;
                    }
                }
            }

            if style.show_decarb && !table.decarb.is_empty() {
                Self::decarb_overlay(plot_ui, table, style, |c| c as f64);
            }
        });
    }

    /// Stacked area chart: cumulative band polygons over the year axis,
    /// rotated band labels at the target category, optional cutoff line.
    ///
    /// `plans` is one per series as produced by `planner::plan_bands`.
    pub fn draw_stacked_area(
        ui: &mut egui::Ui,
        id: &str,
        table: &ChartTable,
        plans: &[LabelPlan],
        fills: &[Rgb],
        style: &PlotStyle,
        target: usize,
    ) {
        let years: Vec<f64> = table.category_years.iter().map(|y| *y as f64).collect();
        let n_cats = years.len();
        if n_cats == 0 {
            return;
        }
        let total_at_target = table.stack_total(target);

        // Band boundaries at the label target, captured while stacking.
        let mut label_anchors: Vec<(f64, f64)> = Vec::with_capacity(table.series.len());
        let mut polygons = Vec::with_capacity(table.series.len());
        let mut cum = vec![0.0; n_cats];
        for (s, series) in table.series.iter().enumerate() {
            let tops: Vec<f64> = (0..n_cats).map(|c| cum[c] + table.values[c][s]).collect();
            let mut points: Vec<[f64; 2]> = Vec::with_capacity(2 * n_cats);
            for c in 0..n_cats {
                points.push([years[c], tops[c]]);
            }
            for c in (0..n_cats).rev() {
                points.push([years[c], cum[c]]);
            }
            let color = color32(fills[s]);
            polygons.push(
                Polygon::new(PlotPoints::from(points))
                    .fill_color(color)
                    .stroke(Stroke::new(1.0, color))
                    .name(series),
            );
            label_anchors.push((
                cum.get(target).copied().unwrap_or(0.0),
                tops.get(target).copied().unwrap_or(0.0),
            ));
            cum = tops;
        }

        let mut plot = Plot::new(id.to_string())
            .height(style.height)
            .allow_scroll(false)
            .x_axis_label("Year")
            .y_axis_label(table.axis_label.clone());
        if style.show_legend {
            plot = plot.legend(Legend::default());
        }
        let response = plot.show(ui, |plot_ui| {
            for polygon in polygons {
                plot_ui.polygon(polygon);
            }
            if style.show_cutoff {
                plot_ui.vline(
                    VLine::new(MODEL_CUTOFF_YEAR)
                        .color(Color32::BLACK)
                        .style(LineStyle::Dashed { length: 10.0 })
                        .width(2.0),
                );
            }
        });

        if !style.show_labels {
            return;
        }

        // Band labels are tilted along the local trend, which egui_plot
        // text items cannot do; paint them over the plot instead.
        let transform = response.transform;
        let painter = ui.painter().with_clip_rect(response.response.rect);
        let target_x = years.get(target).copied().unwrap_or(years[n_cats / 2]);
        for (plan, (bottom, top)) in plans.iter().zip(label_anchors) {
            let y = match plan.position {
                LabelPosition::Inside => (bottom + top) / 2.0,
                LabelPosition::Above => top + 0.01 * total_at_target,
                _ => continue,
            };
            let color = color32(plan.color.rgb());
            let galley = painter.layout_no_wrap(
                plan.text.clone(),
                FontId::proportional(style.label_font_size),
                color,
            );
            let mut pos = transform.position_from_point(&PlotPoint::new(target_x, y));
            pos.y -= galley.size().y / 2.0;
            painter.add(
                TextShape::new(pos, galley, color)
                    .with_angle(plan.angle_degrees.to_radians() as f32),
            );
        }
    }

    fn decarb_overlay(
        plot_ui: &mut egui_plot::PlotUi,
        table: &ChartTable,
        style: &PlotStyle,
        x_of: impl Fn(usize) -> f64,
    ) {
        let points: PlotPoints = table
            .decarb
            .iter()
            .enumerate()
            .map(|(c, v)| [x_of(c), *v])
            .collect();
        plot_ui.points(
            Points::new(points)
                .shape(MarkerShape::Down)
                .radius(8.0)
                .color(Color32::BLACK)
                .name("To Decarbonise"),
        );
        for (c, value) in table.decarb.iter().enumerate() {
            plot_ui.text(
                Text::new(
                    PlotPoint::new(x_of(c) + 0.1, *value),
                    RichText::new(format!("{:.1} ({}/yr)", value, table.unit_label))
                        .size(style.label_font_size),
                )
                .color(Color32::BLACK)
                .anchor(Align2::LEFT_CENTER),
            );
        }
    }
}

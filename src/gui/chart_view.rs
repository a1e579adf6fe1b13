//! Chart view: central panel hosting the active chart page.

use egui::{Align2, Color32, FontId, RichText, ScrollArea, Sense, Shape, Stroke, Vec2};
use std::collections::HashMap;
use std::f32::consts::TAU;

use crate::charts::planner::{self, LabelColor, LabelPlan, PlannerConfig};
use crate::charts::stacked::{ChartTable, GroupDim};
use crate::charts::sunburst::SunburstData;
use crate::charts::{color32, ChartPlotter, PlotStyle};
use crate::gui::control_panel::{Page, ViewConfig};
use crate::theme::Rgb;

/// Dataset computed for the active page by the background thread.
pub enum PageData {
    Stacked { by_dim: HashMap<GroupDim, ChartTable> },
    Sunburst(SunburstData),
}

/// Central panel displaying the computed chart.
#[derive(Default)]
pub struct ChartView {
    pub data: Option<PageData>,
    /// Scenario name shown in titles, from the loaded file's stem.
    pub scenario: String,
}

/// Planner configuration assembled from the view settings.
pub fn planner_config(cfg: &ViewConfig, unit_label: &str, show_values: bool) -> PlannerConfig {
    let mut text_colors = std::collections::BTreeMap::new();
    for series in &cfg.black_text {
        text_colors.insert(series.clone(), LabelColor::Black);
    }
    PlannerConfig {
        mode: cfg.label_mode,
        allow: cfg.manual_allow.iter().cloned().collect(),
        relative_threshold: cfg.relative_threshold,
        inside_threshold: cfg.inside_threshold,
        absolute_floor: cfg.absolute_floor,
        show_values,
        unit: unit_label.to_string(),
        text_colors,
        ..PlannerConfig::default()
    }
}

/// Fill colors aligned with a table's series.
pub fn series_fills(cfg: &ViewConfig, dim: GroupDim, series: &[String]) -> Vec<Rgb> {
    series
        .iter()
        .map(|s| cfg.fill_color(dim, s))
        .collect()
}

/// Index of the configured band-label year, midpoint fallback.
pub fn band_target_index(table: &ChartTable, cfg: &ViewConfig) -> usize {
    table
        .category_years
        .iter()
        .position(|y| *y == cfg.band_target_year)
        .unwrap_or(table.category_years.len() / 2)
}

/// Label plans for a stacked table on the given page.
pub fn stacked_plans(table: &ChartTable, cfg: &ViewConfig, page: Page) -> Vec<LabelPlan> {
    match page {
        Page::DemandArea => {
            let planner_cfg = planner_config(cfg, &table.unit_label, false);
            planner::plan_bands(
                &table.categories,
                &table.series_values(),
                band_target_index(table, cfg),
                cfg.band_window,
                &planner_cfg,
            )
        }
        _ => {
            let planner_cfg = planner_config(cfg, &table.unit_label, true);
            planner::plan_stacks(&table.stacks(), &planner_cfg)
        }
    }
}

impl ChartView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.data = None;
    }

    pub fn set_data(&mut self, data: PageData) {
        self.data = Some(data);
    }

    pub fn current_table(&self, dim: GroupDim) -> Option<&ChartTable> {
        match &self.data {
            Some(PageData::Stacked { by_dim }) => by_dim.get(&dim),
            _ => None,
        }
    }

    fn title(&self, cfg: &ViewConfig, table: &ChartTable) -> String {
        format!(
            "{} {} by {}",
            self.scenario,
            table.axis_label,
            cfg.dim.label()
        )
    }

    pub fn show(&self, ui: &mut egui::Ui, cfg: &ViewConfig) {
        match &self.data {
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("No Data").size(20.0));
                });
            }
            Some(PageData::Stacked { by_dim }) => {
                let Some(table) = by_dim.get(&cfg.dim) else {
                    return;
                };
                if table.is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            RichText::new("No data for the current selection").size(16.0),
                        );
                    });
                    return;
                }
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(self.title(cfg, table)).size(18.0).strong());
                });
                ui.add_space(6.0);

                let plans = stacked_plans(table, cfg, cfg.page);
                let fills = series_fills(cfg, cfg.dim, &table.series);
                let style = PlotStyle {
                    show_labels: cfg.show_labels,
                    show_legend: cfg.show_legend,
                    show_decarb: cfg.show_decarb,
                    show_cutoff: cfg.show_cutoff,
                    label_font_size: cfg.label_font_size,
                    height: (ui.available_height() * 0.8).max(300.0),
                    ..PlotStyle::default()
                };
                match cfg.page {
                    Page::DemandArea => ChartPlotter::draw_stacked_area(
                        ui,
                        "demand_area",
                        table,
                        &plans,
                        &fills,
                        &style,
                        band_target_index(table, cfg),
                    ),
                    _ => ChartPlotter::draw_stacked_bars(
                        ui,
                        "demand_bars",
                        table,
                        &plans,
                        &fills,
                        &style,
                    ),
                }

                if cfg.show_table {
                    ui.add_space(8.0);
                    ui.label(RichText::new("Underlying values for chart").strong());
                    Self::values_table(ui, table, cfg.dim);
                }
            }
            Some(PageData::Sunburst(data)) => {
                if data.is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            RichText::new("No data for the current selection").size(16.0),
                        );
                    });
                    return;
                }
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new(format!(
                            "{} {} energy breakdown ({})",
                            self.scenario, cfg.sunburst_sector, data.unit_label
                        ))
                        .size(18.0)
                        .strong(),
                    );
                });
                ui.add_space(6.0);
                Self::draw_sunburst(ui, data, cfg);
            }
        }
    }

    fn values_table(ui: &mut egui::Ui, table: &ChartTable, dim: GroupDim) {
        ScrollArea::vertical()
            .id_salt("values_table")
            .max_height(260.0)
            .show(ui, |ui| {
                egui::Grid::new("values_grid")
                    .striped(true)
                    .min_col_width(90.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new("Year").strong());
                        ui.label(RichText::new(dim.label()).strong());
                        ui.label(RichText::new(&table.axis_label).strong());
                        ui.end_row();
                        for (c, row) in table.values.iter().enumerate() {
                            for (s, value) in row.iter().enumerate() {
                                ui.label(&table.categories[c]);
                                ui.label(&table.series[s]);
                                ui.label(format!("{value:.3}"));
                                ui.end_row();
                            }
                        }
                    });
            });
    }

    fn draw_sunburst(ui: &mut egui::Ui, data: &SunburstData, cfg: &ViewConfig) {
        let size = ui
            .available_width()
            .min(ui.available_height())
            .clamp(240.0, 860.0);
        let (response, painter) = ui.allocate_painter(Vec2::splat(size), Sense::hover());
        let center = response.rect.center();
        let outer = size / 2.0 * 0.95;
        let hole = outer * 0.25;
        let ring_width = (outer - hole) / data.ring_count as f32;

        // Angles start at 12 o'clock and run clockwise.
        let angle_of = |frac: f64| frac as f32 * TAU - TAU / 4.0;
        let pos_at =
            |r: f32, a: f32| center + Vec2::new(a.cos(), a.sin()) * r;

        for wedge in &data.wedges {
            let r0 = hole + ring_width * wedge.ring as f32;
            let r1 = r0 + ring_width;
            let a0 = angle_of(wedge.start);
            let a1 = angle_of(wedge.start + wedge.sweep);
            let steps = (((a1 - a0) / 0.05).ceil() as usize).max(1);
            let fill = color32(wedge.color);
            let stroke = Stroke::new(1.0, Color32::WHITE);
            for i in 0..steps {
                let b0 = a0 + (a1 - a0) * i as f32 / steps as f32;
                let b1 = a0 + (a1 - a0) * (i + 1) as f32 / steps as f32;
                painter.add(Shape::convex_polygon(
                    vec![
                        pos_at(r0, b0),
                        pos_at(r1, b0),
                        pos_at(r1, b1),
                        pos_at(r0, b1),
                    ],
                    fill,
                    stroke,
                ));
            }
            if cfg.show_labels && !wedge.text.is_empty() {
                let mid = angle_of(wedge.start + wedge.sweep / 2.0);
                painter.text(
                    pos_at((r0 + r1) / 2.0, mid),
                    Align2::CENTER_CENTER,
                    &wedge.text,
                    FontId::proportional(cfg.label_font_size),
                    Color32::BLACK,
                );
            }
        }

        if let Some(pointer) = response.hover_pos() {
            let v = pointer - center;
            let dist = v.length();
            if dist >= hole && dist < outer {
                let ring = ((dist - hole) / ring_width) as usize;
                let frac = ((v.y.atan2(v.x) + TAU / 4.0) / TAU).rem_euclid(1.0);
                if let Some(wedge) = data.hit(ring, frac as f64) {
                    egui::show_tooltip_at_pointer(
                        ui.ctx(),
                        ui.layer_id(),
                        egui::Id::new("sunburst_tip"),
                        |ui| {
                            ui.label(RichText::new(wedge.path.join(" → ")).strong());
                            ui.label(format!(
                                "{:.2} ({}/yr), {:.1}% of total",
                                wedge.value,
                                data.unit_label,
                                100.0 * wedge.value / data.total
                            ));
                        },
                    );
                }
            }
        }

        if cfg.show_legend {
            ui.add_space(8.0);
            ui.horizontal_wrapped(|ui| {
                for wedge in data.wedges.iter().filter(|w| w.ring == 0) {
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(14.0, 14.0), Sense::hover());
                    ui.painter().rect_filled(rect, 3.0, color32(wedge.color));
                    ui.label(RichText::new(&wedge.name).size(12.0));
                    ui.add_space(10.0);
                }
            });
        }
    }
}

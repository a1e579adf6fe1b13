//! Control panel widget: left side panel with all filters and options.

use egui::{Color32, ComboBox, RichText, ScrollArea};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::charts::planner::LabelMode;
use crate::charts::stacked::GroupDim;
use crate::data::EnergyUnit;
use crate::theme::{self, Rgb};

/// Bar pages plot at most this many years side by side.
pub const MAX_YEAR_PICKS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    DemandArea,
    DemandBars,
    CarbonBars,
    Sunburst,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::DemandArea,
        Page::DemandBars,
        Page::CarbonBars,
        Page::Sunburst,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Page::DemandArea => "Energy Demand",
            Page::DemandBars => "Energy Demand (Bar Chart)",
            Page::CarbonBars => "Carbon Content (Bar Chart)",
            Page::Sunburst => "Sector Breakdown (Sunburst)",
        }
    }
}

/// Everything the user can set for a view. Serializable so views can be
/// saved to disk and restored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub page: Page,
    pub dim: GroupDim,
    pub display_unit: EnergyUnit,

    pub sectors: Vec<String>,
    pub all_canada: bool,
    pub provinces: Vec<String>,
    pub year_range: (i32, i32),
    pub year_picks: Vec<i32>,
    pub sunburst_year: i32,
    pub sunburst_sector: String,
    pub ring_count: usize,

    pub show_labels: bool,
    pub show_legend: bool,
    pub show_decarb: bool,
    pub show_cutoff: bool,
    pub show_table: bool,
    pub label_font_size: f32,

    pub label_mode: LabelMode,
    pub manual_allow: Vec<String>,
    pub relative_threshold: f64,
    pub inside_threshold: f64,
    pub absolute_floor: f64,
    /// Series below this share of the grand total are dropped from the
    /// chart entirely. Deliberately per-view, not global.
    pub min_share: f64,

    pub sunburst_min_pct: f64,
    pub show_percent: bool,
    pub abbreviate_labels: bool,
    pub max_label_len: usize,

    pub band_target_year: i32,
    pub band_window: usize,

    /// Per-series fill overrides as hex strings.
    pub fill_overrides: BTreeMap<String, String>,
    /// Series whose label text the user switched to black.
    pub black_text: Vec<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page: Page::DemandArea,
            dim: GroupDim::Carrier,
            display_unit: EnergyUnit::PJ,
            sectors: Vec::new(),
            all_canada: true,
            provinces: Vec::new(),
            year_range: (2000, 2050),
            year_picks: Vec::new(),
            sunburst_year: 2030,
            sunburst_sector: "All".to_string(),
            ring_count: 3,
            show_labels: true,
            show_legend: false,
            show_decarb: true,
            show_cutoff: false,
            show_table: false,
            label_font_size: 16.0,
            label_mode: LabelMode::Auto,
            manual_allow: Vec::new(),
            relative_threshold: 0.05,
            inside_threshold: 0.10,
            absolute_floor: 1.0,
            min_share: 0.0001,
            sunburst_min_pct: 3.0,
            show_percent: false,
            abbreviate_labels: false,
            max_label_len: 8,
            band_target_year: 2035,
            band_window: 3,
            fill_overrides: BTreeMap::new(),
            black_text: Vec::new(),
        }
    }
}

impl ViewConfig {
    /// Fill color for a series: user override, then theme table, then the
    /// stable fallback.
    pub fn fill_color(&self, dim: GroupDim, series: &str) -> Rgb {
        self.fill_overrides
            .get(series)
            .and_then(|hex| Rgb::from_hex(hex))
            .unwrap_or_else(|| theme::series_color(dim.color_dim(), series))
    }
}

/// Actions triggered by the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    BrowseCarbon,
    Calculate,
    ExportCsv,
    ExportPng,
    SaveView,
    LoadView,
}

/// Left side control panel with file selection and chart controls.
pub struct ControlPanel {
    pub config: ViewConfig,
    pub csv_path: Option<PathBuf>,
    pub carbon_loaded: bool,

    // Choices offered by the loaded dataset.
    pub sectors: Vec<String>,
    pub provinces: Vec<String>,
    pub years: Vec<i32>,
    /// Series of the active chart, for manual labels and color pickers.
    pub label_options: Vec<String>,

    pub show_fill_pickers: bool,
    pub show_text_pickers: bool,
    pub progress: f32,
    pub status: String,
    pub calculate_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            config: ViewConfig::default(),
            csv_path: None,
            carbon_loaded: false,
            sectors: Vec::new(),
            provinces: Vec::new(),
            years: Vec::new(),
            label_options: Vec::new(),
            show_fill_pickers: false,
            show_text_pickers: false,
            progress: 0.0,
            status: "Ready".to_string(),
            calculate_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer the loaded dataset's choices and reset the selections that
    /// depend on them.
    pub fn update_dataset(
        &mut self,
        sectors: Vec<String>,
        provinces: Vec<String>,
        years: Vec<i32>,
        base_unit: EnergyUnit,
    ) {
        self.config.sectors = sectors.clone();
        self.config.provinces = provinces.clone();
        self.sectors = sectors;
        self.provinces = provinces;
        if let (Some(first), Some(last)) = (years.first(), years.last()) {
            self.config.year_range = (*first, *last);
        }
        if let Some(year) = years.iter().min_by_key(|y| (**y - 2030).abs()) {
            self.config.sunburst_year = *year;
        }
        if let Some(year) = years.iter().min_by_key(|y| (**y - 2035).abs()) {
            self.config.band_target_year = *year;
        }
        self.config.year_picks = years.iter().copied().take(MAX_YEAR_PICKS).collect();
        self.years = years;
        self.config.display_unit = base_unit;
        self.calculate_enabled = true;
    }

    pub fn update_label_options(&mut self, series: Vec<String>) {
        if self.config.manual_allow.is_empty() || self.label_options != series {
            self.config.manual_allow = series.clone();
        }
        self.label_options = series;
    }

    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }

    /// Draw the panel; returns at most one action per frame.
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("⚡ Enerviz")
                    .size(22.0)
                    .color(Color32::from_rgb(255, 191, 0)),
            );
            ui.label(
                RichText::new("Energy model output explorer")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();

        // ===== Data source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);
        ui.horizontal(|ui| {
            let path_text = self
                .csv_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "No file selected".to_string());
            ui.label(RichText::new(path_text).size(12.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("📂 Browse").clicked() {
                    action = ControlPanelAction::BrowseCsv;
                }
            });
        });
        ui.horizontal(|ui| {
            let label = if self.carbon_loaded {
                "Carbon factors loaded"
            } else {
                "No carbon factors"
            };
            ui.label(RichText::new(label).size(12.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Load factors…").clicked() {
                    action = ControlPanelAction::BrowseCarbon;
                }
            });
        });

        ui.add_space(10.0);
        ui.separator();

        // ===== Page =====
        ui.label(RichText::new("📊 Chart Page").size(14.0).strong());
        ui.add_space(5.0);
        ComboBox::from_id_salt("page")
            .width(230.0)
            .selected_text(self.config.page.label())
            .show_ui(ui, |ui| {
                for page in Page::ALL {
                    ui.selectable_value(&mut self.config.page, page, page.label());
                }
            });
        if self.config.page == Page::CarbonBars && !self.carbon_loaded {
            ui.label(
                RichText::new("Load carbon factors to populate this page")
                    .size(11.0)
                    .color(Color32::from_rgb(220, 53, 69)),
            );
        }

        ui.add_space(10.0);
        ui.separator();

        // ===== Filters =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(5.0);

        if self.config.page != Page::Sunburst {
            egui::CollapsingHeader::new("Sectors")
                .default_open(false)
                .show(ui, |ui| {
                    for sector in &self.sectors {
                        let mut selected = self.config.sectors.contains(sector);
                        if ui.checkbox(&mut selected, sector).changed() {
                            if selected {
                                self.config.sectors.push(sector.clone());
                            } else {
                                self.config.sectors.retain(|s| s != sector);
                            }
                        }
                    }
                });
        } else {
            ui.horizontal(|ui| {
                ui.label("Sector:");
                ComboBox::from_id_salt("sunburst_sector")
                    .width(150.0)
                    .selected_text(self.config.sunburst_sector.clone())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(
                            &mut self.config.sunburst_sector,
                            "All".to_string(),
                            "All",
                        );
                        for sector in &self.sectors {
                            ui.selectable_value(
                                &mut self.config.sunburst_sector,
                                sector.clone(),
                                sector,
                            );
                        }
                    });
            });
        }

        ui.checkbox(&mut self.config.all_canada, "All Canada");
        if !self.config.all_canada {
            egui::CollapsingHeader::new("Provinces")
                .default_open(false)
                .show(ui, |ui| {
                    for province in &self.provinces {
                        let mut selected = self.config.provinces.contains(province);
                        if ui.checkbox(&mut selected, province).changed() {
                            if selected {
                                self.config.provinces.push(province.clone());
                            } else {
                                self.config.provinces.retain(|p| p != province);
                            }
                        }
                    }
                });
        }

        ui.add_space(5.0);
        match self.config.page {
            Page::DemandArea => {
                let (min_y, max_y) = match (self.years.first(), self.years.last()) {
                    (Some(a), Some(b)) => (*a, *b),
                    _ => (2000, 2050),
                };
                ui.horizontal(|ui| {
                    ui.label("Years:");
                    ui.add(
                        egui::DragValue::new(&mut self.config.year_range.0)
                            .range(min_y..=self.config.year_range.1),
                    );
                    ui.label("to");
                    ui.add(
                        egui::DragValue::new(&mut self.config.year_range.1)
                            .range(self.config.year_range.0..=max_y),
                    );
                });
            }
            Page::DemandBars | Page::CarbonBars => {
                egui::CollapsingHeader::new(format!(
                    "Years ({}/{})",
                    self.config.year_picks.len(),
                    MAX_YEAR_PICKS
                ))
                .default_open(false)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("year_picks")
                        .max_height(120.0)
                        .show(ui, |ui| {
                            for year in &self.years {
                                let mut selected = self.config.year_picks.contains(year);
                                let full = self.config.year_picks.len() >= MAX_YEAR_PICKS;
                                let resp =
                                    ui.add_enabled(selected || !full, egui::Checkbox::new(&mut selected, year.to_string()));
                                if resp.changed() {
                                    if selected {
                                        self.config.year_picks.push(*year);
                                        self.config.year_picks.sort_unstable();
                                    } else {
                                        self.config.year_picks.retain(|y| y != year);
                                    }
                                }
                            }
                        });
                });
            }
            Page::Sunburst => {
                ui.horizontal(|ui| {
                    ui.label("Year:");
                    ComboBox::from_id_salt("sunburst_year")
                        .width(90.0)
                        .selected_text(self.config.sunburst_year.to_string())
                        .show_ui(ui, |ui| {
                            for year in &self.years {
                                ui.selectable_value(
                                    &mut self.config.sunburst_year,
                                    *year,
                                    year.to_string(),
                                );
                            }
                        });
                    ui.label("Rings:");
                    ui.add(egui::Slider::new(&mut self.config.ring_count, 1..=3));
                });
            }
        }

        ui.add_space(10.0);
        ui.separator();

        // ===== Grouping & unit =====
        if self.config.page != Page::Sunburst {
            ui.horizontal(|ui| {
                ui.label("Group by:");
                ComboBox::from_id_salt("group_dim")
                    .width(130.0)
                    .selected_text(self.config.dim.label())
                    .show_ui(ui, |ui| {
                        for dim in GroupDim::ALL {
                            ui.selectable_value(&mut self.config.dim, dim, dim.label());
                        }
                    });
            });
        }
        ui.horizontal(|ui| {
            ui.label("Display unit:");
            ComboBox::from_id_salt("display_unit")
                .width(70.0)
                .selected_text(self.config.display_unit.label())
                .show_ui(ui, |ui| {
                    for unit in EnergyUnit::ALL {
                        ui.selectable_value(&mut self.config.display_unit, unit, unit.label());
                    }
                });
        });

        ui.add_space(10.0);
        ui.separator();

        // ===== Chart display options =====
        egui::CollapsingHeader::new("Chart display options")
            .default_open(false)
            .show(ui, |ui| {
                ui.checkbox(&mut self.config.show_labels, "Show area/bar labels on chart");
                ui.checkbox(&mut self.config.show_legend, "Show legend");
                if self.config.page != Page::Sunburst {
                    ui.checkbox(&mut self.config.show_decarb, "Show decarbonisation indicator");
                }
                if self.config.page == Page::DemandArea {
                    ui.checkbox(&mut self.config.show_cutoff, "Show 2022 data/model cutoff");
                }
                ui.checkbox(&mut self.config.show_table, "Show table of chart values below");
                ui.add(
                    egui::Slider::new(&mut self.config.label_font_size, 8.0..=34.0)
                        .text("Label font size"),
                );

                if self.config.page == Page::Sunburst {
                    ui.add(
                        egui::Slider::new(&mut self.config.sunburst_min_pct, 0.0..=20.0)
                            .text("Show labels for slices ≥ this % of pie"),
                    );
                    ui.checkbox(&mut self.config.show_percent, "Show values as percent of total");
                    ui.checkbox(
                        &mut self.config.abbreviate_labels,
                        "Abbreviate labels with ellipsis if too long",
                    );
                    if self.config.abbreviate_labels {
                        ui.add(
                            egui::Slider::new(
                                &mut self.config.max_label_len,
                                4..=crate::lookup::MAX_LABEL_LEN,
                            )
                            .text("Max label length"),
                        );
                    }
                    return;
                }

                ui.horizontal(|ui| {
                    ui.label("Label mode:");
                    ui.radio_value(&mut self.config.label_mode, LabelMode::Auto, "Auto");
                    ui.radio_value(&mut self.config.label_mode, LabelMode::Manual, "Manual");
                });
                if self.config.label_mode == LabelMode::Manual {
                    ScrollArea::vertical()
                        .id_salt("manual_labels")
                        .max_height(120.0)
                        .show(ui, |ui| {
                            for series in &self.label_options {
                                let mut selected = self.config.manual_allow.contains(series);
                                if ui.checkbox(&mut selected, series).changed() {
                                    if selected {
                                        self.config.manual_allow.push(series.clone());
                                    } else {
                                        self.config.manual_allow.retain(|s| s != series);
                                    }
                                }
                            }
                        });
                }

                ui.add(
                    egui::Slider::new(&mut self.config.relative_threshold, 0.0..=0.2)
                        .text("Min share to auto-label"),
                );
                ui.add(
                    egui::Slider::new(&mut self.config.inside_threshold, 0.0..=0.3)
                        .text("Min share for inside label"),
                );
                ui.add(
                    egui::Slider::new(&mut self.config.min_share, 0.0..=0.05)
                        .logarithmic(true)
                        .text("Drop series under share of total"),
                );

                ui.separator();
                ui.checkbox(&mut self.show_fill_pickers, "Select trace (fill) colors");
                if self.show_fill_pickers {
                    for series in self.label_options.clone() {
                        let current = self.config.fill_color(self.config.dim, &series);
                        let mut color =
                            Color32::from_rgb(current.r, current.g, current.b);
                        ui.horizontal(|ui| {
                            if ui.color_edit_button_srgba(&mut color).changed() {
                                let picked =
                                    Rgb::new(color.r(), color.g(), color.b()).to_hex();
                                self.config.fill_overrides.insert(series.clone(), picked);
                            }
                            ui.label(&series);
                        });
                    }
                }
                ui.checkbox(
                    &mut self.show_text_pickers,
                    "Select label text colors (black or white)",
                );
                if self.show_text_pickers {
                    for series in self.label_options.clone() {
                        let mut black = self.config.black_text.contains(&series);
                        if ui
                            .checkbox(&mut black, format!("Black text for {series}"))
                            .changed()
                        {
                            if black {
                                self.config.black_text.push(series.clone());
                            } else {
                                self.config.black_text.retain(|s| s != &series);
                            }
                        }
                    }
                }
            });

        ui.add_space(10.0);
        ui.separator();

        // ===== Actions =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.calculate_enabled, |ui| {
                let button = egui::Button::new(RichText::new("▶ Build Chart").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Calculate;
                }
            });
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("⬇ Download chart data as CSV").clicked() {
                    action = ControlPanelAction::ExportCsv;
                }
                if ui.button("🖼 Export PNG").clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
            ui.horizontal(|ui| {
                if ui.button("Save view…").clicked() {
                    action = ControlPanelAction::SaveView;
                }
                if ui.button("Load view…").clicked() {
                    action = ControlPanelAction::LoadView;
                }
            });
        });

        ui.add_space(10.0);
        ui.separator();

        // ===== Progress =====
        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );
        ui.add_space(5.0);
        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("ready") || self.status.contains("Complete") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

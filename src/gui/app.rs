//! Enerviz main application
//! Main window with control panel and chart view; loading and aggregation
//! run on background threads and report over channels.

use egui::SidePanel;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use crate::charts::render;
use crate::charts::stacked::{aggregate, ChartQuery, ChartTable, GroupDim, Measure, YearFilter};
use crate::charts::sunburst::{self, SunburstQuery};
use crate::data::{export, loader::Dataset, reshape, CarbonFactors};
use crate::gui::chart_view::{self, ChartView, PageData};
use crate::gui::control_panel::{ControlPanel, ControlPanelAction, Page, ViewConfig};

/// Result of loading a CSV on a background thread.
enum LoadResult {
    Progress(String),
    Complete(Box<Dataset>),
    Error(String),
}

/// Result of building a page dataset on a background thread.
enum CalcResult {
    Progress(f32, String),
    Complete(Box<PageData>),
    Error(String),
}

/// Main application window.
pub struct EnervizApp {
    dataset: Option<Dataset>,
    carbon: CarbonFactors,
    control_panel: ControlPanel,
    chart_view: ChartView,

    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
    calc_rx: Option<Receiver<CalcResult>>,
    is_calculating: bool,
}

impl EnervizApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            dataset: None,
            carbon: CarbonFactors::default(),
            control_panel: ControlPanel::new(),
            chart_view: ChartView::new(),
            load_rx: None,
            is_loading: false,
            calc_rx: None,
            is_calculating: false,
        }
    }

    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };

        self.chart_view.clear();
        self.chart_view.scenario = scenario_name(&path);
        self.control_panel.csv_path = Some(path.clone());
        self.control_panel.set_progress(0.0, "Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress("Reading CSV file...".to_string()));
            match Dataset::load(&path) {
                Ok(ds) => {
                    let _ = tx.send(LoadResult::Complete(Box::new(ds)));
                }
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    fn handle_browse_carbon(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };
        match CarbonFactors::load(&path) {
            Ok(factors) => {
                self.carbon = factors;
                self.control_panel.carbon_loaded = !self.carbon.is_empty();
                self.attach_carbon();
                self.control_panel.set_progress(0.0, "Carbon factors ready");
            }
            Err(e) => {
                self.control_panel
                    .set_progress(0.0, &format!("Error: {e}"));
            }
        }
    }

    /// Add the carbon measure column to the loaded dataset.
    fn attach_carbon(&mut self) {
        if self.carbon.is_empty() {
            return;
        }
        if let Some(ds) = &mut self.dataset {
            if let Err(e) = reshape::apply_carbon_factors(&mut ds.frame, &self.carbon, ds.base_unit)
            {
                log::warn!("could not attach carbon factors: {e}");
            }
        }
    }

    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(status) => {
                        self.control_panel.set_progress(0.0, &status);
                    }
                    LoadResult::Complete(ds) => {
                        self.control_panel.update_dataset(
                            ds.sectors(),
                            ds.provinces(),
                            ds.years(),
                            ds.base_unit,
                        );
                        self.control_panel.set_progress(
                            0.0,
                            &format!("Loaded {} rows", ds.row_count()),
                        );
                        self.dataset = Some(*ds);
                        self.attach_carbon();
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {error}"));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    fn start_calculation(&mut self) {
        let Some(dataset) = self.dataset.clone() else {
            self.control_panel.set_progress(0.0, "No data loaded");
            return;
        };
        let config = self.control_panel.config.clone();

        let (tx, rx) = channel();
        self.calc_rx = Some(rx);
        self.is_calculating = true;
        self.control_panel.set_progress(5.0, "Aggregating data...");

        thread::spawn(move || {
            Self::run_calculation(tx, dataset, config);
        });
    }

    fn run_calculation(tx: Sender<CalcResult>, dataset: Dataset, config: ViewConfig) {
        let _ = tx.send(CalcResult::Progress(10.0, "Aggregating data...".to_string()));

        let provinces = if config.all_canada {
            None
        } else {
            Some(config.provinces.clone())
        };

        let data = match config.page {
            Page::Sunburst => {
                let query = SunburstQuery {
                    sector: if config.sunburst_sector == "All" {
                        None
                    } else {
                        Some(config.sunburst_sector.clone())
                    },
                    provinces,
                    year: config.sunburst_year,
                    display_unit: config.display_unit,
                    ring_count: config.ring_count,
                    min_label_share: config.sunburst_min_pct / 100.0,
                    show_percent: config.show_percent,
                    max_label_len: config
                        .abbreviate_labels
                        .then_some(config.max_label_len),
                };
                match sunburst::build(&dataset, &query) {
                    Ok(data) => PageData::Sunburst(data),
                    Err(e) => {
                        let _ = tx.send(CalcResult::Error(e.to_string()));
                        return;
                    }
                }
            }
            page => {
                let (measure, years) = match page {
                    Page::DemandArea => (
                        Measure::Energy,
                        YearFilter::Range(config.year_range.0, config.year_range.1),
                    ),
                    Page::CarbonBars => {
                        (Measure::Carbon, YearFilter::Picks(config.year_picks.clone()))
                    }
                    _ => (Measure::Energy, YearFilter::Picks(config.year_picks.clone())),
                };

                // One table per grouping dimension, so switching the
                // group-by selector needs no recomputation.
                let by_dim: HashMap<GroupDim, ChartTable> = GroupDim::ALL
                    .par_iter()
                    .map(|dim| {
                        let query = ChartQuery {
                            sectors: config.sectors.clone(),
                            provinces: provinces.clone(),
                            years: years.clone(),
                            dim: *dim,
                            measure,
                            display_unit: config.display_unit,
                            min_share: config.min_share,
                        };
                        let table = aggregate(&dataset, &query).unwrap_or_else(|e| {
                            log::warn!("aggregation failed for {:?}: {e}", dim);
                            ChartTable::default()
                        });
                        (*dim, table)
                    })
                    .collect();
                PageData::Stacked { by_dim }
            }
        };

        let _ = tx.send(CalcResult::Progress(90.0, "Building chart...".to_string()));
        let _ = tx.send(CalcResult::Complete(Box::new(data)));
    }

    fn check_calculation_results(&mut self) {
        let rx = self.calc_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    CalcResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    CalcResult::Complete(data) => {
                        if let PageData::Stacked { by_dim } = data.as_ref() {
                            if let Some(table) = by_dim.get(&self.control_panel.config.dim) {
                                self.control_panel.update_label_options(table.series.clone());
                            }
                        }
                        self.chart_view.set_data(*data);
                        self.control_panel.set_progress(100.0, "Chart ready");
                        self.is_calculating = false;
                        should_keep_receiver = false;
                    }
                    CalcResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {error}"));
                        self.is_calculating = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.calc_rx = Some(rx);
            }
        }
    }

    fn handle_export_csv(&mut self) {
        let dim = self.control_panel.config.dim;
        let unit = self.control_panel.config.display_unit;
        let frame = match &self.chart_view.data {
            Some(PageData::Stacked { by_dim }) => {
                by_dim.get(&dim).map(|table| table.to_frame(dim))
            }
            Some(PageData::Sunburst(data)) => Some(data.to_frame()),
            None => None,
        };
        let Some(Ok(mut frame)) = frame else {
            self.control_panel.set_progress(0.0, "No chart to export");
            return;
        };

        let default_name = format!("{}_data_{}.csv", self.chart_view.scenario, unit.label());
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(default_name)
            .save_file()
        else {
            return;
        };
        match export::write_csv(&mut frame, &path) {
            Ok(()) => self
                .control_panel
                .set_progress(100.0, &format!("Exported {}", path.display())),
            Err(e) => self
                .control_panel
                .set_progress(0.0, &format!("Error: {e}")),
        }
    }

    fn handle_export_png(&mut self) {
        let config = self.control_panel.config.clone();
        let Some(table) = self.chart_view.current_table(config.dim) else {
            self.control_panel
                .set_progress(0.0, "PNG export needs a bar chart page");
            return;
        };
        if table.is_empty() {
            self.control_panel.set_progress(0.0, "No chart to export");
            return;
        }

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("chart.png")
            .save_file()
        else {
            return;
        };

        let plans = chart_view::stacked_plans(table, &config, Page::DemandBars);
        let fills = chart_view::series_fills(&config, config.dim, &table.series);
        let title = format!(
            "{} {} by {}",
            self.chart_view.scenario,
            table.axis_label,
            config.dim.label()
        );
        match render::export_stacked_bars(&path, &title, table, &plans, &fills, 1400, 900) {
            Ok(()) => self
                .control_panel
                .set_progress(100.0, &format!("Exported {}", path.display())),
            Err(e) => self
                .control_panel
                .set_progress(0.0, &format!("Error: {e}")),
        }
    }

    fn handle_save_view(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("view.json")
            .save_file()
        else {
            return;
        };
        let result = serde_json::to_string_pretty(&self.control_panel.config)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()));
        match result {
            Ok(()) => self
                .control_panel
                .set_progress(100.0, &format!("View saved to {}", path.display())),
            Err(e) => self
                .control_panel
                .set_progress(0.0, &format!("Error: {e}")),
        }
    }

    fn handle_load_view(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            return;
        };
        let result = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                serde_json::from_str::<ViewConfig>(&json).map_err(|e| e.to_string())
            });
        match result {
            Ok(config) => {
                self.control_panel.config = config;
                self.control_panel.set_progress(0.0, "View loaded");
            }
            Err(e) => self
                .control_panel
                .set_progress(0.0, &format!("Error: {e}")),
        }
    }
}

/// Scenario label derived from the loaded file name.
fn scenario_name(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace('_', " "))
        .unwrap_or_default()
}

impl eframe::App for EnervizApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();
        self.check_calculation_results();

        if self.is_loading || self.is_calculating {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(360.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::BrowseCarbon => self.handle_browse_carbon(),
                        ControlPanelAction::Calculate => {
                            if !self.is_calculating {
                                self.start_calculation();
                            }
                        }
                        ControlPanelAction::ExportCsv => self.handle_export_csv(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::SaveView => self.handle_save_view(),
                        ControlPanelAction::LoadView => self.handle_load_view(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_view.show(ui, &self.control_panel.config);
        });
    }
}

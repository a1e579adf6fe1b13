//! Enerviz - Energy-model CSV output explorer & interactive chart viewer
//!
//! Loads energy-model CSV exports, reshapes and decorates them, and renders
//! stacked bar, stacked area and sunburst chart pages with client-side
//! filtering, color customization and CSV export.

mod charts;
mod data;
mod gui;
mod lookup;
mod theme;

use eframe::egui;
use gui::EnervizApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 860.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Enerviz"),
        ..Default::default()
    };

    eframe::run_native(
        "Enerviz",
        options,
        Box::new(|cc| Ok(Box::new(EnervizApp::new(cc)))),
    )
}

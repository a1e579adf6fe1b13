//! GUI module - application shell and widgets

mod app;
mod chart_view;
mod control_panel;

pub use app::EnervizApp;
pub use chart_view::{ChartView, PageData};
pub use control_panel::{ControlPanel, ControlPanelAction, Page, ViewConfig};

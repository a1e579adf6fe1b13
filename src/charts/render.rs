//! Static PNG rendering of the stacked bar chart, for report export.
//! Same table and label plans as the interactive page, drawn with plotters.

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use crate::charts::planner::{LabelPlan, LabelPosition};
use crate::charts::stacked::ChartTable;
use crate::theme::Rgb;

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

pub fn export_stacked_bars(
    path: &Path,
    title: &str,
    table: &ChartTable,
    plans: &[LabelPlan],
    fills: &[Rgb],
    width: u32,
    height: u32,
) -> Result<()> {
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = table.categories.len().max(1);
    let y_max = (table.max_stack_total() * 1.15).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(48)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

    let categories = table.categories.clone();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Year")
        .y_desc(table.axis_label.clone())
        .x_labels(n)
        .x_label_formatter(&|x| {
            let idx = x.round();
            if idx >= 0.0 && (x - idx).abs() < 1e-6 {
                categories.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .draw()?;

    let half = 0.27;
    for (s, series) in table.series.iter().enumerate() {
        let color = rgb(fills[s]);
        chart
            .draw_series((0..table.categories.len()).map(|c| {
                let bottom: f64 = table.values[c][..s].iter().sum();
                let top = bottom + table.values[c][s];
                Rectangle::new(
                    [(c as f64 - half, bottom), (c as f64 + half, top)],
                    color.filled(),
                )
            }))?
            .label(series.clone())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled())
            });
    }

    let n_series = table.series.len();
    for c in 0..table.categories.len() {
        for s in 0..n_series {
            let Some(plan) = plans.get(c * n_series + s) else {
                continue;
            };
            if !plan.visible {
                continue;
            }
            let bottom: f64 = table.values[c][..s].iter().sum();
            let top = bottom + table.values[c][s];
            let (y, v_pos) = match plan.position {
                LabelPosition::Inside => ((bottom + top) / 2.0, VPos::Center),
                _ => (top + 0.01 * y_max, VPos::Bottom),
            };
            let color = rgb(plan.color.rgb());
            let style = TextStyle::from(("sans-serif", 15).into_font())
                .color(&color)
                .pos(Pos::new(HPos::Center, v_pos));
            chart.draw_series(std::iter::once(Text::new(
                plan.text.clone(),
                (c as f64, y),
                style,
            )))?;
        }
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.85))
        .draw()?;

    root.present()?;
    log::info!("wrote chart image to {}", path.display());
    Ok(())
}

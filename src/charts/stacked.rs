//! Filter + group + sum aggregation behind the stacked chart pages.
//!
//! A [`ChartTable`] is the dense (category × series) grid one chart draws
//! from: categories along the shared axis, series in canonical stacking
//! order, values already converted to the display unit. It also feeds the
//! label planner, the CSV download and the underlying-values table.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::charts::planner::{Segment, Stack};
use crate::data::loader::{
    Dataset, EnergyUnit, COL_CARBON, COL_CARRIER, COL_ENERGY, COL_PROVINCE, COL_SECTOR,
    COL_SUBSECTOR, COL_TECH, COL_YEAR,
};
use crate::lookup;
use crate::theme::ColorDim;

/// Grouping dimension selectable on the chart pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupDim {
    Carrier,
    Tech,
    Subsector,
}

impl GroupDim {
    pub const ALL: [GroupDim; 3] = [GroupDim::Carrier, GroupDim::Tech, GroupDim::Subsector];

    pub fn column(self) -> &'static str {
        match self {
            GroupDim::Carrier => COL_CARRIER,
            GroupDim::Tech => COL_TECH,
            GroupDim::Subsector => COL_SUBSECTOR,
        }
    }

    /// Label shown in the group-by selector.
    pub fn label(self) -> &'static str {
        match self {
            GroupDim::Carrier => "Carrier",
            GroupDim::Tech => "Carrier & Tech",
            GroupDim::Subsector => "Sub Sector",
        }
    }

    pub fn color_dim(self) -> ColorDim {
        match self {
            GroupDim::Carrier => ColorDim::Carrier,
            GroupDim::Tech => ColorDim::Tech,
            GroupDim::Subsector => ColorDim::Subsector,
        }
    }
}

/// Which measure a chart aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Measure {
    Energy,
    Carbon,
}

impl Measure {
    pub fn column(self) -> &'static str {
        match self {
            Measure::Energy => COL_ENERGY,
            Measure::Carbon => COL_CARBON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum YearFilter {
    Range(i32, i32),
    Picks(Vec<i32>),
}

impl YearFilter {
    pub fn matches(&self, year: i32) -> bool {
        match self {
            YearFilter::Range(lo, hi) => (*lo..=*hi).contains(&year),
            YearFilter::Picks(years) => years.contains(&year),
        }
    }
}

/// What to compute, decoupled from how the UI collects it.
#[derive(Debug, Clone)]
pub struct ChartQuery {
    pub sectors: Vec<String>,
    /// None aggregates across all provinces ("All Canada").
    pub provinces: Option<Vec<String>>,
    pub years: YearFilter,
    pub dim: GroupDim,
    pub measure: Measure,
    pub display_unit: EnergyUnit,
    /// Series below this share of the grand total are dropped outright.
    pub min_share: f64,
}

/// Aggregated values behind one stacked chart.
#[derive(Debug, Clone, Default)]
pub struct ChartTable {
    pub categories: Vec<String>,
    /// Category keys as numbers (years), aligned with `categories`.
    pub category_years: Vec<i32>,
    /// Series names in stacking order.
    pub series: Vec<String>,
    /// values[category][series], display unit, negatives clamped to zero.
    pub values: Vec<Vec<f64>>,
    /// Fossil-carrier sum per category; empty unless grouped by carrier.
    pub decarb: Vec<f64>,
    pub unit_label: String,
    pub axis_label: String,
}

impl ChartTable {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() || self.series.is_empty()
    }

    pub fn stack_total(&self, category: usize) -> f64 {
        self.values
            .get(category)
            .map(|row| row.iter().sum())
            .unwrap_or(0.0)
    }

    pub fn max_stack_total(&self) -> f64 {
        (0..self.categories.len())
            .map(|i| self.stack_total(i))
            .fold(0.0, f64::max)
    }

    /// Stacks for the label planner, one per category, series in order.
    pub fn stacks(&self) -> Vec<Stack> {
        self.categories
            .iter()
            .zip(&self.values)
            .map(|(category, row)| {
                Stack::new(
                    category.clone(),
                    self.series
                        .iter()
                        .zip(row)
                        .map(|(series, value)| Segment::new(series.clone(), *value))
                        .collect(),
                )
            })
            .collect()
    }

    /// Per-series values aligned to the category axis, for band charts.
    pub fn series_values(&self) -> Vec<(String, Vec<f64>)> {
        self.series
            .iter()
            .enumerate()
            .map(|(s, name)| {
                (
                    name.clone(),
                    self.values.iter().map(|row| row[s]).collect(),
                )
            })
            .collect()
    }

    /// Long-format frame of the plotted values, for CSV download and the
    /// underlying-values table.
    pub fn to_frame(&self, dim: GroupDim) -> PolarsResult<DataFrame> {
        let mut years: Vec<i32> = Vec::new();
        let mut series: Vec<String> = Vec::new();
        let mut values: Vec<f64> = Vec::new();
        for (c, row) in self.values.iter().enumerate() {
            for (s, value) in row.iter().enumerate() {
                years.push(self.category_years[c]);
                series.push(self.series[s].clone());
                values.push(*value);
            }
        }
        DataFrame::new(vec![
            Column::new(COL_YEAR.into(), years),
            Column::new(dim.column().into(), series),
            Column::new(self.axis_label.clone().into(), values),
        ])
    }
}

/// Group the filtered rows by (year, series) and sum the measure.
pub fn aggregate(ds: &Dataset, query: &ChartQuery) -> PolarsResult<ChartTable> {
    let frame = &ds.frame;
    let years = frame.column(COL_YEAR)?.i32()?;
    let sectors = frame.column(COL_SECTOR)?.str()?;
    let provinces = frame.column(COL_PROVINCE)?.str()?;
    let dims = frame.column(query.dim.column())?.str()?;
    let measures = frame.column(query.measure.column())?.f64()?;

    // Energy converts from the dataset's base unit; carbon is Mt C as-is.
    let factor = match query.measure {
        Measure::Energy => ds.base_unit.conversion_to(query.display_unit),
        Measure::Carbon => 1.0,
    };

    let mut sums: BTreeMap<i32, BTreeMap<String, f64>> = BTreeMap::new();
    for i in 0..frame.height() {
        let (Some(year), Some(sector), Some(province), Some(series), Some(value)) = (
            years.get(i),
            sectors.get(i),
            provinces.get(i),
            dims.get(i),
            measures.get(i),
        ) else {
            continue;
        };
        if !query.years.matches(year) || !query.sectors.iter().any(|s| s == sector) {
            continue;
        }
        if let Some(selected) = &query.provinces {
            if !selected.iter().any(|p| p == province) {
                continue;
            }
        }
        if value.is_nan() {
            continue;
        }
        let value = (value * factor).max(0.0);
        *sums
            .entry(year)
            .or_default()
            .entry(series.to_string())
            .or_insert(0.0) += value;
    }

    // Drop series whose share of the grand total is below the cutoff.
    let mut series_totals: BTreeMap<&String, f64> = BTreeMap::new();
    for row in sums.values() {
        for (series, value) in row {
            *series_totals.entry(series).or_insert(0.0) += value;
        }
    }
    let grand_total: f64 = series_totals.values().sum();
    let kept: BTreeSet<String> = series_totals
        .iter()
        .filter(|(_, total)| grand_total <= 0.0 || **total / grand_total >= query.min_share)
        .map(|(series, _)| (*series).clone())
        .collect();

    let series = lookup::stack_sorted(kept.into_iter().collect());
    let category_years: Vec<i32> = sums.keys().copied().collect();
    let categories: Vec<String> = category_years.iter().map(|y| y.to_string()).collect();

    let values: Vec<Vec<f64>> = category_years
        .iter()
        .map(|year| {
            let row = &sums[year];
            series
                .iter()
                .map(|s| row.get(s).copied().unwrap_or(0.0))
                .collect()
        })
        .collect();

    let decarb = if query.dim == GroupDim::Carrier {
        values
            .iter()
            .map(|row| {
                series
                    .iter()
                    .zip(row)
                    .filter(|(s, _)| lookup::is_fossil(s))
                    .map(|(_, v)| *v)
                    .sum()
            })
            .collect()
    } else {
        Vec::new()
    };

    let (unit_label, axis_label) = match query.measure {
        Measure::Energy => (
            query.display_unit.label().to_string(),
            format!("Energy demand ({}/yr)", query.display_unit.label()),
        ),
        Measure::Carbon => ("Mt C".to_string(), "Carbon content (Mt C/yr)".to_string()),
    };

    Ok(ChartTable {
        categories,
        category_years,
        series,
        values,
        decarb,
        unit_label,
        axis_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dataset() -> Dataset {
        let df = DataFrame::new(vec![
            Column::new(
                "prov".into(),
                ["ab", "ab", "qc", "qc", "ab", "ab"].as_slice(),
            ),
            Column::new(
                "Sector".into(),
                [
                    "Transport",
                    "Transport",
                    "Transport",
                    "Industry",
                    "Transport",
                    "Transport",
                ]
                .as_slice(),
            ),
            Column::new(
                "en_carrier".into(),
                ["d", "e", "d", "ng", "d", "e"].as_slice(),
            ),
            Column::new(
                "Year".into(),
                [2020i32, 2020, 2020, 2020, 2021, 2021].as_slice(),
            ),
            Column::new(
                "Energy demand (PJ/yr)".into(),
                [10.0, 30.0, 5.0, 100.0, 20.0, 40.0].as_slice(),
            ),
        ])
        .unwrap();
        Dataset::from_frame(df).unwrap()
    }

    fn query() -> ChartQuery {
        ChartQuery {
            sectors: vec!["Transport".into()],
            provinces: None,
            years: YearFilter::Range(2000, 2050),
            dim: GroupDim::Carrier,
            measure: Measure::Energy,
            display_unit: EnergyUnit::PJ,
            min_share: 0.0,
        }
    }

    #[test]
    fn sums_by_year_and_series_in_stack_order() {
        let table = aggregate(&dataset(), &query()).unwrap();
        assert_eq!(table.categories, vec!["2020", "2021"]);
        // Diesel stacks below Elec in the canonical order.
        assert_eq!(table.series, vec!["Diesel", "Elec"]);
        assert_relative_eq!(table.values[0][0], 15.0); // ab + qc diesel 2020
        assert_relative_eq!(table.values[0][1], 30.0);
        assert_relative_eq!(table.values[1][0], 20.0);
        assert_relative_eq!(table.stack_total(1), 60.0);
    }

    #[test]
    fn sector_and_province_filters_apply() {
        let mut q = query();
        q.provinces = Some(vec!["Alberta".into()]);
        let table = aggregate(&dataset(), &q).unwrap();
        assert_relative_eq!(table.values[0][0], 10.0); // qc row excluded

        q.sectors = vec!["Industry".into()];
        q.provinces = None;
        let table = aggregate(&dataset(), &q).unwrap();
        assert_eq!(table.series, vec!["NG"]);
        assert_relative_eq!(table.values[0][0], 100.0);
    }

    #[test]
    fn display_unit_conversion() {
        let mut q = query();
        q.display_unit = EnergyUnit::TJ;
        let table = aggregate(&dataset(), &q).unwrap();
        assert_relative_eq!(table.values[0][0], 15000.0);
        assert_eq!(table.axis_label, "Energy demand (TJ/yr)");
    }

    #[test]
    fn min_share_drops_small_series() {
        let mut q = query();
        // Diesel totals 35 of 105 (33%), Elec 70 (67%).
        q.min_share = 0.5;
        let table = aggregate(&dataset(), &q).unwrap();
        assert_eq!(table.series, vec!["Elec"]);
    }

    #[test]
    fn decarb_sums_fossil_carriers_only() {
        let table = aggregate(&dataset(), &query()).unwrap();
        // Diesel is fossil, Elec is not.
        assert_relative_eq!(table.decarb[0], 15.0);
        assert_relative_eq!(table.decarb[1], 20.0);
    }

    #[test]
    fn year_picks_filter() {
        let mut q = query();
        q.years = YearFilter::Picks(vec![2021]);
        let table = aggregate(&dataset(), &q).unwrap();
        assert_eq!(table.categories, vec!["2021"]);
    }

    #[test]
    fn empty_selection_yields_empty_table() {
        let mut q = query();
        q.sectors = Vec::new();
        let table = aggregate(&dataset(), &q).unwrap();
        assert!(table.is_empty());
        assert_relative_eq!(table.max_stack_total(), 0.0);
    }

    #[test]
    fn negative_values_are_clamped() {
        let df = DataFrame::new(vec![
            Column::new("prov".into(), ["ab", "ab"].as_slice()),
            Column::new("Sector".into(), ["Transport", "Transport"].as_slice()),
            Column::new("en_carrier".into(), ["d", "e"].as_slice()),
            Column::new("Year".into(), [2020i32, 2020].as_slice()),
            Column::new("Energy (PJ/yr)".into(), [-4.0, 6.0].as_slice()),
        ])
        .unwrap();
        let ds = Dataset::from_frame(df).unwrap();
        let table = aggregate(&ds, &query()).unwrap();
        assert_relative_eq!(table.stack_total(0), 6.0);
    }

    #[test]
    fn to_frame_has_one_row_per_cell() {
        let table = aggregate(&dataset(), &query()).unwrap();
        let df = table.to_frame(GroupDim::Carrier).unwrap();
        assert_eq!(df.height(), 4);
        assert!(df.column("Energy demand (PJ/yr)").is_ok());
    }
}

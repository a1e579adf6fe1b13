//! CSV ingestion.
//!
//! Model exports arrive with drifting column spellings and either a long
//! `Year` column or one column per year. Normalization maps everything onto
//! one declared schema up front; downstream code never sniffs column names.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::data::reshape;

pub const COL_PROVINCE: &str = "Province";
pub const COL_SECTOR: &str = "Sector";
pub const COL_SUBSECTOR: &str = "Subsector";
pub const COL_CARRIER: &str = "Carrier";
pub const COL_TECH: &str = "Tech_name";
pub const COL_YEAR: &str = "Year";
pub const COL_ENERGY: &str = "Energy";
pub const COL_CARBON: &str = "Carbon";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error(transparent)]
    Reshape(#[from] reshape::ReshapeError),
    #[error("Required column missing: {0}")]
    MissingColumn(&'static str),
    #[error("No energy column found (expected e.g. \"Energy demand (PJ/yr)\")")]
    NoEnergyColumn,
}

/// Units the energy measure is stored or displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyUnit {
    GJ,
    TJ,
    PJ,
}

impl EnergyUnit {
    pub const ALL: [EnergyUnit; 3] = [EnergyUnit::GJ, EnergyUnit::TJ, EnergyUnit::PJ];

    pub fn to_gj(self) -> f64 {
        match self {
            EnergyUnit::GJ => 1.0,
            EnergyUnit::TJ => 1e3,
            EnergyUnit::PJ => 1e6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EnergyUnit::GJ => "GJ",
            EnergyUnit::TJ => "TJ",
            EnergyUnit::PJ => "PJ",
        }
    }

    /// Factor taking a value in `self` to a value in `display`.
    pub fn conversion_to(self, display: EnergyUnit) -> f64 {
        self.to_gj() / display.to_gj()
    }
}

/// Canonical column ← accepted spellings (compared trimmed, lowercase).
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    (COL_PROVINCE, &["province", "prov"]),
    (COL_SECTOR, &["sector"]),
    (COL_SUBSECTOR, &["subsector", "tech_subsector", "tech subsector"]),
    (COL_CARRIER, &["carrier", "carrier group", "en_carrier"]),
    (COL_TECH, &["tech_name", "tech name", "tech"]),
    (COL_YEAR, &["year"]),
];

/// Energy column spellings with their declared base unit.
const ENERGY_ALIASES: &[(&str, EnergyUnit)] = &[
    ("energy demand (pj/yr)", EnergyUnit::PJ),
    ("energy (pj/yr)", EnergyUnit::PJ),
    ("energy demand (tj/yr)", EnergyUnit::TJ),
    ("energy (tj/yr)", EnergyUnit::TJ),
    ("energy demand (gj/yr)", EnergyUnit::GJ),
    ("energy (gj/yr)", EnergyUnit::GJ),
];

/// Base unit assumed for wide (per-year-column) exports, which carry no unit
/// in their column names. The model's native export unit.
pub const WIDE_BASE_UNIT: EnergyUnit = EnergyUnit::PJ;

fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A loaded, normalized model export: long format with canonical columns
/// and a declared base unit for the energy measure.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub frame: DataFrame,
    pub base_unit: EnergyUnit,
}

impl Dataset {
    /// Load a CSV file and normalize it.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        log::info!(
            "loaded {}: {} rows, {} columns",
            path.display(),
            df.height(),
            df.width()
        );
        Self::from_frame(df)
    }

    /// Normalize an already-loaded frame: alias renames, wide→long melt,
    /// type casts, placeholder-sector drop, code decoration.
    pub fn from_frame(mut df: DataFrame) -> Result<Self, LoadError> {
        let mut base_unit = None;

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for name in &names {
            let key = normalize_key(name);

            if let Some((_, unit)) = ENERGY_ALIASES.iter().find(|(alias, _)| *alias == key) {
                if base_unit.is_none() && df.column(COL_ENERGY).is_err() {
                    df.rename(name, COL_ENERGY.into())?;
                    base_unit = Some(*unit);
                }
                continue;
            }

            let canonical = COLUMN_ALIASES
                .iter()
                .find(|(_, aliases)| aliases.contains(&key.as_str()))
                .map(|(canonical, _)| *canonical);
            if let Some(canonical) = canonical {
                if name != canonical && df.column(canonical).is_err() {
                    df.rename(name, canonical.into())?;
                }
            }
        }

        // Wide export: melt the per-year columns into Year/Energy rows.
        if df.column(COL_YEAR).is_err() {
            if !df
                .get_column_names()
                .iter()
                .any(|n| reshape::year_column(n.as_str()).is_some())
            {
                return Err(LoadError::MissingColumn(COL_YEAR));
            }
            df = reshape::melt_years(&df)?;
            base_unit = base_unit.or(Some(WIDE_BASE_UNIT));
        }

        let base_unit = base_unit.ok_or(LoadError::NoEnergyColumn)?;
        for required in [COL_SECTOR, COL_PROVINCE, COL_CARRIER] {
            if df.column(required).is_err() {
                return Err(LoadError::MissingColumn(required));
            }
        }
        if df.column(COL_SUBSECTOR).is_err() || df.column(COL_TECH).is_err() {
            log::warn!("subsector/tech columns missing; sunburst pages will be empty");
        }

        let year = df.column(COL_YEAR)?.cast(&DataType::Int32)?;
        df.with_column(year)?;
        let energy = df.column(COL_ENERGY)?.cast(&DataType::Float64)?;
        df.with_column(energy)?;

        // The Net-Zero export pads unmodeled rows with a placeholder sector.
        let mut frame = df.lazy().filter(col(COL_SECTOR).neq(lit("-"))).collect()?;

        reshape::decorate(&mut frame)?;

        Ok(Self { frame, base_unit })
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    /// Sorted unique string values of a column; empty if absent.
    pub fn unique_values(&self, column: &str) -> Vec<String> {
        let Ok(col) = self.frame.column(column) else {
            return Vec::new();
        };
        let mut values: Vec<String> = col
            .unique()
            .ok()
            .map(|unique| {
                let series = unique.as_materialized_series();
                (0..series.len())
                    .filter_map(|i| {
                        let val = series.get(i).ok()?;
                        if val.is_null() {
                            None
                        } else {
                            Some(val.to_string().trim_matches('"').to_string())
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        values.sort();
        values
    }

    pub fn sectors(&self) -> Vec<String> {
        self.unique_values(COL_SECTOR)
    }

    pub fn provinces(&self) -> Vec<String> {
        self.unique_values(COL_PROVINCE)
    }

    /// Sorted unique years.
    pub fn years(&self) -> Vec<i32> {
        let Ok(col) = self.frame.column(COL_YEAR) else {
            return Vec::new();
        };
        let Ok(ca) = col.i32() else {
            return Vec::new();
        };
        let mut years: Vec<i32> = ca.into_iter().flatten().collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

/// Per-carrier energy content per kilogram of carbon, from a side CSV with
/// `Carrier` and `Energy per kg C (MJ/kgC)` columns.
#[derive(Debug, Clone, Default)]
pub struct CarbonFactors {
    factors: BTreeMap<String, f64>,
}

const FACTOR_ALIASES: &[&str] = &["energy per kg c (mj/kgc)", "mj/kgc"];

impl CarbonFactors {
    pub fn from_pairs(pairs: Vec<(String, f64)>) -> Self {
        Self {
            factors: pairs.into_iter().collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(100))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let carrier_col = names
            .iter()
            .find(|n| normalize_key(n) == "carrier")
            .ok_or(LoadError::MissingColumn(COL_CARRIER))?;
        let factor_col = names
            .iter()
            .find(|n| FACTOR_ALIASES.contains(&normalize_key(n).as_str()))
            .ok_or(LoadError::MissingColumn("Energy per kg C (MJ/kgC)"))?;

        let carriers = df.column(carrier_col)?.cast(&DataType::String)?;
        let carriers = carriers.str()?;
        let factors_f64 = df.column(factor_col)?.cast(&DataType::Float64)?;
        let factors_f64 = factors_f64.f64()?;

        let mut factors = BTreeMap::new();
        for (carrier, factor) in carriers.into_iter().zip(factors_f64) {
            if let (Some(carrier), Some(factor)) = (carrier, factor) {
                if factor > 0.0 {
                    factors.insert(carrier.to_string(), factor);
                }
            }
        }
        log::info!(
            "loaded {} carbon factors from {}",
            factors.len(),
            path.display()
        );
        Ok(Self { factors })
    }

    pub fn mj_per_kgc(&self, carrier: &str) -> Option<f64> {
        self.factors.get(carrier).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn long_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("prov".into(), ["ab", "qc", "ab"].as_slice()),
            Column::new("Sector ".into(), ["Transport", "Industry", "-"].as_slice()),
            Column::new("en_carrier".into(), ["d", "ng", "c"].as_slice()),
            Column::new("year".into(), [2020i32, 2021, 2021].as_slice()),
            Column::new("Energy demand (PJ/yr)".into(), [1.0, 2.0, 3.0].as_slice()),
        ])
        .unwrap()
    }

    #[test]
    fn normalizes_aliases_units_and_codes() {
        let ds = Dataset::from_frame(long_frame()).unwrap();
        assert_eq!(ds.base_unit, EnergyUnit::PJ);
        // Placeholder sector rows are dropped.
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.sectors(), vec!["Industry", "Transport"]);
        assert_eq!(ds.provinces(), vec!["Alberta", "Quebec"]);
        assert_eq!(ds.years(), vec![2020, 2021]);
        assert_eq!(ds.unique_values(COL_CARRIER), vec!["Diesel", "NG"]);
    }

    #[test]
    fn wide_frames_are_melted_with_default_unit() {
        let df = DataFrame::new(vec![
            Column::new("prov".into(), ["ab"].as_slice()),
            Column::new("Sector".into(), ["Transport"].as_slice()),
            Column::new("en_carrier".into(), ["d"].as_slice()),
            Column::new("2000".into(), [5.0].as_slice()),
            Column::new("2001".into(), [6.0].as_slice()),
        ])
        .unwrap();
        let ds = Dataset::from_frame(df).unwrap();
        assert_eq!(ds.base_unit, WIDE_BASE_UNIT);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.years(), vec![2000, 2001]);
    }

    #[test]
    fn missing_energy_column_is_an_error() {
        let df = DataFrame::new(vec![
            Column::new("Sector".into(), ["Transport"].as_slice()),
            Column::new("Year".into(), [2020i32].as_slice()),
        ])
        .unwrap();
        assert!(matches!(
            Dataset::from_frame(df),
            Err(LoadError::NoEnergyColumn)
        ));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let df = DataFrame::new(vec![
            Column::new("Year".into(), [2020i32].as_slice()),
            Column::new("Energy (PJ/yr)".into(), [1.0].as_slice()),
        ])
        .unwrap();
        assert!(matches!(
            Dataset::from_frame(df),
            Err(LoadError::MissingColumn(COL_SECTOR))
        ));
    }

    #[test]
    fn unit_conversion_factors() {
        assert_relative_eq!(EnergyUnit::PJ.conversion_to(EnergyUnit::GJ), 1e6);
        assert_relative_eq!(EnergyUnit::GJ.conversion_to(EnergyUnit::PJ), 1e-6);
        assert_relative_eq!(EnergyUnit::TJ.conversion_to(EnergyUnit::TJ), 1.0);
    }

    #[test]
    fn loads_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "prov,Sector,en_carrier,Year,Energy demand (GJ/yr)").unwrap();
        writeln!(f, "ab,Transport,d,2020,12.5").unwrap();
        writeln!(f, "qc,Industry,e,2021,7.5").unwrap();
        drop(f);

        let ds = Dataset::load(&path).unwrap();
        assert_eq!(ds.base_unit, EnergyUnit::GJ);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.unique_values(COL_CARRIER), vec!["Diesel", "Elec"]);
    }

    #[test]
    fn carbon_factor_lookup() {
        let factors = CarbonFactors::from_pairs(vec![("Diesel".into(), 43.0)]);
        assert_relative_eq!(factors.mj_per_kgc("Diesel").unwrap(), 43.0);
        assert!(factors.mj_per_kgc("Elec").is_none());
    }
}

//! Frame reshaping: wide→long year melt, code decoration, carbon join.

use polars::prelude::*;
use thiserror::Error;

use crate::data::loader::{
    CarbonFactors, EnergyUnit, COL_CARBON, COL_CARRIER, COL_ENERGY, COL_PROVINCE, COL_TECH,
    COL_YEAR,
};
use crate::lookup;

#[derive(Error, Debug)]
pub enum ReshapeError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("No year columns to melt (expected columns named 2000..2100)")]
    NoYearColumns,
}

/// Year range recognized as wide-format value columns.
const YEAR_MIN: i32 = 2000;
const YEAR_MAX: i32 = 2100;

pub fn year_column(name: &str) -> Option<i32> {
    let year: i32 = name.trim().parse().ok()?;
    (YEAR_MIN..=YEAR_MAX).contains(&year).then_some(year)
}

/// Melt wide model output (one column per year) into long rows
/// `(ids…, Year, Energy)`. Null ids and non-finite values are skipped.
pub fn melt_years(df: &DataFrame) -> Result<DataFrame, ReshapeError> {
    let mut id_cols: Vec<&str> = Vec::new();
    let mut year_cols: Vec<(String, i32)> = Vec::new();
    for name in df.get_column_names() {
        match year_column(name) {
            Some(year) => year_cols.push((name.to_string(), year)),
            None => id_cols.push(name),
        }
    }
    if year_cols.is_empty() {
        return Err(ReshapeError::NoYearColumns);
    }
    year_cols.sort_by_key(|(_, y)| *y);

    let id_series: Vec<&Column> = id_cols
        .iter()
        .map(|name| df.column(name))
        .collect::<Result<_, _>>()?;

    let mut ids: Vec<Vec<String>> = vec![Vec::new(); id_cols.len()];
    let mut years: Vec<i32> = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    for (name, year) in &year_cols {
        let value_f64 = df.column(name)?.cast(&DataType::Float64)?;
        let value_ca = value_f64.f64()?;

        'row: for i in 0..df.height() {
            let Some(v) = value_ca.get(i) else {
                continue;
            };
            if !v.is_finite() {
                continue;
            }
            let mut row_ids = Vec::with_capacity(id_series.len());
            for col in &id_series {
                let id = col.get(i)?;
                if id.is_null() {
                    continue 'row;
                }
                row_ids.push(id.to_string().trim_matches('"').to_string());
            }
            for (slot, id) in ids.iter_mut().zip(row_ids) {
                slot.push(id);
            }
            years.push(*year);
            values.push(v);
        }
    }

    let mut columns: Vec<Column> = id_cols
        .iter()
        .zip(ids)
        .map(|(name, col)| Column::new((*name).into(), col))
        .collect();
    columns.push(Column::new(COL_YEAR.into(), years));
    columns.push(Column::new(COL_ENERGY.into(), values));

    Ok(DataFrame::new(columns)?)
}

fn map_string_column(
    df: &mut DataFrame,
    column: &str,
    map: impl Fn(&str) -> Option<&'static str>,
) -> Result<(), ReshapeError> {
    if df.column(column).is_err() {
        return Ok(());
    }
    let ca = df.column(column)?.cast(&DataType::String)?;
    let ca = ca.str()?;
    let mapped: Vec<Option<String>> = ca
        .into_iter()
        .map(|opt| opt.map(|code| map(code).map(str::to_string).unwrap_or_else(|| code.to_string())))
        .collect();
    df.with_column(Column::new(column.into(), mapped))?;
    Ok(())
}

/// Replace technical codes with display names where a table entry exists;
/// anything unmapped passes through unchanged.
pub fn decorate(df: &mut DataFrame) -> Result<(), ReshapeError> {
    map_string_column(df, COL_CARRIER, |code| {
        lookup::carrier_name(&code.to_lowercase())
    })?;
    map_string_column(df, COL_PROVINCE, lookup::province_name)?;
    map_string_column(df, COL_TECH, lookup::tech_name)?;
    Ok(())
}

/// Add a carbon measure (Mt C/yr) computed from the energy column and a
/// per-carrier energy-per-kg-carbon table. Carriers without a factor get a
/// null carbon value. PJ divided by MJ/kgC is numerically Mt C.
pub fn apply_carbon_factors(
    df: &mut DataFrame,
    factors: &CarbonFactors,
    base_unit: EnergyUnit,
) -> Result<(), ReshapeError> {
    let carriers = df.column(COL_CARRIER)?.cast(&DataType::String)?;
    let carriers = carriers.str()?;
    let energy = df.column(COL_ENERGY)?.cast(&DataType::Float64)?;
    let energy = energy.f64()?;

    let to_pj = base_unit.to_gj() / EnergyUnit::PJ.to_gj();
    let carbon: Vec<Option<f64>> = carriers
        .into_iter()
        .zip(energy)
        .map(|(carrier, value)| {
            let mj_per_kgc = factors.mj_per_kgc(carrier?)?;
            let pj = value? * to_pj;
            Some(pj / mj_per_kgc)
        })
        .collect();

    df.with_column(Column::new(COL_CARBON.into(), carbon))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wide_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("prov".into(), ["ab", "qc"].as_slice()),
            Column::new("Sector".into(), ["Transport", "Industry"].as_slice()),
            Column::new("en_carrier".into(), ["d", "ng"].as_slice()),
            Column::new("2000".into(), [1.5, 2.5].as_slice()),
            Column::new("2001".into(), [3.0, 4.0].as_slice()),
        ])
        .unwrap()
    }

    #[test]
    fn melt_produces_one_row_per_id_and_year() {
        let long = melt_years(&wide_frame()).unwrap();
        assert_eq!(long.height(), 4);
        let years: Vec<i32> = long
            .column("Year")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(years, vec![2000, 2000, 2001, 2001]);
        let values: Vec<f64> = long
            .column("Energy")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_relative_eq!(values[0], 1.5);
        assert_relative_eq!(values[3], 4.0);
    }

    #[test]
    fn melt_skips_nulls() {
        let df = DataFrame::new(vec![
            Column::new("prov".into(), ["ab", "qc"].as_slice()),
            Column::new("2010".into(), vec![Some(1.0), None]),
        ])
        .unwrap();
        let long = melt_years(&df).unwrap();
        assert_eq!(long.height(), 1);
    }

    #[test]
    fn melt_without_year_columns_is_an_error() {
        let df = DataFrame::new(vec![Column::new("prov".into(), ["ab"].as_slice())]).unwrap();
        assert!(matches!(melt_years(&df), Err(ReshapeError::NoYearColumns)));
    }

    #[test]
    fn decorate_maps_codes_and_passes_unknowns_through() {
        let mut df = DataFrame::new(vec![
            Column::new("Carrier".into(), ["d", "NG", "h2"].as_slice()),
            Column::new("Province".into(), ["ab", "Alberta", "yk"].as_slice()),
        ])
        .unwrap();
        decorate(&mut df).unwrap();
        let carriers: Vec<&str> = df
            .column("Carrier")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        // "NG" lowercases to the "ng" code and maps back to "NG".
        assert_eq!(carriers, vec!["Diesel", "NG", "h2"]);
        let provinces: Vec<&str> = df
            .column("Province")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(provinces, vec!["Alberta", "Alberta", "yk"]);
    }

    #[test]
    fn carbon_factors_add_mt_c_per_year() {
        let mut df = DataFrame::new(vec![
            Column::new("Carrier".into(), ["Diesel", "Elec"].as_slice()),
            Column::new("Energy".into(), [86.0, 10.0].as_slice()),
        ])
        .unwrap();
        let factors = CarbonFactors::from_pairs(vec![("Diesel".to_string(), 43.0)]);
        apply_carbon_factors(&mut df, &factors, EnergyUnit::PJ).unwrap();
        let carbon = df.column("Carbon").unwrap().f64().unwrap();
        assert_relative_eq!(carbon.get(0).unwrap(), 2.0);
        assert!(carbon.get(1).is_none());
    }
}

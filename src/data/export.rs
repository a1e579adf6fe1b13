//! CSV download of the aggregated values behind a chart.

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write a frame as CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), ExportError> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    log::info!("exported {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_an_aggregated_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart_data.csv");

        let mut df = DataFrame::new(vec![
            Column::new("Year".into(), [2020i32, 2020, 2021].as_slice()),
            Column::new("Carrier".into(), ["Diesel", "NG", "Diesel"].as_slice()),
            Column::new(
                "Energy demand (PJ/yr)".into(),
                [10.0, 5.0, 12.0].as_slice(),
            ),
        ])
        .unwrap();
        write_csv(&mut df, &path).unwrap();

        let back = LazyCsvReader::new(&path).finish().unwrap().collect().unwrap();
        assert_eq!(back.height(), 3);
        assert_eq!(back.width(), 3);
        let years: Vec<i32> = back
            .column("Year")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(years, vec![2020, 2020, 2021]);
    }
}

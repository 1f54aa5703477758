// src/extract/mod.rs
use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use glob::glob;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::config::PUBLIC_HOLIDAYS_TABLE;

pub mod convert;
pub mod date_parser;
pub mod holidays;
pub mod raw_table;
pub mod schema;

pub use convert::raw_table_to_batch;
pub use holidays::{fetch_public_holidays, holidays_to_batch, HolidaySource, PublicHoliday};
pub use raw_table::{read_csv_file, RawTable};

/// Read `<csv_folder>/<stem>.csv` into a typed table.
pub fn extract_csv(csv_folder: impl AsRef<Path>, stem: &str) -> Result<RecordBatch> {
    let path = csv_folder.as_ref().join(format!("{}.csv", stem));
    let raw = read_csv_file(&path)?;
    raw_table_to_batch(&raw).with_context(|| format!("typing columns of {}", path.display()))
}

/// Extract every mapped CSV plus the holiday feed.
///
/// Returns a map from table name to its rows; the holidays land under
/// `public_holidays`.
#[tracing::instrument(level = "info", skip_all, fields(folder = %csv_folder.as_ref().display()))]
pub fn extract(
    csv_folder: impl AsRef<Path>,
    csv_table_mapping: &BTreeMap<String, String>,
    public_holidays_url: &str,
) -> Result<BTreeMap<String, RecordBatch>> {
    let csv_folder = csv_folder.as_ref();

    for stray in list_unmapped_csvs(csv_folder, csv_table_mapping)? {
        warn!(file = %stray.display(), "CSV has no table mapping, skipping");
    }

    let mut tables = BTreeMap::new();
    for (stem, table_name) in csv_table_mapping {
        let batch = extract_csv(csv_folder, stem)?;
        info!(
            csv = %stem,
            table = %table_name,
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "extracted"
        );
        tables.insert(table_name.clone(), batch);
    }

    let holidays = fetch_public_holidays(public_holidays_url)?;
    tables.insert(PUBLIC_HOLIDAYS_TABLE.to_string(), holidays_to_batch(&holidays)?);

    Ok(tables)
}

/// `*.csv` files in `csv_folder` that no mapping entry names, sorted.
pub fn list_unmapped_csvs(
    csv_folder: impl AsRef<Path>,
    csv_table_mapping: &BTreeMap<String, String>,
) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.csv", csv_folder.as_ref().display());
    let mut stray = Vec::new();
    for entry in glob(&pattern).context("invalid glob pattern for CSV folder")? {
        let path = entry.context("reading CSV folder entry")?;
        let mapped = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| csv_table_mapping.contains_key(stem));
        if !mapped {
            stray.push(path);
        }
    }
    stray.sort();
    Ok(stray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture_dir() -> Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("orders.csv"),
            "order_id,order_status\no1,delivered\no2,shipped\no3,canceled\n",
        )?;
        fs::write(dir.path().join("notes.csv"), "note\nhello\n")?;
        fs::write(
            dir.path().join("holidays.json"),
            r#"[{"date":"2017-01-01","localName":"Ano Novo","name":"New Year's Day","countryCode":"BR","fixed":true,"global":true,"launchYear":null}]"#,
        )?;
        Ok(dir)
    }

    #[test]
    fn extracts_mapped_csvs_and_holidays() -> Result<()> {
        let dir = write_fixture_dir()?;
        let mapping = BTreeMap::from([("orders".to_string(), "olist_orders".to_string())]);
        let holidays = dir.path().join("holidays.json");

        let tables = extract(dir.path(), &mapping, holidays.to_str().expect("utf-8 path"))?;
        assert_eq!(
            tables.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["olist_orders", "public_holidays"]
        );
        assert_eq!(tables["olist_orders"].num_rows(), 3);
        assert_eq!(tables["public_holidays"].num_rows(), 1);
        Ok(())
    }

    #[test]
    fn reports_unmapped_files() -> Result<()> {
        let dir = write_fixture_dir()?;
        let mapping = BTreeMap::from([("orders".to_string(), "olist_orders".to_string())]);
        let stray = list_unmapped_csvs(dir.path(), &mapping)?;
        assert_eq!(stray, vec![dir.path().join("notes.csv")]);
        Ok(())
    }

    #[test]
    fn missing_csv_is_an_error() -> Result<()> {
        let dir = write_fixture_dir()?;
        let mapping = BTreeMap::from([("customers".to_string(), "olist_customers".to_string())]);
        let err = extract(dir.path(), &mapping, "unused.json").unwrap_err();
        assert!(format!("{:#}", err).contains("customers.csv"));
        Ok(())
    }
}

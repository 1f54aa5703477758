use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{io::Read, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Each data record, as a Vec of Strings (one per field).
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// All cells of column `idx`, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |row| row[idx].as_str())
    }
}

/// Read a headed CSV file into memory.
pub fn read_csv_file(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_csv(file, &path.display().to_string())
}

/// Parse CSV from any reader. `source` only names the input in errors.
///
/// Every record must have as many fields as the header; quoted fields may
/// span lines.
pub fn read_csv<R: Read>(reader: R, source: &str) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("CSV header error in {}", source))?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            // some exports lead with a UTF-8 BOM
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("CSV parse error in {} at record {}", source, idx))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

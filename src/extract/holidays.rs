// src/extract/holidays.rs

use anyhow::{anyhow, bail, Context, Result};
use arrow::{
    array::{ArrayRef, BooleanArray, Int64Array, StringArray, TimestampMicrosecondArray},
    datatypes::{DataType, Field, Schema, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::{fs, path::PathBuf, sync::Arc};
use tracing::{debug, info};
use url::Url;

/// One entry of the public-holiday feed. `counties` and `types` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicHoliday {
    pub date: NaiveDate,
    pub local_name: String,
    pub name: String,
    pub country_code: String,
    pub fixed: bool,
    pub global: bool,
    pub launch_year: Option<i64>,
}

/// Where the holiday list is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolidaySource {
    Http(Url),
    File(PathBuf),
}

impl HolidaySource {
    /// `http(s)://` → one GET; `file://` or a bare path → read from disk.
    pub fn parse(location: &str) -> Result<Self> {
        match Url::parse(location) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(HolidaySource::Http(url)),
                "file" => url
                    .to_file_path()
                    .map(HolidaySource::File)
                    .map_err(|_| anyhow!("file URL {} has no local path", url)),
                other => bail!("unsupported holiday source scheme `{}` in {}", other, location),
            },
            Err(_) => Ok(HolidaySource::File(PathBuf::from(location))),
        }
    }
}

/// Fetch and decode the holiday list. No retries.
#[tracing::instrument(level = "info")]
pub fn fetch_public_holidays(location: &str) -> Result<Vec<PublicHoliday>> {
    let holidays: Vec<PublicHoliday> = match HolidaySource::parse(location)? {
        HolidaySource::Http(url) => {
            debug!(%url, "fetching holidays");
            Client::new()
                .get(url.clone())
                .send()
                .with_context(|| format!("GET {} failed", url))?
                .error_for_status()
                .with_context(|| format!("Non-success status {}", url))?
                .json::<Vec<PublicHoliday>>()
                .with_context(|| format!("decoding holiday list from {}", url))?
        }
        HolidaySource::File(path) => {
            debug!(path = %path.display(), "reading holidays");
            let body = fs::read_to_string(&path)
                .with_context(|| format!("reading holiday file {}", path.display()))?;
            serde_json::from_str::<Vec<PublicHoliday>>(&body)
                .with_context(|| format!("decoding holiday list from {}", path.display()))?
        }
    };
    info!(count = holidays.len(), "holidays fetched");
    Ok(holidays)
}

/// Lay out the holidays as a table. `date` is midnight of the holiday.
pub fn holidays_to_batch(holidays: &[PublicHoliday]) -> Result<RecordBatch> {
    let schema = Schema::new(vec![
        Field::new("date", DataType::Timestamp(TimeUnit::Microsecond, None), true),
        Field::new("local_name", DataType::Utf8, true),
        Field::new("name", DataType::Utf8, true),
        Field::new("country_code", DataType::Utf8, true),
        Field::new("fixed", DataType::Boolean, true),
        Field::new("global", DataType::Boolean, true),
        Field::new("launch_year", DataType::Int64, true),
    ]);

    let dates = holidays
        .iter()
        .map(|h| {
            h.date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_micros())
                .ok_or_else(|| anyhow!("holiday date {} has no midnight", h.date))
        })
        .collect::<Result<Vec<i64>>>()?;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(TimestampMicrosecondArray::from(dates)),
        Arc::new(StringArray::from_iter_values(holidays.iter().map(|h| h.local_name.as_str()))),
        Arc::new(StringArray::from_iter_values(holidays.iter().map(|h| h.name.as_str()))),
        Arc::new(StringArray::from_iter_values(holidays.iter().map(|h| h.country_code.as_str()))),
        Arc::new(BooleanArray::from(holidays.iter().map(|h| h.fixed).collect::<Vec<_>>())),
        Arc::new(BooleanArray::from(holidays.iter().map(|h| h.global).collect::<Vec<_>>())),
        Arc::new(Int64Array::from(holidays.iter().map(|h| h.launch_year).collect::<Vec<_>>())),
    ];

    RecordBatch::try_new(Arc::new(schema), columns).context("building public holidays batch")
}

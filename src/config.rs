// src/config.rs

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

pub const DATASET_ROOT_PATH: &str = "dataset";
pub const QUERY_RESULTS_ROOT_PATH: &str = "tests/query_results";
pub const PUBLIC_HOLIDAYS_URL: &str = "https://date.nager.at/api/v3/PublicHolidays/2017/BR";

/// Table the holiday feed is loaded into. Not available to the CSV mapping.
pub const PUBLIC_HOLIDAYS_TABLE: &str = "public_holidays";

static SQL_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex should parse"));

/// Map from CSV file stem (without `.csv`) to the table it is loaded into.
pub fn csv_to_table_mapping() -> BTreeMap<String, String> {
    [
        ("olist_customers_dataset", "olist_customers"),
        ("olist_geolocation_dataset", "olist_geolocation"),
        ("olist_order_items_dataset", "olist_order_items"),
        ("olist_order_payments_dataset", "olist_order_payments"),
        ("olist_order_reviews_dataset", "olist_order_reviews"),
        ("olist_orders_dataset", "olist_orders"),
        ("olist_products_dataset", "olist_products"),
        ("olist_sellers_dataset", "olist_sellers"),
        (
            "product_category_name_translation",
            "product_category_name_translation",
        ),
    ]
    .into_iter()
    .map(|(csv, table)| (csv.to_string(), table.to_string()))
    .collect()
}

/// Returns true if `name` can be used unquoted as a table or column name.
pub fn is_sql_identifier(name: &str) -> bool {
    SQL_IDENTIFIER.is_match(name)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the `<stem>.csv` files.
    pub dataset_root: PathBuf,
    /// `http(s)://` URL, `file://` URL or plain path of the holiday feed.
    pub public_holidays_url: String,
    /// Directory holding `<query_name>.json` fixtures.
    pub query_results_root: PathBuf,
    /// DuckDB file to populate; `None` keeps everything in memory.
    pub database: Option<PathBuf>,
    pub tables: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_root: PathBuf::from(DATASET_ROOT_PATH),
            public_holidays_url: PUBLIC_HOLIDAYS_URL.to_string(),
            query_results_root: PathBuf::from(QUERY_RESULTS_ROOT_PATH),
            database: None,
            tables: csv_to_table_mapping(),
        }
    }
}

impl Config {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).context("parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("loading config {}", path.display()))
    }

    /// True when the loaded tables vanish with the process.
    pub fn is_in_memory(&self) -> bool {
        self.database.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            bail!("config maps no CSV files to tables");
        }
        for (csv, table) in &self.tables {
            if !is_sql_identifier(table) {
                bail!("table name `{}` for `{}.csv` is not a plain SQL identifier", table, csv);
            }
            if table == PUBLIC_HOLIDAYS_TABLE {
                bail!(
                    "`{}.csv` maps to `{}`, which is reserved for the holiday feed",
                    csv,
                    PUBLIC_HOLIDAYS_TABLE
                );
            }
        }
        if self.public_holidays_url.trim().is_empty() {
            bail!("public_holidays_url is empty");
        }
        Ok(())
    }
}

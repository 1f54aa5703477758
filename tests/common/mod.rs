#![allow(dead_code)]

use duckdb::Connection;
use olist_etl::{config::csv_to_table_mapping, populate, Config};
use once_cell::sync::Lazy;
use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub fn manifest_dir() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

pub fn holidays_fixture() -> PathBuf {
    manifest_dir().join("tests/fixtures/public_holidays_2017_br.json")
}

/// Config pointing at the sample dataset and the offline holiday snapshot.
pub fn test_config() -> Config {
    Config {
        dataset_root: manifest_dir().join("dataset"),
        public_holidays_url: holidays_fixture().display().to_string(),
        query_results_root: manifest_dir().join("tests/query_results"),
        database: None,
        tables: csv_to_table_mapping(),
    }
}

pub fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

static DATABASE: Lazy<Mutex<Connection>> = Lazy::new(|| {
    init_tracing();
    let database = populate(&test_config()).expect("sample dataset should load");
    Mutex::new(database)
});

/// The database shared by every test in this binary, built on first use.
pub fn database() -> MutexGuard<'static, Connection> {
    DATABASE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

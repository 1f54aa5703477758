pub mod config;
pub mod extract;
pub mod load;
pub mod transform;

pub use config::Config;
pub use extract::extract;
pub use load::{load, open_database};
pub use transform::{run_query, QueryName, QueryResult};

use anyhow::Result;
use duckdb::Connection;

/// Extract everything `config` names and load it into its database.
pub fn populate(config: &Config) -> Result<Connection> {
    let tables = extract(
        &config.dataset_root,
        &config.tables,
        &config.public_holidays_url,
    )?;
    let database = open_database(config.database.as_deref())?;
    load(&tables, &database)?;
    Ok(database)
}

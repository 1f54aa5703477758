use anyhow::{bail, Result};
use clap::Parser;
use duckdb::Connection;
use olist_etl::{
    config::{Config, PUBLIC_HOLIDAYS_TABLE},
    load::table_row_count,
    populate, run_query,
    transform::{verify_query, QueryName},
};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Load the Olist CSV exports into DuckDB and run the report catalog.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// YAML config file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the dataset CSVs.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Holiday feed URL or local JSON file.
    #[arg(long)]
    holidays: Option<String>,

    /// Directory holding the expected `<query>.json` results.
    #[arg(long)]
    results: Option<PathBuf>,

    /// DuckDB file to write; in-memory when omitted.
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Extract the CSVs and holidays and load them.
    Load,
    /// Load, then print a report as JSON records.
    Query {
        /// Catalog name, see `list`.
        name: Option<QueryName>,
        /// Print every report, keyed by name.
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },
    /// Print the report catalog.
    List,
    /// Load, then compare every report with its stored result.
    Verify,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };
        if let Some(dataset) = &self.dataset {
            config.dataset_root = dataset.clone();
        }
        if let Some(holidays) = &self.holidays {
            config.public_holidays_url = holidays.clone();
        }
        if let Some(results) = &self.results {
            config.query_results_root = results.clone();
        }
        if self.database.is_some() {
            config.database = self.database.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config, then extract and load everything it names.
    fn populate(&self) -> Result<(Config, Connection)> {
        let config = self.config()?;
        info!(dataset = %config.dataset_root.display(), "startup");
        let database = populate(&config)?;
        Ok((config, database))
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging (stderr, so stdout stays JSON) ──────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::List => {
            for q in QueryName::ALL {
                println!("{}", q);
            }
        }
        Commands::Load => {
            let (config, database) = cli.populate()?;
            if config.is_in_memory() {
                warn!("no --database given; the loaded tables are dropped on exit");
            }
            for table in config
                .tables
                .values()
                .map(String::as_str)
                .chain([PUBLIC_HOLIDAYS_TABLE])
            {
                info!(table, rows = table_row_count(&database, table)?, "table ready");
            }
        }
        Commands::Query { name, all } => {
            let (_, database) = cli.populate()?;
            let output = match (name, all) {
                (Some(name), _) => run_query(&database, *name)?.to_json_records(),
                (None, true) => {
                    let mut reports = serde_json::Map::new();
                    for q in QueryName::ALL {
                        reports.insert(q.to_string(), run_query(&database, q)?.to_json_records());
                    }
                    serde_json::Value::Object(reports)
                }
                (None, false) => bail!("name a query or pass --all"),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Verify => {
            let (config, database) = cli.populate()?;
            let mut failed = Vec::new();
            for q in QueryName::ALL {
                let outcome = verify_query(&database, &config.query_results_root, q)?;
                if !outcome.matches {
                    error!(
                        query = %q,
                        expected_rows = outcome.expected_rows,
                        actual_rows = outcome.actual_rows,
                        "mismatch"
                    );
                    failed.push(q.to_string());
                }
            }
            if !failed.is_empty() {
                bail!("{} report(s) differ: {}", failed.len(), failed.join(", "));
            }
            info!("all reports match");
        }
    }

    Ok(())
}

// src/load.rs

use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, AsArray, BooleanArray, PrimitiveArray, StringArray},
    datatypes::{DataType, Float64Type, Int64Type, Schema, TimeUnit, TimestampMicrosecondType},
    record_batch::RecordBatch,
};
use duckdb::{
    appender_params_from_iter,
    types::{TimeUnit as DuckTimeUnit, ToSqlOutput, ValueRef},
    Connection,
};
use std::{collections::BTreeMap, path::Path, time::Instant};
use tracing::{debug, info};

use crate::config::is_sql_identifier;

/// Open a DuckDB database at `path`, or an in-memory one when `path` is None.
pub fn open_database(path: Option<&Path>) -> Result<Connection> {
    match path {
        Some(path) => Connection::open(path)
            .with_context(|| format!("opening DuckDB database {}", path.display())),
        None => Connection::open_in_memory().context("opening in-memory DuckDB database"),
    }
}

/// Write every table into `database`, replacing same-named tables.
#[tracing::instrument(level = "info", skip_all, fields(tables = data_frames.len()))]
pub fn load(data_frames: &BTreeMap<String, RecordBatch>, database: &Connection) -> Result<()> {
    for (name, batch) in data_frames {
        load_table(database, name, batch)?;
    }
    Ok(())
}

/// Create or replace table `name` and append all rows of `batch`.
pub fn load_table(database: &Connection, name: &str, batch: &RecordBatch) -> Result<()> {
    let start = Instant::now();

    let ddl = create_table_sql(name, &batch.schema())?;
    debug!(table = %name, %ddl, "creating table");
    database
        .execute_batch(&ddl)
        .with_context(|| format!("creating table {}", name))?;

    let columns = batch
        .columns()
        .iter()
        .map(ColumnCells::new)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("table {}", name))?;

    let mut appender = database
        .appender(name)
        .with_context(|| format!("opening appender for {}", name))?;
    let columns = columns.as_slice();
    let rows = (0..batch.num_rows())
        .map(move |row| appender_params_from_iter(columns.iter().map(move |c| c.cell(row))));
    appender
        .append_rows(rows)
        .with_context(|| format!("appending rows to {}", name))?;
    appender
        .flush()
        .with_context(|| format!("flushing rows into {}", name))?;

    info!(
        table = %name,
        rows = batch.num_rows(),
        elapsed = ?start.elapsed(),
        "loaded"
    );
    Ok(())
}

/// `CREATE OR REPLACE TABLE` statement for `schema`, identifiers quoted.
pub fn create_table_sql(name: &str, schema: &Schema) -> Result<String> {
    if !is_sql_identifier(name) {
        bail!("table name `{}` is not a plain SQL identifier", name);
    }
    let columns = schema
        .fields()
        .iter()
        .map(|f| Ok(format!("{} {}", quote_ident(f.name()), sql_type(f.data_type())?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "CREATE OR REPLACE TABLE {} ({});",
        quote_ident(name),
        columns.join(", ")
    ))
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn sql_type(data_type: &DataType) -> Result<&'static str> {
    Ok(match data_type {
        DataType::Int64 => "BIGINT",
        DataType::Float64 => "DOUBLE",
        DataType::Boolean => "BOOLEAN",
        DataType::Timestamp(TimeUnit::Microsecond, None) => "TIMESTAMP",
        DataType::Utf8 => "VARCHAR",
        other => bail!("no column type mapping for {:?}", other),
    })
}

/// One arrow column, downcast once, handing out cells borrowed from it.
enum ColumnCells<'a> {
    Int64(&'a PrimitiveArray<Int64Type>),
    Float64(&'a PrimitiveArray<Float64Type>),
    Boolean(&'a BooleanArray),
    Timestamp(&'a PrimitiveArray<TimestampMicrosecondType>),
    Utf8(&'a StringArray),
}

impl<'a> ColumnCells<'a> {
    fn new(array: &'a ArrayRef) -> Result<Self> {
        Ok(match array.data_type() {
            DataType::Int64 => ColumnCells::Int64(array.as_primitive()),
            DataType::Float64 => ColumnCells::Float64(array.as_primitive()),
            DataType::Boolean => ColumnCells::Boolean(array.as_boolean()),
            DataType::Timestamp(TimeUnit::Microsecond, None) => {
                ColumnCells::Timestamp(array.as_primitive())
            }
            DataType::Utf8 => ColumnCells::Utf8(array.as_string()),
            other => bail!("cannot load column of type {:?}", other),
        })
    }

    /// Cell `row` as a DuckDB value; text is not copied.
    fn cell(&self, row: usize) -> ToSqlOutput<'a> {
        let value = match *self {
            ColumnCells::Int64(a) if a.is_valid(row) => ValueRef::BigInt(a.value(row)),
            ColumnCells::Float64(a) if a.is_valid(row) => ValueRef::Double(a.value(row)),
            ColumnCells::Boolean(a) if a.is_valid(row) => ValueRef::Boolean(a.value(row)),
            ColumnCells::Timestamp(a) if a.is_valid(row) => {
                ValueRef::Timestamp(DuckTimeUnit::Microsecond, a.value(row))
            }
            ColumnCells::Utf8(a) if a.is_valid(row) => ValueRef::Text(a.value(row).as_bytes()),
            _ => ValueRef::Null,
        };
        ToSqlOutput::Borrowed(value)
    }
}

/// `SELECT COUNT(*)` of a loaded table.
pub fn table_row_count(database: &Connection, name: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(name));
    let count: i64 = database
        .query_row(&sql, [], |r| r.get(0))
        .with_context(|| format!("counting rows of {}", name))?;
    usize::try_from(count).with_context(|| format!("row count of {} is negative", name))
}

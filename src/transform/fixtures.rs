use anyhow::{Context, Result};
use duckdb::Connection;
use serde_json::Value as JsonValue;
use std::{fs, path::Path};
use tracing::{info, warn};

use super::{run_query, QueryName};

/// Read `<results_root>/<query_name>.json`.
pub fn read_query_result(results_root: impl AsRef<Path>, name: QueryName) -> Result<JsonValue> {
    let path = results_root.as_ref().join(format!("{}.json", name));
    let body = fs::read_to_string(&path)
        .with_context(|| format!("reading expected result {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("parsing {}", path.display()))
}

/// Outcome of comparing one query with its fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub name: QueryName,
    pub matches: bool,
    pub expected_rows: usize,
    pub actual_rows: usize,
}

/// Run `name` and compare its JSON records with the stored fixture.
pub fn verify_query(
    database: &Connection,
    results_root: impl AsRef<Path>,
    name: QueryName,
) -> Result<Verification> {
    let expected = read_query_result(results_root, name)?;
    let actual = run_query(database, name)?.to_json_records();

    let expected_rows = expected.as_array().map_or(0, Vec::len);
    let actual_rows = actual.as_array().map_or(0, Vec::len);
    let matches = expected == actual;
    if matches {
        info!(query = %name, rows = actual_rows, "matches fixture");
    } else {
        warn!(query = %name, expected_rows, actual_rows, "differs from fixture");
    }

    Ok(Verification {
        name,
        matches,
        expected_rows,
        actual_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fixture_by_query_name() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("global_amount_order_status.json"),
            r#"[{"order_status":"delivered","amount":1}]"#,
        )?;
        let value = read_query_result(dir.path(), QueryName::GlobalAmountOrderStatus)?;
        assert_eq!(value[0]["amount"], 1);

        let err = read_query_result(dir.path(), QueryName::RevenuePerState).unwrap_err();
        assert!(format!("{:#}", err).contains("revenue_per_state.json"));
        Ok(())
    }

    #[test]
    fn verify_flags_a_mismatch() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("global_amount_order_status.json"),
            r#"[{"order_status":"delivered","amount":2}]"#,
        )?;
        let db = Connection::open_in_memory()?;
        db.execute_batch(
            "CREATE TABLE olist_orders (order_id VARCHAR, order_status VARCHAR);
             INSERT INTO olist_orders VALUES ('o1', 'delivered');",
        )?;

        let outcome = verify_query(&db, dir.path(), QueryName::GlobalAmountOrderStatus)?;
        assert!(!outcome.matches);
        assert_eq!((outcome.expected_rows, outcome.actual_rows), (1, 1));

        db.execute_batch("INSERT INTO olist_orders VALUES ('o2', 'delivered');")?;
        assert!(verify_query(&db, dir.path(), QueryName::GlobalAmountOrderStatus)?.matches);
        Ok(())
    }
}

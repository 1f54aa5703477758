mod common;

use anyhow::Result;
use duckdb::{types::Value, Connection};
use olist_etl::{
    config::PUBLIC_HOLIDAYS_TABLE,
    extract::{extract, fetch_public_holidays, read_csv_file},
    load::{load, open_database, quote_ident, table_row_count},
    populate,
};
use std::{
    io::{BufRead, BufReader, Write},
    net::TcpListener,
    thread,
};

fn dump_table(database: &Connection, table: &str) -> Result<Vec<Vec<Value>>> {
    let sql = format!("SELECT * FROM {} ORDER BY ALL", quote_ident(table));
    let mut stmt = database.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let width = rows.as_ref().map_or(0, |s| s.column_count());
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(
            (0..width)
                .map(|i| row.get::<usize, Value>(i))
                .collect::<duckdb::Result<Vec<_>>>()?,
        );
    }
    Ok(out)
}

#[test]
fn extraction_preserves_row_counts() -> Result<()> {
    let config = common::test_config();
    let database = common::database();
    for (stem, table) in &config.tables {
        let raw = read_csv_file(config.dataset_root.join(format!("{}.csv", stem)))?;
        assert_eq!(
            table_row_count(&database, table)?,
            raw.rows.len(),
            "{}.csv vs table {}",
            stem,
            table
        );
    }
    assert_eq!(table_row_count(&database, PUBLIC_HOLIDAYS_TABLE)?, 13);
    Ok(())
}

#[test]
fn multiline_review_survives_loading() -> Result<()> {
    let database = common::database();
    let message: String = database.query_row(
        "SELECT review_comment_message FROM olist_order_reviews WHERE review_id = 'r2'",
        [],
        |r| r.get(0),
    )?;
    assert_eq!(message, "Produto bom,\nentrega ok");
    Ok(())
}

#[test]
fn loading_twice_is_idempotent() -> Result<()> {
    common::init_tracing();
    let config = common::test_config();
    let tables = extract(
        &config.dataset_root,
        &config.tables,
        &config.public_holidays_url,
    )?;

    let once = open_database(None)?;
    load(&tables, &once)?;
    let twice = open_database(None)?;
    load(&tables, &twice)?;
    load(&tables, &twice)?;
    let fresh = populate(&config)?;

    for table in tables.keys() {
        let expected = dump_table(&once, table)?;
        assert_eq!(dump_table(&twice, table)?, expected, "{} after reload", table);
        assert_eq!(dump_table(&fresh, table)?, expected, "{} from a fresh run", table);
    }
    Ok(())
}

#[test]
fn file_backed_database_keeps_tables() -> Result<()> {
    common::init_tracing();
    let dir = tempfile::tempdir()?;
    let mut config = common::test_config();
    config.database = Some(dir.path().join("olist.duckdb"));

    drop(populate(&config)?);
    let reopened = open_database(config.database.as_deref())?;
    assert_eq!(table_row_count(&reopened, "olist_orders")?, 8);
    Ok(())
}

/// Serve `body` once with `status` on a local port; returns the base URL.
fn serve_once(status: &'static str, body: String) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut line = String::new();
            // drain the request head
            while reader.read_line(&mut line).map(|n| n > 0).unwrap_or(false) {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    Ok(format!("http://{}", addr))
}

#[test]
fn fetches_holidays_over_http() -> Result<()> {
    let body = std::fs::read_to_string(common::holidays_fixture())?;
    let base = serve_once("200 OK", body)?;

    let holidays = fetch_public_holidays(&format!("{}/api/v3/PublicHolidays/2017/BR", base))?;
    assert_eq!(holidays.len(), 13);
    assert_eq!(holidays[0].name, "New Year's Day");
    assert!(holidays.iter().all(|h| h.country_code == "BR"));
    Ok(())
}

#[test]
fn http_error_status_aborts_extraction() -> Result<()> {
    let base = serve_once("404 Not Found", "{}".to_string())?;
    let err = fetch_public_holidays(&format!("{}/missing", base)).unwrap_err();
    assert!(format!("{:#}", err).contains("Non-success status"));
    Ok(())
}

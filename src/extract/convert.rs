use crate::extract::date_parser;
use crate::extract::raw_table::RawTable;
use crate::extract::schema::{analyze_table, parse_bool, ColumnKind, SchemaInfo};
use anyhow::{Context, Result};
use arrow::{
    array::{
        ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
        TimestampMicrosecondBuilder,
    },
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Infer a schema for `table` and convert its string cells into typed columns.
pub fn raw_table_to_batch(table: &RawTable) -> Result<RecordBatch> {
    let schema_info = analyze_table(table);
    convert_to_final_types(table, &schema_info)
}

/// Build one arrow column per header using the kinds in `schema_info`.
/// Empty cells become nulls.
pub fn convert_to_final_types(table: &RawTable, schema_info: &SchemaInfo) -> Result<RecordBatch> {
    let n = table.rows.len();
    let mut out = Vec::with_capacity(schema_info.kinds.len());

    for (idx, kind) in schema_info.kinds.iter().enumerate() {
        let cells = table.column(idx).map(|raw| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        let col: ArrayRef = match kind {
            ColumnKind::Int64 => {
                let mut b = Int64Builder::with_capacity(n);
                for cell in cells {
                    b.append_option(cell.and_then(|s| s.parse().ok()));
                }
                Arc::new(b.finish())
            }
            ColumnKind::Float64 => {
                let mut b = Float64Builder::with_capacity(n);
                for cell in cells {
                    b.append_option(cell.and_then(|s| s.parse().ok()));
                }
                Arc::new(b.finish())
            }
            ColumnKind::Boolean => {
                let mut b = BooleanBuilder::with_capacity(n);
                for cell in cells {
                    b.append_option(cell.and_then(parse_bool));
                }
                Arc::new(b.finish())
            }
            ColumnKind::Timestamp => {
                let mut b = TimestampMicrosecondBuilder::with_capacity(n);
                for cell in cells {
                    b.append_option(cell.and_then(date_parser::parse_timestamp_micros));
                }
                Arc::new(b.finish())
            }
            ColumnKind::Utf8 => {
                // text keeps its original spacing; only empty cells are null
                let mut b = StringBuilder::with_capacity(n, 16 * n);
                for raw in table.column(idx) {
                    if raw.is_empty() {
                        b.append_null();
                    } else {
                        b.append_value(raw);
                    }
                }
                Arc::new(b.finish())
            }
        };
        out.push(col);
    }

    RecordBatch::try_new(Arc::new(schema_info.schema.clone()), out)
        .context("building record batch from CSV columns")
}

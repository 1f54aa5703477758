use crate::extract::date_parser;
use crate::extract::raw_table::RawTable;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};

/// Storage type picked for one CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int64,
    Float64,
    Boolean,
    Timestamp,
    Utf8,
}

impl ColumnKind {
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Int64 => DataType::Int64,
            ColumnKind::Float64 => DataType::Float64,
            ColumnKind::Boolean => DataType::Boolean,
            ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            ColumnKind::Utf8 => DataType::Utf8,
        }
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Pick the narrowest kind every non-empty value parses as.
///
/// Precedence is Int64, Float64, Boolean, Timestamp, then Utf8. A column
/// without any non-empty value is Utf8.
pub fn infer_column_kind<'a>(values: impl IntoIterator<Item = &'a str>) -> ColumnKind {
    let (mut int, mut float, mut boolean, mut timestamp) = (true, true, true, true);
    let mut seen_value = false;

    for raw in values {
        let v = raw.trim();
        if v.is_empty() {
            continue;
        }
        seen_value = true;

        int = int && v.parse::<i64>().is_ok();
        float = float && v.parse::<f64>().is_ok();
        boolean = boolean && parse_bool(v).is_some();
        timestamp = timestamp && date_parser::parse_timestamp_micros(v).is_some();

        if !(int || float || boolean || timestamp) {
            return ColumnKind::Utf8;
        }
    }

    match (seen_value, int, float, boolean, timestamp) {
        (false, ..) => ColumnKind::Utf8,
        (true, true, ..) => ColumnKind::Int64,
        (true, false, true, ..) => ColumnKind::Float64,
        (true, false, false, true, _) => ColumnKind::Boolean,
        (true, false, false, false, true) => ColumnKind::Timestamp,
        _ => ColumnKind::Utf8,
    }
}

/// Holds the final arrow schema plus the per-column kinds it was built from.
#[derive(Debug, Clone)]
pub struct SchemaInfo {
    pub schema: Schema,
    pub kinds: Vec<ColumnKind>,
}

/// Scan every column of `table` and derive its schema. All fields are nullable.
pub fn analyze_table(table: &RawTable) -> SchemaInfo {
    let kinds: Vec<ColumnKind> = (0..table.headers.len())
        .map(|i| infer_column_kind(table.column(i)))
        .collect();
    let fields: Vec<Field> = table
        .headers
        .iter()
        .zip(&kinds)
        .map(|(name, kind)| Field::new(name, kind.data_type(), true))
        .collect();

    SchemaInfo {
        schema: Schema::new(fields),
        kinds,
    }
}

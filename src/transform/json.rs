use anyhow::{bail, Context, Result};
use duckdb::types::{TimeUnit, Value};
use serde_json::{Number, Value as JsonValue};

/// Render one DuckDB cell the way the fixtures store it.
///
/// Integers stay integers, floats stay floats (NaN → null), and temporal
/// values become epoch milliseconds. Nested, binary and interval values have
/// no fixture representation and are rejected.
pub fn value_to_json(value: Value) -> Result<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(v) => v.into(),
        Value::SmallInt(v) => v.into(),
        Value::Int(v) => v.into(),
        Value::BigInt(v) => v.into(),
        Value::UTinyInt(v) => v.into(),
        Value::USmallInt(v) => v.into(),
        Value::UInt(v) => v.into(),
        Value::UBigInt(v) => v.into(),
        // SUM over BIGINT widens to HUGEINT
        Value::HugeInt(v) => match i64::try_from(v) {
            Ok(small) => small.into(),
            Err(_) => float_to_json(v as f64),
        },
        Value::Float(v) => float_to_json(f64::from(v)),
        Value::Double(v) => float_to_json(v),
        Value::Decimal(d) => {
            let text = d.to_string();
            float_to_json(
                text.parse::<f64>()
                    .with_context(|| format!("decimal {} does not fit a double", text))?,
            )
        }
        Value::Text(s) => JsonValue::String(s),
        Value::Timestamp(unit, v) => timestamp_millis(unit, v).into(),
        Value::Date32(days) => (i64::from(days) * 86_400_000).into(),
        other => bail!("no JSON rendering for DuckDB value of type {:?}", other.data_type()),
    })
}

pub fn float_to_json(v: f64) -> JsonValue {
    Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn timestamp_millis(unit: TimeUnit, v: i64) -> i64 {
    match unit {
        TimeUnit::Second => v * 1_000,
        TimeUnit::Millisecond => v,
        TimeUnit::Microsecond => v.div_euclid(1_000),
        TimeUnit::Nanosecond => v.div_euclid(1_000_000),
    }
}

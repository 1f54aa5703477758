// src/transform/mod.rs

use anyhow::{anyhow, Context, Result};
use duckdb::{types::Value, Connection};
use serde_json::{Map, Value as JsonValue};
use std::{fmt, str::FromStr};
use tracing::debug;

pub mod fixtures;
pub mod json;

pub use fixtures::{read_query_result, verify_query, Verification};
use json::value_to_json;

/// The fixed report catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryName {
    RevenueByMonthYear,
    DeliveryDateDifference,
    GlobalAmountOrderStatus,
    RevenuePerState,
    Top10RevenueCategories,
    Top10LeastRevenueCategories,
    RealVsEstimatedDeliveredTime,
    OrdersPerDayAndHolidays2017,
    FreightValueWeightRelationship,
}

impl QueryName {
    pub const ALL: [QueryName; 9] = [
        QueryName::RevenueByMonthYear,
        QueryName::DeliveryDateDifference,
        QueryName::GlobalAmountOrderStatus,
        QueryName::RevenuePerState,
        QueryName::Top10RevenueCategories,
        QueryName::Top10LeastRevenueCategories,
        QueryName::RealVsEstimatedDeliveredTime,
        QueryName::OrdersPerDayAndHolidays2017,
        QueryName::FreightValueWeightRelationship,
    ];

    /// Catalog name; also the fixture file stem. The older stems
    /// `global_ammount_order_status` and `get_freight_value_weight_relationship`
    /// still parse, see [`QueryName::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryName::RevenueByMonthYear => "revenue_by_month_year",
            QueryName::DeliveryDateDifference => "delivery_date_difference",
            QueryName::GlobalAmountOrderStatus => "global_amount_order_status",
            QueryName::RevenuePerState => "revenue_per_state",
            QueryName::Top10RevenueCategories => "top_10_revenue_categories",
            QueryName::Top10LeastRevenueCategories => "top_10_least_revenue_categories",
            QueryName::RealVsEstimatedDeliveredTime => "real_vs_estimated_delivered_time",
            QueryName::OrdersPerDayAndHolidays2017 => "orders_per_day_and_holidays_2017",
            QueryName::FreightValueWeightRelationship => "freight_value_weight_relationship",
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            QueryName::RevenueByMonthYear => include_str!("../../queries/revenue_by_month_year.sql"),
            QueryName::DeliveryDateDifference => {
                include_str!("../../queries/delivery_date_difference.sql")
            }
            QueryName::GlobalAmountOrderStatus => {
                include_str!("../../queries/global_amount_order_status.sql")
            }
            QueryName::RevenuePerState => include_str!("../../queries/revenue_per_state.sql"),
            QueryName::Top10RevenueCategories => {
                include_str!("../../queries/top_10_revenue_categories.sql")
            }
            QueryName::Top10LeastRevenueCategories => {
                include_str!("../../queries/top_10_least_revenue_categories.sql")
            }
            QueryName::RealVsEstimatedDeliveredTime => {
                include_str!("../../queries/real_vs_estimated_delivered_time.sql")
            }
            QueryName::OrdersPerDayAndHolidays2017 => {
                include_str!("../../queries/orders_per_day_and_holidays_2017.sql")
            }
            QueryName::FreightValueWeightRelationship => {
                include_str!("../../queries/freight_value_weight_relationship.sql")
            }
        }
    }
}

impl fmt::Display for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        match wanted.as_str() {
            "global_ammount_order_status" => return Ok(QueryName::GlobalAmountOrderStatus),
            "get_freight_value_weight_relationship" => {
                return Ok(QueryName::FreightValueWeightRelationship)
            }
            _ => {}
        }
        QueryName::ALL
            .into_iter()
            .find(|q| q.as_str() == wanted)
            .ok_or_else(|| anyhow!("unknown query `{}`", s))
    }
}

/// A named result set. Cells are already rendered as JSON scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub name: QueryName,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `[{column: value, ...}, ...]`, one object per row in result order.
    pub fn to_json_records(&self) -> JsonValue {
        JsonValue::Array(
            self.rows
                .iter()
                .map(|row| {
                    let record: Map<String, JsonValue> =
                        self.columns.iter().cloned().zip(row.iter().cloned()).collect();
                    JsonValue::Object(record)
                })
                .collect(),
        )
    }
}

/// Run one catalog query.
#[tracing::instrument(level = "info", skip(database), fields(query = %name))]
pub fn run_query(database: &Connection, name: QueryName) -> Result<QueryResult> {
    let mut stmt = database
        .prepare(name.sql())
        .with_context(|| format!("preparing query {}", name))?;
    let mut rows = stmt
        .query([])
        .with_context(|| format!("executing query {}", name))?;
    let columns: Vec<String> = rows
        .as_ref()
        .map(|s| s.column_names())
        .unwrap_or_default();

    let mut out = Vec::new();
    while let Some(row) = rows
        .next()
        .with_context(|| format!("fetching row from {}", name))?
    {
        let cells = (0..columns.len())
            .map(|idx| {
                row.get::<usize, Value>(idx)
                    .map_err(anyhow::Error::from)
                    .and_then(value_to_json)
                    .with_context(|| format!("decoding column {} of {}", columns[idx], name))
            })
            .collect::<Result<Vec<_>>>()?;
        out.push(cells);
    }

    debug!(rows = out.len(), columns = columns.len(), "query finished");
    Ok(QueryResult {
        name,
        columns,
        rows: out,
    })
}

pub fn query_revenue_by_month_year(database: &Connection) -> Result<QueryResult> {
    run_query(database, QueryName::RevenueByMonthYear)
}

pub fn query_delivery_date_difference(database: &Connection) -> Result<QueryResult> {
    run_query(database, QueryName::DeliveryDateDifference)
}

pub fn query_global_amount_order_status(database: &Connection) -> Result<QueryResult> {
    run_query(database, QueryName::GlobalAmountOrderStatus)
}

pub fn query_revenue_per_state(database: &Connection) -> Result<QueryResult> {
    run_query(database, QueryName::RevenuePerState)
}

pub fn query_top_10_revenue_categories(database: &Connection) -> Result<QueryResult> {
    run_query(database, QueryName::Top10RevenueCategories)
}

pub fn query_top_10_least_revenue_categories(database: &Connection) -> Result<QueryResult> {
    run_query(database, QueryName::Top10LeastRevenueCategories)
}

pub fn query_real_vs_estimated_delivered_time(database: &Connection) -> Result<QueryResult> {
    run_query(database, QueryName::RealVsEstimatedDeliveredTime)
}

pub fn query_orders_per_day_and_holidays_2017(database: &Connection) -> Result<QueryResult> {
    run_query(database, QueryName::OrdersPerDayAndHolidays2017)
}

pub fn query_freight_value_weight_relationship(database: &Connection) -> Result<QueryResult> {
    run_query(database, QueryName::FreightValueWeightRelationship)
}

//! The row-level display table.
//!
//! Source column order is kept. Internal-only columns are dropped and the
//! derived `Net Worth` column is appended last.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{columns, Transaction};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTable {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
}

impl DisplayTable {
    pub fn build(source_columns: &[String], transactions: &[Transaction]) -> Self {
        let columns = display_columns(source_columns);

        let rows = transactions
            .iter()
            .map(|tx| {
                let obj: Map<String, Value> = columns
                    .iter()
                    .map(|name| (name.clone(), cell_value(tx, name)))
                    .collect();
                Value::Object(obj)
            })
            .collect();

        DisplayTable { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Visible columns for a source header.
pub fn display_columns(source_columns: &[String]) -> Vec<String> {
    let mut visible: Vec<String> = source_columns
        .iter()
        .filter(|c| !columns::INTERNAL.contains(&c.as_str()))
        .cloned()
        .collect();

    if !visible.iter().any(|c| c == columns::NET_WORTH) {
        visible.push(columns::NET_WORTH.to_string());
    }
    visible
}

fn cell_value(tx: &Transaction, column: &str) -> Value {
    let text = |s: &str| Value::String(s.to_string());

    match column {
        columns::DATE => Value::String(tx.date.format("%Y-%m-%d").to_string()),
        columns::DESCRIPTION => text(&tx.description),
        columns::CATEGORY_GROUP => text(&tx.category_group),
        columns::CATEGORY => text(&tx.category),
        columns::MEMO => text(&tx.memo),
        columns::OUTFLOW => number(tx.outflow),
        columns::INFLOW => number(tx.inflow),
        columns::NET_WORTH => number(tx.net_worth()),
        columns::RUNNING_BALANCE => text(&tx.running_balance),
        columns::ACCOUNT => text(&tx.account),
        columns::ACCOUNT_TYPE => text(&tx.account_type),
        other => tx
            .extra
            .get(other)
            .map(|v| text(v))
            .unwrap_or(Value::Null),
    }
}

fn number(value: Decimal) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::columns::REGISTER_HEADER;
    use crate::parser::parse_bytes;
    use crate::transform::clean::clean;

    fn header() -> Vec<String> {
        REGISTER_HEADER.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn internal_columns_dropped() {
        let cols = display_columns(&header());
        assert_eq!(
            cols,
            vec![
                "Date",
                "Description",
                "Category Group",
                "Category",
                "Memo",
                "Outflow",
                "Inflow",
                "Running Balance",
                "Account",
                "Account Type",
                "Net Worth",
            ]
        );
    }

    #[test]
    fn source_order_kept() {
        let source: Vec<String> = ["Inflow", "Flag", "Date", "Outflow", "Payee"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            display_columns(&source),
            vec!["Inflow", "Date", "Outflow", "Payee", "Net Worth"]
        );
    }

    #[test]
    fn rows_carry_typed_values() {
        let ds = parse_bytes(
            b"Date,Category,Outflow,Inflow,Payee,Cleared\n01/31/2024,,\"$1,234.56\",,Landlord,Cleared",
        )
        .unwrap();
        let cleaned = clean(&ds).unwrap();
        let table = DisplayTable::build(&cleaned.columns, &cleaned.transactions);

        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row["Date"], "2024-01-31");
        assert_eq!(row["Category"], "No Category");
        assert!((row["Outflow"].as_f64().unwrap() - 1234.56).abs() < 1e-9);
        assert_eq!(row["Inflow"].as_f64(), Some(0.0));
        assert!((row["Net Worth"].as_f64().unwrap() + 1234.56).abs() < 1e-9);
        assert_eq!(row["Payee"], "Landlord");
        assert!(row.get("Cleared").is_none());
    }
}

//! Cleaning: raw register cells into typed, default-filled transactions.
//!
//! Default rules, applied per field before anything is derived:
//!
//! | Column           | When blank       |
//! |------------------|------------------|
//! | `Category Group` | `"No Category"`  |
//! | `Category`       | `"No Category"`  |
//! | `Memo`           | `"No Memo"`      |
//! | `Flag`           | `"No Flag"`      |
//! | `Outflow`        | `0`              |
//! | `Inflow`         | `0`              |
//! | everything else  | empty string     |
//!
//! `Date`, `Outflow` and `Inflow` must be present in the header. A missing
//! optional column is treated as a column of blanks.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{SchemaError, SchemaResult};
use crate::models::{columns, Transaction, NO_CATEGORY, NO_FLAG, NO_MEMO};
use crate::parser::Dataset;

/// Currency symbols, thousands separators and whitespace.
static CURRENCY_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\$€£¥,\s]").expect("static regex"));

/// Candidate `Date` formats, in preference order. Each two-digit-year form
/// comes before its `%Y` twin, which would read `24` as the year 24.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%y",
    "%m-%d-%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%Y.%m.%d",
];

/// Years before this are misread two-digit years.
const MIN_YEAR: i32 = 1000;

/// A dataset after cleaning.
#[derive(Debug, Clone, Default)]
pub struct CleanedDataset {
    /// Source header row, in file order
    pub columns: Vec<String>,
    /// One transaction per source row
    pub transactions: Vec<Transaction>,
}

impl CleanedDataset {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Header positions of the register columns, resolved once per dataset.
struct ColumnMap {
    date: usize,
    outflow: usize,
    inflow: usize,
    description: Option<usize>,
    category_group: Option<usize>,
    category: Option<usize>,
    memo: Option<usize>,
    running_balance: Option<usize>,
    account: Option<usize>,
    account_type: Option<usize>,
    flag: Option<usize>,
    category_group_category: Option<usize>,
    cleared: Option<usize>,
    extra: Vec<(usize, String)>,
}

impl ColumnMap {
    fn resolve(dataset: &Dataset) -> SchemaResult<Self> {
        let required = |name: &str| {
            dataset
                .column_index(name)
                .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
        };

        let extra = dataset
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !is_known_column(h))
            .map(|(i, h)| (i, h.clone()))
            .collect();

        Ok(ColumnMap {
            date: required(columns::DATE)?,
            outflow: required(columns::OUTFLOW)?,
            inflow: required(columns::INFLOW)?,
            description: dataset.column_index(columns::DESCRIPTION),
            category_group: dataset.column_index(columns::CATEGORY_GROUP),
            category: dataset.column_index(columns::CATEGORY),
            memo: dataset.column_index(columns::MEMO),
            running_balance: dataset.column_index(columns::RUNNING_BALANCE),
            account: dataset.column_index(columns::ACCOUNT),
            account_type: dataset.column_index(columns::ACCOUNT_TYPE),
            flag: dataset.column_index(columns::FLAG),
            category_group_category: dataset.column_index(columns::CATEGORY_GROUP_CATEGORY),
            cleared: dataset.column_index(columns::CLEARED),
            extra,
        })
    }
}

/// Register and derived columns; anything else is passed through.
pub(crate) fn is_known_column(name: &str) -> bool {
    columns::REGISTER_HEADER.contains(&name)
        || [columns::MONTH_YEAR, columns::MONTH, columns::NET_WORTH].contains(&name)
}

/// Clean every row of `dataset`. Never drops rows: a row that cannot be
/// cleaned fails the whole run.
///
/// One date format is chosen for the whole `Date` column, so `01/02/2024`
/// and `13/02/2024` in the same file are never read with different layouts.
pub fn clean(dataset: &Dataset) -> SchemaResult<CleanedDataset> {
    let map = ColumnMap::resolve(dataset)?;

    let dates: Vec<&str> = dataset
        .rows
        .iter()
        .map(|row| cell(row, Some(map.date)))
        .collect();
    let date_format = infer_date_format(&dates);

    let transactions = dataset
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| clean_row(i + 1, row, &map, date_format))
        .collect::<SchemaResult<Vec<_>>>()?;

    Ok(CleanedDataset {
        columns: dataset.headers.clone(),
        transactions,
    })
}

fn clean_row(
    row_number: usize,
    row: &[String],
    map: &ColumnMap,
    date_format: Option<&str>,
) -> SchemaResult<Transaction> {
    let raw_date = cell(row, Some(map.date));
    let date = date_format
        .and_then(|fmt| parse_date_with(raw_date, fmt))
        .ok_or_else(|| SchemaError::InvalidDate {
        row: row_number,
        value: raw_date.to_string(),
    })?;

    let outflow = parse_amount(row_number, columns::OUTFLOW, cell(row, Some(map.outflow)))?;
    let inflow = parse_amount(row_number, columns::INFLOW, cell(row, Some(map.inflow)))?;

    let extra: HashMap<String, String> = map
        .extra
        .iter()
        .map(|(i, name)| (name.clone(), row.get(*i).cloned().unwrap_or_default()))
        .collect();

    Ok(Transaction {
        date,
        description: text_or(row, map.description, ""),
        category_group: text_or(row, map.category_group, NO_CATEGORY),
        category: text_or(row, map.category, NO_CATEGORY),
        memo: text_or(row, map.memo, NO_MEMO),
        outflow,
        inflow,
        running_balance: text_or(row, map.running_balance, ""),
        account: text_or(row, map.account, ""),
        account_type: text_or(row, map.account_type, ""),
        flag: text_or(row, map.flag, NO_FLAG),
        category_group_category: text_or(row, map.category_group_category, ""),
        cleared: text_or(row, map.cleared, ""),
        extra,
    })
}

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i))
        .map(|s| s.trim())
        .unwrap_or_default()
}

fn text_or(row: &[String], idx: Option<usize>, default: &str) -> String {
    match cell(row, idx) {
        "" => default.to_string(),
        value => value.to_string(),
    }
}

/// Parse a currency string such as `"$1,234.56"` into a non-negative decimal.
///
/// Blank means zero. Text with no digits, or that is not a number once the
/// symbols and separators are gone, is an error, as is a negative value
/// (leading `-` or accounting parentheses).
pub fn parse_amount(row: usize, column: &str, raw: &str) -> SchemaResult<Decimal> {
    let invalid = || SchemaError::InvalidAmount {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let (parenthesized, inner) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let stripped = CURRENCY_NOISE.replace_all(inner, "");
    let value = Decimal::from_str(&stripped).map_err(|_| invalid())?;

    if parenthesized || value < Decimal::ZERO {
        return Err(SchemaError::NegativeAmount {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        });
    }

    Ok(value)
}

/// Parse a single register date with the first format that reads it.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let fmt = infer_date_format(&[raw])?;
    parse_date_with(raw, fmt)
}

/// Pick one format for a column of dates.
///
/// Candidates are the formats that read the first non-blank value. The first
/// candidate that also reads every other value wins; when none does, the
/// first candidate is used and the rows it rejects are reported.
pub fn infer_date_format(values: &[&str]) -> Option<&'static str> {
    let mut present = values.iter().map(|v| v.trim()).filter(|v| !v.is_empty());
    let first = present.next()?;
    let rest: Vec<&str> = present.collect();

    let candidates: Vec<&'static str> = DATE_FORMATS
        .iter()
        .copied()
        .filter(|fmt| parse_date_with(first, fmt).is_some())
        .collect();

    candidates
        .iter()
        .copied()
        .find(|fmt| rest.iter().all(|v| parse_date_with(v, fmt).is_some()))
        .or_else(|| candidates.first().copied())
}

fn parse_date_with(raw: &str, fmt: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let date = if fmt.contains("%H") {
        NaiveDateTime::parse_from_str(s, fmt).ok()?.date()
    } else {
        NaiveDate::parse_from_str(s, fmt).ok()?
    };
    (date.year() >= MIN_YEAR).then_some(date)
}

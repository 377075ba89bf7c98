//! Domain models for the register analysis pipeline.
//!
//! - [`Transaction`] - one cleaned register row
//! - [`Period`] - a `YYYY-MM` month bucket
//! - [`columns`] - the register header contract

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Header Contract
// =============================================================================

/// Column names of the register export.
pub mod columns {
    pub const DATE: &str = "Date";
    pub const DESCRIPTION: &str = "Description";
    pub const CATEGORY_GROUP: &str = "Category Group";
    pub const CATEGORY: &str = "Category";
    pub const MEMO: &str = "Memo";
    pub const OUTFLOW: &str = "Outflow";
    pub const INFLOW: &str = "Inflow";
    pub const RUNNING_BALANCE: &str = "Running Balance";
    pub const ACCOUNT: &str = "Account";
    pub const ACCOUNT_TYPE: &str = "Account Type";
    pub const FLAG: &str = "Flag";
    pub const CATEGORY_GROUP_CATEGORY: &str = "Category Group/Category";
    pub const CLEARED: &str = "Cleared";

    /// Derived: `YYYY-MM` label of `Date`.
    pub const MONTH_YEAR: &str = "Month-Year";
    /// Derived: calendar month of `Date`.
    pub const MONTH: &str = "Month";
    /// Derived: `Inflow - Outflow`.
    pub const NET_WORTH: &str = "Net Worth";

    /// Full header of a register export, in export order.
    pub const REGISTER_HEADER: &[&str] = &[
        DATE,
        DESCRIPTION,
        CATEGORY_GROUP,
        CATEGORY,
        MEMO,
        OUTFLOW,
        INFLOW,
        RUNNING_BALANCE,
        ACCOUNT,
        ACCOUNT_TYPE,
        FLAG,
        CATEGORY_GROUP_CATEGORY,
        CLEARED,
    ];

    /// Columns kept out of the display table.
    pub const INTERNAL: &[&str] = &[FLAG, CATEGORY_GROUP_CATEGORY, CLEARED, MONTH_YEAR, MONTH];
}

pub const NO_CATEGORY: &str = "No Category";
pub const NO_MEMO: &str = "No Memo";
pub const NO_FLAG: &str = "No Flag";

// =============================================================================
// Period
// =============================================================================

/// A calendar month, ordered chronologically and rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Returns `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Period { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))?;
        let year: i32 = year.parse().map_err(|_| format!("invalid year in '{}'", s))?;
        let month: u32 = month.parse().map_err(|_| format!("invalid month in '{}'", s))?;
        Period::new(year, month).ok_or_else(|| format!("month out of range in '{}'", s))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// One cleaned register row.
///
/// Optional text fields are already default-filled; amounts are
/// non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub category_group: String,
    pub category: String,
    pub memo: String,
    pub outflow: Decimal,
    pub inflow: Decimal,
    pub running_balance: String,
    pub account: String,
    pub account_type: String,
    pub flag: String,
    pub category_group_category: String,
    pub cleared: String,
    /// Columns outside the register contract, passed through as text.
    pub extra: HashMap<String, String>,
}

impl Transaction {
    /// `Month-Year` bucket.
    pub fn period(&self) -> Period {
        Period::of(self.date)
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        self.period().month()
    }

    /// `Inflow - Outflow`.
    pub fn net_worth(&self) -> Decimal {
        self.inflow - self.outflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn period_display_is_zero_padded() {
        assert_eq!(Period::of(date(2024, 3, 9)).to_string(), "2024-03");
        assert_eq!(Period::new(987, 11).unwrap().to_string(), "0987-11");
    }

    #[test]
    fn period_orders_chronologically() {
        let dec_2023 = Period::new(2023, 12).unwrap();
        let jan_2024 = Period::new(2024, 1).unwrap();
        let feb_2024 = Period::new(2024, 2).unwrap();
        assert!(dec_2023 < jan_2024);
        assert!(jan_2024 < feb_2024);
    }

    #[test]
    fn period_rejects_bad_month() {
        assert!(Period::new(2024, 0).is_none());
        assert!(Period::new(2024, 13).is_none());
        assert!("2024-13".parse::<Period>().is_err());
        assert!("202401".parse::<Period>().is_err());
    }

    #[test]
    fn period_parses_its_own_display() {
        let p: Period = "2024-07".parse().unwrap();
        assert_eq!(p, Period::new(2024, 7).unwrap());
    }

    #[test]
    fn period_serializes_as_label() {
        let json = serde_json::to_string(&Period::new(2024, 5).unwrap()).unwrap();
        assert_eq!(json, "\"2024-05\"");
    }

    #[test]
    fn transaction_derived_fields() {
        let tx = Transaction {
            date: date(2024, 2, 29),
            description: "Paycheck".into(),
            category_group: NO_CATEGORY.into(),
            category: NO_CATEGORY.into(),
            memo: NO_MEMO.into(),
            outflow: dec("12.50"),
            inflow: dec("1000"),
            running_balance: String::new(),
            account: "Checking".into(),
            account_type: String::new(),
            flag: NO_FLAG.into(),
            category_group_category: String::new(),
            cleared: String::new(),
            extra: HashMap::new(),
        };
        assert_eq!(tx.period().to_string(), "2024-02");
        assert_eq!(tx.month(), 2);
        assert_eq!(tx.period().month(), tx.month());
        assert_eq!(tx.net_worth(), dec("987.50"));
    }
}

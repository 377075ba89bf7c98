//! Row filters: exact category match and an inclusive date range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::models::Transaction;

/// Optional filters applied after cleaning and before aggregation.
///
/// Every field is optional; the default filter keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilter {
    /// Keep only rows whose `Category` equals this value exactly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Inclusive lower bound on `Date`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on `Date`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl DashboardFilter {
    /// Build a filter from loosely-formatted request values.
    ///
    /// Blank strings mean "no filter". Dates may be `YYYY-MM-DD` or a full
    /// timestamp such as `2024-01-31T00:00:00`, of which only the date is kept.
    pub fn from_raw(
        category: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> FilterResult<Self> {
        Ok(DashboardFilter {
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            start_date: parse_bound("startDate", start_date)?,
            end_date: parse_bound("endDate", end_date)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(ref category) = self.category {
            if tx.category != *category {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if tx.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if tx.date > end {
                return false;
            }
        }
        true
    }

    /// Keep the matching transactions, in their original order.
    pub fn apply(&self, transactions: Vec<Transaction>) -> Vec<Transaction> {
        if self.is_empty() {
            return transactions;
        }
        transactions.into_iter().filter(|tx| self.matches(tx)).collect()
    }
}

fn parse_bound(field: &'static str, raw: Option<&str>) -> FilterResult<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FilterError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(on: NaiveDate, category: &str) -> Transaction {
        Transaction {
            date: on,
            description: String::new(),
            category_group: String::new(),
            category: category.to_string(),
            memo: String::new(),
            outflow: Decimal::ONE,
            inflow: Decimal::ZERO,
            running_balance: String::new(),
            account: String::new(),
            account_type: String::new(),
            flag: String::new(),
            category_group_category: String::new(),
            cleared: String::new(),
            extra: HashMap::new(),
        }
    }

    #[test]
    fn default_keeps_everything() {
        let f = DashboardFilter::default();
        assert!(f.is_empty());
        let rows = vec![tx(date(2024, 1, 1), "Rent"), tx(date(2024, 2, 1), "Food")];
        assert_eq!(f.apply(rows).len(), 2);
    }

    #[test]
    fn category_is_exact_match() {
        let f = DashboardFilter {
            category: Some("Rent".into()),
            ..Default::default()
        };
        assert!(f.matches(&tx(date(2024, 1, 1), "Rent")));
        assert!(!f.matches(&tx(date(2024, 1, 1), "rent")));
        assert!(!f.matches(&tx(date(2024, 1, 1), "Rent ")));
    }

    #[test]
    fn date_range_is_inclusive() {
        let f = DashboardFilter {
            start_date: Some(date(2024, 1, 1)),
            end_date: Some(date(2024, 1, 31)),
            ..Default::default()
        };
        assert!(f.matches(&tx(date(2024, 1, 1), "A")));
        assert!(f.matches(&tx(date(2024, 1, 31), "A")));
        assert!(!f.matches(&tx(date(2023, 12, 31), "A")));
        assert!(!f.matches(&tx(date(2024, 2, 1), "A")));
    }

    #[test]
    fn open_bounds() {
        let from = DashboardFilter {
            start_date: Some(date(2024, 6, 1)),
            ..Default::default()
        };
        assert!(from.matches(&tx(date(2030, 1, 1), "A")));
        assert!(!from.matches(&tx(date(2024, 5, 31), "A")));

        let until = DashboardFilter {
            end_date: Some(date(2024, 6, 1)),
            ..Default::default()
        };
        assert!(until.matches(&tx(date(1999, 1, 1), "A")));
        assert!(!until.matches(&tx(date(2024, 6, 2), "A")));
    }

    #[test]
    fn inverted_range_keeps_nothing() {
        let f = DashboardFilter {
            start_date: Some(date(2024, 3, 1)),
            end_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(f.apply(vec![tx(date(2024, 2, 1), "A")]).is_empty());
    }

    #[test]
    fn from_raw_blank_means_none() {
        let f = DashboardFilter::from_raw(Some("  "), Some(""), None).unwrap();
        assert!(f.is_empty());
    }

    #[test]
    fn from_raw_accepts_timestamps() {
        let f = DashboardFilter::from_raw(None, Some("2024-01-05T00:00:00"), Some("2024-02-01"))
            .unwrap();
        assert_eq!(f.start_date, Some(date(2024, 1, 5)));
        assert_eq!(f.end_date, Some(date(2024, 2, 1)));
    }

    #[test]
    fn from_raw_rejects_bad_dates() {
        let err = DashboardFilter::from_raw(None, Some("01/05/2024"), None).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidDate { field: "startDate", ref value } if value == "01/05/2024"
        ));
    }
}

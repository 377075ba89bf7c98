//! Chart aggregates over cleaned (and filtered) transactions.
//!
//! Every function is a pure derivation of its input slice. Group keys only
//! come from rows that are present, so a category or period with no rows
//! never shows up, not even as zero.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::models::{Period, Transaction};

/// Outflow and inflow totals for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyFlow {
    pub period: Period,
    pub outflow: Decimal,
    pub inflow: Decimal,
}

/// One cell of the long-form category-by-month spending table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub period: Period,
    pub category: String,
    pub outflow: Decimal,
}

/// Net worth change in one month and the running total up to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthPoint {
    pub period: Period,
    pub change: Decimal,
    pub net_worth: Decimal,
}

/// One pie slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub outflow: Decimal,
    /// Fraction of the total outflow, 0..=1, rounded to 4 places
    pub share: Decimal,
}

/// A zero-filled 2-D table. `values[r][c]` belongs to `rows[r]` and `columns[c]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Matrix<R, C> {
    pub rows: Vec<R>,
    pub columns: Vec<C>,
    pub values: Vec<Vec<Decimal>>,
}

impl<R, C> Matrix<R, C> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R, C> Default for Matrix<R, C> {
    fn default() -> Self {
        Matrix {
            rows: Vec::new(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }
}

/// Sum `(row, column, value)` triples into a dense matrix with sorted axes.
fn pivot<R, C, I>(cells: I) -> Matrix<R, C>
where
    R: Ord + Clone,
    C: Ord + Clone,
    I: IntoIterator<Item = (R, C, Decimal)>,
{
    let mut sums: BTreeMap<(R, C), Decimal> = BTreeMap::new();
    let mut rows = BTreeSet::new();
    let mut columns = BTreeSet::new();

    for (r, c, value) in cells {
        rows.insert(r.clone());
        columns.insert(c.clone());
        *sums.entry((r, c)).or_insert(Decimal::ZERO) += value;
    }

    let rows: Vec<R> = rows.into_iter().collect();
    let columns: Vec<C> = columns.into_iter().collect();
    let values = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| {
                    sums.get(&(r.clone(), c.clone()))
                        .copied()
                        .unwrap_or(Decimal::ZERO)
                })
                .collect()
        })
        .collect();

    Matrix {
        rows,
        columns,
        values,
    }
}

/// Outflow and inflow summed per month, in period order.
pub fn monthly_flow(transactions: &[Transaction]) -> Vec<MonthlyFlow> {
    let mut by_period: BTreeMap<Period, (Decimal, Decimal)> = BTreeMap::new();
    for tx in transactions {
        let entry = by_period
            .entry(tx.period())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += tx.outflow;
        entry.1 += tx.inflow;
    }

    by_period
        .into_iter()
        .map(|(period, (outflow, inflow))| MonthlyFlow {
            period,
            outflow,
            inflow,
        })
        .collect()
}

/// Outflow per category (rows) and month (columns), zero-filled.
pub fn seasonal_heatmap(transactions: &[Transaction]) -> Matrix<String, Period> {
    pivot(
        transactions
            .iter()
            .map(|tx| (tx.category.clone(), tx.period(), tx.outflow)),
    )
}

/// Outflow per calendar month 1-12 (rows) and category (columns), zero-filled.
///
/// Folds every year together, so it shows which months are expensive.
pub fn calendar_seasonality(transactions: &[Transaction]) -> Matrix<u32, String> {
    pivot(
        transactions
            .iter()
            .map(|tx| (tx.month(), tx.category.clone(), tx.outflow)),
    )
}

/// Category spending over time in long form.
///
/// Zero-filled for every (category, period) pair in the input, in
/// category-major order: all periods of the first category, then the next.
pub fn category_spending(transactions: &[Transaction]) -> Vec<CategorySpending> {
    let matrix = seasonal_heatmap(transactions);

    matrix
        .rows
        .iter()
        .zip(&matrix.values)
        .flat_map(|(category, row)| {
            matrix
                .columns
                .iter()
                .zip(row)
                .map(move |(period, outflow)| CategorySpending {
                    period: *period,
                    category: category.clone(),
                    outflow: *outflow,
                })
        })
        .collect()
}

/// Per-month net worth change and its running sum, in period order.
pub fn net_worth_over_time(transactions: &[Transaction]) -> Vec<NetWorthPoint> {
    let mut by_period: BTreeMap<Period, Decimal> = BTreeMap::new();
    for tx in transactions {
        *by_period.entry(tx.period()).or_insert(Decimal::ZERO) += tx.net_worth();
    }

    let mut running = Decimal::ZERO;
    by_period
        .into_iter()
        .map(|(period, change)| {
            running += change;
            NetWorthPoint {
                period,
                change,
                net_worth: running,
            }
        })
        .collect()
}

/// Total outflow per category with its share of the whole, by category.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryShare> {
    let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    for tx in transactions {
        *by_category.entry(tx.category.as_str()).or_insert(Decimal::ZERO) += tx.outflow;
    }

    let total: Decimal = by_category.values().copied().sum();

    by_category
        .into_iter()
        .map(|(category, outflow)| CategoryShare {
            category: category.to_string(),
            outflow,
            share: if total.is_zero() {
                Decimal::ZERO
            } else {
                (outflow / total).round_dp(4)
            },
        })
        .collect()
}

/// Distinct categories in first-appearance order.
pub fn category_options(transactions: &[Transaction]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut options = Vec::new();
    for tx in transactions {
        if seen.insert(tx.category.as_str()) {
            options.push(tx.category.clone());
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn tx(on: &str, category: &str, outflow: &str, inflow: &str) -> Transaction {
        Transaction {
            date: NaiveDate::parse_from_str(on, "%Y-%m-%d").unwrap(),
            description: String::new(),
            category_group: String::new(),
            category: category.to_string(),
            memo: String::new(),
            outflow: dec(outflow),
            inflow: dec(inflow),
            running_balance: String::new(),
            account: String::new(),
            account_type: String::new(),
            flag: String::new(),
            category_group_category: String::new(),
            cleared: String::new(),
            extra: HashMap::new(),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("2024-02-10", "Rent", "1000", "0"),
            tx("2024-01-05", "Groceries", "50.25", "0"),
            tx("2024-01-15", "Income", "0", "3000"),
            tx("2024-01-20", "Groceries", "20.75", "0"),
            tx("2023-12-24", "Gifts", "80", "0"),
            tx("2024-12-01", "Gifts", "40", "0"),
        ]
    }

    #[test]
    fn monthly_flow_sorted_and_summed() {
        let flow = monthly_flow(&sample());
        let periods: Vec<String> = flow.iter().map(|f| f.period.to_string()).collect();
        assert_eq!(periods, vec!["2023-12", "2024-01", "2024-02", "2024-12"]);

        assert_eq!(flow[1].outflow, dec("71.00"));
        assert_eq!(flow[1].inflow, dec("3000"));
    }

    #[test]
    fn monthly_flow_preserves_total_outflow() {
        let rows = sample();
        let from_rows: Decimal = rows.iter().map(|t| t.outflow).sum();
        let from_flow: Decimal = monthly_flow(&rows).iter().map(|f| f.outflow).sum();
        assert_eq!(from_rows, from_flow);
    }

    #[test]
    fn seasonal_heatmap_zero_fills() {
        let m = seasonal_heatmap(&sample());
        assert_eq!(m.rows, vec!["Gifts", "Groceries", "Income", "Rent"]);
        assert_eq!(m.columns.len(), 4);
        assert!(m.values.iter().all(|row| row.len() == m.columns.len()));

        // Rent only appears in 2024-02
        let rent = &m.values[3];
        assert_eq!(rent, &vec![Decimal::ZERO, Decimal::ZERO, dec("1000"), Decimal::ZERO]);
    }

    #[test]
    fn calendar_seasonality_folds_years() {
        let m = calendar_seasonality(&sample());
        assert_eq!(m.rows, vec![1, 2, 12]);
        let gifts = m.columns.iter().position(|c| c == "Gifts").unwrap();
        // December 2023 and December 2024 land in the same row
        assert_eq!(m.values[2][gifts], dec("120"));
    }

    #[test]
    fn category_spending_is_long_form_category_major() {
        let long = category_spending(&sample());
        // 4 categories x 4 periods
        assert_eq!(long.len(), 16);
        assert!(long[..4].iter().all(|c| c.category == "Gifts"));
        assert_eq!(long[0].period, period("2023-12"));
        assert_eq!(long[3].period, period("2024-12"));

        let rent_jan = long
            .iter()
            .find(|c| c.category == "Rent" && c.period == period("2024-01"))
            .unwrap();
        assert_eq!(rent_jan.outflow, Decimal::ZERO);
    }

    #[test]
    fn net_worth_is_running_sum() {
        let points = net_worth_over_time(&sample());
        assert_eq!(points.len(), 4);

        let mut expected = Decimal::ZERO;
        for p in &points {
            expected += p.change;
            assert_eq!(p.net_worth, expected);
        }
        assert_eq!(points[0].change, dec("-80"));
        assert_eq!(points[1].net_worth, dec("2849.00"));
    }

    #[test]
    fn category_breakdown_totals_and_shares() {
        let slices = category_breakdown(&sample());
        let names: Vec<&str> = slices.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["Gifts", "Groceries", "Income", "Rent"]);

        let rent = slices.iter().find(|s| s.category == "Rent").unwrap();
        assert_eq!(rent.outflow, dec("1000"));
        assert_eq!(rent.share, dec("0.8396"));

        let income = slices.iter().find(|s| s.category == "Income").unwrap();
        assert_eq!(income.share, Decimal::ZERO);
    }

    #[test]
    fn category_breakdown_all_zero_outflow() {
        let slices = category_breakdown(&[tx("2024-01-01", "Income", "0", "10")]);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].share, Decimal::ZERO);
    }

    #[test]
    fn category_options_first_appearance_order() {
        assert_eq!(
            category_options(&sample()),
            vec!["Rent", "Groceries", "Income", "Gifts"]
        );
    }

    #[test]
    fn empty_input_gives_empty_aggregates() {
        assert!(monthly_flow(&[]).is_empty());
        assert!(category_spending(&[]).is_empty());
        assert!(seasonal_heatmap(&[]).is_empty());
        assert!(calendar_seasonality(&[]).is_empty());
        assert!(net_worth_over_time(&[]).is_empty());
        assert!(category_breakdown(&[]).is_empty());
        assert!(category_options(&[]).is_empty());
    }
}

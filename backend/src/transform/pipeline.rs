//! High-level pipeline: decoded register in, dashboard bundle out.
//!
//! Order of operations, run in full on every call: **clean → filter →
//! aggregate**. Nothing is cached between calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use register_analysis::{dashboard_from_payload, DashboardFilter};
//!
//! let run = dashboard_from_payload(&contents, &DashboardFilter::default())?;
//! println!("{} months of data", run.dashboard.monthly_flow.len());
//! ```

use serde::Serialize;

use super::aggregate::{
    calendar_seasonality, category_breakdown, category_options, category_spending, monthly_flow,
    net_worth_over_time, seasonal_heatmap, CategoryShare, CategorySpending, Matrix, MonthlyFlow,
    NetWorthPoint,
};
use super::clean::clean;
use super::filter::DashboardFilter;
use super::table::DisplayTable;
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::PipelineResult;
use crate::models::Period;
use crate::parser::{decode_payload, parse_bytes, Dataset};

/// Everything the dashboard renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Monthly inflow vs outflow
    pub monthly_flow: Vec<MonthlyFlow>,
    /// Category spending over time (long form)
    pub category_spending: Vec<CategorySpending>,
    /// Category x month outflow
    pub seasonal_heatmap: Matrix<String, Period>,
    /// Calendar month x category outflow
    pub calendar_seasonality: Matrix<u32, String>,
    /// Cumulative net worth
    pub net_worth: Vec<NetWorthPoint>,
    /// Expenses by category
    pub category_breakdown: Vec<CategoryShare>,
    /// Transaction table
    pub table: DisplayTable,
    /// Selectable categories
    pub categories: Vec<String>,
}

impl Dashboard {
    /// The all-empty dashboard shown before an upload or after a failure.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// A finished pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRun {
    pub dashboard: Dashboard,
    /// Rows in the upload
    pub row_count: usize,
    /// Rows left after filtering
    pub filtered_row_count: usize,
    /// Source header row
    pub columns: Vec<String>,
}

/// Build the dashboard for a decoded register.
pub fn build_dashboard(dataset: &Dataset, filter: &DashboardFilter) -> PipelineResult<DashboardRun> {
    log_info("🧹 Cleaning register...");
    let cleaned = clean(dataset)?;
    log_success(format!("Cleaned {} rows", cleaned.len()));

    let row_count = cleaned.len();
    let columns = cleaned.columns;

    let transactions = if filter.is_empty() {
        cleaned.transactions
    } else {
        log_info(format!("🔎 Applying filter: {}", describe_filter(filter)));
        let kept = filter.apply(cleaned.transactions);
        log_success(format!("{} of {} rows match", kept.len(), row_count));
        kept
    };

    if transactions.is_empty() {
        log_warning("No rows to aggregate");
    }

    log_info("📊 Aggregating...");
    let dashboard = Dashboard {
        monthly_flow: monthly_flow(&transactions),
        category_spending: category_spending(&transactions),
        seasonal_heatmap: seasonal_heatmap(&transactions),
        calendar_seasonality: calendar_seasonality(&transactions),
        net_worth: net_worth_over_time(&transactions),
        category_breakdown: category_breakdown(&transactions),
        table: DisplayTable::build(&columns, &transactions),
        categories: category_options(&transactions),
    };
    log_success(format!(
        "{} months, {} categories",
        dashboard.monthly_flow.len(),
        dashboard.categories.len()
    ));

    Ok(DashboardRun {
        dashboard,
        row_count,
        filtered_row_count: transactions.len(),
        columns,
    })
}

/// Decode a data-URL payload and build its dashboard.
pub fn dashboard_from_payload(
    payload: &str,
    filter: &DashboardFilter,
) -> PipelineResult<DashboardRun> {
    log_info("📖 Decoding upload payload...");
    let dataset = decode_payload(payload)?;
    log_read(&dataset);
    build_dashboard(&dataset, filter)
}

/// Parse raw CSV bytes and build their dashboard.
pub fn dashboard_from_bytes(bytes: &[u8], filter: &DashboardFilter) -> PipelineResult<DashboardRun> {
    log_info("📖 Reading CSV file...");
    let dataset = parse_bytes(bytes)?;
    log_read(&dataset);
    build_dashboard(&dataset, filter)
}

fn log_read(dataset: &Dataset) {
    log_info_indent(format!("Encoding: {}", dataset.encoding), 1);
    log_info_indent(format!("Delimiter: {:?}", dataset.delimiter), 1);
    log_success(format!("Read {} rows, {} columns", dataset.len(), dataset.headers.len()));
}

fn describe_filter(filter: &DashboardFilter) -> String {
    let mut parts = Vec::new();
    if let Some(ref c) = filter.category {
        parts.push(format!("category = '{}'", c));
    }
    match (filter.start_date, filter.end_date) {
        (Some(s), Some(e)) => parts.push(format!("{} ≤ date ≤ {}", s, e)),
        (Some(s), None) => parts.push(format!("date ≥ {}", s)),
        (None, Some(e)) => parts.push(format!("date ≤ {}", e)),
        (None, None) => {}
    }
    parts.join(", ")
}

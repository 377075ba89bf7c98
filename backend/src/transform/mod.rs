//! Transformation module.
//!
//! This module turns a decoded register into dashboard data:
//! - Clean: typed transactions with per-field defaults
//! - Filter: category and date-range selection
//! - Aggregate: chart-ready series and matrices
//! - Table: row-level display table
//! - Pipeline: clean → filter → aggregate in one call

pub mod aggregate;
pub mod clean;
pub mod filter;
pub mod pipeline;
pub mod table;

pub use aggregate::*;
pub use clean::{clean, parse_amount, parse_date, CleanedDataset};
pub use filter::DashboardFilter;
pub use pipeline::*;
pub use table::{display_columns, DisplayTable};

//! # Register Analysis - budget register dashboards
//!
//! Register Analysis turns a budget-register CSV export (one row per
//! transaction) into chart-ready dashboard data: monthly flow, category
//! spending, seasonal heatmaps, net worth over time, a category breakdown
//! and the row-level table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Data URL / │────▶│   Parser    │────▶│  Transform  │────▶│  Dashboard  │
//! │  CSV bytes  │     │  (auto-enc) │     │ (clean+agg) │     │    JSON     │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use register_analysis::{dashboard_from_bytes, DashboardFilter};
//!
//! let bytes = std::fs::read("register.csv")?;
//! let run = dashboard_from_bytes(&bytes, &DashboardFilter::default())?;
//! println!("{} categories", run.dashboard.categories.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Transaction, Period, column names)
//! - [`parser`] - Payload decoding and CSV parsing with auto-detection
//! - [`transform`] - Cleaning, filtering, aggregation and the pipeline
//! - [`config`] - Server configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    DecodeError, DecodeResult, FilterError, FilterResult, PipelineError, PipelineResult,
    SchemaError, SchemaResult, ServerError, ServerResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Period, Transaction};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, decode_payload, detect_delimiter, detect_encoding, parse_bytes,
    parse_csv_file, parse_str, split_payload, Dataset,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    build_dashboard, clean, dashboard_from_bytes, dashboard_from_payload, CleanedDataset,
    Dashboard, DashboardFilter, DashboardRun, DisplayTable,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{
    error_response, handle_bytes, handle_payload, reject, DashboardRequest, DashboardResponse,
    ErrorKind,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}

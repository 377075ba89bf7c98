//! Error types for the register analysis pipeline.
//!
//! - [`DecodeError`] - the upload payload cannot be decoded or parsed
//! - [`SchemaError`] - the decoded table does not satisfy the register contract
//! - [`FilterError`] - a dashboard filter value cannot be read
//! - [`PipelineError`] - top-level wrapper returned by the dashboard builder
//! - [`ServerError`] - HTTP request errors
//!
//! Conversion is automatic via `From`, so `?` works across the
//! decode/transform boundary.

use thiserror::Error;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors while turning an upload payload into a tabular dataset.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not `<header>,<body>`.
    #[error("Malformed payload: expected '<content-type>,<body>'")]
    MalformedPayload,

    /// Payload header is not a base64 data URL.
    #[error("Unsupported payload header '{0}': expected 'data:<mime>;base64'")]
    UnsupportedHeader(String),

    /// Body is not valid base64.
    #[error("Invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Body is not text in a supported encoding.
    #[error("Failed to decode text: {0}")]
    Encoding(String),

    /// Body is not delimited text.
    #[error("Invalid delimited text at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors while cleaning a decoded dataset into transactions.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A required column is absent from the header row.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A currency field could not be parsed.
    #[error("Row {row}, column '{column}': invalid amount '{value}'")]
    InvalidAmount {
        row: usize,
        column: String,
        value: String,
    },

    /// A currency field parsed to a negative value.
    #[error("Row {row}, column '{column}': negative amount '{value}'")]
    NegativeAmount {
        row: usize,
        column: String,
        value: String,
    },

    /// A date field could not be parsed.
    #[error("Row {row}: invalid date '{value}'")]
    InvalidDate { row: usize, value: String },
}

// =============================================================================
// Filter Errors
// =============================================================================

/// Errors while reading dashboard filter values.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A date bound is not `YYYY-MM-DD`.
    #[error("{field} must be YYYY-MM-DD, got '{value}'")]
    InvalidDate { field: &'static str, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline error.
///
/// This is the error type returned by
/// [`crate::transform::pipeline::build_dashboard`] and the payload helpers
/// around it.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Decoding error.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Schema error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Filter values could not be read.
    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request body over the configured upload limit.
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for cleaning operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for filter parsing.
pub type FilterResult<T> = Result<T, FilterError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

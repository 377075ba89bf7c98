//! REST API types for frontend integration.
//!
//! The dashboard is returned chart-ready. Failures still carry a full,
//! empty dashboard so the frontend can render the same layout.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::logs::{log_error, with_job};
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::transform::filter::DashboardFilter;
use crate::transform::pipeline::{
    dashboard_from_bytes, dashboard_from_payload, Dashboard, DashboardRun,
};

/// Body of `POST /api/dashboard`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRequest {
    /// `data:<mime>;base64,<body>` upload payload
    pub contents: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl DashboardRequest {
    pub fn filter(&self) -> ServerResult<DashboardFilter> {
        Ok(DashboardFilter::from_raw(
            self.category.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// At least one row survived the filter
    Ready,
    /// Valid upload, but nothing to chart
    Empty,
    Error,
}

/// What went wrong, for clients and for the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Unreadable request, body or filter values
    BadRequest,
    /// Body over the upload limit
    PayloadTooLarge,
    /// Payload could not be decoded into a table
    Decode,
    /// Table does not satisfy the register columns
    Schema,
}

impl ErrorKind {
    pub fn of(err: &ServerError) -> Self {
        match err {
            ServerError::BadRequest(_) | ServerError::Filter(_) => ErrorKind::BadRequest,
            ServerError::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            ServerError::Pipeline(PipelineError::Decode(_)) => ErrorKind::Decode,
            ServerError::Pipeline(PipelineError::Schema(_)) => ErrorKind::Schema,
        }
    }
}

/// Response sent to the frontend for every dashboard request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Unique job identifier, also stamped on the job's log lines
    pub job_id: String,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub dashboard: Dashboard,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Rows in the upload
    pub row_count: usize,
    /// Rows charted after filtering
    pub filtered_row_count: usize,
    /// Source header row
    pub columns: Vec<String>,
    /// Filter that was applied
    pub filter: DashboardFilter,
}

impl DashboardResponse {
    pub fn from_run(job_id: String, run: DashboardRun, filter: DashboardFilter) -> Self {
        let status = if run.filtered_row_count == 0 {
            ResponseStatus::Empty
        } else {
            ResponseStatus::Ready
        };

        DashboardResponse {
            job_id,
            status,
            error: None,
            error_kind: None,
            dashboard: run.dashboard,
            metadata: ResponseMetadata {
                row_count: run.row_count,
                filtered_row_count: run.filtered_row_count,
                columns: run.columns,
                filter,
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }
}

/// Create an error response with an empty dashboard.
pub fn error_response(
    job_id: String,
    error: &ServerError,
    filter: DashboardFilter,
) -> DashboardResponse {
    DashboardResponse {
        job_id,
        status: ResponseStatus::Error,
        error: Some(error.to_string()),
        error_kind: Some(ErrorKind::of(error)),
        dashboard: Dashboard::empty(),
        metadata: ResponseMetadata {
            filter,
            ..Default::default()
        },
    }
}

/// Run one dashboard job under a fresh job id.
fn run_job<F>(filter: &DashboardFilter, job: F) -> DashboardResponse
where
    F: FnOnce() -> ServerResult<DashboardRun>,
{
    let job_id = Uuid::new_v4().to_string();

    with_job(job_id.clone(), || match job() {
        Ok(run) => DashboardResponse::from_run(job_id.clone(), run, filter.clone()),
        Err(e) => {
            log_error(e.to_string());
            error_response(job_id.clone(), &e, filter.clone())
        }
    })
}

/// Decode a payload and build its dashboard. Never fails: errors come back
/// as a response with `status: "error"`.
pub fn handle_payload(payload: &str, filter: &DashboardFilter) -> DashboardResponse {
    run_job(filter, || Ok(dashboard_from_payload(payload, filter)?))
}

/// Same as [`handle_payload`] for raw CSV bytes.
pub fn handle_bytes(bytes: &[u8], filter: &DashboardFilter) -> DashboardResponse {
    run_job(filter, || Ok(dashboard_from_bytes(bytes, filter)?))
}

/// Error response for a request rejected before any pipeline work.
pub fn reject(error: ServerError) -> DashboardResponse {
    run_job(&DashboardFilter::default(), || Err(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::logs::LOG_BROADCASTER;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    fn payload(csv: &str) -> String {
        format!("data:text/csv;base64,{}", STANDARD.encode(csv))
    }

    #[test]
    fn request_accepts_camel_case_fields() {
        let req: DashboardRequest = serde_json::from_value(json!({
            "contents": "data:text/csv;base64,",
            "category": "Rent",
            "startDate": "2024-01-01T00:00:00",
        }))
        .unwrap();
        let filter = req.filter().unwrap();
        assert_eq!(filter.category.as_deref(), Some("Rent"));
        assert!(filter.start_date.is_some());
        assert!(filter.end_date.is_none());
    }

    #[test]
    fn bad_filter_date_is_filter_error() {
        let req: DashboardRequest = serde_json::from_value(json!({
            "contents": "",
            "endDate": "yesterday",
        }))
        .unwrap();
        let err = req.filter().unwrap_err();
        assert!(matches!(err, ServerError::Filter(_)));
        assert_eq!(ErrorKind::of(&err), ErrorKind::BadRequest);
    }

    #[test]
    fn handle_payload_ready() {
        let csv = "Date,Category,Outflow,Inflow\n2024-01-02,Rent,\"$1,000.00\",\n";
        let response = handle_payload(&payload(csv), &DashboardFilter::default());
        assert_eq!(response.status, ResponseStatus::Ready);
        assert_eq!(response.metadata.row_count, 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ready");
        assert!(json.get("error").is_none());
        assert!(json.get("errorKind").is_none());
        assert_eq!(json["dashboard"]["categories"], json!(["Rent"]));
        assert_eq!(json["metadata"]["filteredRowCount"], 1);
    }

    #[test]
    fn handle_payload_error_never_panics() {
        let response = handle_payload("garbage", &DashboardFilter::default());
        assert!(response.is_error());
        assert_eq!(response.error_kind, Some(ErrorKind::Decode));
        assert!(response.error.is_some());
        assert!(response.dashboard.is_empty());
        assert!(response.dashboard.categories.is_empty());
    }

    #[test]
    fn missing_column_reported_as_schema_error() {
        let response = handle_bytes(b"Date,Inflow\n2024-01-01,5\n", &DashboardFilter::default());
        assert!(response.is_error());
        assert_eq!(response.error_kind, Some(ErrorKind::Schema));
        assert!(response.error.unwrap().contains("Outflow"));
    }

    #[test]
    fn filter_matching_nothing_is_empty_status() {
        let csv = "Date,Category,Outflow,Inflow\n2024-01-02,Rent,10,\n";
        let filter = DashboardFilter {
            category: Some("Travel".into()),
            ..Default::default()
        };
        let response = handle_payload(&payload(csv), &filter);
        assert_eq!(response.status, ResponseStatus::Empty);
        assert_eq!(response.metadata.row_count, 1);
        assert_eq!(response.metadata.filtered_row_count, 0);
    }

    #[test]
    fn reject_wraps_request_errors() {
        let response = reject(ServerError::PayloadTooLarge("limit".into()));
        assert!(response.is_error());
        assert_eq!(response.error_kind, Some(ErrorKind::PayloadTooLarge));
        assert!(response.dashboard.is_empty());
    }

    #[test]
    fn job_logs_carry_response_job_id() {
        let mut rx = LOG_BROADCASTER.subscribe();
        let csv = "Date,Outflow,Inflow\n2024-01-02,1,\n";
        let response = handle_bytes(csv.as_bytes(), &DashboardFilter::default());

        // Other tests share the global stream; look for this job's lines
        let mut mine = 0;
        loop {
            match rx.try_recv() {
                Ok(entry) => {
                    if entry.job_id.as_deref() == Some(response.job_id.as_str()) {
                        mine += 1;
                    }
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        assert!(mine > 0);
    }
}

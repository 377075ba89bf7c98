//! HTTP server for the register dashboard API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/dashboard`  | Dashboard from a data-URL JSON body  |
//! | POST   | `/api/upload`     | Dashboard from a multipart CSV file  |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart,
    },
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{
    handle_bytes, handle_payload, reject, DashboardRequest, DashboardResponse, ErrorKind,
};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::transform::filter::DashboardFilter;

type ApiResponse = (StatusCode, Json<DashboardResponse>);

/// Build the application router.
pub fn router(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/dashboard", post(dashboard))
        .route("/api/upload", post(upload_csv))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.addr()?;
    let app = router(&config);

    tracing::info!(%addr, "🚀 Register analysis server running");
    tracing::info!("   POST /api/dashboard - Dashboard from data URL");
    tracing::info!("   POST /api/upload    - Upload CSV file");
    tracing::info!("   GET  /api/logs      - SSE log stream");
    tracing::info!("   GET  /health        - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "register-analysis",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "dashboard": "POST /api/dashboard",
            "upload": "POST /api/upload",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip the dropped entries
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn status_code(kind: Option<ErrorKind>) -> StatusCode {
    match kind {
        None => StatusCode::OK,
        Some(ErrorKind::BadRequest | ErrorKind::Decode) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::PayloadTooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
        Some(ErrorKind::Schema) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn respond(response: DashboardResponse) -> ApiResponse {
    (status_code(response.error_kind), Json(response))
}

/// Map an extractor failure onto the error envelope.
fn rejected(status: StatusCode, message: String) -> ServerError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(message)
    } else {
        ServerError::BadRequest(message)
    }
}

/// Dashboard from a JSON body carrying a data-URL payload
async fn dashboard(request: Result<Json<DashboardRequest>, JsonRejection>) -> ApiResponse {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            return respond(reject(rejected(rejection.status(), rejection.body_text())))
        }
    };

    let response = match request.filter() {
        Ok(filter) => {
            tracing::info!("📄 NEW PAYLOAD ({} bytes)", request.contents.len());
            handle_payload(&request.contents, &filter)
        }
        Err(e) => reject(e),
    };
    respond(response)
}

/// Upload CSV endpoint
async fn upload_csv(multipart: Result<Multipart, MultipartRejection>) -> ApiResponse {
    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await,
        Err(rejection) => Err(rejected(rejection.status(), rejection.body_text())),
    };

    let response = match upload {
        Ok(upload) => {
            tracing::info!(
                "📄 NEW UPLOAD: {} ({} bytes)",
                upload.file_name.as_deref().unwrap_or("unknown"),
                upload.bytes.len()
            );
            handle_bytes(&upload.bytes, &upload.filter)
        }
        Err(e) => reject(e),
    };
    respond(response)
}

struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
    filter: DashboardFilter,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut category: Option<String> = None;
    let mut start_date: Option<String> = None;
    let mut end_date: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(e.status(), format!("Multipart error: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| rejected(e.status(), format!("Read error: {}", e.body_text())))?;
                file_data = Some(bytes.to_vec());
            }
            "category" | "startDate" | "endDate" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| rejected(e.status(), format!("Read error: {}", e.body_text())))?;
                match name.as_str() {
                    "category" => category = Some(text),
                    "startDate" => start_date = Some(text),
                    _ => end_date = Some(text),
                }
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    let filter = DashboardFilter::from_raw(
        category.as_deref(),
        start_date.as_deref(),
        end_date.as_deref(),
    )?;

    Ok(Upload {
        file_name,
        bytes,
        filter,
    })
}

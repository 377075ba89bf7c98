//! Pipeline progress streaming via Server-Sent Events (SSE).
//!
//! Every progress line goes two ways: into `tracing` for the process log,
//! and onto a broadcast channel that `/api/logs` forwards to browsers.
//!
//! Lines logged inside [`with_job`] carry that job's id, so a client can pick
//! its own run out of the shared stream.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the broadcast ring. Slow subscribers lose the oldest lines.
const CHANNEL_CAPACITY: usize = 100;

tokio::task_local! {
    static CURRENT_JOB: String;
}

/// Run `f` with every log line it emits tagged with `job_id`.
pub fn with_job<R>(job_id: impl Into<String>, f: impl FnOnce() -> R) -> R {
    CURRENT_JOB.sync_scope(job_id.into(), f)
}

fn current_job() -> Option<String> {
    CURRENT_JOB.try_with(|id| id.clone()).ok()
}

/// Log level for frontend display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single progress line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Run that emitted the line, matching `DashboardResponse::job_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for sub-steps
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            job_id: None,
            level,
            message: message.into(),
            indent: 0,
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Fans progress lines out to every connected SSE client.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn log(&self, mut entry: LogEntry) {
        if entry.job_id.is_none() {
            entry.job_id = current_job();
        }

        let job = entry.job_id.as_deref().unwrap_or("-");
        let pad = "   ".repeat(entry.indent as usize);
        match entry.level {
            LogLevel::Info => tracing::info!(job, "{}{}", pad, entry.message),
            LogLevel::Success => tracing::info!(job, "{}✓ {}", pad, entry.message),
            LogLevel::Warning => tracing::warn!(job, "{}{}", pad, entry.message),
            LogLevel::Error => tracing::error!(job, "{}{}", pad, entry.message),
        }

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg).with_indent(indent));
}

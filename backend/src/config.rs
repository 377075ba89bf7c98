//! Server configuration.
//!
//! Defaults live here. The CLI overrides them from flags or the matching
//! `REGISTER_*` environment variables (a `.env` file is loaded first).

use std::net::SocketAddr;

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Maximum upload size in megabytes.
///
/// Applies to both the JSON data-URL body and multipart uploads.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// Maximum upload size (in bytes).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = DEFAULT_MAX_UPLOAD_MB * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16, max_upload_mb: usize) -> Self {
        Self {
            host: host.into(),
            port,
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        }
    }

    /// Resolve the socket address to bind.
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

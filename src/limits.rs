//! Connection and request parsing limits.
//!
//! Grounded in the teacher crate's `limits.rs`: conservative defaults
//! guard against resource exhaustion and slowloris-style stalls, trimmed
//! down to the knobs this server's fixed ten-worker pool (C8) actually
//! needs. Unlike the teacher, buffer sizes are not pre-allocated per
//! connection up front — bodies here are file uploads of unbounded size —
//! so `ReqLimits` only bounds the request line/header section, not the body.

use crate::http::types::Version;
use std::time::Duration;

/// Connection-level timeouts (C7).
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Maximum duration to wait for reading data from the socket (default: 10s).
    pub socket_read_timeout: Duration,
    /// Maximum duration to wait for writing a response (default: 10s).
    pub socket_write_timeout: Duration,
}

impl Default for ConnLimits {
    fn default() -> Self {
        Self {
            socket_read_timeout: Duration::from_secs(10),
            socket_write_timeout: Duration::from_secs(10),
        }
    }
}

/// Request-line/header parsing limits (C1). The body has no independent
/// limit: its length is dictated by `Content-Length`.
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Maximum number of headers per request (default: 32).
    pub header_count: usize,
    /// Maximum single header line length in bytes (default: 8 KiB).
    pub header_line_size: usize,
    /// The version every request's own version token is compared against
    /// (§4.1, §4.9 `http.version`). A mismatch is `ParseError::UnsupportedVersion`.
    pub required_version: Version,
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            header_count: 32,
            header_line_size: 8 * 1024,
            required_version: Version::Http11,
        }
    }
}

/// Listener/supervisor limits (C8).
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Fixed worker pool size. The spec names this value explicitly: 10.
    pub max_connections: usize,
    /// How long the supervisor waits for in-flight workers to drain on shutdown.
    pub shutdown_drain: Duration,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_connections: 10,
            shutdown_drain: Duration::from_secs(10),
        }
    }
}

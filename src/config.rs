//! Fixed settings and constants.
//!
//! The service has no runtime configuration: the listen port, endpoint path,
//! connection timeouts and payload strings are all compile-time constants.
//! Only logging can be tuned, through command line flags or `RUST_LOG`.

use const_format::formatcp;
use std::time::Duration;

// =============================================================================
// HTTP Listener
// =============================================================================

/// Interface the listener binds to
pub const HTTP_HOST: &str = "0.0.0.0";

/// TCP port the listener binds to
pub const HTTP_PORT: u16 = 8888;

/// Bind address in `host:port` form
pub const HTTP_BIND_ADDR: &str = formatcp!("{}:{}", HTTP_HOST, HTTP_PORT);

/// Path the health handler is registered under
pub const HEALTH_PATH: &str = "/health";

/// Endpoint URL announced at startup
pub const HEALTH_URL: &str = formatcp!("http://localhost:{}{}", HTTP_PORT, HEALTH_PATH);

// =============================================================================
// Connection Timeouts
// =============================================================================
// All values are in seconds.

/// Time allowed to receive the request headers
pub const HTTP_READ_TIMEOUT_SECS: u64 = 15;

/// Time allowed to produce the response
pub const HTTP_WRITE_TIMEOUT_SECS: u64 = 15;

/// A connection with no traffic for this long is closed
pub const HTTP_IDLE_TIMEOUT_SECS: u64 = 60;

/// Connection timeouts applied uniformly to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub read: Duration,
    pub write: Duration,
    pub idle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(HTTP_READ_TIMEOUT_SECS),
            write: Duration::from_secs(HTTP_WRITE_TIMEOUT_SECS),
            idle: Duration::from_secs(HTTP_IDLE_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// Health Payload
// =============================================================================

/// The only status value ever reported
pub const STATUS_HEALTHY: &str = "healthy";

/// Human-readable message included in every health response
pub const HEALTH_MESSAGE: &str = "Service is running successfully";

/// Metadata key carrying the license identifier
pub const LICENSE_KEY: &str = "license";

/// License identifier reported in metadata
pub const LICENSE: &str = "MIT";

// =============================================================================
// Logging
// =============================================================================

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "heartbeat=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

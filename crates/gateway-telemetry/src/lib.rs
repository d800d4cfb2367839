//! # Gateway Telemetry
//!
//! Structured logging for the bus gateway.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     init_logging(&TelemetryConfig::from_env()).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GW_SERVICE_NAME` | `bus-gateway` | Service name attached to every event |
//! | `GW_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `GW_JSON_LOGS` | `false` (`true` in containers) | Emit JSON lines |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Logs a request-scoped event with the standard gateway fields.
///
/// ```rust,ignore
/// log_request!(info, "person", "read", key, "Reading record");
/// ```
#[macro_export]
macro_rules! log_request {
    ($level:ident, $table:expr, $operation:expr, $key:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            table = $table,
            operation = %$operation,
            key = %$key,
            $($($field)*,)?
            $msg
        )
    };
}

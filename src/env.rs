//! Environment variable names used by [`LoggerConfig::from_env`](crate::init::LoggerConfig::from_env).
//!
//! These are purely helpers; the sinks and the OpenTelemetry core never read
//! the environment themselves.

/// Minimum level, e.g. `debug` or `warn`.
pub const OTEL_LOG_LEVEL_ENV: &str = "OTEL_LOG_LEVEL";

/// Logger name written as `scope_name`.
pub const OTEL_LOG_SCOPE_NAME_ENV: &str = "OTEL_LOG_SCOPE_NAME";

/// When `true`, human readable output is also printed to stderr.
pub const OTEL_LOG_FMT_ENV: &str = "OTEL_LOG_FMT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

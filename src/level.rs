//! Log levels and their OpenTelemetry severity mapping.
//!
//! See <https://opentelemetry.io/docs/specs/otel/logs/data-model/#field-severitynumber>.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordinal severity of a log entry.
///
/// `Unknown` carries levels produced by foreign sources that do not map onto
/// one of the named variants. They are never rejected: the severity mapping
/// degrades them to INFO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Panic,
    Fatal,
    Unknown(i8),
}

impl LogLevel {
    /// Numeric rank used for level comparisons. Higher is more severe.
    pub fn rank(self) -> i8 {
        match self {
            LogLevel::Debug => -1,
            LogLevel::Info => 0,
            LogLevel::Warn => 1,
            LogLevel::Error => 2,
            LogLevel::Panic => 4,
            LogLevel::Fatal => 5,
            LogLevel::Unknown(n) => n,
        }
    }

    /// OpenTelemetry `SeverityNumber` for this level.
    pub fn severity_number(self) -> i64 {
        match self {
            LogLevel::Debug => 5,
            LogLevel::Info => 9,
            LogLevel::Warn => 13,
            LogLevel::Error => 17,
            LogLevel::Panic | LogLevel::Fatal => 21,
            LogLevel::Unknown(_) => 9,
        }
    }

    /// OpenTelemetry `SeverityText` for this level.
    pub fn severity_text(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Panic | LogLevel::Fatal => "FATAL",
            LogLevel::Unknown(_) => "INFO",
        }
    }

    fn name(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Panic => "panic",
            LogLevel::Fatal => "fatal",
            LogLevel::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Unknown(n) => write!(f, "level({})", n),
            other => f.write_str(other.name()),
        }
    }
}

/// `tracing` has no panic/fatal levels and one level below debug; TRACE
/// folds into DEBUG.
impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

/// Error returned when a level name cannot be parsed.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unrecognized log level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "panic" => Ok(LogLevel::Panic),
            "fatal" => Ok(LogLevel::Fatal),
            other => other
                .strip_prefix("level(")
                .and_then(|rest| rest.strip_suffix(')'))
                .and_then(|n| n.parse().ok())
                .map(LogLevel::Unknown)
                .ok_or_else(|| ParseLevelError(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ParseLevelError;

    fn try_from(value: String) -> Result<Self, ParseLevelError> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

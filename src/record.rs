use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::field::SharedStr;
use crate::level::LogLevel;

/// Metadata of one log event, passed to a [`LogSink`](crate::sink::LogSink)
/// next to the event's fields.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub level: LogLevel,
    pub time: DateTime<Utc>,
    pub logger_name: Option<String>,
    pub message: SharedStr,
}

impl Entry {
    pub fn new(level: LogLevel, message: impl Into<SharedStr>) -> Self {
        Entry {
            level,
            time: Utc::now(),
            logger_name: None,
            message: message.into(),
        }
    }

    pub fn with_logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = Some(name.into());
        self
    }
}

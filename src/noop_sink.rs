use std::sync::Arc;

use crate::error::CoreError;
use crate::field::Field;
use crate::level::LogLevel;
use crate::record::Entry;
use crate::sink::{LogSink, SharedSink};

/// A sink that accepts every level and drops every entry.
///
/// Useful for measuring the overhead of [`OtelCore`](crate::decorator::OtelCore)
/// itself without any encoding or I/O.
#[derive(Clone, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }

    fn with(&self, _fields: &[Field]) -> SharedSink {
        Arc::new(NoopSink)
    }

    fn write(&self, _entry: &Entry, _fields: &[Field]) -> Result<(), CoreError> {
        Ok(())
    }
}

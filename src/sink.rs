use std::sync::Arc;

use crate::error::CoreError;
use crate::field::Field;
use crate::level::LogLevel;
use crate::record::Entry;

/// Synchronous destination for log entries.
///
/// Sinks compose: a sink may transform an entry and forward it to another
/// sink, the way [`OtelCore`](crate::decorator::OtelCore) does.
pub trait LogSink: Send + Sync {
    /// Whether entries at `level` would be written.
    fn enabled(&self, level: LogLevel) -> bool;

    /// Derive a sink that adds `fields` to every entry written through it.
    ///
    /// Must leave `self` untouched; siblings derived from the same sink
    /// never observe each other's fields.
    fn with(&self, fields: &[Field]) -> SharedSink;

    /// Write one entry.
    ///
    /// **Returns**
    /// - `Ok(())` if the entry was accepted.
    /// - `Err(..)` if encoding or the underlying writer failed. Callers
    ///   receive the error as-is; nothing is retried.
    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<(), CoreError>;

    /// Flush any buffered entries.
    ///
    /// Default implementation is a no-op.
    fn sync(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

pub type SharedSink = Arc<dyn LogSink>;

/// Decides whether a level is enabled.
pub trait LevelEnabler: Send + Sync {
    fn enabled(&self, level: LogLevel) -> bool;
}

/// A level enables itself and everything more severe.
impl LevelEnabler for LogLevel {
    fn enabled(&self, level: LogLevel) -> bool {
        level.rank() >= self.rank()
    }
}

impl<F> LevelEnabler for F
where
    F: Fn(LogLevel) -> bool + Send + Sync,
{
    fn enabled(&self, level: LogLevel) -> bool {
        self(level)
    }
}

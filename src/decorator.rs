//! Sink decorator that reshapes entries into the OpenTelemetry log data model.
//!
//! See <https://opentelemetry.io/docs/specs/otel/logs/data-model/#log-and-event-record-definition>.

use std::sync::Arc;

use crate::classify::classify_with_capacity;
use crate::error::CoreError;
use crate::field::Field;
use crate::level::LogLevel;
use crate::record::Entry;
use crate::sink::{LogSink, SharedSink};

pub const BODY_KEY: &str = "body";
pub const SEVERITY_KEY: &str = "severity";
pub const ATTRIBUTES_KEY: &str = "attributes";

/// [`LogSink`] that wraps another sink and rewrites every entry's fields into
///
/// ```text
/// body, severity, [trace_id], [span_id], [resource], <attributes namespace>, attributes...
/// ```
///
/// before forwarding it. Context fields bound through [`LogSink::with`] come
/// before call-site fields. For trace id, span id and resource the first
/// occurrence in that order is kept, so a value bound by an outer context is
/// never replaced at the call site; any later duplicate is written as a plain
/// attribute.
#[derive(Clone)]
pub struct OtelCore {
    next: SharedSink,
    fields: Arc<[Field]>,
}

impl OtelCore {
    pub fn new(next: SharedSink) -> Self {
        OtelCore {
            next,
            fields: Arc::from(Vec::new()),
        }
    }

    /// Build the field sequence forwarded to the inner sink.
    pub fn shape(&self, entry: &Entry, fields: &[Field]) -> Vec<Field> {
        let length = fields.len() + self.fields.len() + 3;
        let classified = classify_with_capacity(&[&*self.fields, fields], length);

        let mut out = Vec::with_capacity(length);
        out.push(Field::str(BODY_KEY, entry.message.clone()));
        out.push(Field::i64(SEVERITY_KEY, entry.level.severity_number()));
        out.extend(
            [classified.trace_id, classified.span_id, classified.resource]
                .into_iter()
                .flatten()
                .cloned(),
        );
        out.push(Field::namespace(ATTRIBUTES_KEY));
        out.extend(classified.attributes.into_iter().cloned());
        out
    }
}

impl std::fmt::Debug for OtelCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtelCore").field("fields", &self.fields).finish_non_exhaustive()
    }
}

impl LogSink for OtelCore {
    fn enabled(&self, level: LogLevel) -> bool {
        self.next.enabled(level)
    }

    fn with(&self, fields: &[Field]) -> SharedSink {
        // Always a fresh allocation: siblings derived from `self` must not
        // share storage.
        let mut merged = Vec::with_capacity(self.fields.len() + fields.len());
        merged.extend_from_slice(&self.fields);
        merged.extend_from_slice(fields);

        Arc::new(OtelCore {
            next: Arc::clone(&self.next),
            fields: Arc::from(merged),
        })
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<(), CoreError> {
        let out = self.shape(entry, fields);
        self.next.write(entry, &out)
    }

    fn sync(&self) -> Result<(), CoreError> {
        self.next.sync()
    }
}

use chrono::Utc;
use tracing::field::{Field as TracingField, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::field::Field;
use crate::level::LogLevel;
use crate::record::Entry;
use crate::sink::SharedSink;

/// `tracing_subscriber` layer that turns `tracing` events into entries on a
/// [`LogSink`](crate::sink::LogSink).
///
/// Fields recorded on enclosing spans are written ahead of the event's own
/// fields, outermost span first. The event's `message` becomes the entry
/// message. The logger name is the name set with [`OtelLayer::named`], or
/// the event's target when none is set. Writes happen synchronously on the
/// thread that emitted the event.
pub struct OtelLayer {
    sink: SharedSink,
    name: Option<String>,
}

impl OtelLayer {
    pub fn new(sink: SharedSink) -> Self {
        OtelLayer { sink, name: None }
    }

    /// Write every event under `name` instead of its target.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into()).filter(|n| !n.is_empty());
        self
    }
}

/// Fields recorded on a span, stored in its extensions.
struct SpanFields(Vec<Field>);

impl<S> Layer<S> for OtelLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut fields = Vec::new();
        let mut message = None;
        attrs.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });
        if let Some(message) = message {
            fields.push(Field::str("message", message));
        }

        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        if let Some(SpanFields(fields)) = extensions.get_mut::<SpanFields>() {
            let mut message = None;
            values.record(&mut FieldVisitor { fields: &mut *fields, message: &mut message });
            if let Some(message) = message {
                fields.push(Field::str("message", message));
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = LogLevel::from(*meta.level());
        if !self.sink.enabled(level) {
            return;
        }

        let mut fields = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(span_fields)) = span.extensions().get::<SpanFields>() {
                    fields.extend_from_slice(span_fields);
                }
            }
        }

        let mut message = None;
        event.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });

        let entry = Entry {
            level,
            time: Utc::now(),
            logger_name: Some(self.name.clone().unwrap_or_else(|| meta.target().to_string())),
            message: message.unwrap_or_default().into(),
        };

        if let Err(e) = self.sink.write(&entry, &fields) {
            eprintln!("error writing log entry: {}", e);
        }
    }
}

/// Collects `tracing` field values as [`Field`]s. The `message` field is
/// captured separately.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Vec<Field>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.push(Field::str(field.name(), value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.fields.push(Field::i64(field.name(), value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.fields.push(Field::u64(field.name(), value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.fields.push(Field::f64(field.name(), value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.fields.push(Field::bool(field.name(), value));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.fields.push(Field::str(field.name(), value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.push(Field::str(field.name(), format!("{:?}", value)));
        }
    }
}

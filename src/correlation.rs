//! Builders for the trace, span and resource fields.
//!
//! These fields are recognised by [`classify`](crate::classify::classify) through
//! a payload representation that only this module can construct, so a user
//! field that merely happens to be named `trace_id` is treated as an ordinary
//! attribute.

use std::sync::Arc;

use opentelemetry::trace::{SpanId, TraceId};
use opentelemetry::{Array, Value};
use opentelemetry_sdk::Resource;

use crate::error::CoreError;
use crate::field::{Field, FieldValue, InlineValue, ObjectEncoder, ObjectMarshaler, ObjectValue};

pub const TRACE_ID_KEY: &str = "trace_id";
pub const SPAN_ID_KEY: &str = "span_id";
pub const RESOURCE_KEY: &str = "resource";

#[derive(Clone)]
pub(crate) enum ObjectRepr {
    User(Arc<dyn ObjectMarshaler>),
    Resource(ResourceObject),
}

#[derive(Clone)]
pub(crate) enum InlineRepr {
    User(Arc<dyn ObjectMarshaler>),
    TraceId(TraceIdInline),
    SpanId(SpanIdInline),
}

#[derive(Clone, Copy)]
pub(crate) struct TraceIdInline(pub(crate) TraceId);

impl ObjectMarshaler for TraceIdInline {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<(), CoreError> {
        enc.add_binary(TRACE_ID_KEY, &self.0.to_bytes());
        Ok(())
    }
}

#[derive(Clone, Copy)]
pub(crate) struct SpanIdInline(pub(crate) SpanId);

impl ObjectMarshaler for SpanIdInline {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<(), CoreError> {
        enc.add_binary(SPAN_ID_KEY, &self.0.to_bytes());
        Ok(())
    }
}

#[derive(Clone)]
pub(crate) struct ResourceObject(Arc<Resource>);

impl ResourceObject {
    pub(crate) fn resource(&self) -> &Arc<Resource> {
        &self.0
    }
}

impl ObjectMarshaler for ResourceObject {
    /// Writes each resource attribute with the encoder method matching its
    /// type. Only bool, i64, f64, string and homogeneous arrays of those are
    /// written; anything else is skipped.
    #[allow(unreachable_patterns)]
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<(), CoreError> {
        for (key, value) in self.0.iter() {
            let key = key.as_str();
            match value {
                Value::Bool(v) => enc.add_bool(key, *v),
                Value::I64(v) => enc.add_i64(key, *v),
                Value::F64(v) => enc.add_f64(key, *v),
                Value::String(v) => enc.add_str(key, v.as_str()),
                Value::Array(Array::Bool(v)) => enc.add_bools(key, v),
                Value::Array(Array::I64(v)) => enc.add_i64s(key, v),
                Value::Array(Array::F64(v)) => enc.add_f64s(key, v),
                Value::Array(Array::String(v)) => {
                    let values: Vec<&str> = v.iter().map(|s| s.as_str()).collect();
                    enc.add_strs(key, &values);
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Field carrying the trace id, or `None` when the id is invalid (all zero).
pub fn trace_id(trace_id: TraceId) -> Option<Field> {
    if trace_id == TraceId::INVALID {
        return None;
    }
    let value = InlineValue(InlineRepr::TraceId(TraceIdInline(trace_id)));
    Some(Field::new(TRACE_ID_KEY, FieldValue::Inline(value)))
}

/// Field carrying the span id, or `None` when the id is invalid (all zero).
pub fn span_id(span_id: SpanId) -> Option<Field> {
    if span_id == SpanId::INVALID {
        return None;
    }
    let value = InlineValue(InlineRepr::SpanId(SpanIdInline(span_id)));
    Some(Field::new(SPAN_ID_KEY, FieldValue::Inline(value)))
}

/// Field carrying the resource attributes, or `None` when there is no resource.
pub fn resource(resource: Option<Arc<Resource>>) -> Option<Field> {
    let resource = resource?;
    let value = ObjectValue(ObjectRepr::Resource(ResourceObject(resource)));
    Some(Field::new(RESOURCE_KEY, FieldValue::Object(value)))
}

/// Like [`trace_id`], but yields a [`Field::skip`] placeholder for invalid ids.
pub fn trace_id_or_skip(id: TraceId) -> Field {
    trace_id(id).unwrap_or_else(Field::skip)
}

/// Like [`span_id`], but yields a [`Field::skip`] placeholder for invalid ids.
pub fn span_id_or_skip(id: SpanId) -> Field {
    span_id(id).unwrap_or_else(Field::skip)
}

/// Like [`resource`], but yields a [`Field::skip`] placeholder when absent.
pub fn resource_or_skip(r: Option<Arc<Resource>>) -> Field {
    resource(r).unwrap_or_else(Field::skip)
}

/// A correlation value extracted from a field built by this module.
#[derive(Debug, Clone, PartialEq)]
pub enum Correlation<'a> {
    TraceId(TraceId),
    SpanId(SpanId),
    Resource(&'a Arc<Resource>),
}

impl Field {
    /// Returns the correlation value if this field was built by [`trace_id`],
    /// [`span_id`] or [`resource`] and still carries its reserved key.
    pub fn correlation(&self) -> Option<Correlation<'_>> {
        match (self.key.as_str(), &self.value) {
            (TRACE_ID_KEY, FieldValue::Inline(InlineValue(InlineRepr::TraceId(t)))) => {
                Some(Correlation::TraceId(t.0))
            }
            (SPAN_ID_KEY, FieldValue::Inline(InlineValue(InlineRepr::SpanId(s)))) => {
                Some(Correlation::SpanId(s.0))
            }
            (RESOURCE_KEY, FieldValue::Object(ObjectValue(ObjectRepr::Resource(r)))) => {
                Some(Correlation::Resource(r.resource()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use opentelemetry::KeyValue;

    #[test]
    fn test_invalid_ids_produce_no_field() {
        assert!(trace_id(TraceId::INVALID).is_none());
        assert!(span_id(SpanId::INVALID).is_none());
        assert!(resource(None).is_none());
        assert_eq!(trace_id_or_skip(TraceId::INVALID).kind(), FieldKind::Skip);
    }

    #[test]
    fn test_valid_ids_are_tagged() {
        let tid = TraceId::from_bytes([1; 16]);
        let sid = SpanId::from_bytes([2; 8]);

        let t = trace_id(tid).unwrap();
        assert_eq!(t.key, TRACE_ID_KEY);
        assert_eq!(t.kind(), FieldKind::Inline);
        assert_eq!(t.correlation(), Some(Correlation::TraceId(tid)));

        let s = span_id(sid).unwrap();
        assert_eq!(s.key, SPAN_ID_KEY);
        assert_eq!(s.correlation(), Some(Correlation::SpanId(sid)));
    }

    #[test]
    fn test_resource_is_tagged_object() {
        let r = Arc::new(
            Resource::builder_empty()
                .with_attributes([KeyValue::new("service.name", "api")])
                .build(),
        );
        let f = resource(Some(r.clone())).unwrap();
        assert_eq!(f.key, RESOURCE_KEY);
        assert_eq!(f.kind(), FieldKind::Object);
        assert!(matches!(f.correlation(), Some(Correlation::Resource(got)) if Arc::ptr_eq(got, &r)));
    }

    #[test]
    fn test_reserved_key_alone_is_not_correlation() {
        let spoofed = Field::binary(TRACE_ID_KEY, vec![1u8; 16]);
        assert!(spoofed.correlation().is_none());

        let spoofed_object = Field::object(RESOURCE_KEY, |_: &mut dyn ObjectEncoder| -> Result<(), CoreError> { Ok(()) });
        assert!(spoofed_object.correlation().is_none());
    }

    #[test]
    fn test_renamed_correlation_field_is_not_correlation() {
        let mut f = trace_id(TraceId::from_bytes([7; 16])).unwrap();
        f.key = "other".into();
        assert!(f.correlation().is_none());
    }
}

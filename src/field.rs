//! Typed key/value fields and the encoder interface they are written through.
//!
//! A [`Field`]'s kind is its [`FieldValue`] variant, so a field can never carry
//! a payload that disagrees with how it is encoded.

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::correlation::{InlineRepr, ObjectRepr};
use crate::error::CoreError;

/// Immutable string whose clones share one buffer.
///
/// Field keys and string values are cloned on every write of a derived core,
/// so owned text is kept behind an `Arc` and literals are borrowed.
#[derive(Clone)]
pub enum SharedStr {
    Static(&'static str),
    Shared(Arc<str>),
}

impl SharedStr {
    pub fn as_str(&self) -> &str {
        match self {
            SharedStr::Static(s) => *s,
            SharedStr::Shared(s) => s.as_ref(),
        }
    }
}

impl Default for SharedStr {
    fn default() -> Self {
        SharedStr::Static("")
    }
}

impl Deref for SharedStr {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for SharedStr {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&'static str> for SharedStr {
    fn from(s: &'static str) -> Self {
        SharedStr::Static(s)
    }
}

impl From<String> for SharedStr {
    fn from(s: String) -> Self {
        SharedStr::Shared(Arc::from(s))
    }
}

impl From<Arc<str>> for SharedStr {
    fn from(s: Arc<str>) -> Self {
        SharedStr::Shared(s)
    }
}

impl From<Cow<'static, str>> for SharedStr {
    fn from(s: Cow<'static, str>) -> Self {
        match s {
            Cow::Borrowed(s) => SharedStr::Static(s),
            Cow::Owned(s) => s.into(),
        }
    }
}

impl PartialEq for SharedStr {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for SharedStr {}

impl PartialEq<str> for SharedStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<'a> PartialEq<&'a str> for SharedStr {
    fn eq(&self, other: &&'a str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Debug for SharedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for SharedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SharedStr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Write side of a structured encoder.
///
/// Implemented by the JSON encoder in [`crate::encoder`] and by anything
/// else that wants to receive fields (test recorders, alternative wire
/// formats). Values are written under `key` in the current object.
pub trait ObjectEncoder {
    fn add_bool(&mut self, key: &str, value: bool);
    fn add_i64(&mut self, key: &str, value: i64);
    fn add_u64(&mut self, key: &str, value: u64);
    fn add_f64(&mut self, key: &str, value: f64);
    fn add_str(&mut self, key: &str, value: &str);
    fn add_binary(&mut self, key: &str, value: &[u8]);
    fn add_duration(&mut self, key: &str, value: Duration);
    fn add_bools(&mut self, key: &str, values: &[bool]);
    fn add_i64s(&mut self, key: &str, values: &[i64]);
    fn add_f64s(&mut self, key: &str, values: &[f64]);
    fn add_strs(&mut self, key: &str, values: &[&str]);

    /// Encode `value` as a nested object under `key`.
    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) -> Result<(), CoreError>;

    /// Every field added after this call is nested under `key` until the
    /// enclosing object is closed.
    fn open_namespace(&mut self, key: &str);
}

/// A value that knows how to write itself as a set of object members.
pub trait ObjectMarshaler: Send + Sync {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<(), CoreError>;
}

impl<F> ObjectMarshaler for F
where
    F: Fn(&mut dyn ObjectEncoder) -> Result<(), CoreError> + Send + Sync,
{
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<(), CoreError> {
        self(enc)
    }
}

/// Composite value encoded as a nested object.
///
/// Built from user code through [`Field::object`]; the crate additionally
/// builds resource objects that user code cannot construct.
#[derive(Clone)]
pub struct ObjectValue(pub(crate) ObjectRepr);

impl ObjectValue {
    pub(crate) fn marshaler(&self) -> &dyn ObjectMarshaler {
        match &self.0 {
            ObjectRepr::User(m) => m.as_ref(),
            ObjectRepr::Resource(r) => r,
        }
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ObjectRepr::User(_) => f.write_str("Object(..)"),
            ObjectRepr::Resource(r) => f.debug_tuple("Resource").field(&r.resource().len()).finish(),
        }
    }
}

/// Composite value whose members are spliced into the enclosing object.
#[derive(Clone)]
pub struct InlineValue(pub(crate) InlineRepr);

impl InlineValue {
    pub(crate) fn marshaler(&self) -> &dyn ObjectMarshaler {
        match &self.0 {
            InlineRepr::User(m) => m.as_ref(),
            InlineRepr::TraceId(t) => t,
            InlineRepr::SpanId(s) => s,
        }
    }
}

impl fmt::Debug for InlineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            InlineRepr::User(_) => f.write_str("Inline(..)"),
            InlineRepr::TraceId(t) => f.debug_tuple("TraceId").field(&t.0).finish(),
            InlineRepr::SpanId(s) => f.debug_tuple("SpanId").field(&s.0).finish(),
        }
    }
}

/// Payload of a [`Field`]. Heap payloads sit behind `Arc`, so cloning a
/// field never copies its contents.
#[derive(Clone, Debug)]
pub enum FieldValue {
    Str(SharedStr),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Binary(Arc<[u8]>),
    Duration(Duration),
    Bools(Arc<[bool]>),
    I64s(Arc<[i64]>),
    F64s(Arc<[f64]>),
    Strs(Arc<[SharedStr]>),
    Object(ObjectValue),
    Inline(InlineValue),
    /// Opens a nested namespace named by the field key.
    Namespace,
    /// Never encoded.
    Skip,
}

/// Coarse classification of a [`FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    Binary,
    Duration,
    Array,
    Object,
    Inline,
    Namespace,
    Skip,
}

/// A single key/value pair attached to a log entry.
#[derive(Clone, Debug)]
pub struct Field {
    pub key: SharedStr,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<SharedStr>, value: FieldValue) -> Self {
        Field { key: key.into(), value }
    }

    pub fn str(key: impl Into<SharedStr>, value: impl Into<SharedStr>) -> Self {
        Field::new(key, FieldValue::Str(value.into()))
    }

    pub fn i64(key: impl Into<SharedStr>, value: impl Into<i64>) -> Self {
        Field::new(key, FieldValue::I64(value.into()))
    }

    pub fn u64(key: impl Into<SharedStr>, value: u64) -> Self {
        Field::new(key, FieldValue::U64(value))
    }

    pub fn f64(key: impl Into<SharedStr>, value: impl Into<f64>) -> Self {
        Field::new(key, FieldValue::F64(value.into()))
    }

    pub fn bool(key: impl Into<SharedStr>, value: bool) -> Self {
        Field::new(key, FieldValue::Bool(value))
    }

    pub fn binary(key: impl Into<SharedStr>, value: impl Into<Arc<[u8]>>) -> Self {
        Field::new(key, FieldValue::Binary(value.into()))
    }

    pub fn duration(key: impl Into<SharedStr>, value: Duration) -> Self {
        Field::new(key, FieldValue::Duration(value))
    }

    pub fn bools(key: impl Into<SharedStr>, values: impl Into<Arc<[bool]>>) -> Self {
        Field::new(key, FieldValue::Bools(values.into()))
    }

    pub fn i64s(key: impl Into<SharedStr>, values: impl Into<Arc<[i64]>>) -> Self {
        Field::new(key, FieldValue::I64s(values.into()))
    }

    pub fn f64s(key: impl Into<SharedStr>, values: impl Into<Arc<[f64]>>) -> Self {
        Field::new(key, FieldValue::F64s(values.into()))
    }

    pub fn strs<I, S>(key: impl Into<SharedStr>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SharedStr>,
    {
        Field::new(key, FieldValue::Strs(values.into_iter().map(Into::into).collect()))
    }

    pub fn object(key: impl Into<SharedStr>, value: impl ObjectMarshaler + 'static) -> Self {
        Field::new(key, FieldValue::Object(ObjectValue(ObjectRepr::User(Arc::new(value)))))
    }

    /// A field whose members are written directly into the enclosing object.
    pub fn inline(value: impl ObjectMarshaler + 'static) -> Self {
        Field::new("", FieldValue::Inline(InlineValue(InlineRepr::User(Arc::new(value)))))
    }

    pub fn namespace(key: impl Into<SharedStr>) -> Self {
        Field::new(key, FieldValue::Namespace)
    }

    /// A placeholder that encoders drop.
    pub fn skip() -> Self {
        Field::new("", FieldValue::Skip)
    }

    pub fn kind(&self) -> FieldKind {
        match &self.value {
            FieldValue::Str(_) => FieldKind::String,
            FieldValue::I64(_) | FieldValue::U64(_) => FieldKind::Integer,
            FieldValue::F64(_) => FieldKind::Float,
            FieldValue::Bool(_) => FieldKind::Boolean,
            FieldValue::Binary(_) => FieldKind::Binary,
            FieldValue::Duration(_) => FieldKind::Duration,
            FieldValue::Bools(_) | FieldValue::I64s(_) | FieldValue::F64s(_) | FieldValue::Strs(_) => {
                FieldKind::Array
            }
            FieldValue::Object(_) => FieldKind::Object,
            FieldValue::Inline(_) => FieldKind::Inline,
            FieldValue::Namespace => FieldKind::Namespace,
            FieldValue::Skip => FieldKind::Skip,
        }
    }

    /// Write this field through `enc`.
    pub fn add_to(&self, enc: &mut dyn ObjectEncoder) -> Result<(), CoreError> {
        let key = self.key.as_str();
        match &self.value {
            FieldValue::Str(v) => enc.add_str(key, v),
            FieldValue::I64(v) => enc.add_i64(key, *v),
            FieldValue::U64(v) => enc.add_u64(key, *v),
            FieldValue::F64(v) => enc.add_f64(key, *v),
            FieldValue::Bool(v) => enc.add_bool(key, *v),
            FieldValue::Binary(v) => enc.add_binary(key, v),
            FieldValue::Duration(v) => enc.add_duration(key, *v),
            FieldValue::Bools(v) => enc.add_bools(key, v),
            FieldValue::I64s(v) => enc.add_i64s(key, v),
            FieldValue::F64s(v) => enc.add_f64s(key, v),
            FieldValue::Strs(v) => {
                let values: Vec<&str> = v.iter().map(SharedStr::as_str).collect();
                enc.add_strs(key, &values);
            }
            FieldValue::Object(v) => return enc.add_object(key, v.marshaler()),
            FieldValue::Inline(v) => return v.marshaler().marshal_log_object(enc),
            FieldValue::Namespace => enc.open_namespace(key),
            FieldValue::Skip => {}
        }
        Ok(())
    }
}

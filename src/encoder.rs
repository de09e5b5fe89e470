//! JSON encoding of entries and fields.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};

use crate::error::CoreError;
use crate::field::{Field, ObjectEncoder, ObjectMarshaler};
use crate::record::Entry;

/// How the entry level is written under [`EncoderConfig::level_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelEncoding {
    /// OpenTelemetry severity text: `DEBUG`, `INFO`, `WARN`, `ERROR`, `FATAL`.
    SeverityText,
    /// Lowercase level name, e.g. `warn`.
    Lowercase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    /// Integer nanoseconds since the Unix epoch.
    EpochNanos,
    /// Floating point seconds since the Unix epoch.
    EpochSeconds,
    /// RFC 3339 string with nanosecond precision.
    Rfc3339Nano,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationEncoding {
    /// Floating point seconds.
    Seconds,
    /// Integer nanoseconds.
    Nanos,
    /// Human readable, e.g. `1.45s`.
    String,
}

/// Key names and value encodings used by [`JsonEncoder`].
///
/// A key set to `None` is omitted from the output entirely.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub message_key: Option<String>,
    pub level_key: Option<String>,
    pub time_key: Option<String>,
    pub name_key: Option<String>,
    pub level_encoding: LevelEncoding,
    pub time_encoding: TimeEncoding,
    pub duration_encoding: DurationEncoding,
    pub line_ending: String,
}

impl EncoderConfig {
    /// Keys of the OpenTelemetry log data model.
    ///
    /// The message key is omitted because [`OtelCore`](crate::decorator::OtelCore)
    /// writes the message itself as `body`.
    pub fn otel() -> Self {
        EncoderConfig {
            message_key: None,
            level_key: Some("severity_text".to_string()),
            time_key: Some("timestamp".to_string()),
            name_key: Some("scope_name".to_string()),
            level_encoding: LevelEncoding::SeverityText,
            time_encoding: TimeEncoding::EpochNanos,
            duration_encoding: DurationEncoding::Seconds,
            line_ending: "\n".to_string(),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig::otel()
    }
}

/// Encodes one entry as a single JSON object followed by the line ending.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    config: EncoderConfig,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        JsonEncoder { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode `entry` with its context fields followed by its call-site fields.
    pub fn encode_entry(&self, entry: &Entry, context: &[Field], fields: &[Field]) -> Result<Vec<u8>, CoreError> {
        let cfg = &self.config;
        let mut enc = MapEncoder::new(cfg);

        if let Some(key) = &cfg.level_key {
            let level = match cfg.level_encoding {
                LevelEncoding::SeverityText => entry.level.severity_text().to_string(),
                LevelEncoding::Lowercase => entry.level.to_string(),
            };
            enc.put(key, Value::String(level));
        }
        if let Some(key) = &cfg.time_key {
            let time = match (cfg.time_encoding, entry.time.timestamp_nanos_opt()) {
                (TimeEncoding::EpochNanos, Some(nanos)) => Value::from(nanos),
                (TimeEncoding::EpochSeconds, _) => float(
                    entry.time.timestamp() as f64 + f64::from(entry.time.timestamp_subsec_nanos()) / 1e9,
                ),
                // Out of range for i64 nanoseconds falls back to a string.
                _ => Value::String(entry.time.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            };
            enc.put(key, time);
        }
        if let (Some(key), Some(name)) = (&cfg.name_key, &entry.logger_name) {
            enc.put(key, Value::String(name.clone()));
        }
        if let Some(key) = &cfg.message_key {
            enc.put(key, Value::String(entry.message.to_string()));
        }

        for field in context.iter().chain(fields) {
            field.add_to(&mut enc)?;
        }

        let mut buf = serde_json::to_vec(&Value::Object(enc.finish()))?;
        buf.extend_from_slice(cfg.line_ending.as_bytes());
        Ok(buf)
    }
}

/// [`ObjectEncoder`] that builds a `serde_json` map.
///
/// Namespaces are materialised when the encoder is finished and only if
/// something was written into them.
pub struct MapEncoder<'c> {
    config: &'c EncoderConfig,
    root: Map<String, Value>,
    namespaces: Vec<(String, Map<String, Value>)>,
}

impl<'c> MapEncoder<'c> {
    pub fn new(config: &'c EncoderConfig) -> Self {
        MapEncoder {
            config,
            root: Map::new(),
            namespaces: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Map<String, Value> {
        match self.namespaces.last_mut() {
            Some((_, map)) => map,
            None => &mut self.root,
        }
    }

    fn put(&mut self, key: &str, value: Value) {
        self.current().insert(key.to_string(), value);
    }

    pub fn finish(mut self) -> Map<String, Value> {
        while let Some((key, map)) = self.namespaces.pop() {
            if !map.is_empty() {
                self.current().insert(key, Value::Object(map));
            }
        }
        self.root
    }
}

fn float(v: f64) -> Value {
    match Number::from_f64(v) {
        Some(n) => Value::Number(n),
        None if v.is_nan() => Value::String("NaN".to_string()),
        None if v > 0.0 => Value::String("+Inf".to_string()),
        None => Value::String("-Inf".to_string()),
    }
}

impl ObjectEncoder for MapEncoder<'_> {
    fn add_bool(&mut self, key: &str, value: bool) {
        self.put(key, Value::Bool(value));
    }

    fn add_i64(&mut self, key: &str, value: i64) {
        self.put(key, Value::from(value));
    }

    fn add_u64(&mut self, key: &str, value: u64) {
        self.put(key, Value::from(value));
    }

    fn add_f64(&mut self, key: &str, value: f64) {
        self.put(key, float(value));
    }

    fn add_str(&mut self, key: &str, value: &str) {
        self.put(key, Value::String(value.to_string()));
    }

    fn add_binary(&mut self, key: &str, value: &[u8]) {
        self.put(key, Value::String(STANDARD.encode(value)));
    }

    fn add_duration(&mut self, key: &str, value: Duration) {
        let v = match self.config.duration_encoding {
            DurationEncoding::Seconds => float(value.as_secs_f64()),
            DurationEncoding::Nanos => Value::from(u64::try_from(value.as_nanos()).unwrap_or(u64::MAX)),
            DurationEncoding::String => Value::String(format!("{:?}", value)),
        };
        self.put(key, v);
    }

    fn add_bools(&mut self, key: &str, values: &[bool]) {
        self.put(key, Value::Array(values.iter().map(|v| Value::Bool(*v)).collect()));
    }

    fn add_i64s(&mut self, key: &str, values: &[i64]) {
        self.put(key, Value::Array(values.iter().map(|v| Value::from(*v)).collect()));
    }

    fn add_f64s(&mut self, key: &str, values: &[f64]) {
        self.put(key, Value::Array(values.iter().map(|v| float(*v)).collect()));
    }

    fn add_strs(&mut self, key: &str, values: &[&str]) {
        self.put(key, Value::Array(values.iter().map(|v| Value::String(v.to_string())).collect()));
    }

    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) -> Result<(), CoreError> {
        let mut nested = MapEncoder::new(self.config);
        value.marshal_log_object(&mut nested)?;
        let map = nested.finish();
        self.put(key, Value::Object(map));
        Ok(())
    }

    fn open_namespace(&mut self, key: &str) {
        self.namespaces.push((key.to_string(), Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn entry() -> Entry {
        Entry {
            level: LogLevel::Warn,
            time: Utc.timestamp_opt(1_700_000_000, 5).unwrap(),
            logger_name: Some("svc".to_string()),
            message: "hi".into(),
        }
    }

    fn decode(buf: &[u8]) -> Value {
        serde_json::from_slice(buf).unwrap()
    }

    #[test]
    fn test_otel_header_keys() {
        let buf = JsonEncoder::default().encode_entry(&entry(), &[], &[]).unwrap();
        assert!(buf.ends_with(b"}\n"));
        assert_eq!(
            decode(&buf),
            json!({"severity_text": "WARN", "timestamp": 1_700_000_000_000_000_005i64, "scope_name": "svc"})
        );
    }

    #[test]
    fn test_alternate_encodings() {
        let cfg = EncoderConfig {
            message_key: Some("msg".to_string()),
            level_key: Some("level".to_string()),
            time_key: Some("ts".to_string()),
            name_key: None,
            level_encoding: LevelEncoding::Lowercase,
            time_encoding: TimeEncoding::Rfc3339Nano,
            duration_encoding: DurationEncoding::Nanos,
            line_ending: String::new(),
        };
        let fields = [Field::duration("d", Duration::from_millis(3))];
        let buf = JsonEncoder::new(cfg).encode_entry(&entry(), &[], &fields).unwrap();
        assert_eq!(
            decode(&buf),
            json!({"level": "warn", "ts": "2023-11-14T22:13:20.000000005Z", "msg": "hi", "d": 3_000_000})
        );
    }

    #[test]
    fn test_namespace_nesting_and_empty_namespace() {
        let fields = [Field::str("a", "1"), Field::namespace("ns"), Field::i64("b", 2), Field::namespace("empty")];
        let buf = JsonEncoder::default().encode_entry(&entry(), &[], &fields).unwrap();
        let got = decode(&buf);
        assert_eq!(got["a"], json!("1"));
        assert_eq!(got["ns"], json!({"b": 2}));
        assert!(got["ns"].get("empty").is_none());
    }

    #[test]
    fn test_value_encodings() {
        let fields = [
            Field::binary("bin", vec![0xde, 0xad]),
            Field::f64("nan", f64::NAN),
            Field::f64("inf", f64::INFINITY),
            Field::duration("secs", Duration::from_millis(1450)),
            Field::i64s("ints", vec![1, 2]),
            Field::bools("flags", vec![true]),
            Field::skip(),
        ];
        let buf = JsonEncoder::default().encode_entry(&entry(), &[], &fields).unwrap();
        let got = decode(&buf);
        assert_eq!(got["bin"], json!("3q0="));
        assert_eq!(got["nan"], json!("NaN"));
        assert_eq!(got["inf"], json!("+Inf"));
        assert_eq!(got["secs"], json!(1.45));
        assert_eq!(got["ints"], json!([1, 2]));
        assert_eq!(got["flags"], json!([true]));
        assert!(got.get("").is_none());
    }

    #[test]
    fn test_inline_members_are_spliced() {
        let fields = [
            Field::str("before", "x"),
            Field::inline(|enc: &mut dyn ObjectEncoder| -> Result<(), CoreError> {
                enc.add_str("host", "db-1");
                enc.add_u64("port", 5432);
                Ok(())
            }),
        ];
        let buf = JsonEncoder::default().encode_entry(&entry(), &[], &fields).unwrap();
        let got = decode(&buf);
        let keys: Vec<&str> = got.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["severity_text", "timestamp", "scope_name", "before", "host", "port"]);
        assert_eq!(got["port"], json!(5432));
    }

    #[test]
    fn test_default_encoder_uses_otel_keys() {
        let encoder = JsonEncoder::default();
        assert!(encoder.config().message_key.is_none());
        assert_eq!(encoder.config().level_key.as_deref(), Some("severity_text"));
        assert_eq!(encoder.config().line_ending, "\n");
    }

    #[test]
    fn test_marshal_error_propagates() {
        let failing = Field::object("bad", |_: &mut dyn ObjectEncoder| -> Result<(), CoreError> {
            Err(CoreError::marshal("bad", "nope"))
        });
        let err = JsonEncoder::default().encode_entry(&entry(), &[], &[failing]).unwrap_err();
        assert_eq!(err.to_string(), "marshal bad: nope");
    }
}

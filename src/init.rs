use std::io::{self, Write};
use std::sync::Arc;

use opentelemetry_sdk::Resource;
use serde::Deserialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::correlation;
use crate::decorator::OtelCore;
use crate::encoder::{EncoderConfig, JsonEncoder};
use crate::env::{env_or, OTEL_LOG_FMT_ENV, OTEL_LOG_LEVEL_ENV, OTEL_LOG_SCOPE_NAME_ENV};
use crate::layer::OtelLayer;
use crate::level::{LogLevel, ParseLevelError};
use crate::logger::Logger;
use crate::sink::{LevelEnabler, SharedSink};
use crate::writer_sink::WriterSink;

/// Logger configuration.
///
/// **Fields**
/// - `level`: minimum level written.
/// - `name`: logger name, written as `scope_name`. On the `tracing` path it
///   replaces the event target; when unset the target is used.
/// - `enable_fmt`: if `true`, [`init_tracing_with_config`] also installs a
///   `tracing_subscriber::fmt` layer printing human readable lines to stderr.
/// - `resource`: resource attached to every entry. Not deserializable; set
///   it from the OpenTelemetry SDK after loading the rest.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub name: Option<String>,
    pub enable_fmt: bool,
    #[serde(skip)]
    pub resource: Option<Arc<Resource>>,
}

impl LoggerConfig {
    /// Build a config from `OTEL_LOG_LEVEL`, `OTEL_LOG_SCOPE_NAME` and
    /// `OTEL_LOG_FMT`.
    pub fn from_env() -> Result<Self, ParseLevelError> {
        let level = env_or(OTEL_LOG_LEVEL_ENV, "info").parse()?;
        let name = Some(env_or(OTEL_LOG_SCOPE_NAME_ENV, "")).filter(|n| !n.is_empty());
        let enable_fmt = env_or(OTEL_LOG_FMT_ENV, "false").trim().eq_ignore_ascii_case("true");

        Ok(LoggerConfig {
            level,
            name,
            enable_fmt,
            resource: None,
        })
    }

    pub fn with_resource(mut self, resource: Arc<Resource>) -> Self {
        self.resource = Some(resource);
        self
    }
}

/// Error returned by [`init_tracing`] and [`init_tracing_with_config`].
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("global subscriber already set: {0}")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Encoder settings for the OpenTelemetry log data model.
pub fn encoder_config() -> EncoderConfig {
    EncoderConfig::otel()
}

pub fn new_encoder() -> JsonEncoder {
    JsonEncoder::new(encoder_config())
}

/// OpenTelemetry core writing JSON lines to `out`.
pub fn new_core(out: impl Write + Send + 'static, enabler: impl LevelEnabler + 'static) -> OtelCore {
    wrap_core(Arc::new(WriterSink::new(new_encoder(), out, enabler)))
}

/// OpenTelemetry core in front of an existing sink.
pub fn wrap_core(base: SharedSink) -> OtelCore {
    OtelCore::new(base)
}

/// Logger writing to stdout and reporting its own failures on stderr.
pub fn new_logger(enabler: impl LevelEnabler + 'static) -> Logger {
    Logger::new(Arc::new(new_core(io::stdout(), enabler)))
}

/// Logger built from `config`, writing to `out`.
pub fn build_logger(config: &LoggerConfig, out: impl Write + Send + 'static) -> Logger {
    let mut logger = Logger::new(Arc::new(new_core(out, config.level)));
    if let Some(name) = &config.name {
        logger = logger.named(name);
    }
    if let Some(resource) = correlation::resource(config.resource.clone()) {
        logger = logger.with(&[resource]);
    }
    logger
}

/// Install a global `tracing` subscriber that forwards events to `sink`.
///
/// **Parameters**
/// - `sink`: usually an [`OtelCore`]; the configured resource, if any, is
///   bound to it before installation.
/// - `config`: `name`, `enable_fmt` and `resource` are read here; the level
///   is left to `sink`.
pub fn init_tracing_with_config(sink: SharedSink, config: &LoggerConfig) -> Result<(), InitError> {
    let sink = match correlation::resource(config.resource.clone()) {
        Some(resource) => sink.with(&[resource]),
        None => sink,
    };
    let mut layer = OtelLayer::new(sink);
    if let Some(name) = &config.name {
        layer = layer.named(name.as_str());
    }

    // Two branches because the layered subscriber types differ.
    if config.enable_fmt {
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Install a global `tracing` subscriber writing OpenTelemetry JSON lines to
/// stdout at `config.level` and above.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), InitError> {
    let core: SharedSink = Arc::new(new_core(io::stdout(), config.level));
    init_tracing_with_config(core, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LogSink;
    use crate::writer_sink::MemoryBuffer;
    use opentelemetry::KeyValue;
    use serde_json::{json, Value};

    #[test]
    fn test_config_from_json() {
        let cfg: LoggerConfig = serde_json::from_str(r#"{"level": "warn", "name": "api"}"#).unwrap();
        assert_eq!(cfg.level, LogLevel::Warn);
        assert_eq!(cfg.name.as_deref(), Some("api"));
        assert!(!cfg.enable_fmt);
        assert!(cfg.resource.is_none());

        let empty: LoggerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.level, LogLevel::Info);
    }

    #[test]
    fn test_config_rejects_unknown_level() {
        assert!(serde_json::from_str::<LoggerConfig>(r#"{"level": "chatty"}"#).is_err());
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var(OTEL_LOG_LEVEL_ENV, "error");
        std::env::set_var(OTEL_LOG_SCOPE_NAME_ENV, "worker");
        std::env::set_var(OTEL_LOG_FMT_ENV, "TRUE");

        let cfg = LoggerConfig::from_env().unwrap();
        assert_eq!(cfg.level, LogLevel::Error);
        assert_eq!(cfg.name.as_deref(), Some("worker"));
        assert!(cfg.enable_fmt);

        std::env::set_var(OTEL_LOG_LEVEL_ENV, "bogus");
        assert!(LoggerConfig::from_env().is_err());

        std::env::remove_var(OTEL_LOG_LEVEL_ENV);
        std::env::remove_var(OTEL_LOG_SCOPE_NAME_ENV);
        std::env::remove_var(OTEL_LOG_FMT_ENV);
    }

    #[test]
    fn test_build_logger() {
        let resource = Arc::new(
            Resource::builder_empty()
                .with_attributes([KeyValue::new("service.name", "checkout")])
                .build(),
        );
        let cfg = LoggerConfig {
            level: LogLevel::Info,
            name: Some("checkout".to_string()),
            ..LoggerConfig::default()
        }
        .with_resource(resource);

        let buf = MemoryBuffer::new();
        let logger = build_logger(&cfg, buf.clone());
        logger.debug("hidden", &[]);
        logger.info("visible", &[]);

        let lines = buf.lines();
        assert_eq!(lines.len(), 1);
        let got: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(got["scope_name"], json!("checkout"));
        assert_eq!(got["resource"], json!({"service.name": "checkout"}));
        assert!(got.get("attributes").is_none());
    }

    #[test]
    fn test_wrap_core_passes_level_through() {
        let base: SharedSink = Arc::new(WriterSink::new(new_encoder(), MemoryBuffer::new(), LogLevel::Warn));
        let core = wrap_core(base);
        assert!(!core.enabled(LogLevel::Info));
        assert!(core.enabled(LogLevel::Warn));
    }
}

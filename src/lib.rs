//! Log core that reshapes structured entries into the
//! [OpenTelemetry log data model](https://opentelemetry.io/docs/specs/otel/logs/data-model/).
//!
//! [`OtelCore`](decorator::OtelCore) sits in front of any [`LogSink`](sink::LogSink)
//! and rewrites each entry's fields into `body`, `severity`, optional
//! `trace_id` / `span_id` / `resource`, and an `attributes` namespace holding
//! everything else. [`WriterSink`](writer_sink::WriterSink) encodes the result
//! as one JSON object per line.
//!
//! ```no_run
//! use otel_log_core::field::Field;
//! use otel_log_core::init::new_logger;
//! use otel_log_core::level::LogLevel;
//!
//! let logger = new_logger(LogLevel::Info).named("checkout");
//! logger.info("order placed", &[Field::u64("items", 3)]);
//! ```
pub mod classify;
pub mod correlation;
pub mod decorator;
pub mod encoder;
pub mod env;
pub mod error;
pub mod field;
pub mod init;
pub mod layer;
pub mod level;
pub mod logger;
pub mod noop_sink;
pub mod record;
pub mod sink;
pub mod writer_sink;

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use crate::error::CoreError;
use crate::field::Field;
use crate::level::LogLevel;
use crate::record::Entry;
use crate::sink::SharedSink;

type ErrorOutput = Arc<Mutex<Box<dyn Write + Send>>>;

/// Call-site handle over a [`LogSink`].
///
/// Cheap to clone. [`Logger::named`] and [`Logger::with`] return new loggers
/// and leave the receiver unchanged.
#[derive(Clone)]
pub struct Logger {
    sink: SharedSink,
    name: Option<String>,
    error_output: ErrorOutput,
}

impl Logger {
    /// Logger over `sink` that reports write failures on stderr.
    pub fn new(sink: SharedSink) -> Self {
        Logger {
            sink,
            name: None,
            error_output: Arc::new(Mutex::new(Box::new(io::stderr()))),
        }
    }

    /// Replace where failures of the convenience methods are reported.
    pub fn with_error_output(mut self, out: impl Write + Send + 'static) -> Self {
        self.error_output = Arc::new(Mutex::new(Box::new(out)));
        self
    }

    /// Append a segment to the logger name, joined with `.`.
    pub fn named(&self, segment: &str) -> Self {
        let name = match &self.name {
            Some(parent) if !segment.is_empty() => format!("{}.{}", parent, segment),
            Some(parent) => parent.clone(),
            None => segment.to_string(),
        };
        Logger {
            name: Some(name).filter(|n| !n.is_empty()),
            ..self.clone()
        }
    }

    /// Logger whose entries all carry `fields` ahead of call-site fields.
    pub fn with(&self, fields: &[Field]) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        Logger {
            sink: self.sink.with(fields),
            ..self.clone()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.sink.enabled(level)
    }

    /// Write one entry if `level` is enabled.
    pub fn log(&self, level: LogLevel, message: &str, fields: &[Field]) -> Result<(), CoreError> {
        if !self.enabled(level) {
            return Ok(());
        }
        let mut entry = Entry::new(level, Arc::<str>::from(message));
        entry.logger_name = self.name.clone();
        self.sink.write(&entry, fields)
    }

    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.report(self.log(LogLevel::Debug, message, fields));
    }

    pub fn info(&self, message: &str, fields: &[Field]) {
        self.report(self.log(LogLevel::Info, message, fields));
    }

    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.report(self.log(LogLevel::Warn, message, fields));
    }

    pub fn error(&self, message: &str, fields: &[Field]) {
        self.report(self.log(LogLevel::Error, message, fields));
    }

    pub fn sync(&self) -> Result<(), CoreError> {
        self.sink.sync()
    }

    fn report(&self, result: Result<(), CoreError>) {
        if let Err(e) = result {
            let mut out = self.error_output.lock().unwrap_or_else(PoisonError::into_inner);
            // Nowhere left to report a failure of the error output itself.
            let _ = writeln!(out, "{} write error: {}", Utc::now().to_rfc3339(), e);
            let _ = out.flush();
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish_non_exhaustive()
    }
}

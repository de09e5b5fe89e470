use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::encoder::JsonEncoder;
use crate::error::CoreError;
use crate::field::Field;
use crate::level::LogLevel;
use crate::record::Entry;
use crate::sink::{LevelEnabler, LogSink, SharedSink};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// [`LogSink`] that encodes each entry as one JSON line and writes it to an
/// [`io::Write`].
///
/// Writes are serialized by a mutex around the writer; sinks derived with
/// [`LogSink::with`] share that writer.
#[derive(Clone)]
pub struct WriterSink {
    encoder: Arc<JsonEncoder>,
    out: SharedWriter,
    enabler: Arc<dyn LevelEnabler>,
    context: Arc<[Field]>,
}

impl WriterSink {
    pub fn new(encoder: JsonEncoder, out: impl Write + Send + 'static, enabler: impl LevelEnabler + 'static) -> Self {
        WriterSink {
            encoder: Arc::new(encoder),
            out: Arc::new(Mutex::new(Box::new(out))),
            enabler: Arc::new(enabler),
            context: Arc::from(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for WriterSink {
    fn enabled(&self, level: LogLevel) -> bool {
        self.enabler.enabled(level)
    }

    fn with(&self, fields: &[Field]) -> SharedSink {
        let mut context = Vec::with_capacity(self.context.len() + fields.len());
        context.extend_from_slice(&self.context);
        context.extend_from_slice(fields);

        Arc::new(WriterSink {
            context: Arc::from(context),
            ..self.clone()
        })
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<(), CoreError> {
        let buf = self.encoder.encode_entry(entry, &self.context, fields)?;
        self.lock().write_all(&buf)?;
        Ok(())
    }

    fn sync(&self) -> Result<(), CoreError> {
        self.lock().flush()?;
        Ok(())
    }
}

/// In-memory writer whose clones share one buffer.
///
/// Useful for tests and for inspecting encoded output.
#[derive(Clone, Default)]
pub struct MemoryBuffer(Arc<Mutex<Vec<u8>>>);

impl MemoryBuffer {
    pub fn new() -> Self {
        MemoryBuffer::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Contents split into lines, each without its trailing newline.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.contents()).lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Write for MemoryBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

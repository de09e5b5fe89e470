use std::sync::Arc;
use std::time::Instant;

use otel_log_core::field::Field;
use otel_log_core::init::wrap_core;
use otel_log_core::level::LogLevel;
use otel_log_core::logger::Logger;
use otel_log_core::noop_sink::NoopSink;

fn main() {
    let core = wrap_core(Arc::new(NoopSink));
    let logger = Logger::new(Arc::new(core))
        .named("load")
        .with(&[Field::str("service", "default_load")]);

    let n: u64 = 1_000_000;
    let start = Instant::now();

    for i in 0..n {
        if let Err(e) = logger.log(LogLevel::Error, "default load test error", &[Field::u64("iteration", i)]) {
            eprintln!("write failed: {}", e);
        }
    }

    let elapsed = start.elapsed();
    println!("default config: wrote {} entries in {:?} (~{:.0} entries/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    logger.info("load finished", &[]);
    let _ = logger.sync();
}

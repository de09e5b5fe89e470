use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::Arc;

use opentelemetry::trace::TraceId;
use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use otel_log_core::correlation;
use otel_log_core::decorator::OtelCore;
use otel_log_core::field::Field;
use otel_log_core::level::LogLevel;
use otel_log_core::noop_sink::NoopSink;
use otel_log_core::record::Entry;
use otel_log_core::sink::{LogSink, SharedSink};

struct Counting;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|c| c.set(c.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|c| c.set(c.get() + 1));
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

fn allocations_during(f: impl FnOnce()) -> usize {
    let before = ALLOCATIONS.with(Cell::get);
    f();
    ALLOCATIONS.with(Cell::get) - before
}

fn context(n: usize) -> Vec<Field> {
    let resource = Resource::builder_empty()
        .with_attributes([KeyValue::new("service.name", "alloc")])
        .build();
    let mut fields = vec![
        correlation::trace_id_or_skip(TraceId::from_bytes([3; 16])),
        correlation::resource_or_skip(Some(Arc::new(resource))),
    ];
    for i in 0..n {
        fields.push(Field::str(format!("key_{i}"), format!("value_{i}")));
        fields.push(Field::binary(format!("bin_{i}"), vec![i as u8; 8]));
        fields.push(Field::strs(format!("tags_{i}"), vec![format!("a{i}"), format!("b{i}")]));
    }
    fields
}

// Context fields are shared with every write, so the per-write cost must not
// grow with the size of the context.
#[test]
fn test_write_allocations_do_not_grow_with_context() {
    let entry = Entry::new(LogLevel::Info, format!("message {}", 1));
    let call = [Field::str("call", format!("owned {}", 2)), Field::u64("n", 1)];

    let mut counts = Vec::new();
    for n in [0, 10, 100] {
        let core: SharedSink = OtelCore::new(Arc::new(NoopSink)).with(&context(n));
        core.write(&entry, &call).unwrap();

        counts.push(allocations_during(|| core.write(&entry, &call).unwrap()));
    }

    assert!(counts.iter().all(|&c| c == counts[0]), "allocations per write: {counts:?}");
    assert!(counts[0] <= 2, "allocations per write: {counts:?}");
}

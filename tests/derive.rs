use std::sync::Arc;
use std::thread;

use otel_log_core::field::Field;
use otel_log_core::init::new_core;
use otel_log_core::level::LogLevel;
use otel_log_core::logger::Logger;
use otel_log_core::writer_sink::MemoryBuffer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn attributes(line: &str) -> Value {
    let v: Value = serde_json::from_str(line).unwrap();
    v.get("attributes").cloned().unwrap_or(Value::Null)
}

#[test]
fn test_parent_unchanged_after_with() {
    let buf = MemoryBuffer::new();
    let parent = Logger::new(Arc::new(new_core(buf.clone(), LogLevel::Debug))).with(&[Field::str("base", "b")]);

    let child = parent.with(&[Field::str("extra", "e")]);
    child.info("child", &[]);
    parent.info("parent", &[]);

    let lines = buf.lines();
    assert_eq!(attributes(&lines[0]), json!({"base": "b", "extra": "e"}));
    assert_eq!(attributes(&lines[1]), json!({"base": "b"}));
}

#[test]
fn test_siblings_do_not_see_each_other() {
    let buf = MemoryBuffer::new();
    // Several context fields so the parent's storage would have spare capacity
    // if it were grown in place.
    let parent = Logger::new(Arc::new(new_core(buf.clone(), LogLevel::Debug)))
        .with(&[Field::i64("a", 1)])
        .with(&[Field::i64("b", 2)])
        .with(&[Field::i64("c", 3)]);

    let first = parent.with(&[Field::str("sibling", "first")]);
    let second = parent.with(&[Field::str("sibling", "second")]);
    first.info("m", &[]);
    second.info("m", &[]);

    let lines = buf.lines();
    assert_eq!(attributes(&lines[0]), json!({"a": 1, "b": 2, "c": 3, "sibling": "first"}));
    assert_eq!(attributes(&lines[1]), json!({"a": 1, "b": 2, "c": 3, "sibling": "second"}));
}

#[test]
fn test_concurrent_derivation_and_writes() {
    let buf = MemoryBuffer::new();
    let parent = Logger::new(Arc::new(new_core(buf.clone(), LogLevel::Debug))).with(&[Field::str("svc", "api")]);

    thread::scope(|s| {
        for worker in 0..8i64 {
            let parent = &parent;
            s.spawn(move || {
                let child = parent.with(&[Field::i64("worker", worker)]);
                for _ in 0..50 {
                    child.info("tick", &[]);
                }
            });
        }
    });

    let lines = buf.lines();
    assert_eq!(lines.len(), 400);
    let mut per_worker = [0usize; 8];
    for line in &lines {
        let attrs = attributes(line);
        let attrs = attrs.as_object().unwrap();
        assert_eq!(attrs.len(), 2, "unexpected attributes: {:?}", attrs);
        assert_eq!(attrs["svc"], json!("api"));
        per_worker[attrs["worker"].as_i64().unwrap() as usize] += 1;
    }
    assert!(per_worker.iter().all(|&n| n == 50));
}

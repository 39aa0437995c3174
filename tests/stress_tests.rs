//! Stress tests for concurrent dispatch
//!
//! These tests verify:
//! - No record is lost or torn when many threads share one logger
//! - Queued handlers under the drop strategy never stall producers
//! - Rotation stays consistent while several threads write to one file

use parking_lot::Mutex;
use sinklog::core::{BoxError, Record};
use sinklog::{HandlerOptions, Logger, OverflowStrategy, Result, Sink};
use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

type Outcome = std::result::Result<(), BoxError>;

const THREADS: usize = 8;
const PER_THREAD: usize = 500;

fn message_only(record: &Record) -> Result<String> {
    Ok(record.message.clone())
}

#[test]
fn test_concurrent_logging_to_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("concurrent.log");

    let logger = Arc::new(Logger::new());
    logger
        .add(&log_file, HandlerOptions::new().with_formatter(message_only))
        .expect("Failed to add file handler");

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("thread-{}-message-{}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.remove_all();

    let content = fs::read_to_string(&log_file).unwrap();
    let lines: HashSet<&str> = content.lines().collect();
    assert_eq!(content.lines().count(), THREADS * PER_THREAD);
    assert_eq!(lines.len(), THREADS * PER_THREAD, "duplicate or torn lines");
}

#[test]
fn test_concurrent_queued_delivery_keeps_per_thread_order() {
    let logger = Arc::new(Logger::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = logger
        .add(
            Sink::callable(move |line: &str| -> Outcome {
                sink.lock().push(line.to_string());
                Ok(())
            }),
            HandlerOptions::new()
                .with_formatter(message_only)
                .with_enqueue(true)
                .with_max_queue_size(32),
        )
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("{}:{}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let metrics = logger.queue_metrics(id).unwrap();
    logger.remove_all();

    let seen = seen.lock();
    assert_eq!(seen.len(), THREADS * PER_THREAD);
    assert_eq!(metrics.processed(), (THREADS * PER_THREAD) as u64);

    let mut next = vec![0usize; THREADS];
    for line in seen.iter() {
        let (t, i) = line.split_once(':').unwrap();
        let t: usize = t.parse().unwrap();
        let i: usize = i.parse().unwrap();
        assert_eq!(i, next[t], "thread {} out of order", t);
        next[t] += 1;
    }
}

#[test]
fn test_drop_strategy_under_slow_consumer() {
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);

    let logger = Logger::new();
    let id = logger
        .add(
            Sink::callable(move |_line: &str| -> Outcome {
                thread::sleep(Duration::from_millis(2));
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            HandlerOptions::new()
                .with_enqueue(true)
                .with_max_queue_size(4)
                .with_overflow_strategy(OverflowStrategy::Drop),
        )
        .unwrap();

    let emitted = 2_000;
    let start = Instant::now();
    for i in 0..emitted {
        logger.info(format!("burst {}", i));
    }
    assert!(
        start.elapsed() < Duration::from_secs(2),
        "producer stalled for {:?}",
        start.elapsed()
    );

    let metrics = logger.queue_metrics(id).unwrap();
    logger.remove_all();

    let delivered = delivered.load(Ordering::SeqCst);
    assert!(delivered >= 1);
    assert!(delivered < emitted);
    assert_eq!(delivered as u64 + metrics.dropped(), emitted as u64);
    assert!(metrics.drop_rate() > 0.0);
}

#[test]
fn test_concurrent_writers_with_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let log_file = temp_dir.path().join("rotating.log");

    let logger = Arc::new(Logger::new());
    logger
        .add(
            &log_file,
            HandlerOptions::new()
                .with_formatter(message_only)
                .with_rotation("4 KB"),
        )
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..1_000 {
                    logger.info(format!("w{}-{:04}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.remove_all();

    let mut total = 0;
    for entry in fs::read_dir(temp_dir.path()).unwrap() {
        let content = fs::read_to_string(entry.unwrap().path()).unwrap();
        for line in content.lines() {
            assert!(line.starts_with('w') && line.len() == "w0-0000".len(), "torn: {}", line);
            total += 1;
        }
    }
    assert_eq!(total, 4_000);
}

//! Async logging example
//!
//! Demonstrates queued handlers shared by several threads, and the metrics
//! they expose.
//!
//! Run with: cargo run --example async_logging

use sinklog::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== sinklog - Async Logging Example ===\n");

    let logger = Arc::new(Logger::new());
    logger.add(Sink::stderr(), HandlerOptions::new().with_level("WARNING"))?;
    let file = logger.add(
        "async_test.log",
        HandlerOptions::new()
            .with_enqueue(true)
            .with_max_queue_size(1_000)
            .with_overflow_strategy(OverflowStrategy::Block),
    )?;

    println!("1. Queued logging from the main thread:");
    for i in 0..100 {
        logger.info(format!("Message #{}", i));
    }

    println!("\n2. Multi-threaded logging:");
    let handles: Vec<_> = (0..5)
        .map(|thread_id| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..20 {
                    logger.info(format!("Thread {} - Message {}", thread_id, i));
                    thread::sleep(Duration::from_millis(10));
                }
                logger.warning(format!("Thread {} finished", thread_id));
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            eprintln!("a logging thread panicked");
        }
    }

    logger.flush()?;
    if let Some(metrics) = logger.queue_metrics(file) {
        println!(
            "   enqueued={} processed={} dropped={}",
            metrics.enqueued(),
            metrics.processed(),
            metrics.dropped()
        );
    }
    logger.remove_all();

    println!("\n=== Example completed successfully! ===");
    println!("Check 'async_test.log' for file output");

    Ok(())
}

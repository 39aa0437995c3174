//! File logging example
//!
//! Demonstrates logging to the console and a rotating, compressed file at the
//! same time.
//!
//! Run with: cargo run --example file_logging

use sinklog::prelude::*;

fn main() -> Result<()> {
    println!("=== sinklog - File Logging Example ===\n");

    let logger = Logger::new();
    logger.add(Sink::stderr(), HandlerOptions::new().with_level("INFO"))?;
    logger.add(
        "logs/application.log",
        HandlerOptions::new()
            .with_rotation("16 KB")
            .with_compression("gz")
            .with_retention(3usize),
    )?;

    println!("1. Logging to both console and file:");
    logger.info("Application started");
    logger.debug("Loading configuration...");
    logger.info("Configuration loaded successfully");
    logger.warning("Using default settings for some options");
    logger.error("Failed to load optional plugin");

    println!("\n2. Writing enough to trigger rotation:");
    for i in 1..=1_000 {
        logger.debug(format!("Processing item {}/1000", i));
    }
    logger.info("All operations completed");

    logger.flush()?;
    logger.remove_all();

    println!("\n=== Example completed successfully! ===");
    println!("Check 'logs/' for application.log and at most 3 .log.gz archives");

    Ok(())
}

//! Basic logger usage example
//!
//! Demonstrates console logging, per-handler thresholds, custom levels and
//! the call-site capturing macros.
//!
//! Run with: cargo run --example basic_usage

use sinklog::prelude::*;
use sinklog::{info, log, warning};

fn main() -> Result<()> {
    println!("=== sinklog - Basic Usage Example ===\n");

    let logger = Logger::new();
    let console = logger.add(Sink::stderr(), HandlerOptions::new().with_level("TRACE"))?;

    println!("1. Logging at every built-in level:");
    logger.trace("This is a trace message");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.success("This is a success message");
    logger.warning("This is a warning message");
    logger.error("This is an error message");
    logger.critical("This is a critical message");

    println!("\n2. Replacing the console handler with an INFO threshold:");
    logger.remove(console)?;
    logger.add(Sink::stderr(), HandlerOptions::new().with_level("INFO"))?;
    logger.debug("Debug message (hidden)");
    logger.info("Info message (visible)");

    println!("\n3. A custom level:");
    logger.add_level("AUDIT", 35, "magenta", "@")?;
    logger.log("AUDIT", "Account 42 exported")?;

    println!("\n4. Macros and substitution:");
    let port = 8080;
    info!(logger, "Listening on port {}", port);
    warning!(logger, "{} retries left", 2);
    log!(logger, "SUCCESS", "Ready after {}ms", 12)?;
    logger.log_with(
        "INFO",
        "User {user} logged in from {}",
        CallOptions::new().arg("10.0.0.7").kwarg("user", "ada"),
    )?;

    println!("\n=== Example completed successfully! ===");

    Ok(())
}

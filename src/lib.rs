//! # sinklog
//!
//! A multi-destination logging library. One [`Logger`] fans every record out
//! to independently configured handlers: console streams, files with
//! rotation, compression and retention, or any callable.
//!
//! ## Features
//!
//! - **Per-handler thresholds**: each handler filters, formats and fails on its own
//! - **Queued delivery**: `enqueue` moves writes to a worker thread with a bounded
//!   queue and a block, drop or raise overflow strategy
//! - **File lifecycle**: size or time rotation, gz or zip archives, count, age
//!   or total size retention
//! - **Custom levels**: register new severities at runtime
//!
//! ```
//! use sinklog::{HandlerOptions, Logger, Sink};
//!
//! let logger = Logger::new();
//! let id = logger
//!     .add(Sink::stderr(), HandlerOptions::new().with_level("INFO"))
//!     .unwrap();
//! logger.info("ready");
//! logger.remove(id).unwrap();
//! ```

pub mod core;
pub mod handlers;
pub mod lifecycle;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        CallOptions, FieldValue, Handler, Level, LevelSpec, LogContext, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, OverflowStrategy, QueueMetrics, Record, Result,
    };
    pub use crate::handlers::{FileMode, HandlerOptions, Sink};
    pub use crate::lifecycle::{Compression, Retention, Rotation};
}

pub use crate::core::{
    logger, BoxError, CallOptions, CallSite, ContextGuard, FieldValue, Formatter, Handler,
    HandlerConfig, HandlerId, Level, LevelConfig, LevelSpec, LogContext, Logger, LoggerBuilder,
    LoggerConfig, LoggerContext, LoggerError, OverflowStrategy, QueueMetrics, Record, Result,
    TextFormatter, TimestampFormat, LEVEL_ENV_VAR,
};
pub use crate::handlers::{
    AsyncHandler, FileHandler, FileMode, HandlerOptions, Sink, StreamTarget,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::lifecycle::{Compression, CompressionFormat, Retention, Rotation};

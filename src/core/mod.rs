//! Core logger types and traits

pub mod call_options;
pub mod config;
pub mod error;
pub mod format;
pub mod handler;
pub mod level;
pub mod log_context;
pub mod logger;
pub mod message;
pub mod metrics;
pub mod overflow_policy;
pub mod record;
pub mod units;

pub use call_options::CallOptions;
pub use config::{HandlerConfig, LevelConfig, LoggerConfig, NumberOrText};
pub use error::{BoxError, LoggerError, Result};
pub use format::{Formatter, TextFormatter, TimestampFormat};
pub use handler::{FilterFn, Handler, HandlerCore, HandlerId};
pub use level::{Level, LevelRegistry, LevelSpec};
pub use log_context::{ContextGuard, FieldValue, LogContext, LoggerContext};
pub use logger::{logger, Logger, LoggerBuilder, LEVEL_ENV_VAR};
pub use message::substitute;
pub use metrics::QueueMetrics;
pub use overflow_policy::OverflowStrategy;
pub use record::{CallSite, ExceptionInfo, ProcessInfo, Record, ThreadInfo};
pub use units::{parse_duration, parse_size};

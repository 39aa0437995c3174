//! Main logger implementation
//!
//! A [`Logger`] owns an ordered list of handlers, a level registry and a
//! shared context. Each logging call builds exactly one [`Record`] and offers
//! it to every handler in registration order. A handler that fails or panics
//! is reported on stderr and skipped; the others still get their copy.

use super::call_options::CallOptions;
use super::error::{LoggerError, Result};
use super::handler::{panic_message, Handler, HandlerId};
use super::level::{Level, LevelRegistry, LevelSpec};
use super::log_context::{FieldValue, LogContext, LoggerContext};
use super::message::substitute;
use super::metrics::QueueMetrics;
use super::record::{CallSite, ExceptionInfo, Record};
use crate::handlers::{self, HandlerOptions, Sink};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Environment variable read by [`logger`] for the default handler's level
pub const LEVEL_ENV_VAR: &str = "SINKLOG_LEVEL";

#[derive(Clone)]
struct Registered {
    id: HandlerId,
    handler: Arc<dyn Handler>,
    metrics: Option<Arc<QueueMetrics>>,
}

/// Multi-destination logger
///
/// # Example
///
/// ```
/// use sinklog::{HandlerOptions, Logger, Sink};
///
/// let logger = Logger::new();
/// let id = logger
///     .add(Sink::stderr(), HandlerOptions::new().with_level("INFO"))
///     .unwrap();
///
/// logger.info("service started");
/// logger.log("WARNING", "disk at {}%").unwrap();
/// logger.remove(id).unwrap();
/// ```
pub struct Logger {
    /// Copy-on-write snapshot; dispatch clones the `Arc` and iterates lock-free
    handlers: RwLock<Arc<Vec<Registered>>>,
    levels: LevelRegistry,
    context: LoggerContext,
    next_id: AtomicUsize,
    start: Instant,
}

impl Logger {
    /// A logger with the built-in levels and no handlers
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Arc::new(Vec::new())),
            levels: LevelRegistry::new(),
            context: LoggerContext::new(),
            next_id: AtomicUsize::new(0),
            start: Instant::now(),
        }
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Register a handler for `sink`; ids are assigned in registration order
    pub fn add(&self, sink: impl Into<Sink>, options: HandlerOptions) -> Result<HandlerId> {
        let threshold = self.levels.threshold(&options.level)?;
        let built = handlers::build(sink.into(), &options, threshold)?;

        let mut slot = self.handlers.write();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut next = Vec::clone(&slot);
        next.push(Registered {
            id,
            handler: built.handler,
            metrics: built.metrics,
        });
        *slot = Arc::new(next);
        Ok(id)
    }

    /// Close and unregister one handler
    pub fn remove(&self, id: HandlerId) -> Result<()> {
        let removed = {
            let mut slot = self.handlers.write();
            let position = slot
                .iter()
                .position(|entry| entry.id == id)
                .ok_or(LoggerError::HandlerNotFound(id))?;
            let mut next = Vec::clone(&slot);
            let removed = next.remove(position);
            *slot = Arc::new(next);
            removed
        };
        Self::close_handler(&removed);
        Ok(())
    }

    /// Close and unregister every handler
    pub fn remove_all(&self) {
        let removed = std::mem::take(&mut *self.handlers.write());
        for entry in removed.iter() {
            Self::close_handler(entry);
        }
    }

    fn close_handler(entry: &Registered) {
        match catch_unwind(AssertUnwindSafe(|| entry.handler.close())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!(
                "[LOGGER ERROR] Handler #{} ({}) failed to close: {}",
                entry.id,
                entry.handler.kind(),
                e
            ),
            Err(panic_info) => eprintln!(
                "[LOGGER CRITICAL] Handler #{} ({}) panicked while closing: {}",
                entry.id,
                entry.handler.kind(),
                panic_message(&*panic_info)
            ),
        }
    }

    pub fn handler_ids(&self) -> Vec<HandlerId> {
        self.handlers.read().iter().map(|entry| entry.id).collect()
    }

    /// Queue counters of a handler added with `enqueue`
    pub fn queue_metrics(&self, id: HandlerId) -> Option<Arc<QueueMetrics>> {
        self.handlers
            .read()
            .iter()
            .find(|entry| entry.id == id)
            .and_then(|entry| entry.metrics.clone())
    }

    /// Register or overwrite a level; use it through `log(name, ..)`
    pub fn add_level(
        &self,
        name: &str,
        no: u32,
        color: &str,
        icon: &str,
    ) -> Result<Arc<Level>> {
        self.levels.add(name, no, color, icon)
    }

    pub fn level(&self, name: &str) -> Option<Arc<Level>> {
        self.levels.get(name)
    }

    pub fn levels(&self) -> Vec<Arc<Level>> {
        self.levels.all()
    }

    /// Fields attached to every record of this logger
    pub fn context(&self) -> &LoggerContext {
        &self.context
    }

    /// Log at a level given by name or number
    ///
    /// An unknown level is the only error a plain call returns; besides that,
    /// only a full queue under the `Raise` strategy is surfaced.
    #[track_caller]
    pub fn log(&self, level: impl Into<LevelSpec>, message: impl AsRef<str>) -> Result<()> {
        self.log_at(level.into(), message.as_ref(), CallOptions::new(), CallSite::caller())
    }

    /// Log with substitution arguments, extra fields or an exception
    #[track_caller]
    pub fn log_with(
        &self,
        level: impl Into<LevelSpec>,
        message: impl AsRef<str>,
        options: CallOptions,
    ) -> Result<()> {
        self.log_at(level.into(), message.as_ref(), options, CallSite::caller())
    }

    fn log_at(
        &self,
        level: LevelSpec,
        message: &str,
        options: CallOptions,
        call_site: CallSite,
    ) -> Result<()> {
        let level = self.levels.resolve(&level)?;
        let record = self.make_record(level, message, options, call_site);
        self.dispatch(record)
    }

    fn make_record(
        &self,
        level: Arc<Level>,
        message: &str,
        options: CallOptions,
        call_site: CallSite,
    ) -> Record {
        let CallOptions {
            args,
            kwargs,
            call_site: site_override,
            exception,
        } = options;

        let mut record = Record::new(level, substitute(message, &args, &kwargs))
            .with_elapsed(self.start.elapsed())
            .with_call_site(site_override.unwrap_or(call_site))
            .with_extra(self.context.merged_with(&kwargs));
        if let Some(exception) = exception {
            record = record.with_exception(exception);
        }
        record
    }

    /// Offer one record to every handler in order
    fn dispatch(&self, record: Record) -> Result<()> {
        let handlers = Arc::clone(&self.handlers.read());
        if handlers.is_empty() {
            eprintln!("{}", fallback_line(&record));
            return Ok(());
        }

        let record = Arc::new(record);
        let mut queue_full = None;
        for entry in handlers.iter() {
            match catch_unwind(AssertUnwindSafe(|| entry.handler.emit(&record))) {
                Ok(Ok(())) => {}
                Ok(Err(e @ LoggerError::QueueFull { .. })) => {
                    queue_full.get_or_insert(e);
                }
                Ok(Err(e)) => eprintln!(
                    "[LOGGER ERROR] Handler #{} ({}) failed: {}",
                    entry.id,
                    entry.handler.kind(),
                    e
                ),
                Err(panic_info) => eprintln!(
                    "[LOGGER CRITICAL] Handler #{} ({}) panicked: {}. \
                     Other handlers continue.",
                    entry.id,
                    entry.handler.kind(),
                    panic_message(&*panic_info)
                ),
            }
        }

        match queue_full {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Level methods never return errors; a rejected enqueue is reported instead
    #[track_caller]
    fn log_builtin(&self, name: &str, message: &str) {
        if let Err(e) = self.log_at(name.into(), message, CallOptions::new(), CallSite::caller()) {
            eprintln!("[LOGGER WARNING] {} record not delivered everywhere: {}", name, e);
        }
    }

    #[track_caller]
    pub fn trace(&self, message: impl AsRef<str>) {
        self.log_builtin("TRACE", message.as_ref());
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log_builtin("DEBUG", message.as_ref());
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log_builtin("INFO", message.as_ref());
    }

    #[track_caller]
    pub fn success(&self, message: impl AsRef<str>) {
        self.log_builtin("SUCCESS", message.as_ref());
    }

    #[track_caller]
    pub fn warning(&self, message: impl AsRef<str>) {
        self.log_builtin("WARNING", message.as_ref());
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log_builtin("ERROR", message.as_ref());
    }

    #[track_caller]
    pub fn critical(&self, message: impl AsRef<str>) {
        self.log_builtin("CRITICAL", message.as_ref());
    }

    /// Log `message` at ERROR with `err` and its source chain attached
    #[track_caller]
    pub fn exception<E>(&self, message: impl AsRef<str>, err: &E)
    where
        E: std::error::Error + ?Sized,
    {
        let options = CallOptions::new().error(err);
        if let Err(e) = self.log_at("ERROR".into(), message.as_ref(), options, CallSite::caller()) {
            eprintln!("[LOGGER WARNING] exception record not delivered everywhere: {}", e);
        }
    }

    /// Run `f`, logging an error or panic at ERROR instead of propagating it
    ///
    /// Returns `None` when `f` failed.
    ///
    /// # Example
    ///
    /// ```
    /// use sinklog::Logger;
    ///
    /// let logger = Logger::new();
    /// let parsed = logger.catch(|| "42".parse::<u32>());
    /// assert_eq!(parsed, Some(42));
    /// assert_eq!(logger.catch(|| "x".parse::<u32>()), None);
    /// ```
    #[track_caller]
    pub fn catch<T, E, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: std::error::Error,
    {
        let call_site = CallSite::caller();
        let exception = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(err)) => ExceptionInfo::from_error(&err),
            Err(panic_info) => ExceptionInfo::from_panic(&*panic_info),
        };
        let options = CallOptions::new().exception(exception);
        let message = "An error has been caught";
        if let Err(e) = self.log_at("ERROR".into(), message, options, call_site) {
            eprintln!("[LOGGER WARNING] caught error not delivered everywhere: {}", e);
        }
        None
    }

    /// Flush every handler; queue-backed ones drain first
    pub fn flush(&self) -> Result<()> {
        let handlers = Arc::clone(&self.handlers.read());
        let mut first_error = None;
        for entry in handlers.iter() {
            if let Err(e) = entry.handler.flush() {
                eprintln!(
                    "[LOGGER ERROR] Handler #{} ({}) failed to flush: {}",
                    entry.id,
                    entry.handler.kind(),
                    e
                );
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.remove_all();
    }
}

/// Line written to stderr when a logger has no handlers
pub(crate) fn fallback_line(record: &Record) -> String {
    format!(
        "[{}] {} ({}:{}:{})",
        record.level.name,
        record.message,
        record.call_site.file,
        record.call_site.function,
        record.call_site.line
    )
}

/// Builder for constructing a Logger with a fluent API
///
/// Levels are registered before handlers, so handler thresholds may name
/// custom levels.
///
/// # Example
/// ```
/// use sinklog::{HandlerOptions, Logger, Sink};
///
/// let logger = Logger::builder()
///     .level("NOTICE", 22, "cyan", "")
///     .extra("service", "billing")
///     .handler(Sink::stderr(), HandlerOptions::new().with_level("NOTICE"))
///     .build()
///     .unwrap();
/// logger.log("NOTICE", "ready").unwrap();
/// ```
#[derive(Default)]
pub struct LoggerBuilder {
    handlers: Vec<(Sink, HandlerOptions)>,
    levels: Vec<Level>,
    extra: LogContext,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn handler(mut self, sink: impl Into<Sink>, options: HandlerOptions) -> Self {
        self.handlers.push((sink.into(), options));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, name: &str, no: u32, color: &str, icon: &str) -> Self {
        self.levels.push(Level::new(name, no, color, icon));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.extra.add_field(key, value);
        self
    }

    /// Build the logger; the first invalid level or handler aborts the build
    pub fn build(self) -> Result<Logger> {
        let logger = Logger::new();
        for level in &self.levels {
            logger.add_level(&level.name, level.no, &level.color, &level.icon)?;
        }
        for (key, value) in self.extra.fields() {
            logger.context.set(key.clone(), value.clone());
        }
        for (sink, options) in self.handlers {
            logger.add(sink, options)?;
        }
        Ok(logger)
    }
}

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// The process-wide default logger
///
/// Created on first use with one stderr handler whose level comes from
/// `SINKLOG_LEVEL` (a name or a number, default `DEBUG`). Statics are never
/// dropped, so call `logger().remove_all()` before exit to drain queued
/// handlers.
pub fn logger() -> &'static Logger {
    DEFAULT_LOGGER.get_or_init(|| {
        let logger = Logger::new();
        let level = match std::env::var(LEVEL_ENV_VAR) {
            Ok(value) => match value.trim().parse::<i64>() {
                Ok(no) => LevelSpec::Number(no),
                Err(_) => LevelSpec::Name(value.trim().to_string()),
            },
            Err(_) => LevelSpec::from("DEBUG"),
        };

        if let Err(e) = logger.add(Sink::stderr(), HandlerOptions::new().with_level(level)) {
            eprintln!(
                "[LOGGER WARNING] Ignoring {}: {}. Falling back to DEBUG.",
                LEVEL_ENV_VAR, e
            );
            if let Err(e) = logger.add(Sink::stderr(), HandlerOptions::new()) {
                eprintln!("[LOGGER ERROR] Default logger has no handler: {}", e);
            }
        }
        logger
    })
}

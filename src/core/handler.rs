//! Handler trait for log destinations
//!
//! Every destination (stream, file, callback, async wrapper) implements
//! [`Handler`]. Concrete handlers embed a [`HandlerCore`] holding the
//! threshold, filter, formatter and the `colorize`/`serialize`/`catch` flags.

use super::error::{LoggerError, Result};
use super::format::{Formatter, TextFormatter};
use super::record::Record;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Identifier returned by `Logger::add`, assigned in registration order
pub type HandlerId = usize;

/// Predicate deciding whether a handler accepts a record
pub type FilterFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

pub trait Handler: Send + Sync {
    /// Short name used in diagnostics (`"stream"`, `"file"`, ...)
    fn kind(&self) -> &'static str;

    /// Threshold and filter check
    fn should_emit(&self, record: &Record) -> bool;

    /// Offer one record: `should_emit`, then `deliver`
    fn emit(&self, record: &Arc<Record>) -> Result<()> {
        if !self.should_emit(record) {
            return Ok(());
        }
        self.deliver(record)
    }

    /// Write a record that already passed `should_emit`
    ///
    /// Handlers with `catch` enabled report their own failures and return `Ok`.
    fn deliver(&self, record: &Arc<Record>) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Flush and release the sink; must be idempotent
    fn close(&self) -> Result<()> {
        self.flush()
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// State and behaviour shared by every concrete handler
#[derive(Clone)]
pub struct HandlerCore {
    threshold: u32,
    filter: Option<FilterFn>,
    formatter: Arc<dyn Formatter>,
    colorize: bool,
    serialize: bool,
    catch: bool,
}

impl HandlerCore {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            filter: None,
            formatter: Arc::new(TextFormatter::new()),
            colorize: false,
            serialize: false,
            catch: true,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<FilterFn>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    #[must_use]
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    #[must_use]
    pub fn with_serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }

    #[must_use]
    pub fn with_catch(mut self, catch: bool) -> Self {
        self.catch = catch;
        self
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn catch(&self) -> bool {
        self.catch
    }

    pub fn serialize(&self) -> bool {
        self.serialize
    }

    /// Level threshold, then filter; a panicking filter lets the record through
    pub fn should_emit(&self, record: &Record) -> bool {
        if record.level.no < self.threshold {
            return false;
        }
        let Some(filter) = &self.filter else {
            return true;
        };
        match catch_unwind(AssertUnwindSafe(|| filter(record))) {
            Ok(accepted) => accepted,
            Err(panic_info) => {
                eprintln!(
                    "[LOGGER ERROR] Filter panicked, record passed through: {}",
                    panic_message(&*panic_info)
                );
                true
            }
        }
    }

    /// Render a record; never fails
    ///
    /// With `serialize` set the result is the record's JSON view
    /// ([`Record::to_json`]) and the formatter is bypassed. A formatter error
    /// or panic yields `[LEVEL] message (formatter error: ...)` instead.
    pub fn format(&self, record: &Record) -> String {
        match catch_unwind(AssertUnwindSafe(|| self.render(record))) {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => Self::fallback(record, &e.to_string()),
            Err(panic_info) => Self::fallback(record, &panic_message(&*panic_info)),
        }
    }

    fn render(&self, record: &Record) -> Result<String> {
        if self.serialize {
            return Ok(serde_json::to_string(&record.to_json())?);
        }
        self.formatter.format(record, self.colorize)
    }

    fn fallback(record: &Record, why: &str) -> String {
        format!(
            "[{}] {} (formatter error: {})",
            record.level.name, record.message, why
        )
    }

    /// Apply the catch policy to the outcome of a write
    pub fn settle(&self, kind: &str, outcome: Result<()>) -> Result<()> {
        match outcome {
            Err(e) if self.catch => {
                eprintln!("[LOGGER ERROR] {} handler failed to emit record: {}", kind, e);
                Ok(())
            }
            other => other,
        }
    }

    /// Run user code for one record, converting a panic into `HandlerPanic`,
    /// then apply the catch policy
    pub fn guard<F>(&self, kind: &str, f: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let outcome = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(panic_info) => Err(LoggerError::HandlerPanic(panic_message(&*panic_info))),
        };
        self.settle(kind, outcome)
    }
}

impl std::fmt::Debug for HandlerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCore")
            .field("threshold", &self.threshold)
            .field("filter", &self.filter.is_some())
            .field("colorize", &self.colorize)
            .field("serialize", &self.serialize)
            .field("catch", &self.catch)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;

    fn record(no: u32) -> Record {
        Record::new(Arc::new(Level::new("L", no, "white", "")), "msg")
    }

    #[test]
    fn test_threshold_boundary() {
        let core = HandlerCore::new(20);
        assert!(!core.should_emit(&record(19)));
        assert!(core.should_emit(&record(20)));
        assert!(core.should_emit(&record(21)));
    }

    #[test]
    fn test_filter() {
        let core = HandlerCore::new(0).with_filter(Some(Arc::new(|r: &Record| r.level.no % 2 == 0)));
        assert!(core.should_emit(&record(10)));
        assert!(!core.should_emit(&record(11)));
    }

    #[test]
    fn test_panicking_filter_fails_open() {
        let core = HandlerCore::new(0).with_filter(Some(Arc::new(|_: &Record| -> bool {
            panic!("filter exploded")
        })));
        assert!(core.should_emit(&record(10)));
    }

    #[test]
    fn test_filter_not_consulted_below_threshold() {
        let core = HandlerCore::new(30).with_filter(Some(Arc::new(|_: &Record| -> bool {
            panic!("should not run")
        })));
        assert!(!core.should_emit(&record(10)));
    }

    #[test]
    fn test_formatter_error_fallback() {
        let core = HandlerCore::new(0).with_formatter(Arc::new(|_: &Record| -> Result<String> {
            Err(LoggerError::formatter("custom", "bad template"))
        }));
        assert_eq!(
            core.format(&record(20)),
            "[L] msg (formatter error: Formatter error (custom): bad template)"
        );
    }

    #[test]
    fn test_formatter_panic_fallback() {
        let core = HandlerCore::new(0).with_formatter(Arc::new(|_: &Record| -> Result<String> {
            panic!("formatter exploded")
        }));
        assert_eq!(
            core.format(&record(20)),
            "[L] msg (formatter error: formatter exploded)"
        );
    }

    #[test]
    fn test_serialize() {
        let core = HandlerCore::new(0)
            .with_serialize(true)
            .with_colorize(true)
            .with_formatter(Arc::new(|r: &Record| -> Result<String> { Ok(r.message.clone()) }));
        let line = core.format(&record(20));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["message"], "msg");
        assert_eq!(value["level"]["no"], 20);
        assert!(value.get("record").is_none());
        assert!(value.get("text").is_none());
    }

    #[test]
    fn test_settle_and_guard() {
        let catching = HandlerCore::new(0);
        assert!(catching.settle("test", Err(LoggerError::other("x"))).is_ok());
        assert!(catching.guard("test", || panic!("boom")).is_ok());

        let strict = HandlerCore::new(0).with_catch(false);
        assert!(strict.settle("test", Err(LoggerError::other("x"))).is_err());
        assert!(matches!(
            strict.guard("test", || panic!("boom")),
            Err(LoggerError::HandlerPanic(ref msg)) if msg == "boom"
        ));
        assert!(strict.guard("test", || Ok(())).is_ok());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*payload), "owned");
        let payload: Box<dyn Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(&*payload), "Unknown panic");
    }
}

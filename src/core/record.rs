//! The immutable log record handed to every handler

use super::level::Level;
use super::log_context::LogContext;
use chrono::{DateTime, Local};
use serde_json::json;
use std::cell::RefCell;
use std::panic::Location;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

// Thread-local cache so building a record does not allocate thread identity every time
thread_local! {
    static THREAD_INFO_CACHE: RefCell<Option<ThreadInfo>> = const { RefCell::new(None) };
}

fn current_thread() -> ThreadInfo {
    THREAD_INFO_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let thread = std::thread::current();
                let id = format!("{:?}", thread.id());
                let name = thread.name().map_or_else(|| id.clone(), String::from);
                ThreadInfo { id, name }
            })
            .clone()
    })
}

fn current_process() -> ProcessInfo {
    static PROCESS: OnceLock<ProcessInfo> = OnceLock::new();
    PROCESS
        .get_or_init(|| {
            let name = std::env::current_exe()
                .ok()
                .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "<unknown>".to_string());
            ProcessInfo {
                id: std::process::id(),
                name,
            }
        })
        .clone()
}

/// Where a logging call was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    pub function: String,
    pub line: u32,
    pub module: String,
}

impl CallSite {
    pub const UNKNOWN_FUNCTION: &'static str = "<unknown>";

    pub fn new(file: impl Into<String>, line: u32) -> Self {
        let file = file.into();
        let module = module_from_file(&file);
        Self {
            file,
            function: Self::UNKNOWN_FUNCTION.to_string(),
            line,
            module,
        }
    }

    /// Call site of the caller of a `#[track_caller]` function
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line())
    }

    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }
}

fn module_from_file(file: &str) -> String {
    std::path::Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: String,
    pub name: String,
}

/// Snapshot of an error attached to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub type_name: String,
    pub message: String,
    /// Messages of the `source()` chain, outermost first
    pub chain: Vec<String>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            chain: Vec::new(),
        }
    }

    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            chain,
        }
    }

    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        Self::new("panic", crate::core::handler::panic_message(payload))
    }
}

/// One log event
///
/// Built once per logging call and shared with every handler behind an
/// `Arc`; nothing mutates it after construction.
#[derive(Debug, Clone)]
pub struct Record {
    pub level: Arc<Level>,
    pub message: String,
    pub time: DateTime<Local>,
    /// Time since the owning logger was created
    pub elapsed: Duration,
    pub call_site: CallSite,
    pub process: ProcessInfo,
    pub thread: ThreadInfo,
    pub extra: LogContext,
    pub exception: Option<ExceptionInfo>,
}

impl Record {
    #[track_caller]
    pub fn new(level: Arc<Level>, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            time: Local::now(),
            elapsed: Duration::ZERO,
            call_site: CallSite::caller(),
            process: current_process(),
            thread: current_thread(),
            extra: LogContext::new(),
            exception: None,
        }
    }

    #[must_use]
    pub fn with_time(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    #[must_use]
    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = call_site;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: LogContext) -> Self {
        self.extra = extra;
        self
    }

    #[must_use]
    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Nested JSON view of the record, written verbatim by serializing handlers
    pub fn to_json(&self) -> serde_json::Value {
        let exception = self.exception.as_ref().map(|e| {
            json!({
                "type": e.type_name,
                "value": e.message,
                "chain": e.chain,
            })
        });

        json!({
            "elapsed": {
                "repr": format_elapsed(self.elapsed),
                "seconds": self.elapsed.as_secs_f64(),
            },
            "exception": exception,
            "extra": self.extra.to_json_value(),
            "file": {
                "name": self.call_site.file.rsplit(['/', '\\']).next().unwrap_or_default(),
                "path": self.call_site.file,
            },
            "function": self.call_site.function,
            "level": {
                "icon": self.level.icon,
                "name": self.level.name,
                "no": self.level.no,
            },
            "line": self.call_site.line,
            "message": self.message,
            "module": self.call_site.module,
            "name": self.call_site.module,
            "process": {
                "id": self.process.id,
                "name": self.process.name,
            },
            "thread": {
                "id": self.thread.id,
                "name": self.thread.name,
            },
            "time": {
                "repr": self.time.to_rfc3339_opts(chrono::SecondsFormat::Micros, false),
                "timestamp": self.time.timestamp_micros() as f64 / 1_000_000.0,
            },
        })
    }
}

/// `H:MM:SS.ffffff`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        total / 3600,
        (total % 3600) / 60,
        total % 60,
        elapsed.subsec_micros()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> Arc<Level> {
        Arc::new(Level::new("INFO", 20, "white", "i"))
    }

    #[test]
    fn test_record_captures_call_site() {
        let record = Record::new(info(), "hello");
        assert!(record.call_site.file.ends_with("record.rs"));
        assert_eq!(record.call_site.module, "record");
        assert!(record.call_site.line > 0);
        assert_eq!(record.call_site.function, CallSite::UNKNOWN_FUNCTION);
    }

    #[test]
    fn test_record_identity() {
        let record = Record::new(info(), "hello");
        assert_eq!(record.process.id, std::process::id());
        assert!(!record.thread.id.is_empty());
        assert!(!record.thread.name.is_empty());
    }

    #[test]
    fn test_thread_name_cached_per_thread() {
        let handle = std::thread::Builder::new()
            .name("worker-7".to_string())
            .spawn(|| Record::new(info(), "x").thread.name)
            .unwrap();
        assert_eq!(handle.join().unwrap(), "worker-7");
    }

    #[test]
    fn test_exception_chain() {
        #[derive(Debug)]
        struct Outer(std::io::Error);
        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "outer failure")
            }
        }
        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        let info = ExceptionInfo::from_error(&err);
        assert_eq!(info.message, "outer failure");
        assert_eq!(info.chain, vec!["disk gone".to_string()]);
        assert!(info.type_name.ends_with("Outer"));
    }

    #[test]
    fn test_to_json_shape() {
        let record = Record::new(info(), "payload")
            .with_elapsed(Duration::from_millis(1500))
            .with_extra(LogContext::new().with_field("user", "ann"))
            .with_call_site(CallSite::new("src/app/main.rs", 12).with_function("run"));
        let json = record.to_json();

        assert_eq!(json["message"], "payload");
        assert_eq!(json["level"]["name"], "INFO");
        assert_eq!(json["level"]["no"], 20);
        assert_eq!(json["elapsed"]["seconds"], 1.5);
        assert_eq!(json["elapsed"]["repr"], "0:00:01.500000");
        assert_eq!(json["extra"]["user"], "ann");
        assert_eq!(json["file"]["name"], "main.rs");
        assert_eq!(json["function"], "run");
        assert_eq!(json["line"], 12);
        assert!(json["exception"].is_null());
        assert!(json["time"]["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "0:00:00.000000");
        assert_eq!(
            format_elapsed(Duration::from_secs(3723) + Duration::from_micros(42)),
            "1:02:03.000042"
        );
    }
}

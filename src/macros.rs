//! Logging macros with `format!`-style arguments and full call-site capture.
//!
//! Unlike the `Logger` methods, which only see the caller's file and line,
//! the macros also record the enclosing function and module path.
//!
//! # Examples
//!
//! ```
//! use sinklog::{info, log, HandlerOptions, Logger, Sink};
//!
//! let logger = Logger::new();
//! logger.add(Sink::stderr(), HandlerOptions::new()).unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Any registered level, by name or number
//! log!(logger, "WARNING", "Retry attempt {} of {}", 3, 5).unwrap();
//! ```

/// Capture the current file, line, module and function as a `CallSite`.
#[macro_export]
macro_rules! call_site {
    () => {{
        fn __sinklog_here() {}
        fn __sinklog_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let path = __sinklog_name_of(__sinklog_here);
        let path = path.strip_suffix("::__sinklog_here").unwrap_or(path);
        let function = path.rsplit("::").next().unwrap_or(path);
        $crate::core::CallSite::new(file!(), line!())
            .with_function(function)
            .with_module(module_path!())
    }};
}

/// Log at any level given by name or number; returns the `Result` of `log_with`.
///
/// # Examples
///
/// ```
/// # use sinklog::Logger;
/// # let logger = Logger::new();
/// use sinklog::log;
/// log!(logger, "INFO", "Simple message").unwrap();
/// log!(logger, 40, "Error code: {}", 500).unwrap();
/// assert!(log!(logger, "NOPE", "unknown level").is_err());
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_with(
            $level,
            format!($($arg)+),
            $crate::core::CallOptions::new().at($crate::call_site!()),
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_builtin {
    ($logger:expr, $level:literal, $($arg:tt)+) => {
        if let Err(e) = $crate::log!($logger, $level, $($arg)+) {
            ::std::eprintln!("[LOGGER WARNING] {} record not delivered everywhere: {}", $level, e);
        }
    };
}

/// Log a trace-level message.
///
/// ```
/// # use sinklog::Logger;
/// # let logger = Logger::new();
/// use sinklog::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_builtin!($logger, "TRACE", $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_builtin!($logger, "DEBUG", $($arg)+)
    };
}

/// Log an info-level message.
///
/// ```
/// # use sinklog::Logger;
/// # let logger = Logger::new();
/// use sinklog::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_builtin!($logger, "INFO", $($arg)+)
    };
}

/// Log a success-level message.
#[macro_export]
macro_rules! success {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_builtin!($logger, "SUCCESS", $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_builtin!($logger, "WARNING", $($arg)+)
    };
}

/// Log an error-level message.
///
/// ```
/// # use sinklog::Logger;
/// # let logger = Logger::new();
/// use sinklog::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_builtin!($logger, "ERROR", $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log_builtin!($logger, "CRITICAL", $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::error::{BoxError, Result};
    use crate::core::record::Record;
    use crate::{HandlerOptions, Logger, Sink};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn capture(logger: &Logger) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        logger
            .add(
                Sink::callable(move |line: &str| -> std::result::Result<(), BoxError> {
                    sink.lock().push(line.to_string());
                    Ok(())
                }),
                HandlerOptions::new().with_level("TRACE").with_formatter(
                    |r: &Record| -> Result<String> {
                        Ok(format!(
                            "{}|{}|{}|{}",
                            r.level.name, r.call_site.module, r.call_site.function, r.message
                        ))
                    },
                ),
            )
            .unwrap();
        seen
    }

    #[test]
    fn test_call_site_macro() {
        let site = call_site!();
        assert_eq!(site.function, "test_call_site_macro");
        assert_eq!(site.module, module_path!());
        assert_eq!(site.file, file!());
        assert_eq!(site.line, line!() - 4);
    }

    #[test]
    fn test_level_macros() {
        let logger = Logger::new();
        let seen = capture(&logger);

        trace!(logger, "t");
        debug!(logger, "d {}", 1);
        info!(logger, "i");
        success!(logger, "s");
        warning!(logger, "w");
        error!(logger, "e");
        critical!(logger, "c");

        let levels: Vec<String> = seen
            .lock()
            .iter()
            .map(|line| line.split('|').next().unwrap().to_string())
            .collect();
        assert_eq!(
            levels,
            vec!["TRACE", "DEBUG", "INFO", "SUCCESS", "WARNING", "ERROR", "CRITICAL"]
        );
        assert!(seen.lock()[1].ends_with("|test_level_macros|d 1"));
    }

    #[test]
    fn test_log_macro_literal_braces() {
        let logger = Logger::new();
        let seen = capture(&logger);
        log!(logger, "INFO", "{{not a placeholder}} {}", 5).unwrap();
        assert!(seen.lock()[0].ends_with("|{not a placeholder} 5"));
    }
}

//! Per-call overrides threaded through `Logger::log_with`

use super::log_context::{FieldValue, LogContext};
use super::record::{CallSite, ExceptionInfo};

/// Everything a single logging call may add on top of level and message
///
/// # Example
///
/// ```
/// use sinklog::core::CallOptions;
///
/// let options = CallOptions::new()
///     .arg(42)
///     .kwarg("user", "ann");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub(crate) args: Vec<FieldValue>,
    pub(crate) kwargs: LogContext,
    pub(crate) call_site: Option<CallSite>,
    pub(crate) exception: Option<ExceptionInfo>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional substitution argument
    #[must_use]
    pub fn arg(mut self, value: impl Into<FieldValue>) -> Self {
        self.args.push(value.into());
        self
    }

    #[must_use]
    pub fn args<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Add a keyword argument; it is substituted into `{name}` and lands in `extra`
    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.kwargs.add_field(key, value);
        self
    }

    #[must_use]
    pub fn kwargs(mut self, fields: &LogContext) -> Self {
        self.kwargs.extend(fields);
        self
    }

    /// Override the captured call site
    #[must_use]
    pub fn at(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }

    #[must_use]
    pub fn exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Attach an error and its `source()` chain
    #[must_use]
    pub fn error<E: std::error::Error + ?Sized>(self, err: &E) -> Self {
        self.exception(ExceptionInfo::from_error(err))
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
            && self.kwargs.is_empty()
            && self.call_site.is_none()
            && self.exception.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = CallOptions::new()
            .arg(1)
            .args(["a", "b"])
            .kwarg("k", true)
            .at(CallSite::new("main.rs", 3));

        assert_eq!(options.args.len(), 3);
        assert_eq!(options.kwargs.get("k"), Some(&FieldValue::Bool(true)));
        assert_eq!(options.call_site.as_ref().unwrap().line, 3);
        assert!(!options.is_empty());
        assert!(CallOptions::new().is_empty());
    }

    #[test]
    fn test_error_snapshot() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let options = CallOptions::new().error(&err);
        assert_eq!(options.exception.unwrap().message, "missing");
    }
}

//! Options accepted by `Logger::add`

use crate::core::error::{LoggerError, Result};
use crate::core::format::Formatter;
use crate::core::handler::{FilterFn, HandlerCore};
use crate::core::level::{LevelSpec, DEBUG};
use crate::core::overflow_policy::OverflowStrategy;
use crate::core::record::Record;
use crate::lifecycle::{Compression, Retention, Rotation};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How a file handler opens its file the first time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileMode {
    /// Keep existing content (`"a"`)
    #[default]
    Append,
    /// Truncate existing content (`"w"`)
    Truncate,
}

impl FromStr for FileMode {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "a" | "append" => Ok(FileMode::Append),
            "w" | "write" | "truncate" => Ok(FileMode::Truncate),
            other => Err(LoggerError::config(
                "mode",
                format!("expected 'a' or 'w', got '{}'", other),
            )),
        }
    }
}

/// Rotation as given by the caller, resolved when the handler is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationSpec {
    Bytes(u64),
    Text(String),
    Policy(Rotation),
}

impl RotationSpec {
    pub fn resolve(&self) -> Result<Rotation> {
        match self {
            RotationSpec::Bytes(bytes) => Rotation::size(*bytes),
            RotationSpec::Text(text) => Rotation::parse(text),
            RotationSpec::Policy(rotation) => Ok(rotation.clone()),
        }
    }
}

impl From<u64> for RotationSpec {
    fn from(bytes: u64) -> Self {
        RotationSpec::Bytes(bytes)
    }
}

impl From<i32> for RotationSpec {
    fn from(bytes: i32) -> Self {
        // negative sizes fail validation as zero
        RotationSpec::Bytes(u64::try_from(bytes).unwrap_or(0))
    }
}

impl From<&str> for RotationSpec {
    fn from(text: &str) -> Self {
        RotationSpec::Text(text.to_string())
    }
}

impl From<String> for RotationSpec {
    fn from(text: String) -> Self {
        RotationSpec::Text(text)
    }
}

impl From<Rotation> for RotationSpec {
    fn from(rotation: Rotation) -> Self {
        RotationSpec::Policy(rotation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionSpec {
    Format(String),
    Policy(Compression),
}

impl CompressionSpec {
    pub fn resolve(&self) -> Result<Compression> {
        match self {
            CompressionSpec::Format(format) => format.parse(),
            CompressionSpec::Policy(compression) => Ok(compression.clone()),
        }
    }
}

impl From<&str> for CompressionSpec {
    fn from(format: &str) -> Self {
        CompressionSpec::Format(format.to_string())
    }
}

impl From<String> for CompressionSpec {
    fn from(format: String) -> Self {
        CompressionSpec::Format(format)
    }
}

impl From<Compression> for CompressionSpec {
    fn from(compression: Compression) -> Self {
        CompressionSpec::Policy(compression)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionSpec {
    Count(usize),
    Text(String),
    Policy(Retention),
}

impl RetentionSpec {
    pub fn resolve(&self) -> Result<Retention> {
        match self {
            RetentionSpec::Count(count) => Ok(Retention::count(*count)),
            RetentionSpec::Text(text) => text.parse(),
            RetentionSpec::Policy(retention) => Ok(retention.clone()),
        }
    }
}

impl From<usize> for RetentionSpec {
    fn from(count: usize) -> Self {
        RetentionSpec::Count(count)
    }
}

impl From<i32> for RetentionSpec {
    fn from(count: i32) -> Self {
        RetentionSpec::Count(usize::try_from(count).unwrap_or(0))
    }
}

impl From<&str> for RetentionSpec {
    fn from(text: &str) -> Self {
        RetentionSpec::Text(text.to_string())
    }
}

impl From<String> for RetentionSpec {
    fn from(text: String) -> Self {
        RetentionSpec::Text(text)
    }
}

impl From<Retention> for RetentionSpec {
    fn from(retention: Retention) -> Self {
        RetentionSpec::Policy(retention)
    }
}

/// Per-handler configuration
///
/// # Example
///
/// ```
/// use sinklog::{HandlerOptions, OverflowStrategy};
///
/// let options = HandlerOptions::new()
///     .with_level("INFO")
///     .with_rotation("10 MB")
///     .with_compression("gz")
///     .with_retention(5)
///     .with_enqueue(true)
///     .with_max_queue_size(1000)
///     .with_overflow_strategy(OverflowStrategy::Drop);
/// ```
#[derive(Clone)]
pub struct HandlerOptions {
    pub(crate) level: LevelSpec,
    pub(crate) formatter: Option<Arc<dyn Formatter>>,
    pub(crate) filter: Option<FilterFn>,
    pub(crate) colorize: Option<bool>,
    pub(crate) serialize: bool,
    pub(crate) catch: bool,
    pub(crate) enqueue: bool,
    pub(crate) max_queue_size: usize,
    pub(crate) overflow_strategy: OverflowStrategy,
    pub(crate) mode: FileMode,
    pub(crate) rotation: Option<RotationSpec>,
    pub(crate) compression: Option<CompressionSpec>,
    pub(crate) retention: Option<RetentionSpec>,
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self {
            level: LevelSpec::Number(i64::from(DEBUG)),
            formatter: None,
            filter: None,
            colorize: None,
            serialize: false,
            catch: true,
            enqueue: false,
            max_queue_size: 0,
            overflow_strategy: OverflowStrategy::default(),
            mode: FileMode::default(),
            rotation: None,
            compression: None,
            retention: None,
        }
    }

    /// Minimum level, by name or number
    #[must_use]
    pub fn with_level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.level = level.into();
        self
    }

    #[must_use]
    pub fn with_formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Force colour on or off; by default only interactive streams are coloured
    #[must_use]
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = Some(colorize);
        self
    }

    #[must_use]
    pub fn with_serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }

    /// Whether sink errors are reported by the handler (default) or returned
    #[must_use]
    pub fn with_catch(mut self, catch: bool) -> Self {
        self.catch = catch;
        self
    }

    /// Deliver through a queue and a dedicated worker thread
    #[must_use]
    pub fn with_enqueue(mut self, enqueue: bool) -> Self {
        self.enqueue = enqueue;
        self
    }

    /// Queue capacity when enqueued; 0 means unbounded
    #[must_use]
    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    #[must_use]
    pub fn with_overflow_strategy(mut self, strategy: OverflowStrategy) -> Self {
        self.overflow_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: FileMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: impl Into<RotationSpec>) -> Self {
        self.rotation = Some(rotation.into());
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: impl Into<CompressionSpec>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    #[must_use]
    pub fn with_retention(mut self, retention: impl Into<RetentionSpec>) -> Self {
        self.retention = Some(retention.into());
        self
    }

    /// Build the shared handler state for a resolved threshold
    ///
    /// `interactive` is the sink's own terminal detection; `NO_COLOR` vetoes it.
    pub(crate) fn core(&self, threshold: u32, interactive: bool) -> HandlerCore {
        let colorize = self
            .colorize
            .unwrap_or_else(|| interactive && std::env::var_os("NO_COLOR").is_none());
        let mut core = HandlerCore::new(threshold)
            .with_filter(self.filter.clone())
            .with_colorize(colorize)
            .with_serialize(self.serialize)
            .with_catch(self.catch);
        if let Some(formatter) = &self.formatter {
            core = core.with_formatter(Arc::clone(formatter));
        }
        core
    }
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("level", &self.level)
            .field("formatter", &self.formatter.is_some())
            .field("filter", &self.filter.is_some())
            .field("colorize", &self.colorize)
            .field("serialize", &self.serialize)
            .field("catch", &self.catch)
            .field("enqueue", &self.enqueue)
            .field("max_queue_size", &self.max_queue_size)
            .field("overflow_strategy", &self.overflow_strategy)
            .field("mode", &self.mode)
            .field("rotation", &self.rotation)
            .field("compression", &self.compression)
            .field("retention", &self.retention)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let options = HandlerOptions::default();
        assert_eq!(options.level, LevelSpec::Number(10));
        assert!(options.catch);
        assert!(!options.enqueue);
        assert_eq!(options.max_queue_size, 0);
        assert_eq!(options.overflow_strategy, OverflowStrategy::Block);
        assert_eq!(options.mode, FileMode::Append);
    }

    #[test]
    fn test_rotation_spec_resolution() {
        assert_eq!(
            RotationSpec::from(1024u64).resolve().unwrap(),
            Rotation::Size { max_bytes: 1024 }
        );
        assert_eq!(
            RotationSpec::from("1 KB").resolve().unwrap(),
            Rotation::Size { max_bytes: 1024 }
        );
        assert_eq!(RotationSpec::from("daily").resolve().unwrap(), Rotation::daily());
        assert!(RotationSpec::from(-1).resolve().is_err());
        assert!(RotationSpec::from("sometimes").resolve().is_err());
    }

    #[test]
    fn test_compression_and_retention_specs() {
        assert!(CompressionSpec::from("zip").resolve().is_ok());
        assert!(CompressionSpec::from("rar").resolve().is_err());

        assert_eq!(RetentionSpec::from(3).resolve().unwrap(), Retention::count(3));
        assert_eq!(
            RetentionSpec::from("2 days").resolve().unwrap(),
            Retention::age(Duration::from_secs(172_800))
        );
    }

    #[test]
    fn test_file_mode_parse() {
        assert_eq!("a".parse::<FileMode>().unwrap(), FileMode::Append);
        assert_eq!("w".parse::<FileMode>().unwrap(), FileMode::Truncate);
        assert!("x".parse::<FileMode>().is_err());
    }

    #[test]
    fn test_core_colorize_resolution() {
        let forced = HandlerOptions::new().with_colorize(true).core(10, false);
        assert!(format!("{:?}", forced).contains("colorize: true"));

        let plain = HandlerOptions::new().core(10, false);
        assert!(format!("{:?}", plain).contains("colorize: false"));
    }
}

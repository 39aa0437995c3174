//! Record formatting
//!
//! A [`Formatter`] turns a record into the line a handler writes. Any closure
//! `Fn(&Record) -> Result<String>` is a formatter; [`TextFormatter`] is the
//! default.

use super::error::Result;
use super::record::Record;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Formatting capability of a handler
pub trait Formatter: Send + Sync {
    fn format(&self, record: &Record, colorize: bool) -> Result<String>;
}

impl<F> Formatter for F
where
    F: Fn(&Record) -> Result<String> + Send + Sync,
{
    fn format(&self, record: &Record, _colorize: bool) -> Result<String> {
        self(record)
    }
}

/// Timestamp rendering options
///
/// # Examples
///
/// ```
/// use sinklog::core::TimestampFormat;
/// use chrono::Local;
///
/// let stamp = TimestampFormat::Rfc3339.format(&Local::now());
/// assert!(stamp.contains('T'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Local time with milliseconds: `2025-01-08 10:30:45.123`
    #[default]
    Local,

    /// ISO 8601 with microseconds and offset: `2025-01-08T10:30:45.123456+02:00`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+02:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimestampFormat::Local => datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => {
                use std::fmt::Write;
                // an invalid specifier surfaces as fmt::Error
                let mut out = String::new();
                match write!(out, "{}", datetime.format(format_str)) {
                    Ok(()) => out,
                    Err(_) => datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                }
            }
        }
    }
}

/// Default line layout
///
/// `2025-01-08 10:30:45.123 | INFO     | module:function:42 - message key=value`
///
/// # Examples
///
/// ```
/// use sinklog::core::{TextFormatter, TimestampFormat};
///
/// let formatter = TextFormatter::new()
///     .with_timestamp_format(TimestampFormat::Rfc3339)
///     .with_extra(false);
/// ```
#[derive(Debug, Clone)]
pub struct TextFormatter {
    timestamp_format: TimestampFormat,
    include_location: bool,
    include_extra: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self {
            timestamp_format: TimestampFormat::default(),
            include_location: true,
            include_extra: true,
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Set a custom timestamp format using a strftime-compatible format string
    #[must_use]
    pub fn with_custom_timestamp(mut self, format_str: &str) -> Self {
        self.timestamp_format = TimestampFormat::Custom(format_str.to_string());
        self
    }

    #[must_use]
    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }

    /// Whether `extra` fields are appended as `key=value` pairs
    #[must_use]
    pub fn with_extra(mut self, include: bool) -> Self {
        self.include_extra = include;
        self
    }

    fn level_segment(record: &Record, colorize: bool) -> String {
        let padded = format!("{:<8}", record.level.name);
        if colorize {
            paint::level(padded, record)
        } else {
            padded
        }
    }

    fn time_segment(&self, record: &Record, colorize: bool) -> String {
        let stamp = self.timestamp_format.format(&record.time);
        if colorize {
            paint::time(stamp)
        } else {
            stamp
        }
    }
}

#[cfg(feature = "console")]
mod paint {
    use crate::core::record::Record;
    use colored::Colorize;

    pub(super) fn level(text: String, record: &Record) -> String {
        text.color(record.level.color_code()).bold().to_string()
    }

    pub(super) fn time(text: String) -> String {
        text.green().to_string()
    }
}

#[cfg(not(feature = "console"))]
mod paint {
    use crate::core::record::Record;

    pub(super) fn level(text: String, _record: &Record) -> String {
        text
    }

    pub(super) fn time(text: String) -> String {
        text
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &Record, colorize: bool) -> Result<String> {
        let mut line = format!(
            "{} | {} | ",
            self.time_segment(record, colorize),
            Self::level_segment(record, colorize)
        );

        if self.include_location {
            line.push_str(&format!(
                "{}:{}:{} - ",
                record.call_site.module, record.call_site.function, record.call_site.line
            ));
        }
        line.push_str(&record.message);

        if self.include_extra && !record.extra.is_empty() {
            line.push(' ');
            line.push_str(&record.extra.format_fields());
        }

        if let Some(ref exception) = record.exception {
            line.push_str(&format!("\n{}: {}", exception.type_name, exception.message));
            for cause in &exception.chain {
                line.push_str(&format!("\n  caused by: {}", cause));
            }
        }

        Ok(line)
    }
}

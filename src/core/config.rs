//! Declarative logger configuration
//!
//! A [`LoggerConfig`] is plain data (deserializable from JSON) describing
//! custom levels, shared extra fields and handlers. `Logger::from_config`
//! turns it into a live logger through the same `add` path as code does.
//!
//! ```json
//! {
//!   "levels": [{ "name": "AUDIT", "no": 35, "color": "magenta" }],
//!   "extra": { "service": "billing" },
//!   "handlers": [
//!     { "sink": "stderr", "level": "INFO" },
//!     { "sink": "logs/app.log", "rotation": "10 MB", "compression": "gz",
//!       "retention": 5, "enqueue": true, "overflow_strategy": "drop" }
//!   ]
//! }
//! ```

use super::error::{LoggerError, Result};
use super::format::{TextFormatter, TimestampFormat};
use super::level::LevelSpec;
use super::log_context::FieldValue;
use super::logger::Logger;
use super::overflow_policy::OverflowStrategy;
use crate::handlers::{FileMode, HandlerOptions, RetentionSpec, RotationSpec, Sink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub levels: Vec<LevelConfig>,
    pub extra: BTreeMap<String, FieldValue>,
    pub handlers: Vec<HandlerConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelConfig {
    pub name: String,
    pub no: u32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

fn default_color() -> String {
    "white".to_string()
}

/// A number or a string, as rotation and retention accept both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandlerConfig {
    /// `"stdout"`, `"stderr"` or a file path
    pub sink: String,
    pub level: LevelSpec,
    pub colorize: Option<bool>,
    pub serialize: bool,
    pub catch: bool,
    pub enqueue: bool,
    pub max_queue_size: usize,
    pub overflow_strategy: OverflowStrategy,
    /// `"a"` or `"w"`
    pub mode: Option<String>,
    pub rotation: Option<NumberOrText>,
    /// `"gz"` or `"zip"`
    pub compression: Option<String>,
    pub retention: Option<NumberOrText>,
    /// strftime pattern for the text formatter
    pub timestamp_format: Option<String>,
    pub include_location: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            sink: "stderr".to_string(),
            level: LevelSpec::from("DEBUG"),
            colorize: None,
            serialize: false,
            catch: true,
            enqueue: false,
            max_queue_size: 0,
            overflow_strategy: OverflowStrategy::default(),
            mode: None,
            rotation: None,
            compression: None,
            retention: None,
            timestamp_format: None,
            include_location: true,
        }
    }
}

impl HandlerConfig {
    pub fn sink(&self) -> Result<Sink> {
        match self.sink.trim() {
            "" => Err(LoggerError::UnsupportedSink("empty sink".to_string())),
            "stdout" => Ok(Sink::stdout()),
            "stderr" => Ok(Sink::stderr()),
            path => Ok(Sink::file(path)),
        }
    }

    pub fn options(&self) -> Result<HandlerOptions> {
        let mut formatter = TextFormatter::new().with_location(self.include_location);
        if let Some(pattern) = &self.timestamp_format {
            formatter = formatter.with_timestamp_format(TimestampFormat::Custom(pattern.clone()));
        }

        let mut options = HandlerOptions::new()
            .with_level(self.level.clone())
            .with_formatter(formatter)
            .with_serialize(self.serialize)
            .with_catch(self.catch)
            .with_enqueue(self.enqueue)
            .with_max_queue_size(self.max_queue_size)
            .with_overflow_strategy(self.overflow_strategy);

        if let Some(colorize) = self.colorize {
            options = options.with_colorize(colorize);
        }
        if let Some(mode) = &self.mode {
            options = options.with_mode(mode.parse::<FileMode>()?);
        }
        if let Some(rotation) = &self.rotation {
            options = options.with_rotation(match rotation {
                NumberOrText::Number(bytes) => RotationSpec::Bytes(*bytes),
                NumberOrText::Text(text) => RotationSpec::Text(text.clone()),
            });
        }
        if let Some(compression) = &self.compression {
            options = options.with_compression(compression.as_str());
        }
        if let Some(retention) = &self.retention {
            let retention = match retention {
                NumberOrText::Number(count) => usize::try_from(*count)
                    .map(RetentionSpec::Count)
                    .map_err(|_| LoggerError::config("retention", "count out of range"))?,
                NumberOrText::Text(text) => RetentionSpec::Text(text.clone()),
            };
            options = options.with_retention(retention);
        }
        Ok(options)
    }
}

impl LoggerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                format!("cannot read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json(&text)
    }
}

impl Logger {
    /// Build a logger from configuration; fails on the first invalid entry
    pub fn from_config(config: &LoggerConfig) -> Result<Logger> {
        let mut builder = Logger::builder();
        for level in &config.levels {
            builder = builder.level(&level.name, level.no, &level.color, &level.icon);
        }
        for (key, value) in &config.extra {
            builder = builder.extra(key.clone(), value.clone());
        }
        for handler in &config.handlers {
            builder = builder.handler(handler.sink()?, handler.options()?);
        }
        builder.build()
    }
}

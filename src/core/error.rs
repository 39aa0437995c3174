//! Error types for the logger

use super::handler::HandlerId;

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Error type returned by user-supplied callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Zip archive error
    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Level name or number that is not registered
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Handler id that is not (or no longer) registered
    #[error("Handler with id {0} not found")]
    HandlerNotFound(HandlerId),

    /// Sink that cannot be turned into a handler
    #[error("Unsupported sink: {0}")]
    UnsupportedSink(String),

    /// Queue full with buffer details
    #[error("Log queue full: {current}/{max} records buffered")]
    QueueFull { current: usize, max: usize },

    /// Channel send error
    #[error("Failed to send log record to async worker")]
    ChannelSendError,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Compression error
    #[error("Compression failed for '{path}': {message}")]
    CompressionError { path: String, message: String },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// A sink (stream, file, callback) refused the record
    #[error("Sink error in {handler} handler: {source}")]
    SinkError {
        handler: String,
        #[source]
        source: BoxError,
    },

    /// User code inside a handler panicked
    #[error("Handler panicked: {0}")]
    HandlerPanic(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid level error from anything printable
    pub fn invalid_level(level: impl std::fmt::Display) -> Self {
        LoggerError::InvalidLevel(level.to_string())
    }

    /// Create a queue full error with buffer details
    pub fn queue_full(current: usize, max: usize) -> Self {
        LoggerError::QueueFull { current, max }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a compression error
    pub fn compression(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::CompressionError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Wrap a sink failure with the kind of handler that hit it
    pub fn sink(handler: impl Into<String>, source: impl Into<BoxError>) -> Self {
        LoggerError::SinkError {
            handler: handler.into(),
            source: source.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

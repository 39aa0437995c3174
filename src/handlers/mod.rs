//! Concrete handlers and the factory `Logger::add` goes through

pub mod async_handler;
pub mod callable;
pub mod file;
pub mod options;
pub mod sink;
pub mod stream;

pub use async_handler::{AsyncHandler, DEFAULT_SHUTDOWN_TIMEOUT};
pub use callable::CallableHandler;
pub use file::FileHandler;
pub use options::{CompressionSpec, FileMode, HandlerOptions, RetentionSpec, RotationSpec};
pub use sink::{Callback, Sink, StreamTarget};
pub use stream::StreamHandler;

use crate::core::error::{LoggerError, Result};
use crate::core::handler::Handler;
use crate::core::metrics::QueueMetrics;
use std::sync::Arc;

/// A handler ready for registration
pub(crate) struct Built {
    pub handler: Arc<dyn Handler>,
    /// Present when the handler is queue-backed
    pub metrics: Option<Arc<QueueMetrics>>,
}

/// Turn a classified sink plus its options into a handler
///
/// Every option string is resolved before anything is opened, so a bad
/// rotation or retention value never leaves a half-created file behind.
pub(crate) fn build(sink: Sink, options: &HandlerOptions, threshold: u32) -> Result<Built> {
    sink.validate()?;
    let file_only = options.rotation.is_some()
        || options.compression.is_some()
        || options.retention.is_some();
    if file_only && !matches!(sink, Sink::File(_)) {
        return Err(LoggerError::config(
            "handler",
            format!(
                "rotation, compression and retention only apply to file sinks, not {}",
                sink.kind()
            ),
        ));
    }

    let handler: Arc<dyn Handler> = match sink {
        Sink::File(path) => {
            let rotation = options.rotation.as_ref().map(RotationSpec::resolve).transpose()?;
            let compression = options
                .compression
                .as_ref()
                .map(CompressionSpec::resolve)
                .transpose()?;
            let retention = options.retention.as_ref().map(RetentionSpec::resolve).transpose()?;

            let mut handler = FileHandler::new(path, options.core(threshold, false), options.mode)?;
            if let Some(rotation) = rotation {
                handler = handler.with_rotation(rotation);
            }
            if let Some(compression) = compression {
                handler = handler.with_compression(compression);
            }
            if let Some(retention) = retention {
                handler = handler.with_retention(retention);
            }
            Arc::new(handler)
        }
        Sink::Stream(target) => {
            let core = options.core(threshold, target.is_interactive());
            Arc::new(StreamHandler::new(target, core))
        }
        Sink::Callable(callback) => {
            Arc::new(CallableHandler::new(callback, options.core(threshold, false)))
        }
    };

    if !options.enqueue {
        return Ok(Built {
            handler,
            metrics: None,
        });
    }

    let queued = AsyncHandler::new(handler, options.max_queue_size, options.overflow_strategy)?;
    let metrics = queued.metrics();
    Ok(Built {
        handler: Arc::new(queued),
        metrics: Some(metrics),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_variants() {
        let dir = tempfile::tempdir().unwrap();

        let file = build(Sink::from(dir.path().join("a.log")), &HandlerOptions::new(), 10).unwrap();
        assert_eq!(file.handler.kind(), "file");
        assert!(file.metrics.is_none());

        let queued = build(
            Sink::writer(Vec::<u8>::new()),
            &HandlerOptions::new().with_enqueue(true),
            10,
        )
        .unwrap();
        assert_eq!(queued.handler.kind(), "async");
        assert!(queued.metrics.is_some());
        queued.handler.close().unwrap();
    }

    #[test]
    fn test_file_options_rejected_for_streams() {
        let result = build(
            Sink::stderr(),
            &HandlerOptions::new().with_rotation("1 MB"),
            10,
        );
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_bad_rotation_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.log");
        let result = build(
            Sink::from(&path),
            &HandlerOptions::new().with_rotation("whenever"),
            10,
        );
        assert!(result.is_err());
        assert!(!path.exists());
    }
}

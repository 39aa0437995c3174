//! Destinations accepted by `Logger::add`
//!
//! A sink is classified once, when it is added: paths become file handlers,
//! writers become stream handlers and closures become callable handlers.

use crate::core::error::{BoxError, LoggerError, Result};
use std::fmt;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callback receiving each formatted line (or JSON document when serializing)
pub type Callback = Arc<dyn Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync>;

pub enum StreamTarget {
    Stdout,
    Stderr,
    /// Any writer; `interactive` controls colour auto-detection
    Writer {
        writer: Box<dyn Write + Send>,
        interactive: bool,
    },
}

impl StreamTarget {
    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        StreamTarget::Writer {
            writer: Box::new(writer),
            interactive: false,
        }
    }

    /// Whether the stream reports itself as a terminal
    pub fn is_interactive(&self) -> bool {
        match self {
            StreamTarget::Stdout => std::io::stdout().is_terminal(),
            StreamTarget::Stderr => std::io::stderr().is_terminal(),
            StreamTarget::Writer { interactive, .. } => *interactive,
        }
    }
}

impl fmt::Debug for StreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamTarget::Stdout => write!(f, "Stdout"),
            StreamTarget::Stderr => write!(f, "Stderr"),
            StreamTarget::Writer { interactive, .. } => f
                .debug_struct("Writer")
                .field("interactive", interactive)
                .finish_non_exhaustive(),
        }
    }
}

pub enum Sink {
    Stream(StreamTarget),
    File(PathBuf),
    Callable(Callback),
}

impl Sink {
    pub fn stdout() -> Self {
        Sink::Stream(StreamTarget::Stdout)
    }

    pub fn stderr() -> Self {
        Sink::Stream(StreamTarget::Stderr)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Sink::File(path.into())
    }

    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        Sink::Stream(StreamTarget::writer(writer))
    }

    /// A writer that should be treated as a terminal for colour detection
    pub fn interactive_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Sink::Stream(StreamTarget::Writer {
            writer: Box::new(writer),
            interactive: true,
        })
    }

    pub fn callable<F>(callback: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        Sink::Callable(Arc::new(callback))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Sink::Stream(_) => "stream",
            Sink::File(_) => "file",
            Sink::Callable(_) => "callable",
        }
    }

    /// Reject sinks that cannot possibly be written to
    pub fn validate(&self) -> Result<()> {
        if let Sink::File(path) = self {
            if path.as_os_str().is_empty() {
                return Err(LoggerError::UnsupportedSink("empty file path".to_string()));
            }
            if path.is_dir() {
                return Err(LoggerError::UnsupportedSink(format!(
                    "'{}' is a directory",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Stream(target) => f.debug_tuple("Stream").field(target).finish(),
            Sink::File(path) => f.debug_tuple("File").field(path).finish(),
            Sink::Callable(_) => write!(f, "Callable(..)"),
        }
    }
}

impl From<PathBuf> for Sink {
    fn from(path: PathBuf) -> Self {
        Sink::File(path)
    }
}

impl From<&Path> for Sink {
    fn from(path: &Path) -> Self {
        Sink::File(path.to_path_buf())
    }
}

impl From<&PathBuf> for Sink {
    fn from(path: &PathBuf) -> Self {
        Sink::File(path.clone())
    }
}

impl From<&str> for Sink {
    fn from(path: &str) -> Self {
        Sink::File(PathBuf::from(path))
    }
}

impl From<String> for Sink {
    fn from(path: String) -> Self {
        Sink::File(PathBuf::from(path))
    }
}

impl From<std::io::Stdout> for Sink {
    fn from(_: std::io::Stdout) -> Self {
        Sink::stdout()
    }
}

impl From<std::io::Stderr> for Sink {
    fn from(_: std::io::Stderr) -> Self {
        Sink::stderr()
    }
}

impl From<Callback> for Sink {
    fn from(callback: Callback) -> Self {
        Sink::Callable(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(Sink::from("app.log").kind(), "file");
        assert_eq!(Sink::from(PathBuf::from("/tmp/x.log")).kind(), "file");
        assert_eq!(Sink::from(std::io::stderr()).kind(), "stream");
        assert_eq!(Sink::writer(Vec::<u8>::new()).kind(), "stream");
        assert_eq!(Sink::callable(|_| Ok(())).kind(), "callable");
    }

    #[test]
    fn test_validate_rejects_unusable_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Sink::from("").validate(),
            Err(LoggerError::UnsupportedSink(_))
        ));
        assert!(matches!(
            Sink::from(dir.path()).validate(),
            Err(LoggerError::UnsupportedSink(_))
        ));
        assert!(Sink::from(dir.path().join("ok.log")).validate().is_ok());
        assert!(Sink::stdout().validate().is_ok());
    }

    #[test]
    fn test_writer_interactivity() {
        assert!(!StreamTarget::writer(Vec::<u8>::new()).is_interactive());
        match Sink::interactive_writer(Vec::<u8>::new()) {
            Sink::Stream(target) => assert!(target.is_interactive()),
            other => panic!("unexpected sink {:?}", other),
        }
    }
}

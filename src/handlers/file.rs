//! File handler with rotation, compression and retention
//!
//! The handler owns at most one open descriptor, kept in an
//! `Option<BufWriter<File>>` slot behind the handler lock. "Check rotation,
//! maybe rotate, write" runs as one critical section, so concurrent callers
//! never both rotate and never write into a file that is being renamed.
//!
//! Rotated files are renamed to `<stem>.<YYYY-MM-DD_HH-MM-SS-ffffff><suffix>`
//! next to the active file, which always keeps its original path.

use super::options::FileMode;
use crate::core::error::{LoggerError, Result};
use crate::core::handler::{Handler, HandlerCore};
use crate::core::record::Record;
use crate::lifecycle::{Compression, Retention, Rotation};
use chrono::{DateTime, Local};
use glob::Pattern;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ROTATED_TIMESTAMP: &str = "%Y-%m-%d_%H-%M-%S-%6f";

struct FileState {
    writer: Option<BufWriter<File>>,
    rotation: Option<Rotation>,
}

pub struct FileHandler {
    core: HandlerCore,
    path: PathBuf,
    compression: Option<Compression>,
    retention: Option<Retention>,
    state: Mutex<FileState>,
}

impl FileHandler {
    /// Open (creating parent directories) the file at `path`
    pub fn new(path: impl Into<PathBuf>, core: HandlerCore, mode: FileMode) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "creating log directory",
                    format!("cannot create '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let writer = open(&path, mode == FileMode::Truncate).map_err(|e| {
            LoggerError::io_operation(
                "opening log file",
                format!("cannot open '{}'", path.display()),
                e,
            )
        })?;

        Ok(Self {
            core,
            path,
            compression: None,
            retention: None,
            state: Mutex::new(FileState {
                writer: Some(BufWriter::new(writer)),
                rotation: None,
            }),
        })
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.state.get_mut().rotation = Some(rotation);
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = Some(retention);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Glob matching this handler's rotated (and compressed) files
    pub fn rotated_pattern(&self) -> String {
        let (stem, suffix) = split_name(&self.path);
        let stem = Pattern::escape(&stem);
        if suffix.is_empty() {
            return format!("{}.*", stem);
        }
        format!("{}.*{}*", stem, Pattern::escape(&suffix))
    }

    /// Where the active file is moved when rotated at `now`
    fn rotated_path(&self, now: DateTime<Local>) -> PathBuf {
        let (stem, suffix) = split_name(&self.path);
        let stamp = now.format(ROTATED_TIMESTAMP);
        let candidate = self.path.with_file_name(format!("{}.{}{}", stem, stamp, suffix));
        if !self.is_taken(&candidate) {
            return candidate;
        }
        (1u32..)
            .map(|n| self.path.with_file_name(format!("{}.{}.{}{}", stem, stamp, n, suffix)))
            .find(|path| !self.is_taken(path))
            .unwrap_or(candidate)
    }

    /// A rotated name is taken by the file itself or by its archive
    fn is_taken(&self, path: &Path) -> bool {
        path.exists()
            || self
                .compression
                .as_ref()
                .is_some_and(|c| c.target_path(path).exists())
    }

    fn write_record(&self, state: &mut FileState, record: &Record, line: &str) -> Result<()> {
        let due = match state.rotation.as_mut() {
            Some(rotation) => rotation.should_rotate(&self.path, record),
            None => false,
        };
        if due {
            if let Err(e) = self.rotate(state) {
                eprintln!("[LOGGER ERROR] {}. Continuing with the current file.", e);
                self.recover(state);
            }
        }

        if state.writer.is_none() {
            state.writer = Some(BufWriter::new(open(&self.path, false)?));
        }
        let writer = state
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::other("file writer not initialized"))?;

        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush())
            .map_err(|e| {
                LoggerError::io_operation(
                    "writing log record",
                    format!("cannot write to '{}'", self.path.display()),
                    e,
                )
            })
    }

    /// Close, rename, restart the schedule, compress, prune, reopen
    fn rotate(&self, state: &mut FileState) -> Result<()> {
        if let Some(mut writer) = state.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("failed to flush before rotation: {}", e),
                )
            })?;
        }

        let now = Local::now();
        let rotated = self.rotated_path(now);
        let renamed = match fs::rename(&self.path, &rotated) {
            Ok(()) => Some(rotated),
            // Someone else removed the file; there is nothing to rotate
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("failed to rename to '{}': {}", rotated.display(), e),
                ))
            }
        };

        if let Some(rotation) = state.rotation.as_mut() {
            rotation.reset(now);
        }

        if let (Some(compression), Some(rotated)) = (&self.compression, &renamed) {
            compression.compress(rotated);
        }

        if let Some(retention) = &self.retention {
            retention.clean(self.directory(), &self.rotated_pattern());
        }

        let file = open(&self.path, false).map_err(|e| {
            LoggerError::file_rotation(
                self.path.display().to_string(),
                format!("failed to reopen after rotation: {}", e),
            )
        })?;
        state.writer = Some(BufWriter::new(file));
        Ok(())
    }

    /// After a failed rotation, make sure later writes still have a file
    fn recover(&self, state: &mut FileState) {
        if state.writer.is_some() {
            return;
        }
        match open(&self.path, false) {
            Ok(file) => state.writer = Some(BufWriter::new(file)),
            Err(e) => eprintln!(
                "[LOGGER ERROR] Failed to reopen {} after rotation failure: {}",
                self.path.display(),
                e
            ),
        }
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// `app.log` → (`app`, `.log`); `app` → (`app`, ``)
fn split_name(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, suffix)
}

fn open(path: &Path, truncate: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options.open(path)
}

impl Handler for FileHandler {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn should_emit(&self, record: &Record) -> bool {
        self.core.should_emit(record)
    }

    fn deliver(&self, record: &Arc<Record>) -> Result<()> {
        let line = self.core.format(record);
        self.core.guard(self.kind(), || {
            let mut state = self.state.lock();
            self.write_record(&mut state, record, &line)
        })
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.state.lock().writer.as_mut() {
            writer.flush().map_err(|e| {
                LoggerError::io_operation(
                    "flushing log file",
                    format!("cannot flush '{}'", self.path.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        match self.state.lock().writer.take() {
            Some(mut writer) => Ok(writer.flush()?),
            None => Ok(()),
        }
    }
}

impl Drop for FileHandler {
    fn drop(&mut self) {
        if let Some(mut writer) = self.state.get_mut().writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;

    fn core() -> HandlerCore {
        HandlerCore::new(0).with_formatter(Arc::new(|r: &Record| -> Result<String> {
            Ok(r.message.clone())
        }))
    }

    fn record(message: &str) -> Arc<Record> {
        Arc::new(Record::new(Arc::new(Level::new("INFO", 20, "white", "")), message))
    }

    fn rotated_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name != "app.log")
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_append_and_truncate_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let appending = FileHandler::new(&path, core(), FileMode::Append).unwrap();
        appending.emit(&record("new")).unwrap();
        appending.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");

        let truncating = FileHandler::new(&path, core(), FileMode::Truncate).unwrap();
        truncating.emit(&record("fresh")).unwrap();
        truncating.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.log");
        let handler = FileHandler::new(&path, core(), FileMode::Append).unwrap();
        handler.emit(&record("x")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_size_rotation_at_exact_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        // each line is 10 bytes including the newline
        let handler = FileHandler::new(&path, core(), FileMode::Append)
            .unwrap()
            .with_rotation(Rotation::size(30).unwrap());

        for _ in 0..3 {
            handler.emit(&record("123456789")).unwrap();
        }
        assert!(rotated_files(dir.path()).is_empty());
        assert_eq!(fs::metadata(&path).unwrap().len(), 30);

        handler.emit(&record("abcdefghi")).unwrap();
        let rotated = rotated_files(dir.path());
        assert_eq!(rotated.len(), 1);
        assert!(rotated[0].starts_with("app.") && rotated[0].ends_with(".log"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "abcdefghi\n");
        assert_eq!(fs::metadata(dir.path().join(&rotated[0])).unwrap().len(), 30);
    }

    #[test]
    fn test_filtered_records_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let rejecting = core().with_filter(Some(Arc::new(|_: &Record| false)));
        let handler = FileHandler::new(&path, rejecting, FileMode::Append)
            .unwrap()
            .with_rotation(Rotation::size(1).unwrap());

        for _ in 0..10 {
            handler.emit(&record("dropped")).unwrap();
        }
        assert!(rotated_files(dir.path()).is_empty());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_rotation_with_compression_and_retention() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let handler = FileHandler::new(&path, core(), FileMode::Append)
            .unwrap()
            .with_rotation(Rotation::size(64).unwrap())
            .with_compression(Compression::gzip())
            .with_retention(Retention::count(3));

        for i in 0..200 {
            handler.emit(&record(&format!("line number {:04}", i))).unwrap();
        }
        handler.close().unwrap();

        let rotated = rotated_files(dir.path());
        assert!(!rotated.is_empty());
        assert!(rotated.len() <= 3, "{:?}", rotated);
        assert!(rotated.iter().all(|name| name.ends_with(".log.gz")), "{:?}", rotated);
        assert!(path.exists());
    }

    #[test]
    fn test_rotated_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let handler = FileHandler::new(&path, core(), FileMode::Append)
            .unwrap()
            .with_rotation(Rotation::size(1).unwrap());

        for i in 0..20 {
            handler.emit(&record(&format!("{}", i))).unwrap();
        }
        // the first write never rotates, every later one does
        assert_eq!(rotated_files(dir.path()).len(), 19);
    }

    #[test]
    fn test_externally_removed_file_is_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let handler = FileHandler::new(&path, core(), FileMode::Append).unwrap();
        handler.emit(&record("before")).unwrap();
        handler.close().unwrap();
        fs::remove_file(&path).unwrap();

        handler.emit(&record("after")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "after\n");
    }

    #[test]
    fn test_rotated_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let handler = FileHandler::new(dir.path().join("app.log"), core(), FileMode::Append).unwrap();
        assert_eq!(handler.rotated_pattern(), "app.*.log*");
        let bare = FileHandler::new(dir.path().join("service"), core(), FileMode::Append).unwrap();
        assert_eq!(bare.rotated_pattern(), "service.*");
        let bracketed =
            FileHandler::new(dir.path().join("app[1].log"), core(), FileMode::Append).unwrap();
        assert_eq!(bracketed.rotated_pattern(), "app[[]1[]].*.log*");
    }
}

//! Retention of rotated log files
//!
//! After each rotation the file handler asks its retention policy to prune
//! files matching `<stem>.*<suffix>*` in the log directory, where `<suffix>`
//! keeps its leading dot so the active file itself never matches. Every configured
//! limit (count, age, total size) must keep a file for it to survive.

use crate::core::error::{LoggerError, Result};
use crate::core::units::parse_duration;
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime};

/// One candidate file as seen by [`Retention::plan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    pub delete: bool,
}

/// Limits on the rotated files kept next to a log
///
/// # Example
///
/// ```
/// use sinklog::lifecycle::Retention;
/// use std::time::Duration;
///
/// let retention = Retention::count(10)
///     .with_age(Duration::from_secs(7 * 86_400))
///     .with_size(500 * 1024 * 1024);
///
/// let by_age: Retention = "10 days".parse().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retention {
    count: Option<usize>,
    age: Option<Duration>,
    size: Option<u64>,
}

impl Retention {
    /// Keep the `count` most recently modified files
    pub fn count(count: usize) -> Self {
        Self::default().with_count(count)
    }

    /// Keep files modified within `age`
    pub fn age(age: Duration) -> Self {
        Self::default().with_age(age)
    }

    /// Keep the newest files whose combined size fits in `bytes`
    pub fn size(bytes: u64) -> Self {
        Self::default().with_size(bytes)
    }

    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_age(mut self, age: Duration) -> Self {
        self.age = Some(age);
        self
    }

    #[must_use]
    pub fn with_size(mut self, bytes: u64) -> Self {
        self.size = Some(bytes);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.count.is_none() && self.age.is_none() && self.size.is_none()
    }

    /// Decide the fate of every file in `dir` matching `pattern`, newest first
    pub fn plan(&self, dir: &Path, pattern: &str) -> Result<Vec<RetainedFile>> {
        let entries = fs::read_dir(dir).map_err(|e| {
            LoggerError::io_operation(
                "scanning for rotated files",
                format!("cannot read directory '{}'", dir.display()),
                e,
            )
        })?;
        let matcher = Pattern::new(pattern).map_err(|e| {
            LoggerError::config("retention", format!("invalid file pattern '{}': {}", pattern, e))
        })?;

        let mut files: Vec<RetainedFile> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| matcher.matches(&entry.file_name().to_string_lossy()))
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                if !meta.is_file() {
                    return None;
                }
                Some(RetainedFile {
                    path: entry.path(),
                    size: meta.len(),
                    modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                    delete: false,
                })
            })
            .collect();

        files.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.path.file_name().cmp(&a.path.file_name()))
        });

        let now = SystemTime::now();
        let mut kept_bytes = 0u64;
        for (index, file) in files.iter_mut().enumerate() {
            let over_count = self.count.is_some_and(|count| index >= count);
            let too_old = self.age.is_some_and(|age| {
                now.duration_since(file.modified).unwrap_or(Duration::ZERO) > age
            });
            let over_size = self.size.is_some_and(|budget| {
                kept_bytes = kept_bytes.saturating_add(file.size);
                kept_bytes > budget
            });
            file.delete = over_count || too_old || over_size;
        }

        Ok(files)
    }

    /// Delete what [`plan`](Self::plan) marks; returns the deleted paths
    ///
    /// Individual deletion failures are reported and skipped.
    pub fn clean(&self, dir: &Path, pattern: &str) -> Vec<PathBuf> {
        if self.is_unbounded() {
            return Vec::new();
        }
        let plan = match self.plan(dir, pattern) {
            Ok(plan) => plan,
            Err(e) => {
                eprintln!("[LOGGER ERROR] Retention skipped: {}", e);
                return Vec::new();
            }
        };

        plan.into_iter()
            .filter(|file| file.delete)
            .filter_map(|file| match fs::remove_file(&file.path) {
                Ok(()) => Some(file.path),
                Err(e) => {
                    eprintln!(
                        "[LOGGER WARNING] Retention failed to remove {}: {}",
                        file.path.display(),
                        e
                    );
                    None
                }
            })
            .collect()
    }

    /// Bytes a `clean` with the same arguments would free right now
    pub fn estimate_space_freed(&self, dir: &Path, pattern: &str) -> Result<u64> {
        Ok(self
            .plan(dir, pattern)?
            .iter()
            .filter(|file| file.delete)
            .map(|file| file.size)
            .sum())
    }
}

impl FromStr for Retention {
    type Err = LoggerError;

    /// A bare integer is a file count, anything else a duration
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        if let Ok(count) = text.parse::<usize>() {
            return Ok(Retention::count(count));
        }
        parse_duration(text).map(Retention::age).map_err(|_| {
            LoggerError::config(
                "retention",
                format!("invalid retention '{}': expected a file count or a duration", s),
            )
        })
    }
}

/// Shell-style match of a file name against a rotated-file pattern
///
/// An invalid pattern matches nothing.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    Pattern::new(pattern).is_ok_and(|pattern| pattern.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str, bytes: usize, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, vec![b'x'; bytes]).unwrap();
        let modified = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
        path
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("app.*.log*", "app.2025-01-08.log"));
        assert!(wildcard_match("app.*.log*", "app.2025-01-08.log.gz"));
        assert!(!wildcard_match("app.*.log*", "app.log"));
        assert!(!wildcard_match("app.*.log*", "other.1.log"));
        assert!(wildcard_match("a?c", "abc"));
        assert!(!wildcard_match("a?c", "ac"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("app[[]1[]].*.log*", "app[1].2025-01-08.log"));
        assert!(!wildcard_match("app[[]1[]].*.log*", "app1.2025-01-08.log"));
        assert!(!wildcard_match("[", "["));
    }

    #[test]
    fn test_count_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app.1.log", 10, 400);
        touch(dir.path(), "app.2.log", 10, 300);
        touch(dir.path(), "app.3.log", 10, 200);
        touch(dir.path(), "app.4.log", 10, 100);
        touch(dir.path(), "app.log", 10, 0);

        let deleted = Retention::count(2).clean(dir.path(), "app.*.log*");
        assert_eq!(names(&deleted), vec!["app.1.log", "app.2.log"]);
        assert!(dir.path().join("app.log").exists());
    }

    #[test]
    fn test_age() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app.old.log", 10, 3 * 86_400);
        touch(dir.path(), "app.new.log", 10, 60);

        let deleted = Retention::age(Duration::from_secs(86_400)).clean(dir.path(), "app.*.log*");
        assert_eq!(names(&deleted), vec!["app.old.log"]);
    }

    #[test]
    fn test_size_budget_keeps_newest_prefix() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app.a.log", 100, 300);
        touch(dir.path(), "app.b.log", 100, 200);
        touch(dir.path(), "app.c.log", 100, 100);

        let retention = Retention::size(250);
        assert_eq!(retention.estimate_space_freed(dir.path(), "app.*.log*").unwrap(), 100);
        let deleted = retention.clean(dir.path(), "app.*.log*");
        assert_eq!(names(&deleted), vec!["app.a.log"]);
    }

    #[test]
    fn test_constraints_intersect() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app.1.log", 10, 5 * 86_400);
        touch(dir.path(), "app.2.log", 10, 4 * 86_400);
        touch(dir.path(), "app.3.log", 10, 60);

        // count keeps 3 and 2, age keeps only 3
        let retention = Retention::count(2).with_age(Duration::from_secs(86_400));
        let plan = retention.plan(dir.path(), "app.*.log*").unwrap();
        let doomed: Vec<PathBuf> = plan.iter().filter(|f| f.delete).map(|f| f.path.clone()).collect();
        assert_eq!(names(&doomed), vec!["app.1.log", "app.2.log"]);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            touch(dir.path(), &format!("app.{}.log", i), 10, 100 * (5 - i as u64));
        }
        let retention = Retention::count(3);
        assert_eq!(retention.clean(dir.path(), "app.*.log*").len(), 2);
        assert!(retention.clean(dir.path(), "app.*.log*").is_empty());
    }

    #[test]
    fn test_missing_directory_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(Retention::count(1).clean(&missing, "*").is_empty());
        assert!(Retention::count(1).plan(&missing, "*").is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("3".parse::<Retention>().unwrap(), Retention::count(3));
        assert_eq!(
            "10 days".parse::<Retention>().unwrap(),
            Retention::age(Duration::from_secs(864_000))
        );
        assert!("forever".parse::<Retention>().is_err());
    }
}

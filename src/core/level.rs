//! Log level definitions
//!
//! Levels are data, not an enum: every logger owns a [`LevelRegistry`] seeded
//! with the built-in table and extended at runtime with [`LevelRegistry::add`].

use super::error::{LoggerError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A named severity with its presentation attributes
///
/// Levels are compared by their numeric severity (`no`) only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub no: u32,
    pub color: String,
    pub icon: String,
}

impl Level {
    pub fn new(
        name: impl Into<String>,
        no: u32,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            no,
            color: color.into(),
            icon: icon.into(),
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        colored::Color::from(self.color.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub const TRACE: u32 = 5;
pub const DEBUG: u32 = 10;
pub const INFO: u32 = 20;
pub const SUCCESS: u32 = 25;
pub const WARNING: u32 = 30;
pub const ERROR: u32 = 40;
pub const CRITICAL: u32 = 50;

fn builtin_levels() -> Vec<Arc<Level>> {
    [
        ("TRACE", TRACE, "cyan", "\u{270f}\u{fe0f}"),
        ("DEBUG", DEBUG, "blue", "\u{1f41e}"),
        ("INFO", INFO, "white", "\u{2139}\u{fe0f}"),
        ("SUCCESS", SUCCESS, "green", "\u{2705}"),
        ("WARNING", WARNING, "yellow", "\u{26a0}\u{fe0f}"),
        ("ERROR", ERROR, "red", "\u{274c}"),
        ("CRITICAL", CRITICAL, "bright red", "\u{2620}\u{fe0f}"),
    ]
    .into_iter()
    .map(|(name, no, color, icon)| Arc::new(Level::new(name, no, color, icon)))
    .collect()
}

/// Either a level name or a raw severity number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    Name(String),
    Number(i64),
}

impl fmt::Display for LevelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSpec::Name(name) => write!(f, "{}", name),
            LevelSpec::Number(no) => write!(f, "{}", no),
        }
    }
}

impl From<&str> for LevelSpec {
    fn from(name: &str) -> Self {
        LevelSpec::Name(name.to_string())
    }
}

impl From<String> for LevelSpec {
    fn from(name: String) -> Self {
        LevelSpec::Name(name)
    }
}

impl From<&String> for LevelSpec {
    fn from(name: &String) -> Self {
        LevelSpec::Name(name.clone())
    }
}

impl From<i32> for LevelSpec {
    fn from(no: i32) -> Self {
        LevelSpec::Number(i64::from(no))
    }
}

impl From<u32> for LevelSpec {
    fn from(no: u32) -> Self {
        LevelSpec::Number(i64::from(no))
    }
}

impl From<i64> for LevelSpec {
    fn from(no: i64) -> Self {
        LevelSpec::Number(no)
    }
}

impl From<&Level> for LevelSpec {
    fn from(level: &Level) -> Self {
        LevelSpec::Name(level.name.clone())
    }
}

/// Registered levels of one logger
#[derive(Debug)]
pub struct LevelRegistry {
    levels: RwLock<Vec<Arc<Level>>>,
}

impl LevelRegistry {
    pub fn new() -> Self {
        Self {
            levels: RwLock::new(builtin_levels()),
        }
    }

    /// Insert a level, replacing any existing level with the same name
    pub fn add(
        &self,
        name: &str,
        no: u32,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<Arc<Level>> {
        if name.trim().is_empty() {
            return Err(LoggerError::config("level", "level name must not be empty"));
        }

        let level = Arc::new(Level::new(name, no, color, icon));
        let mut levels = self.levels.write();
        match levels.iter_mut().find(|l| l.name == name) {
            Some(slot) => *slot = Arc::clone(&level),
            None => levels.push(Arc::clone(&level)),
        }
        Ok(level)
    }

    /// Look up a level by name, exact match first, then ignoring case
    pub fn get(&self, name: &str) -> Option<Arc<Level>> {
        let levels = self.levels.read();
        levels
            .iter()
            .find(|l| l.name == name)
            .or_else(|| levels.iter().find(|l| l.name.eq_ignore_ascii_case(name)))
            .cloned()
    }

    /// Look up the first registered level with this severity
    pub fn by_number(&self, no: u32) -> Option<Arc<Level>> {
        self.levels.read().iter().find(|l| l.no == no).cloned()
    }

    /// Resolve a name or number into a registered level
    pub fn resolve(&self, spec: &LevelSpec) -> Result<Arc<Level>> {
        match spec {
            LevelSpec::Name(name) => self.get(name),
            LevelSpec::Number(no) => u32::try_from(*no).ok().and_then(|no| self.by_number(no)),
        }
        .ok_or_else(|| LoggerError::invalid_level(spec))
    }

    /// Resolve a handler threshold
    ///
    /// Names must be registered; any non-negative number is accepted as-is.
    pub fn threshold(&self, spec: &LevelSpec) -> Result<u32> {
        match spec {
            LevelSpec::Name(_) => self.resolve(spec).map(|level| level.no),
            LevelSpec::Number(no) => u32::try_from(*no).map_err(|_| LoggerError::invalid_level(spec)),
        }
    }

    /// Snapshot of every registered level, ordered by severity
    pub fn all(&self) -> Vec<Arc<Level>> {
        let mut levels = self.levels.read().clone();
        levels.sort_by_key(|l| l.no);
        levels
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let registry = LevelRegistry::new();
        let expected = [
            ("TRACE", 5),
            ("DEBUG", 10),
            ("INFO", 20),
            ("SUCCESS", 25),
            ("WARNING", 30),
            ("ERROR", 40),
            ("CRITICAL", 50),
        ];
        for (name, no) in expected {
            assert_eq!(registry.get(name).unwrap().no, no);
        }

        let numbers: Vec<u32> = registry.all().iter().map(|l| l.no).collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        assert_eq!(numbers, sorted);
    }

    #[test]
    fn test_resolve_by_name_and_number() {
        let registry = LevelRegistry::new();
        assert_eq!(registry.resolve(&"WARNING".into()).unwrap().no, 30);
        assert_eq!(registry.resolve(&"warning".into()).unwrap().name, "WARNING");
        assert_eq!(registry.resolve(&40.into()).unwrap().name, "ERROR");
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = LevelRegistry::new();
        assert!(matches!(
            registry.resolve(&"NOT_A_LEVEL".into()),
            Err(LoggerError::InvalidLevel(_))
        ));
        assert!(matches!(
            registry.resolve(&999_999.into()),
            Err(LoggerError::InvalidLevel(_))
        ));
        assert!(matches!(
            registry.resolve(&(-1).into()),
            Err(LoggerError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_add_and_override() {
        let registry = LevelRegistry::new();
        let notice = registry.add("NOTICE", 35, "magenta", "!").unwrap();
        assert_eq!(notice.no, 35);
        assert_eq!(registry.resolve(&35.into()).unwrap().name, "NOTICE");

        registry.add("INFO", 21, "white", "i").unwrap();
        assert_eq!(registry.get("INFO").unwrap().no, 21);
        assert_eq!(registry.all().iter().filter(|l| l.name == "INFO").count(), 1);
    }

    #[test]
    fn test_add_rejects_empty_name() {
        let registry = LevelRegistry::new();
        assert!(registry.add("  ", 1, "white", "").is_err());
    }

    #[test]
    fn test_threshold_accepts_unregistered_number() {
        let registry = LevelRegistry::new();
        assert_eq!(registry.threshold(&15.into()).unwrap(), 15);
        assert_eq!(registry.threshold(&"ERROR".into()).unwrap(), 40);
        assert!(registry.threshold(&(-5).into()).is_err());
        assert!(registry.threshold(&"LOUD".into()).is_err());
    }

    #[test]
    fn test_display() {
        let registry = LevelRegistry::new();
        assert_eq!(registry.get("SUCCESS").unwrap().to_string(), "SUCCESS");
        assert_eq!(LevelSpec::from(12).to_string(), "12");
    }
}

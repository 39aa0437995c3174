//! Overflow strategies for async handler queues
//!
//! When an async handler's bounded queue is full, the strategy decides what
//! the emitting thread does with the new record.

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policy for handling a full async queue
///
/// # Example
///
/// ```
/// use sinklog::OverflowStrategy;
///
/// let strategy: OverflowStrategy = "drop".parse().unwrap();
/// assert_eq!(strategy, OverflowStrategy::Drop);
/// assert_eq!(OverflowStrategy::default(), OverflowStrategy::Block);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowStrategy {
    /// Wait until the worker frees a slot
    ///
    /// Warning: This can cause backpressure in the application.
    #[default]
    Block,

    /// Discard the new record and count it as dropped
    Drop,

    /// Refuse the record with `LoggerError::QueueFull`
    Raise,
}

impl fmt::Display for OverflowStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowStrategy::Block => write!(f, "block"),
            OverflowStrategy::Drop => write!(f, "drop"),
            OverflowStrategy::Raise => write!(f, "raise"),
        }
    }
}

impl FromStr for OverflowStrategy {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(OverflowStrategy::Block),
            "drop" => Ok(OverflowStrategy::Drop),
            "raise" => Ok(OverflowStrategy::Raise),
            _ => Err(LoggerError::config(
                "overflow_strategy",
                format!("expected block, drop or raise, got '{}'", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_strategy_default() {
        assert_eq!(OverflowStrategy::default(), OverflowStrategy::Block);
    }

    #[test]
    fn test_overflow_strategy_display_and_parse() {
        for strategy in [
            OverflowStrategy::Block,
            OverflowStrategy::Drop,
            OverflowStrategy::Raise,
        ] {
            assert_eq!(strategy.to_string().parse::<OverflowStrategy>().unwrap(), strategy);
        }
        assert_eq!("RAISE".parse::<OverflowStrategy>().unwrap(), OverflowStrategy::Raise);
        assert!("spill".parse::<OverflowStrategy>().is_err());
    }

    #[test]
    fn test_overflow_strategy_serde() {
        let json = serde_json::to_string(&OverflowStrategy::Drop).unwrap();
        assert_eq!(json, "\"drop\"");
        let parsed: OverflowStrategy = serde_json::from_str("\"raise\"").unwrap();
        assert_eq!(parsed, OverflowStrategy::Raise);
    }
}

//! Size and duration grammar shared by rotation and retention settings
//!
//! Sizes: a bare integer is a byte count; otherwise `<number><unit>` with an
//! optional space, units `B`, `K`/`KB`, `M`/`MB`, `G`/`GB`, `T`/`TB` (powers of
//! 1024, case-insensitive).
//!
//! Durations: one or more `<number> <unit>` pairs added left to right, e.g.
//! `"1 day 2 hours"` or `"90s"`.

use super::error::{LoggerError, Result};
use std::time::Duration;

const KIB: f64 = 1024.0;

/// Parse a size such as `"10 MB"`, `"512k"` or `"4096"` into bytes
pub fn parse_size(input: &str) -> Result<u64> {
    let text = input.trim();
    if let Ok(bytes) = text.parse::<u64>() {
        return Ok(bytes);
    }

    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let number: f64 = number
        .parse()
        .map_err(|_| LoggerError::config("size", format!("invalid size '{}'", input)))?;

    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "b" => 1.0,
        "k" | "kb" | "kib" => KIB,
        "m" | "mb" | "mib" => KIB * KIB,
        "g" | "gb" | "gib" => KIB * KIB * KIB,
        "t" | "tb" | "tib" => KIB * KIB * KIB * KIB,
        other => {
            return Err(LoggerError::config(
                "size",
                format!("unknown size unit '{}' in '{}'", other, input),
            ))
        }
    };

    Ok((number * multiplier).round() as u64)
}

fn unit_seconds(unit: &str) -> Option<f64> {
    let seconds = match unit {
        "ms" | "msec" | "millisecond" | "milliseconds" => 0.001,
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600.0,
        "d" | "day" | "days" => 86_400.0,
        "w" | "week" | "weeks" => 604_800.0,
        "month" | "months" => 2_592_000.0,
        "y" | "year" | "years" => 31_536_000.0,
        _ => return None,
    };
    Some(seconds)
}

/// Parse a duration such as `"10 days"`, `"1 day 2 hours"` or `"30s"`
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = |why: String| LoggerError::config("duration", why);
    let text = input.trim().to_ascii_lowercase();
    if text.is_empty() {
        return Err(invalid("empty duration".to_string()));
    }

    let mut total = 0.0f64;
    let mut rest = text.as_str();
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_end == 0 {
            return Err(invalid(format!("expected a number in '{}'", input)));
        }
        let number: f64 = rest[..number_end]
            .parse()
            .map_err(|_| invalid(format!("invalid number in '{}'", input)))?;

        rest = rest[number_end..].trim_start();
        let unit_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        let seconds = unit_seconds(unit)
            .ok_or_else(|| invalid(format!("unknown duration unit '{}' in '{}'", unit, input)))?;

        total += number * seconds;
        rest = rest[unit_end..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }

    Duration::try_from_secs_f64(total)
        .map_err(|_| invalid(format!("duration '{}' out of range", input)))
}

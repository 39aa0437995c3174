//! Rotation policies deciding when a file handler starts a new file
//!
//! A policy is consulted with the active file's path and the record about to
//! be written. Size policies stat the file; time policies compare the record's
//! timestamp against a lazily computed deadline.

use crate::core::error::{LoggerError, Result};
use crate::core::record::Record;
use crate::core::units::{parse_duration, parse_size};
use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// When a time-based rotation fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Fixed interval measured from the previous rotation
    Interval(Duration),
    /// Every midnight
    Daily,
    /// Monday at midnight
    Weekly,
    /// First day of the month at midnight
    Monthly,
    /// Every day at a wall-clock time
    At(NaiveTime),
    /// A given weekday at midnight
    Weekday(Weekday),
}

impl Schedule {
    /// First deadline strictly after `now`
    pub fn next_after(&self, now: DateTime<Local>) -> DateTime<Local> {
        let today = now.date_naive();
        let candidate = match self {
            Schedule::Interval(interval) => {
                // intervals past a century, or past chrono's range, wait a century
                let century = chrono::Duration::days(36_500);
                let step = chrono::Duration::from_std(*interval)
                    .ok()
                    .filter(|step| *step <= century)
                    .unwrap_or(century);
                return now
                    .checked_add_signed(step)
                    .unwrap_or_else(|| now + chrono::Duration::days(1));
            }
            Schedule::Daily => midnight(today.checked_add_days(Days::new(1))),
            Schedule::At(time) => {
                let same_day = local(today.and_time(*time));
                match same_day {
                    Some(deadline) if deadline > now => return deadline,
                    _ => today
                        .checked_add_days(Days::new(1))
                        .map(|tomorrow| tomorrow.and_time(*time)),
                }
            }
            Schedule::Weekly => midnight(next_weekday(today, Weekday::Mon)),
            Schedule::Weekday(weekday) => midnight(next_weekday(today, *weekday)),
            Schedule::Monthly => midnight(
                today
                    .with_day(1)
                    .and_then(|first| first.checked_add_months(Months::new(1))),
            ),
        };

        candidate
            .and_then(local)
            .filter(|deadline| *deadline > now)
            .unwrap_or_else(|| now + chrono::Duration::days(1))
    }
}

fn midnight(date: Option<NaiveDate>) -> Option<NaiveDateTime> {
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    naive
        .and_local_timezone(Local)
        .earliest()
        // a wall-clock time skipped by a DST jump: take the next hour
        .or_else(|| (naive + chrono::Duration::hours(1)).and_local_timezone(Local).earliest())
}

/// Next occurrence of `weekday` after `today`, never today itself
fn next_weekday(today: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let current = today.weekday().num_days_from_monday();
    let target = weekday.num_days_from_monday();
    let days = match (7 + target - current) % 7 {
        0 => 7,
        n => n,
    };
    today.checked_add_days(Days::new(u64::from(days)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRotation {
    schedule: Schedule,
    next_deadline: Option<DateTime<Local>>,
}

impl TimeRotation {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            next_deadline: None,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
}

/// Rotation policy of a file handler
///
/// # Examples
///
/// ```
/// use sinklog::lifecycle::Rotation;
///
/// let by_size: Rotation = "10 MB".parse().unwrap();
/// let nightly: Rotation = "daily".parse().unwrap();
/// let lunch: Rotation = "12:30".parse().unwrap();
/// let hourly: Rotation = "1 hour".parse().unwrap();
/// assert!("25:00".parse::<Rotation>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// Rotate once the file holds at least `max_bytes`
    Size { max_bytes: u64 },
    Time(TimeRotation),
}

impl Rotation {
    pub fn size(max_bytes: u64) -> Result<Self> {
        if max_bytes == 0 {
            return Err(LoggerError::config("rotation", "size must be greater than zero"));
        }
        Ok(Rotation::Size { max_bytes })
    }

    pub fn interval(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(LoggerError::config("rotation", "interval must be greater than zero"));
        }
        Ok(Self::schedule(Schedule::Interval(interval)))
    }

    pub fn daily() -> Self {
        Self::schedule(Schedule::Daily)
    }

    pub fn weekly() -> Self {
        Self::schedule(Schedule::Weekly)
    }

    pub fn monthly() -> Self {
        Self::schedule(Schedule::Monthly)
    }

    /// Every day at `hour:minute`
    pub fn at(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 {
            return Err(LoggerError::config("rotation", format!("hour must be 0-23, got {}", hour)));
        }
        if minute > 59 {
            return Err(LoggerError::config(
                "rotation",
                format!("minute must be 0-59, got {}", minute),
            ));
        }
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|time| Self::schedule(Schedule::At(time)))
            .ok_or_else(|| LoggerError::config("rotation", "invalid time of day"))
    }

    /// Every `weekday` at midnight
    pub fn on(weekday: Weekday) -> Self {
        Self::schedule(Schedule::Weekday(weekday))
    }

    fn schedule(schedule: Schedule) -> Self {
        Rotation::Time(TimeRotation::new(schedule))
    }

    /// Parse a size (`"10 MB"`, `"1024"`) or a schedule
    ///
    /// Sizes are tried first, so `"5 m"` means five mebibytes; spell minutes
    /// as `min` or `minutes`.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim().to_ascii_lowercase();
        if let Ok(max_bytes) = parse_size(&text) {
            return Self::size(max_bytes);
        }

        match text.as_str() {
            "daily" => return Ok(Self::daily()),
            "weekly" => return Ok(Self::weekly()),
            "monthly" => return Ok(Self::monthly()),
            _ => {}
        }

        if let Some(weekday) = parse_weekday(&text) {
            return Ok(Self::on(weekday));
        }

        if let Some((hour, minute)) = text.split_once(':') {
            let parse = |part: &str| part.trim().parse::<u32>().ok();
            return match (parse(hour), parse(minute)) {
                (Some(hour), Some(minute)) => Self::at(hour, minute),
                _ => Err(LoggerError::config(
                    "rotation",
                    format!("invalid time of day '{}', expected HH:MM", input),
                )),
            };
        }

        match parse_duration(&text) {
            Ok(interval) => Self::interval(interval),
            Err(_) => Err(LoggerError::config(
                "rotation",
                format!(
                    "invalid rotation '{}': expected a size, 'daily', 'weekly', 'monthly', \
                     a weekday name, HH:MM or a duration",
                    input
                ),
            )),
        }
    }

    /// Whether the file must be rotated before `record` is written
    pub fn should_rotate(&mut self, path: &Path, record: &Record) -> bool {
        match self {
            Rotation::Size { max_bytes } => fs::metadata(path)
                .map(|meta| meta.len() >= *max_bytes)
                .unwrap_or(false),
            Rotation::Time(time) => match time.next_deadline {
                None => {
                    time.next_deadline = Some(time.schedule.next_after(record.time));
                    false
                }
                Some(deadline) => record.time >= deadline,
            },
        }
    }

    /// Restart the schedule after a rotation performed at `now`
    pub fn reset(&mut self, now: DateTime<Local>) {
        if let Rotation::Time(time) = self {
            time.next_deadline = Some(time.schedule.next_after(now));
        }
    }

    pub fn next_deadline(&self) -> Option<DateTime<Local>> {
        match self {
            Rotation::Size { .. } => None,
            Rotation::Time(time) => time.next_deadline,
        }
    }
}

fn parse_weekday(text: &str) -> Option<Weekday> {
    let weekday = match text {
        "monday" => Weekday::Mon,
        "tuesday" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" => Weekday::Thu,
        "friday" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

impl FromStr for Rotation {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Rotation::parse(s)
    }
}

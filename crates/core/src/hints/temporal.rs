//! Date, datetime and duration hints

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ValueGenerator;

const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_WEEK: f64 = 604_800.0;

/// Calendar dates between two bounds (`YYYY-MM-DD`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateParams {
    pub min: String,
    pub max: String,
}

impl DateParams {
    pub fn check(&self) -> Result<(), String> {
        let min = parse_date(&self.min).ok_or_else(|| format!("invalid date '{}'", self.min))?;
        let max = parse_date(&self.max).ok_or_else(|| format!("invalid date '{}'", self.max))?;
        if min > max {
            return Err(format!("min {} is after max {}", self.min, self.max));
        }
        Ok(())
    }
}

impl ValueGenerator for DateParams {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        let (Some(min), Some(max)) = (parse_date(&self.min), parse_date(&self.max)) else {
            return Value::Null;
        };
        let span = (max - min).num_days();
        let offset = if span > 0 { rng.gen_range(0..=span) } else { 0 };
        let date = min + chrono::Duration::days(offset);
        Value::String(date.format("%Y-%m-%d").to_string())
    }
}

/// Textual layout of generated timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateTimeFormat {
    /// ISO 8601 with `Z` or a fixed offset
    Iso,
    /// ISO 8601 without a zone designator
    IsoLocal,
    /// `%Y-%m-%d %H:%M:%S`
    Space,
    /// `%m/%d/%Y %H:%M:%S`
    Us,
    /// Seconds since the unix epoch
    UnixSeconds,
    /// Milliseconds since the unix epoch
    UnixMillis,
}

/// Timestamps between two bounds
///
/// Bounds are RFC 3339 in UTC. `offset` (seconds east of UTC) applies to the
/// ISO format; without it ISO output ends in `Z`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTimeParams {
    pub min: String,
    pub max: String,
    pub format: DateTimeFormat,

    /// Fractional-second digits on ISO output
    #[serde(default, skip_serializing_if = "is_zero")]
    pub frac: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i32>,

    /// Epoch formats emit JSON numbers instead of strings
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub numeric: bool,
}

impl DateTimeParams {
    pub fn check(&self) -> Result<(), String> {
        let min = parse_utc(&self.min).ok_or_else(|| format!("invalid timestamp '{}'", self.min))?;
        let max = parse_utc(&self.max).ok_or_else(|| format!("invalid timestamp '{}'", self.max))?;
        if min > max {
            return Err(format!("min {} is after max {}", self.min, self.max));
        }
        if self.frac > 9 {
            return Err(format!("frac {} exceeds 9 digits", self.frac));
        }
        if let Some(offset) = self.offset {
            if FixedOffset::east_opt(offset).is_none() {
                return Err(format!("offset {} out of range", offset));
            }
        }
        Ok(())
    }

    /// Render a timestamp in this hint's format
    pub fn render(&self, dt: DateTime<Utc>) -> Value {
        match self.format {
            DateTimeFormat::Iso => {
                let fraction = fraction_digits(dt.nanosecond(), self.frac);
                let text = match self.offset.and_then(FixedOffset::east_opt) {
                    Some(offset) => {
                        let local = dt.with_timezone(&offset);
                        format!(
                            "{}{}{}",
                            local.format("%Y-%m-%dT%H:%M:%S"),
                            fraction,
                            local.format("%:z")
                        )
                    }
                    None => format!("{}{}Z", dt.format("%Y-%m-%dT%H:%M:%S"), fraction),
                };
                Value::String(text)
            }
            DateTimeFormat::IsoLocal => Value::String(format!(
                "{}{}",
                dt.format("%Y-%m-%dT%H:%M:%S"),
                fraction_digits(dt.nanosecond(), self.frac)
            )),
            DateTimeFormat::Space => Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            DateTimeFormat::Us => Value::String(dt.format("%m/%d/%Y %H:%M:%S").to_string()),
            DateTimeFormat::UnixSeconds => self.epoch(dt.timestamp()),
            DateTimeFormat::UnixMillis => self.epoch(dt.timestamp_millis()),
        }
    }

    fn epoch(&self, value: i64) -> Value {
        if self.numeric {
            Value::from(value)
        } else {
            Value::String(value.to_string())
        }
    }
}

impl ValueGenerator for DateTimeParams {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        let (Some(min), Some(max)) = (parse_utc(&self.min), parse_utc(&self.max)) else {
            return Value::Null;
        };
        let lo = min.timestamp_micros();
        let hi = max.timestamp_micros();
        let micros = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
        match DateTime::<Utc>::from_timestamp_micros(micros) {
            Some(dt) => self.render(dt),
            None => Value::Null,
        }
    }
}

/// Textual layout of generated durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationFormat {
    /// `[D.]HH:MM:SS[.fff]`
    Timespan,
    /// `P<n>D`
    IsoDays,
    /// `P<n>W`
    IsoWeeks,
}

/// Durations between two bounds, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationParams {
    pub format: DurationFormat,
    pub min: f64,
    pub max: f64,

    /// Fractional-second digits on timespan output
    #[serde(default, skip_serializing_if = "is_zero")]
    pub frac: u8,
}

impl DurationParams {
    pub fn check(&self) -> Result<(), String> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min < 0.0 {
            return Err("duration bounds must be finite and non-negative".to_string());
        }
        if self.min > self.max {
            return Err(format!("min {} exceeds max {}", self.min, self.max));
        }
        if self.frac > 9 {
            return Err(format!("frac {} exceeds 9 digits", self.frac));
        }
        Ok(())
    }

    /// Render a duration in seconds in this hint's format
    pub fn render(&self, seconds: f64) -> String {
        match self.format {
            DurationFormat::Timespan => {
                let scale = 10u64.pow(self.frac as u32);
                let ticks = (seconds.max(0.0) * scale as f64).round() as u64;
                let whole = ticks / scale;
                let days = whole / 86_400;
                let hours = (whole % 86_400) / 3_600;
                let minutes = (whole % 3_600) / 60;
                let secs = whole % 60;
                let mut text = if days > 0 {
                    format!("{}.{:02}:{:02}:{:02}", days, hours, minutes, secs)
                } else {
                    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
                };
                if self.frac > 0 {
                    text.push_str(&format!(
                        ".{:0width$}",
                        ticks % scale,
                        width = self.frac as usize
                    ));
                }
                text
            }
            DurationFormat::IsoDays => format!("P{}D", (seconds / SECONDS_PER_DAY).round() as u64),
            DurationFormat::IsoWeeks => {
                format!("P{}W", (seconds / SECONDS_PER_WEEK).round() as u64)
            }
        }
    }
}

impl ValueGenerator for DurationParams {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        let seconds = if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        };
        Value::String(self.render(seconds))
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn fraction_digits(nanos: u32, digits: u8) -> String {
    if digits == 0 {
        return String::new();
    }
    let padded = format!("{:09}", nanos.min(999_999_999));
    format!(".{}", &padded[..digits.min(9) as usize])
}

fn is_zero(value: &u8) -> bool {
    *value == 0
}

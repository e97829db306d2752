//! Date, datetime and duration detection

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::formats::confidence_for;
use super::{AnalysisResult, Analyzer, AnalyzerKind};
use crate::extract::Scalar;
use crate::hints::{
    DateParams, DateTimeFormat, DateTimeParams, DurationFormat, DurationParams, Hint,
};

/// 2000-01-01T00:00:00Z
const EPOCH_MIN_SECONDS: i64 = 946_684_800;
/// 2100-01-01T00:00:00Z
const EPOCH_MAX_SECONDS: i64 = 4_102_444_800;

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static ISO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.(\d+))?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

static SPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").unwrap());

static US_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}$").unwrap());

static UNIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{10}|\d{13})$").unwrap());

static TIMESPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)\.)?(\d{1,2}):(\d{2}):(\d{2})(?:\.(\d+))?$").unwrap()
});

static ISO_DAYS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^P(\d+)D$").unwrap());

static ISO_WEEKS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^P(\d+)W$").unwrap());

/// Dates, timestamps and durations
pub struct TemporalAnalyzer {
    numeric_epochs: bool,
}

impl TemporalAnalyzer {
    pub fn new(numeric_epochs: bool) -> Self {
        Self { numeric_epochs }
    }

    fn detect_strings(&self, strings: &[&str]) -> Option<Hint> {
        detect_dates(strings)
            .or_else(|| detect_iso(strings))
            .or_else(|| detect_pattern(strings, &SPACE_REGEX, "%Y-%m-%d %H:%M:%S", DateTimeFormat::Space))
            .or_else(|| detect_pattern(strings, &US_REGEX, "%m/%d/%Y %H:%M:%S", DateTimeFormat::Us))
            .or_else(|| detect_epochs(strings, false))
            .or_else(|| detect_durations(strings))
    }
}

impl Analyzer for TemporalAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Temporal
    }

    fn analyze(&self, values: &[Scalar]) -> Option<AnalysisResult> {
        if values.is_empty() {
            return None;
        }
        if values.iter().all(|v| matches!(v, Scalar::Int(_))) {
            if !self.numeric_epochs {
                return None;
            }
            let rendered: Vec<String> = values.iter().map(Scalar::render).collect();
            let strings: Vec<&str> = rendered.iter().map(String::as_str).collect();
            let hint = detect_epochs(&strings, true)?;
            return Some(AnalysisResult::new(self.kind(), hint, confidence_for(&strings)));
        }
        let strings: Vec<&str> = values.iter().map(Scalar::as_str).collect::<Option<_>>()?;
        let hint = self.detect_strings(&strings)?;
        Some(AnalysisResult::new(self.kind(), hint, confidence_for(&strings)))
    }
}

fn detect_dates(strings: &[&str]) -> Option<Hint> {
    let mut dates = Vec::with_capacity(strings.len());
    for s in strings {
        if !DATE_REGEX.is_match(s) {
            return None;
        }
        dates.push(NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?);
    }
    let min = dates.iter().min()?;
    let max = dates.iter().max()?;
    Some(Hint::Date(DateParams {
        min: min.format("%Y-%m-%d").to_string(),
        max: max.format("%Y-%m-%d").to_string(),
    }))
}

fn detect_iso(strings: &[&str]) -> Option<Hint> {
    let mut stamps = Vec::with_capacity(strings.len());
    let mut frac = 0usize;
    let mut zoned = None;
    for s in strings {
        let captures = ISO_REGEX.captures(s)?;
        if let Some(digits) = captures.get(1) {
            frac = frac.max(digits.as_str().len());
        }
        let has_zone = captures.get(2).is_some();
        if *zoned.get_or_insert(has_zone) != has_zone {
            return None;
        }
        let stamp = if has_zone {
            DateTime::parse_from_rfc3339(s).ok()?
        } else {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()?
                .and_utc()
                .fixed_offset()
        };
        stamps.push(stamp);
    }

    let zoned = zoned?;
    let offset = if zoned {
        stamps
            .iter()
            .zip(strings)
            .find(|(_, s)| !s.ends_with('Z'))
            .map(|(stamp, _)| stamp.offset().local_minus_utc())
    } else {
        None
    };
    let utc: Vec<DateTime<Utc>> = stamps.iter().map(|s| s.with_timezone(&Utc)).collect();
    Some(datetime_hint(
        &utc,
        if zoned {
            DateTimeFormat::Iso
        } else {
            DateTimeFormat::IsoLocal
        },
        frac.min(9) as u8,
        offset,
        false,
    ))
}

fn detect_pattern(
    strings: &[&str],
    regex: &Regex,
    layout: &str,
    format: DateTimeFormat,
) -> Option<Hint> {
    let mut stamps = Vec::with_capacity(strings.len());
    for s in strings {
        if !regex.is_match(s) {
            return None;
        }
        stamps.push(NaiveDateTime::parse_from_str(s, layout).ok()?.and_utc());
    }
    Some(datetime_hint(&stamps, format, 0, None, false))
}

/// Unix timestamps in seconds (10 digits) or milliseconds (13 digits)
/// between 2000 and 2100
fn detect_epochs(strings: &[&str], numeric: bool) -> Option<Hint> {
    let millis = strings.first()?.len() == 13;
    let mut stamps = Vec::with_capacity(strings.len());
    for s in strings {
        if !UNIX_REGEX.is_match(s) || (s.len() == 13) != millis {
            return None;
        }
        let raw: i64 = s.parse().ok()?;
        let seconds = if millis { raw / 1_000 } else { raw };
        if !(EPOCH_MIN_SECONDS..=EPOCH_MAX_SECONDS).contains(&seconds) {
            return None;
        }
        let stamp = if millis {
            DateTime::<Utc>::from_timestamp_millis(raw)?
        } else {
            DateTime::<Utc>::from_timestamp(raw, 0)?
        };
        stamps.push(stamp);
    }
    let format = if millis {
        DateTimeFormat::UnixMillis
    } else {
        DateTimeFormat::UnixSeconds
    };
    Some(datetime_hint(&stamps, format, 0, None, numeric))
}

fn datetime_hint(
    stamps: &[DateTime<Utc>],
    format: DateTimeFormat,
    frac: u8,
    offset: Option<i32>,
    numeric: bool,
) -> Hint {
    let min = stamps.iter().min().copied().unwrap_or_default();
    let max = stamps.iter().max().copied().unwrap_or_default();
    Hint::DateTime(DateTimeParams {
        min: min.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        max: max.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        format,
        frac,
        offset,
        numeric,
    })
}

fn detect_durations(strings: &[&str]) -> Option<Hint> {
    let (format, parse): (DurationFormat, fn(&str) -> Option<(f64, usize)>) =
        if TIMESPAN_REGEX.is_match(strings.first()?) {
            (DurationFormat::Timespan, parse_timespan)
        } else if ISO_DAYS_REGEX.is_match(strings.first()?) {
            (DurationFormat::IsoDays, parse_iso_days)
        } else if ISO_WEEKS_REGEX.is_match(strings.first()?) {
            (DurationFormat::IsoWeeks, parse_iso_weeks)
        } else {
            return None;
        };

    let mut min = f64::MAX;
    let mut max = f64::MIN;
    let mut frac = 0usize;
    for s in strings {
        let (seconds, digits) = parse(s)?;
        min = min.min(seconds);
        max = max.max(seconds);
        frac = frac.max(digits);
    }
    Some(Hint::Duration(DurationParams {
        format,
        min,
        max,
        frac: frac.min(9) as u8,
    }))
}

/// Seconds and fractional digits of a `[D.]HH:MM:SS[.fff]` timespan
fn parse_timespan(s: &str) -> Option<(f64, usize)> {
    let captures = TIMESPAN_REGEX.captures(s)?;
    let number = |i: usize| -> Option<f64> {
        match captures.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0.0),
        }
    };
    let (days, hours, minutes, seconds) = (number(1)?, number(2)?, number(3)?, number(4)?);
    if hours >= 24.0 || minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }
    let (fraction, digits) = match captures.get(5) {
        Some(m) => (format!("0.{}", m.as_str()).parse().ok()?, m.as_str().len()),
        None => (0.0, 0),
    };
    let total = days * 86_400.0 + hours * 3_600.0 + minutes * 60.0 + seconds + fraction;
    Some((total, digits))
}

fn parse_iso_days(s: &str) -> Option<(f64, usize)> {
    let days: f64 = ISO_DAYS_REGEX.captures(s)?.get(1)?.as_str().parse().ok()?;
    Some((days * 86_400.0, 0))
}

fn parse_iso_weeks(s: &str) -> Option<(f64, usize)> {
    let weeks: f64 = ISO_WEEKS_REGEX.captures(s)?.get(1)?.as_str().parse().ok()?;
    Some((weeks * 604_800.0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<Scalar> {
        values.iter().map(|s| Scalar::Str(s.to_string())).collect()
    }

    fn analyze(values: &[&str]) -> Option<Hint> {
        TemporalAnalyzer::new(false)
            .analyze(&strings(values))
            .map(|r| r.hint)
    }

    #[test]
    fn test_dates() {
        let hint = analyze(&["2024-01-15", "2023-12-01", "2024-03-31"]).unwrap();
        assert_eq!(
            hint,
            Hint::Date(DateParams {
                min: "2023-12-01".to_string(),
                max: "2024-03-31".to_string(),
            })
        );
        assert!(analyze(&["2024-13-45", "2024-01-01"]).is_none());
    }

    #[test]
    fn test_iso_zulu_with_fraction() {
        match analyze(&["2024-01-15T10:30:00.123Z", "2024-01-16T08:00:00Z"]).unwrap() {
            Hint::DateTime(params) => {
                assert_eq!(params.format, DateTimeFormat::Iso);
                assert_eq!(params.frac, 3);
                assert_eq!(params.offset, None);
                assert_eq!(params.min, "2024-01-15T10:30:00.123Z");
            }
            other => panic!("Expected DATETIME hint, got {:?}", other),
        }
    }

    #[test]
    fn test_iso_offset_preserved() {
        match analyze(&["2024-01-15T10:30:00+02:00", "2024-01-16T10:30:00+02:00"]).unwrap() {
            Hint::DateTime(params) => {
                assert_eq!(params.offset, Some(7_200));
                assert_eq!(params.min, "2024-01-15T08:30:00Z");
            }
            other => panic!("Expected DATETIME hint, got {:?}", other),
        }
    }

    #[test]
    fn test_iso_local_and_mixed_zones() {
        match analyze(&["2024-01-15T10:30:00", "2024-01-16T11:00:00"]).unwrap() {
            Hint::DateTime(params) => assert_eq!(params.format, DateTimeFormat::IsoLocal),
            other => panic!("Expected DATETIME hint, got {:?}", other),
        }
        assert!(analyze(&["2024-01-15T10:30:00", "2024-01-16T11:00:00Z"]).is_none());
    }

    #[test]
    fn test_space_and_us_layouts() {
        match analyze(&["2024-01-15 10:30:00", "2024-02-01 00:00:00"]).unwrap() {
            Hint::DateTime(params) => assert_eq!(params.format, DateTimeFormat::Space),
            other => panic!("Expected DATETIME hint, got {:?}", other),
        }
        match analyze(&["01/15/2024 10:30:00", "02/01/2024 00:00:00"]).unwrap() {
            Hint::DateTime(params) => assert_eq!(params.format, DateTimeFormat::Us),
            other => panic!("Expected DATETIME hint, got {:?}", other),
        }
    }

    #[test]
    fn test_unix_strings() {
        match analyze(&["1700000000", "1710000000"]).unwrap() {
            Hint::DateTime(params) => {
                assert_eq!(params.format, DateTimeFormat::UnixSeconds);
                assert!(!params.numeric);
            }
            other => panic!("Expected DATETIME hint, got {:?}", other),
        }
        // Out of the plausible epoch window
        assert!(analyze(&["5551234567", "5559876543"]).is_none());
    }

    #[test]
    fn test_numeric_epochs_opt_in() {
        let values = vec![Scalar::Int(1_700_000_000_000), Scalar::Int(1_700_000_500_000)];
        assert!(TemporalAnalyzer::new(false).analyze(&values).is_none());

        let result = TemporalAnalyzer::new(true).analyze(&values).unwrap();
        match result.hint {
            Hint::DateTime(params) => {
                assert_eq!(params.format, DateTimeFormat::UnixMillis);
                assert!(params.numeric);
            }
            other => panic!("Expected DATETIME hint, got {:?}", other),
        }
    }

    #[test]
    fn test_durations() {
        match analyze(&["01:30:00", "1.02:00:00.5", "00:00:10"]).unwrap() {
            Hint::Duration(params) => {
                assert_eq!(params.format, DurationFormat::Timespan);
                assert_eq!(params.min, 10.0);
                assert_eq!(params.max, 93_600.5);
                assert_eq!(params.frac, 1);
            }
            other => panic!("Expected DURATION hint, got {:?}", other),
        }
        match analyze(&["P3D", "P10D"]).unwrap() {
            Hint::Duration(params) => assert_eq!(params.format, DurationFormat::IsoDays),
            other => panic!("Expected DURATION hint, got {:?}", other),
        }
        assert!(analyze(&["P3D", "P2W"]).is_none());
        assert!(analyze(&["12:75:00", "01:00:00"]).is_none());
    }

    #[test]
    fn test_plain_words_decline() {
        assert!(analyze(&["hello", "world"]).is_none());
    }
}

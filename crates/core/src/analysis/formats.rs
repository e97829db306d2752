//! Format detection for string values

use once_cell::sync::Lazy;
use regex::Regex;

use super::{AnalysisResult, Analyzer, AnalyzerKind};
use crate::extract::Scalar;
use crate::hints::{Format, FormatParams, Hint, IntRange, VersionParams};

// Regex patterns for format detection
static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

static MAC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9a-fA-F]{2}:){5}[0-9a-fA-F]{2}$").unwrap());

static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$",
    )
    .unwrap()
});

static IPV6_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}$").unwrap());

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

static URI_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());

static VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0|[1-9]\d*)(\.(0|[1-9]\d*)){2,3}$").unwrap());

/// Detect the format of a string value
///
/// Checks are ordered from most specific to least specific.
pub fn detect_format(value: &str) -> Option<Format> {
    if UUID_REGEX.is_match(value) {
        return Some(Format::Uuid);
    }
    if MAC_REGEX.is_match(value) {
        return Some(Format::MacAddress);
    }
    if IPV4_REGEX.is_match(value) {
        return Some(Format::Ipv4);
    }
    if IPV6_REGEX.is_match(value) {
        return Some(Format::Ipv6);
    }
    if EMAIL_REGEX.is_match(value) {
        return Some(Format::Email);
    }
    if URI_REGEX.is_match(value) {
        return Some(Format::Uri);
    }
    None
}

/// Well-known formats and dotted version strings
pub struct FormatAnalyzer;

impl FormatAnalyzer {
    fn detect_formats(&self, strings: &[&str]) -> Option<Hint> {
        let format = detect_format(strings.first()?)?;
        if strings.iter().skip(1).any(|s| detect_format(s) != Some(format)) {
            return None;
        }
        let hex_cased = matches!(format, Format::Uuid | Format::MacAddress | Format::Ipv6);
        let uppercase = hex_cased
            && strings.iter().any(|s| s.chars().any(|c| c.is_ascii_uppercase()))
            && !strings.iter().any(|s| s.chars().any(|c| c.is_ascii_lowercase()));
        Some(Hint::Format(FormatParams { format, uppercase }))
    }

    fn detect_versions(&self, strings: &[&str]) -> Option<Hint> {
        let mut parts: Vec<IntRange> = Vec::new();
        for s in strings {
            if !VERSION_REGEX.is_match(s) {
                return None;
            }
            let numbers: Vec<i64> = s
                .split('.')
                .map(|p| p.parse().ok())
                .collect::<Option<_>>()?;
            if parts.is_empty() {
                parts = numbers.iter().map(|n| IntRange { min: *n, max: *n }).collect();
            } else if parts.len() != numbers.len() {
                return None;
            } else {
                for (range, n) in parts.iter_mut().zip(numbers) {
                    range.min = range.min.min(n);
                    range.max = range.max.max(n);
                }
            }
        }
        Some(Hint::Version(VersionParams { parts }))
    }
}

impl Analyzer for FormatAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Format
    }

    fn analyze(&self, values: &[Scalar]) -> Option<AnalysisResult> {
        let strings: Vec<&str> = values.iter().map(Scalar::as_str).collect::<Option<_>>()?;
        if strings.is_empty() {
            return None;
        }
        let hint = self
            .detect_formats(&strings)
            .or_else(|| self.detect_versions(&strings))?;
        Some(AnalysisResult::new(
            self.kind(),
            hint,
            confidence_for(&strings),
        ))
    }
}

/// Full confidence unless the population is a single repeated value, which
/// a constant describes better
pub(crate) fn confidence_for(strings: &[&str]) -> f64 {
    let first = strings[0];
    if strings.iter().all(|s| *s == first) {
        0.5
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<Scalar> {
        values.iter().map(|s| Scalar::Str(s.to_string())).collect()
    }

    #[test]
    fn test_detect_uuid() {
        assert_eq!(
            detect_format("550e8400-e29b-41d4-a716-446655440000"),
            Some(Format::Uuid)
        );
        assert_eq!(detect_format("550e8400-e29b-41d4"), None);
    }

    #[test]
    fn test_detect_network_formats() {
        assert_eq!(detect_format("192.168.1.1"), Some(Format::Ipv4));
        assert_eq!(detect_format("00:1A:2b:3C:4d:5E"), Some(Format::MacAddress));
        assert_eq!(
            detect_format("2001:db8:85a3:0:0:8a2e:370:7334"),
            Some(Format::Ipv6)
        );
        assert_eq!(detect_format("256.1.1.1"), None);
    }

    #[test]
    fn test_detect_email_and_uri() {
        assert_eq!(detect_format("test@example.com"), Some(Format::Email));
        assert_eq!(detect_format("https://example.com/path"), Some(Format::Uri));
        assert_eq!(detect_format("not an email"), None);
    }

    #[test]
    fn test_mixed_formats_decline() {
        let analyzer = FormatAnalyzer;
        let values = strings(&["test@example.com", "192.168.1.1"]);
        assert!(analyzer.analyze(&values).is_none());
    }

    #[test]
    fn test_uppercase_uuids() {
        let analyzer = FormatAnalyzer;
        let values = strings(&[
            "550E8400-E29B-41D4-A716-446655440000",
            "6BA7B810-9DAD-11D1-80B4-00C04FD430C8",
        ]);
        let result = analyzer.analyze(&values).unwrap();
        assert_eq!(result.confidence, 1.0);
        assert_eq!(
            result.hint,
            Hint::Format(FormatParams {
                format: Format::Uuid,
                uppercase: true
            })
        );
    }

    #[test]
    fn test_versions() {
        let analyzer = FormatAnalyzer;
        let values = strings(&["1.2.3", "1.4.0", "2.0.11"]);
        let result = analyzer.analyze(&values).unwrap();
        match result.hint {
            Hint::Version(params) => {
                assert_eq!(params.parts[0], IntRange { min: 1, max: 2 });
                assert_eq!(params.parts[1], IntRange { min: 0, max: 4 });
                assert_eq!(params.parts[2], IntRange { min: 0, max: 11 });
            }
            other => panic!("Expected VERSION hint, got {:?}", other),
        }
    }

    #[test]
    fn test_two_part_numbers_are_not_versions() {
        let analyzer = FormatAnalyzer;
        assert!(analyzer.analyze(&strings(&["3.14", "2.71"])).is_none());
        assert!(analyzer.analyze(&strings(&["1.2.3", "1.2.3.4"])).is_none());
    }

    #[test]
    fn test_repeated_value_low_confidence() {
        let analyzer = FormatAnalyzer;
        let values = strings(&["a@b.io", "a@b.io"]);
        assert_eq!(analyzer.analyze(&values).unwrap().confidence, 0.5);
    }
}

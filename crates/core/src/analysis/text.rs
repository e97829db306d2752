//! Free text detection and the fallback hint

use super::{AnalysisResult, Analyzer, AnalyzerKind};
use crate::extract::Scalar;
use crate::hints::{Hint, TextParams};

/// Prose is longer than this many characters
const LONG_TEXT_CHARS: usize = 30;
/// Prose has at least this many spaces
const LONG_TEXT_SPACES: usize = 5;

/// Populations where more than a quarter of the strings are prose
pub struct TextAnalyzer;

impl Analyzer for TextAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Text
    }

    fn analyze(&self, values: &[Scalar]) -> Option<AnalysisResult> {
        let strings: Vec<&str> = values.iter().map(Scalar::as_str).collect::<Option<_>>()?;
        if strings.is_empty() {
            return None;
        }
        let long = strings.iter().filter(|s| is_prose(s)).count();
        if long * 4 <= strings.len() {
            return None;
        }
        let lengths = strings.iter().map(|s| s.chars().count());
        Some(AnalysisResult::new(
            self.kind(),
            Hint::Text(length_range(lengths)),
            0.7,
        ))
    }
}

fn is_prose(s: &str) -> bool {
    s.chars().count() > LONG_TEXT_CHARS && s.matches(' ').count() >= LONG_TEXT_SPACES
}

fn length_range(lengths: impl Iterator<Item = usize>) -> TextParams {
    let (min_len, max_len) = lengths.fold((usize::MAX, 0), |(lo, hi), len| {
        (lo.min(len), hi.max(len))
    });
    TextParams {
        min_len: if min_len == usize::MAX { 0 } else { min_len },
        max_len,
    }
}

/// Hint used when no analyzer accepts a population
///
/// Matches the length range of the values' text renderings.
pub fn fallback_hint(values: &[Scalar]) -> Hint {
    Hint::Text(length_range(
        values.iter().map(|v| v.render().chars().count()),
    ))
}

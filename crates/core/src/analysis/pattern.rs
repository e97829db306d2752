//! Alphanumeric pattern inference
//!
//! Fixed-length identifiers get one character set per position. Strings of
//! varying length that share a prefix or suffix get an affix pattern with
//! a variable middle. Anything containing whitespace is left to the text
//! analyzer.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::{AnalysisResult, Analyzer, AnalyzerKind};
use crate::extract::Scalar;
use crate::hints::{AlphanumericParams, Hint, MiddleParams};

const DIGITS: &str = "0123456789";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// Observed characters of one class widen to the whole class once this many
/// distinct members were seen
const WIDEN_AT: usize = 3;

pub struct PatternAnalyzer {
    min_pattern_values: usize,
}

impl PatternAnalyzer {
    pub fn new(min_pattern_values: usize) -> Self {
        Self { min_pattern_values }
    }
}

impl Analyzer for PatternAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Pattern
    }

    fn analyze(&self, values: &[Scalar]) -> Option<AnalysisResult> {
        let strings: Vec<&str> = values.iter().map(Scalar::as_str).collect::<Option<_>>()?;
        if strings.iter().any(|s| s.is_empty() || s.chars().any(char::is_whitespace)) {
            return None;
        }
        let distinct: HashSet<&str> = strings.iter().copied().collect();
        if distinct.len() < self.min_pattern_values.max(2) {
            return None;
        }

        let chars: Vec<Vec<char>> = strings.iter().map(|s| s.chars().collect()).collect();
        let len = chars[0].len();
        if chars.iter().all(|c| c.len() == len) {
            let params = fixed_length(&chars, len);
            return Some(AnalysisResult::new(
                self.kind(),
                Hint::Alphanumeric(params),
                0.9,
            ));
        }
        let params = affixed(&chars)?;
        Some(AnalysisResult::new(
            self.kind(),
            Hint::Alphanumeric(params),
            0.8,
        ))
    }
}

fn fixed_length(chars: &[Vec<char>], len: usize) -> AlphanumericParams {
    let sets: Vec<BTreeSet<char>> = (0..len)
        .map(|i| chars.iter().map(|c| c[i]).collect())
        .collect();

    let prefix_len = sets.iter().take_while(|s| s.len() == 1).count();
    let suffix_len = if prefix_len == len {
        0
    } else {
        sets.iter().rev().take_while(|s| s.len() == 1).count()
    };
    let constant = |range: std::ops::Range<usize>| -> String {
        range
            .filter_map(|i| sets[i].iter().next().copied())
            .collect()
    };

    let mut chrs: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (position, i) in (prefix_len..len - suffix_len).enumerate() {
        chrs.entry(widen(&sets[i])).or_default().push(position);
    }

    AlphanumericParams {
        prefix: constant(0..prefix_len),
        suffix: constant(len - suffix_len..len),
        chrs,
        middle: None,
    }
}

fn affixed(chars: &[Vec<char>]) -> Option<AlphanumericParams> {
    let first = &chars[0];
    let prefix_len = (0..first.len())
        .take_while(|i| chars.iter().all(|c| c.get(*i) == Some(&first[*i])))
        .count();
    let suffix_len = (0..first.len() - prefix_len)
        .take_while(|i| {
            let expected = first[first.len() - 1 - i];
            chars
                .iter()
                .all(|c| c.len() > prefix_len + i && c[c.len() - 1 - i] == expected)
        })
        .count();
    if prefix_len + suffix_len == 0 {
        return None;
    }

    let middles: Vec<&[char]> = chars
        .iter()
        .map(|c| &c[prefix_len..c.len() - suffix_len])
        .collect();
    let charset: BTreeSet<char> = middles.iter().flat_map(|m| m.iter().copied()).collect();
    if charset.is_empty() {
        return None;
    }

    Some(AlphanumericParams {
        prefix: first[..prefix_len].iter().collect(),
        suffix: first[first.len() - suffix_len..].iter().collect(),
        chrs: BTreeMap::new(),
        middle: Some(MiddleParams {
            charset: widen(&charset),
            min_len: middles.iter().map(|m| m.len()).min().unwrap_or(0),
            max_len: middles.iter().map(|m| m.len()).max().unwrap_or(0),
        }),
    })
}

/// Widen an observed character set to full digit/letter classes
fn widen(observed: &BTreeSet<char>) -> String {
    let mut out: BTreeSet<char> = BTreeSet::new();
    for class in [DIGITS, UPPER, LOWER] {
        let seen = class.chars().filter(|c| observed.contains(c)).count();
        if seen >= WIDEN_AT {
            out.extend(class.chars());
        }
    }
    out.extend(observed.iter().copied());
    out.into_iter().collect()
}

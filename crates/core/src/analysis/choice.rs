//! Categorical and constant populations

use super::stats::round_to;
use super::{AnalysisResult, Analyzer, AnalyzerKind};
use crate::extract::Scalar;
use crate::hints::{ChoiceParams, Hint};

pub struct ChoiceAnalyzer {
    max_choices: usize,
    max_choice_ratio: f64,
}

impl ChoiceAnalyzer {
    pub fn new(max_choices: usize, max_choice_ratio: f64) -> Self {
        Self {
            max_choices,
            max_choice_ratio,
        }
    }
}

impl Analyzer for ChoiceAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Choice
    }

    fn analyze(&self, values: &[Scalar]) -> Option<AnalysisResult> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        // Distinct values in first-seen order
        let mut counts: Vec<(&Scalar, usize)> = Vec::new();
        for value in values {
            match counts.iter_mut().find(|(seen, _)| *seen == value) {
                Some((_, count)) => *count += 1,
                None => {
                    if counts.len() >= self.max_choices.max(1) {
                        return None;
                    }
                    counts.push((value, 1));
                }
            }
        }

        if counts.len() == 1 {
            let hint = Hint::Constant {
                value: counts[0].0.to_value(),
            };
            return Some(AnalysisResult::new(self.kind(), hint, 1.0));
        }

        let all_bool = values.iter().all(|v| matches!(v, Scalar::Bool(_)));
        let distinct = counts.len() as f64;
        if !all_bool && distinct > self.max_choice_ratio * n as f64 {
            return None;
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let params = ChoiceParams {
            choices: counts.iter().map(|(value, _)| value.to_value()).collect(),
            weights: counts
                .iter()
                .map(|(_, count)| round_to(*count as f64 / n as f64, 6))
                .collect(),
        };
        let confidence = if all_bool {
            1.0
        } else {
            1.0 - distinct / n as f64
        };
        Some(AnalysisResult::new(
            self.kind(),
            Hint::Choice(params),
            confidence,
        ))
    }
}

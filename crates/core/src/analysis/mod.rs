//! Sample analysis
//!
//! Analyzers look at the scalar population of one field path and propose a
//! [`Hint`] with a confidence in `[0, 1]`. The builder keeps the proposal
//! with the highest confidence; ties go to the analyzer listed first in
//! [`ANALYZER_PRIORITY`].
//!
//! # Example
//!
//! ```rust
//! use sample_factory_core::analysis::{AnalysisConfig, Analyzers};
//! use sample_factory_core::extract::Scalar;
//!
//! let analyzers = Analyzers::new(&AnalysisConfig::default());
//! let values: Vec<Scalar> = ["red", "red", "blue", "red"]
//!     .iter()
//!     .map(|s| Scalar::Str(s.to_string()))
//!     .collect();
//! let selection = analyzers.select(&values);
//! assert_eq!(selection.hint.kind(), "CHOICE");
//! ```

pub mod choice;
pub mod config;
pub mod error;
pub mod formats;
pub mod number;
pub mod pattern;
pub mod presence;
pub mod shape;
pub mod stats;
pub mod temporal;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::extract::Scalar;
use crate::hints::Hint;

pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::AnalysisError;

/// Identifies an analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyzerKind {
    Format,
    Temporal,
    Pattern,
    Choice,
    Number,
    NumberString,
    Text,
}

/// Tie-break order between equally confident analyzers
pub const ANALYZER_PRIORITY: [AnalyzerKind; 7] = [
    AnalyzerKind::Format,
    AnalyzerKind::Temporal,
    AnalyzerKind::Pattern,
    AnalyzerKind::Choice,
    AnalyzerKind::Number,
    AnalyzerKind::NumberString,
    AnalyzerKind::Text,
];

impl AnalyzerKind {
    /// Position in [`ANALYZER_PRIORITY`]; lower wins ties
    pub fn rank(self) -> usize {
        ANALYZER_PRIORITY
            .iter()
            .position(|k| *k == self)
            .unwrap_or(ANALYZER_PRIORITY.len())
    }
}

impl std::fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzerKind::Format => write!(f, "format"),
            AnalyzerKind::Temporal => write!(f, "temporal"),
            AnalyzerKind::Pattern => write!(f, "pattern"),
            AnalyzerKind::Choice => write!(f, "choice"),
            AnalyzerKind::Number => write!(f, "number"),
            AnalyzerKind::NumberString => write!(f, "number-string"),
            AnalyzerKind::Text => write!(f, "text"),
        }
    }
}

/// One analyzer's proposal for a population
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub kind: AnalyzerKind,
    pub hint: Hint,
    pub confidence: f64,
}

impl AnalysisResult {
    pub fn new(kind: AnalyzerKind, hint: Hint, confidence: f64) -> Self {
        Self {
            kind,
            hint,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Proposes a hint for a population of scalars
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> AnalyzerKind;

    /// `None` when the population does not fit this analyzer
    fn analyze(&self, values: &[Scalar]) -> Option<AnalysisResult>;
}

/// Chosen hint for a population
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub hint: Hint,
    /// `None` when no analyzer accepted and the fallback was used
    pub kind: Option<AnalyzerKind>,
    pub confidence: f64,
    /// Fell back only because the accepting analyzers are disabled
    pub suppressed: bool,
}

impl Selection {
    pub fn is_fallback(&self) -> bool {
        self.kind.is_none()
    }
}

/// Pick the most confident result, breaking ties by priority
pub fn select_best(results: Vec<AnalysisResult>) -> Option<AnalysisResult> {
    const EPSILON: f64 = 1e-9;
    results.into_iter().reduce(|best, candidate| {
        let diff = candidate.confidence - best.confidence;
        if diff > EPSILON || (diff.abs() <= EPSILON && candidate.kind.rank() < best.kind.rank()) {
            candidate
        } else {
            best
        }
    })
}

/// The configured analyzer set
pub struct Analyzers {
    enabled: Vec<Box<dyn Analyzer>>,
    disabled: Vec<Box<dyn Analyzer>>,
}

impl Analyzers {
    /// Standard analyzers, split by the config's disabled list
    pub fn new(config: &AnalysisConfig) -> Self {
        let all: Vec<Box<dyn Analyzer>> = vec![
            Box::new(formats::FormatAnalyzer),
            Box::new(temporal::TemporalAnalyzer::new(config.numeric_epochs)),
            Box::new(pattern::PatternAnalyzer::new(config.min_pattern_values)),
            Box::new(choice::ChoiceAnalyzer::new(
                config.max_choices,
                config.max_choice_ratio,
            )),
            Box::new(number::NumberAnalyzer::new(config.outlier_rate_cap)),
            Box::new(number::NumberStringAnalyzer::new(config.outlier_rate_cap)),
            Box::new(text::TextAnalyzer),
        ];
        let (enabled, disabled): (Vec<_>, Vec<_>) = all
            .into_iter()
            .partition(|analyzer| config.is_enabled(analyzer.kind()));
        Self { enabled, disabled }
    }

    /// Every enabled analyzer's proposal
    pub fn analyze_all(&self, values: &[Scalar]) -> Vec<AnalysisResult> {
        self.enabled
            .iter()
            .filter_map(|analyzer| analyzer.analyze(values))
            .collect()
    }

    /// Best proposal, or the text fallback when none fits
    pub fn select(&self, values: &[Scalar]) -> Selection {
        match select_best(self.analyze_all(values)) {
            Some(result) => Selection {
                hint: result.hint,
                kind: Some(result.kind),
                confidence: result.confidence,
                suppressed: false,
            },
            None => Selection {
                hint: text::fallback_hint(values),
                kind: None,
                confidence: 0.0,
                suppressed: self
                    .disabled
                    .iter()
                    .any(|analyzer| analyzer.analyze(values).is_some()),
            },
        }
    }
}

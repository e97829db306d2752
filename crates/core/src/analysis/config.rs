//! Configuration for sample analysis

use serde::{Deserialize, Serialize};

use super::AnalyzerKind;

/// Configuration for sample analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Maximum number of records to analyze (0 = all)
    pub sample_size: usize,

    /// Records nested deeper than this are skipped
    pub max_depth: usize,

    /// Upper bound on distinct values for a categorical hint
    pub max_choices: usize,

    /// Distinct values must stay at or below this share of the population
    /// for a categorical hint (0.0 - 1.0)
    pub max_choice_ratio: f64,

    /// Minimum distinct values before an alphanumeric pattern is inferred
    pub min_pattern_values: usize,

    /// Longest array that may be modeled positionally
    pub max_fixed_array_len: usize,

    /// Distinct keys an object path needs before it is treated as a
    /// dynamic-key mapping
    pub dynamic_key_min_distinct: usize,

    /// Mean share of objects a key may appear in for a dynamic-key mapping
    /// (0.0 - 1.0)
    pub dynamic_key_max_recurrence: f64,

    /// Cap on the outlier tail rate of numeric hints (0.0 - 1.0)
    pub outlier_rate_cap: f64,

    /// Treat integers in the unix-epoch range as timestamps
    pub numeric_epochs: bool,

    /// Analyzers that are never consulted
    pub disabled_analyzers: Vec<AnalyzerKind>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_size: 0, // All records
            max_depth: 32,
            max_choices: 50,
            max_choice_ratio: 0.5,
            min_pattern_values: 10,
            max_fixed_array_len: 8,
            dynamic_key_min_distinct: 20,
            dynamic_key_max_recurrence: 0.2,
            outlier_rate_cap: 0.05,
            numeric_epochs: false,
            disabled_analyzers: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    pub fn is_enabled(&self, kind: AnalyzerKind) -> bool {
        !self.disabled_analyzers.contains(&kind)
    }
}

/// Builder for AnalysisConfig
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    /// Set the sample size (0 = all records)
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn max_choices(mut self, max: usize) -> Self {
        self.config.max_choices = max;
        self
    }

    pub fn max_choice_ratio(mut self, ratio: f64) -> Self {
        self.config.max_choice_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn min_pattern_values(mut self, min: usize) -> Self {
        self.config.min_pattern_values = min;
        self
    }

    pub fn max_fixed_array_len(mut self, len: usize) -> Self {
        self.config.max_fixed_array_len = len;
        self
    }

    pub fn dynamic_key_min_distinct(mut self, min: usize) -> Self {
        self.config.dynamic_key_min_distinct = min;
        self
    }

    pub fn dynamic_key_max_recurrence(mut self, recurrence: f64) -> Self {
        self.config.dynamic_key_max_recurrence = recurrence.clamp(0.0, 1.0);
        self
    }

    pub fn outlier_rate_cap(mut self, cap: f64) -> Self {
        self.config.outlier_rate_cap = cap.clamp(0.0, 1.0);
        self
    }

    pub fn numeric_epochs(mut self, enabled: bool) -> Self {
        self.config.numeric_epochs = enabled;
        self
    }

    /// Exclude an analyzer from consideration
    pub fn disable(mut self, kind: AnalyzerKind) -> Self {
        if !self.config.disabled_analyzers.contains(&kind) {
            self.config.disabled_analyzers.push(kind);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> AnalysisConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.sample_size, 0);
        assert_eq!(config.max_choices, 50);
        assert_eq!(config.max_depth, 32);
        assert!(config.disabled_analyzers.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = AnalysisConfig::builder()
            .sample_size(1000)
            .max_choices(10)
            .numeric_epochs(true)
            .disable(AnalyzerKind::Text)
            .disable(AnalyzerKind::Text)
            .build();

        assert_eq!(config.sample_size, 1000);
        assert_eq!(config.max_choices, 10);
        assert!(config.numeric_epochs);
        assert_eq!(config.disabled_analyzers, vec![AnalyzerKind::Text]);
        assert!(!config.is_enabled(AnalyzerKind::Text));
        assert!(config.is_enabled(AnalyzerKind::Number));
    }

    #[test]
    fn test_ratio_clamping() {
        let config = AnalysisConfig::builder()
            .max_choice_ratio(1.5) // Should clamp to 1.0
            .outlier_rate_cap(-0.1)
            .build();

        assert_eq!(config.max_choice_ratio, 1.0);
        assert_eq!(config.outlier_rate_cap, 0.0);
    }

    #[test]
    fn test_partial_config_json() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"maxChoices": 5, "disabledAnalyzers": ["text"]}"#).unwrap();
        assert_eq!(config.max_choices, 5);
        assert_eq!(config.max_fixed_array_len, 8);
        assert_eq!(config.disabled_analyzers, vec![AnalyzerKind::Text]);
    }
}

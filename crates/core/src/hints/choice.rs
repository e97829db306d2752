//! Categorical hints

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ValueGenerator;

/// Weighted categorical distribution
///
/// Choices are ordered by descending weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceParams {
    pub choices: Vec<Value>,
    pub weights: Vec<f64>,
}

impl ChoiceParams {
    pub fn check(&self) -> Result<(), String> {
        if self.choices.is_empty() {
            return Err("choices must not be empty".to_string());
        }
        if self.choices.len() != self.weights.len() {
            return Err(format!(
                "{} choices but {} weights",
                self.choices.len(),
                self.weights.len()
            ));
        }
        if self.weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".to_string());
        }
        if self.weights.iter().sum::<f64>() <= 0.0 {
            return Err("weights must not all be zero".to_string());
        }
        Ok(())
    }
}

impl ValueGenerator for ChoiceParams {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        if self.choices.is_empty() {
            return Value::Null;
        }
        let index = match WeightedIndex::new(&self.weights) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..self.choices.len()),
        };
        self.choices.get(index).cloned().unwrap_or(Value::Null)
    }
}

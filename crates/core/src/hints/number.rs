//! Numeric hints

use rand::Rng;
use rand_distr::{Distribution, Exp, Gamma, LogNormal, Normal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ValueGenerator;
use crate::analysis::stats::round_to;

/// Out-of-range draws retried before a family sample is clamped
const MAX_REDRAWS: usize = 32;

/// Distribution family fitted to the retained values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum Family {
    Normal { mean: f64, std: f64 },
    /// `ln x` is normal with mean `mu` and deviation `sigma`
    Lognormal { mu: f64, sigma: f64 },
    /// Shifted to start at `loc`
    Exponential { loc: f64, scale: f64 },
    Gamma { shape: f64, scale: f64 },
}

impl Family {
    pub fn name(&self) -> &'static str {
        match self {
            Family::Normal { .. } => "normal",
            Family::Lognormal { .. } => "lognormal",
            Family::Exponential { .. } => "exponential",
            Family::Gamma { .. } => "gamma",
        }
    }

    pub fn check(&self) -> Result<(), String> {
        let valid = match *self {
            Family::Normal { mean, std } => mean.is_finite() && std.is_finite() && std >= 0.0,
            Family::Lognormal { mu, sigma } => mu.is_finite() && sigma.is_finite() && sigma >= 0.0,
            Family::Exponential { loc, scale } => loc.is_finite() && scale.is_finite() && scale > 0.0,
            Family::Gamma { shape, scale } => {
                shape.is_finite() && scale.is_finite() && shape > 0.0 && scale > 0.0
            }
        };
        if valid {
            Ok(())
        } else {
            Err(format!("invalid {} parameters", self.name()))
        }
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> Option<f64> {
        match *self {
            Family::Normal { mean, std } => Normal::new(mean, std).ok().map(|d| d.sample(rng)),
            Family::Lognormal { mu, sigma } => LogNormal::new(mu, sigma).ok().map(|d| d.sample(rng)),
            Family::Exponential { loc, scale } => {
                Exp::new(1.0 / scale).ok().map(|d| loc + d.sample(rng))
            }
            Family::Gamma { shape, scale } => Gamma::new(shape, scale).ok().map(|d| d.sample(rng)),
        }
    }

    /// Draw within `[min, max]`, clamping once the redraws run out
    fn sample_within<R: Rng>(&self, rng: &mut R, min: f64, max: f64) -> Option<f64> {
        let mut last = None;
        for _ in 0..MAX_REDRAWS {
            let value = self.draw(rng)?;
            if (min..=max).contains(&value) {
                return Some(value);
            }
            last = Some(value);
        }
        last.map(|value| value.clamp(min, max))
    }
}

/// Outlier tail sampled uniformly at a small rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailParams {
    pub min: f64,
    pub max: f64,
    pub rate: f64,
}

/// Numeric distribution learned from a population
///
/// `min`/`max` bound the retained (non-outlier) values. Without `dist` the
/// values are drawn uniformly from that range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberParams {
    pub min: f64,
    pub max: f64,

    /// All observed values were integers
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub integer: bool,

    /// Decimal places kept on generated floats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prec: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<Family>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<TailParams>,
}

impl NumberParams {
    /// Uniform integer range
    pub fn int_range(min: i64, max: i64) -> Self {
        Self {
            min: min as f64,
            max: max as f64,
            integer: true,
            prec: None,
            dist: None,
            tail: None,
        }
    }

    /// Uniform float range
    pub fn float_range(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            integer: false,
            prec: None,
            dist: None,
            tail: None,
        }
    }

    /// Problems with the parameters, if any
    pub fn check(&self) -> Result<(), String> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err("min and max must be finite".to_string());
        }
        if self.min > self.max {
            return Err(format!("min {} exceeds max {}", self.min, self.max));
        }
        if let Some(family) = &self.dist {
            family.check()?;
        }
        if let Some(tail) = &self.tail {
            if !(0.0..=1.0).contains(&tail.rate) {
                return Err(format!("tail rate {} outside [0, 1]", tail.rate));
            }
            if !tail.min.is_finite() || !tail.max.is_finite() || tail.min > tail.max {
                return Err("tail min must not exceed tail max".to_string());
            }
        }
        Ok(())
    }

    /// Draw one raw sample, rounded but not yet converted to JSON
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let raw = match &self.tail {
            Some(tail) if tail.rate > 0.0 && rng.gen_bool(tail.rate) => {
                uniform(rng, tail.min, tail.max)
            }
            _ => self
                .dist
                .filter(|_| self.max > self.min)
                .and_then(|family| family.sample_within(rng, self.min, self.max))
                .unwrap_or_else(|| uniform(rng, self.min, self.max)),
        };
        if self.integer {
            raw.round()
        } else {
            match self.prec {
                Some(prec) => round_to(raw, prec),
                None => raw,
            }
        }
    }

    /// Sample as a non-negative count, for lengths and key counts
    pub fn sample_count<R: Rng>(&self, rng: &mut R) -> usize {
        let value = self.sample(rng).round();
        if value <= 0.0 { 0 } else { value as usize }
    }

    /// Render a sampled value the way a numeric string would carry it
    pub fn render(&self, value: f64) -> String {
        if self.integer {
            format!("{}", value as i64)
        } else {
            match self.prec {
                Some(prec) => format!("{:.*}", prec as usize, value),
                None => format!("{}", value),
            }
        }
    }
}

impl ValueGenerator for NumberParams {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        let value = self.sample(rng);
        if self.integer {
            Value::from(value as i64)
        } else {
            serde_json::Number::from_f64(value)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
    }
}

fn uniform<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_integer_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = NumberParams::int_range(10, 20);

        for _ in 0..100 {
            let value = params.generate(&mut rng);
            let v = value.as_i64().expect("integer value");
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_float_precision() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = NumberParams {
            prec: Some(2),
            ..NumberParams::float_range(0.0, 1.0)
        };

        for _ in 0..100 {
            let v = params.generate(&mut rng).as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v));
            assert_eq!(round_to(v, 2), v);
        }
    }

    #[test]
    fn test_normal_clamped_to_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let params = NumberParams {
            dist: Some(Family::Normal {
                mean: 50.0,
                std: 40.0,
            }),
            ..NumberParams::float_range(40.0, 60.0)
        };

        for _ in 0..500 {
            let v = params.sample(&mut rng);
            assert!((40.0..=60.0).contains(&v));
        }
    }

    #[test]
    fn test_skewed_families_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(19);
        for family in [
            Family::Lognormal { mu: 2.0, sigma: 0.9 },
            Family::Exponential { loc: 1.0, scale: 8.0 },
            Family::Gamma { shape: 2.0, scale: 4.0 },
        ] {
            let params = NumberParams {
                dist: Some(family),
                ..NumberParams::float_range(1.0, 40.0)
            };
            let mut values: Vec<f64> = (0..2000).map(|_| params.sample(&mut rng)).collect();
            assert!(values.iter().all(|v| (1.0..=40.0).contains(v)), "{:?}", family);

            // Right-skewed: the median sits well below the middle of the range
            values.sort_by(|a, b| a.total_cmp(b));
            assert!(values[1000] < 15.0, "{:?} median {}", family, values[1000]);
        }
    }

    #[test]
    fn test_check_rejects_bad_family() {
        let params = NumberParams {
            dist: Some(Family::Gamma {
                shape: 0.0,
                scale: 1.0,
            }),
            ..NumberParams::float_range(0.0, 1.0)
        };
        assert!(params.check().is_err());
    }

    #[test]
    fn test_tail_rate_respected() {
        let mut rng = StdRng::seed_from_u64(3);
        let params = NumberParams {
            tail: Some(TailParams {
                min: 1000.0,
                max: 2000.0,
                rate: 0.05,
            }),
            ..NumberParams::int_range(0, 10)
        };

        let outliers = (0..10_000)
            .filter(|_| params.sample(&mut rng) > 10.0)
            .count();
        assert!((300..=700).contains(&outliers), "outliers: {}", outliers);
    }

    #[test]
    fn test_constant_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = NumberParams::int_range(5, 5);
        assert_eq!(params.generate(&mut rng), Value::from(5));
        assert_eq!(params.sample_count(&mut rng), 5);
    }

    #[test]
    fn test_check_rejects_inverted_range() {
        assert!(NumberParams::int_range(5, 1).check().is_err());
        assert!(NumberParams::int_range(1, 5).check().is_ok());
    }

    #[test]
    fn test_render() {
        let params = NumberParams {
            prec: Some(2),
            ..NumberParams::float_range(0.0, 10.0)
        };
        assert_eq!(params.render(3.5), "3.50");
        assert_eq!(NumberParams::int_range(0, 10).render(7.0), "7");
    }

    #[test]
    fn test_wire_shape() {
        let params = NumberParams::int_range(1, 3);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({"min": 1.0, "max": 3.0, "integer": true}));

        let params = NumberParams {
            dist: Some(Family::Exponential {
                loc: 0.0,
                scale: 2.5,
            }),
            ..NumberParams::float_range(0.0, 10.0)
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json["dist"],
            serde_json::json!({"family": "exponential", "loc": 0.0, "scale": 2.5})
        );
    }
}

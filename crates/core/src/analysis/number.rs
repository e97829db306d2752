//! Numeric distribution fitting

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::stats::{
    MAX_PRECISION, decimal_places, exponential_cdf, gamma_cdf, ks_p_value, ks_statistic,
    lognormal_cdf, mean, normal_cdf, quantile, round_to, skewness, std_dev, uniform_cdf,
};
use super::{AnalysisResult, Analyzer, AnalyzerKind};
use crate::extract::Scalar;
use crate::hints::{Family, Hint, NumberParams, TailParams};

/// Values beyond this many IQRs outside the quartiles are outliers
const IQR_FENCE: f64 = 1.5;

/// Values beyond this many IQRs are left out of the family fit
const EXTREME_IQR_FENCE: f64 = 3.0;

/// Fewest values before a distribution family is fitted
const MIN_FIT_VALUES: usize = 15;

/// KS p-value a fitted family has to reach
const FIT_P_THRESHOLD: f64 = 0.05;

/// Skewness from which the right-skewed families are tried
const SKEW_THRESHOLD: f64 = 0.5;

static NUMERIC_STRING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(0|[1-9]\d*)(\.\d+)?$").unwrap());

/// Fit a numeric hint to a population
///
/// Outliers outside the 1.5×IQR fences are split off into a tail whose
/// rate is capped at `outlier_rate_cap`. A distribution family is fitted to
/// the values inside the 3×IQR fences: normal always, and lognormal, gamma
/// and exponential when the data is right-skewed. The family with the
/// lowest KS statistic wins if the KS test accepts it and it beats the
/// uniform fit; otherwise values are drawn uniformly.
pub fn fit_number(values: &[f64], integer: bool, outlier_rate_cap: f64) -> NumberParams {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 0 {
        return NumberParams::int_range(0, 0);
    }

    let prec = if integer {
        None
    } else {
        Some(
            sorted
                .iter()
                .map(|v| decimal_places(*v))
                .max()
                .unwrap_or(0)
                .min(MAX_PRECISION),
        )
    };

    let within = |fence: f64| -> Vec<f64> {
        if n < 4 {
            return sorted.clone();
        }
        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo, hi) = (q1 - fence * iqr, q3 + fence * iqr);
        sorted.iter().copied().filter(|v| (lo..=hi).contains(v)).collect()
    };
    let retained = within(IQR_FENCE);
    let outliers = n - retained.len();

    let min = retained.first().copied().unwrap_or(sorted[0]);
    let max = retained.last().copied().unwrap_or(sorted[n - 1]);

    let tail = if outliers == 0 {
        None
    } else {
        let rate = round_to((outliers as f64 / n as f64).min(outlier_rate_cap), 6);
        (rate > 0.0).then(|| TailParams {
            min: sorted[0],
            max: sorted[n - 1],
            rate,
        })
    };

    let dist = if max > min {
        fit_family(&within(EXTREME_IQR_FENCE))
    } else {
        None
    };
    trace!(
        n,
        outliers,
        family = dist.as_ref().map_or("uniform", Family::name),
        "Fitted numeric population"
    );

    NumberParams {
        min,
        max,
        integer,
        prec,
        dist,
        tail,
    }
}

fn fit_family(sorted: &[f64]) -> Option<Family> {
    let n = sorted.len();
    if n < MIN_FIT_VALUES {
        return None;
    }
    let (lo, hi) = (sorted[0], sorted[n - 1]);
    let mu = mean(sorted);
    let sigma = std_dev(sorted, mu);
    if hi <= lo || sigma <= 0.0 {
        return None;
    }

    let mut candidates = vec![Family::Normal {
        mean: round_to(mu, MAX_PRECISION),
        std: round_to(sigma, MAX_PRECISION),
    }];
    if skewness(sorted, mu, sigma) >= SKEW_THRESHOLD {
        if lo > 0.0 {
            let logs: Vec<f64> = sorted.iter().map(|v| v.ln()).collect();
            let log_mu = mean(&logs);
            let log_sigma = std_dev(&logs, log_mu);
            if log_sigma > 0.0 {
                candidates.push(Family::Lognormal {
                    mu: round_to(log_mu, MAX_PRECISION),
                    sigma: round_to(log_sigma, MAX_PRECISION),
                });
            }
            let variance = sigma * sigma;
            candidates.push(Family::Gamma {
                shape: round_to(mu * mu / variance, MAX_PRECISION),
                scale: round_to(variance / mu, MAX_PRECISION),
            });
        }
        if lo >= 0.0 {
            candidates.push(Family::Exponential {
                loc: lo,
                scale: round_to(mu - lo, MAX_PRECISION),
            });
        }
    }

    let d_unif = ks_statistic(sorted, |x| uniform_cdf(x, lo, hi));
    candidates
        .into_iter()
        .filter(|family| family.check().is_ok())
        .map(|family| (ks_statistic(sorted, |x| family_cdf(&family, x)), family))
        .inspect(|(d, family)| trace!(family = family.name(), d, "KS fit"))
        .filter(|(d, _)| ks_p_value(*d, n) >= FIT_P_THRESHOLD && *d < d_unif)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, family)| family)
}

fn family_cdf(family: &Family, x: f64) -> f64 {
    match *family {
        Family::Normal { mean, std } => normal_cdf(x, mean, std),
        Family::Lognormal { mu, sigma } => lognormal_cdf(x, mu, sigma),
        Family::Exponential { loc, scale } => exponential_cdf(x, loc, scale),
        Family::Gamma { shape, scale } => gamma_cdf(x, shape, scale),
    }
}

/// Numeric populations
pub struct NumberAnalyzer {
    outlier_rate_cap: f64,
}

impl NumberAnalyzer {
    pub fn new(outlier_rate_cap: f64) -> Self {
        Self { outlier_rate_cap }
    }
}

impl Analyzer for NumberAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Number
    }

    fn analyze(&self, values: &[Scalar]) -> Option<AnalysisResult> {
        if values.is_empty() {
            return None;
        }
        let numbers: Vec<f64> = values.iter().map(Scalar::as_f64).collect::<Option<_>>()?;
        let integer = values.iter().all(|v| matches!(v, Scalar::Int(_)));
        let params = fit_number(&numbers, integer, self.outlier_rate_cap);
        Some(AnalysisResult::new(self.kind(), Hint::Number(params), 1.0))
    }
}

/// Numbers carried as strings, e.g. `"42"` or `"3.50"`
///
/// Declines values with leading zeros, which are identifiers rather than
/// numbers.
pub struct NumberStringAnalyzer {
    outlier_rate_cap: f64,
}

impl NumberStringAnalyzer {
    pub fn new(outlier_rate_cap: f64) -> Self {
        Self { outlier_rate_cap }
    }
}

impl Analyzer for NumberStringAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::NumberString
    }

    fn analyze(&self, values: &[Scalar]) -> Option<AnalysisResult> {
        if values.is_empty() {
            return None;
        }
        let mut numbers = Vec::with_capacity(values.len());
        let mut decimals = 0u32;
        for value in values {
            let text = value.as_str()?;
            if !NUMERIC_STRING_REGEX.is_match(text) {
                return None;
            }
            if let Some((_, frac)) = text.split_once('.') {
                decimals = decimals.max(frac.len() as u32);
            }
            numbers.push(text.parse::<f64>().ok()?);
        }
        let integer = decimals == 0;
        let mut params = fit_number(&numbers, integer, self.outlier_rate_cap);
        if !integer {
            params.prec = Some(decimals.min(MAX_PRECISION));
        }
        Some(AnalysisResult::new(
            self.kind(),
            Hint::NumberString(params),
            0.95,
        ))
    }
}

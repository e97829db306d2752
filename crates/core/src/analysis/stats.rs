//! Numeric helpers shared by the analyzers

/// Largest number of decimals a numeric hint keeps
pub const MAX_PRECISION: u32 = 6;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Quantile of sorted data with linear interpolation between ranks
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Decimal places in the shortest round-trip rendering of `value`
pub fn decimal_places(value: f64) -> u32 {
    let rendered = format!("{}", value);
    match rendered.split_once('.') {
        Some((_, frac)) => frac.len() as u32,
        None => 0,
    }
}

pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Error function, Abramowitz and Stegun 7.1.26 (|error| < 1.5e-7)
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

pub fn normal_cdf(x: f64, mean: f64, std: f64) -> f64 {
    if std <= 0.0 {
        return if x < mean { 0.0 } else { 1.0 };
    }
    0.5 * (1.0 + erf((x - mean) / (std * std::f64::consts::SQRT_2)))
}

pub fn uniform_cdf(x: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return if x < min { 0.0 } else { 1.0 };
    }
    ((x - min) / (max - min)).clamp(0.0, 1.0)
}

pub fn lognormal_cdf(x: f64, mu: f64, sigma: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    normal_cdf(x.ln(), mu, sigma)
}

pub fn exponential_cdf(x: f64, loc: f64, scale: f64) -> f64 {
    if x <= loc {
        return 0.0;
    }
    1.0 - (-(x - loc) / scale).exp()
}

pub fn gamma_cdf(x: f64, shape: f64, scale: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    gamma_p(shape, x / scale)
}

/// Sample skewness; positive for a long right tail
pub fn skewness(values: &[f64], mean: f64, std: f64) -> f64 {
    if values.is_empty() || std <= 0.0 {
        return 0.0;
    }
    values.iter().map(|v| ((v - mean) / std).powi(3)).sum::<f64>() / values.len() as f64
}

const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function, Lanczos approximation (g = 7)
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let sum = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |sum, (i, c)| sum + c / (x + i as f64));
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Regularized lower incomplete gamma function P(a, x)
///
/// Power series below `a + 1`, continued fraction (modified Lentz) above.
pub fn gamma_p(a: f64, x: f64) -> f64 {
    if x <= 0.0 || a <= 0.0 {
        return 0.0;
    }
    let prefix = (a * x.ln() - x - ln_gamma(a)).exp();
    if x < a + 1.0 {
        let mut term = 1.0 / a;
        let mut sum = term;
        let mut denom = a;
        for _ in 0..500 {
            denom += 1.0;
            term *= x / denom;
            sum += term;
            if term.abs() < sum.abs() * 1e-14 {
                break;
            }
        }
        (sum * prefix).clamp(0.0, 1.0)
    } else {
        const TINY: f64 = 1e-300;
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / TINY;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..500 {
            let i = i as f64;
            let an = -i * (i - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < TINY {
                d = TINY;
            }
            c = b + an / c;
            if c.abs() < TINY {
                c = TINY;
            }
            d = 1.0 / d;
            let delta = d * c;
            h *= delta;
            if (delta - 1.0).abs() < 1e-14 {
                break;
            }
        }
        (1.0 - prefix * h).clamp(0.0, 1.0)
    }
}

/// One-sample Kolmogorov-Smirnov statistic of sorted data against `cdf`
pub fn ks_statistic(sorted: &[f64], cdf: impl Fn(f64) -> f64) -> f64 {
    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let f = cdf(x);
            let above = (i + 1) as f64 / n - f;
            let below = f - i as f64 / n;
            above.max(below)
        })
        .fold(0.0, f64::max)
}

/// Asymptotic p-value of a KS statistic `d` over `n` samples
pub fn ks_p_value(d: f64, n: usize) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let sqrt_n = (n as f64).sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    if lambda < 1e-3 {
        return 1.0;
    }
    let mut sum = 0.0;
    for k in 1..=100 {
        let k = k as f64;
        let term = (-2.0 * k * k * lambda * lambda).exp();
        let signed = if (k as i64) % 2 == 1 { term } else { -term };
        sum += signed;
        if term < 1e-10 {
            break;
        }
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
        assert!((quantile(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&sorted, 0.25) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(3.0), 0);
        assert_eq!(decimal_places(3.25), 2);
        assert_eq!(decimal_places(0.1), 1);
    }

    #[test]
    fn test_erf_known_values() {
        assert!(erf(0.0).abs() < 1e-6);
        assert!((erf(1.0) - 0.842_700_79).abs() < 1e-6);
        assert!((erf(-1.0) + 0.842_700_79).abs() < 1e-6);
    }

    #[test]
    fn test_ln_gamma_factorials() {
        assert!(ln_gamma(1.0).abs() < 1e-10);
        assert!((ln_gamma(5.0) - 24f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn test_gamma_p_special_cases() {
        // Shape 1 is the exponential distribution
        for x in [0.1, 1.0, 2.5, 8.0] {
            assert!((gamma_p(1.0, x) - (1.0 - (-x).exp())).abs() < 1e-10);
        }
        // Shape 1/2 relates to erf
        for x in [0.2, 1.0, 4.0] {
            assert!((gamma_p(0.5, x) - erf(x.sqrt())).abs() < 1e-6);
        }
        assert_eq!(gamma_p(2.0, 0.0), 0.0);
    }

    #[test]
    fn test_skewed_cdfs() {
        assert_eq!(exponential_cdf(1.0, 2.0, 1.0), 0.0);
        assert!((exponential_cdf(3.0, 2.0, 1.0) - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
        assert!((lognormal_cdf(1.0, 0.0, 1.0) - 0.5).abs() < 1e-6);
        assert!((gamma_cdf(2.0, 1.0, 2.0) - (1.0 - (-1.0f64).exp())).abs() < 1e-10);
    }

    #[test]
    fn test_skewness_sign() {
        let symmetric = [1.0, 2.0, 3.0, 4.0, 5.0];
        let m = mean(&symmetric);
        assert!(skewness(&symmetric, m, std_dev(&symmetric, m)).abs() < 1e-12);

        let right = [1.0, 1.0, 1.0, 2.0, 10.0];
        let m = mean(&right);
        assert!(skewness(&right, m, std_dev(&right, m)) > 1.0);
    }

    #[test]
    fn test_ks_uniform_fits_uniform() {
        let sorted: Vec<f64> = (0..100).map(|i| i as f64 / 99.0).collect();
        let d = ks_statistic(&sorted, |x| uniform_cdf(x, 0.0, 1.0));
        assert!(d < 0.05);
        assert!(ks_p_value(d, sorted.len()) > 0.9);
    }

    #[test]
    fn test_ks_rejects_bad_fit() {
        let sorted: Vec<f64> = (0..100).map(|i| if i < 90 { 0.0 } else { 10.0 }).collect();
        let d = ks_statistic(&sorted, |x| uniform_cdf(x, 0.0, 10.0));
        assert!(ks_p_value(d, sorted.len()) < 0.01);
    }
}

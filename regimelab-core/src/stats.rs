//! Causal statistics: expanding and rolling moments over a single series.
//!
//! Every function returns a vector the same length as its input, and the value
//! at index `t` depends only on `series[0..=t]`. NaN and ±inf mark a missing
//! observation: it is skipped by the expanding accumulators and poisons any
//! rolling window that contains it.
//!
//! A standard deviation of exactly zero yields NaN for the z-score rather than
//! an infinite value.

/// Running count / mean / sum of squared deviations (Welford's algorithm).
///
/// Non-finite observations are ignored, so `count()` is the number of valid
/// observations seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpandingMoments {
    count: usize,
    mean: f64,
    m2: f64,
}

impl ExpandingMoments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample standard deviation (ddof = 1). `None` with fewer than two observations.
    pub fn sample_std(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        let var = (self.m2 / (self.count - 1) as f64).max(0.0);
        Some(var.sqrt())
    }
}

fn effective_min_periods(min_periods: usize) -> usize {
    min_periods.max(1)
}

/// Expanding mean; NaN until `min_periods` valid observations have been seen.
pub fn expanding_mean(series: &[f64], min_periods: usize) -> Vec<f64> {
    let min_periods = effective_min_periods(min_periods);
    let mut acc = ExpandingMoments::new();
    series
        .iter()
        .map(|&x| {
            acc.push(x);
            if acc.count() >= min_periods {
                acc.mean().unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Expanding sample standard deviation (Bessel-corrected).
pub fn expanding_std(series: &[f64], min_periods: usize) -> Vec<f64> {
    let min_periods = effective_min_periods(min_periods);
    let mut acc = ExpandingMoments::new();
    series
        .iter()
        .map(|&x| {
            acc.push(x);
            if acc.count() >= min_periods {
                acc.sample_std().unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Expanding z-score: `(x_t - mean(x_0..=x_t)) / std(x_0..=x_t)`.
///
/// Missing when fewer than `min_periods` valid observations exist up to and
/// including `t`, when `x_t` itself is missing, or when the std is zero.
pub fn expanding_zscore(series: &[f64], min_periods: usize) -> Vec<f64> {
    let min_periods = effective_min_periods(min_periods);
    let mut acc = ExpandingMoments::new();
    series
        .iter()
        .map(|&x| {
            acc.push(x);
            if !x.is_finite() || acc.count() < min_periods {
                return f64::NAN;
            }
            match (acc.mean(), acc.sample_std()) {
                (Some(mean), Some(std)) if std != 0.0 => (x - mean) / std,
                _ => f64::NAN,
            }
        })
        .collect()
}

fn window_moments(window: &[f64]) -> Option<ExpandingMoments> {
    if window.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let mut acc = ExpandingMoments::new();
    for &x in window {
        acc.push(x);
    }
    Some(acc)
}

/// Trailing rolling mean over `window` observations.
/// Lookback: window - 1 (first valid value at index window-1).
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    rolling_map(series, window, |acc, _| acc.mean())
}

/// Trailing rolling sample standard deviation over `window` observations.
pub fn rolling_std(series: &[f64], window: usize) -> Vec<f64> {
    rolling_map(series, window, |acc, _| acc.sample_std())
}

/// Trailing rolling z-score of the current value against its own window.
pub fn rolling_zscore(series: &[f64], window: usize) -> Vec<f64> {
    rolling_map(series, window, |acc, x| match (acc.mean(), acc.sample_std()) {
        (Some(mean), Some(std)) if std != 0.0 => Some((x - mean) / std),
        _ => None,
    })
}

fn rolling_map<F>(series: &[f64], window: usize, f: F) -> Vec<f64>
where
    F: Fn(&ExpandingMoments, f64) -> Option<f64>,
{
    let window = window.max(1);
    let n = series.len();
    let mut result = vec![f64::NAN; n];
    if n < window {
        return result;
    }
    for i in (window - 1)..n {
        let slice = &series[(i + 1 - window)..=i];
        if let Some(acc) = window_moments(slice) {
            result[i] = f(&acc, series[i]).unwrap_or(f64::NAN);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-10,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn moments_match_textbook_values() {
        let mut acc = ExpandingMoments::new();
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.push(x);
        }
        assert_eq!(acc.count(), 8);
        assert_approx(acc.mean().unwrap(), 5.0);
        // sample variance = 32 / 7
        assert_approx(acc.sample_std().unwrap(), (32.0_f64 / 7.0).sqrt());
    }

    #[test]
    fn moments_skip_nan() {
        let mut acc = ExpandingMoments::new();
        acc.push(1.0);
        acc.push(f64::NAN);
        acc.push(3.0);
        assert_eq!(acc.count(), 2);
        assert_approx(acc.mean().unwrap(), 2.0);
    }

    #[test]
    fn infinite_observations_are_missing() {
        let mut acc = ExpandingMoments::new();
        acc.push(1.0);
        acc.push(f64::INFINITY);
        acc.push(f64::NEG_INFINITY);
        acc.push(3.0);
        assert_eq!(acc.count(), 2);
        assert_approx(acc.mean().unwrap(), 2.0);

        let z = expanding_zscore(&[1.0, 2.0, f64::INFINITY, 3.0, 4.0], 3);
        assert!(z[2].is_nan());
        // after the inf: 1,2,3 → mean 2, std 1
        assert_approx(z[3], 1.0);
        assert!(z[4].is_finite());

        let r = rolling_mean(&[1.0, f64::INFINITY, 3.0, 5.0], 2);
        assert!(r[1].is_nan() && r[2].is_nan());
        assert_approx(r[3], 4.0);
    }

    #[test]
    fn expanding_zscore_first_value_at_min_periods() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let z = expanding_zscore(&series, 3);
        assert!(z[0].is_nan());
        assert!(z[1].is_nan());
        // index 2: mean=2, std=1 → z=1
        assert_approx(z[2], 1.0);
        // index 3: mean=2.5, std=sqrt(5/3)
        assert_approx(z[3], 1.5 / (5.0_f64 / 3.0).sqrt());
    }

    #[test]
    fn expanding_zscore_zero_std_is_missing() {
        let z = expanding_zscore(&[4.0, 4.0, 4.0, 4.0], 2);
        assert!(z.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn expanding_zscore_leading_nans_delay_warmup() {
        let series = [f64::NAN, f64::NAN, 1.0, 2.0, 3.0];
        let z = expanding_zscore(&series, 3);
        assert!(z[..4].iter().all(|v| v.is_nan()));
        assert_approx(z[4], 1.0);
    }

    #[test]
    fn expanding_zscore_missing_current_value_is_missing() {
        let series = [1.0, 2.0, 3.0, f64::NAN, 5.0];
        let z = expanding_zscore(&series, 2);
        assert!(z[3].is_nan());
        assert!(!z[4].is_nan());
    }

    #[test]
    fn zero_min_periods_behaves_like_one() {
        let m = expanding_mean(&[3.0, 5.0], 0);
        assert_approx(m[0], 3.0);
        assert_approx(m[1], 4.0);
        // std needs two observations regardless
        let s = expanding_std(&[3.0, 5.0], 0);
        assert!(s[0].is_nan());
        assert_approx(s[1], 2.0_f64.sqrt());
    }

    #[test]
    fn rolling_mean_basic() {
        let r = rolling_mean(&[10.0, 11.0, 12.0, 13.0, 14.0], 3);
        assert!(r[0].is_nan() && r[1].is_nan());
        assert_approx(r[2], 11.0);
        assert_approx(r[4], 13.0);
    }

    #[test]
    fn rolling_nan_poisons_window() {
        let r = rolling_std(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(r[1].is_nan());
        assert!(r[2].is_nan());
        assert_approx(r[3], 0.5_f64.sqrt());
    }

    #[test]
    fn rolling_zscore_constant_window_is_missing() {
        let r = rolling_zscore(&[2.0, 2.0, 2.0, 5.0], 3);
        assert!(r[2].is_nan());
        assert!(r[3] > 0.0);
    }

    #[test]
    fn rolling_too_short_is_all_nan() {
        assert!(rolling_mean(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
    }
}

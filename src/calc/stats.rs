use serde::Serialize;
use std::cmp::Ordering;

/// Descriptive statistics over one population. Values are kept at full
/// precision; rounding happens only when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub count: usize,
    #[serde(serialize_with = "super::serialize_whole")]
    pub mean: f64,
    #[serde(rename = "sd", serialize_with = "super::serialize_whole")]
    pub std: f64,
    #[serde(serialize_with = "super::serialize_whole")]
    pub median: f64,
    #[serde(serialize_with = "super::serialize_whole")]
    pub min: f64,
    #[serde(serialize_with = "super::serialize_whole")]
    pub max: f64,
    #[serde(serialize_with = "super::serialize_whole")]
    pub q1: f64,
    #[serde(serialize_with = "super::serialize_whole")]
    pub q3: f64,
    #[serde(serialize_with = "super::serialize_whole")]
    pub iqr: f64,
    pub outliers: usize,
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / (values.len() as f64)
}

/// Sample standard deviation (n-1 divisor); 0 below two samples.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    // constant populations must report exactly zero
    if values.iter().all(|v| *v == values[0]) {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / ((values.len() - 1) as f64)).sqrt()
}

#[cfg(test)]
pub fn median(values: &[f64]) -> f64 {
    median_sorted(&sorted_finite(values))
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0
    }
}

/// Linear-interpolation quantile: position `(n-1)*q` between the bracketing
/// sorted values. `q` is clamped to [0, 1].
#[cfg(test)]
pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted_finite(values), q)
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
    let pos = ((sorted.len() - 1) as f64) * q;
    let base = pos.floor() as usize;
    let rest = pos - (base as f64);
    match sorted.get(base + 1) {
        Some(next) => sorted[base] + rest * (next - sorted[base]),
        None => sorted[base],
    }
}

/// Tukey fences: `[q1 - 1.5*iqr, q3 + 1.5*iqr]`.
pub fn tukey_fences(q1: f64, q3: f64) -> (f64, f64) {
    let iqr = q3 - q1;
    (q1 - 1.5 * iqr, q3 + 1.5 * iqr)
}

/// Full description of a population. Non-finite inputs are ignored and an
/// empty population describes as all zeros.
pub fn describe(values: &[f64]) -> Statistics {
    let sorted = sorted_finite(values);
    let Some((&min, &max)) = sorted.first().zip(sorted.last()) else {
        return Statistics::default();
    };

    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let (low, high) = tukey_fences(q1, q3);
    let outliers = sorted.iter().filter(|v| **v < low || **v > high).count();

    Statistics {
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        median: median_sorted(&sorted),
        min,
        max,
        q1,
        q3,
        iqr: q3 - q1,
        outliers,
    }
}

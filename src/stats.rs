/// Compute the arithmetic mean, `NaN` for an empty slice.
pub fn compute_mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Compute the `q`-th quantile using linear interpolation between order statistics.
///
/// The position of the quantile in the sorted values is `q * (n - 1)`; when it
/// falls between two ranks the result is interpolated linearly. Returns `None`
/// for an empty slice.
pub fn compute_quantile(vals: &[f64], q: f64) -> Option<f64> {
    if vals.is_empty() {
        return None;
    }
    let mut sorted = vals.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }

    let frac = pos - lower as f64;
    Some(sorted[lower] + frac * (sorted[upper] - sorted[lower]))
}

/// Compute the first difference `vals[i] - vals[i - 1]` for `i >= 1`.
///
/// The result has one element less than the input.
pub fn compute_diff(vals: &[f64]) -> Vec<f64> {
    vals.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

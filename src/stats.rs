//! Descriptive statistics over series with missing values, plus the
//! sentinel/clipping treatment for the heavy-tailed B/D ratio column.

/// The simulator prints this in the B/D column when deaths are zero.
pub const RATIO_SENTINEL: f64 = 1e9;

/// Map the literal sentinel to +Inf so it is excluded from finite statistics.
pub fn desentinel(v: f64) -> f64 {
    if v == RATIO_SENTINEL {
        f64::INFINITY
    } else {
        v
    }
}

/// Finite values of a series, sorted ascending. NaN and ±Inf drop out.
pub fn finite_sorted(series: &[Option<f64>]) -> Vec<f64> {
    let mut values: Vec<f64> = series
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values
}

/// Quantile with linear interpolation between order statistics.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(sorted: &[f64]) -> Option<f64> {
    quantile(sorted, 0.5)
}

/// Sample standard deviation (ddof = 1); undefined below 2 observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Cap values above `cap`; smaller values and missing values pass through.
/// Applying the same cap twice is a no-op.
pub fn clip_upper(series: &[Option<f64>], cap: f64) -> Vec<Option<f64>> {
    series.iter().map(|v| v.map(|x| x.min(cap))).collect()
}

/// Prepare a B/D series for plotting: sentinel -> +Inf, then cap at the given
/// quantile of the finite values. With no finite value the series is returned
/// unchanged, sentinels included.
pub fn clip_ratio_series(series: &[Option<f64>], q: f64) -> Vec<Option<f64>> {
    let mapped: Vec<Option<f64>> = series.iter().map(|v| v.map(desentinel)).collect();
    let finite = finite_sorted(&mapped);
    match quantile(&finite, q) {
        Some(cap) => clip_upper(&mapped, cap),
        None => series.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn sentinel_maps_to_infinity_and_leaves_finite_alone() {
        assert!(desentinel(RATIO_SENTINEL).is_infinite());
        assert_eq!(desentinel(2.5), 2.5);
        // Close but not equal stays finite.
        assert!(desentinel(RATIO_SENTINEL - 1.0).is_finite());
    }

    #[test]
    fn sentinel_excluded_from_finite_statistics() {
        let s = vec![Some(1.0), Some(3.0), Some(RATIO_SENTINEL), None];
        let mapped: Vec<Option<f64>> = s.iter().map(|v| v.map(desentinel)).collect();
        let finite = finite_sorted(&mapped);
        assert_eq!(finite, vec![1.0, 3.0]);
        assert_eq!(mean(&finite), Some(2.0));
        assert_eq!(median(&finite), Some(2.0));
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let sorted: Vec<f64> = (0..=100).map(f64::from).collect();
        assert_eq!(quantile(&sorted, 0.5), Some(50.0));
        assert_eq!(quantile(&sorted, 0.99), Some(99.0));
        let sorted = vec![1.0, 2.0];
        assert_eq!(quantile(&sorted, 0.75), Some(1.75));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn sample_std_uses_ddof_one() {
        assert_eq!(sample_std(&[1.0]), None);
        let std = sample_std(&[1.0, 2.0, 3.0]).unwrap();
        assert!((std - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clip_upper_is_idempotent() {
        let s = series(&[0.1, 5.0, 100.0, 2.0]);
        let once = clip_upper(&s, 5.0);
        let twice = clip_upper(&once, 5.0);
        assert_eq!(once, twice);
        assert_eq!(once[2], Some(5.0));
        assert_eq!(once[0], Some(0.1));
    }

    #[test]
    fn clip_preserves_missing_values() {
        let s = vec![Some(1.0), None, Some(10.0)];
        let clipped = clip_upper(&s, 5.0);
        assert_eq!(clipped, vec![Some(1.0), None, Some(5.0)]);
    }

    #[test]
    fn ratio_clip_caps_sentinel_at_quantile() {
        let mut s = series(&[1.0; 99]);
        s.push(Some(RATIO_SENTINEL));
        let clipped = clip_ratio_series(&s, 0.99);
        // Every clipped value must be finite; the sentinel lands on the cap.
        assert!(clipped.iter().all(|v| v.map(f64::is_finite).unwrap_or(true)));
        assert_eq!(clipped[0], Some(1.0));
        assert!(clipped[99].unwrap() >= 1.0);
    }

    #[test]
    fn ratio_clip_without_finite_values_returns_input() {
        let s = vec![Some(RATIO_SENTINEL), None, Some(f64::INFINITY)];
        let clipped = clip_ratio_series(&s, 0.99);
        assert_eq!(clipped[0], Some(RATIO_SENTINEL));
        assert_eq!(clipped[1], None);
    }
}

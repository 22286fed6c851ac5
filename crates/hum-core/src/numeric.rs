//! Small numeric helpers shared by the normalizer and scorers

/// Semitones of `freq` relative to `reference` (both Hz)
pub fn hz_to_semitones(freq: f64, reference: f64) -> f64 {
    12.0 * (freq / reference).log2()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Median, averaging the two middle values for even lengths
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// First differences: `out[i] = values[i + 1] - values[i]`
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Min and max of a non-empty slice
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Mean of two sequence lengths
pub fn avg_len(a: usize, b: usize) -> f64 {
    (a + b) as f64 / 2.0
}

/// Clamp to the similarity range
pub fn clamp_similarity(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_semitones() {
        assert_relative_eq!(hz_to_semitones(440.0, 440.0), 0.0);
        assert_relative_eq!(hz_to_semitones(880.0, 440.0), 12.0);
        assert_relative_eq!(hz_to_semitones(220.0, 440.0), -12.0);
    }

    #[test]
    fn test_std_dev_population() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(sd, 2.0);
        assert!(std_dev(&[]).is_none());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_diff_and_min_max() {
        assert_eq!(diff(&[1.0, 3.0, 2.0]), vec![2.0, -1.0]);
        assert!(diff(&[1.0]).is_empty());
        assert_eq!(min_max(&[3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
    }

    #[test]
    fn test_clamp_similarity() {
        assert_eq!(clamp_similarity(120.0), 100.0);
        assert_eq!(clamp_similarity(-3.0), 0.0);
        assert_eq!(clamp_similarity(f64::NAN), 0.0);
    }
}

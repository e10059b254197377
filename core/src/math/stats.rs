pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }

    /// Mean over the non-NaN values.
    pub fn mean_ignoring_nan(samples: &[f64]) -> Option<f64> {
        let finite: Vec<f64> = samples.iter().copied().filter(|v| !v.is_nan()).collect();
        Self::mean(&finite)
    }

    /// Minimum and maximum, NaN ignored.
    pub fn min_max(samples: &[f64]) -> Option<(f64, f64)> {
        samples
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Quartiles (q1, median, q3) using linear interpolation between ranks.
    pub fn quartiles(samples: &[f64]) -> Option<(f64, f64, f64)> {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some((
            percentile(&sorted, 0.25),
            percentile(&sorted, 0.5),
            percentile(&sorted, 0.75),
        ))
    }
}

fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    sorted[lo] * (1.0 - weight) + sorted[hi] * weight
}

pub fn lin_to_db(value: f64) -> f64 {
    10.0 * value.log10()
}

pub fn watt_to_dbm(value: f64) -> f64 {
    10.0 * (1000.0 * value).log10()
}

/// Rounds to three decimals, the resolution used by generated trajectories.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Shortest round-trip representation that always carries a decimal
/// point, e.g. `1.0` rather than `1`.
pub fn decimal(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_handles_empty_and_nan() {
        assert_eq!(StatsHelper::mean(&[]), None);
        assert_eq!(StatsHelper::mean(&[1.0, 3.0]), Some(2.0));
        assert_eq!(StatsHelper::mean_ignoring_nan(&[f64::NAN, 4.0]), Some(4.0));
    }

    #[test]
    fn min_max_skips_nan() {
        assert_eq!(
            StatsHelper::min_max(&[2.0, f64::NAN, -1.0, 5.0]),
            Some((-1.0, 5.0))
        );
        assert_eq!(StatsHelper::min_max(&[f64::NAN]), None);
    }

    #[test]
    fn quartiles_interpolate() {
        let (q1, median, q3) = StatsHelper::quartiles(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!((q1, median, q3), (2.0, 3.0, 4.0));
    }

    #[test]
    fn decibel_conversions() {
        assert!((lin_to_db(100.0) - 20.0).abs() < 1e-12);
        assert!((watt_to_dbm(1.0) - 30.0).abs() < 1e-12);
        assert_eq!(round3(1.23456), 1.235);
    }

    #[test]
    fn decimal_keeps_a_fraction() {
        assert_eq!(decimal(1.0), "1.0");
        assert_eq!(decimal(-20.0), "-20.0");
        assert_eq!(decimal(41.8836718276551), "41.8836718276551");
    }
}

//! Statistic reducer: one scalar summary per sample.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::stats;

/// Anything carrying a numeric observation.
///
/// Lets the reducer run over plain values and over tagged records
/// (animated dots, two-group nodes) alike.
pub trait Observation {
    fn value(&self) -> f64;
}

impl Observation for f64 {
    fn value(&self) -> f64 {
        *self
    }
}

impl<T: Observation + ?Sized> Observation for &T {
    fn value(&self) -> f64 {
        (**self).value()
    }
}

/// Summary statistic applied to each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticKind {
    #[default]
    Mean,
    Median,
    /// Midhinge: (Q1 + Q3) / 2.
    Q1Q3,
    /// Midrange: (min + max) / 2.
    Range,
}

impl StatisticKind {
    pub const ALL: [StatisticKind; 4] = [
        StatisticKind::Mean,
        StatisticKind::Median,
        StatisticKind::Q1Q3,
        StatisticKind::Range,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StatisticKind::Mean => "mean",
            StatisticKind::Median => "median",
            StatisticKind::Q1Q3 => "q1q3",
            StatisticKind::Range => "range",
        }
    }

    /// Histogram x-axis label.
    pub fn label(self) -> &'static str {
        match self {
            StatisticKind::Mean => "Sample Mean",
            StatisticKind::Median => "Sample Median",
            StatisticKind::Q1Q3 => "Sample Midhinge",
            StatisticKind::Range => "Sample Midrange",
        }
    }

    /// Reduces `sample` to a single value.
    ///
    /// An empty sample yields NaN.
    ///
    /// # Examples
    /// ```
    /// use u_sampling::statistic::StatisticKind;
    /// let s = [0.1, 0.9, 0.2, 0.4];
    /// assert!((StatisticKind::Mean.reduce(&s) - 0.4).abs() < 1e-15);
    /// assert!((StatisticKind::Range.reduce(&s) - 0.5).abs() < 1e-15);
    /// ```
    pub fn reduce<T: Observation>(self, sample: &[T]) -> f64 {
        let values: Vec<f64> = sample.iter().map(Observation::value).collect();
        self.reduce_values(&values)
    }

    fn reduce_values(self, values: &[f64]) -> f64 {
        let reduced = match self {
            StatisticKind::Mean => stats::mean(values),
            StatisticKind::Median => stats::median(values),
            StatisticKind::Q1Q3 => stats::sorted_copy(values).and_then(|sorted| {
                let q1 = stats::quantile_sorted(&sorted, 0.25)?;
                let q3 = stats::quantile_sorted(&sorted, 0.75)?;
                Some((q1 + q3) / 2.0)
            }),
            StatisticKind::Range => stats::extent(values).map(|(lo, hi)| (lo + hi) / 2.0),
        };
        reduced.unwrap_or(f64::NAN)
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatisticKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(StatisticKind::Mean),
            "median" => Ok(StatisticKind::Median),
            "q1q3" => Ok(StatisticKind::Q1Q3),
            "range" => Ok(StatisticKind::Range),
            _ => Err(SimError::InvalidSelection {
                kind: "statistic",
                value: s.to_string(),
                expected: "mean, median, q1q3, range",
            }),
        }
    }
}

/// Difference of group means, `mean(b) − mean(a)`.
///
/// NaN when either group is empty.
pub fn mean_difference<A: Observation, B: Observation>(a: &[A], b: &[B]) -> f64 {
    StatisticKind::Mean.reduce(b) - StatisticKind::Mean.reduce(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagged {
        id: usize,
        value: f64,
    }

    impl Observation for Tagged {
        fn value(&self) -> f64 {
            self.value
        }
    }

    #[test]
    fn test_mean() {
        let s = [1.0, 2.0, 3.0, 6.0];
        assert!((StatisticKind::Mean.reduce(&s) - 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_median() {
        assert_eq!(StatisticKind::Median.reduce(&[5.0, 1.0, 3.0]), 3.0);
        assert_eq!(StatisticKind::Median.reduce(&[5.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_q1q3_midhinge() {
        // R-7 quartiles of 1..=4: 1.75 and 3.25
        let s = [4.0, 2.0, 1.0, 3.0];
        assert!((StatisticKind::Q1Q3.reduce(&s) - 2.5).abs() < 1e-15);
        // Skewed data pulls the midhinge away from the median
        let s = [0.0, 0.0, 0.0, 1.0, 10.0];
        assert!((StatisticKind::Q1Q3.reduce(&s) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_range_is_midrange() {
        let s = [0.3, 0.9, 0.1, 0.5];
        assert!((StatisticKind::Range.reduce(&s) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_single_observation() {
        for kind in StatisticKind::ALL {
            assert_eq!(kind.reduce(&[0.42]), 0.42, "{kind}");
        }
    }

    #[test]
    fn test_empty_is_nan() {
        let empty: [f64; 0] = [];
        for kind in StatisticKind::ALL {
            assert!(kind.reduce(&empty).is_nan(), "{kind}");
        }
    }

    #[test]
    fn test_tagged_records() {
        let records: Vec<Tagged> = [0.2, 0.4, 0.9]
            .iter()
            .enumerate()
            .map(|(id, &value)| Tagged { id, value })
            .collect();
        assert_eq!(records[2].id, 2);
        assert!((StatisticKind::Mean.reduce(&records) - 0.5).abs() < 1e-15);
        assert!((StatisticKind::Range.reduce(&records) - 0.55).abs() < 1e-15);
    }

    #[test]
    fn test_parse() {
        assert_eq!("mean".parse::<StatisticKind>(), Ok(StatisticKind::Mean));
        assert_eq!("Q1Q3".parse::<StatisticKind>(), Ok(StatisticKind::Q1Q3));
        assert!(matches!(
            "mode".parse::<StatisticKind>(),
            Err(SimError::InvalidSelection { kind: "statistic", .. })
        ));
    }

    #[test]
    fn test_mean_difference_sign() {
        let a = [0.0, 1.0];
        let b = [2.0, 3.0];
        assert!((mean_difference(&a, &b) - 2.0).abs() < 1e-15);
        assert!((mean_difference(&b, &a) + 2.0).abs() < 1e-15);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn mean_matches_arithmetic_mean(
            data in proptest::collection::vec(-1e3_f64..1e3, 1..100),
        ) {
            let naive = data.iter().sum::<f64>() / data.len() as f64;
            prop_assert!((StatisticKind::Mean.reduce(&data) - naive).abs() < 1e-9);
        }

        #[test]
        fn range_matches_min_max(
            data in proptest::collection::vec(-1e3_f64..1e3, 1..100),
        ) {
            let lo = data.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(StatisticKind::Range.reduce(&data), (lo + hi) / 2.0);
        }

        #[test]
        fn every_statistic_within_extent(
            data in proptest::collection::vec(0.0_f64..1.0, 1..100),
            which in 0_usize..4,
        ) {
            let v = StatisticKind::ALL[which].reduce(&data);
            let lo = data.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(v >= lo - 1e-12 && v <= hi + 1e-12);
        }
    }
}

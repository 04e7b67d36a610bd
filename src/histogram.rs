//! Histogram accumulator.
//!
//! An append-only sequence of statistic values. Binning is recomputed
//! from the whole sequence on every [`Histogram::render`]; nothing is
//! cached between renders, so rendering twice without appending yields
//! identical bins.

use crate::stats;

/// Where bin edges come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinDomain {
    /// Fixed `[lo, hi]`; values outside are kept but not binned.
    Fixed { lo: f64, hi: f64 },
    /// Data extent, or `[fallback_lo, fallback_hi]` while empty.
    Extent { fallback_lo: f64, fallback_hi: f64 },
}

/// One equal-width bin, `[x0, x1)` except the last, which is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub x0: f64,
    pub x1: f64,
    pub count: usize,
}

/// Everything a renderer needs to draw the histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramFrame {
    pub domain: (f64, f64),
    pub bins: Vec<Bin>,
    /// Largest bin count (y-axis extent).
    pub max_count: usize,
    /// Values in the sequence, binned or not.
    pub total: usize,
}

/// Running summary of the accumulated values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Histogram {
    values: Vec<f64>,
    domain: BinDomain,
    bin_count: usize,
}

impl Histogram {
    /// A `bin_count` of 0 is treated as 1.
    pub fn new(domain: BinDomain, bin_count: usize) -> Self {
        Self {
            values: Vec::new(),
            domain,
            bin_count: bin_count.max(1),
        }
    }

    pub fn append(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn append_batch(&mut self, values: &[f64]) {
        self.values.extend_from_slice(values);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Current `[lo, hi]` the bins span.
    ///
    /// A zero-width data extent is widened by 0.5 on each side.
    pub fn domain(&self) -> (f64, f64) {
        match self.domain {
            BinDomain::Fixed { lo, hi } => (lo, hi),
            BinDomain::Extent {
                fallback_lo,
                fallback_hi,
            } => {
                let finite: Vec<f64> = self
                    .values
                    .iter()
                    .copied()
                    .filter(|v| v.is_finite())
                    .collect();
                match stats::extent(&finite) {
                    Some((lo, hi)) if hi > lo => (lo, hi),
                    Some((lo, _)) => (lo - 0.5, lo + 0.5),
                    None => (fallback_lo, fallback_hi),
                }
            }
        }
    }

    /// Bins the full sequence.
    ///
    /// # Examples
    /// ```
    /// use u_sampling::histogram::{BinDomain, Histogram};
    /// let mut h = Histogram::new(BinDomain::Fixed { lo: 0.0, hi: 1.0 }, 4);
    /// h.append_batch(&[0.1, 0.2, 0.6, 1.0, 1.5]);
    /// let frame = h.render();
    /// let counts: Vec<usize> = frame.bins.iter().map(|b| b.count).collect();
    /// assert_eq!(counts, vec![2, 0, 1, 1]);
    /// assert_eq!(frame.total, 5);
    /// ```
    pub fn render(&self) -> HistogramFrame {
        let (lo, hi) = self.domain();
        let n = self.bin_count;
        let width = (hi - lo) / n as f64;
        let mut bins: Vec<Bin> = (0..n)
            .map(|i| Bin {
                x0: lo + i as f64 * width,
                x1: if i + 1 == n {
                    hi
                } else {
                    lo + (i + 1) as f64 * width
                },
                count: 0,
            })
            .collect();

        if width > 0.0 {
            for &v in &self.values {
                if !(lo..=hi).contains(&v) {
                    continue;
                }
                let idx = (((v - lo) / width).floor() as usize).min(n - 1);
                bins[idx].count += 1;
            }
        }

        let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);
        HistogramFrame {
            domain: (lo, hi),
            bins,
            max_count,
            total: self.values.len(),
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            count: self.values.len(),
            mean: stats::mean(&self.values),
            std_dev: stats::std_dev(&self.values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(bins: usize) -> Histogram {
        Histogram::new(BinDomain::Fixed { lo: 0.0, hi: 1.0 }, bins)
    }

    #[test]
    fn test_empty_render() {
        let frame = unit(41).render();
        assert_eq!(frame.bins.len(), 41);
        assert_eq!(frame.max_count, 0);
        assert_eq!(frame.total, 0);
    }

    #[test]
    fn test_bin_edges_cover_domain() {
        let frame = unit(41).render();
        assert_eq!(frame.bins[0].x0, 0.0);
        assert_eq!(frame.bins[40].x1, 1.0);
        for pair in frame.bins.windows(2) {
            assert_eq!(pair[0].x1, pair[1].x0);
        }
    }

    #[test]
    fn test_upper_edge_in_last_bin() {
        let mut h = unit(10);
        h.append(1.0);
        assert_eq!(h.render().bins[9].count, 1);
    }

    #[test]
    fn test_out_of_domain_kept_not_binned() {
        let mut h = unit(10);
        h.append_batch(&[-0.01, 0.5, 1.01]);
        let frame = h.render();
        assert_eq!(frame.total, 3);
        assert_eq!(frame.bins.iter().map(|b| b.count).sum::<usize>(), 1);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_render_idempotent() {
        let mut h = unit(41);
        h.append_batch(&[0.1, 0.11, 0.5, 0.77, 0.5]);
        assert_eq!(h.render(), h.render());
    }

    #[test]
    fn test_clear() {
        let mut h = unit(5);
        h.append_batch(&[0.1, 0.2]);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.render().max_count, 0);
    }

    #[test]
    fn test_extent_fallback_when_empty() {
        let h = Histogram::new(
            BinDomain::Extent {
                fallback_lo: -10.0,
                fallback_hi: 10.0,
            },
            25,
        );
        assert_eq!(h.domain(), (-10.0, 10.0));
    }

    #[test]
    fn test_extent_follows_data() {
        let mut h = Histogram::new(
            BinDomain::Extent {
                fallback_lo: -10.0,
                fallback_hi: 10.0,
            },
            25,
        );
        h.append_batch(&[-1.5, 0.25, 2.0]);
        assert_eq!(h.domain(), (-1.5, 2.0));
        let frame = h.render();
        assert_eq!(frame.bins.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_extent_degenerate_widened() {
        let mut h = Histogram::new(
            BinDomain::Extent {
                fallback_lo: -10.0,
                fallback_hi: 10.0,
            },
            25,
        );
        h.append_batch(&[3.0, 3.0]);
        assert_eq!(h.domain(), (2.5, 3.5));
        assert_eq!(h.render().max_count, 2);
    }

    #[test]
    fn test_zero_bins_clamped() {
        let h = unit(0);
        assert_eq!(h.bin_count(), 1);
    }

    #[test]
    fn test_summary() {
        let mut h = unit(5);
        assert_eq!(h.summary().mean, None);
        h.append_batch(&[0.2, 0.4, 0.6]);
        let s = h.summary();
        assert_eq!(s.count, 3);
        assert!((s.mean.unwrap() - 0.4).abs() < 1e-15);
        assert!((s.std_dev.unwrap() - 0.2).abs() < 1e-12);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn in_domain_values_all_binned(
            data in proptest::collection::vec(0.0_f64..=1.0, 0..300),
            bins in 1_usize..60,
        ) {
            let mut h = Histogram::new(BinDomain::Fixed { lo: 0.0, hi: 1.0 }, bins);
            h.append_batch(&data);
            let frame = h.render();
            prop_assert_eq!(frame.bins.iter().map(|b| b.count).sum::<usize>(), data.len());
        }

        #[test]
        fn extent_domain_bins_everything(
            data in proptest::collection::vec(-50.0_f64..50.0, 1..300),
        ) {
            let mut h = Histogram::new(
                BinDomain::Extent { fallback_lo: -10.0, fallback_hi: 10.0 },
                25,
            );
            h.append_batch(&data);
            let frame = h.render();
            prop_assert_eq!(frame.bins.iter().map(|b| b.count).sum::<usize>(), data.len());
        }

        #[test]
        fn render_is_idempotent(
            data in proptest::collection::vec(-0.5_f64..1.5, 0..200),
        ) {
            let mut h = Histogram::new(BinDomain::Fixed { lo: 0.0, hi: 1.0 }, 41);
            h.append_batch(&data);
            prop_assert_eq!(h.render(), h.render());
        }
    }
}

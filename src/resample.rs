//! Two-group bootstrap test of a mean difference.
//!
//! Two normal samples A and B are generated and recentered so their means
//! are exactly the configured ones. Under the null hypothesis both come
//! from one population, so each bootstrap draw takes `|A|` and `|B|`
//! observations with replacement from the pooled data and records
//! `mean(B') − mean(A')`. The p-value is the share of draws at least as
//! extreme as the observed difference, in either direction.
//!
//! # Node roles
//!
//! ```text
//!   SplitA ┐          ┌ ResampleA   (copies from the last draw,
//!   SplitB ┼─ pool ───┤              display only)
//!   Pooled ┘          └ ResampleB
//! ```
//!
//! Only pool roles take part in a draw. Each bootstrap run drops the
//! previous display copies before drawing.

use std::fmt;

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::TwoGroupConfig;
use crate::distributions::{draw_group_sample, GroupParams};
use crate::error::{Result, SimError};
use crate::histogram::{BinDomain, Histogram};
use crate::random;
use crate::render::{Overlay, Renderer};
use crate::statistic::{mean_difference, Observation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupId {
    A,
    B,
}

impl GroupId {
    pub fn label(self) -> &'static str {
        match self {
            GroupId::A => "A",
            GroupId::B => "B",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    SplitA,
    SplitB,
    Pooled,
    ResampleA,
    ResampleB,
}

impl Role {
    /// Whether a node with this role is drawn from.
    pub fn in_pool(self) -> bool {
        matches!(self, Role::SplitA | Role::SplitB | Role::Pooled)
    }

    fn split(group: GroupId) -> Self {
        match group {
            GroupId::A => Role::SplitA,
            GroupId::B => Role::SplitB,
        }
    }
}

/// One observation of the two-group demo.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// `A0`, `A1`, ... / `B0`, `B1`, ...; display copies keep their
    /// source's id.
    pub id: String,
    pub group: GroupId,
    pub role: Role,
    pub value: f64,
}

impl Observation for Node {
    fn value(&self) -> f64 {
        self.value
    }
}

/// One resample: pool indices for each group and the resulting
/// difference.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub a: Vec<usize>,
    pub b: Vec<usize>,
    pub difference: f64,
}

/// Tail counter for resampled mean differences.
#[derive(Debug, Clone)]
pub struct ResampleEngine {
    observed: f64,
    tail_count: usize,
    total_draws: usize,
}

impl ResampleEngine {
    pub fn new(observed: f64) -> Self {
        Self {
            observed,
            tail_count: 0,
            total_draws: 0,
        }
    }

    pub fn observed(&self) -> f64 {
        self.observed
    }

    pub fn tail_count(&self) -> usize {
        self.tail_count
    }

    pub fn total_draws(&self) -> usize {
        self.total_draws
    }

    /// `|difference| ≥ |observed|`.
    pub fn is_extreme(&self, difference: f64) -> bool {
        difference.abs() >= self.observed.abs()
    }

    /// Share of draws at least as extreme as the observed difference.
    /// `None` before the first draw.
    pub fn p_value(&self) -> Option<f64> {
        (self.total_draws > 0).then(|| self.tail_count as f64 / self.total_draws as f64)
    }

    /// Forgets all draws and sets a new observed difference.
    pub fn reset(&mut self, observed: f64) {
        *self = Self::new(observed);
    }

    /// Draws `size_a` and `size_b` pool members with replacement and
    /// records the difference of their means.
    ///
    /// Returns `None` when the pool is empty.
    pub fn draw<T: Observation, R: Rng>(
        &mut self,
        pool: &[T],
        size_a: usize,
        size_b: usize,
        rng: &mut R,
    ) -> Option<Draw> {
        if pool.is_empty() {
            return None;
        }
        let a = random::draw_with_replacement(pool.len(), size_a, rng);
        let b = random::draw_with_replacement(pool.len(), size_b, rng);
        let pick = |idx: &[usize]| idx.iter().map(|&i| &pool[i]).collect::<Vec<&T>>();
        let difference = mean_difference(&pick(&a), &pick(&b));

        self.total_draws += 1;
        if self.is_extreme(difference) {
            self.tail_count += 1;
        }
        Some(Draw { a, b, difference })
    }
}

/// Draw count and p-value as shown next to the histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapSummary {
    pub total_draws: usize,
    pub tail_count: usize,
    pub p_value: Option<f64>,
}

impl fmt::Display for BootstrapSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.p_value {
            Some(p) => write!(f, "resamples: {}  p-value: {p:.3}", self.total_draws),
            None => write!(f, "resamples: {}  p-value: -", self.total_draws),
        }
    }
}

pub struct TwoGroupSession {
    config: TwoGroupConfig,
    group_a: GroupParams,
    group_b: GroupParams,
    rng: SmallRng,
    nodes: Vec<Node>,
    engine: ResampleEngine,
    histogram: Histogram,
    dirty: bool,
}

impl TwoGroupSession {
    /// # Errors
    /// [`SimError::InvalidParameter`] when either group's parameters are
    /// invalid.
    pub fn new(config: TwoGroupConfig, seed: Option<u64>) -> Result<Self> {
        let mut session = Self {
            group_a: config.group_a,
            group_b: config.group_b,
            rng: random::rng_from(seed),
            nodes: Vec::new(),
            engine: ResampleEngine::new(config.group_b.mean - config.group_a.mean),
            histogram: Histogram::new(
                BinDomain::Extent {
                    fallback_lo: config.fallback_lo,
                    fallback_hi: config.fallback_hi,
                },
                config.bins,
            ),
            dirty: true,
            config,
        };
        session.regenerate()?;
        Ok(session)
    }

    pub fn config(&self) -> &TwoGroupConfig {
        &self.config
    }

    pub fn group_params(&self) -> (GroupParams, GroupParams) {
        (self.group_a, self.group_b)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Nodes that take part in the next draw.
    pub fn pool(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.role.in_pool())
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// `mean(B) − mean(A)` as configured; equal to the realized difference
    /// because both groups are recentered.
    pub fn observed_difference(&self) -> f64 {
        self.engine.observed()
    }

    pub fn total_draws(&self) -> usize {
        self.engine.total_draws()
    }

    pub fn tail_count(&self) -> usize {
        self.engine.tail_count()
    }

    pub fn p_value(&self) -> Option<f64> {
        self.engine.p_value()
    }

    pub fn summary(&self) -> BootstrapSummary {
        BootstrapSummary {
            total_draws: self.engine.total_draws(),
            tail_count: self.engine.tail_count(),
            p_value: self.engine.p_value(),
        }
    }

    /// Reference lines at `±|observed|`.
    pub fn overlay(&self) -> Overlay {
        Overlay::symmetric(self.observed_difference().abs())
    }

    /// Runs `draws` resamples from the pool and appends their differences
    /// to the histogram. The last draw's members are kept as display
    /// copies.
    ///
    /// # Errors
    /// [`SimError::InvalidParameter`] when `draws == 0`.
    pub fn bootstrap(&mut self, draws: usize) -> Result<BootstrapSummary> {
        if draws == 0 {
            let err = SimError::InvalidParameter("bootstrap draw count must be > 0".into());
            warn!(%err, "bootstrap rejected");
            return Err(err);
        }
        self.nodes.retain(|n| n.role.in_pool());

        let mut differences = Vec::with_capacity(draws);
        let mut last = None;
        let (size_a, size_b) = (self.group_a.size, self.group_b.size);
        for _ in 0..draws {
            let Some(draw) = self.engine.draw(&self.nodes, size_a, size_b, &mut self.rng) else {
                break;
            };
            differences.push(draw.difference);
            last = Some(draw);
        }
        self.histogram.append_batch(&differences);

        if let Some(draw) = last {
            let copies = |idx: &[usize], role: Role| -> Vec<Node> {
                idx.iter()
                    .map(|&i| Node {
                        role,
                        ..self.nodes[i].clone()
                    })
                    .collect()
            };
            let mut display = copies(&draw.a, Role::ResampleA);
            display.extend(copies(&draw.b, Role::ResampleB));
            self.nodes.extend(display);
        }
        self.dirty = true;

        let summary = self.summary();
        info!(
            draws = differences.len(),
            total = summary.total_draws,
            tail = summary.tail_count,
            p_value = summary.p_value,
            "bootstrap finished"
        );
        Ok(summary)
    }

    /// Moves every pool node into one combined group.
    pub fn gather(&mut self) {
        for node in self.nodes.iter_mut().filter(|n| n.role.in_pool()) {
            node.role = Role::Pooled;
        }
        self.dirty = true;
        debug!("groups gathered");
    }

    /// Moves every pool node back to its own group.
    pub fn split(&mut self) {
        for node in self.nodes.iter_mut().filter(|n| n.role.in_pool()) {
            node.role = Role::split(node.group);
        }
        self.dirty = true;
        debug!("groups split");
    }

    /// Regenerates both groups with new parameters and clears every draw.
    ///
    /// # Errors
    /// [`SimError::InvalidParameter`] for invalid parameters; the session
    /// is left unchanged.
    pub fn reset_all(&mut self, group_a: GroupParams, group_b: GroupParams) -> Result<()> {
        for params in [&group_a, &group_b] {
            params
                .validate()
                .inspect_err(|err| warn!(%err, "reset rejected"))?;
        }
        self.group_a = group_a;
        self.group_b = group_b;
        self.regenerate()?;
        info!(
            size_a = group_a.size,
            size_b = group_b.size,
            observed = self.observed_difference(),
            "groups regenerated"
        );
        Ok(())
    }

    /// Redraws histogram, overlay and nodes if anything changed.
    pub fn on_frame<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        if !self.dirty {
            return;
        }
        renderer.draw_histogram(&self.histogram.render());
        renderer.draw_overlay(&self.overlay());
        renderer.draw_nodes(&self.nodes);
        self.dirty = false;
    }

    fn regenerate(&mut self) -> Result<()> {
        let a = draw_group_sample(&self.group_a, &mut self.rng)?;
        let b = draw_group_sample(&self.group_b, &mut self.rng)?;
        let make = |group: GroupId, values: Vec<f64>| {
            values.into_iter().enumerate().map(move |(i, value)| Node {
                id: format!("{}{i}", group.label()),
                group,
                role: Role::split(group),
                value,
            })
        };
        self.nodes = make(GroupId::A, a).chain(make(GroupId::B, b)).collect();
        self.engine.reset(self.group_b.mean - self.group_a.mean);
        self.histogram.clear();
        self.dirty = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::render::Recorder;

    fn session() -> TwoGroupSession {
        TwoGroupSession::new(TwoGroupConfig::default(), Some(11)).unwrap()
    }

    #[test]
    fn test_generated_nodes() {
        let s = session();
        assert_eq!(s.nodes().len(), 60);
        assert_eq!(s.nodes()[0].id, "A0");
        assert_eq!(s.nodes()[30].id, "B0");
        assert!(s.nodes()[..30].iter().all(|n| n.role == Role::SplitA));
        assert!(s.nodes()[30..].iter().all(|n| n.role == Role::SplitB));

        let a: Vec<&Node> = s.nodes().iter().filter(|n| n.group == GroupId::A).collect();
        let b: Vec<&Node> = s.nodes().iter().filter(|n| n.group == GroupId::B).collect();
        assert!((mean_difference(&a, &b) - 2.0).abs() < 1e-9);
        assert_eq!(s.observed_difference(), 2.0);
    }

    #[test]
    fn test_p_value_none_before_draws() {
        let s = session();
        assert_eq!(s.p_value(), None);
        assert_eq!(s.summary().to_string(), "resamples: 0  p-value: -");
    }

    #[test]
    fn test_bootstrap_counts() {
        let mut s = session();
        let summary = s.bootstrap(250).unwrap();
        assert_eq!(summary.total_draws, 250);
        assert_eq!(s.histogram().len(), 250);
        let p = s.p_value().unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert_eq!(p, s.tail_count() as f64 / s.total_draws() as f64);

        s.bootstrap(50).unwrap();
        assert_eq!(s.total_draws(), 300);
        assert_eq!(s.histogram().len(), 300);
    }

    #[test]
    fn test_tail_count_matches_histogram() {
        let mut s = session();
        s.bootstrap(400).unwrap();
        let observed = s.observed_difference().abs();
        let extreme = s
            .histogram()
            .values()
            .iter()
            .filter(|d| d.abs() >= observed)
            .count();
        assert_eq!(extreme, s.tail_count());
    }

    #[test]
    fn test_display_copies_replaced() {
        let mut s = session();
        s.bootstrap(10).unwrap();
        assert_eq!(s.nodes().len(), 120);
        assert_eq!(
            s.nodes().iter().filter(|n| n.role == Role::ResampleA).count(),
            30
        );
        s.bootstrap(10).unwrap();
        assert_eq!(s.nodes().len(), 120);
        assert_eq!(s.pool().count(), 60);
    }

    #[test]
    fn test_zero_draws_rejected() {
        let mut s = session();
        assert!(matches!(s.bootstrap(0), Err(SimError::InvalidParameter(_))));
        assert_eq!(s.total_draws(), 0);
    }

    #[test]
    fn test_equal_means_every_draw_extreme() {
        let mut cfg = TwoGroupConfig::default();
        cfg.group_b.mean = 0.0;
        let mut s = TwoGroupSession::new(cfg, Some(5)).unwrap();
        s.bootstrap(100).unwrap();
        assert_eq!(s.p_value(), Some(1.0));
    }

    #[test]
    fn test_gather_and_split() {
        let mut s = session();
        s.bootstrap(5).unwrap();
        s.gather();
        assert!(s.pool().all(|n| n.role == Role::Pooled));
        assert_eq!(
            s.nodes().iter().filter(|n| !n.role.in_pool()).count(),
            60,
            "display copies untouched"
        );
        s.split();
        assert!(s.pool().all(|n| n.role == Role::split(n.group)));
    }

    #[test]
    fn test_reset_all() {
        let mut s = session();
        s.gather();
        s.bootstrap(20).unwrap();
        let a = GroupParams::new(10, 1.0, 0.5).unwrap();
        let b = GroupParams::new(15, 1.5, 2.0).unwrap();
        s.reset_all(a, b).unwrap();
        assert_eq!(s.nodes().len(), 25);
        assert!(s.nodes().iter().all(|n| n.role == Role::split(n.group)));
        assert_eq!(s.total_draws(), 0);
        assert!(s.histogram().is_empty());
        assert_eq!(s.observed_difference(), 0.5);
    }

    #[test]
    fn test_reset_all_rejects_invalid() {
        let mut s = session();
        let before = s.nodes().to_vec();
        let bad = GroupParams {
            size: 0,
            mean: 0.0,
            variance: 1.0,
        };
        assert!(s.reset_all(bad, s.group_params().1).is_err());
        assert_eq!(s.nodes(), &before[..]);
    }

    #[test]
    fn test_overlay_and_render() {
        let mut s = session();
        let overlay = s.overlay();
        assert_eq!(overlay.lines, [-2.0, 2.0]);
        assert_eq!(overlay.labels, ["-2.00".to_string(), "2.00".to_string()]);

        s.bootstrap(30).unwrap();
        let mut r = Recorder::default();
        s.on_frame(&mut r);
        assert_eq!(r.histogram.as_ref().map(|h| h.total), Some(30));
        assert_eq!(r.histogram.as_ref().map(|h| h.bins.len()), Some(25));
        assert_eq!(r.overlay, Some(overlay));
        assert_eq!(r.nodes.len(), 120);

        s.on_frame(&mut r);
        assert_eq!(r.histogram_draws, 1, "clean session not redrawn");
    }

    #[test]
    fn test_engine_empty_pool() {
        let mut engine = ResampleEngine::new(1.0);
        let mut rng = create_rng(0);
        let empty: [f64; 0] = [];
        assert!(engine.draw(&empty, 3, 3, &mut rng).is_none());
        assert_eq!(engine.p_value(), None);
    }

    #[test]
    fn test_engine_draw_sizes() {
        let mut engine = ResampleEngine::new(0.25);
        let mut rng = create_rng(3);
        let pool = [0.0, 1.0, 2.0, 3.0];
        let draw = engine.draw(&pool, 2, 5, &mut rng).unwrap();
        assert_eq!(draw.a.len(), 2);
        assert_eq!(draw.b.len(), 5);
        assert_eq!(engine.total_draws(), 1);
        assert_eq!(engine.tail_count(), usize::from(draw.difference.abs() >= 0.25));
    }
}

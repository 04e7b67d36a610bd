//! Sampling-distribution (CLT) session.
//!
//! One [`CltSession`] holds everything the demo needs between host
//! callbacks: the selected population and statistic, the sample size, the
//! histogram of collected statistics, the animation sequencer and at most
//! one in-flight batch.
//!
//! # Batches
//!
//! `run_simulation(B)` draws `B` samples of the current size. The first
//! `min(visible_cap, B)` are animated; their statistics are committed to
//! the histogram once the drop phase finishes. The remaining samples are
//! queued and reduced one chunk per [`CltSession::on_idle`] call, after
//! the visible commit.
//!
//! Starting a batch while another is in flight flushes the older one
//! (everything it drew is committed immediately). A reset or a parameter
//! change cancels it instead, and nothing it drew reaches the histogram.

use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::animation::{Dot, Phase, Sequencer, SequencerEvent, SequencerState, ShapeMorph};
use crate::config::CltConfig;
use crate::distributions::{Population, SHAPE_RESOLUTION};
use crate::error::{Result, SimError};
use crate::histogram::{BinDomain, Histogram};
use crate::random;
use crate::render::{DotScene, Renderer};
use crate::schedule::{ChunkQueue, Completion, Status};
use crate::statistic::StatisticKind;

/// A batch that has not been fully committed yet.
struct ActiveBatch {
    generation: u64,
    /// Statistics of the animated samples, taken on commit.
    visible: Option<Vec<f64>>,
    hidden: ChunkQueue<Vec<f64>>,
    completion: Completion,
    repetitions: usize,
}

struct Morph {
    phase: ShapeMorph,
    completion: Completion,
}

pub struct CltSession {
    config: CltConfig,
    population: Population,
    statistic: StatisticKind,
    sample_size: usize,
    speed: f64,
    rng: SmallRng,
    histogram: Histogram,
    sequencer: Sequencer,
    shape: Vec<f64>,
    morph: Option<Morph>,
    active: Option<ActiveBatch>,
    population_dirty: bool,
    histogram_dirty: bool,
}

impl CltSession {
    /// # Errors
    /// [`SimError::InvalidParameter`] for a zero sample size or a
    /// non-positive speed.
    pub fn new(config: CltConfig, seed: Option<u64>) -> Result<Self> {
        check_sample_size(config.sample_size)?;
        check_speed(config.speed)?;
        Ok(Self {
            population: config.distribution,
            statistic: config.statistic,
            sample_size: config.sample_size,
            speed: config.speed,
            rng: random::rng_from(seed),
            histogram: Histogram::new(BinDomain::Fixed { lo: 0.0, hi: 1.0 }, config.bins),
            sequencer: Sequencer::new(config.stage, config.speed),
            shape: config.distribution.shape(SHAPE_RESOLUTION),
            morph: None,
            active: None,
            population_dirty: true,
            histogram_dirty: true,
            config,
        })
    }

    pub fn config(&self) -> &CltConfig {
        &self.config
    }

    pub fn population(&self) -> Population {
        self.population
    }

    pub fn statistic(&self) -> StatisticKind {
        self.statistic
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Histogram x-axis label for the current statistic.
    pub fn axis_label(&self) -> &'static str {
        self.statistic.label()
    }

    /// Population shape as currently drawn (mid-morph if one is running).
    pub fn shape(&self) -> &[f64] {
        &self.shape
    }

    pub fn sequencer_state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn dots(&self) -> &[Dot] {
        self.sequencer.dots()
    }

    /// Hidden chunks still queued for the in-flight batch.
    pub fn pending_chunks(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |batch| batch.hidden.chunks_remaining())
    }

    /// Whether any animation, chunk or redraw is outstanding.
    pub fn has_pending_work(&self) -> bool {
        self.active.is_some()
            || self.morph.is_some()
            || self.sequencer.is_busy()
            || self.population_dirty
            || self.histogram_dirty
    }

    /// Runs the configured single-repetition batch.
    pub fn run_single(&mut self) -> Completion {
        self.run_simulation(self.config.repetition_count)
    }

    /// Runs the configured many-repetition batch.
    pub fn run_many(&mut self) -> Completion {
        self.run_simulation(self.config.many_count)
    }

    /// Draws `repetitions` samples and starts animating the visible ones.
    ///
    /// The returned completion settles as `Done` once every statistic of
    /// the batch is in the histogram, or `Cancelled` if a reset or a
    /// parameter change intervenes. Zero repetitions is a no-op.
    pub fn run_simulation(&mut self, repetitions: usize) -> Completion {
        if repetitions == 0 {
            return Completion::settled(Status::Done);
        }
        self.flush_active();

        let mut visible: Vec<Vec<f64>> = (0..repetitions)
            .map(|_| self.population.draw_sample(self.sample_size, &mut self.rng))
            .collect();
        let hidden = visible.split_off(self.config.visible_cap.min(repetitions));
        let statistics: Vec<f64> = visible.iter().map(|s| self.statistic.reduce(s)).collect();

        let mut queue = ChunkQueue::new(self.config.chunk_size);
        queue.extend(hidden);
        let generation = self.sequencer.begin(&visible, &statistics);
        info!(
            generation,
            repetitions,
            visible = visible.len(),
            hidden_chunks = queue.chunks_remaining(),
            population = %self.population,
            statistic = %self.statistic,
            n = self.sample_size,
            "batch started"
        );

        let completion = Completion::pending();
        self.active = Some(ActiveBatch {
            generation,
            visible: (!visible.is_empty()).then_some(statistics),
            hidden: queue,
            completion: completion.clone(),
            repetitions,
        });
        self.settle_if_drained();
        completion
    }

    /// Cancels the in-flight batch and empties the histogram.
    pub fn reset_visualization(&mut self) {
        self.cancel_active();
        self.histogram.clear();
        self.histogram_dirty = true;
        debug!("visualization reset");
    }

    /// Switches the population by name and morphs the drawn shape.
    ///
    /// # Errors
    /// [`SimError::InvalidSelection`] for an unknown name; the current
    /// population is kept.
    pub fn change_distribution(&mut self, name: &str) -> Result<Completion> {
        let population = name.parse::<Population>().inspect_err(|err| {
            warn!(%err, "distribution change rejected");
        })?;
        Ok(self.set_population(population))
    }

    /// Switches the population, resets the histogram and starts a shape
    /// morph. The completion settles when the morph ends.
    pub fn set_population(&mut self, population: Population) -> Completion {
        let previous = self.population;
        self.population = population;
        self.reset_visualization();
        if let Some(old) = self.morph.take() {
            old.completion.cancel();
        }

        let target = population.shape(SHAPE_RESOLUTION);
        self.population_dirty = true;
        if previous == population {
            self.shape = target;
            return Completion::settled(Status::Done);
        }

        info!(from = %previous, to = %population, "distribution changed");
        let completion = Completion::pending();
        let duration = self.config.morph_ms / 1000.0;
        self.morph = Some(Morph {
            phase: ShapeMorph::new(self.shape.clone(), target, duration),
            completion: completion.clone(),
        });
        completion
    }

    /// # Errors
    /// [`SimError::InvalidSelection`] for an unknown name; the current
    /// statistic is kept.
    pub fn change_statistic(&mut self, name: &str) -> Result<()> {
        let statistic = name.parse::<StatisticKind>().inspect_err(|err| {
            warn!(%err, "statistic change rejected");
        })?;
        self.set_statistic(statistic);
        Ok(())
    }

    pub fn set_statistic(&mut self, statistic: StatisticKind) {
        info!(from = %self.statistic, to = %statistic, "statistic changed");
        self.statistic = statistic;
        self.reset_visualization();
    }

    /// # Errors
    /// [`SimError::InvalidParameter`] when `n == 0`.
    pub fn change_sample_size(&mut self, n: usize) -> Result<()> {
        check_sample_size(n).inspect_err(|err| warn!(%err, "sample size change rejected"))?;
        info!(from = self.sample_size, to = n, "sample size changed");
        self.sample_size = n;
        self.reset_visualization();
        Ok(())
    }

    /// Sets the animation speed multiplier. Takes effect from the next
    /// phase; the running phase keeps its increment.
    ///
    /// # Errors
    /// [`SimError::InvalidParameter`] unless `speed` is finite and > 0.
    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        check_speed(speed).inspect_err(|err| warn!(%err, "speed change rejected"))?;
        self.speed = speed;
        self.sequencer.set_speed(speed);
        Ok(())
    }

    /// Display-refresh callback: steps the shape morph and the dot
    /// sequence by one tick and redraws what changed.
    pub fn on_frame<R: Renderer + ?Sized>(&mut self, dt: f64, renderer: &mut R) {
        if let Some(morph) = self.morph.as_mut() {
            if morph.phase.advance(&mut self.shape, dt) {
                morph.completion.finish();
                self.morph = None;
                debug!("shape morph finished");
            }
            self.population_dirty = true;
        }

        let animating = self.sequencer.is_busy();
        if animating {
            if let SequencerEvent::Finished { generation } = self.sequencer.tick(dt) {
                self.commit_visible(generation);
            }
        }

        if self.population_dirty || animating {
            renderer.draw_population(&self.shape);
            self.population_dirty = false;
        }
        if animating {
            renderer.draw_dots(&DotScene {
                stage: self.sequencer.stage(),
                state: self.sequencer.state(),
                dots: self.sequencer.dots(),
            });
        }
        if self.histogram_dirty {
            renderer.draw_histogram(&self.histogram.render());
            self.histogram_dirty = false;
        }
    }

    /// Deferred-turn callback: commits one hidden chunk, if the visible
    /// part of the batch is already in. Returns whether work remains.
    pub fn on_idle<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> bool {
        if let Some(batch) = self.active.as_mut() {
            if batch.visible.is_none() {
                if let Some(chunk) = batch.hidden.next_chunk() {
                    let statistics: Vec<f64> =
                        chunk.iter().map(|s| self.statistic.reduce(s)).collect();
                    self.histogram.append_batch(&statistics);
                    debug!(
                        generation = batch.generation,
                        committed = statistics.len(),
                        chunks_left = batch.hidden.chunks_remaining(),
                        "hidden chunk committed"
                    );
                    renderer.draw_histogram(&self.histogram.render());
                    self.histogram_dirty = false;
                }
            }
        }
        self.settle_if_drained();
        self.has_pending_work()
    }

    /// Pumps frames and idle turns until nothing is outstanding.
    pub fn run_until_idle<R: Renderer + ?Sized>(&mut self, dt: f64, renderer: &mut R) {
        while self.has_pending_work() {
            self.on_frame(dt, renderer);
            self.on_idle(renderer);
        }
    }

    fn commit_visible(&mut self, generation: u64) {
        let Some(batch) = self.active.as_mut() else {
            return;
        };
        if batch.generation != generation {
            debug!(generation, current = batch.generation, "stale sequence ignored");
            return;
        }
        if let Some(statistics) = batch.visible.take() {
            self.histogram.append_batch(&statistics);
            self.histogram_dirty = true;
            debug!(generation, committed = statistics.len(), "visible samples committed");
        }
        self.settle_if_drained();
    }

    fn settle_if_drained(&mut self) {
        let drained = self
            .active
            .as_ref()
            .is_some_and(|batch| batch.visible.is_none() && batch.hidden.is_empty());
        if !drained {
            return;
        }
        if let Some(batch) = self.active.take() {
            batch.completion.finish();
            info!(
                generation = batch.generation,
                repetitions = batch.repetitions,
                total = self.histogram.len(),
                "batch finished"
            );
        }
    }

    /// Commits everything the in-flight batch drew, without animation.
    fn flush_active(&mut self) {
        let Some(mut batch) = self.active.take() else {
            return;
        };
        self.sequencer.cancel();
        let mut statistics = batch.visible.take().unwrap_or_default();
        statistics.extend(
            batch
                .hidden
                .drain_all()
                .iter()
                .map(|s| self.statistic.reduce(s)),
        );
        self.histogram.append_batch(&statistics);
        self.histogram_dirty = true;
        batch.completion.finish();
        info!(
            generation = batch.generation,
            committed = statistics.len(),
            "batch flushed"
        );
    }

    fn cancel_active(&mut self) {
        self.sequencer.cancel();
        if let Some(batch) = self.active.take() {
            batch.completion.cancel();
            info!(generation = batch.generation, "batch cancelled");
        }
    }
}

fn check_sample_size(n: usize) -> Result<()> {
    if n == 0 {
        return Err(SimError::InvalidParameter("sample size must be > 0".into()));
    }
    Ok(())
}

fn check_speed(speed: f64) -> Result<()> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "speed must be finite and > 0, got {speed}"
        )));
    }
    Ok(())
}

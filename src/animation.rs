//! Animation sequencer.
//!
//! A batch's visible samples are animated as dots through three phases,
//! strictly in order:
//!
//! ```text
//! Idle → Falling → Coalescing → Dropping → Idle
//! ```
//!
//! Each phase owns one shared progress value in `[0, 1]` that advances by
//! a fixed per-tick increment (scaled by the speed multiplier) every
//! display refresh. Phases are plain objects stepped by [`Sequencer::tick`];
//! nothing runs between ticks.
//!
//! Every [`Sequencer::begin`] and [`Sequencer::cancel`] bumps a generation
//! counter. A `Finished` event carries the generation it belongs to, so a
//! caller can tell a completed batch from one that was superseded.
//!
//! [`ShapeMorph`] is the separate two-keyframe interpolation used when the
//! population shape changes. It is time-based rather than tick-based.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::statistic::Observation;

/// Per-tick progress increment of the falling phase at speed 1.
pub const FALL_STEP: f64 = 0.05;
/// Per-tick progress increment of the coalescing phase at speed 1.
pub const COALESCE_STEP: f64 = 0.08;
/// Per-tick progress increment of the dropping phase at speed 1.
pub const DROP_STEP: f64 = 0.15;
/// Duration of a population shape morph, in seconds.
pub const MORPH_SECONDS: f64 = 0.3;

/// Logical drawing area the dot coordinates live in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default = "Stage::default_width")]
    pub width: f64,
    #[serde(default = "Stage::default_height")]
    pub height: f64,
    #[serde(default = "Stage::default_dot_radius")]
    pub dot_radius: f64,
}

impl Stage {
    fn default_width() -> f64 {
        900.0
    }
    fn default_height() -> f64 {
        250.0
    }
    fn default_dot_radius() -> f64 {
        10.0
    }

    /// Resting height of the dots between falling and dropping.
    pub fn midline(&self) -> f64 {
        self.height / 2.0 - self.dot_radius
    }

    /// Horizontal position of a value in `[0, 1]`.
    pub fn x_of(&self, value: f64) -> f64 {
        value * self.width
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            dot_radius: Self::default_dot_radius(),
        }
    }
}

/// One animated observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dot {
    pub value: f64,
    /// Index of the sample this dot belongs to within the visible batch.
    pub sample: usize,
    pub x: f64,
    pub y: f64,
    pub target_x: f64,
}

impl Observation for Dot {
    fn value(&self) -> f64 {
        self.value
    }
}

/// A time-boxed interpolation stepped once per tick.
pub trait Phase<T: ?Sized> {
    /// Advances by one tick of `dt` seconds and updates `target`.
    /// Returns `true` once progress has reached 1.
    fn advance(&mut self, target: &mut T, dt: f64) -> bool;

    fn progress(&self) -> f64;
}

/// Shared progress counter driven by a fixed increment per tick.
#[derive(Debug, Clone, Copy)]
struct TickProgress {
    ticks: u32,
    step: f64,
}

impl TickProgress {
    fn new(step: f64) -> Self {
        Self { ticks: 0, step }
    }

    fn bump(&mut self) -> f64 {
        self.ticks = self.ticks.saturating_add(1);
        self.value()
    }

    fn value(&self) -> f64 {
        (self.ticks as f64 * self.step).min(1.0)
    }
}

/// Dots fall from the top edge to the midline.
#[derive(Debug, Clone)]
pub struct Falling {
    progress: TickProgress,
    midline: f64,
}

impl Falling {
    pub fn new(stage: &Stage, speed: f64) -> Self {
        Self {
            progress: TickProgress::new(FALL_STEP * speed),
            midline: stage.midline(),
        }
    }
}

impl Phase<[Dot]> for Falling {
    fn advance(&mut self, dots: &mut [Dot], _dt: f64) -> bool {
        let p = self.progress.bump();
        for dot in dots.iter_mut() {
            dot.y = p * self.midline;
        }
        p >= 1.0
    }

    fn progress(&self) -> f64 {
        self.progress.value()
    }
}

/// Dots slide horizontally onto their sample's statistic.
#[derive(Debug, Clone)]
pub struct Coalescing {
    progress: TickProgress,
}

impl Coalescing {
    /// Assigns every dot the target of its sample.
    ///
    /// `targets[i]` is the horizontal position of sample `i`'s statistic.
    /// Dots whose sample has no target keep their position.
    pub fn new(dots: &mut [Dot], targets: &[f64], speed: f64) -> Self {
        for dot in dots.iter_mut() {
            dot.target_x = targets.get(dot.sample).copied().unwrap_or(dot.x);
        }
        Self {
            progress: TickProgress::new(COALESCE_STEP * speed),
        }
    }
}

impl Phase<[Dot]> for Coalescing {
    fn advance(&mut self, dots: &mut [Dot], _dt: f64) -> bool {
        let p = self.progress.bump();
        for dot in dots.iter_mut() {
            dot.x += (dot.target_x - dot.x) * p;
        }
        p >= 1.0
    }

    fn progress(&self) -> f64 {
        self.progress.value()
    }
}

/// Dots drop from the midline out of view.
#[derive(Debug, Clone)]
pub struct Dropping {
    progress: TickProgress,
    midline: f64,
    fall: f64,
}

impl Dropping {
    pub fn new(stage: &Stage, speed: f64) -> Self {
        Self {
            progress: TickProgress::new(DROP_STEP * speed),
            midline: stage.midline(),
            fall: stage.height / 2.0,
        }
    }
}

impl Phase<[Dot]> for Dropping {
    fn advance(&mut self, dots: &mut [Dot], _dt: f64) -> bool {
        let p = self.progress.bump();
        for dot in dots.iter_mut() {
            dot.y = self.midline + p * self.fall;
        }
        p >= 1.0
    }

    fn progress(&self) -> f64 {
        self.progress.value()
    }
}

/// Linear interpolation between two population shapes over a fixed
/// duration.
#[derive(Debug, Clone)]
pub struct ShapeMorph {
    from: Vec<f64>,
    to: Vec<f64>,
    elapsed: f64,
    duration: f64,
}

impl ShapeMorph {
    /// Shapes of different lengths are interpolated over the shorter one.
    pub fn new(from: Vec<f64>, to: Vec<f64>, duration: f64) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration,
        }
    }

    pub fn target(&self) -> &[f64] {
        &self.to
    }

    /// Interpolated shape at progress `t`.
    pub fn at(&self, t: f64) -> Vec<f64> {
        if t >= 1.0 {
            return self.to.clone();
        }
        self.from
            .iter()
            .zip(&self.to)
            .map(|(a, b)| a + t * (b - a))
            .collect()
    }
}

impl Phase<Vec<f64>> for ShapeMorph {
    fn advance(&mut self, shape: &mut Vec<f64>, dt: f64) -> bool {
        self.elapsed += dt.max(0.0);
        let t = self.progress();
        *shape = self.at(t);
        t >= 1.0
    }

    fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequencerState {
    Idle,
    Falling,
    Coalescing,
    Dropping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    /// Nothing in flight.
    Idle,
    /// Ticked; the sequencer is now in the given state.
    Advanced(SequencerState),
    /// Dropping finished for the batch started at `generation`.
    Finished { generation: u64 },
}

/// Drives one batch of dots through fall, coalesce and drop.
pub struct Sequencer {
    stage: Stage,
    speed: f64,
    generation: u64,
    state: SequencerState,
    phase: Option<Box<dyn Phase<[Dot]>>>,
    dots: Vec<Dot>,
    targets: Vec<f64>,
}

impl Sequencer {
    pub fn new(stage: Stage, speed: f64) -> Self {
        Self {
            stage,
            speed,
            generation: 0,
            state: SequencerState::Idle,
            phase: None,
            dots: Vec::new(),
            targets: Vec::new(),
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_busy(&self) -> bool {
        self.state != SequencerState::Idle
    }

    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    /// Speed multiplier applied to phases created from now on.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Starts a new batch, discarding whatever was in flight.
    ///
    /// `statistics[i]` is the statistic of `samples[i]`. Returns the new
    /// generation. An empty batch leaves the sequencer idle.
    pub fn begin(&mut self, samples: &[Vec<f64>], statistics: &[f64]) -> u64 {
        self.cancel();
        if samples.is_empty() {
            return self.generation;
        }
        self.dots = samples
            .iter()
            .enumerate()
            .flat_map(|(sample, values)| {
                let stage = self.stage;
                values.iter().map(move |&value| Dot {
                    value,
                    sample,
                    x: stage.x_of(value),
                    y: 0.0,
                    target_x: stage.x_of(value),
                })
            })
            .collect();
        self.targets = statistics.iter().map(|&s| self.stage.x_of(s)).collect();
        self.phase = Some(Box::new(Falling::new(&self.stage, self.speed)));
        self.state = SequencerState::Falling;
        debug!(
            generation = self.generation,
            samples = samples.len(),
            dots = self.dots.len(),
            "sequencer: falling"
        );
        self.generation
    }

    /// Drops the in-flight phase and dots, invalidating the current
    /// generation.
    pub fn cancel(&mut self) {
        if self.is_busy() {
            debug!(generation = self.generation, state = ?self.state, "sequencer: cancelled");
        }
        self.generation += 1;
        self.state = SequencerState::Idle;
        self.phase = None;
        self.dots.clear();
        self.targets.clear();
    }

    /// Advances the current phase by one tick, moving to the next phase
    /// when it completes.
    pub fn tick(&mut self, dt: f64) -> SequencerEvent {
        let Some(phase) = self.phase.as_mut() else {
            return SequencerEvent::Idle;
        };
        if !phase.advance(&mut self.dots, dt) {
            return SequencerEvent::Advanced(self.state);
        }

        match self.state {
            SequencerState::Falling => {
                self.phase = Some(Box::new(Coalescing::new(
                    &mut self.dots,
                    &self.targets,
                    self.speed,
                )));
                self.state = SequencerState::Coalescing;
            }
            SequencerState::Coalescing => {
                self.phase = Some(Box::new(Dropping::new(&self.stage, self.speed)));
                self.state = SequencerState::Dropping;
            }
            SequencerState::Dropping => {
                let generation = self.generation;
                self.phase = None;
                self.state = SequencerState::Idle;
                self.dots.clear();
                self.targets.clear();
                debug!(generation, "sequencer: finished");
                return SequencerEvent::Finished { generation };
            }
            SequencerState::Idle => {
                self.phase = None;
                return SequencerEvent::Idle;
            }
        }
        debug!(generation = self.generation, state = ?self.state, "sequencer: phase change");
        SequencerEvent::Advanced(self.state)
    }
}

//! Rendering seam.
//!
//! Sessions never draw directly; they hand scene descriptions to a
//! [`Renderer`] supplied by the host. [`NullRenderer`] discards everything
//! and [`Recorder`] keeps the latest frame of each kind, which is enough
//! for text output and for inspecting what a session drew.

use crate::animation::{Dot, SequencerState, Stage};
use crate::histogram::HistogramFrame;
use crate::resample::Node;

/// Dots of the in-flight batch, ready to draw.
#[derive(Debug, Clone, Copy)]
pub struct DotScene<'a> {
    pub stage: &'a Stage,
    pub state: SequencerState,
    pub dots: &'a [Dot],
}

/// Vertical reference lines at `±observed` over the resample histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub lines: [f64; 2],
    pub labels: [String; 2],
}

impl Overlay {
    /// Lines at `-observed` and `+observed`, labelled to two decimals.
    pub fn symmetric(observed: f64) -> Self {
        let lines = [-observed, observed];
        Self {
            labels: lines.map(|x| format!("{x:.2}")),
            lines,
        }
    }
}

pub trait Renderer {
    /// Population shape, sampled on an even grid over `[0, 1]` and scaled
    /// to a peak of 1.
    fn draw_population(&mut self, shape: &[f64]);

    fn draw_dots(&mut self, scene: &DotScene<'_>);

    fn draw_histogram(&mut self, frame: &HistogramFrame);

    fn draw_overlay(&mut self, _overlay: &Overlay) {}

    fn draw_nodes(&mut self, _nodes: &[Node]) {}
}

/// Draws nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_population(&mut self, _shape: &[f64]) {}
    fn draw_dots(&mut self, _scene: &DotScene<'_>) {}
    fn draw_histogram(&mut self, _frame: &HistogramFrame) {}
}

/// Keeps the most recent frame of each kind and counts draw calls.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub population: Option<Vec<f64>>,
    pub dots: Vec<Dot>,
    pub histogram: Option<HistogramFrame>,
    pub overlay: Option<Overlay>,
    pub nodes: Vec<Node>,
    pub population_draws: usize,
    pub dot_draws: usize,
    pub histogram_draws: usize,
}

impl Renderer for Recorder {
    fn draw_population(&mut self, shape: &[f64]) {
        self.population = Some(shape.to_vec());
        self.population_draws += 1;
    }

    fn draw_dots(&mut self, scene: &DotScene<'_>) {
        self.dots = scene.dots.to_vec();
        self.dot_draws += 1;
    }

    fn draw_histogram(&mut self, frame: &HistogramFrame) {
        self.histogram = Some(frame.clone());
        self.histogram_draws += 1;
    }

    fn draw_overlay(&mut self, overlay: &Overlay) {
        self.overlay = Some(overlay.clone());
    }

    fn draw_nodes(&mut self, nodes: &[Node]) {
        self.nodes = nodes.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_labels() {
        let o = Overlay::symmetric(1.98765);
        assert_eq!(o.lines, [-1.98765, 1.98765]);
        assert_eq!(o.labels, ["-1.99".to_string(), "1.99".to_string()]);
    }

    #[test]
    fn test_overlay_negative_observed() {
        let o = Overlay::symmetric(-0.5);
        assert_eq!(o.labels, ["0.50".to_string(), "-0.50".to_string()]);
    }

    #[test]
    fn test_recorder_keeps_latest() {
        let mut r = Recorder::default();
        r.draw_population(&[0.0, 1.0]);
        r.draw_population(&[1.0, 0.0]);
        assert_eq!(r.population.as_deref(), Some(&[1.0, 0.0][..]));
        assert_eq!(r.population_draws, 2);
    }
}

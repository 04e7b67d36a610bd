//! # u-sampling
//!
//! Simulation core for two interactive statistics demos.
//!
//! - **Sampling distribution**: repeatedly draw samples of size N from a
//!   population, reduce each to a statistic and collect the statistics in
//!   a histogram. The first samples of each batch are animated as falling,
//!   coalescing and dropping dots; the rest are processed in chunks.
//! - **Two-group bootstrap**: resample pooled data from two groups to build
//!   the null distribution of the mean difference and report a two-sided
//!   p-value.
//!
//! The crate draws nothing itself. Hosts call `on_frame` / `on_idle` on a
//! session and receive scene descriptions through [`render::Renderer`].
//!
//! ## Modules
//!
//! - [`stats`] — Descriptive statistics with numerical stability guarantees
//! - [`special`] — Gamma/Beta functions and density formulas
//! - [`random`] — Seeded RNG and index draws over a pool
//! - [`distributions`] — Populations and the variate generator
//! - [`statistic`] — Per-sample statistic reducer
//! - [`histogram`] — Append-only histogram accumulator
//! - [`animation`] — Dot phases and the phase sequencer
//! - [`schedule`] — Completion handles and chunked deferred work
//! - [`render`] — Renderer trait and scene types
//! - [`clt`] — Sampling-distribution session
//! - [`resample`] — Two-group bootstrap session
//! - [`config`] — TOML configuration
//!
//! ## Design Philosophy
//!
//! - **Numerical stability first**: Welford's algorithm for variance,
//!   Kahan summation for accumulation
//! - **Host-driven**: no threads, no timers; all progress happens inside
//!   `on_frame` and `on_idle`
//! - **Property-based testing**: Statistical invariants verified via proptest

pub mod animation;
pub mod clt;
pub mod config;
pub mod distributions;
pub mod error;
pub mod histogram;
pub mod random;
pub mod render;
pub mod resample;
pub mod schedule;
pub mod special;
pub mod statistic;
pub mod stats;

pub use error::{Result, SimError};

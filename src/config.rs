//! Simulation configuration, loaded from TOML.
//!
//! Every field has a default, so a partial (or empty) file is valid.
//! [`SimConfig::load_or_default`] writes a fully commented default file
//! when none exists, which doubles as documentation of the available keys.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::animation::Stage;
use crate::distributions::{GroupParams, Population};
use crate::error::{Result, SimError};
use crate::statistic::StatisticKind;

/// Sampling-distribution demo settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CltConfig {
    #[serde(default = "CltConfig::default_sample_size")]
    pub sample_size: usize,
    /// Repetitions of the "single" run.
    #[serde(default = "CltConfig::default_repetition_count")]
    pub repetition_count: usize,
    /// Repetitions of the "many" run.
    #[serde(default = "CltConfig::default_many_count")]
    pub many_count: usize,
    #[serde(default)]
    pub statistic: StatisticKind,
    #[serde(default)]
    pub distribution: Population,
    #[serde(default = "CltConfig::default_speed")]
    pub speed: f64,
    /// Samples per batch that are animated; the rest are chunked.
    #[serde(default = "CltConfig::default_visible_cap")]
    pub visible_cap: usize,
    #[serde(default = "CltConfig::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "CltConfig::default_bins")]
    pub bins: usize,
    #[serde(default = "CltConfig::default_morph_ms")]
    pub morph_ms: f64,
    #[serde(default)]
    pub stage: Stage,
}

impl CltConfig {
    fn default_sample_size() -> usize {
        30
    }
    fn default_repetition_count() -> usize {
        1
    }
    fn default_many_count() -> usize {
        1000
    }
    fn default_speed() -> f64 {
        1.0
    }
    fn default_visible_cap() -> usize {
        30
    }
    fn default_chunk_size() -> usize {
        50
    }
    fn default_bins() -> usize {
        41
    }
    fn default_morph_ms() -> f64 {
        300.0
    }
}

impl Default for CltConfig {
    fn default() -> Self {
        Self {
            sample_size: Self::default_sample_size(),
            repetition_count: Self::default_repetition_count(),
            many_count: Self::default_many_count(),
            statistic: StatisticKind::default(),
            distribution: Population::default(),
            speed: Self::default_speed(),
            visible_cap: Self::default_visible_cap(),
            chunk_size: Self::default_chunk_size(),
            bins: Self::default_bins(),
            morph_ms: Self::default_morph_ms(),
            stage: Stage::default(),
        }
    }
}

/// Two-group bootstrap demo settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoGroupConfig {
    /// Draws per "bootstrap" run.
    #[serde(default = "TwoGroupConfig::default_draws")]
    pub draws: usize,
    #[serde(default = "TwoGroupConfig::default_bins")]
    pub bins: usize,
    /// Histogram domain used before any draw exists.
    #[serde(default = "TwoGroupConfig::default_fallback_lo")]
    pub fallback_lo: f64,
    #[serde(default = "TwoGroupConfig::default_fallback_hi")]
    pub fallback_hi: f64,
    /// Keys missing from `[two_group.group_a]` keep group A's defaults.
    #[serde(
        default = "TwoGroupConfig::default_group_a",
        deserialize_with = "group_a_or_default"
    )]
    pub group_a: GroupParams,
    #[serde(
        default = "TwoGroupConfig::default_group_b",
        deserialize_with = "group_b_or_default"
    )]
    pub group_b: GroupParams,
}

impl TwoGroupConfig {
    fn default_group_a() -> GroupParams {
        GroupParams {
            size: 30,
            mean: 0.0,
            variance: 1.0,
        }
    }
    fn default_group_b() -> GroupParams {
        GroupParams {
            size: 30,
            mean: 2.0,
            variance: 1.0,
        }
    }
    fn default_draws() -> usize {
        1000
    }
    fn default_bins() -> usize {
        25
    }
    fn default_fallback_lo() -> f64 {
        -10.0
    }
    fn default_fallback_hi() -> f64 {
        10.0
    }
}

/// A group table as written; any key may be missing.
#[derive(Debug, Default, Deserialize)]
struct GroupTable {
    size: Option<usize>,
    mean: Option<f64>,
    variance: Option<f64>,
}

impl GroupTable {
    fn over(self, base: GroupParams) -> GroupParams {
        GroupParams {
            size: self.size.unwrap_or(base.size),
            mean: self.mean.unwrap_or(base.mean),
            variance: self.variance.unwrap_or(base.variance),
        }
    }
}

fn group_a_or_default<'de, D>(deserializer: D) -> std::result::Result<GroupParams, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(GroupTable::deserialize(deserializer)?.over(TwoGroupConfig::default_group_a()))
}

fn group_b_or_default<'de, D>(deserializer: D) -> std::result::Result<GroupParams, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(GroupTable::deserialize(deserializer)?.over(TwoGroupConfig::default_group_b()))
}

impl Default for TwoGroupConfig {
    fn default() -> Self {
        Self {
            group_a: Self::default_group_a(),
            group_b: Self::default_group_b(),
            draws: Self::default_draws(),
            bins: Self::default_bins(),
            fallback_lo: Self::default_fallback_lo(),
            fallback_hi: Self::default_fallback_hi(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Fixed RNG seed; OS entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub clt: CltConfig,
    #[serde(default)]
    pub two_group: TwoGroupConfig,
}

impl SimConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    /// [`SimError::Config`] on malformed TOML or out-of-range values.
    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text).map_err(|e| SimError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses `path`.
    ///
    /// # Errors
    /// [`SimError::Config`] when the file cannot be read, parsed or
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Loads `path`, falling back to defaults on any error.
    ///
    /// When the file does not exist, the defaults are written to it with
    /// every key commented out.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            return match Self::load(path) {
                Ok(cfg) => {
                    info!(path = %path.display(), "loaded config");
                    cfg
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "using default config");
                    Self::default()
                }
            };
        }

        let defaults = Self::default();
        match toml::to_string_pretty(&defaults) {
            Ok(text) => {
                if let Err(err) = fs::write(path, comment_out(&text)) {
                    warn!(path = %path.display(), %err, "failed to write default config");
                }
            }
            Err(err) => warn!(%err, "failed to serialize default config"),
        }
        defaults
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    /// [`SimError::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let clt = &self.clt;
        let positive = [
            ("clt.sample_size", clt.sample_size),
            ("clt.repetition_count", clt.repetition_count),
            ("clt.many_count", clt.many_count),
            ("clt.chunk_size", clt.chunk_size),
            ("clt.bins", clt.bins),
            ("two_group.draws", self.two_group.draws),
            ("two_group.bins", self.two_group.bins),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(SimError::Config(format!("{key} must be > 0")));
            }
        }
        if !(clt.speed.is_finite() && clt.speed > 0.0) {
            return Err(SimError::Config(format!(
                "clt.speed must be > 0, got {}",
                clt.speed
            )));
        }
        if !(clt.morph_ms.is_finite() && clt.morph_ms >= 0.0) {
            return Err(SimError::Config(format!(
                "clt.morph_ms must be >= 0, got {}",
                clt.morph_ms
            )));
        }
        let stage = &clt.stage;
        if !(stage.width > 0.0 && stage.height > 0.0 && stage.dot_radius >= 0.0) {
            return Err(SimError::Config(format!(
                "clt.stage must have a positive size, got {}x{} r={}",
                stage.width, stage.height, stage.dot_radius
            )));
        }
        for (key, group) in [
            ("two_group.group_a", &self.two_group.group_a),
            ("two_group.group_b", &self.two_group.group_b),
        ] {
            group
                .validate()
                .map_err(|e| SimError::Config(format!("{key}: {e}")))?;
        }
        let tg = &self.two_group;
        if !(tg.fallback_lo < tg.fallback_hi) {
            return Err(SimError::Config(format!(
                "two_group fallback domain is empty: [{}, {}]",
                tg.fallback_lo, tg.fallback_hi
            )));
        }
        Ok(())
    }
}

/// Comments out every key line, keeping table headers and blank lines.
fn comment_out(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || (trimmed.starts_with('[') && trimmed.ends_with(']')) {
            out.push_str(line);
        } else {
            out.push_str("# ");
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

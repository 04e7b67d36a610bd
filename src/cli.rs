use clap::{Args as ClapArgs, Parser, Subcommand};

use u_sampling::distributions::Population;
use u_sampling::statistic::StatisticKind;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML (written with commented defaults if missing)
    #[arg(long, default_value = "u-sampling.toml", global = true)]
    pub config: String,

    /// RNG seed (overrides config)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the sampling distribution of a statistic
    Clt(CltArgs),
    /// Bootstrap the difference of two group means
    Diff(DiffArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CltArgs {
    /// Population: uniform, normal, left-skewed, right-skewed
    #[arg(long)]
    pub distribution: Option<Population>,

    /// Statistic: mean, median, q1q3, range
    #[arg(long)]
    pub statistic: Option<StatisticKind>,

    /// Observations per sample
    #[arg(long, short = 'n')]
    pub sample_size: Option<usize>,

    /// Samples to draw (defaults to the config's many_count)
    #[arg(long, short = 'b')]
    pub repetitions: Option<usize>,

    /// Animation speed multiplier
    #[arg(long)]
    pub speed: Option<f64>,

    /// Histogram bins
    #[arg(long)]
    pub bins: Option<usize>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DiffArgs {
    #[arg(long)]
    pub size_a: Option<usize>,
    #[arg(long)]
    pub mean_a: Option<f64>,
    #[arg(long)]
    pub var_a: Option<f64>,

    #[arg(long)]
    pub size_b: Option<usize>,
    #[arg(long)]
    pub mean_b: Option<f64>,
    #[arg(long)]
    pub var_b: Option<f64>,

    /// Bootstrap draws
    #[arg(long, short = 'd')]
    pub draws: Option<usize>,

    /// Pool both groups before drawing (display only)
    #[arg(long, default_value_t = false)]
    pub gather: bool,

    /// Histogram bins
    #[arg(long)]
    pub bins: Option<usize>,
}

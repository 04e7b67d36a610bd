// Entry point: runs one demo headless and prints the resulting histogram.
mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Args, CltArgs, Command, DiffArgs};
use u_sampling::clt::CltSession;
use u_sampling::config::SimConfig;
use u_sampling::distributions::GroupParams;
use u_sampling::histogram::HistogramFrame;
use u_sampling::render::Recorder;
use u_sampling::resample::TwoGroupSession;
use u_sampling::Result;

const FRAME_DT: f64 = 1.0 / 60.0;
const BAR_WIDTH: usize = 50;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let mut cfg = SimConfig::load_or_default(&args.config);
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }

    let result = match &args.command {
        Command::Clt(clt) => run_clt(cfg, clt),
        Command::Diff(diff) => run_diff(cfg, diff),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "run failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_clt(mut cfg: SimConfig, args: &CltArgs) -> Result<()> {
    let clt = &mut cfg.clt;
    if let Some(p) = args.distribution {
        clt.distribution = p;
    }
    if let Some(s) = args.statistic {
        clt.statistic = s;
    }
    if let Some(n) = args.sample_size {
        clt.sample_size = n;
    }
    if let Some(b) = args.repetitions {
        clt.many_count = b;
    }
    if let Some(speed) = args.speed {
        clt.speed = speed;
    }
    if let Some(bins) = args.bins {
        clt.bins = bins;
    }
    cfg.validate()?;

    let mut session = CltSession::new(cfg.clt.clone(), cfg.seed)?;
    let mut recorder = Recorder::default();
    let done = session.run_many();
    session.run_until_idle(FRAME_DT, &mut recorder);
    info!(status = ?done.status(), frames = recorder.dot_draws, "clt run complete");

    let frame = session.histogram().render();
    println!(
        "{} of {} samples (n = {}) from {} population",
        session.axis_label(),
        frame.total,
        session.sample_size(),
        session.population()
    );
    print_histogram(&frame);

    let summary = session.histogram().summary();
    if let (Some(mean), Some(sd)) = (summary.mean, summary.std_dev) {
        println!("count: {}  mean: {mean:.4}  sd: {sd:.4}", summary.count);
    }
    Ok(())
}

fn run_diff(mut cfg: SimConfig, args: &DiffArgs) -> Result<()> {
    let tg = &mut cfg.two_group;
    let override_group = |g: &mut GroupParams,
                          size: Option<usize>,
                          mean: Option<f64>,
                          var: Option<f64>| {
        if let Some(size) = size {
            g.size = size;
        }
        if let Some(mean) = mean {
            g.mean = mean;
        }
        if let Some(var) = var {
            g.variance = var;
        }
    };
    override_group(&mut tg.group_a, args.size_a, args.mean_a, args.var_a);
    override_group(&mut tg.group_b, args.size_b, args.mean_b, args.var_b);
    if let Some(draws) = args.draws {
        tg.draws = draws;
    }
    if let Some(bins) = args.bins {
        tg.bins = bins;
    }
    cfg.validate()?;

    let mut session = TwoGroupSession::new(cfg.two_group.clone(), cfg.seed)?;
    if args.gather {
        session.gather();
    }
    let summary = session.bootstrap(cfg.two_group.draws)?;
    let mut recorder = Recorder::default();
    session.on_frame(&mut recorder);

    println!(
        "Resampled mean difference (observed {:.2})",
        session.observed_difference()
    );
    if let Some(frame) = &recorder.histogram {
        print_histogram(frame);
    }
    if let Some(overlay) = &recorder.overlay {
        println!("limits: {}  {}", overlay.labels[0], overlay.labels[1]);
    }
    println!("{summary}");
    Ok(())
}

fn print_histogram(frame: &HistogramFrame) {
    let scale = if frame.max_count > 0 {
        BAR_WIDTH as f64 / frame.max_count as f64
    } else {
        0.0
    };
    for bin in &frame.bins {
        let len = (bin.count as f64 * scale).round() as usize;
        println!(
            "{:>9.3} {:>9.3} | {:<width$} {}",
            bin.x0,
            bin.x1,
            "#".repeat(len),
            bin.count,
            width = BAR_WIDTH
        );
    }
}

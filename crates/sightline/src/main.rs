use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sightline::SightlineConfig;
use sightline::tour::{TourDefinition, TourExecutor, TourExecutorConfig};
use sightline_core::Easing;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tour file (RON) to run
    #[arg(required_unless_present = "list_easings")]
    tour: Option<PathBuf>,

    /// Simulated frames per second (overrides config)
    #[arg(long)]
    fps: Option<u32>,

    /// Log the camera pose every N frames
    #[arg(long)]
    print_every: Option<usize>,

    /// Write the final viewpoints as a RON snapshot
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Write the tour report (RON)
    #[arg(long)]
    report_out: Option<PathBuf>,

    /// Config file to use instead of ./sightline.ron
    #[arg(long)]
    config: Option<PathBuf>,

    /// List every easing name and exit
    #[arg(long)]
    list_easings: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SightlineConfig::load_from(path)?,
        None => SightlineConfig::load()?,
    };

    // Initialize logging
    let default_filter = if config.debug.verbose_logging { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if args.list_easings {
        for easing in Easing::catalog() {
            println!("{}", easing);
        }
        return Ok(());
    }

    let Some(tour_path) = args.tour else {
        anyhow::bail!("No tour file given");
    };
    let tour = TourDefinition::from_file(&tour_path)?;

    let mut executor_config = TourExecutorConfig::from(&config);
    if let Some(fps) = args.fps {
        executor_config.fps = fps;
    }
    executor_config.print_every = args.print_every;

    log::info!("Running tour {} at {} fps", tour_path.display(), executor_config.fps);
    let report = TourExecutor::with_config(executor_config).execute_tour(&tour)?;
    println!("{}: {}", report.tour_name, report.summary());

    if let Some(path) = args.snapshot_out {
        let ron = report.snapshot.to_ron()?;
        std::fs::write(&path, ron)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
        log::info!("Wrote {} viewpoints to {}", report.snapshot.len(), path.display());
    }

    if let Some(path) = args.report_out {
        report.save_ron(&path)?;
        log::info!("Wrote report to {}", path.display());
    }

    Ok(())
}

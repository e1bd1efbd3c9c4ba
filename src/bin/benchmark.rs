use anyhow::{Context, Result};
use clap::Parser;
use grid_2048::config::{Config, LoadableConfig};
use grid_2048::harness::run_batch_seeded;
use grid_2048::logging;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "benchmark", version, about = "Random-policy statistics over many independent games")]
struct Args {
    /// TOML config with [board] and [benchmark] sections
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of episodes (overrides the config)
    #[arg(short = 'n', long)]
    episodes: Option<usize>,

    /// Base seed for reproducible batches
    #[arg(long)]
    seed: Option<u64>,

    /// Stop each episode after this many moves
    #[arg(long)]
    max_steps: Option<u64>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logger(if args.verbose { "debug" } else { "info" });

    let mut cfg = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(n) = args.episodes { cfg.benchmark.episodes = n; }
    if args.seed.is_some() { cfg.benchmark.seed = args.seed; }
    if args.max_steps.is_some() { cfg.benchmark.max_steps = args.max_steps; }
    if args.threads.is_some() { cfg.benchmark.threads = args.threads; }

    let pb = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new(cfg.benchmark.episodes as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
                .progress_chars("=>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    let start = Instant::now();
    let stats = run_batch_seeded(&cfg.board, &cfg.benchmark, pb.as_ref())?;
    if let Some(pb) = pb { pb.finish_and_clear(); }
    let elapsed = start.elapsed().as_secs_f64().max(1e-6);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{stats}");
        eprintln!(
            "{} games in {:.2}s ({:.1} games/sec), best score {}, best tile {}",
            stats.episodes,
            elapsed,
            stats.episodes as f64 / elapsed,
            stats.best_score,
            stats.best_tile
        );
    }
    Ok(())
}

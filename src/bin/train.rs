//! Training binary: builds the game tree, runs CFR and writes the strategy file.
//!
//! Usage:
//!   cargo run --release --bin train -- <ITERATIONS> <OUTPUT> [OPTIONS]
//!
//! Options:
//!   --game <FILE>            Game definition JSON (default: limit hold'em)
//!   --seed <N>               Random seed (optional)
//!   --threads <N>            Number of threads (default: auto)
//!   --parallel-depth <N>     Action-node depth explored in parallel
//!   --equity-samples <N>     Monte-Carlo samples per postflop bucket
//!   --quiet                  No progress bar
//!
//! Log verbosity follows `RUST_LOG` (default: info).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::error;

use limit_cfr::cfr::config::DEFAULT_PARALLEL_DEPTH;
use limit_cfr::cfr::{save_strategy, CfrTrainer, GameDefinition, TrainerConfig};
use limit_cfr::games::holdem::{AbstractionConfig, CardAbstraction, HandEvaluator};

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(about = "Train a limit poker strategy with CFR and write it to a file")]
struct Args {
    /// Number of CFR iterations to run
    iterations: u64,

    /// Strategy file to write
    output: PathBuf,

    /// Game definition JSON file (default: built-in limit hold'em)
    #[arg(long)]
    game: Option<PathBuf>,

    /// Random seed for the deck shuffles
    #[arg(long)]
    seed: Option<u64>,

    /// Number of worker threads (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Action-node depth down to which branches run in parallel
    #[arg(long, default_value_t = DEFAULT_PARALLEL_DEPTH)]
    parallel_depth: usize,

    /// Monte-Carlo samples per postflop bucket lookup
    #[arg(long, default_value_t = 200)]
    equity_samples: usize,

    /// Disable the progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), limit_cfr::Error> {
    let definition = match &args.game {
        Some(path) => GameDefinition::from_json_file(path)?,
        None => GameDefinition::limit_holdem(),
    };

    let abstraction = AbstractionConfig::new(definition.bucket_count())
        .with_equity_samples(args.equity_samples);
    abstraction.validate()?;

    let mut config = TrainerConfig::default().with_parallel_depth(args.parallel_depth);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }

    println!("=================================================");
    println!("  Limit CFR Trainer");
    println!("=================================================");
    println!();
    println!("Players: {}", definition.num_players());
    println!("Rounds: {}", definition.num_rounds());
    println!("Buckets: {}", definition.bucket_count());
    println!("Iterations: {}", args.iterations);
    if let Some(seed) = args.seed {
        println!("Seed: {}", seed);
    }
    println!("Output: {}", args.output.display());
    println!();

    let mut trainer = CfrTrainer::new(
        definition,
        CardAbstraction::with_config(abstraction),
        HandEvaluator::new(),
        config,
    )?;

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(args.iterations)
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})")
    {
        progress.set_style(style.progress_chars("#>-"));
    }

    let interval = (args.iterations / 200).max(1);
    let stats = trainer
        .train_with_callback(args.iterations, interval, |stats| {
            progress.set_position(stats.iterations);
            progress.set_message(format!("{:.0} it/s", stats.iterations_per_second));
        })?
        .clone();
    progress.finish_and_clear();

    save_strategy(trainer.tree(), trainer.iteration(), &args.output)?;

    println!();
    println!("Training complete!");
    println!("Iterations: {}", stats.iterations);
    println!("Action nodes: {}", stats.action_nodes);
    println!("Time: {:.2}s ({:.0} it/s)", stats.elapsed_seconds, stats.iterations_per_second);
    println!("Strategy saved to: {}", args.output.display());

    Ok(())
}

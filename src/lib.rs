use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Env};
use jigsaw_puzzle_slicer::{load_from_directory, PuzzleGenerator};
use log::{debug, info};

/// Make a jigsaw puzzle
#[derive(Debug, Parser)]
#[command(name = "jigsaw_slicer", version)]
pub struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a puzzle directory from an image
    Generate(GenerateArgs),
    /// Load a puzzle directory and report its geometry
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Input image to generate a puzzle from
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory for the output puzzle
    #[arg(short, long)]
    pub output: PathBuf,

    /// Piece size in pixels
    #[arg(short, long, default_value_t = 10)]
    pub size: u32,

    /// Reserved, does not change the pieces. Defaults to the current time
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Puzzle directory written by `generate`
    #[arg(short, long)]
    pub dir: PathBuf,
}

/// Sets up `env_logger`. `RUST_LOG` wins over `verbose`.
pub fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn now_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate(args) => generate(args),
        Command::Inspect(args) => inspect(args),
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let seed = args.seed.unwrap_or_else(now_seed);
    info!(
        "{} {} {} {}",
        args.input.display(),
        args.output.display(),
        args.size,
        seed
    );

    let puzzle = PuzzleGenerator::from_path(&args.input, args.size)
        .and_then(|generator| generator.seed(seed).generate())
        .with_context(|| format!("failed to build puzzle from {}", args.input.display()))?;
    puzzle
        .write_to_directory(&args.output)
        .with_context(|| format!("failed to write puzzle to {}", args.output.display()))?;
    Ok(())
}

fn inspect(args: InspectArgs) -> Result<()> {
    let puzzle = load_from_directory(&args.dir)
        .with_context(|| format!("failed to load puzzle from {}", args.dir.display()))?;
    if let Some(image) = puzzle.image() {
        debug!("original image {}x{}", image.width(), image.height());
    }
    info!(
        "{}: {} rows, {} cols, piece size {}, {} pieces",
        args.dir.display(),
        puzzle.rows(),
        puzzle.columns(),
        puzzle.piece_size(),
        puzzle.len()
    );
    Ok(())
}

//! VMAP CLI - Classify panoramic survey photos and build floor-plan layouts

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use rayon::ThreadPoolBuilder;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;
mod discovery;

use commands::batch::BatchCommand;
use commands::classify::ClassifyCommand;
use commands::layout::LayoutCommand;

#[derive(Parser)]
#[command(
    name = "vmap",
    version,
    about = "Panoramic photo space classifier and floor-plan layout tool",
    after_help = "EXAMPLES:\n  \
                  vmap classify IMG_0001.jpg\n  \
                  vmap batch ./survey --output summary.json --rename\n  \
                  vmap batch ./survey --format jsonl --sequential\n  \
                  vmap layout ./survey --layout serpentine --export-coords coords.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single image and print its record as JSON
    Classify(ClassifyCommand),

    /// Classify every image in a directory
    Batch(BatchCommand),

    /// Compute a floor-plan layout for the images in a directory
    Layout(LayoutCommand),
}

fn main() -> Result<()> {
    // Lets tests and constrained hosts cap parallelism
    if let Ok(threads_str) = std::env::var("VMAP_THREADS") {
        if let Ok(num_threads) = threads_str.parse::<usize>() {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .ok(); // Ignore error if already initialized
        }
    }

    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    // Logs go to stderr; stdout carries JSON output
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Classify(cmd) => cmd.execute(),
        Commands::Batch(cmd) => cmd.execute(),
        Commands::Layout(cmd) => cmd.execute(),
    }
}

mod commands;
mod downloader;
mod error;
mod logger;
mod models;
mod paths;
mod render;
mod report;
mod stats;
mod store;
mod takeout;
mod uploaders;
mod youtube_api;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ytrecap", version, about = "Statistics about your YouTube watch history")]
struct Cli {
    /// Show progress output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the watch history and render the report
    #[command(visible_alias = "analyze")]
    Run {
        /// Path to an unzipped Takeout folder downloaded from https://takeout.google.com/
        #[arg(short, long)]
        takeout: Option<PathBuf>,

        /// Directory for downloaded and computed data
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Seconds to wait between metadata requests
        #[arg(short, long, default_value_t = 0.0)]
        delay: f64,

        /// Rebuild the cached snapshot from the raw metadata files
        #[arg(long)]
        refresh: bool,

        /// Do not open the report in a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Set a config value
    Config { key: String, value: String },

    /// Show where data is stored
    Info {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run {
            takeout,
            out,
            delay,
            refresh,
            no_open,
        } => commands::run(commands::RunOptions {
            takeout,
            out,
            delay,
            refresh,
            no_open,
        }),
        Commands::Config { key, value } => commands::config(&key, &value),
        Commands::Info { out } => commands::info(out),
    }
}

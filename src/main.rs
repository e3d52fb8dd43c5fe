//! miniature - git-backed package loader and publisher
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use miniature::cli::{Cli, Commands};
use miniature::config::ConfigManager;
use miniature::error::MiniatureResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> MiniatureResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("miniature=warn"),
        1 => EnvFilter::new("miniature=info"),
        _ => EnvFilter::new("miniature=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let config_manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    let cache_dir = cli.cache_dir.or_else(|| config.cache.dir.clone());

    match cli.command {
        Commands::Load(args) => miniature::cli::commands::load(args, &config, cache_dir).await,
        Commands::LoadFromFile(args) => {
            miniature::cli::commands::load_from_file(args, cache_dir).await
        }
        Commands::Publish(args) => miniature::cli::commands::publish(args, cache_dir).await,
        Commands::TagPackage(args) => miniature::cli::commands::tag(args, cache_dir).await,
        Commands::Push(args) => miniature::cli::commands::push(args, cache_dir).await,
        Commands::Cache(args) => miniature::cli::commands::cache(args, cache_dir).await,
    }
}

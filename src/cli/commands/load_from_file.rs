//! Load-from-file command - bulk load packages from a manifest

use crate::cache::RepositoryCache;
use crate::cli::args::LoadFromFileArgs;
use crate::error::{MiniatureError, MiniatureResult};
use crate::loader;
use console::style;
use std::path::PathBuf;

/// Execute the load-from-file command
pub async fn execute(args: LoadFromFileArgs, cache_dir: Option<PathBuf>) -> MiniatureResult<()> {
    let mut cache = RepositoryCache::new(cache_dir)?;

    let selection = (!args.packages.is_empty()).then_some(args.packages.as_slice());
    let results =
        loader::load_from_manifest(&mut cache, &args.file, selection, args.clean).await?;

    if results.is_empty() {
        println!("No packages to load from {}", args.file.display());
        return Ok(());
    }

    let mut failed = 0;
    for outcome in &results {
        let name = outcome.package.as_deref().unwrap_or(&outcome.repo);
        if outcome.success {
            println!(
                "{} {} ({}) -> {}",
                style("✓").green().bold(),
                name,
                outcome.version,
                outcome.target_dir.display()
            );
            if let Some(hint) = &outcome.install_hint {
                println!("  Run '{hint}' to install the package");
            }
        } else {
            failed += 1;
            println!("{} {}: {}", style("✗").red().bold(), name, outcome.message);
        }
    }

    println!();
    println!("Loaded {} of {} package(s)", results.len() - failed, results.len());

    if failed > 0 {
        return Err(MiniatureError::User(format!(
            "{failed} of {} package(s) failed to load",
            results.len()
        )));
    }
    Ok(())
}

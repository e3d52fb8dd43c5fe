//! Cache command - inspect and prune the repository cache

use crate::cache::{CacheEntry, RepositoryCache};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::error::{MiniatureError, MiniatureResult};
use console::style;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;

/// Execute the cache command
pub async fn execute(args: CacheArgs, cache_dir: Option<PathBuf>) -> MiniatureResult<()> {
    let mut cache = RepositoryCache::new(cache_dir)?;

    match args.action {
        CacheAction::List { format } => list_repos(&cache, format),
        CacheAction::Remove { url } => remove_repo(&mut cache, &url),
        CacheAction::Clear { yes } => clear_cache(&mut cache, yes),
    }
}

fn list_repos(cache: &RepositoryCache, format: OutputFormat) -> MiniatureResult<()> {
    let repos = cache.list_cached_repos();

    match format {
        // an empty map still serializes as valid JSON ({})
        OutputFormat::Json => print_json(&repos)?,
        _ if repos.is_empty() => println!("No cached repositories."),
        OutputFormat::Table => print_table(&repos),
        OutputFormat::Plain => print_plain(&repos),
    }
    Ok(())
}

fn print_table(repos: &BTreeMap<String, CacheEntry>) {
    println!("{:<50} {:<12} {:<18} PATH", "REPOSITORY", "BRANCH", "UPDATED");
    println!("{}", "-".repeat(100));

    for (key, entry) in repos {
        let branch = entry.branch.as_deref().unwrap_or("-");
        let updated = entry.last_updated.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<50} {:<12} {:<18} {}",
            key,
            branch,
            updated,
            entry.path.display()
        );
    }

    println!();
    println!("Total: {} mirror(s)", repos.len());
}

fn print_json(repos: &BTreeMap<String, CacheEntry>) -> MiniatureResult<()> {
    println!("{}", serde_json::to_string_pretty(repos)?);
    Ok(())
}

fn print_plain(repos: &BTreeMap<String, CacheEntry>) {
    for key in repos.keys() {
        println!("{key}");
    }
}

fn remove_repo(cache: &mut RepositoryCache, url: &str) -> MiniatureResult<()> {
    cache.remove_repo(url)?;
    println!("{} Removed {url} from cache", style("✓").green().bold());
    Ok(())
}

fn clear_cache(cache: &mut RepositoryCache, yes: bool) -> MiniatureResult<()> {
    let count = cache.list_cached_repos().len();

    if !yes {
        print!("Delete {count} cached mirror(s) under {}? [y/N] ", cache.cache_dir().display());
        io::stdout()
            .flush()
            .map_err(|e| MiniatureError::io("flushing stdout", e))?;

        let mut answer = String::new();
        io::stdin()
            .read_line(&mut answer)
            .map_err(|e| MiniatureError::io("reading confirmation", e))?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    cache.clear_cache()?;
    println!("{} Cache cleared", style("✓").green().bold());
    Ok(())
}

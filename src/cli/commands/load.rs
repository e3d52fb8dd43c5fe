//! Load command - materialize one repository package

use crate::cache::RepositoryCache;
use crate::cli::args::LoadArgs;
use crate::config::Config;
use crate::error::{MiniatureError, MiniatureResult};
use crate::loader::{self, LoadOptions};
use console::style;
use std::path::PathBuf;

/// Execute the load command
pub async fn execute(
    args: LoadArgs,
    config: &Config,
    cache_dir: Option<PathBuf>,
) -> MiniatureResult<()> {
    let mut cache = RepositoryCache::new(cache_dir)?;

    let options = LoadOptions {
        repo: Some(args.repo),
        version: args.version,
        target_dir: args.target_dir,
        branch: args
            .branch
            .or_else(|| Some(config.git.default_branch.clone())),
        clean: args.clean,
        use_symlink: args.symlink,
    };

    let outcome = loader::load_package(&mut cache, None, &options).await;
    if !outcome.success {
        return Err(MiniatureError::User(outcome.message));
    }

    println!(
        "{} Loaded {} ({}) into {}",
        style("✓").green().bold(),
        outcome.repo,
        outcome.version,
        outcome.target_dir.display()
    );
    if let Some(hint) = &outcome.install_hint {
        println!("  Run '{hint}' to install the package");
    }
    Ok(())
}

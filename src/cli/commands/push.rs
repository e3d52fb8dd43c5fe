//! Push command - commit and push a package without tagging

use crate::cache::RepositoryCache;
use crate::cli::args::PushArgs;
use crate::error::{MiniatureError, MiniatureResult};
use crate::publisher;
use console::style;
use std::path::PathBuf;

/// Execute the push command
pub async fn execute(args: PushArgs, cache_dir: Option<PathBuf>) -> MiniatureResult<()> {
    let mut cache = RepositoryCache::new(cache_dir)?;

    let outcome = publisher::push_package(
        &mut cache,
        &args.package_dir,
        args.message.as_deref(),
        !args.no_push,
    )
    .await;

    if !outcome.success {
        return Err(MiniatureError::User(outcome.message));
    }

    println!("{} {}", style("✓").green().bold(), outcome.message);
    Ok(())
}

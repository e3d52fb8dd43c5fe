//! Publish command - copy, commit, tag, push a package

use crate::cache::RepositoryCache;
use crate::cli::args::PublishArgs;
use crate::error::{MiniatureError, MiniatureResult};
use crate::publisher::{self, PublishOptions};
use console::style;
use std::path::PathBuf;

/// Execute the publish command
pub async fn execute(args: PublishArgs, cache_dir: Option<PathBuf>) -> MiniatureResult<()> {
    let mut cache = RepositoryCache::new(cache_dir)?;

    let options = PublishOptions {
        commit_message: args.message,
        push: !args.no_push,
        tag: !args.no_tag,
        force_tag: args.force_tag,
    };

    let outcome = publisher::publish_package(&mut cache, &args.package_dir, &options).await;
    if !outcome.success {
        return Err(MiniatureError::User(outcome.message));
    }

    println!("{} {}", style("✓").green().bold(), outcome.message);
    Ok(())
}

//! Tag-package command - create a release tag from pkg.json

use crate::cache::RepositoryCache;
use crate::cli::args::TagPackageArgs;
use crate::error::MiniatureResult;
use crate::tags::{self, TagAction};
use console::style;
use std::path::PathBuf;

/// Execute the tag-package command
pub async fn execute(args: TagPackageArgs, cache_dir: Option<PathBuf>) -> MiniatureResult<()> {
    let mut cache = RepositoryCache::new(cache_dir)?;

    let outcome =
        tags::tag_package(&mut cache, &args.package_dir, args.force, !args.no_push).await?;

    let verb = match outcome.action {
        TagAction::Created => "created",
        TagAction::Updated => "updated",
    };
    println!(
        "{} Tag '{}' {}{}",
        style("✓").green().bold(),
        outcome.tag,
        verb,
        if args.no_push { "" } else { " and pushed" }
    );
    Ok(())
}

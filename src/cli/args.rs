//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// miniature - git-backed package loader and publisher
///
/// Loads package trees from git repositories at tagged versions and
/// publishes local package directories back, with a shared local
/// mirror cache.
#[derive(Parser, Debug)]
#[command(name = "miniature")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = crate::config::CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Cache directory override
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a package from a git repository
    Load(LoadArgs),

    /// Load packages declared in a manifest file
    LoadFromFile(LoadFromFileArgs),

    /// Publish a package directory: copy, commit, tag, push
    Publish(PublishArgs),

    /// Create a release tag for a package from its pkg.json
    TagPackage(TagPackageArgs),

    /// Commit and push a package directory without tagging
    Push(PushArgs),

    /// Manage the repository cache
    Cache(CacheArgs),
}

/// Arguments for the load command
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct LoadArgs {
    /// Repository URL
    pub repo: String,

    /// Version, constraint (e.g. ">=1.0.0,<2.0.0"), tag, commit, or "latest"
    #[arg(short = 'V', long)]
    pub version: Option<String>,

    /// Target directory (derived from the repository name if omitted)
    #[arg(short, long)]
    pub target_dir: Option<PathBuf>,

    /// Branch to track
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Remove an existing target directory first
    #[arg(long)]
    pub clean: bool,

    /// Symlink into the cache mirror instead of copying
    #[arg(long)]
    pub symlink: bool,
}

/// Arguments for the load-from-file command
#[derive(Parser, Debug)]
pub struct LoadFromFileArgs {
    /// Manifest file (pkg.json, miniature.json, or repotree.json)
    pub file: PathBuf,

    /// Only load the named packages (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub packages: Vec<String>,

    /// Remove existing target directories first
    #[arg(long)]
    pub clean: bool,
}

/// Arguments for the publish command
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// Package directory containing pkg.json
    #[arg(default_value = ".")]
    pub package_dir: PathBuf,

    /// Commit message (defaults to "Update <name> v<version>")
    #[arg(short, long)]
    pub message: Option<String>,

    /// Commit locally without pushing to the remote
    #[arg(long)]
    pub no_push: bool,

    /// Skip creating a release tag
    #[arg(long)]
    pub no_tag: bool,

    /// Overwrite an existing release tag
    #[arg(long)]
    pub force_tag: bool,
}

/// Arguments for the tag-package command
#[derive(Parser, Debug)]
pub struct TagPackageArgs {
    /// Package directory containing pkg.json
    #[arg(default_value = ".")]
    pub package_dir: PathBuf,

    /// Overwrite an existing tag
    #[arg(short, long)]
    pub force: bool,

    /// Create the tag locally without pushing to the remote
    #[arg(long)]
    pub no_push: bool,
}

/// Arguments for the push command
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Package directory containing pkg.json
    #[arg(default_value = ".")]
    pub package_dir: PathBuf,

    /// Commit message (defaults to "Update from <dirname>")
    #[arg(short, long)]
    pub message: Option<String>,

    /// Commit locally without pushing to the remote
    #[arg(long)]
    pub no_push: bool,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Cache action to perform
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommand actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached repositories
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Remove one repository's mirrors from the cache
    Remove {
        /// Repository URL to evict
        url: String,
    },

    /// Delete every cached mirror
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Output format for list-style commands
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Plain,
}

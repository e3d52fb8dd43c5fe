//! Version resolution against a repository working copy
//!
//! A version request is one of three things: the literal `latest`, a
//! direct reference (anything with a `/`, or a bare commit id), or a
//! constraint expression evaluated over the repository's tags.

use crate::error::{MiniatureError, MiniatureResult};
use crate::git::Git;
use crate::version;
use tracing::{debug, info};

/// Outcome of resolving a version request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// The tag, branch, or commit that was selected
    pub reference: String,

    /// Whether the working copy was moved to the reference
    ///
    /// False only for `latest` on a repository with no tags, where the
    /// currently active branch stands in for a version.
    pub checked_out: bool,
}

/// Shape of a version request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request<'a> {
    Latest,
    DirectRef(&'a str),
    Constraint(&'a str),
}

fn classify(request: &str) -> Request<'_> {
    let trimmed = request.trim();
    if trimmed.eq_ignore_ascii_case("latest") || trimmed.is_empty() {
        Request::Latest
    } else if trimmed.contains('/') || version::is_commit_id(trimmed) {
        Request::DirectRef(trimmed)
    } else {
        Request::Constraint(trimmed)
    }
}

/// Resolve a version request and check out the selected reference
///
/// `latest` on an untagged repository resolves to the current branch
/// name without touching the working copy; a constraint with no
/// matching tag fails naming the constraint.
pub async fn resolve(git: &Git, request: &str) -> MiniatureResult<ResolvedVersion> {
    match classify(request) {
        Request::Latest => {
            let tags = git.tags().await?;
            match version::find_latest(&tags) {
                Some(tag) => {
                    info!("Resolved latest to tag {tag}");
                    git.checkout(&tag).await?;
                    Ok(ResolvedVersion {
                        reference: tag,
                        checked_out: true,
                    })
                }
                None => {
                    let branch = git.current_branch().await?;
                    debug!("No tags; staying on branch {branch}");
                    Ok(ResolvedVersion {
                        reference: branch,
                        checked_out: false,
                    })
                }
            }
        }
        Request::DirectRef(reference) => {
            git.checkout(reference).await?;
            Ok(ResolvedVersion {
                reference: reference.to_string(),
                checked_out: true,
            })
        }
        Request::Constraint(constraint) => {
            let tags = git.tags().await?;
            let tag = version::find_matching(&tags, constraint).ok_or_else(|| {
                MiniatureError::VersionNotFound {
                    constraint: constraint.to_string(),
                }
            })?;
            info!("Resolved constraint {constraint} to tag {tag}");
            git.checkout(&tag).await?;
            Ok(ResolvedVersion {
                reference: tag,
                checked_out: true,
            })
        }
    }
}

//! Git operations abstraction layer
//!
//! The pipeline reads history but never writes to it. Everything it needs
//! from git goes through the [Repository] trait so targets can run against
//! [mock::MockRepository] in tests and [repository::Git2Repository] in CI.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::TaggedVersion;
use crate::error::{PipelineError, Result};

/// Tags found while walking back from HEAD
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagHistory {
    /// Every tag on the nearest tagged commit of each path, with its height
    pub tagged: Vec<TaggedVersion>,
    /// Height of the farthest root commit reached without crossing a tag
    pub root_height: u32,
}

/// Read-only git operations used by the pipeline targets
///
/// Implementations must be `Send + Sync` so a single context can be shared
/// by the async targets.
pub trait Repository: Send + Sync {
    /// Full hash of the HEAD commit
    fn head_commit(&self) -> Result<String>;

    /// Names of the tags pointing exactly at HEAD, sorted by name
    fn tags_at_head(&self) -> Result<Vec<String>>;

    /// Names of all tags merged into HEAD, sorted by name
    ///
    /// Same set and order as `git tag --merged HEAD`.
    fn merged_tags(&self) -> Result<Vec<String>>;

    /// Walk history back from HEAD, stopping at tagged commits
    fn tag_history(&self) -> Result<TagHistory>;

    /// Full message of the HEAD commit
    fn head_message(&self) -> Result<String>;

    /// URL of a configured remote
    fn remote_url(&self, remote: &str) -> Result<String>;
}

/// GitHub repository coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    pub owner: String,
    pub name: String,
}

impl GitHubRepo {
    /// Extract owner and name from a GitHub remote URL
    ///
    /// Accepts `https://github.com/owner/name(.git)`,
    /// `git@github.com:owner/name(.git)` and `ssh://git@github.com/owner/name`.
    pub fn from_remote_url(url: &str) -> Result<Self> {
        let url = url.trim();
        let path = match url.strip_prefix("git@") {
            Some(rest) => rest.split_once(':').map(|(_, path)| path),
            None => url
                .split_once("://")
                .and_then(|(_, rest)| rest.split_once('/'))
                .map(|(_, path)| path),
        };
        let path = path
            .ok_or_else(|| PipelineError::remote(format!("Unrecognized remote URL: {}", url)))?;

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        match path.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(GitHubRepo {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(PipelineError::remote(format!(
                "Remote URL does not name a GitHub repository: {}",
                url
            ))),
        }
    }
}

impl std::fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_repo_from_https_url() {
        let repo = GitHubRepo::from_remote_url("https://github.com/acme/widgets.git").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "widgets");
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn test_github_repo_from_ssh_url() {
        let repo = GitHubRepo::from_remote_url("git@github.com:acme/widgets.git").unwrap();
        assert_eq!(repo, GitHubRepo::from_remote_url("ssh://git@github.com/acme/widgets").unwrap());
        assert_eq!(repo.name, "widgets");
    }

    #[test]
    fn test_github_repo_without_suffix() {
        let repo = GitHubRepo::from_remote_url("https://github.com/acme/widgets/").unwrap();
        assert_eq!(repo.name, "widgets");
    }

    #[test]
    fn test_github_repo_invalid_url() {
        assert!(GitHubRepo::from_remote_url("not a url").is_err());
        assert!(GitHubRepo::from_remote_url("https://github.com/acme").is_err());
        assert!(GitHubRepo::from_remote_url("https://github.com/a/b/c").is_err());
    }
}

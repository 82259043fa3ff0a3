//! GitHub release host access

pub mod client;

pub use client::GitHubClient;

use serde::{Deserialize, Serialize};

use crate::git::GitHubRepo;
use crate::registry::RegistryError;

/// A release as returned by the GitHub API
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
}

/// Request body for creating a release
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewRelease {
    pub tag_name: String,
    pub name: String,
    pub generate_release_notes: bool,
    pub prerelease: bool,
}

/// Request body for editing an existing release
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReleaseUpdate {
    pub body: String,
    pub name: String,
    pub prerelease: bool,
}

/// Release operations the pipeline needs from the hosting service
#[async_trait::async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Generate release notes for a tag without creating a release
    async fn generate_release_notes(
        &self,
        repo: &GitHubRepo,
        tag: &str,
    ) -> Result<String, RegistryError>;

    /// Look up the release for a tag; `None` when there is none
    async fn release_by_tag(
        &self,
        repo: &GitHubRepo,
        tag: &str,
    ) -> Result<Option<Release>, RegistryError>;

    async fn create_release(
        &self,
        repo: &GitHubRepo,
        release: &NewRelease,
    ) -> Result<Release, RegistryError>;

    async fn edit_release(
        &self,
        repo: &GitHubRepo,
        id: u64,
        update: &ReleaseUpdate,
    ) -> Result<Release, RegistryError>;
}

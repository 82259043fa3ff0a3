//! Package feed access
//!
//! The hide target only needs two things from a feed: the published
//! versions of a package and a way to unlist one of them.

#[cfg(test)]
use mockall::automock;

pub mod nuget;

pub use nuget::NuGetRegistry;

use crate::config::Secret;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request was not authorized")]
    Unauthorized,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// One published version as reported by the feed metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVersion {
    pub version: Option<String>,
    pub listed: bool,
}

impl PublishedVersion {
    pub fn listed(version: impl Into<String>) -> Self {
        PublishedVersion {
            version: Some(version.into()),
            listed: true,
        }
    }

    pub fn unlisted(version: impl Into<String>) -> Self {
        PublishedVersion {
            version: Some(version.into()),
            listed: false,
        }
    }

    /// The version string, when the feed reported a non-empty one
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }
}

/// Trait for reading and unlisting package versions on a feed
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Fetches every published version of a package, listed or not
    ///
    /// A package the feed has never seen yields an empty list.
    async fn list_versions(&self, package_id: &str)
        -> Result<Vec<PublishedVersion>, RegistryError>;

    /// Unlists (hides) one version of a package
    async fn unlist(
        &self,
        package_id: &str,
        version: &str,
        api_key: &Secret,
    ) -> Result<(), RegistryError>;
}

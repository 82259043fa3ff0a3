//! NuGet v3 feed client

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::Secret;
use crate::registry::{PackageRegistry, PublishedVersion, RegistryError};

/// Default NuGet service index
pub const DEFAULT_FEED_URL: &str = "https://api.nuget.org/v3/index.json";

/// Registration resource types, most capable first
const REGISTRATION_TYPES: &[&str] = &[
    "RegistrationsBaseUrl/3.6.0",
    "RegistrationsBaseUrl/3.4.0",
    "RegistrationsBaseUrl",
];

const PUBLISH_TYPE: &str = "PackagePublish/2.0.0";

const API_KEY_HEADER: &str = "X-NuGet-ApiKey";

#[derive(Debug, Deserialize)]
struct ServiceIndex {
    resources: Vec<ServiceResource>,
}

#[derive(Debug, Deserialize)]
struct ServiceResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RegistrationIndex {
    #[serde(default)]
    items: Vec<RegistrationPage>,
}

#[derive(Debug, Deserialize)]
struct RegistrationPage {
    #[serde(rename = "@id")]
    id: String,
    /// Absent when the page has to be fetched separately
    items: Option<Vec<RegistrationLeaf>>,
}

#[derive(Debug, Deserialize)]
struct RegistrationLeaf {
    #[serde(rename = "catalogEntry")]
    catalog_entry: CatalogEntry,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    version: Option<String>,
    listed: Option<bool>,
}

/// Endpoints resolved from the service index
#[derive(Debug, Clone)]
struct FeedEndpoints {
    registrations: String,
    publish: Option<String>,
}

/// Package feed implementation for NuGet v3 service indexes
pub struct NuGetRegistry {
    client: reqwest::Client,
    feed_url: String,
    endpoints: OnceCell<FeedEndpoints>,
}

impl NuGetRegistry {
    /// Creates a client for the service index at `feed_url`
    pub fn new(
        feed_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            feed_url: feed_url.to_string(),
            endpoints: OnceCell::new(),
        })
    }

    async fn endpoints(&self) -> Result<&FeedEndpoints, RegistryError> {
        self.endpoints
            .get_or_try_init(|| self.fetch_endpoints())
            .await
    }

    async fn fetch_endpoints(&self) -> Result<FeedEndpoints, RegistryError> {
        debug!("Fetching NuGet service index {}", self.feed_url);
        let response = self.client.get(&self.feed_url).send().await?;
        let response = check_status(response, &self.feed_url)?;

        let index: ServiceIndex = response.json().await.map_err(|e| {
            warn!("Failed to parse NuGet service index: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let registrations = REGISTRATION_TYPES
            .iter()
            .find_map(|kind| index.resources.iter().find(|r| r.kind == *kind))
            .map(|r| r.id.clone())
            .ok_or_else(|| {
                RegistryError::InvalidResponse(format!(
                    "Service index {} has no registration resource",
                    self.feed_url
                ))
            })?;

        let publish = index
            .resources
            .iter()
            .find(|r| r.kind == PUBLISH_TYPE)
            .map(|r| r.id.clone());

        Ok(FeedEndpoints {
            registrations,
            publish,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<Vec<RegistrationLeaf>, RegistryError> {
        debug!("Fetching registration page {}", url);
        let response = self.client.get(url).send().await?;
        let response = check_status(response, url)?;

        let page: RegistrationPage = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
        Ok(page.items.unwrap_or_default())
    }
}

fn check_status(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, RegistryError> {
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(RegistryError::NotFound(url.to_string()));
    }

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(RegistryError::Unauthorized);
    }

    if !status.is_success() {
        warn!("NuGet feed returned status {}: {}", status, url);
        return Err(RegistryError::InvalidResponse(format!(
            "Unexpected status: {}",
            status
        )));
    }

    Ok(response)
}

#[async_trait::async_trait]
impl PackageRegistry for NuGetRegistry {
    async fn list_versions(
        &self,
        package_id: &str,
    ) -> Result<Vec<PublishedVersion>, RegistryError> {
        let endpoints = self.endpoints().await?;
        let url = format!(
            "{}/{}/index.json",
            endpoints.registrations.trim_end_matches('/'),
            package_id.to_lowercase()
        );

        debug!("Fetching registration index {}", url);
        let response = self.client.get(&url).send().await?;
        let response = match check_status(response, &url) {
            Ok(response) => response,
            Err(RegistryError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let index: RegistrationIndex = response.json().await.map_err(|e| {
            warn!("Failed to parse registration index for {}: {}", package_id, e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let mut versions = Vec::new();
        for page in index.items {
            let leaves = match page.items {
                Some(leaves) => leaves,
                None => self.fetch_page(&page.id).await?,
            };

            versions.extend(leaves.into_iter().map(|leaf| PublishedVersion {
                version: leaf.catalog_entry.version,
                listed: leaf.catalog_entry.listed.unwrap_or(true),
            }));
        }

        Ok(versions)
    }

    async fn unlist(
        &self,
        package_id: &str,
        version: &str,
        api_key: &Secret,
    ) -> Result<(), RegistryError> {
        let endpoints = self.endpoints().await?;
        let publish = endpoints.publish.as_deref().ok_or_else(|| {
            RegistryError::InvalidResponse(format!(
                "Service index {} has no publish resource",
                self.feed_url
            ))
        })?;

        let url = format!(
            "{}/{}/{}",
            publish.trim_end_matches('/'),
            package_id,
            version
        );

        debug!("Unlisting {} {} via {}", package_id, version, url);
        let response = self
            .client
            .delete(&url)
            .header(API_KEY_HEADER, api_key.expose())
            .send()
            .await?;
        check_status(response, &url)?;

        Ok(())
    }
}

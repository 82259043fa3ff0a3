//! GitHub REST API client for releases

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Secret;
use crate::git::GitHubRepo;
use crate::github::{NewRelease, Release, ReleaseHost, ReleaseUpdate};
use crate::registry::RegistryError;

#[derive(Debug, Deserialize)]
struct GeneratedNotes {
    body: String,
}

/// Release host implementation backed by the GitHub REST API
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<Secret>,
}

impl GitHubClient {
    /// Creates a client for the API at `base_url` (e.g. "https://api.github.com")
    pub fn new(
        base_url: &str,
        user_agent: &str,
        token: Option<Secret>,
    ) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match &self.token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    fn releases_url(&self, repo: &GitHubRepo) -> String {
        format!("{}/repos/{}/{}/releases", self.base_url, repo.owner, repo.name)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, RegistryError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(what.to_string()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RegistryError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("GitHub API returned status {} for {}: {}", status, what, body);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub response for {}: {}", what, e);
            RegistryError::InvalidResponse(e.to_string())
        })
    }
}

#[async_trait::async_trait]
impl ReleaseHost for GitHubClient {
    async fn generate_release_notes(
        &self,
        repo: &GitHubRepo,
        tag: &str,
    ) -> Result<String, RegistryError> {
        let url = format!("{}/generate-notes", self.releases_url(repo));
        debug!("Generating release notes for {} via {}", tag, url);

        let builder = self
            .request(reqwest::Method::POST, &url)
            .json(&serde_json::json!({ "tag_name": tag }));
        let notes: GeneratedNotes = self.send(builder, &format!("release notes for {}", tag)).await?;

        Ok(notes.body)
    }

    async fn release_by_tag(
        &self,
        repo: &GitHubRepo,
        tag: &str,
    ) -> Result<Option<Release>, RegistryError> {
        let url = format!("{}/tags/{}", self.releases_url(repo), tag);
        debug!("Looking up release {}", url);

        match self
            .send(self.request(reqwest::Method::GET, &url), &format!("release {}", tag))
            .await
        {
            Ok(release) => Ok(Some(release)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_release(
        &self,
        repo: &GitHubRepo,
        release: &NewRelease,
    ) -> Result<Release, RegistryError> {
        let url = self.releases_url(repo);
        let builder = self.request(reqwest::Method::POST, &url).json(release);

        self.send(builder, &format!("new release {}", release.tag_name))
            .await
    }

    async fn edit_release(
        &self,
        repo: &GitHubRepo,
        id: u64,
        update: &ReleaseUpdate,
    ) -> Result<Release, RegistryError> {
        let url = format!("{}/{}", self.releases_url(repo), id);
        let builder = self.request(reqwest::Method::PATCH, &url).json(update);

        self.send(builder, &format!("release {}", id)).await
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PipelineError, Result};
use crate::registry::nuget::DEFAULT_FEED_URL;

/// Name of the optional configuration file
pub const CONFIG_FILE_NAME: &str = "nuget-pipeline.toml";

/// Represents the complete configuration file for nuget-pipeline.
///
/// Every section is optional; command-line parameters override the values
/// loaded here.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub release: ReleaseConfig,
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    100
}

/// Package feed settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            url: default_feed_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_configuration() -> String {
    "Release".to_string()
}

fn default_artifacts_dir() -> String {
    ".artifacts".to_string()
}

/// Packaging command and output settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BuildConfig {
    /// Packaging command; `dotnet pack` when unset
    #[serde(default)]
    pub command: Option<String>,

    /// Build configuration whose packages Numerge picks up
    #[serde(default = "default_configuration")]
    pub configuration: String,

    /// Directory merged packages are written to, relative to the root
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            command: None,
            configuration: default_configuration(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

fn default_prerelease_phase() -> String {
    "nightly".to_string()
}

fn default_user_agent() -> String {
    format!("nuget-pipeline/{}", env!("CARGO_PKG_VERSION"))
}

fn default_remote() -> String {
    "origin".to_string()
}

/// Version resolution and release host settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    #[serde(default = "default_prerelease_phase")]
    pub default_prerelease_phase: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Remote whose URL names the GitHub repository
    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            tag_prefix: default_tag_prefix(),
            default_prerelease_phase: default_prerelease_phase(),
            user_agent: default_user_agent(),
            remote: default_remote(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `nuget-pipeline.toml` in the repository root
/// 3. `nuget-pipeline.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, root: &Path) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => [
            Some(root.join(CONFIG_FILE_NAME)),
            dirs::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)),
        ]
        .into_iter()
        .flatten()
        .find(|candidate| candidate.exists()),
    };

    let Some(path) = path else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| {
        PipelineError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;

    toml::from_str(&config_str)
        .map_err(|e| PipelineError::config(format!("Cannot parse {}: {}", path.display(), e)))
}

/// A credential that never shows up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// Empty or whitespace-only values count as missing
    pub fn non_empty(value: Option<String>) -> Option<Self> {
        value.filter(|v| !v.trim().is_empty()).map(Secret)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Values provided by the CI runner environment
#[derive(Debug, Clone, PartialEq)]
pub struct CiEnvironment {
    pub github_token: Option<Secret>,
    pub server_url: String,
    pub api_url: String,
    /// `owner/name` of the repository being built
    pub repository: Option<String>,
}

impl CiEnvironment {
    /// Read the GitHub Actions variables from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        CiEnvironment {
            github_token: Secret::non_empty(lookup("GITHUB_TOKEN")),
            server_url: lookup("GITHUB_SERVER_URL")
                .unwrap_or_else(|| "https://github.com".to_string()),
            api_url: lookup("GITHUB_API_URL")
                .unwrap_or_else(|| "https://api.github.com".to_string()),
            repository: lookup("GITHUB_REPOSITORY").filter(|r| !r.is_empty()),
        }
    }
}

/// Parameters of a single pipeline invocation
///
/// Built once from the command line, the configuration file and the CI
/// environment, then handed to every target.
#[derive(Debug, Clone)]
pub struct Parameters {
    pub root: PathBuf,
    pub dry_run: bool,
    pub nuget_feed_url: String,
    pub nuget_api_key: Option<Secret>,
    pub tag: Option<String>,
    pub build_command: Option<String>,
    pub config: Config,
    pub ci: CiEnvironment,
}

impl Parameters {
    /// Parameters for `root` with everything else at its default
    pub fn new(root: impl Into<PathBuf>, config: Config, ci: CiEnvironment) -> Self {
        Parameters {
            root: root.into(),
            dry_run: false,
            nuget_feed_url: config.feed.url.clone(),
            nuget_api_key: None,
            tag: None,
            build_command: config.build.command.clone(),
            config,
            ci,
        }
    }

    /// The API key, which is mandatory unless this is a dry run
    pub fn require_api_key(&self) -> Result<Option<&Secret>> {
        match (&self.nuget_api_key, self.dry_run) {
            (Some(key), _) => Ok(Some(key)),
            (None, true) => Ok(None),
            (None, false) => Err(PipelineError::MissingParameter("nuget-api-key")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed.url, "https://api.nuget.org/v3/index.json");
        assert_eq!(config.feed.timeout(), Duration::from_secs(100));
        assert_eq!(config.build.command, None);
        assert_eq!(config.build.configuration, "Release");
        assert_eq!(config.release.tag_prefix, "v");
        assert_eq!(config.release.default_prerelease_phase, "nightly");
        assert_eq!(config.release.remote, "origin");
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: Config = toml::from_str(
            r#"
[build]
command = "dotnet pack -c Release"
"#,
        )
        .unwrap();
        assert_eq!(config.build.command.as_deref(), Some("dotnet pack -c Release"));
        assert_eq!(config.build.artifacts_dir, ".artifacts");
        assert_eq!(config.feed, FeedConfig::default());
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("oy2abc");
        assert_eq!(format!("{:?}", secret), "***");
        assert_eq!(secret.expose(), "oy2abc");
    }

    #[test]
    fn test_secret_non_empty() {
        assert!(Secret::non_empty(None).is_none());
        assert!(Secret::non_empty(Some("  ".to_string())).is_none());
        assert!(Secret::non_empty(Some("key".to_string())).is_some());
    }

    #[test]
    fn test_ci_environment_defaults() {
        let ci = CiEnvironment::from_lookup(|_| None);
        assert_eq!(ci.server_url, "https://github.com");
        assert_eq!(ci.api_url, "https://api.github.com");
        assert!(ci.github_token.is_none());
        assert!(ci.repository.is_none());
    }

    #[test]
    fn test_ci_environment_from_lookup() {
        let ci = CiEnvironment::from_lookup(|key| match key {
            "GITHUB_TOKEN" => Some("ghs_token".to_string()),
            "GITHUB_REPOSITORY" => Some("acme/widgets".to_string()),
            "GITHUB_SERVER_URL" => Some("https://git.example.com".to_string()),
            _ => None,
        });
        assert_eq!(ci.github_token.unwrap().expose(), "ghs_token");
        assert_eq!(ci.repository.as_deref(), Some("acme/widgets"));
        assert_eq!(ci.server_url, "https://git.example.com");
    }

    #[test]
    fn test_api_key_required_unless_dry_run() {
        let mut params = Parameters::new(".", Config::default(), CiEnvironment::from_lookup(|_| None));
        assert!(matches!(
            params.require_api_key(),
            Err(PipelineError::MissingParameter("nuget-api-key"))
        ));

        params.dry_run = true;
        assert!(params.require_api_key().unwrap().is_none());

        params.nuget_api_key = Some(Secret::new("key"));
        assert!(params.require_api_key().unwrap().is_some());
    }
}

//! Pipeline targets and their execution order
//!
//! Every target receives the same [BuildContext]; the version resolved by
//! `resolve-version` is handed on to the targets that package it.

pub mod compile;
pub mod create_release;
pub mod hide_nightly;
pub mod numerge;
pub mod resolve_version;

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::build::{CommandRunner, ProcessRunner};
use crate::config::Parameters;
use crate::domain::PackVersion;
use crate::error::{PipelineError, Result};
use crate::git::{GitHubRepo, Repository};
use crate::github::{GitHubClient, ReleaseHost};
use crate::registry::{NuGetRegistry, PackageRegistry};
use crate::warning::PipelineWarning;

pub use create_release::ReleaseOutcome;
pub use hide_nightly::HideSummary;

/// A named unit of pipeline work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Target {
    /// Describe the tool
    Info,
    /// Work out the package version and release notes
    ResolveVersion,
    /// Run the packaging command
    Compile,
    /// Merge satellite packages listed in numerge.config.json
    Numerge,
    /// Resolve, compile and merge
    Pack,
    /// Unlist nightly packages superseded by released versions
    HideOutdatedNightlyPackages,
    /// Create or update the GitHub release for a tag
    CreateRelease,
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self {
            Target::Info => "info",
            Target::ResolveVersion => "resolve-version",
            Target::Compile => "compile",
            Target::Numerge => "numerge",
            Target::Pack => "pack",
            Target::HideOutdatedNightlyPackages => "hide-outdated-nightly-packages",
            Target::CreateRelease => "create-release",
        }
    }

    /// Targets that must run before this one
    pub fn dependencies(&self) -> &'static [Target] {
        match self {
            Target::Compile => &[Target::ResolveVersion],
            Target::Numerge => &[Target::Compile],
            Target::Pack => &[Target::ResolveVersion, Target::Compile, Target::Numerge],
            _ => &[],
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Targets to run for `target`, dependencies first, each exactly once
pub fn execution_plan(target: Target) -> Vec<Target> {
    fn visit(target: Target, plan: &mut Vec<Target>) {
        if plan.contains(&target) {
            return;
        }
        for dependency in target.dependencies() {
            visit(*dependency, plan);
        }
        plan.push(target);
    }

    let mut plan = Vec::new();
    visit(target, &mut plan);
    plan
}

/// Everything a target may touch, built once per invocation
pub struct BuildContext {
    pub params: Parameters,
    pub repo: Box<dyn Repository>,
    pub registry: Box<dyn PackageRegistry>,
    pub releases: Box<dyn ReleaseHost>,
    pub runner: Box<dyn CommandRunner>,
}

impl BuildContext {
    /// Context backed by the real feed, GitHub API and child processes
    pub fn connect(params: Parameters, repo: Box<dyn Repository>) -> Result<Self> {
        let registry = NuGetRegistry::new(
            &params.nuget_feed_url,
            &params.config.release.user_agent,
            params.config.feed.timeout(),
        )
        .map_err(PipelineError::Registry)?;

        let releases = GitHubClient::new(
            &params.ci.api_url,
            &params.config.release.user_agent,
            params.ci.github_token.clone(),
        )
        .map_err(PipelineError::Release)?;

        Ok(BuildContext {
            params,
            repo,
            registry: Box::new(registry),
            releases: Box::new(releases),
            runner: Box::new(ProcessRunner),
        })
    }

    /// The GitHub repository being built
    ///
    /// Taken from `GITHUB_REPOSITORY` when running in Actions, otherwise
    /// from the configured remote.
    pub fn github_repo(&self) -> Result<GitHubRepo> {
        if let Some((owner, name)) = self
            .params
            .ci
            .repository
            .as_deref()
            .and_then(|slug| slug.split_once('/'))
        {
            return Ok(GitHubRepo {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }

        let url = self.repo.remote_url(&self.params.config.release.remote)?;
        GitHubRepo::from_remote_url(&url)
    }

    /// The GitHub repository, warning when API calls will be anonymous
    pub(crate) fn release_repo(&self) -> Result<GitHubRepo> {
        if self.params.ci.github_token.is_none() {
            PipelineWarning::MissingGitHubToken.emit();
        }
        self.github_repo()
    }
}

/// What a single target produced
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    Described,
    Resolved(PackVersion),
    Compiled,
    Merged(Vec<PathBuf>),
    Skipped(String),
    Hidden(HideSummary),
    Released(ReleaseOutcome),
    Completed,
}

/// Run `target` and everything it depends on
pub async fn run(ctx: &BuildContext, target: Target) -> Result<Vec<(Target, TargetOutcome)>> {
    let plan = execution_plan(target);
    info!(
        "Execution plan: {}",
        plan.iter().map(Target::name).collect::<Vec<_>>().join(", ")
    );

    let mut pack_version: Option<PackVersion> = None;
    let mut outcomes = Vec::with_capacity(plan.len());

    for step in plan {
        info!("Running target {}", step);
        let outcome = match step {
            Target::Info => {
                info!("This is a CLI tool for assisting NuGet packages in pipelines");
                TargetOutcome::Described
            }
            Target::ResolveVersion => {
                let pack = resolve_version::run(ctx).await?;
                pack_version = Some(pack.clone());
                TargetOutcome::Resolved(pack)
            }
            Target::Compile => {
                compile::run(ctx, resolved(&pack_version)?)?;
                TargetOutcome::Compiled
            }
            Target::Numerge => match numerge::run(ctx, resolved(&pack_version)?)? {
                Some(written) => TargetOutcome::Merged(written),
                None => TargetOutcome::Skipped(format!(
                    "{} not found",
                    crate::package::numerge::NUMERGE_CONFIG_FILE
                )),
            },
            Target::Pack => TargetOutcome::Completed,
            Target::HideOutdatedNightlyPackages => {
                TargetOutcome::Hidden(hide_nightly::run(ctx).await?)
            }
            Target::CreateRelease => TargetOutcome::Released(create_release::run(ctx).await?),
        };
        outcomes.push((step, outcome));
    }

    Ok(outcomes)
}

fn resolved(pack_version: &Option<PackVersion>) -> Result<&PackVersion> {
    pack_version
        .as_ref()
        .ok_or_else(|| PipelineError::version("Version has not been resolved yet"))
}

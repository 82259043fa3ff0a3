//! Unlisting nightly packages that a release has made obsolete

use tracing::info;

use crate::config::Secret;
use crate::domain::{CandidateNightly, KnownVersionSet};
use crate::error::{PipelineError, Result};
use crate::package::{self, numerge::PACKAGE_EXTENSION};
use crate::registry::PublishedVersion;
use crate::targets::BuildContext;
use crate::warning::PipelineWarning;

/// Result of a hide run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HideSummary {
    /// Package ids found in the built archives
    pub packages: Vec<String>,
    /// Nightlies that were unlisted, or would have been on a dry run
    pub hidden: Vec<CandidateNightly>,
    pub dry_run: bool,
}

/// Known versions from the tags merged into HEAD
///
/// A leading `v` is stripped from each tag and the first tag in
/// enumeration order is left out.
pub fn known_versions(tags: &[String]) -> KnownVersionSet {
    KnownVersionSet::new(tags.iter().map(|tag| tag.trim_start_matches('v')).skip(1))
}

/// Listed nightlies of `package_id` that the known versions supersede
pub fn select_outdated(
    known: &KnownVersionSet,
    package_id: &str,
    published: &[PublishedVersion],
) -> Vec<CandidateNightly> {
    published
        .iter()
        .filter(|metadata| metadata.listed)
        .filter_map(PublishedVersion::version)
        .map(|version| CandidateNightly::new(package_id, version))
        .filter(CandidateNightly::is_nightly)
        .filter(|candidate| known.is_superseded(candidate))
        .collect()
}

pub async fn run(ctx: &BuildContext) -> Result<HideSummary> {
    let api_key = ctx.params.require_api_key()?;

    info!("Fetching all tags reachable from current commit");
    let known = known_versions(&ctx.repo.merged_tags()?);
    for record in known.iter().filter(|record| record.parsed().is_none()) {
        PipelineWarning::UnparsableTag {
            tag: record.raw().to_string(),
        }
        .emit();
    }
    info!("Fetched {} old tags", known.len());

    info!("Searching all nuget package files");
    let archives = package::find_files(&ctx.params.root, PACKAGE_EXTENSION)?;
    info!(
        "Found {} files: \n{}",
        archives.len(),
        archives
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    );

    let packages = package::package_ids(&archives)?;
    info!("Found {} packages: \n{}", packages.len(), packages.join("\n"));

    let mut summary = HideSummary {
        packages: packages.clone(),
        hidden: Vec::new(),
        dry_run: ctx.params.dry_run,
    };

    for package_id in &packages {
        let hidden = hide_package(ctx, &known, package_id, api_key).await?;
        summary.hidden.extend(hidden);
    }

    Ok(summary)
}

async fn hide_package(
    ctx: &BuildContext,
    known: &KnownVersionSet,
    package_id: &str,
    api_key: Option<&Secret>,
) -> Result<Vec<CandidateNightly>> {
    info!("Retrieving nightly package versions for {} to hide", package_id);
    let published = ctx
        .registry
        .list_versions(package_id)
        .await
        .map_err(PipelineError::Registry)?;

    let outdated = select_outdated(known, package_id, &published);
    for candidate in &outdated {
        info!("Hiding previous nightly version {}", candidate.version);
        match (ctx.params.dry_run, api_key) {
            (false, Some(key)) => ctx
                .registry
                .unlist(package_id, &candidate.version, key)
                .await
                .map_err(PipelineError::Registry)?,
            _ => info!("Dry run, {} {} stays listed", package_id, candidate.version),
        }
    }

    info!("All previous nightly versions for {} were hidden", package_id);
    Ok(outdated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::package::nupkg::tests::write_archive;
    use crate::registry::{MockPackageRegistry, RegistryError};
    use crate::targets::fakes::context;
    use tempfile::TempDir;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_known_versions_skip_first_and_strip_prefix() {
        let known = known_versions(&tags(&["v0.9.0", "v1.0.0", "v1.1.0"]));
        let raw: Vec<&str> = known.iter().map(|r| r.raw()).collect();
        assert_eq!(raw, vec!["1.0.0", "1.1.0"]);
    }

    #[test]
    fn test_select_outdated_filters() {
        let known = KnownVersionSet::new(["1.1.0", "1.2.0"]);
        let published = vec![
            PublishedVersion::listed("1.1.1-nightly.0.3"),
            PublishedVersion::unlisted("1.1.1-nightly.0.2"),
            PublishedVersion::listed("1.2.0"),
            PublishedVersion::listed("1.2.1-nightly.0.1"),
            PublishedVersion {
                version: None,
                listed: true,
            },
        ];

        let outdated = select_outdated(&known, "Acme", &published);
        let versions: Vec<&str> = outdated.iter().map(|c| c.version.as_str()).collect();
        assert_eq!(versions, vec!["1.1.1-nightly.0.3"]);
        assert_eq!(outdated[0].package_id, "Acme");
    }

    #[test]
    fn test_select_outdated_is_repeatable() {
        let known = KnownVersionSet::new(["1.2.0"]);
        let published = vec![PublishedVersion::listed("1.2.0-nightly.5")];

        let first = select_outdated(&known, "Acme", &published);
        let second = select_outdated(&known, "Acme", &published);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    fn context_with_package(dir: &TempDir, registry: MockPackageRegistry) -> BuildContext {
        std::fs::create_dir_all(dir.path().join("bin/Release")).unwrap();
        write_archive(
            &dir.path().join("bin/Release/Acme.1.3.0.nupkg"),
            &[("Acme.nuspec", "<package/>")],
        );
        let repo = MockRepository::default()
            .with_tag("v1.0.0", 9)
            .with_tag("v1.1.0", 5)
            .with_tag("v1.2.0", 1);
        let mut ctx = context(dir.path(), repo);
        ctx.registry = Box::new(registry);
        ctx
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_feed_calls() {
        let dir = TempDir::new().unwrap();
        let mut registry = MockPackageRegistry::new();
        registry.expect_list_versions().never();
        let ctx = context_with_package(&dir, registry);

        let err = run(&ctx).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingParameter("nuget-api-key")));
    }

    #[tokio::test]
    async fn test_unlists_superseded_nightlies() {
        let dir = TempDir::new().unwrap();
        let mut registry = MockPackageRegistry::new();
        registry
            .expect_list_versions()
            .withf(|id| id == "Acme")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    PublishedVersion::listed("1.1.1-nightly.0.3"),
                    PublishedVersion::listed("1.3.0-nightly.0.1"),
                ])
            });
        registry
            .expect_unlist()
            .withf(|id, version, key| {
                id == "Acme" && version == "1.1.1-nightly.0.3" && key.expose() == "oy2key"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut ctx = context_with_package(&dir, registry);
        ctx.params.nuget_api_key = Some(Secret::new("oy2key"));

        let summary = run(&ctx).await.unwrap();
        assert_eq!(summary.packages, vec!["Acme"]);
        assert_eq!(summary.hidden.len(), 1);
        assert!(!summary.dry_run);
    }

    #[tokio::test]
    async fn test_dry_run_never_unlists() {
        let dir = TempDir::new().unwrap();
        let mut registry = MockPackageRegistry::new();
        registry
            .expect_list_versions()
            .returning(|_| Ok(vec![PublishedVersion::listed("1.1.1-nightly.0.3")]));
        registry.expect_unlist().never();

        let mut ctx = context_with_package(&dir, registry);
        ctx.params.dry_run = true;

        let summary = run(&ctx).await.unwrap();
        assert_eq!(summary.hidden.len(), 1);
        assert!(summary.dry_run);
    }

    #[tokio::test]
    async fn test_unlist_failure_aborts() {
        let dir = TempDir::new().unwrap();
        let mut registry = MockPackageRegistry::new();
        registry
            .expect_list_versions()
            .returning(|_| Ok(vec![PublishedVersion::listed("1.1.1-nightly.0.3")]));
        registry
            .expect_unlist()
            .returning(|_, _, _| Err(RegistryError::Unauthorized));

        let mut ctx = context_with_package(&dir, registry);
        ctx.params.nuget_api_key = Some(Secret::new("oy2key"));

        let err = run(&ctx).await.unwrap_err();
        assert!(matches!(err, PipelineError::Registry(RegistryError::Unauthorized)));
    }
}

use tracing::info;

use crate::domain::Tag;
use crate::error::{PipelineError, Result};
use crate::github::{NewRelease, Release, ReleaseUpdate};
use crate::targets::BuildContext;
use crate::warning::PipelineWarning;

/// What happened to the release for the requested tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Created(Release),
    Updated(Release),
    /// Dry run; `existing` tells whether the release would have been edited
    Planned { tag: String, existing: bool },
}

pub async fn run(ctx: &BuildContext) -> Result<ReleaseOutcome> {
    let tag = ctx
        .params
        .tag
        .as_deref()
        .ok_or(PipelineError::MissingParameter("tag"))?;

    let version = Tag::new(tag)
        .version()
        .ok_or_else(|| PipelineError::tag(format!("Tag '{}' is not a version", tag)))?;
    let prerelease = version.is_prerelease();

    let repo = ctx.release_repo()?;
    let notes = ctx
        .releases
        .generate_release_notes(&repo, tag)
        .await
        .map_err(PipelineError::Release)?;

    let existing = match ctx.releases.release_by_tag(&repo, tag).await {
        Ok(release) => release,
        Err(e) => {
            PipelineWarning::ReleaseLookupFailed {
                tag: tag.to_string(),
                reason: e.to_string(),
            }
            .emit();
            None
        }
    };

    if ctx.params.dry_run {
        info!(
            "Dry run, not {} release {}",
            if existing.is_some() { "editing" } else { "creating" },
            tag
        );
        return Ok(ReleaseOutcome::Planned {
            tag: tag.to_string(),
            existing: existing.is_some(),
        });
    }

    match existing {
        Some(release) => {
            info!("Editing release {}", tag);
            let update = ReleaseUpdate {
                body: notes,
                name: tag.to_string(),
                prerelease,
            };
            let release = ctx
                .releases
                .edit_release(&repo, release.id, &update)
                .await
                .map_err(PipelineError::Release)?;
            Ok(ReleaseOutcome::Updated(release))
        }
        None => {
            info!("Creating release {}", tag);
            let new_release = NewRelease {
                tag_name: tag.to_string(),
                name: tag.to_string(),
                generate_release_notes: true,
                prerelease,
            };
            let release = ctx
                .releases
                .create_release(&repo, &new_release)
                .await
                .map_err(PipelineError::Release)?;
            Ok(ReleaseOutcome::Created(release))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::targets::fakes::{context, FakeReleases};
    use tempfile::TempDir;

    fn setup(tag: Option<&str>, releases: FakeReleases) -> (TempDir, BuildContext, FakeReleases) {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(dir.path(), MockRepository::default());
        ctx.params.tag = tag.map(str::to_string);
        ctx.releases = Box::new(releases.clone());
        (dir, ctx, releases)
    }

    fn existing(id: u64, tag: &str) -> Option<Release> {
        Some(Release {
            id,
            tag_name: tag.to_string(),
            name: Some(tag.to_string()),
            prerelease: false,
        })
    }

    #[tokio::test]
    async fn test_requires_tag() {
        let (_dir, ctx, releases) = setup(None, FakeReleases::default());

        let err = run(&ctx).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingParameter("tag")));
        assert!(releases.calls().is_empty());
    }

    #[tokio::test]
    async fn test_creates_missing_release() {
        let (_dir, ctx, releases) = setup(Some("v2.0.0-rc.1"), FakeReleases::default());

        let outcome = run(&ctx).await.unwrap();
        assert!(matches!(outcome, ReleaseOutcome::Created(ref r) if r.prerelease));
        assert_eq!(
            releases.calls(),
            vec![
                "notes acme/widgets v2.0.0-rc.1",
                "get v2.0.0-rc.1",
                "create v2.0.0-rc.1 prerelease=true"
            ]
        );
    }

    #[tokio::test]
    async fn test_edits_existing_release() {
        let (_dir, ctx, releases) = setup(
            Some("v1.4.0"),
            FakeReleases {
                existing: existing(42, "v1.4.0"),
                ..Default::default()
            },
        );

        let outcome = run(&ctx).await.unwrap();
        assert!(matches!(outcome, ReleaseOutcome::Updated(ref r) if r.id == 42));
        assert_eq!(releases.calls().last().unwrap(), "edit 42 prerelease=false");
    }

    #[tokio::test]
    async fn test_lookup_failure_creates_release() {
        let (_dir, ctx, releases) = setup(
            Some("v1.4.0"),
            FakeReleases {
                lookup_fails: true,
                ..Default::default()
            },
        );

        let outcome = run(&ctx).await.unwrap();
        assert!(matches!(outcome, ReleaseOutcome::Created(_)));
        assert_eq!(releases.calls().last().unwrap(), "create v1.4.0 prerelease=false");
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_changes() {
        let (_dir, mut ctx, releases) = setup(
            Some("v1.4.0"),
            FakeReleases {
                existing: existing(42, "v1.4.0"),
                ..Default::default()
            },
        );
        ctx.params.dry_run = true;

        let outcome = run(&ctx).await.unwrap();
        assert_eq!(
            outcome,
            ReleaseOutcome::Planned {
                tag: "v1.4.0".to_string(),
                existing: true
            }
        );
        assert_eq!(releases.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_non_version_tag_is_rejected() {
        let (_dir, ctx, _releases) = setup(Some("latest"), FakeReleases::default());

        assert!(matches!(run(&ctx).await, Err(PipelineError::Tag(_))));
    }
}

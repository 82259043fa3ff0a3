use tracing::info;

use crate::domain::{MinVerSettings, PackVersion, Tag};
use crate::error::{PipelineError, Result};
use crate::targets::BuildContext;

/// Resolve the version and release notes for the HEAD commit
///
/// A tagged HEAD is a release: the tag is the version and the notes come
/// from GitHub. Anything else is a nightly versioned by commit height.
pub async fn run(ctx: &BuildContext) -> Result<PackVersion> {
    info!("Resolving whether the current commit has a tag");
    let commit = ctx.repo.head_commit()?;
    let tags = ctx.repo.tags_at_head()?;

    let pack = match release_tag(&tags) {
        Some(tag) => {
            info!("Current commit has tag {}, resolving version from it", tag);
            let repo = ctx.release_repo()?;
            let notes = ctx
                .releases
                .generate_release_notes(&repo, &tag.name)
                .await
                .map_err(PipelineError::Release)?;
            PackVersion::new(tag.version_part(), notes)
        }
        None => {
            info!("Current commit doesn't have a tag, resolving version from history");
            let release = &ctx.params.config.release;
            let settings = MinVerSettings {
                tag_prefix: release.tag_prefix.clone(),
                default_prerelease_phase: release.default_prerelease_phase.clone(),
            };
            let history = ctx.repo.tag_history()?;
            let version = settings.calculate(&history.tagged, history.root_height);

            let commit_url = format!(
                "{}/{}/commit/{}",
                ctx.params.ci.server_url.trim_end_matches('/'),
                ctx.github_repo()?,
                commit
            );
            let message = ctx.repo.head_message()?;
            PackVersion::new(version.to_string(), nightly_notes(&commit_url, &message))
        }
    };

    info!("Resolved version information is {}", pack);
    Ok(pack)
}

/// The tag on HEAD to release from; the greatest version wins
fn release_tag(tags: &[String]) -> Option<Tag> {
    tags.iter()
        .map(Tag::new)
        .max_by_key(|tag| tag.version())
}

pub fn nightly_notes(commit_url: &str, message: &str) -> String {
    format!(
        "This version based on commit {}\n\n{}",
        commit_url,
        message.trim_end()
    )
}

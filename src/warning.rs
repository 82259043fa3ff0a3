use std::fmt;
use std::path::PathBuf;

/// Non-fatal conditions met while running the pipeline.
/// They are logged and the run carries on.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    /// The build command gets neither placeholders nor dotnet properties
    VersionNotInjected { program: String },
    /// A package archive has no root-level nuspec entry
    NupkgWithoutNuspec { path: PathBuf },
    /// A known tag is not a version and only takes part in substring matching
    UnparsableTag { tag: String },
    /// Looking up an existing release failed; a new one will be created
    ReleaseLookupFailed { tag: String, reason: String },
    /// No GitHub token is available for API calls
    MissingGitHubToken,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::VersionNotInjected { program } => write!(
                f,
                "Build command '{}' doesn't start with dotnet, but also doesn't contain any variables to replace",
                program
            ),
            PipelineWarning::NupkgWithoutNuspec { path } => {
                write!(f, "No nuspec found in package '{}'", path.display())
            }
            PipelineWarning::UnparsableTag { tag } => {
                write!(f, "Tag '{}' is not a version, using it for substring matching only", tag)
            }
            PipelineWarning::ReleaseLookupFailed { tag, reason } => {
                write!(f, "Cannot look up release '{}': {}", tag, reason)
            }
            PipelineWarning::MissingGitHubToken => {
                write!(f, "GITHUB_TOKEN is not set, GitHub API calls are unauthenticated")
            }
        }
    }
}

impl PipelineWarning {
    /// Log the warning through tracing
    pub fn emit(&self) {
        tracing::warn!("{}", self);
    }
}

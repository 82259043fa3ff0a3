use crate::domain::Version;

/// Represents a git tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    /// Create a new tag from a string
    pub fn new(name: impl Into<String>) -> Self {
        Tag { name: name.into() }
    }

    /// Extract version text from tag (e.g., "v1.2.3" -> "1.2.3")
    ///
    /// Every leading `v` is removed, matching how release tags are written
    /// by the release workflow. Surrounding whitespace is ignored.
    pub fn version_part(&self) -> &str {
        self.name.trim().trim_start_matches('v')
    }

    /// Parse the version part of the tag, if it is a valid version
    pub fn version(&self) -> Option<Version> {
        Version::parse(self.version_part()).ok()
    }

    /// Whether the tag names a prerelease version
    ///
    /// Tags that do not parse are treated as full releases.
    pub fn is_prerelease(&self) -> bool {
        self.version().is_some_and(|v| v.is_prerelease())
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

use crate::error::{PipelineError, Result};
use std::fmt;
use std::str::FromStr;

/// Semantic version as published on a NuGet feed
///
/// Prerelease labels keep their original order. Build metadata is kept
/// but never takes part in any decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Fourth component of legacy NuGet versions, 0 when absent
    pub revision: u64,
    pub pre: Vec<String>,
    pub build: Option<String>,
}

impl Version {
    /// Create a new release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            revision: 0,
            pre: Vec::new(),
            build: None,
        }
    }

    /// Return a copy of this version with the given prerelease labels
    pub fn with_pre<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pre = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a version string (e.g., "1.2.3-nightly.0.4" or "1.2")
    ///
    /// One- and two-part versions are padded with zeros the way NuGet
    /// normalizes them, and a fourth numeric part is kept as the revision. Tag prefixes are not accepted; strip them first
    /// with [`crate::domain::Tag::version_part`].
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PipelineError::version("Empty version string"));
        }

        let (normalized, revision) = normalize_core(input)?;
        let parsed = semver::Version::parse(&normalized).map_err(|e| {
            PipelineError::version(format!("Invalid version '{}': {}", input, e))
        })?;

        let pre = if parsed.pre.is_empty() {
            Vec::new()
        } else {
            parsed.pre.as_str().split('.').map(str::to_string).collect()
        };
        let build = if parsed.build.is_empty() {
            None
        } else {
            Some(parsed.build.to_string())
        };

        Ok(Version {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            revision,
            pre,
            build,
        })
    }

    /// Whether the version carries prerelease labels
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    fn to_semver(&self) -> semver::Version {
        let mut version = semver::Version::new(self.major, self.minor, self.patch);
        version.pre = semver::Prerelease::new(&self.pre.join(".")).unwrap_or_default();
        version.build = self
            .build
            .as_deref()
            .and_then(|b| semver::BuildMetadata::new(b).ok())
            .unwrap_or_default();
        version
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.major, self.minor, self.patch, self.revision)
            .cmp(&(other.major, other.minor, other.patch, other.revision))
            .then_with(|| self.to_semver().cmp(&other.to_semver()))
            .then_with(|| self.pre.cmp(&other.pre))
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Pad "1" and "1.2" to three numeric components and split a revision
/// off "1.2.3.4", leaving any prerelease or metadata suffix untouched.
fn normalize_core(input: &str) -> Result<(String, u64)> {
    let split_at = input.find(['-', '+']).unwrap_or(input.len());
    let (core, suffix) = input.split_at(split_at);

    match core.rsplit_once('.') {
        Some((head, revision)) if core.split('.').count() == 4 => {
            let revision = revision.parse::<u64>().map_err(|e| {
                PipelineError::version(format!("Invalid revision in '{}': {}", input, e))
            })?;
            Ok((format!("{}{}", head, suffix), revision))
        }
        _ => match core.split('.').count() {
            1 => Ok((format!("{}.0.0{}", core, suffix), 0)),
            2 => Ok((format!("{}.0{}", core, suffix), 0)),
            _ => Ok((input.to_string(), 0)),
        },
    }
}

impl FromStr for Version {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.revision != 0 {
            write!(f, ".{}", self.revision)?;
        }
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre.join("."))?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

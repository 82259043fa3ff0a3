//! Height-based version calculation for untagged commits
//!
//! Follows the MinVer rules: the version is derived from the greatest
//! version tag reachable from HEAD and the number of commits since it.
//!
//! - no tag: `0.0.0-{phase}.0.{height}`
//! - release tag `X.Y.Z`: `X.Y.(Z+1)-{phase}.0.{height}`
//! - prerelease tag `X.Y.Z-pre`: `X.Y.Z-pre.{height}`
//! - height 0: the tag version itself

use crate::domain::{Tag, Version};

/// Settings for height-based version calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinVerSettings {
    /// Only tags starting with this prefix are considered
    pub tag_prefix: String,
    /// Prerelease phase used after a release tag
    pub default_prerelease_phase: String,
}

impl Default for MinVerSettings {
    fn default() -> Self {
        MinVerSettings {
            tag_prefix: "v".to_string(),
            default_prerelease_phase: "nightly".to_string(),
        }
    }
}

/// A version tag found in history and its distance from HEAD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedVersion {
    pub tag: String,
    pub height: u32,
}

impl MinVerSettings {
    /// Calculate the version for HEAD
    ///
    /// # Arguments
    /// * `tagged` - Tags reachable from HEAD with their commit heights
    /// * `root_height` - Height of the root commit, used when no tag matches
    pub fn calculate(&self, tagged: &[TaggedVersion], root_height: u32) -> Version {
        let latest = tagged
            .iter()
            .filter_map(|t| self.parse_tag(&t.tag).map(|v| (v, t.height)))
            .max_by(|(a, a_height), (b, b_height)| a.cmp(b).then(b_height.cmp(a_height)));

        let Some((mut version, height)) = latest else {
            return Version::new(0, 0, 0).with_pre([
                self.default_prerelease_phase.clone(),
                "0".to_string(),
                root_height.to_string(),
            ]);
        };

        version.build = None;
        if height == 0 {
            return version;
        }

        if version.is_prerelease() {
            version.pre.push(height.to_string());
            version
        } else {
            Version::new(version.major, version.minor, version.patch.saturating_add(1)).with_pre([
                self.default_prerelease_phase.clone(),
                "0".to_string(),
                height.to_string(),
            ])
        }
    }

    fn parse_tag(&self, tag: &str) -> Option<Version> {
        let unprefixed = tag.strip_prefix(self.tag_prefix.as_str())?;
        Tag::new(unprefixed).version()
    }
}

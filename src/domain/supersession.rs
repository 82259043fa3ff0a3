//! Detection of nightly versions made obsolete by later releases
//!
//! A nightly is superseded when a known release tag is embedded in its
//! version string, or when it sits on a patch rung that a later minor or
//! major release skipped over (the nightly is "detached").

use crate::domain::nightly;
use crate::domain::Version;

/// A known version string together with its parsed form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    raw: String,
    parsed: Option<Version>,
}

impl VersionRecord {
    /// Build a record from a version string
    ///
    /// Returns `None` for empty strings; everything else is kept, parsed
    /// or not.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return None;
        }
        let parsed = Version::parse(&raw).ok();
        Some(VersionRecord { raw, parsed })
    }

    /// The string exactly as it was supplied
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Structured form, `None` when the string is not a valid version
    pub fn parsed(&self) -> Option<&Version> {
        self.parsed.as_ref()
    }
}

/// A published package version under evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateNightly {
    pub package_id: String,
    pub version: String,
    parsed: Option<Version>,
}

impl CandidateNightly {
    pub fn new(package_id: impl Into<String>, version: impl Into<String>) -> Self {
        let version = version.into();
        let parsed = Version::parse(&version).ok();
        CandidateNightly {
            package_id: package_id.into(),
            version,
            parsed,
        }
    }

    pub fn parsed(&self) -> Option<&Version> {
        self.parsed.as_ref()
    }

    /// Whether this candidate is a nightly build
    pub fn is_nightly(&self) -> bool {
        nightly::is_nightly(&self.version, self.parsed())
    }
}

/// Versions reachable from the current commit, in tag enumeration order
///
/// Built once per run and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownVersionSet {
    records: Vec<VersionRecord>,
}

impl KnownVersionSet {
    pub fn new<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KnownVersionSet {
            records: versions.into_iter().filter_map(VersionRecord::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionRecord> {
        self.records.iter()
    }

    /// Decide whether a nightly candidate has been superseded
    ///
    /// The direct containment check runs first and works on raw strings,
    /// so unparseable tags still count there. The detached check only
    /// looks at parsed records and needs both the release the nightly was
    /// built on (`patch - 1`) and a newer minor or major line.
    pub fn is_superseded(&self, candidate: &CandidateNightly) -> bool {
        if self
            .records
            .iter()
            .any(|record| candidate.version.contains(record.raw()))
        {
            return true;
        }

        let Some(target) = candidate.parsed() else {
            return false;
        };

        self.has_previous_version(target) && self.has_next_version(target)
    }

    fn parsed_versions(&self) -> impl Iterator<Item = &Version> {
        self.records.iter().filter_map(VersionRecord::parsed)
    }

    fn has_previous_version(&self, target: &Version) -> bool {
        let Some(previous_patch) = target.patch.checked_sub(1) else {
            return false;
        };

        self.parsed_versions().any(|v| {
            v.major == target.major && v.minor == target.minor && v.patch == previous_patch
        })
    }

    fn has_next_version(&self, target: &Version) -> bool {
        self.parsed_versions().any(|v| {
            v.major.checked_sub(1) == Some(target.major)
                || (v.major == target.major && v.minor.checked_sub(1) == Some(target.minor))
        })
    }
}

impl<'a> IntoIterator for &'a KnownVersionSet {
    type Item = &'a VersionRecord;
    type IntoIter = std::slice::Iter<'a, VersionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(version: &str) -> CandidateNightly {
        CandidateNightly::new("Example.Package", version)
    }

    #[test]
    fn test_record_keeps_unparseable_strings() {
        let record = VersionRecord::new("release-candidate").unwrap();
        assert_eq!(record.raw(), "release-candidate");
        assert!(record.parsed().is_none());

        let record = VersionRecord::new("1.2.0").unwrap();
        assert_eq!(record.parsed(), Some(&Version::new(1, 2, 0)));
    }

    #[test]
    fn test_record_rejects_empty_string() {
        assert!(VersionRecord::new("").is_none());
        assert_eq!(KnownVersionSet::new(["", "1.0.0"]).len(), 1);
    }

    #[test]
    fn test_known_set_preserves_order() {
        let known = KnownVersionSet::new(["2.0.0", "1.0.0", "junk"]);
        let raws: Vec<&str> = known.iter().map(VersionRecord::raw).collect();
        assert_eq!(raws, vec!["2.0.0", "1.0.0", "junk"]);
    }

    #[test]
    fn test_direct_containment_supersedes() {
        let known = KnownVersionSet::new(["1.2.0"]);
        assert!(known.is_superseded(&candidate("1.2.0-nightly.5")));
    }

    #[test]
    fn test_direct_containment_uses_unparseable_tags() {
        let known = KnownVersionSet::new(["build-42"]);
        assert!(known.is_superseded(&candidate("1.0.0-build-42.nightly")));
    }

    #[test]
    fn test_major_bump_detaches_nightly() {
        let known = KnownVersionSet::new(["1.1.0", "2.0.0"]);
        assert!(known.is_superseded(&candidate("1.1.1-nightly.3")));
    }

    #[test]
    fn test_minor_bump_detaches_nightly() {
        let known = KnownVersionSet::new(["1.1.0", "1.2.0"]);
        assert!(known.is_superseded(&candidate("1.1.1-nightly.3")));
    }

    #[test]
    fn test_latest_nightly_is_kept() {
        let known = KnownVersionSet::new(["1.1.0"]);
        assert!(!known.is_superseded(&candidate("1.1.1-nightly.3")));
    }

    #[test]
    fn test_next_version_without_previous_is_kept() {
        let known = KnownVersionSet::new(["1.2.0", "2.0.0"]);
        assert!(!known.is_superseded(&candidate("1.1.5-nightly.0.2")));
    }

    #[test]
    fn test_nightly_after_minor_bump_needs_patch_rung() {
        // A nightly cut straight after a minor bump has no `patch - 1` release.
        let known = KnownVersionSet::new(["1.2.0", "2.0.0"]);
        assert!(!known.is_superseded(&candidate("1.3.0-nightly.0.1")));
    }

    #[test]
    fn test_unparseable_records_do_not_count_for_range_check() {
        let known = KnownVersionSet::new(["1.1.0", "2.0.0.1"]);
        assert!(!known.is_superseded(&candidate("1.1.1-nightly.3")));
    }

    #[test]
    fn test_unparseable_candidate_only_uses_containment() {
        let known = KnownVersionSet::new(["1.1.0", "2.0.0"]);
        assert!(!known.is_superseded(&candidate("1.1.1.7-nightly")));
        assert!(known.is_superseded(&candidate("1.1.0.7-nightly")));
    }

    #[test]
    fn test_empty_set_supersedes_nothing() {
        let known = KnownVersionSet::default();
        assert!(known.is_empty());
        assert!(!known.is_superseded(&candidate("1.0.1-nightly.0.1")));
    }

    #[test]
    fn test_largest_components_do_not_overflow() {
        let known = KnownVersionSet::new(["18446744073709551615.0.0", "1.18446744073709551615.0"]);
        assert!(!known.is_superseded(&candidate("18446744073709551615.0.1-nightly.0.1")));
        assert!(!known.is_superseded(&candidate("1.18446744073709551615.1-nightly.0.1")));
        assert!(!known.is_superseded(&candidate("18446744073709551615.18446744073709551615.1-nightly.0.1")));
    }

    #[test]
    fn test_four_part_tags_take_part_in_range_check() {
        let known = KnownVersionSet::new(["1.1.0.0", "2.0.0.1"]);
        assert!(known.is_superseded(&candidate("1.1.1-nightly.0.3")));
    }

    #[test]
    fn test_decision_is_repeatable() {
        let known = KnownVersionSet::new(["1.1.0", "1.2.0"]);
        let nightly = candidate("1.1.1-nightly.3");
        assert_eq!(known.is_superseded(&nightly), known.is_superseded(&nightly));
        assert!(known.is_superseded(&nightly));
    }

    #[test]
    fn test_candidate_is_nightly() {
        assert!(candidate("1.1.1-nightly.3").is_nightly());
        assert!(candidate("1.1.1-alpha.0.3").is_nightly());
        assert!(!candidate("1.1.1").is_nightly());
    }
}

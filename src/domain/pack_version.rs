use std::fmt;

/// Version and release notes handed to the packaging command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackVersion {
    pub version: String,
    pub release_notes: String,
}

impl PackVersion {
    pub fn new(version: impl Into<String>, release_notes: impl Into<String>) -> Self {
        PackVersion {
            version: version.into(),
            release_notes: release_notes.into(),
        }
    }
}

impl fmt::Display for PackVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PackVersion {{ version = {}, release notes = {} chars }}",
            self.version,
            self.release_notes.chars().count()
        )
    }
}

/// Escape commas so MSBuild does not split a property value
pub fn escape_commas(value: &str) -> String {
    value.replace(',', "%2c")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_commas() {
        assert_eq!(escape_commas("a, b,c"), "a%2c b%2cc");
        assert_eq!(escape_commas("no commas"), "no commas");
    }

    #[test]
    fn test_display_summarizes_notes() {
        let pv = PackVersion::new("1.0.0", "abc");
        assert_eq!(
            pv.to_string(),
            "PackVersion { version = 1.0.0, release notes = 3 chars }"
        );
    }
}

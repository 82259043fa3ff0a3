//! Nightly build classification
//!
//! A version is a nightly when its text mentions `nightly`, or when it ends
//! with two numeric prerelease labels (`3.2.5-alpha.0.1`), which is the shape
//! the height-based version resolver produces for untagged commits.

use crate::domain::Version;

/// Literal marker that nightly prerelease phases carry
pub const NIGHTLY_MARKER: &str = "nightly";

/// Decide whether a version is a nightly build
///
/// # Arguments
/// * `text` - Full string form of the version as published
/// * `parsed` - Structured form, when the text is a valid version
pub fn is_nightly(text: &str, parsed: Option<&Version>) -> bool {
    if text.contains(NIGHTLY_MARKER) {
        return true;
    }

    parsed.is_some_and(|version| ends_with_two_numeric_labels(&version.pre))
}

fn ends_with_two_numeric_labels(labels: &[String]) -> bool {
    match labels {
        [.., second_last, last] => is_integer(second_last) && is_integer(last),
        _ => false,
    }
}

fn is_integer(label: &str) -> bool {
    label.parse::<i32>().is_ok()
}

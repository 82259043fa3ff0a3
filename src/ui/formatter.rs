//! Pure formatting functions for UI output.
//!
//! Run results are rendered to strings here so the wording can be tested;
//! the `display_*` functions only print.

use crate::targets::{ReleaseOutcome, Target, TargetOutcome};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("\x1b[31mERROR:\x1b[0m {}", message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("\x1b[32m✓\x1b[0m {}", message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("\x1b[33m→\x1b[0m {}", message);
}

/// One line describing what a target did
pub fn format_outcome(target: Target, outcome: &TargetOutcome) -> String {
    let detail = match outcome {
        TargetOutcome::Described => "done".to_string(),
        TargetOutcome::Resolved(pack) => format!("version {}", pack.version),
        TargetOutcome::Compiled => "build command succeeded".to_string(),
        TargetOutcome::Merged(written) => format!("{} package(s) merged", written.len()),
        TargetOutcome::Skipped(reason) => format!("skipped ({})", reason),
        TargetOutcome::Hidden(summary) => {
            let verb = if summary.dry_run {
                "would be hidden"
            } else {
                "hidden"
            };
            format!(
                "{} nightly version(s) {} across {} package(s)",
                summary.hidden.len(),
                verb,
                summary.packages.len()
            )
        }
        TargetOutcome::Released(ReleaseOutcome::Created(release)) => {
            format!("release {} created", release.tag_name)
        }
        TargetOutcome::Released(ReleaseOutcome::Updated(release)) => {
            format!("release {} updated", release.tag_name)
        }
        TargetOutcome::Released(ReleaseOutcome::Planned { tag, existing }) => format!(
            "release {} would be {}",
            tag,
            if *existing { "updated" } else { "created" }
        ),
        TargetOutcome::Completed => "done".to_string(),
    };

    format!("{}: {}", target, detail)
}

/// Print the outcome of every executed target.
pub fn display_summary(outcomes: &[(Target, TargetOutcome)]) {
    println!("\n\x1b[1mSummary:\x1b[0m");
    for (target, outcome) in outcomes {
        match outcome {
            TargetOutcome::Skipped(_) => display_status(&format_outcome(*target, outcome)),
            _ => display_success(&format_outcome(*target, outcome)),
        }
    }
}

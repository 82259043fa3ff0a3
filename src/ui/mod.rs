//! Console output for the command-line front end.
//!
//! Diagnostics go through `tracing`; this module only prints the final
//! result of a run.

pub mod formatter;

pub use formatter::{display_error, display_status, display_success, display_summary, format_outcome};

pub mod build;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod github;
pub mod package;
pub mod registry;
pub mod targets;
pub mod ui;
pub mod warning;

pub use error::{PipelineError, Result};

//! Packaging command construction and execution

pub mod command;

pub use command::CommandSpec;

use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::{PipelineError, Result};

/// Runs external programs on behalf of the pipeline
pub trait CommandRunner: Send + Sync {
    /// Run the command in `working_dir`, failing on a non-zero exit code
    fn run(&self, spec: &CommandSpec, working_dir: &Path) -> Result<()>;
}

/// Runs commands as child processes, streaming their output to the console
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, spec: &CommandSpec, working_dir: &Path) -> Result<()> {
        let args = spec.arguments();
        info!("Executing {} with {:?}", spec.program, args);

        let status = Command::new(&spec.program)
            .args(&args)
            .current_dir(working_dir)
            .status()
            .map_err(|e| {
                PipelineError::process(format!("Failed to execute {}: {}", spec.program, e))
            })?;

        if !status.success() {
            return Err(PipelineError::process(format!(
                "{} failed with exit code {}",
                spec.program,
                status.code().unwrap_or(-1)
            )));
        }

        Ok(())
    }
}

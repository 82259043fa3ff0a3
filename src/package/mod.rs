//! Locating and reading NuGet package archives

pub mod numerge;
pub mod nupkg;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::warning::PipelineWarning;

/// Every file under `root` with the given extension, in glob order
pub fn find_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        extension
    );
    debug!("Searching {}", pattern);

    let paths = glob::glob(&pattern)
        .map_err(|e| PipelineError::package(format!("Invalid search pattern {}: {}", pattern, e)))?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| PipelineError::Io(e.into()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Distinct package ids of the given archives, in first-seen order
///
/// Archives without a root-level nuspec are skipped with a warning.
pub fn package_ids(archives: &[PathBuf]) -> Result<Vec<String>> {
    let mut ids: Vec<String> = Vec::new();

    for path in archives {
        match nupkg::read_package_id(path)? {
            Some(id) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            None => PipelineWarning::NupkgWithoutNuspec { path: path.clone() }.emit(),
        }
    }

    Ok(ids)
}

use std::path::PathBuf;

use tempfile::TempDir;
use tracing::info;

use crate::domain::PackVersion;
use crate::error::Result;
use crate::package::numerge::{
    self, MergeConfiguration, NUMERGE_CONFIG_FILE, PACKAGE_EXTENSION, SYMBOL_PACKAGE_EXTENSION,
};
use crate::targets::BuildContext;

/// Merge the freshly built packages as configured in `numerge.config.json`
///
/// Returns `None` when the repository has no merge configuration.
pub fn run(ctx: &BuildContext, pack: &PackVersion) -> Result<Option<Vec<PathBuf>>> {
    let root = &ctx.params.root;
    let config_path = root.join(NUMERGE_CONFIG_FILE);
    if !config_path.is_file() {
        info!("No {} found, skipping package merge", NUMERGE_CONFIG_FILE);
        return Ok(None);
    }

    info!("Starting Numerge'ing packages");
    let config = MergeConfiguration::load(&config_path)?;
    let build = &ctx.params.config.build;

    let staging = TempDir::new()?;
    info!("Created temporary directory: {}", staging.path().display());

    for extension in [PACKAGE_EXTENSION, SYMBOL_PACKAGE_EXTENSION] {
        let file_names = config.file_names(&pack.version, extension);
        let moved = numerge::move_packages(
            root,
            extension,
            &build.configuration,
            &file_names,
            staging.path(),
        )?;
        info!("Moved {} .{} file(s) to temporary directory", moved, extension);
    }

    let output = root.join(&build.artifacts_dir);
    info!("Output directory: {}", output.display());
    let written = numerge::merge(staging.path(), &output, &config, &pack.version)?;

    info!("Cleaning up temporary directory: {}", staging.path().display());
    staging.close()?;

    Ok(Some(written))
}

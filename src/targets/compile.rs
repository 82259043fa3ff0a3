use tracing::info;

use crate::build::CommandSpec;
use crate::domain::PackVersion;
use crate::error::Result;
use crate::targets::BuildContext;

/// Run the packaging command with the resolved version injected
pub fn run(ctx: &BuildContext, pack: &PackVersion) -> Result<()> {
    let (command, warning) = CommandSpec::for_pack(ctx.params.build_command.as_deref(), pack)?;
    if let Some(warning) = warning {
        warning.emit();
    }

    info!("Running build command: {}", command);
    ctx.runner.run(&command, &ctx.params.root)
}

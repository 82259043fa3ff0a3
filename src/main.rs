use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nuget_pipeline::config::{self, CiEnvironment, Parameters, Secret};
use nuget_pipeline::git::Git2Repository;
use nuget_pipeline::targets::{self, BuildContext, Target};
use nuget_pipeline::ui;

#[derive(clap::Parser)]
#[command(
    name = "nuget-pipeline",
    version,
    about = "Version, pack, merge and release NuGet packages in CI"
)]
struct Args {
    #[arg(value_enum, default_value_t = Target::Info, help = "Target to run")]
    target: Target,

    #[arg(long, default_value = ".", help = "Repository root")]
    root: PathBuf,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, env = "DRY_RUN", help = "Run all logic but change nothing remotely")]
    dry_run: bool,

    #[arg(long, env = "NUGET_FEED_URL", help = "NuGet v3 service index URL")]
    nuget_feed_url: Option<String>,

    #[arg(
        long,
        env = "NUGET_API_KEY",
        hide_env_values = true,
        help = "API key used to unlist packages"
    )]
    nuget_api_key: Option<String>,

    #[arg(long, help = "Tag to create or update a release for")]
    tag: Option<String>,

    #[arg(long, env = "BUILD_COMMAND", help = "Packaging command, `dotnet pack` by default")]
    build_command: Option<String>,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn parameters(args: &Args) -> Result<Parameters> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("Cannot access repository root {}", args.root.display()))?;
    let config = config::load_config(args.config.as_deref(), &root)?;

    let mut params = Parameters::new(root, config, CiEnvironment::from_env());
    params.dry_run = args.dry_run;
    if let Some(url) = args.nuget_feed_url.as_deref().filter(|u| !u.trim().is_empty()) {
        params.nuget_feed_url = url.trim().to_string();
    }
    params.nuget_api_key = Secret::non_empty(args.nuget_api_key.clone());
    params.tag = args.tag.clone().filter(|t| !t.trim().is_empty());
    if let Some(command) = &args.build_command {
        params.build_command = Some(command.clone());
    }

    Ok(params)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let params = parameters(&args)?;
    if params.dry_run {
        ui::display_status("Dry run: no packages or releases will be changed");
    }

    let repo = Git2Repository::open(&params.root)
        .with_context(|| format!("Cannot open git repository at {}", params.root.display()))?;
    let ctx = BuildContext::connect(params, Box::new(repo))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(targets::run(&ctx, args.target)) {
        Ok(outcomes) => {
            ui::display_summary(&outcomes);
            Ok(())
        }
        Err(e) => {
            ui::display_error(&format!("Target {} failed: {}", args.target, e));
            std::process::exit(1);
        }
    }
}

mod cli;

use doviconvert::config::{self, Config};
use doviconvert::host::{default_output, HostRunner};
use doviconvert_av::{dovi_profile, needs_conversion, probe_streams, StepOrchestrator, StreamMetadata};
use doviconvert_common::paths::is_video_file;
use doviconvert_common::PlatformId;
use doviconvert_tools::{
    check_tool, InstalledTools, ToolInfo, ToolLocator, ToolProvisioner, ToolSpec,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "doviconvert=trace,doviconvert_av=trace,doviconvert_tools=trace,doviconvert_common=debug"
                .to_string()
        } else {
            "doviconvert=info,doviconvert_av=info,doviconvert_tools=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_file(&file, cli.config.as_deref(), json))
        }
        Commands::Plan { file } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(plan_file(&file, cli.config.as_deref()))
        }
        Commands::Convert {
            file,
            output,
            dry_run,
            force,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(
                &file,
                output,
                cli.config.as_deref(),
                dry_run,
                force,
            ))
        }
        Commands::Provision => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(provision(cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("doviconvert {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

struct App {
    config: Config,
    platform: PlatformId,
    provisioner: ToolProvisioner,
}

fn setup(config_path: Option<&Path>) -> Result<App> {
    let config = config::load_config_or_default(config_path)?;
    let platform = PlatformId::resolve()?;
    let provisioner = config::build_provisioner(&config.tools)?.with_platform(platform.clone());
    Ok(App {
        config,
        platform,
        provisioner,
    })
}

fn runner<L: ToolLocator>(config: &Config, platform: &PlatformId, locator: L) -> HostRunner<L> {
    let catalog = config.tools.catalog(platform.os);
    let orchestrator = StepOrchestrator::new(locator, catalog);
    HostRunner::new(orchestrator, config.conversion.work_dir())
        .keep_intermediates(config.conversion.keep_intermediates)
        .step_timeout(config.conversion.step_timeout())
}

async fn probe(app: &App, file: &Path) -> Result<Vec<StreamMetadata>> {
    let ffprobe = app
        .provisioner
        .ensure(&ToolSpec::ffprobe(app.platform.os))
        .await
        .context("ffprobe is required to inspect files")?;
    Ok(probe_streams(&ffprobe, file)?)
}

async fn check_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }
    let app = setup(config_path)?;

    if !is_video_file(file) {
        println!("{}: not a video file", file.display());
        return Ok(());
    }

    let streams = probe(&app, file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&streams)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    if needs_conversion(&streams) {
        match dovi_profile(&streams) {
            Some(profile) => println!("Dolby Vision: Profile {}", profile),
            None => println!("Dolby Vision: present"),
        }
        println!("Conversion needed");
    } else {
        println!("No Dolby Vision configuration record found");
    }

    Ok(())
}

async fn plan_file(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let app = setup(config_path)?;
    let timeout = app.config.tools.provision_timeout();
    let runner = runner(&app.config, &app.platform, app.provisioner);

    let commands = tokio::time::timeout(timeout, runner.plan(file))
        .await
        .context("Provisioning timed out")??;

    for (i, command) in commands.iter().enumerate() {
        println!("{}. {}", i + 1, command);
    }
    Ok(())
}

async fn convert_file(
    file: &Path,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
    dry_run: bool,
    force: bool,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }
    let app = setup(config_path)?;

    if !force {
        if !is_video_file(file) {
            println!("{}: not a video file, nothing to do", file.display());
            return Ok(());
        }
        if !needs_conversion(&probe(&app, file).await?) {
            println!("No Dolby Vision metadata found. Use --force to convert anyway.");
            return Ok(());
        }
    }

    let output = output.unwrap_or_else(|| default_output(file));

    if dry_run {
        let runner = runner(
            &app.config,
            &app.platform,
            InstalledTools::new(app.provisioner),
        );
        let commands = runner.plan(file).await?;
        for (i, command) in commands.iter().enumerate() {
            println!("{}. {}", i + 1, command);
        }
        println!("\n[DRY RUN] Would write {}", output.display());
        return Ok(());
    }

    let timeout = app.config.tools.provision_timeout();
    let runner = runner(&app.config, &app.platform, app.provisioner);

    tracing::info!("Provisioning tools...");
    tokio::time::timeout(
        timeout,
        runner
            .orchestrator()
            .locator()
            .locate_all(runner.orchestrator().catalog()),
    )
    .await
    .context("Provisioning timed out")??;

    let report = runner
        .convert(file, &output)
        .await
        .with_context(|| format!("Failed to convert {:?}", file))?;

    println!("Conversion complete!");
    println!("Output: {}", report.output.display());
    if let Some(dir) = report.intermediates {
        println!("Intermediates: {}", dir.display());
    }
    Ok(())
}

async fn provision(config_path: Option<&Path>) -> Result<()> {
    let app = setup(config_path)?;
    let catalog = app.config.tools.catalog(app.platform.os);
    let timeout = app.config.tools.provision_timeout();

    println!("Provisioning tools for {}...\n", app.platform);
    let paths = tokio::time::timeout(timeout, app.provisioner.locate_all(&catalog))
        .await
        .context("Provisioning timed out")??;

    println!("ffmpeg:    {}", paths.ffmpeg.display());
    println!("dovi_tool: {}", paths.dovi_tool.display());
    println!("mp4box:    {}", paths.mp4box.display());
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let app = setup(config_path)?;
    let catalog = app.config.tools.catalog(app.platform.os);
    let ffprobe = ToolSpec::ffprobe(app.platform.os);

    let mut all_ok = true;
    for tool in catalog.iter().chain(std::iter::once(&ffprobe)) {
        let info = match app.provisioner.find_installed(tool)? {
            Some(path) => check_tool(&tool.name, &path),
            None => ToolInfo::missing(&tool.name),
        };
        all_ok &= info.available;
        print_tool(&info);
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Run `doviconvert provision` or install them.");
    }

    Ok(())
}

fn print_tool(tool: &ToolInfo) {
    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);

    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }

    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }

    println!();
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            config::validate_config(&config)?;
            print_config(&config);
        }
    }

    Ok(())
}

fn print_config(config: &Config) {
    println!("  Tool root: {}", config.tools.root_dir().display());
    println!("  Release API: {}", config.tools.release_api);
    println!("  dovi_tool repository: {}", config.tools.dovi_tool_repository);
    println!(
        "  mp4box: {}",
        config
            .tools
            .mp4box_repository
            .as_deref()
            .unwrap_or("system PATH")
    );
    println!("  Work dir: {}", config.conversion.work_dir().display());
    println!("  Keep intermediates: {}", config.conversion.keep_intermediates);
}

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use opr_cli::commands::{ReportContext, backlog, projects, tasks, version, work_packages};
use opr_cli::source::{ApiSource, RecordSource, SnapshotSource};
use opr_cli::{Cli, Commands, Config};

/// Opens the configured record source: a snapshot directory or the API.
fn open_source(cli: &Cli, config: &Config) -> Result<Box<dyn RecordSource>> {
    if let Some(dir) = &cli.snapshot {
        tracing::debug!(dir = %dir.display(), "reading snapshot");
        return Ok(Box::new(SnapshotSource::new(dir)));
    }
    let client = opr_client::Client::new(config.client_config()?)
        .context("failed to create API client")?;
    Ok(Box::new(ApiSource::new(client)?))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let source = open_source(&cli, &config)?;
    let ctx = ReportContext::new(source.as_ref(), &config, chrono::Utc::now());
    let stdout = std::io::stdout();
    let mut writer = stdout.lock();

    match command {
        Commands::VersionLink(args) => version::run_link(&mut writer, &ctx, &args.options)?,
        Commands::VersionHours(args) => version::run_hours(&mut writer, &ctx, &args.options)?,
        Commands::Tasks { report, json } => {
            tasks::run(&mut writer, &ctx, &report.options, *json)?;
        }
        Commands::MyTasks(args) => tasks::run_mine(&mut writer, &ctx, &args.options)?,
        Commands::Backlog(args) => backlog::run(&mut writer, &ctx, &args.options)?,
        Commands::StoryPoints(args) => {
            backlog::run_story_points(&mut writer, &ctx, &args.options)?;
        }
        Commands::VersionProjects { version, table } => {
            projects::run_version_projects(&mut writer, &ctx, version, *table)?;
        }
        Commands::Version { project, version } => {
            work_packages::run_version(&mut writer, &ctx, project, version)?;
        }
        Commands::Project { project } => work_packages::run_project(&mut writer, &ctx, project)?,
        Commands::WorkPackage { id } => work_packages::run_work_package(&mut writer, &ctx, id)?,
        Commands::ProjectInfo { project, property } => {
            projects::run_project_info(&mut writer, &ctx, project, property)?;
        }
    }

    writer.flush()?;
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use schemachain::{
    cli::commands::{
        check::CheckCommand,
        update::UpdateCommand,
        upload::{UploadCommand, UploadOverrides},
        CommandHandler,
    },
    cli::{Cli, Commands, LogLevel},
    config::SettingsLoader,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn initialize_tracing(log_level: &LogLevel) {
    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries command output
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level);

    let working_dir = std::env::current_dir().context("Failed to determine working directory")?;
    let settings = SettingsLoader::new(&working_dir)
        .load(cli.config.as_deref())
        .context("Failed to load settings")?;
    debug!(
        "Running {} in {} (modifies files: {}, network: {})",
        cli.command.name(),
        working_dir.display(),
        cli.command.modifies_files(),
        cli.command.uses_network()
    );

    let command: Box<dyn CommandHandler + Send + Sync> = match cli.command {
        Commands::Update {
            dir,
            capacity,
            dry_run,
        } => Box::new(UpdateCommand::new(
            settings.manifest,
            &working_dir,
            dir,
            capacity,
            dry_run,
        )?),
        Commands::Check { dir, capacity } => Box::new(CheckCommand::new(
            settings.manifest,
            &working_dir,
            dir,
            capacity,
        )?),
        Commands::Upload {
            file,
            server,
            remote_dir,
            timeout,
            retries,
            passive,
            user,
            password,
        } => Box::new(UploadCommand::new(
            file,
            settings.upload,
            UploadOverrides {
                server,
                remote_dir,
                timeout,
                retries,
                passive,
                user,
                password,
            },
        )?),
    };

    let name = command.name();
    command
        .execute()
        .await
        .with_context(|| format!("{} failed", name))?;
    Ok(())
}

mod auth;
mod cli;
mod commands;
mod config;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use carelink_client::config::loader;
use carelink_client::{ClientFactory, apply_logging_level, init_tracing};
use clap::Parser;
use colored::Colorize;
use tracing::debug;

use cli::{Cli, Commands, ConfigCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let profile = &cli.profile;
    let stored = config::load_profile(profile)?;
    let format = cli
        .format
        .or_else(|| stored.output_format())
        .unwrap_or_default();

    if let Commands::Config(args) = &cli.command {
        return configure(&args.command, profile, stored);
    }

    let factory = make_factory(&cli, &stored)?;
    let server = factory.config().api.base_url.clone();
    let auth = factory.auth();
    if auth.restore_session() {
        debug!(profile = %profile, "Restored stored session");
    }

    match &cli.command {
        Commands::Login(args) => commands::auth::login(&auth, args, &server).await?,
        Commands::Logout => commands::auth::logout(&auth, profile).await?,
        Commands::Whoami => commands::auth::whoami(&auth, profile, format).await?,
        Commands::Biometrics(args) => commands::auth::biometrics(&auth, &args.command)?,
        Commands::Patients(args) => {
            commands::records::run(factory.patients(), &args.command, format).await?
        }
        Commands::Inquiries(args) => {
            commands::records::run(factory.inquiries(), &args.command, format).await?
        }
        Commands::Evaluations(args) => {
            commands::records::run(factory.evaluations(), &args.command, format).await?
        }
        Commands::Appointments(args) => {
            commands::records::run(factory.appointments(), &args.command, format).await?
        }
        Commands::Dashboard(args) => {
            commands::dashboard::show(&factory.dashboard(), args, format).await?
        }
        Commands::Upload(args) => commands::upload::upload(&factory, args, format).await?,
        // Handled before connecting.
        Commands::Config(_) => {}
    }

    Ok(())
}

fn configure(command: &ConfigCommands, profile: &str, stored: config::ProfileConfig) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("{}: {}", "Profile".cyan(), profile);
            println!(
                "{}: {}",
                "Server".cyan(),
                stored.server.as_deref().unwrap_or("(not set)")
            );
            println!(
                "{}: {}",
                "Format".cyan(),
                stored.format.as_deref().unwrap_or("json")
            );
        }
        ConfigCommands::Set(set_args) => {
            let mut cfg = stored;
            cfg.set(&set_args.key, &set_args.value)?;
            config::save_profile(profile, &cfg)?;
            output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
        }
    }
    Ok(())
}

fn make_factory(cli: &Cli, stored: &config::ProfileConfig) -> Result<ClientFactory> {
    let mut settings = loader::load_config_with_default_path(cli.config.as_ref())
        .context("Invalid client settings")?;
    init_tracing(&settings.logging);
    if let Some(level) = &cli.log_level
        && !apply_logging_level(level)
    {
        anyhow::bail!("Invalid log level: {level}");
    }

    if let Some(server) = config::resolve_server(&cli.server, stored) {
        settings.api.base_url = server;
    }
    let vault = auth::open_vault(&cli.profile, &settings.auth.vault_namespace)?;
    let factory = ClientFactory::new(settings, Arc::new(vault), Arc::new(auth::TerminalGate))
        .context("Cannot set up the API client")?;
    Ok(factory)
}

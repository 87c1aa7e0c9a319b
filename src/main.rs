use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    build_coordinator, AnimalCommand, AnimalSubcommand, CatalogCommand, CatalogSubcommand,
    ConfigCommand, DashboardCommand, SyncCommand, VaccineCommand, VaccineSubcommand,
};
use herdbook::config::Config;
use herdbook::db::init_db;
use herdbook::inventory::Inventory;
use herdbook::sync::try_auto_sync;

#[derive(Parser)]
#[command(name = "herd")]
#[command(version)]
#[command(about = "Livestock inventory with offline-first sync", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage animals
    Animal(AnimalCommand),

    /// Record and list vaccinations
    Vaccine(VaccineCommand),

    /// Manage the vaccine catalog
    Catalog(CatalogCommand),

    /// Show herd KPIs
    Dashboard(DashboardCommand),

    /// Synchronize with the remote API
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herdbook=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    if let Commands::Config(cmd) = &command {
        return cmd.run(&config);
    }

    let pool = init_db(&config.database_path.value).await?;
    let coordinator = build_coordinator(&pool, &config).ok();

    // Auto-sync BEFORE read commands
    if is_read_command(&command) {
        if let Some(coordinator) = &coordinator {
            try_auto_sync(&config.sync, coordinator).await;
        }
    }

    let inventory = Inventory::new(pool.clone());
    let result = match &command {
        Commands::Animal(cmd) => cmd.run(&inventory).await,
        Commands::Vaccine(cmd) => cmd.run(&inventory).await,
        Commands::Catalog(cmd) => cmd.run(&inventory).await,
        Commands::Dashboard(cmd) => cmd.run(&pool, &config).await,
        Commands::Sync(cmd) => cmd.run(&pool, &config).await,
        Commands::Config(_) => Ok(()),
    };

    // Auto-sync AFTER write commands (only if command succeeded)
    if result.is_ok() && is_write_command(&command) {
        if let Some(coordinator) = &coordinator {
            try_auto_sync(&config.sync, coordinator).await;
        }
    }

    result
}

/// Returns true if the command is a read operation that should sync before execution.
fn is_read_command(cmd: &Commands) -> bool {
    matches!(
        cmd,
        Commands::Animal(a) if matches!(a.command,
            AnimalSubcommand::List { .. } | AnimalSubcommand::Show { .. })
    ) || matches!(
        cmd,
        Commands::Vaccine(v) if matches!(v.command, VaccineSubcommand::List { .. })
    ) || matches!(
        cmd,
        Commands::Catalog(c) if matches!(c.command, CatalogSubcommand::List)
    )
}

/// Returns true if the command is a write operation that should sync after execution.
fn is_write_command(cmd: &Commands) -> bool {
    matches!(
        cmd,
        Commands::Animal(a) if matches!(a.command,
            AnimalSubcommand::Add { .. }
            | AnimalSubcommand::Update { .. }
            | AnimalSubcommand::Delete { .. }
            | AnimalSubcommand::Restore { .. })
    ) || matches!(
        cmd,
        Commands::Vaccine(v) if matches!(v.command,
            VaccineSubcommand::Add { .. }
            | VaccineSubcommand::Delete { .. }
            | VaccineSubcommand::Restore { .. })
    ) || matches!(
        cmd,
        Commands::Catalog(c) if matches!(c.command, CatalogSubcommand::Add { .. })
    )
}

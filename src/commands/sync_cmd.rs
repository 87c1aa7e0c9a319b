//! Sync CLI commands for synchronizing with the remote API.

use clap::{Args, Subcommand};
use sqlx::SqlitePool;
use tokio::sync::watch;

use super::build_coordinator;
use herdbook::config::Config;
use herdbook::db::{AnimalRepository, VaccineRepository, VaccineTypeRepository};
use herdbook::network::{Connectivity, HealthProbe};
use herdbook::sync::{run_periodic, PushReport, SyncReport};

/// Sync with the remote API
#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,

    /// Keep running, syncing every `sync.interval_secs` until Ctrl-C
    #[arg(long)]
    watch: bool,
}

#[derive(Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration, pending changes and server status
    Status,
}

impl SyncCommand {
    pub async fn run(
        &self,
        pool: &SqlitePool,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None if self.watch => self.watch(pool, config).await,
            None => self.sync(pool, config).await,
            Some(SyncSubcommand::Status) => self.status(pool, config).await,
        }
    }

    async fn sync(&self, pool: &SqlitePool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let coordinator = build_coordinator(pool, config)?;

        println!("Syncing with {}...", coordinator.remote().base_url());
        println!();

        let report = coordinator.sync_all().await?;
        print_report(&report);
        Ok(())
    }

    async fn watch(&self, pool: &SqlitePool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let coordinator = build_coordinator(pool, config)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(true);
            }
        });

        println!(
            "Syncing every {}s with {} (Ctrl-C to stop)",
            config.sync.interval_secs,
            coordinator.remote().base_url()
        );
        let cycles = run_periodic(
            &coordinator,
            config.sync.interval(),
            config.sync.retry_backoff(),
            shutdown_rx,
        )
        .await;
        println!("Stopped after {} cycle(s)", cycles);
        Ok(())
    }

    async fn status(&self, pool: &SqlitePool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let Some(base_url) = &config.api.base_url else {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  api:");
            println!("    base_url: \"http://localhost:8080\"");
            println!("    token: \"your-token\"");
            println!("  sync:");
            println!("    auto_sync: false");
            println!();
            println!("Or set environment variables:");
            println!("  HERD_API_URL");
            println!("  HERD_API_TOKEN");
            return Ok(());
        };

        println!("Server:    {}", base_url);
        match &config.api.token {
            Some(token) => println!("Token:     {}...", token.chars().take(8).collect::<String>()),
            None => println!("Token:     (none)"),
        }
        println!(
            "Auto-sync: {}",
            if config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!();

        let animals = AnimalRepository::new(pool.clone()).list_unsynced().await?;
        let vaccines = VaccineRepository::new(pool.clone()).list_unsynced().await?;
        let types = VaccineTypeRepository::new(pool.clone()).list_unsynced().await?;
        println!("Pending changes:");
        println!(
            "  animals:       {} ({} never uploaded)",
            animals.len(),
            animals.iter().filter(|a| a.is_local_only()).count()
        );
        println!("  vaccinations:  {}", vaccines.len());
        println!("  vaccine types: {}", types.len());
        println!();

        print!("Server status: ");
        let status = HealthProbe::from_config(&config.api).status().await;
        if status.is_online() {
            println!("✓ reachable");
        } else if status.internet {
            println!("✗ reachable but unhealthy");
        } else {
            println!("✗ unreachable");
        }

        Ok(())
    }
}

fn print_push(label: &str, report: &PushReport) {
    print!(
        "  ↑ {:<13} {} created, {} updated",
        label, report.created, report.updated
    );
    if report.failed > 0 {
        print!(", {} failed", report.failed);
    }
    if report.skipped > 0 {
        print!(", {} deferred", report.skipped);
    }
    println!();
}

fn print_report(report: &SyncReport) {
    print_push("animals", &report.animals_pushed);
    print_push("vaccinations", &report.vaccines_pushed);
    for (label, stats) in [
        ("animals", &report.animals_pulled),
        ("vaccinations", &report.vaccines_pulled),
    ] {
        print!(
            "  ↓ {:<13} {} received, {} removed",
            label, stats.applied, stats.removed
        );
        if stats.kept_local > 0 {
            print!(", {} kept local edits", stats.kept_local);
        }
        println!();
    }
    println!("  ⇄ {:<13} {} type(s)", "catalog", report.vaccine_types);
    println!();

    let failed = report.animals_pushed.failed + report.vaccines_pushed.failed;
    if failed > 0 {
        println!("Sync complete with {} failed record(s); they will be retried.", failed);
    } else {
        println!("Sync complete.");
    }
}

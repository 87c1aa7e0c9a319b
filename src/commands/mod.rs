mod animal;
mod catalog;
mod config_cmd;
mod dashboard;
mod sync_cmd;
mod vaccine;

pub use animal::{AnimalCommand, AnimalSubcommand};
pub use catalog::{CatalogCommand, CatalogSubcommand};
pub use config_cmd::ConfigCommand;
pub use dashboard::DashboardCommand;
pub use sync_cmd::SyncCommand;
pub use vaccine::{VaccineCommand, VaccineSubcommand};

use clap::ValueEnum;
use sqlx::SqlitePool;

use herdbook::api::{ApiClient, ApiError};
use herdbook::config::Config;
use herdbook::network::HealthProbe;
use herdbook::sync::SyncCoordinator;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub type Coordinator = SyncCoordinator<ApiClient, HealthProbe>;

/// Wires the coordinator to the configured API. Fails when no base URL is
/// set.
pub fn build_coordinator(pool: &SqlitePool, config: &Config) -> Result<Coordinator, ApiError> {
    let client = ApiClient::from_config(&config.api)?;
    Ok(SyncCoordinator::new(
        pool.clone(),
        client,
        HealthProbe::from_config(&config.api),
    ))
}

fn confirm(prompt: &str) -> std::io::Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

use clap::Args;
use sqlx::SqlitePool;

use super::OutputFormat;
use herdbook::api::ApiClient;
use herdbook::config::Config;
use herdbook::dashboard::{cached_snapshot, DashboardService};
use herdbook::db::{AnimalRepository, KpiRepository};
use herdbook::loaded::Loaded;
use herdbook::network::HealthProbe;

#[derive(Args)]
pub struct DashboardCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl DashboardCommand {
    pub async fn run(
        &self,
        pool: &SqlitePool,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let loaded = match ApiClient::from_config(&config.api) {
            Ok(client) => {
                let service =
                    DashboardService::new(pool.clone(), client, HealthProbe::from_config(&config.api));
                service.load().await?
            }
            Err(e) => {
                let kpis = KpiRepository::new(pool.clone());
                let animals = AnimalRepository::new(pool.clone());
                Loaded::cached(cached_snapshot(&kpis, &animals).await?, e.to_string())
            }
        };

        match self.format {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "kpis": loaded.data,
                    "offline": loaded.offline,
                    "message": loaded.message,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            OutputFormat::Text => {
                let kpis = &loaded.data;
                println!("Herd Dashboard");
                println!("==============\n");
                println!("Total animals:   {}", kpis.total_animals);
                println!("Average weight:  {:.1} kg", kpis.average_weight);
                println!("Males:           {}", kpis.males);
                println!("Females:         {}", kpis.females);
                println!("In treatment:    {}", kpis.in_treatment);
                println!();
                if loaded.offline {
                    println!(
                        "No connection, showing data from {}",
                        kpis.updated_at.format("%Y-%m-%d %H:%M UTC")
                    );
                    if let Some(message) = &loaded.message {
                        println!("  ({})", message);
                    }
                } else {
                    println!("Updated {}", kpis.updated_at.format("%Y-%m-%d %H:%M UTC"));
                }
            }
        }
        Ok(())
    }
}

use clap::{Args, Subcommand};

use super::OutputFormat;
use herdbook::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("database_path: {}", config.database_path.value.display());
                        println!("  source: {}", config.database_path.source);
                        println!();

                        println!(
                            "api.base_url: {}",
                            config.api.base_url.as_deref().unwrap_or("(not set)")
                        );
                        println!(
                            "api.token: {}",
                            if config.api.token.is_some() { "(set)" } else { "(not set)" }
                        );
                        println!("api.timeout_secs: {}", config.api.timeout_secs);
                        println!();

                        println!("sync.auto_sync: {}", config.sync.auto_sync);
                        println!("sync.interval_secs: {}", config.sync.interval_secs);
                        println!("sync.retry_backoff_secs: {}", config.sync.retry_backoff_secs);
                    }
                }
                Ok(())
            }
        }
    }
}

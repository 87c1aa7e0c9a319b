use clap::{Args, Subcommand};

use herdbook::inventory::Inventory;

#[derive(Args)]
pub struct CatalogCommand {
    #[command(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// List known vaccine types
    List,

    /// Add a vaccine type
    Add {
        /// Vaccine name
        name: String,
    },
}

impl CatalogCommand {
    pub async fn run(&self, inventory: &Inventory) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CatalogSubcommand::List => {
                let types = inventory.vaccine_types().await?;
                if types.is_empty() {
                    println!("Catalog is empty");
                    return Ok(());
                }
                for entry in &types {
                    let marker = if entry.synchronized { "" } else { "  [pending sync]" };
                    println!("{}{}", entry.name, marker);
                }
                Ok(())
            }
            CatalogSubcommand::Add { name } => {
                if inventory.add_vaccine_type(name).await? {
                    println!("Added vaccine type: {}", name.trim());
                } else {
                    println!("Already in catalog: {}", name.trim());
                }
                Ok(())
            }
        }
    }
}

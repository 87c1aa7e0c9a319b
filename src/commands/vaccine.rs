use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use uuid::Uuid;

use super::OutputFormat;
use herdbook::inventory::Inventory;
use herdbook::models::Vaccine;

#[derive(Args)]
pub struct VaccineCommand {
    #[command(subcommand)]
    pub command: VaccineSubcommand,
}

#[derive(Subcommand)]
pub enum VaccineSubcommand {
    /// Record a vaccination
    Add {
        /// Animal ID (UUID) or tag
        animal: String,

        /// Vaccine name
        name: String,

        /// Application date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        dose: Option<String>,

        /// Batch/lot number
        #[arg(long)]
        lot: Option<String>,

        #[arg(long)]
        vet: Option<String>,

        /// Date the next dose is due (YYYY-MM-DD)
        #[arg(long)]
        next_dose: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List an animal's vaccinations
    List {
        /// Animal ID (UUID) or tag
        animal: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a vaccination record
    Delete {
        /// Vaccination ID
        id: Uuid,
    },

    /// Bring a deleted vaccination back
    Restore {
        /// Vaccination ID
        id: Uuid,
    },

    /// List deleted vaccinations
    Trash,
}

impl VaccineCommand {
    pub async fn run(&self, inventory: &Inventory) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            VaccineSubcommand::Add {
                animal,
                name,
                date,
                dose,
                lot,
                vet,
                next_dose,
                notes,
            } => {
                let animal = inventory.find_animal(animal).await?;
                let applied_on = date.unwrap_or_else(|| Local::now().date_naive());

                let mut vaccine = Vaccine::new(animal.id, name.as_str(), applied_on);
                if let Some(dose) = dose {
                    vaccine = vaccine.with_dose(dose.as_str());
                }
                if let Some(lot) = lot {
                    vaccine = vaccine.with_lot(lot.as_str());
                }
                if let Some(vet) = vet {
                    vaccine = vaccine.with_veterinarian(vet.as_str());
                }
                if let Some(next) = next_dose {
                    vaccine = vaccine.with_next_dose_on(*next);
                }
                if let Some(notes) = notes {
                    vaccine = vaccine.with_notes(notes.as_str());
                }

                let recorded = inventory.add_vaccine(vaccine).await?;
                println!("Recorded for {}: {}", animal.tag, recorded);
                Ok(())
            }

            VaccineSubcommand::List { animal, format } => {
                let animal = inventory.find_animal(animal).await?;
                let vaccines = inventory.vaccines_for(animal.id).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&vaccines)?);
                    }
                    OutputFormat::Text => {
                        if vaccines.is_empty() {
                            println!("No vaccinations recorded for {}", animal.tag);
                            return Ok(());
                        }
                        println!("Vaccinations for {}", animal.tag);
                        println!("{}", "-".repeat(40));
                        for vaccine in &vaccines {
                            println!("{}  {}", vaccine.id, vaccine);
                        }
                    }
                }
                Ok(())
            }

            VaccineSubcommand::Delete { id } => {
                inventory.delete_vaccine(*id).await?;
                println!("Deleted vaccination {}", id);
                Ok(())
            }

            VaccineSubcommand::Restore { id } => {
                inventory.restore_vaccine(*id).await?;
                println!("Restored vaccination {}", id);
                Ok(())
            }

            VaccineSubcommand::Trash => {
                let trashed = inventory.list_vaccine_trash().await?;
                if trashed.is_empty() {
                    println!("Trash is empty");
                    return Ok(());
                }
                for vaccine in &trashed {
                    println!("{}  {}", vaccine.id, vaccine);
                }
                Ok(())
            }
        }
    }
}

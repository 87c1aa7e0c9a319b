use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::{confirm, OutputFormat};
use herdbook::inventory::Inventory;
use herdbook::models::{Animal, Category, HealthStatus, Sex};

#[derive(Args)]
pub struct AnimalCommand {
    #[command(subcommand)]
    pub command: AnimalSubcommand,
}

#[derive(Subcommand)]
pub enum AnimalSubcommand {
    /// Register a new animal
    Add {
        /// Identification tag (ear tag, brand, ...)
        tag: String,

        /// male or female
        #[arg(long)]
        sex: Sex,

        /// calf, heifer, steer, cow, bull or other
        #[arg(long)]
        category: Category,

        #[arg(long)]
        breed: Option<String>,

        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        born: Option<NaiveDate>,

        /// Date the animal joined the herd (YYYY-MM-DD)
        #[arg(long)]
        intake: Option<NaiveDate>,

        /// Current weight in kg
        #[arg(long)]
        weight: Option<f64>,

        /// healthy, in_treatment, sick or recovering
        #[arg(long)]
        health: Option<HealthStatus>,

        /// Mother's tag or ID
        #[arg(long)]
        mother: Option<String>,

        /// Father's tag or ID
        #[arg(long)]
        father: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List active animals
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only this category
        #[arg(long)]
        category: Option<Category>,

        /// Only this sex
        #[arg(long)]
        sex: Option<Sex>,
    },

    /// Show an animal with its vaccinations
    Show {
        /// Animal ID (UUID) or tag
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing animal
    Update {
        /// Animal ID (UUID) or tag
        identifier: String,

        /// New identification tag
        #[arg(long)]
        tag: Option<String>,

        #[arg(long)]
        category: Option<Category>,

        #[arg(long)]
        breed: Option<String>,

        #[arg(long)]
        born: Option<NaiveDate>,

        #[arg(long)]
        intake: Option<NaiveDate>,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        health: Option<HealthStatus>,

        #[arg(long)]
        mother: Option<String>,

        #[arg(long)]
        father: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Move an animal to the trash
    Delete {
        /// Animal ID (UUID) or tag
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Bring an animal back from the trash
    Restore {
        /// Animal ID (UUID) or tag
        identifier: String,
    },

    /// Permanently remove a trashed animal and its vaccinations
    Purge {
        /// Animal ID (UUID) or tag
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// List the trash, or empty it
    Trash {
        /// Permanently remove everything in the trash
        #[arg(long)]
        empty: bool,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl AnimalCommand {
    pub async fn run(&self, inventory: &Inventory) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AnimalSubcommand::Add {
                tag,
                sex,
                category,
                breed,
                born,
                intake,
                weight,
                health,
                mother,
                father,
                notes,
            } => {
                let mut animal = Animal::new(tag.as_str(), *sex, *category);

                if let Some(breed) = breed {
                    animal = animal.with_breed(breed.as_str());
                }
                if let Some(date) = born {
                    animal = animal.with_birth_date(*date);
                }
                if let Some(date) = intake {
                    animal = animal.with_intake_date(*date);
                }
                if let Some(kg) = weight {
                    animal = animal.with_weight(*kg);
                }
                if let Some(status) = health {
                    animal = animal.with_health_status(*status);
                }
                if let Some(mother) = mother {
                    animal = animal.with_mother(inventory.parent(mother).await?);
                }
                if let Some(father) = father {
                    animal = animal.with_father(inventory.parent(father).await?);
                }
                if let Some(notes) = notes {
                    animal = animal.with_notes(notes.as_str());
                }

                let created = inventory.add_animal(animal).await?;
                println!("Added animal:");
                println!("{}", created);
                Ok(())
            }

            AnimalSubcommand::List {
                format,
                category,
                sex,
            } => {
                let animals: Vec<Animal> = inventory
                    .list_animals()
                    .await?
                    .into_iter()
                    .filter(|a| category.map_or(true, |c| a.category == c))
                    .filter(|a| sex.map_or(true, |s| a.sex == s))
                    .collect();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&animals)?);
                    }
                    OutputFormat::Text => print_table(&animals),
                }
                Ok(())
            }

            AnimalSubcommand::Show { identifier, format } => {
                let animal = inventory.find_animal(identifier).await?;
                let vaccines = inventory.vaccines_for(animal.id).await?;

                match format {
                    OutputFormat::Json => {
                        let value = serde_json::json!({
                            "animal": animal,
                            "vaccines": vaccines,
                        });
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", animal);
                        if !vaccines.is_empty() {
                            println!("\nVaccinations:");
                            for vaccine in &vaccines {
                                println!("  {}", vaccine);
                            }
                        }
                    }
                }
                Ok(())
            }

            AnimalSubcommand::Update {
                identifier,
                tag,
                category,
                breed,
                born,
                intake,
                weight,
                health,
                mother,
                father,
                notes,
            } => {
                let has_updates = tag.is_some()
                    || category.is_some()
                    || breed.is_some()
                    || born.is_some()
                    || intake.is_some()
                    || weight.is_some()
                    || health.is_some()
                    || mother.is_some()
                    || father.is_some()
                    || notes.is_some();

                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut animal = inventory.find_animal(identifier).await?;

                if let Some(tag) = tag {
                    animal.tag = tag.clone();
                }
                if let Some(category) = category {
                    animal.category = *category;
                }
                if let Some(breed) = breed {
                    animal.breed = breed.clone();
                }
                if let Some(date) = born {
                    animal.birth_date = Some(*date);
                }
                if let Some(date) = intake {
                    animal.intake_date = Some(*date);
                }
                if let Some(kg) = weight {
                    animal.weight_kg = Some(*kg);
                }
                if let Some(status) = health {
                    animal.health_status = *status;
                }
                if let Some(mother) = mother {
                    animal.mother = Some(inventory.parent(mother).await?);
                }
                if let Some(father) = father {
                    animal.father = Some(inventory.parent(father).await?);
                }
                if let Some(notes) = notes {
                    animal.notes = notes.clone();
                }

                let updated = inventory.update_animal(animal).await?;
                println!("Updated animal:");
                println!("{}", updated);
                Ok(())
            }

            AnimalSubcommand::Delete { identifier, force } => {
                let animal = inventory.find_animal(identifier).await?;
                if !force && !confirm(&format!("Move '{}' to the trash?", animal.tag))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
                inventory.delete_animal(animal.id).await?;
                println!("Moved to trash: {}", animal.tag);
                Ok(())
            }

            AnimalSubcommand::Restore { identifier } => {
                let animal = inventory.find_animal(identifier).await?;
                inventory.restore_animal(animal.id).await?;
                println!("Restored: {}", animal.tag);
                Ok(())
            }

            AnimalSubcommand::Purge { identifier, force } => {
                let animal = inventory.find_animal(identifier).await?;
                if !force
                    && !confirm(&format!(
                        "Permanently remove '{}' and its vaccinations?",
                        animal.tag
                    ))?
                {
                    println!("Purge cancelled.");
                    return Ok(());
                }
                inventory.purge_animal(animal.id).await?;
                println!("Purged: {}", animal.tag);
                Ok(())
            }

            AnimalSubcommand::Trash { empty, force } => {
                if *empty {
                    if !force && !confirm("Permanently remove everything in the trash?")? {
                        println!("Cancelled.");
                        return Ok(());
                    }
                    let removed = inventory.purge_trash().await?;
                    println!("Removed {} animal(s)", removed);
                    return Ok(());
                }

                let trashed = inventory.list_trash().await?;
                print_table(&trashed);
                Ok(())
            }
        }
    }
}

fn print_table(animals: &[Animal]) {
    if animals.is_empty() {
        println!("No animals found");
        return;
    }

    println!(
        "{:<12}  {:<8}  {:<7}  {:<14}  {:>8}  SYNC",
        "TAG", "CATEGORY", "SEX", "HEALTH", "WEIGHT"
    );
    println!("{}", "-".repeat(64));
    for animal in animals {
        let weight = animal
            .weight_kg
            .map(|kg| format!("{:.1}", kg))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12}  {:<8}  {:<7}  {:<14}  {:>8}  {}",
            animal.tag,
            animal.category.to_string(),
            animal.sex.to_string(),
            animal.health_status.to_string(),
            weight,
            if animal.synchronized { "yes" } else { "pending" }
        );
    }
    println!("\nTotal: {} animal(s)", animals.len());
}

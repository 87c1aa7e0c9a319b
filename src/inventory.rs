//! Record-keeping actions behind the user interface.
//!
//! Every mutation lands in the local store with `synchronized = false`; the
//! sync coordinator picks it up on its next cycle.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::db::{AnimalRepository, VaccineRepository, VaccineTypeRepository};
use crate::models::{Animal, ParentRef, Vaccine, VaccineType};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Local store error: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct Inventory {
    animals: AnimalRepository,
    vaccines: VaccineRepository,
    vaccine_types: VaccineTypeRepository,
}

impl Inventory {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            animals: AnimalRepository::new(pool.clone()),
            vaccines: VaccineRepository::new(pool.clone()),
            vaccine_types: VaccineTypeRepository::new(pool),
        }
    }

    /// Resolves a parent given by tag or local key.
    pub async fn parent(&self, identifier: &str) -> Result<ParentRef, InventoryError> {
        let animal = self.find_animal(identifier).await?;
        Ok(ParentRef::of(&animal))
    }

    /// Finds an animal by local key or tag.
    pub async fn find_animal(&self, identifier: &str) -> Result<Animal, InventoryError> {
        let found = match Uuid::parse_str(identifier) {
            Ok(id) => self.animals.get_by_id(id).await?,
            Err(_) => self.animals.get_by_tag(identifier).await?,
        };
        found.ok_or_else(|| InventoryError::NotFound(format!("animal '{}'", identifier)))
    }

    pub async fn add_animal(&self, mut animal: Animal) -> Result<Animal, InventoryError> {
        animal.tag = animal.tag.trim().to_string();
        self.validate(&animal).await?;
        animal.synchronized = false;
        self.animals.upsert(&animal).await?;
        info!(tag = %animal.tag, id = %animal.id, "Added animal");
        Ok(animal)
    }

    /// Saves edits to an existing animal and queues it for upload.
    pub async fn update_animal(&self, mut animal: Animal) -> Result<Animal, InventoryError> {
        let existing = self
            .animals
            .get_by_id(animal.id)
            .await?
            .ok_or_else(|| InventoryError::NotFound(format!("animal '{}'", animal.id)))?;

        animal.tag = animal.tag.trim().to_string();
        self.validate(&animal).await?;
        animal.server_id = existing.server_id;
        animal.created_at = existing.created_at;
        animal.touch();
        self.animals.upsert(&animal).await?;

        if existing.tag != animal.tag {
            self.animals.refresh_parent_tag(animal.id, &animal.tag).await?;
        }
        Ok(animal)
    }

    async fn validate(&self, animal: &Animal) -> Result<(), InventoryError> {
        if animal.tag.is_empty() {
            return Err(InventoryError::Validation(
                "Identification tag cannot be empty".to_string(),
            ));
        }
        if let Some(weight) = animal.weight_kg {
            if !weight.is_finite() || weight < 0.0 {
                return Err(InventoryError::Validation(format!(
                    "Invalid weight: {}",
                    weight
                )));
            }
        }
        for parent in [&animal.mother, &animal.father].into_iter().flatten() {
            if parent.animal_id == animal.id {
                return Err(InventoryError::Validation(
                    "An animal cannot be its own parent".to_string(),
                ));
            }
        }
        if let Some(other) = self.animals.get_by_tag(&animal.tag).await? {
            if other.active && other.id != animal.id {
                return Err(InventoryError::Validation(format!(
                    "Tag '{}' is already in use",
                    animal.tag
                )));
            }
        }
        Ok(())
    }

    /// Moves an animal to the trash.
    pub async fn delete_animal(&self, id: Uuid) -> Result<(), InventoryError> {
        if !self.animals.soft_delete(id).await? {
            return Err(InventoryError::NotFound(format!("active animal '{}'", id)));
        }
        Ok(())
    }

    pub async fn restore_animal(&self, id: Uuid) -> Result<(), InventoryError> {
        let animal = self
            .animals
            .get_by_id(id)
            .await?
            .ok_or_else(|| InventoryError::NotFound(format!("animal '{}'", id)))?;
        if animal.active {
            return Err(InventoryError::Validation(format!(
                "Animal '{}' is not in the trash",
                animal.tag
            )));
        }
        if let Some(other) = self.animals.get_by_tag(&animal.tag).await? {
            if other.active {
                return Err(InventoryError::Validation(format!(
                    "Tag '{}' is already in use",
                    animal.tag
                )));
            }
        }
        self.animals.restore(id).await?;
        Ok(())
    }

    /// Permanently removes an animal from the trash, with its vaccines.
    /// The server copy, if any, is left alone.
    pub async fn purge_animal(&self, id: Uuid) -> Result<(), InventoryError> {
        let animal = self
            .animals
            .get_by_id(id)
            .await?
            .ok_or_else(|| InventoryError::NotFound(format!("animal '{}'", id)))?;
        if animal.active {
            return Err(InventoryError::Validation(format!(
                "Animal '{}' must be deleted before it can be purged",
                animal.tag
            )));
        }
        self.animals.purge(id).await?;
        info!(tag = %animal.tag, "Purged animal");
        Ok(())
    }

    /// Empties the trash. Returns how many animals were removed.
    pub async fn purge_trash(&self) -> Result<usize, InventoryError> {
        let removed = self.animals.purge_deleted().await?;
        info!(removed, "Emptied trash");
        Ok(removed)
    }

    pub async fn list_animals(&self) -> Result<Vec<Animal>, InventoryError> {
        Ok(self.animals.list_active().await?)
    }

    pub async fn list_trash(&self) -> Result<Vec<Animal>, InventoryError> {
        Ok(self.animals.list_deleted().await?)
    }

    pub async fn add_vaccine(&self, mut vaccine: Vaccine) -> Result<Vaccine, InventoryError> {
        vaccine.name = vaccine.name.trim().to_string();
        if vaccine.name.is_empty() {
            return Err(InventoryError::Validation(
                "Vaccine name cannot be empty".to_string(),
            ));
        }
        let animal = self
            .animals
            .get_by_id(vaccine.animal_id)
            .await?
            .filter(|a| a.active)
            .ok_or_else(|| InventoryError::NotFound(format!("active animal '{}'", vaccine.animal_id)))?;
        if let Some(next) = vaccine.next_dose_on {
            if next < vaccine.applied_on {
                return Err(InventoryError::Validation(
                    "Next dose cannot be before the application date".to_string(),
                ));
            }
        }

        vaccine.synchronized = false;
        self.vaccines.upsert(&vaccine).await?;
        info!(animal = %animal.tag, vaccine = %vaccine.name, "Recorded vaccine");
        Ok(vaccine)
    }

    pub async fn vaccines_for(&self, animal_id: Uuid) -> Result<Vec<Vaccine>, InventoryError> {
        Ok(self.vaccines.list_for_animal(animal_id).await?)
    }

    pub async fn delete_vaccine(&self, id: Uuid) -> Result<(), InventoryError> {
        if !self.vaccines.soft_delete(id).await? {
            return Err(InventoryError::NotFound(format!("active vaccine '{}'", id)));
        }
        Ok(())
    }

    pub async fn restore_vaccine(&self, id: Uuid) -> Result<(), InventoryError> {
        let vaccine = self
            .vaccines
            .get_by_id(id)
            .await?
            .ok_or_else(|| InventoryError::NotFound(format!("vaccine '{}'", id)))?;
        let animal_active = self
            .animals
            .get_by_id(vaccine.animal_id)
            .await?
            .is_some_and(|a| a.active);
        if !animal_active {
            return Err(InventoryError::Validation(format!(
                "Restore the animal of vaccine '{}' first",
                vaccine.name
            )));
        }
        if !self.vaccines.restore(id).await? {
            return Err(InventoryError::Validation(format!(
                "Vaccine '{}' is not in the trash",
                vaccine.name
            )));
        }
        Ok(())
    }

    pub async fn list_vaccine_trash(&self) -> Result<Vec<Vaccine>, InventoryError> {
        Ok(self.vaccines.list_deleted().await?)
    }

    /// Adds a name to the vaccine catalog. Returns false if it was already
    /// there.
    pub async fn add_vaccine_type(&self, name: &str) -> Result<bool, InventoryError> {
        if name.trim().is_empty() {
            return Err(InventoryError::Validation(
                "Vaccine type cannot be empty".to_string(),
            ));
        }
        Ok(self.vaccine_types.add(name).await?)
    }

    pub async fn vaccine_types(&self) -> Result<Vec<VaccineType>, InventoryError> {
        Ok(self.vaccine_types.list().await?)
    }
}

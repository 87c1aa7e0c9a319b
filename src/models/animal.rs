use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::attributes::{Category, HealthStatus, Sex};

/// Reference to a parent animal by its local key, with the parent's
/// identification tag cached for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub animal_id: Uuid,
    pub tag: String,
}

impl ParentRef {
    pub fn new(animal_id: Uuid, tag: impl Into<String>) -> Self {
        Self {
            animal_id,
            tag: tag.into(),
        }
    }

    pub fn of(animal: &Animal) -> Self {
        Self::new(animal.id, animal.tag.clone())
    }
}

/// An animal in the herd.
///
/// `id` is the local key, assigned on creation and never changed. `server_id`
/// stays `None` until the record has been created on the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: Uuid,
    pub server_id: Option<i64>,
    pub tag: String,
    pub breed: String,
    pub sex: Sex,
    pub category: Category,
    pub birth_date: Option<NaiveDate>,
    pub intake_date: Option<NaiveDate>,
    pub weight_kg: Option<f64>,
    pub health_status: HealthStatus,
    pub notes: String,
    pub mother: Option<ParentRef>,
    pub father: Option<ParentRef>,
    pub synchronized: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Animal {
    pub fn new(tag: impl Into<String>, sex: Sex, category: Category) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            server_id: None,
            tag: tag.into(),
            breed: String::new(),
            sex,
            category,
            birth_date: None,
            intake_date: None,
            weight_kg: None,
            health_status: HealthStatus::default(),
            notes: String::new(),
            mother: None,
            father: None,
            synchronized: false,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = breed.into();
        self
    }

    pub fn with_birth_date(mut self, date: NaiveDate) -> Self {
        self.birth_date = Some(date);
        self
    }

    pub fn with_intake_date(mut self, date: NaiveDate) -> Self {
        self.intake_date = Some(date);
        self
    }

    pub fn with_weight(mut self, kg: f64) -> Self {
        self.weight_kg = Some(kg);
        self
    }

    pub fn with_health_status(mut self, status: HealthStatus) -> Self {
        self.health_status = status;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_mother(mut self, mother: ParentRef) -> Self {
        self.mother = Some(mother);
        self
    }

    pub fn with_father(mut self, father: ParentRef) -> Self {
        self.father = Some(father);
        self
    }

    /// Records a local edit: bumps `updated_at` and flags the record for upload.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.synchronized = false;
    }

    /// True when the record has never been created on the server.
    pub fn is_local_only(&self) -> bool {
        self.server_id.is_none()
    }
}

impl fmt::Display for Animal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}, {})", self.tag, self.category, self.sex)?;
        writeln!(f, "{}", "=".repeat(30))?;
        writeln!(f, "ID:      {}", self.id)?;
        match self.server_id {
            Some(sid) => writeln!(f, "Server:  #{}", sid)?,
            None => writeln!(f, "Server:  (not uploaded)")?,
        }
        if !self.breed.is_empty() {
            writeln!(f, "Breed:   {}", self.breed)?;
        }
        if let Some(date) = self.birth_date {
            writeln!(f, "Born:    {}", date)?;
        }
        if let Some(date) = self.intake_date {
            writeln!(f, "Intake:  {}", date)?;
        }
        if let Some(kg) = self.weight_kg {
            writeln!(f, "Weight:  {:.1} kg", kg)?;
        }
        writeln!(f, "Health:  {}", self.health_status)?;
        if let Some(mother) = &self.mother {
            writeln!(f, "Mother:  {}", mother.tag)?;
        }
        if let Some(father) = &self.father {
            writeln!(f, "Father:  {}", father.tag)?;
        }
        if !self.notes.is_empty() {
            writeln!(f, "\nNotes: {}", self.notes)?;
        }
        if !self.active {
            writeln!(f, "\n[deleted]")?;
        }
        if !self.synchronized {
            writeln!(f, "[pending sync]")?;
        }
        Ok(())
    }
}

//! Wire representations. Server ids are `i64`; an absent or zero id means
//! the record has not been created remotely.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Animal, Category, DashboardKpis, HealthStatus, ParentRef, Sex, Vaccine, VaccineType,
};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub tag: String,
    #[serde(default)]
    pub breed: String,
    pub sex: Sex,
    pub category: Category,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub intake_date: Option<NaiveDate>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub health_status: HealthStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub mother_id: Option<i64>,
    #[serde(default)]
    pub mother_tag: Option<String>,
    #[serde(default)]
    pub father_id: Option<i64>,
    #[serde(default)]
    pub father_tag: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl AnimalDto {
    /// Builds the upload payload. Parent server ids are passed in because
    /// only the store knows them.
    pub fn from_animal(animal: &Animal, mother_id: Option<i64>, father_id: Option<i64>) -> Self {
        Self {
            id: animal.server_id,
            tag: animal.tag.clone(),
            breed: animal.breed.clone(),
            sex: animal.sex,
            category: animal.category,
            birth_date: animal.birth_date,
            intake_date: animal.intake_date,
            weight_kg: animal.weight_kg,
            health_status: animal.health_status,
            notes: animal.notes.clone(),
            mother_id,
            mother_tag: animal.mother.as_ref().map(|p| p.tag.clone()),
            father_id,
            father_tag: animal.father.as_ref().map(|p| p.tag.clone()),
            active: animal.active,
        }
    }

    pub fn server_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    /// Converts a remote record into a synchronized local record.
    pub fn into_animal(
        self,
        local_id: Uuid,
        mother: Option<ParentRef>,
        father: Option<ParentRef>,
    ) -> Animal {
        let now = Utc::now();
        Animal {
            id: local_id,
            server_id: self.server_id(),
            tag: self.tag,
            breed: self.breed,
            sex: self.sex,
            category: self.category,
            birth_date: self.birth_date,
            intake_date: self.intake_date,
            weight_kg: self.weight_kg,
            health_status: self.health_status,
            notes: self.notes,
            mother,
            father,
            synchronized: true,
            active: self.active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccineDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub animal_id: i64,
    pub name: String,
    pub applied_on: NaiveDate,
    #[serde(default)]
    pub dose: Option<String>,
    #[serde(default)]
    pub lot: Option<String>,
    #[serde(default)]
    pub veterinarian: Option<String>,
    #[serde(default)]
    pub next_dose_on: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl VaccineDto {
    pub fn from_vaccine(vaccine: &Vaccine, animal_server_id: i64) -> Self {
        Self {
            id: vaccine.server_id,
            animal_id: animal_server_id,
            name: vaccine.name.clone(),
            applied_on: vaccine.applied_on,
            dose: vaccine.dose.clone(),
            lot: vaccine.lot.clone(),
            veterinarian: vaccine.veterinarian.clone(),
            next_dose_on: vaccine.next_dose_on,
            notes: vaccine.notes.clone(),
            active: vaccine.active,
        }
    }

    pub fn server_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    pub fn into_vaccine(self, local_id: Uuid, animal_id: Uuid) -> Vaccine {
        let now = Utc::now();
        Vaccine {
            id: local_id,
            server_id: self.server_id(),
            animal_id,
            name: self.name,
            applied_on: self.applied_on,
            dose: self.dose,
            lot: self.lot,
            veterinarian: self.veterinarian,
            next_dose_on: self.next_dose_on,
            notes: self.notes,
            synchronized: true,
            active: self.active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDto {
    pub total_animals: i64,
    pub average_weight: f64,
    pub males: i64,
    pub females: i64,
    pub in_treatment: i64,
}

impl KpiDto {
    pub fn into_kpis(self) -> DashboardKpis {
        DashboardKpis {
            total_animals: self.total_animals,
            average_weight: self.average_weight,
            males: self.males,
            females: self.females,
            in_treatment: self.in_treatment,
            updated_at: Utc::now(),
        }
    }
}

impl From<&DashboardKpis> for KpiDto {
    fn from(kpis: &DashboardKpis) -> Self {
        Self {
            total_animals: kpis.total_animals,
            average_weight: kpis.average_weight,
            males: kpis.males,
            females: kpis.females,
            in_treatment: kpis.in_treatment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineTypeDto {
    pub name: String,
}

impl From<&VaccineType> for VaccineTypeDto {
    fn from(entry: &VaccineType) -> Self {
        Self {
            name: entry.name.clone(),
        }
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A vaccine application, owned by exactly one animal (by local key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vaccine {
    pub id: Uuid,
    pub server_id: Option<i64>,
    pub animal_id: Uuid,
    pub name: String,
    pub applied_on: NaiveDate,
    pub dose: Option<String>,
    pub lot: Option<String>,
    pub veterinarian: Option<String>,
    pub next_dose_on: Option<NaiveDate>,
    pub notes: Option<String>,
    pub synchronized: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vaccine {
    pub fn new(animal_id: Uuid, name: impl Into<String>, applied_on: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            server_id: None,
            animal_id,
            name: name.into(),
            applied_on,
            dose: None,
            lot: None,
            veterinarian: None,
            next_dose_on: None,
            notes: None,
            synchronized: false,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_dose(mut self, dose: impl Into<String>) -> Self {
        self.dose = Some(dose.into());
        self
    }

    pub fn with_lot(mut self, lot: impl Into<String>) -> Self {
        self.lot = Some(lot.into());
        self
    }

    pub fn with_veterinarian(mut self, veterinarian: impl Into<String>) -> Self {
        self.veterinarian = Some(veterinarian.into());
        self
    }

    pub fn with_next_dose_on(mut self, date: NaiveDate) -> Self {
        self.next_dose_on = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.synchronized = false;
    }
}

impl fmt::Display for Vaccine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.applied_on, self.name)?;
        if let Some(dose) = &self.dose {
            write!(f, " ({})", dose)?;
        }
        if let Some(next) = self.next_dose_on {
            write!(f, "  next: {}", next)?;
        }
        if !self.synchronized {
            write!(f, "  [pending sync]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vaccine_builder() {
        let animal_id = Uuid::new_v4();
        let applied = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let next = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();

        let vaccine = Vaccine::new(animal_id, "Aftosa", applied)
            .with_dose("2 ml")
            .with_lot("L-77")
            .with_next_dose_on(next);

        assert_eq!(vaccine.animal_id, animal_id);
        assert_eq!(vaccine.dose.as_deref(), Some("2 ml"));
        assert_eq!(vaccine.next_dose_on, Some(next));
        assert!(vaccine.server_id.is_none());
        assert!(!vaccine.synchronized);
    }

    #[test]
    fn test_display_includes_next_dose() {
        let applied = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let vaccine = Vaccine::new(Uuid::new_v4(), "Rabies", applied)
            .with_next_dose_on(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

        let output = vaccine.to_string();
        assert!(output.contains("Rabies"));
        assert!(output.contains("next: 2026-03-01"));
    }
}

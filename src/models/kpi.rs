use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::animal::Animal;
use super::attributes::{HealthStatus, Sex};

/// Snapshot of the dashboard aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardKpis {
    pub total_animals: i64,
    pub average_weight: f64,
    pub males: i64,
    pub females: i64,
    pub in_treatment: i64,
    pub updated_at: DateTime<Utc>,
}

impl DashboardKpis {
    /// Aggregates `(sex, weight, health)` triples. Animals without a weight
    /// are left out of the average.
    pub fn tally<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (Sex, Option<f64>, HealthStatus)>,
    {
        let mut total = 0;
        let mut males = 0;
        let mut females = 0;
        let mut in_treatment = 0;
        let mut weight_sum = 0.0;
        let mut weighed = 0;

        for (sex, weight, health) in records {
            total += 1;
            match sex {
                Sex::Male => males += 1,
                Sex::Female => females += 1,
            }
            if health == HealthStatus::InTreatment {
                in_treatment += 1;
            }
            if let Some(kg) = weight {
                weight_sum += kg;
                weighed += 1;
            }
        }

        let average_weight = if weighed == 0 {
            0.0
        } else {
            weight_sum / weighed as f64
        };

        Self {
            total_animals: total,
            average_weight,
            males,
            females,
            in_treatment,
            updated_at: Utc::now(),
        }
    }

    /// Computes the snapshot from active animals.
    pub fn from_animals(animals: &[Animal]) -> Self {
        Self::tally(
            animals
                .iter()
                .filter(|a| a.active)
                .map(|a| (a.sex, a.weight_kg, a.health_status)),
        )
    }
}

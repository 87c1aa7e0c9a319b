use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(format!("Invalid sex '{}'. Valid options: male, female", s)),
        }
    }
}

/// Production category of an animal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Calf,
    Heifer,
    Steer,
    Cow,
    Bull,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Calf => write!(f, "calf"),
            Category::Heifer => write!(f, "heifer"),
            Category::Steer => write!(f, "steer"),
            Category::Cow => write!(f, "cow"),
            Category::Bull => write!(f, "bull"),
            Category::Other => write!(f, "other"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calf" => Ok(Category::Calf),
            "heifer" => Ok(Category::Heifer),
            "steer" => Ok(Category::Steer),
            "cow" => Ok(Category::Cow),
            "bull" => Ok(Category::Bull),
            "other" => Ok(Category::Other),
            _ => Err(format!(
                "Invalid category '{}'. Valid options: calf, heifer, steer, cow, bull, other",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Healthy,
    InTreatment,
    Sick,
    Recovering,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::InTreatment => write!(f, "in_treatment"),
            HealthStatus::Sick => write!(f, "sick"),
            HealthStatus::Recovering => write!(f, "recovering"),
        }
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "healthy" => Ok(HealthStatus::Healthy),
            "in_treatment" | "treatment" => Ok(HealthStatus::InTreatment),
            "sick" => Ok(HealthStatus::Sick),
            "recovering" => Ok(HealthStatus::Recovering),
            _ => Err(format!(
                "Invalid health status '{}'. Valid options: healthy, in_treatment, sick, recovering",
                s
            )),
        }
    }
}

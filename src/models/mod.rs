mod animal;
mod attributes;
mod kpi;
mod vaccine;
mod vaccine_type;

pub use animal::{Animal, ParentRef};
pub use attributes::{Category, HealthStatus, Sex};
pub use kpi::DashboardKpis;
pub use vaccine::Vaccine;
pub use vaccine_type::VaccineType;

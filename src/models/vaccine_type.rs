use serde::{Deserialize, Serialize};

/// Entry of the vaccine catalog. Names are unique ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineType {
    pub name: String,
    pub synchronized: bool,
}

impl VaccineType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            synchronized: false,
        }
    }

    /// Key used to detect duplicates between the local and remote catalogs.
    pub fn key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

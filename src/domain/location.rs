use serde::{Deserialize, Serialize};
use std::fmt;

/// A (city, district) pair to survey
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub district: String,
}

impl Location {
    pub fn new(city: impl Into<String>, district: impl Into<String>) -> Self {
        Self {
            city: city.into().trim().to_string(),
            district: district.into().trim().to_string(),
        }
    }

    /// File-name friendly label, e.g. `Adana_Cukurova`
    pub fn file_label(&self) -> String {
        format!("{}_{}", self.city, self.district).replace(' ', "_")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.city, self.district)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_labels() {
        let loc = Location::new(" Istanbul ", "Bahçelievler Merkez");
        assert_eq!(loc.city, "Istanbul");
        assert_eq!(loc.file_label(), "Istanbul_Bahçelievler_Merkez");
        assert_eq!(loc.to_string(), "Istanbul / Bahçelievler Merkez");
    }
}

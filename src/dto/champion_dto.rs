use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Champion {
    pub id: i64,
    pub name: String,
    /// Role tags ("Fighter", "Mage", ...). Advisory only, used for UI
    /// filtering, never for validation.
    #[serde(default)]
    pub tags: Vec<String>,
}

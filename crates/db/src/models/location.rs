//! Location entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use streamsource_core::types::{DbId, Timestamp};

/// A row from the `locations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Location {
    pub id: DbId,
    pub city: String,
    pub state_province: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_known_city: bool,
    pub normalized_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Location {
    /// `City, State, Country` with blanks skipped.
    pub fn display_name(&self) -> String {
        [Some(&self.city), self.state_province.as_ref(), self.country.as_ref()]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// DTO for creating a location (also the body of find-or-create and validate).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLocation {
    pub city: String,
    pub state_province: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_known_city: Option<bool>,
}

/// DTO for updating a location. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLocation {
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_known_city: Option<bool>,
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A bookable property. Read-mostly: created by seeding or admin tooling,
/// served to clients through the catalog endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub star_rating: i64,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub regional_amenities: Vec<String>,
    pub policies: Policies,
    pub featured: bool,
    pub rating: f64,
    pub review_count: i64,
    pub price_range: PriceRange,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub city: String,
    pub district: String,
    pub state: String,
    pub pin_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policies {
    pub check_in_time: String,
    pub check_out_time: String,
    pub cancellation_policy: String,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            check_in_time: "12:00 PM".to_string(),
            check_out_time: "11:00 AM".to_string(),
            cancellation_policy: "Free cancellation 24 hours before check-in".to_string(),
        }
    }
}

/// Advertised nightly price bounds across the hotel's room types. Price
/// filters apply to the lower bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

use serde::{Deserialize, Serialize};

/// A room type within a hotel, priced per night. `unit_count` is the number
/// of physical units of this type; no inventory locking happens in scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub hotel_id: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub description: String,
    pub price_per_night: f64,
    pub capacity: Capacity,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    #[serde(rename = "count")]
    pub unit_count: i64,
    pub availability: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Capacity {
    pub adults: i64,
    pub children: i64,
}

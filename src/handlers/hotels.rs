use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Hotel, Room};
use crate::state::AppState;
use crate::store::{HotelFilter, Store};

/// How many hotels the promotional strip shows, regardless of how many
/// carry the featured flag.
const FEATURED_LIMIT: i64 = 6;

// GET /api/hotels
#[derive(Deserialize)]
pub struct HotelListQuery {
    pub city: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
    pub stars: Option<String>,
    pub amenities: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

pub async fn list_hotels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HotelListQuery>,
) -> Result<Json<Vec<Hotel>>, AppError> {
    let filter = HotelFilter::from_params(
        query.city,
        query.min_price,
        query.max_price,
        query.stars,
        query.amenities,
        query.search,
        query.sort,
    );

    let hotels = state.store.list_hotels(&filter).await?;
    Ok(Json(hotels))
}

// GET /api/hotels/featured
pub async fn featured_hotels(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Hotel>>, AppError> {
    let hotels = state.store.featured_hotels(FEATURED_LIMIT).await?;
    Ok(Json(hotels))
}

// GET /api/hotels/:id
#[derive(Serialize)]
pub struct HotelWithRooms {
    #[serde(flatten)]
    pub hotel: Hotel,
    pub rooms: Vec<Room>,
}

pub async fn get_hotel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<HotelWithRooms>, AppError> {
    let hotel = state
        .store
        .get_hotel(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("hotel not found".to_string()))?;

    let rooms = state.store.rooms_for_hotel(&id).await?;

    Ok(Json(HotelWithRooms { hotel, rooms }))
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Address, User};
use crate::services::auth;
use crate::state::AppState;
use crate::store::Store;

async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let claims = auth::authenticate(headers, &state.config.jwt_secret)?;
    state
        .store
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))
}

// GET /api/users/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<User>, AppError> {
    let user = current_user(&state, &headers).await?;
    Ok(Json(user))
}

// PUT /api/users/profile
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub address: Option<Address>,
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let mut user = current_user(&state, &headers).await?;

    if let Some(full_name) = body.full_name {
        user.full_name = full_name;
    }
    if let Some(phone) = body.phone {
        user.phone = phone;
    }
    if let Some(profile_image) = body.profile_image {
        user.profile_image = Some(profile_image);
    }
    if let Some(address) = body.address {
        user.address = Some(address);
    }
    user.updated_at = chrono::Utc::now().naive_utc();

    state.store.update_user(&user).await?;
    Ok(Json(user))
}

// GET /api/users/favorites
pub async fn get_favorites(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<String>>, AppError> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let favorites = state.store.favorites(&claims.sub).await?;
    Ok(Json(favorites))
}

// POST /api/users/favorites/toggle
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteRequest {
    pub hotel_id: String,
}

pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ToggleFavoriteRequest>,
) -> Result<Json<Vec<String>>, AppError> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let favorites = state
        .store
        .toggle_favorite(&claims.sub, &body.hotel_id)
        .await?;
    Ok(Json(favorites))
}

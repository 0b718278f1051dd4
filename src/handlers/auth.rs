use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, FieldError};
use crate::models::{Role, User, UserSummary};
use crate::services::auth;
use crate::state::AppState;
use crate::store::Store;

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

// POST /api/auth/register
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

fn validate_register(body: &RegisterRequest) -> Vec<FieldError> {
    let mut errors = vec![];
    if body.full_name.trim().len() < 2 {
        errors.push(FieldError::new("fullName", "must be at least 2 characters"));
    }
    if !body.email.contains('@') || body.email.trim().is_empty() {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    if body.password.len() < 6 {
        errors.push(FieldError::new("password", "must be at least 6 characters"));
    }
    if body.phone.trim().len() < 10 {
        errors.push(FieldError::new("phone", "must be at least 10 digits"));
    }
    errors
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let errors = validate_register(&body);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if state.store.user_by_email(body.email.trim()).await?.is_some() {
        return Err(AppError::Conflict("user already exists".to_string()));
    }

    let now = Utc::now().naive_utc();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        full_name: body.full_name.trim().to_string(),
        email: body.email.trim().to_string(),
        password_hash: auth::hash_password(&body.password)?,
        phone: body.phone.trim().to_string(),
        profile_image: None,
        address: None,
        role: Role::User,
        is_verified: false,
        created_at: now,
        updated_at: now,
    };

    state.store.create_user(&user).await?;
    tracing::info!("registered user {}", user.id);

    let token = auth::issue_token(
        &user.id,
        user.role.as_str(),
        &state.config.jwt_secret,
        state.config.token_ttl_days,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .store
        .user_by_email(body.email.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !auth::verify_password(&body.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = auth::issue_token(
        &user.id,
        user.role.as_str(),
        &state.config.jwt_secret,
        state.config.token_ttl_days,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

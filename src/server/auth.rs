use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use super::{ApiError, AppState, AuthUser, MessageResponse};
use crate::models::PublicUser;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation(
            "username, email and password are required",
        ));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal server error",
        )
    })?;

    state.users.create(username, email, &password_hash).await?;

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("User registered successfully"),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .users
        .find_by_email(req.email.trim())
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or_else(|| ApiError::validation("Invalid credentials"))?;

    let token = state.tokens.issue(user.id);
    tracing::info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state.users.get(auth.id).await?;
    let favorites = state.users.favorite_ids(auth.id).await?;
    Ok(Json(MeResponse {
        user: user.to_public(favorites),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Json<MessageResponse> {
    state.tokens.revoke(&auth.token);
    tracing::info!("User {} logged out", auth.username);
    MessageResponse::new("Logged out")
}

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{parse_id, ApiError, AppState, AuthUser};
use crate::models::Recipe;

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    Ok(Json(state.favorites.list(user.id).await?))
}

pub async fn add(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipe_id = parse_id(&recipe_id, "Recipe")?;
    Ok(Json(state.favorites.add(user.id, recipe_id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipe_id = parse_id(&recipe_id, "Recipe")?;
    Ok(Json(state.favorites.remove(user.id, recipe_id).await?))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use super::{parse_id, ApiError, AppState, AuthUser, MessageResponse};
use crate::models::{Recipe, RecipeInput, RecipePatch};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    title: Option<String>,
    /// Comma-separated tag list
    tags: Option<String>,
}

impl SearchParams {
    fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    Ok(Json(state.recipes.list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, ApiError> {
    let id = parse_id(&id, "Recipe")?;
    Ok(Json(state.recipes.get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<RecipeInput>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let recipe = state.recipes.create(input, user.id).await?;
    tracing::info!("{} created recipe {}", user.username, recipe.id);
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(patch): Json<RecipePatch>,
) -> Result<Json<Recipe>, ApiError> {
    let id = parse_id(&id, "Recipe")?;
    let recipe = state.recipes.update(id, patch, user.id, user.role).await?;
    Ok(Json(recipe))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, "Recipe")?;
    state.recipes.delete(id, user.id, user.role).await?;
    Ok(MessageResponse::new("Recipe deleted"))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let tags = params.tag_list();
    let recipes = state.recipes.search(params.title.as_deref(), &tags).await?;
    Ok(Json(recipes))
}

pub async fn by_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    Ok(Json(state.recipes.by_category(&name).await?))
}

pub async fn tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.recipes.tags().await?))
}

#[cfg(test)]
mod tests {
    use crate::server::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    fn pancakes() -> Value {
        json!({
            "title": "Pancakes",
            "category": "Breakfast",
            "duration": "20 min",
            "ingredients": [{"amount": "2 cups", "name": "Flour"}],
            "instructions": [
                {"stepNumber": 5, "description": "Mix"},
                {"stepNumber": 2, "description": "Fry"},
                {"description": "Eat"}
            ],
            "macros": {"calories": "350"},
            "tags": ["sweet", "quick"]
        })
    }

    async fn create(app: &TestApp, token: &str, body: Value) -> Value {
        let (status, created) = app
            .send(Method::POST, "/recipes", Some(token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        created
    }

    #[tokio::test]
    async fn test_create_assigns_owner_and_renumbers() {
        let app = TestApp::new().await;
        let (token, user_id) = app.login_as("ann").await;

        let created = create(&app, &token, pancakes()).await;

        assert_eq!(created["owner"], user_id.to_string());
        let steps: Vec<u64> = created["instructions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["stepNumber"].as_u64().unwrap())
            .collect();
        assert_eq!(steps, vec![1, 2, 3]);
        assert_eq!(created["instructions"][0]["description"], "Mix");
    }

    #[tokio::test]
    async fn test_create_validation_error() {
        let app = TestApp::new().await;
        let (token, _) = app.login_as("ann").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/recipes",
                Some(&token),
                Some(json!({"title": "", "category": "x", "duration": "1 min"})),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");
    }

    #[tokio::test]
    async fn test_get_unknown_and_malformed_ids() {
        let app = TestApp::new().await;

        let uri = format!("/recipes/{}", uuid::Uuid::new_v4());
        let (status, body) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Recipe not found");

        let (status, _) = app.send(Method::GET, "/recipes/not-a-uuid", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_ownership_scenario() {
        let app = TestApp::new().await;
        let (token_a, _) = app.login_as("alice").await;
        let (token_b, _) = app.login_as("bob").await;
        let (admin, _) = app.login_as_admin("root").await;

        let recipe = create(&app, &token_a, pancakes()).await;
        let uri = format!("/recipes/{}", recipe["id"].as_str().unwrap());

        let (status, _) = app.send(Method::DELETE, &uri, Some(&token_b), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Recipe deleted");

        let (status, _) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_patch_by_non_owner_leaves_recipe_unchanged() {
        let app = TestApp::new().await;
        let (token_a, _) = app.login_as("alice").await;
        let (token_b, _) = app.login_as("bob").await;

        let recipe = create(&app, &token_a, pancakes()).await;
        let uri = format!("/recipes/{}", recipe["id"].as_str().unwrap());

        let (status, _) = app
            .send(
                Method::PATCH,
                &uri,
                Some(&token_b),
                Some(json!({"title": "Stolen"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, stored) = app.send(Method::GET, &uri, None, None).await;
        assert_eq!(stored, recipe);
    }

    #[tokio::test]
    async fn test_patch_by_owner() {
        let app = TestApp::new().await;
        let (token, _) = app.login_as("alice").await;
        let recipe = create(&app, &token, pancakes()).await;
        let uri = format!("/recipes/{}", recipe["id"].as_str().unwrap());

        let (status, updated) = app
            .send(
                Method::PATCH,
                &uri,
                Some(&token),
                Some(json!({
                    "duration": "25 min",
                    "instructions": [{"stepNumber": 7, "description": "Only step"}]
                })),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["duration"], "25 min");
        assert_eq!(updated["title"], "Pancakes");
        assert_eq!(updated["instructions"][0]["stepNumber"], 1);
    }

    #[tokio::test]
    async fn test_search_and_category() {
        let app = TestApp::new().await;
        let (token, _) = app.login_as("alice").await;
        create(&app, &token, pancakes()).await;
        create(
            &app,
            &token,
            json!({"title": "Spicy Chili", "category": "Dinner", "duration": "1 h", "tags": ["spicy"]}),
        )
        .await;

        let (_, found) = app
            .send(Method::GET, "/recipes/search?title=PAN", None, None)
            .await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (_, found) = app
            .send(Method::GET, "/recipes/search?tags=spicy,%20quick", None, None)
            .await;
        assert_eq!(found.as_array().unwrap().len(), 2);

        let (_, found) = app
            .send(Method::GET, "/recipes/search?title=chili&tags=quick", None, None)
            .await;
        assert!(found.as_array().unwrap().is_empty());

        let (status, found) = app
            .send(Method::GET, "/recipes/category/Dinner", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found[0]["title"], "Spicy Chili");

        let (status, body) = app
            .send(Method::GET, "/recipes/category/Dessert", None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No recipes found in this category");

        let (_, tags) = app.send(Method::GET, "/tags", None, None).await;
        assert_eq!(tags, json!(["quick", "spicy", "sweet"]));
    }
}

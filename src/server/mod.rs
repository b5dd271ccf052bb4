//! HTTP surface of the recipe catalog.
//!
//! # Endpoints
//!
//! Public:
//! - `GET /health`
//! - `GET /recipes`, `GET /recipes/search?title=&tags=a,b`,
//!   `GET /recipes/category/{name}`, `GET /recipes/{id}`, `GET /tags`
//! - `POST /api/auth/register`, `POST /api/auth/login`
//!
//! Bearer token required:
//! - `POST /recipes`, `PATCH /recipes/{id}`, `DELETE /recipes/{id}`
//! - `GET /api/auth/me`, `POST /api/auth/logout`
//! - `GET /api/favorites`, `POST /api/favorites/{recipeId}`,
//!   `DELETE /api/favorites/{recipeId}`

mod auth;
mod error;
mod favorites;
pub mod password;
mod recipes;
pub mod tokens;

pub use error::{ApiError, ErrorBody};
pub use tokens::TokenStore;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::db::{FavoritesRepository, RecipeRepository, UserRepository};
use crate::models::Role;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub recipes: RecipeRepository,
    pub users: UserRepository,
    pub favorites: FavoritesRepository,
    pub tokens: Arc<TokenStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool, tokens: Arc<TokenStore>) -> Self {
        Self {
            recipes: RecipeRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            favorites: FavoritesRepository::new(pool),
            tokens,
        }
    }
}

/// Authenticated user info, added to request extensions after auth
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub token: String,
}

/// Authentication middleware
async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => {
                return ApiError::unauthorized(
                    "invalid_auth",
                    "Authorization header must use Bearer scheme",
                )
                .into_response();
            }
        },
        None => {
            return ApiError::unauthorized("missing_auth", "Authorization header required")
                .into_response();
        }
    };

    let Some(user_id) = state.tokens.verify(&token) else {
        return ApiError::unauthorized("invalid_token", "Invalid or expired token")
            .into_response();
    };

    match state.users.find(user_id).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(AuthUser {
                id: user.id,
                username: user.username,
                role: user.role,
                token,
            });
            next.run(request).await
        }
        Ok(None) => {
            tracing::debug!("Token presented for deleted user {}", user_id);
            ApiError::forbidden("User no longer exists").into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Simple `{message}` response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Parses a path id. Ids that are not UUIDs cannot name any resource.
fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", what)))
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    // Routes mixing public reads with protected writes carry the auth layer
    // on the protected methods only.
    let recipe_routes = Router::new()
        .route(
            "/recipes",
            get(recipes::list).merge(post(recipes::create).route_layer(auth.clone())),
        )
        .route("/recipes/search", get(recipes::search))
        .route("/recipes/category/{name}", get(recipes::by_category))
        .route(
            "/recipes/{id}",
            get(recipes::get).merge(
                axum::routing::patch(recipes::update)
                    .delete(recipes::delete)
                    .route_layer(auth.clone()),
            ),
        )
        .route("/tags", get(recipes::tags));

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/favorites", get(favorites::list))
        .route(
            "/api/favorites/{recipe_id}",
            post(favorites::add).delete(favorites::remove),
        )
        .route_layer(auth);

    Router::new()
        .merge(public_routes)
        .merge(recipe_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::test_support::{setup_db, TestContext};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
        _ctx: TestContext,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let ctx = setup_db().await;
            let state = AppState::new(ctx.pool.clone(), Arc::new(TokenStore::new(60)));
            Self {
                router: router(state.clone()),
                state,
                _ctx: ctx,
            }
        }

        pub async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, json)
        }

        /// Registers and logs in a user, returning (token, user id).
        pub async fn login_as(&self, username: &str) -> (String, Uuid) {
            let email = format!("{}@example.com", username);
            let (status, _) = self
                .send(
                    Method::POST,
                    "/api/auth/register",
                    None,
                    Some(serde_json::json!({
                        "username": username,
                        "email": email,
                        "password": "password123",
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);

            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/auth/login",
                    None,
                    Some(serde_json::json!({ "email": email, "password": "password123" })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);

            let token = body["token"].as_str().unwrap().to_string();
            let id = body["userId"].as_str().unwrap().parse().unwrap();
            (token, id)
        }

        pub async fn login_as_admin(&self, username: &str) -> (String, Uuid) {
            let (token, id) = self.login_as(username).await;
            self.state
                .users
                .set_role(&format!("{}@example.com", username), Role::Admin)
                .await
                .unwrap();
            (token, id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::TestApp;
    use super::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new().await;

        let (status, body) = app.send(Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_missing_auth_header() {
        let app = TestApp::new().await;

        let (status, body) = app.send(Method::GET, "/api/auth/me", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_auth");
    }

    #[tokio::test]
    async fn test_non_bearer_scheme() {
        let app = TestApp::new().await;
        let request = axum::http::Request::builder()
            .uri("/api/favorites")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = tower::ServiceExt::oneshot(app.router.clone(), request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let app = TestApp::new().await;

        let (status, body) = app
            .send(Method::GET, "/api/auth/me", Some("not-a-real-token"), None)
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_token");
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_is_forbidden() {
        let app = TestApp::new().await;
        let (token, _) = app.login_as("ann").await;

        app.state
            .users
            .delete_by_email("ann@example.com")
            .await
            .unwrap();

        let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_public_reads_need_no_token() {
        let app = TestApp::new().await;

        let (status, body) = app.send(Method::GET, "/recipes", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));

        let (status, _) = app.send(Method::GET, "/tags", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_writes_need_token() {
        let app = TestApp::new().await;

        let (status, _) = app
            .send(
                Method::POST,
                "/recipes",
                None,
                Some(serde_json::json!({"title": "x"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let id = Uuid::new_v4();
        let (status, _) = app
            .send(Method::DELETE, &format!("/recipes/{}", id), None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

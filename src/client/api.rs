//! HTTP client for the recipe catalog server.

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{PublicUser, Recipe, RecipeInput, RecipePatch};
use crate::server::ErrorBody;

/// Errors surfaced by client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Could not reach server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Server returned {status}: {message}")]
    Server { status: StatusCode, message: String },
    #[error("Not logged in. Run `recipebox auth login` first.")]
    NotLoggedIn,
}

impl ClientError {
    /// True when the server rejected the credential or its subject.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized(_) | ClientError::Forbidden(_)
        )
    }
}

#[derive(Debug, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
}

#[derive(serde::Deserialize)]
struct MeResponse {
    user: PublicUser,
}

#[derive(serde::Deserialize)]
struct MessageResponse {
    message: String,
}

/// Thin typed wrapper over the server's JSON API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, ClientError> {
        self.send(self.request(Method::GET, "/recipes", None)).await
    }

    pub async fn get_recipe(&self, id: Uuid) -> Result<Recipe, ClientError> {
        let path = format!("/recipes/{}", id);
        self.send(self.request(Method::GET, &path, None)).await
    }

    pub async fn search(
        &self,
        title: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<Recipe>, ClientError> {
        let mut query = Vec::new();
        if let Some(title) = title {
            query.push(("title", title.to_string()));
        }
        if !tags.is_empty() {
            query.push(("tags", tags.join(",")));
        }
        let request = self
            .request(Method::GET, "/recipes/search", None)
            .query(&query);
        self.send(request).await
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<Recipe>, ClientError> {
        let path = format!("/recipes/category/{}", urlencoding::encode(category));
        self.send(self.request(Method::GET, &path, None)).await
    }

    pub async fn tags(&self) -> Result<Vec<String>, ClientError> {
        self.send(self.request(Method::GET, "/tags", None)).await
    }

    pub async fn create_recipe(
        &self,
        token: &str,
        input: &RecipeInput,
    ) -> Result<Recipe, ClientError> {
        let request = self.request(Method::POST, "/recipes", Some(token)).json(input);
        self.send(request).await
    }

    pub async fn update_recipe(
        &self,
        token: &str,
        id: Uuid,
        patch: &RecipePatch,
    ) -> Result<Recipe, ClientError> {
        let path = format!("/recipes/{}", id);
        let request = self.request(Method::PATCH, &path, Some(token)).json(patch);
        self.send(request).await
    }

    pub async fn delete_recipe(&self, token: &str, id: Uuid) -> Result<String, ClientError> {
        let path = format!("/recipes/{}", id);
        let response: MessageResponse = self
            .send(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        Ok(response.message)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let request = self
            .request(Method::POST, "/api/auth/register", None)
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }));
        let response: MessageResponse = self.send(request).await?;
        Ok(response.message)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let request = self
            .request(Method::POST, "/api/auth/login", None)
            .json(&serde_json::json!({ "email": email, "password": password }));
        self.send(request).await
    }

    pub async fn me(&self, token: &str) -> Result<PublicUser, ClientError> {
        let response: MeResponse = self
            .send(self.request(Method::GET, "/api/auth/me", Some(token)))
            .await?;
        Ok(response.user)
    }

    pub async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .send(self.request(Method::POST, "/api/auth/logout", Some(token)))
            .await?;
        Ok(())
    }

    pub async fn favorites(&self, token: &str) -> Result<Vec<Recipe>, ClientError> {
        self.send(self.request(Method::GET, "/api/favorites", Some(token)))
            .await
    }

    pub async fn add_favorite(
        &self,
        token: &str,
        recipe_id: Uuid,
    ) -> Result<Vec<Recipe>, ClientError> {
        let path = format!("/api/favorites/{}", recipe_id);
        self.send(self.request(Method::POST, &path, Some(token)))
            .await
    }

    pub async fn remove_favorite(
        &self,
        token: &str,
        recipe_id: Uuid,
    ) -> Result<Vec<Recipe>, ClientError> {
        let path = format!("/api/favorites/{}", recipe_id);
        self.send(self.request(Method::DELETE, &path, Some(token)))
            .await
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.http.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Maps non-success responses onto [`ClientError`].
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };
    tracing::debug!("Request failed with {}: {}", status, message);

    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(message)
        }
        status => ClientError::Server { status, message },
    })
}

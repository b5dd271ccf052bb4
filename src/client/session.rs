//! Client session: who is logged in, and their favorites.
//!
//! A session is an explicit object with a load/teardown lifecycle. It is
//! hydrated from the stored credential at startup and cleared on logout.
//! The favorites snapshot is only ever replaced wholesale with the set the
//! server returns; it is never edited optimistically.

use uuid::Uuid;

use super::api::{ApiClient, ClientError};
use crate::models::{PublicUser, Recipe};
use crate::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

pub struct Session<S: KeyValueStore> {
    api: ApiClient,
    store: S,
    token: Option<String>,
    user: Option<PublicUser>,
}

impl<S: KeyValueStore> Session<S> {
    /// Restores the session from the stored credential.
    ///
    /// A credential the server rejects is discarded. If the server cannot be
    /// reached the credential is kept for next time, but the session starts
    /// unauthenticated.
    pub async fn load(api: ApiClient, store: S) -> Self {
        let mut session = Self {
            api,
            store,
            token: None,
            user: None,
        };

        let Some(token) = session.store.get(TOKEN_KEY) else {
            return session;
        };

        match session.api.me(&token).await {
            Ok(user) => {
                session.token = Some(token);
                session.set_user(user);
            }
            // A 404 from `me` means the account behind the token is gone.
            Err(e) if e.is_auth_rejection() || matches!(e, ClientError::NotFound(_)) => {
                tracing::info!("Stored session is no longer valid: {}", e);
                session.clear_stored();
            }
            Err(e) => {
                tracing::warn!("Could not restore session: {}", e);
            }
        }

        session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    /// The bearer credential, or `NotLoggedIn`.
    pub fn token(&self) -> Result<&str, ClientError> {
        match (&self.token, &self.user) {
            (Some(token), Some(_)) => Ok(token),
            _ => Err(ClientError::NotLoggedIn),
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        self.api.register(username, email, password).await
    }

    /// Logs in and persists the credential.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&PublicUser, ClientError> {
        let login = self.api.login(email, password).await?;
        let user = self.api.me(&login.token).await?;

        if let Err(e) = self.store.set(TOKEN_KEY, &login.token) {
            tracing::warn!("Failed to persist session token: {}", e);
        }
        self.token = Some(login.token);
        self.set_user(user);

        self.user.as_ref().ok_or(ClientError::NotLoggedIn)
    }

    /// Ends the session. The server-side revoke is best-effort; local state
    /// is cleared regardless.
    pub async fn logout(&mut self) {
        if let Some(token) = self.token.take() {
            if let Err(e) = self.api.logout(&token).await {
                tracing::warn!("Server logout failed: {}", e);
            }
        }
        self.user = None;
        self.clear_stored();
    }

    /// Ids of the user's favorite recipes, in the order the server returned
    /// them.
    pub fn favorites(&self) -> &[Uuid] {
        self.user
            .as_ref()
            .map(|u| u.favorites.as_slice())
            .unwrap_or_default()
    }

    pub fn is_favorite(&self, recipe_id: Uuid) -> bool {
        self.favorites().contains(&recipe_id)
    }

    /// Adds a favorite on the server and adopts the server's set.
    ///
    /// On error the local snapshot is left unchanged.
    pub async fn add_favorite(&mut self, recipe_id: Uuid) -> Result<Vec<Recipe>, ClientError> {
        let token = self.token()?.to_string();
        let recipes = self.api.add_favorite(&token, recipe_id).await?;
        self.replace_favorites(&recipes);
        Ok(recipes)
    }

    /// Removes a favorite on the server and adopts the server's set.
    ///
    /// On error the local snapshot is left unchanged.
    pub async fn remove_favorite(&mut self, recipe_id: Uuid) -> Result<Vec<Recipe>, ClientError> {
        let token = self.token()?.to_string();
        let recipes = self.api.remove_favorite(&token, recipe_id).await?;
        self.replace_favorites(&recipes);
        Ok(recipes)
    }

    /// Fetches the hydrated favorites and refreshes the snapshot.
    pub async fn fetch_favorites(&mut self) -> Result<Vec<Recipe>, ClientError> {
        let token = self.token()?.to_string();
        let recipes = self.api.favorites(&token).await?;
        self.replace_favorites(&recipes);
        Ok(recipes)
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn replace_favorites(&mut self, recipes: &[Recipe]) {
        let Some(mut user) = self.user.take() else {
            return;
        };
        user.favorites = recipes.iter().map(|r| r.id).collect();
        self.set_user(user);
    }

    fn set_user(&mut self, user: PublicUser) {
        match serde_json::to_string(&user) {
            Ok(json) => {
                if let Err(e) = self.store.set(USER_KEY, &json) {
                    tracing::warn!("Failed to persist user snapshot: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to encode user snapshot: {}", e),
        }
        self.user = Some(user);
    }

    fn clear_stored(&mut self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!("Failed to clear {}: {}", key, e);
            }
        }
    }
}

mod favorites_repo;
mod recipe_repo;
mod user_repo;

pub use favorites_repo::FavoritesRepository;
pub use recipe_repo::RecipeRepository;
pub use user_repo::UserRepository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ValidationError;

/// Errors returned by the repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Recipe not found")]
    RecipeNotFound(Uuid),
    #[error("User not found")]
    UserNotFound(Uuid),
    #[error("User not authorized")]
    Forbidden,
    #[error("No recipes found in category '{0}'")]
    EmptyCategory(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Username or email already in use")]
    DuplicateUser,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::{Role, User};
    use tempfile::TempDir;

    pub struct TestContext {
        pub pool: SqlitePool,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    pub async fn setup_db() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        TestContext {
            pool,
            _temp_dir: temp_dir,
        }
    }

    pub async fn create_user(pool: &SqlitePool, username: &str, role: Role) -> User {
        let users = UserRepository::new(pool.clone());
        let user = users
            .create(username, &format!("{}@example.com", username), "hash")
            .await
            .unwrap();
        if role == Role::Admin {
            users
                .set_role(&user.email, Role::Admin)
                .await
                .unwrap()
                .unwrap()
        } else {
            user
        }
    }
}
